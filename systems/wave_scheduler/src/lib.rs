#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler responsible for expanding waves and pacing enemy spawns.
//!
//! The scheduler owns the spawn queue of the wave in progress. Each tick it
//! receives the elapsed time and the number of enemies still alive in the
//! world, and answers with wave lifecycle and spawn commands.

use std::{collections::VecDeque, time::Duration};

use path_defence_core::{Command, EnemyCatalog, EnemyKind, SpawnOrder, WaveNumber, WaveTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    wave_delay: Duration,
    spawn_order: SpawnOrder,
}

impl Config {
    /// Creates a new configuration from the inter-wave delay and spawn order.
    #[must_use]
    pub const fn new(wave_delay: Duration, spawn_order: SpawnOrder) -> Self {
        Self {
            wave_delay,
            spawn_order,
        }
    }
}

/// Observable phase of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No wave has been requested yet.
    Idle,
    /// The wave is spawning or its enemies are still alive.
    Spawning(WaveNumber),
    /// The wave was cleared; the next one starts after the delay.
    Waiting {
        /// Wave that will start next.
        next: WaveNumber,
        /// Delay left before it starts.
        remaining: Duration,
    },
    /// No further wave is defined.
    Victory,
}

/// Pure system that turns wave definitions into spawn commands.
#[derive(Debug)]
pub struct WaveScheduler {
    wave_delay: Duration,
    phase: Phase,
    queue: VecDeque<EnemyKind>,
    spawn_interval: Duration,
    accumulator: Duration,
    rng: Option<ChaCha8Rng>,
}

impl WaveScheduler {
    /// Creates a new scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rng = match config.spawn_order {
            SpawnOrder::Sequential => None,
            SpawnOrder::Random { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
        };
        Self {
            wave_delay: config.wave_delay,
            phase: Phase::Idle,
            queue: VecDeque::new(),
            spawn_interval: Duration::ZERO,
            accumulator: Duration::ZERO,
            rng,
        }
    }

    /// Current phase of the scheduler.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of enemies of the current wave still waiting to spawn.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Advances the scheduler by `dt`.
    ///
    /// `active_enemies` is the number of living enemies in the world at the
    /// start of the tick; a wave completes only when it and the queue are
    /// both empty.
    pub fn handle(
        &mut self,
        dt: Duration,
        waves: &WaveTable,
        enemies: &EnemyCatalog,
        active_enemies: usize,
        out: &mut Vec<Command>,
    ) {
        match self.phase {
            Phase::Victory => return,
            Phase::Idle => self.start_wave(WaveNumber::new(1), waves, enemies, out),
            Phase::Waiting { next, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.start_wave(next, waves, enemies, out);
                } else {
                    self.phase = Phase::Waiting { next, remaining };
                }
                return;
            }
            Phase::Spawning(_) => {}
        }

        let Phase::Spawning(wave) = self.phase else {
            return;
        };

        let spawned = self.spawn_due(dt, out);
        if !spawned && self.queue.is_empty() && active_enemies == 0 {
            self.complete_wave(wave, waves, out);
        }
    }

    fn start_wave(
        &mut self,
        wave: WaveNumber,
        waves: &WaveTable,
        enemies: &EnemyCatalog,
        out: &mut Vec<Command>,
    ) {
        let Some(definition) = waves.get(wave) else {
            self.declare_victory(out);
            return;
        };

        self.queue.clear();
        for (kind, count) in &definition.enemies {
            if !enemies.contains(kind) {
                warn!(wave = wave.get(), %kind, "skipping enemy type missing from the catalog");
                continue;
            }
            let Ok(count) = usize::try_from(*count) else {
                warn!(wave = wave.get(), %kind, count, "skipping non-positive enemy count");
                continue;
            };
            if count == 0 {
                warn!(wave = wave.get(), %kind, "skipping non-positive enemy count");
                continue;
            }
            self.queue
                .extend(std::iter::repeat(kind.clone()).take(count));
        }

        self.spawn_interval = definition.spawn_interval;
        self.accumulator = Duration::ZERO;
        self.phase = Phase::Spawning(wave);
        out.push(Command::StartWave {
            wave,
            queued: u32::try_from(self.queue.len()).unwrap_or(u32::MAX),
        });
    }

    fn spawn_due(&mut self, dt: Duration, out: &mut Vec<Command>) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        self.accumulator = self.accumulator.saturating_add(dt);
        if self.accumulator < self.spawn_interval {
            return false;
        }

        let kind = match self.rng.as_mut() {
            Some(rng) => {
                let index = rng.gen_range(0..self.queue.len());
                self.queue.remove(index)
            }
            None => self.queue.pop_front(),
        };
        let Some(kind) = kind else {
            return false;
        };
        self.accumulator = Duration::ZERO;
        out.push(Command::SpawnEnemy { kind });
        true
    }

    fn complete_wave(&mut self, wave: WaveNumber, waves: &WaveTable, out: &mut Vec<Command>) {
        out.push(Command::CompleteWave { wave });
        let next = wave.next();
        if waves.get(next).is_none() {
            self.declare_victory(out);
            return;
        }
        self.phase = Phase::Waiting {
            next,
            remaining: self.wave_delay,
        };
    }

    fn declare_victory(&mut self, out: &mut Vec<Command>) {
        self.queue.clear();
        self.phase = Phase::Victory;
        out.push(Command::DeclareVictory);
    }
}
