#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step orchestration of one stage.
//!
//! A [`Session`] owns the world and every system and runs them in a fixed
//! order each tick: wave scheduling, enemy motion, tower cooldowns, target
//! selection, attack resolution and finally at most one player build request.
//! A tower whose selection died earlier in the same tick picks again from the
//! enemies still alive.
//! Events produced along the way are handed to an injected [`EventSink`].

use std::time::Duration;

use path_defence_core::{
    CellCoord, Command, Currency, EnemyId, EnemyView, Event, GameDefinition, StageDefinition,
    TowerId, TowerKind, TowerTarget, TowerView, WaveNumber,
};
use path_defence_system_builder::{BuildRequest, Builder};
use path_defence_system_tower_combat::TowerCombat;
use path_defence_system_tower_targeting::TowerTargeting;
use path_defence_system_wave_scheduler::{Config as SchedulerConfig, Phase, WaveScheduler};
use path_defence_world::{self as world, query, Outcome, World};
use tracing::{debug, trace};

/// Receiver of the events a session produces.
pub trait EventSink {
    /// Called once per event, in the order the world produced them.
    fn notify(&mut self, event: &Event);
}

impl EventSink for Vec<Event> {
    fn notify(&mut self, event: &Event) {
        self.push(event.clone());
    }
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&mut self, _event: &Event) {}
}

/// A running stage together with the systems that drive it.
#[derive(Debug)]
pub struct Session {
    world: World,
    scheduler: WaveScheduler,
    targeting: TowerTargeting,
    combat: TowerCombat,
    builder: Builder,
    commands: Vec<Command>,
    events: Vec<Event>,
    targets: Vec<TowerTarget>,
    ticks: u64,
}

impl Session {
    /// Creates a session for the stage using the game's catalogs and settings.
    #[must_use]
    pub fn new(game: GameDefinition, stage: StageDefinition) -> Self {
        let scheduler = WaveScheduler::new(SchedulerConfig::new(
            game.settings.wave_delay,
            game.settings.spawn_order,
        ));
        let targeting = TowerTargeting::new(game.settings.targeting_seed);
        debug!(stage = %stage.name, waves = stage.waves.len(), "session created");

        Self {
            world: World::new(game, stage),
            scheduler,
            targeting,
            combat: TowerCombat::new(),
            builder: Builder::new(),
            commands: Vec::new(),
            events: Vec::new(),
            targets: Vec::new(),
            ticks: 0,
        }
    }

    /// Queues a tower purchase; it is validated when its tick comes.
    pub fn request_placement(&mut self, kind: TowerKind, cell: CellCoord) {
        self.builder.submit(BuildRequest::Place { kind, cell });
    }

    /// Queues an upgrade of the tower at `cell`.
    pub fn request_upgrade(&mut self, cell: CellCoord) {
        self.builder.submit(BuildRequest::Upgrade { cell });
    }

    /// Queues the sale of the tower at `cell`.
    pub fn request_sell(&mut self, cell: CellCoord) {
        self.builder.submit(BuildRequest::Sell { cell });
    }

    /// Number of build requests not yet processed.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.builder.pending()
    }

    /// Advances the stage by `dt` and forwards the produced events to `sink`.
    ///
    /// Once the stage has ended further ticks do nothing. Returns the outcome
    /// after the tick.
    pub fn tick(&mut self, dt: Duration, sink: &mut impl EventSink) -> Outcome {
        if query::is_finished(&self.world) {
            return query::outcome(&self.world);
        }
        self.ticks += 1;
        trace!(tick = self.ticks, ?dt, "tick");

        self.scheduler.handle(
            dt,
            &query::stage(&self.world).waves,
            query::enemy_catalog(&self.world),
            query::active_enemy_count(&self.world),
            &mut self.commands,
        );
        self.commands.push(Command::AdvanceEnemies { dt });
        self.commands.push(Command::AdvanceTowers { dt });
        self.flush();

        if !query::is_finished(&self.world) {
            self.targeting.handle(
                &query::tower_view(&self.world),
                &query::enemy_view(&self.world),
                &mut self.targets,
            );
            self.combat.handle(
                query::tower_cooldown_view(&self.world),
                &self.targets,
                &mut self.commands,
            );
            self.resolve_attacks();

            self.builder.handle(&mut self.commands);
            self.flush();
        }

        for event in self.events.drain(..) {
            sink.notify(&event);
        }
        query::outcome(&self.world)
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Applies attack commands in order, re-selecting for any tower whose
    /// chosen enemies were killed by an earlier attack in the same tick.
    fn resolve_attacks(&mut self) {
        let mut pending = std::mem::take(&mut self.commands);
        for command in pending.drain(..) {
            let command = match command {
                Command::ResolveAttack { tower, targets } if self.is_stale(&targets) => {
                    let targets = self.reselect(tower);
                    trace!(?tower, ?targets, "selection went stale, re-selected");
                    Command::ResolveAttack { tower, targets }
                }
                command => command,
            };
            world::apply(&mut self.world, command, &mut self.events);
        }
        self.commands = pending;
    }

    fn is_stale(&self, targets: &[EnemyId]) -> bool {
        targets
            .iter()
            .any(|&enemy| query::enemy(&self.world, enemy).is_none())
    }

    fn reselect(&mut self, tower: TowerId) -> Vec<EnemyId> {
        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.targets
            .iter()
            .find(|target| target.tower == tower)
            .map(|target| target.enemies.clone())
            .unwrap_or_default()
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current phase of the wave scheduler.
    #[must_use]
    pub fn wave_phase(&self) -> Phase {
        self.scheduler.phase()
    }

    /// Living enemies in spawn order.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Placed towers ordered by identifier.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveNumber> {
        query::current_wave(&self.world)
    }

    /// Balance of `currency`.
    #[must_use]
    pub fn balance(&self, currency: &Currency) -> u64 {
        query::balance(&self.world, currency)
    }

    /// Remaining player health.
    #[must_use]
    pub fn player_health(&self) -> u32 {
        query::player_health(&self.world)
    }

    /// Whether the stage is still running, won or lost.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        query::outcome(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{
        EnemyCatalog, EnemyKind, EnemyStats, GameSettings, WaveDefinition, WaveTable,
        WaypointPath,
    };

    fn session(player_health: u32) -> Session {
        let enemies = EnemyCatalog::new([(
            EnemyKind::new("dasher"),
            EnemyStats {
                health: 10,
                speed: 1_000.0,
                damage: 40,
                reward: 1,
                image: None,
            },
        )]);
        let stage = StageDefinition {
            name: "strip".to_owned(),
            columns: 4,
            rows: 4,
            path: WaypointPath::parse(&["0,1", "3,1"], 10.0).expect("valid path"),
            waves: WaveTable::new([(
                WaveNumber::new(1),
                WaveDefinition {
                    spawn_interval: Duration::ZERO,
                    enemies: vec![(EnemyKind::new("dasher"), 3)],
                },
            )]),
        };
        Session::new(
            GameDefinition {
                settings: GameSettings {
                    player_health,
                    ..GameSettings::default()
                },
                enemies,
                towers: Default::default(),
            },
            stage,
        )
    }

    #[test]
    fn ticks_after_game_over_are_ignored() {
        let mut session = session(50);
        let mut events = Vec::new();

        for _ in 0..20 {
            let _ = session.tick(Duration::from_millis(100), &mut events);
        }

        assert_eq!(session.outcome(), Outcome::GameOver);
        let game_overs = events
            .iter()
            .filter(|event| matches!(event, Event::PlayerGameOver))
            .count();
        assert_eq!(game_overs, 1, "game over must be reported once");

        let ticks = session.ticks();
        let mut later = Vec::new();
        assert_eq!(
            session.tick(Duration::from_secs(1), &mut later),
            Outcome::GameOver
        );
        assert!(later.is_empty());
        assert_eq!(session.ticks(), ticks);
    }

    #[test]
    fn build_requests_wait_for_their_tick() {
        let mut session = session(500);
        session.request_placement(TowerKind::new("ghost"), CellCoord::new(2, 3));
        session.request_sell(CellCoord::new(2, 3));
        assert_eq!(session.pending_requests(), 2);

        let _ = session.tick(Duration::from_millis(10), &mut NullSink);
        assert_eq!(session.pending_requests(), 1);
    }
}
