#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use glam::Vec2;
use path_defence_core::{
    AttackMode, EnemyId, EnemyView, TargetPriority, TowerId, TowerTarget, TowerView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug)]
pub struct TowerTargeting {
    rng: ChaCha8Rng,
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
    in_range: Vec<usize>,
}

impl TowerTargeting {
    /// Creates a targeting system whose random policy is driven by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tower_workspace: Vec::new(),
            enemy_workspace: Vec::new(),
            in_range: Vec::new(),
        }
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Towers without an enemy in range produce no entry.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.iter().next().is_none() || enemies.is_empty() {
            return;
        }

        self.prepare_tower_workspace(towers);
        self.prepare_enemy_workspace(enemies);

        for tower in &self.tower_workspace {
            self.in_range.clear();
            let max_distance = tower.range * tower.range;
            for (index, candidate) in self.enemy_workspace.iter().enumerate() {
                if candidate.position.distance_squared(tower.position) <= max_distance {
                    self.in_range.push(index);
                }
            }
            if self.in_range.is_empty() {
                continue;
            }

            let enemies = match tower.attack_mode {
                AttackMode::Area => self
                    .in_range
                    .iter()
                    .map(|&index| self.enemy_workspace[index].id)
                    .collect(),
                AttackMode::SingleTarget => {
                    let chosen = select(
                        tower.priority,
                        &self.in_range,
                        &self.enemy_workspace,
                        &mut self.rng,
                    );
                    vec![self.enemy_workspace[chosen].id]
                }
            };

            out.push(TowerTarget {
                tower: tower.id,
                enemies,
            });
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        let (lower, _) = towers.iter().size_hint();
        self.tower_workspace.reserve(lower);

        for snapshot in towers.iter() {
            if snapshot.range <= 0.0 {
                continue;
            }
            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.range,
                attack_mode: snapshot.attack_mode,
                priority: snapshot.priority,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            if snapshot.health == 0 {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
                health: snapshot.health,
                progress: snapshot.progress,
            });
        }
    }
}

/// Picks one candidate index from `in_range`, which is non-empty.
///
/// Ties keep the earliest candidate in scan order.
fn select(
    priority: TargetPriority,
    in_range: &[usize],
    candidates: &[EnemyCandidate],
    rng: &mut ChaCha8Rng,
) -> usize {
    if priority == TargetPriority::Random {
        return in_range[rng.gen_range(0..in_range.len())];
    }

    let mut best = in_range[0];
    for &index in &in_range[1..] {
        let current = &candidates[index];
        let incumbent = &candidates[best];
        let better = match priority {
            TargetPriority::First => current.progress > incumbent.progress,
            TargetPriority::Last => current.progress < incumbent.progress,
            TargetPriority::LowestHealth => current.health < incumbent.health,
            TargetPriority::HighestHealth => current.health > incumbent.health,
            TargetPriority::Random => false,
        };
        if better {
            best = index;
        }
    }
    best
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    position: Vec2,
    range: f32,
    attack_mode: AttackMode,
    priority: TargetPriority,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
    health: u32,
    progress: f32,
}
