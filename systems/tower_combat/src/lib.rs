#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits attack cycles for towers whose cooldown elapsed.

use path_defence_core::{Command, TowerCooldownView, TowerId, TowerTarget};

/// Tower combat system that queues attack cycles for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::ResolveAttack` for every ready tower.
    ///
    /// A ready tower with no selection still gets an empty attack cycle so its
    /// cooldown resets. `tower_targets` must be ordered by tower identifier.
    pub fn handle(
        &mut self,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();

        for snapshot in tower_cooldowns.iter() {
            if !snapshot.ready_in.is_zero() {
                continue;
            }
            let targets = find_target(tower_targets, snapshot.tower)
                .map(|target| target.enemies.clone())
                .unwrap_or_default();
            self.scratch.push(Command::ResolveAttack {
                tower: snapshot.tower,
                targets,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn find_target(targets: &[TowerTarget], tower: TowerId) -> Option<&TowerTarget> {
    targets
        .binary_search_by_key(&tower, |target| target.tower)
        .ok()
        .map(|index| &targets[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use path_defence_core::{EnemyId, TowerCooldownSnapshot};
    use std::time::Duration;

    #[test]
    fn ready_towers_attack_their_selection() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(5, Duration::ZERO),
            snapshot(2, Duration::ZERO),
        ]);
        let targets = vec![target(2, &[4]), target(5, &[1, 3])];
        let mut out = Vec::new();

        system.handle(cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::ResolveAttack {
                    tower: TowerId::new(2),
                    targets: vec![EnemyId::new(4, 0)],
                },
                Command::ResolveAttack {
                    tower: TowerId::new(5),
                    targets: vec![EnemyId::new(1, 0), EnemyId::new(3, 0)],
                },
            ],
        );
    }

    #[test]
    fn ready_towers_without_targets_still_cycle() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![snapshot(1, Duration::ZERO)]);
        let mut out = Vec::new();

        system.handle(cooldowns, &[], &mut out);

        assert_eq!(
            out,
            vec![Command::ResolveAttack {
                tower: TowerId::new(1),
                targets: Vec::new(),
            }]
        );
    }

    #[test]
    fn cooling_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let cooldowns = TowerCooldownView::from_snapshots(vec![
            snapshot(3, Duration::from_millis(250)),
            snapshot(8, Duration::ZERO),
        ]);
        let targets = vec![target(3, &[9]), target(8, &[2]), target(42, &[3])];
        let mut out = Vec::new();

        system.handle(cooldowns, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::ResolveAttack {
                tower: TowerId::new(8),
                targets: vec![EnemyId::new(2, 0)],
            }],
        );
    }

    fn snapshot(tower: u32, ready_in: Duration) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: TowerId::new(tower),
            ready_in,
        }
    }

    fn target(tower: u32, enemies: &[u32]) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemies: enemies.iter().map(|&index| EnemyId::new(index, 0)).collect(),
        }
    }
}
