#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Path Defence.
//!
//! The world owns every mutable piece of a running stage: the active enemy
//! arena, the tower registry, the currency ledger and the player's health.
//! It changes only through [`apply`], which executes one [`Command`] and
//! reports what happened as [`Event`] values. Systems observe it through the
//! read-only [`query`] module.

mod economy;
mod enemies;
mod status;
mod towers;

use path_defence_core::{
    AttackMode, CellCoord, Command, Currency, EnemyCatalog, EnemyId, EnemyKind, Event,
    GameDefinition, GameSettings, PlacementError, SaleError, StageDefinition, StatusKind,
    TowerCatalog, TowerId, TowerKind, TowerLevel, UpgradeError, WaveNumber,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use economy::Ledger;
pub use status::{StatusEffectSet, DAMAGE_OVER_TIME_PERIOD};

use enemies::{Departure, Enemy, EnemyArena};
use towers::{PlacementBounds, TowerRegistry};

/// Terminal state of a stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Waves are still being played.
    #[default]
    InProgress,
    /// Every defined wave was cleared.
    Victory,
    /// The player's health reached zero.
    GameOver,
}

impl Outcome {
    /// Reports whether the stage has ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Failure isolated to a single tower's attack cycle.
#[derive(Clone, Debug, PartialEq, Error)]
enum AttackError {
    #[error("tower {0:?} is not placed")]
    UnknownTower(TowerId),
    #[error("tower {tower:?} carries slow fraction {fraction} outside [0, 1]")]
    MalformedSlow { tower: TowerId, fraction: f32 },
}

/// Represents the authoritative Path Defence world state.
#[derive(Debug)]
pub struct World {
    settings: GameSettings,
    enemy_catalog: EnemyCatalog,
    tower_catalog: TowerCatalog,
    stage: StageDefinition,
    ledger: Ledger,
    enemies: EnemyArena,
    towers: TowerRegistry,
    player_health: u32,
    current_wave: Option<WaveNumber>,
    outcome: Outcome,
}

impl World {
    /// Creates a world for the provided stage, seeded from the game settings.
    #[must_use]
    pub fn new(game: GameDefinition, stage: StageDefinition) -> Self {
        let GameDefinition {
            settings,
            enemies: enemy_catalog,
            towers: tower_catalog,
        } = game;
        Self {
            ledger: Ledger::with_balances(&settings.starting_balances),
            player_health: settings.player_health,
            settings,
            enemy_catalog,
            tower_catalog,
            stage,
            enemies: EnemyArena::default(),
            towers: TowerRegistry::new(),
            current_wave: None,
            outcome: Outcome::InProgress,
        }
    }

    fn placement_bounds(&self) -> PlacementBounds {
        PlacementBounds {
            columns: self.stage.columns,
            rows: self.stage.rows,
            reserved_rows: self.settings.reserved_rows,
        }
    }

    fn validate_placement(&self, kind: &TowerKind, cell: CellCoord) -> Result<u64, PlacementError> {
        self.towers
            .check_site(cell, self.placement_bounds(), self.stage.path.occupies(cell))?;
        let cost = self
            .tower_catalog
            .get(kind)
            .and_then(|definition| definition.level(1))
            .map(|level| level.cost)
            .ok_or(PlacementError::UnknownTowerKind)?;
        if self.ledger.balance(&Currency::gold()) < cost {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(cost)
    }

    fn credit(&mut self, amount: u64, out_events: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }
        let currency = Currency::gold();
        let balance = self.ledger.deposit(&currency, amount);
        out_events.push(Event::CurrencyChanged { currency, balance });
    }

    fn record_kill(&mut self, enemy: EnemyId, kind: EnemyKind, reward: u64, out: &mut Vec<Event>) {
        debug!(?enemy, %kind, reward, "enemy killed");
        out.push(Event::EnemyKilled {
            enemy,
            kind,
            reward,
        });
        self.credit(reward, out);
    }

    fn damage_player(&mut self, damage: u32, out_events: &mut Vec<Event>) {
        let was_alive = self.player_health > 0;
        self.player_health = self.player_health.saturating_sub(damage);
        out_events.push(Event::PlayerDamaged {
            damage,
            remaining: self.player_health,
        });
        if was_alive && self.player_health == 0 && self.outcome == Outcome::InProgress {
            self.outcome = Outcome::GameOver;
            info!("player health depleted");
            out_events.push(Event::PlayerGameOver);
        }
    }

    fn advance_enemies(&mut self, dt: std::time::Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::EnemiesAdvanced { dt });

        let mut departures = Vec::new();
        for id in self.enemies.alive_in_spawn_order() {
            let Some(enemy) = self.enemies.get_mut(id) else {
                continue;
            };
            if let Some(departure) = enemy.advance(dt, &self.stage.path) {
                departures.push((id, departure));
            }
        }

        for (id, departure) in departures {
            let Some(enemy) = self.enemies.get(id) else {
                continue;
            };
            let (kind, damage, reward) = (enemy.kind.clone(), enemy.damage, enemy.reward);
            match departure {
                Departure::Killed => self.record_kill(id, kind, reward, out_events),
                Departure::ReachedEnd => {
                    debug!(enemy = ?id, %kind, damage, "enemy reached the end");
                    out_events.push(Event::EnemyReachedEnd {
                        enemy: id,
                        kind,
                        damage,
                    });
                    self.damage_player(damage, out_events);
                }
            }
        }

        self.enemies.sweep();
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, out_events: &mut Vec<Event>) {
        let Some(stats) = self.enemy_catalog.get(&kind) else {
            error!(%kind, "spawn requested for an enemy type missing from the catalog");
            return;
        };
        let sequence = self.enemies.next_sequence();
        let enemy = Enemy::spawn(kind.clone(), stats, &self.stage.path, sequence);
        let health = enemy.health;
        let id = self.enemies.insert(enemy);
        debug!(enemy = ?id, %kind, health, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            health,
        });
    }

    fn resolve_attack(
        &mut self,
        tower_id: TowerId,
        targets: &[EnemyId],
        out_events: &mut Vec<Event>,
    ) -> Result<(), AttackError> {
        let grid_size = self.stage.grid_size();
        let tower = self
            .towers
            .find_mut(tower_id)
            .ok_or(AttackError::UnknownTower(tower_id))?;
        tower.cooldown_remaining = tower.stats.cooldown;
        let stats = tower.stats.clone();
        let attack_mode = tower.attack_mode;

        if let Some(slow) = stats.debuffs.slow {
            if !(0.0..=1.0).contains(&slow.fraction) {
                return Err(AttackError::MalformedSlow {
                    tower: tower_id,
                    fraction: slow.fraction,
                });
            }
        }

        let mut hits = 0u32;
        let mut struck = Vec::with_capacity(targets.len());
        for &target in targets {
            if self.strike(tower_id, &stats, stats.damage, target, out_events) {
                hits = hits.saturating_add(1);
                struck.push(target);
            }
        }

        if let (AttackMode::SingleTarget, Some(blast)) = (attack_mode, stats.blast) {
            let radius = blast.radius * grid_size;
            for primary in &struck {
                let Some(center) = self.enemies.get(*primary).map(|enemy| enemy.position) else {
                    continue;
                };
                let victims: Vec<EnemyId> = self
                    .enemies
                    .alive_in_spawn_order()
                    .into_iter()
                    .filter(|id| !struck.contains(id))
                    .filter(|id| {
                        self.enemies
                            .get(*id)
                            .is_some_and(|enemy| enemy.position.distance(center) <= radius)
                    })
                    .collect();
                for victim in victims {
                    if self.strike(tower_id, &stats, blast.damage, victim, out_events) {
                        hits = hits.saturating_add(1);
                    }
                }
            }
        }

        if hits > 0 {
            out_events.push(Event::TowerAttacked {
                tower: tower_id,
                hits,
            });
        }
        Ok(())
    }

    /// Deals damage and applies the level's debuffs to one living enemy.
    fn strike(
        &mut self,
        source: TowerId,
        stats: &TowerLevel,
        damage: u32,
        target: EnemyId,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(enemy) = self.enemies.get_mut(target) else {
            return false;
        };
        if !enemy.is_alive() {
            return false;
        }

        let killed = enemy.decrease_health(damage);
        let debuffs = &stats.debuffs;
        if let Some(slow) = debuffs.slow {
            enemy.effects.apply_slow(source, slow.fraction, slow.duration);
        }
        if let Some(bleeding) = debuffs.bleeding {
            enemy.effects.apply_damage_over_time(
                StatusKind::Bleeding,
                source,
                bleeding.damage,
                bleeding.duration,
            );
        }
        if let Some(burning) = debuffs.burning {
            enemy.effects.apply_damage_over_time(
                StatusKind::Burning,
                source,
                burning.damage,
                burning.duration,
            );
        }
        let (kind, reward) = (enemy.kind.clone(), enemy.reward);

        if let Some(gold) = debuffs.gold_on_hit {
            self.credit(gold, out_events);
        }
        if killed {
            self.record_kill(target, kind, reward, out_events);
        }
        true
    }

    fn place_tower(&mut self, kind: TowerKind, cell: CellCoord, out_events: &mut Vec<Event>) {
        let placed = self.validate_placement(&kind, cell).and_then(|cost| {
            let definition = self
                .tower_catalog
                .get(&kind)
                .ok_or(PlacementError::UnknownTowerKind)?;
            let tower = self
                .towers
                .insert(kind.clone(), definition, cell, self.stage.grid_size())
                .ok_or(PlacementError::UnknownTowerKind)?;
            Ok((tower, cost))
        });

        match placed {
            Ok((tower, cost)) => {
                let currency = Currency::gold();
                let balance = self.ledger.withdraw(&currency, cost);
                info!(?tower, %kind, ?cell, cost, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    cell,
                    cost,
                });
                out_events.push(Event::CurrencyChanged { currency, balance });
            }
            Err(reason) => {
                warn!(%kind, ?cell, ?reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            }
        }
    }

    fn upgrade_tower(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let upgraded = match self.towers.get_mut(cell) {
            None => Err(UpgradeError::MissingTower),
            Some(tower) => match self.tower_catalog.get(&tower.kind) {
                None => Err(UpgradeError::UnknownTowerKind),
                Some(definition) => {
                    let next = tower.level.saturating_add(1);
                    match definition.level(next) {
                        None => Err(UpgradeError::MaxLevel),
                        Some(stats) => {
                            tower.level = next;
                            tower.stats = stats.clone();
                            Ok((tower.id, next))
                        }
                    }
                }
            },
        };

        match upgraded {
            Ok((tower, level)) => {
                info!(?tower, level, "tower upgraded");
                out_events.push(Event::TowerUpgraded { tower, level });
            }
            Err(reason) => {
                warn!(?cell, ?reason, "tower upgrade rejected");
                out_events.push(Event::TowerUpgradeRejected { cell, reason });
            }
        }
    }

    fn sell_tower(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.remove(cell) else {
            warn!(?cell, "tower sale rejected");
            out_events.push(Event::TowerSaleRejected {
                cell,
                reason: SaleError::MissingTower,
            });
            return;
        };
        let refund =
            tower.purchase_cost.saturating_mul(u64::from(self.settings.sell_refund_percent)) / 100;
        info!(tower = ?tower.id, ?cell, refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower: tower.id,
            cell,
            refund,
        });
        self.credit(refund, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AdvanceEnemies { dt } => world.advance_enemies(dt, out_events),
        Command::AdvanceTowers { dt } => {
            for tower in world.towers.iter_mut() {
                tower.cooldown_remaining = tower.cooldown_remaining.saturating_sub(dt);
            }
        }
        Command::StartWave { wave, queued } => {
            world.current_wave = Some(wave);
            info!(wave = wave.get(), queued, "wave started");
            out_events.push(Event::WaveStarted { wave, queued });
        }
        Command::SpawnEnemy { kind } => world.spawn_enemy(kind, out_events),
        Command::CompleteWave { wave } => {
            info!(wave = wave.get(), "wave completed");
            out_events.push(Event::WaveCompleted { wave });
        }
        Command::DeclareVictory => {
            if world.outcome == Outcome::InProgress {
                world.outcome = Outcome::Victory;
                info!("all waves cleared");
                out_events.push(Event::Victory);
            }
        }
        Command::ResolveAttack { tower, targets } => {
            if let Err(error) = world.resolve_attack(tower, &targets, out_events) {
                error!(%error, "attack cycle skipped");
            }
            world.enemies.sweep();
        }
        Command::PlaceTower { kind, cell } => world.place_tower(kind, cell, out_events),
        Command::UpgradeTower { cell } => world.upgrade_tower(cell, out_events),
        Command::SellTower { cell } => world.sell_tower(cell, out_events),
        Command::RemoveEnemy { enemy } => {
            if world.enemies.remove(enemy).is_some() {
                debug!(?enemy, "enemy removed");
                out_events.push(Event::EnemyRemoved { enemy });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use path_defence_core::{
        CellCoord, Currency, EnemyCatalog, EnemyId, EnemySnapshot, EnemyView, GameSettings,
        PlacementError, StageDefinition, TowerCatalog, TowerCooldownSnapshot, TowerCooldownView,
        TowerId, TowerKind, TowerSnapshot, TowerView, WaveNumber, WaypointPath,
    };

    use super::{Ledger, Outcome, StatusEffectSet, World};

    /// Captures a read-only view of the living enemies in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let path = &world.stage.path;
        let snapshots: Vec<EnemySnapshot> = world
            .enemies
            .iter()
            .filter(|(_, enemy)| enemy.is_alive())
            .map(|(id, enemy)| enemy.snapshot(id, path))
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Number of enemies currently walking the path.
    #[must_use]
    pub fn active_enemy_count(world: &World) -> usize {
        world.enemies.alive_count()
    }

    /// Snapshot of one enemy if its handle is still live.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world
            .enemies
            .get(id)
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| enemy.snapshot(id, &world.stage.path))
    }

    /// Status effects currently carried by an enemy.
    #[must_use]
    pub fn status_effects(world: &World, id: EnemyId) -> Option<&StatusEffectSet> {
        world.enemies.get(id).map(|enemy| &enemy.effects)
    }

    /// Captures a read-only view of every placed tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let grid_size = world.stage.grid_size();
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(grid_size))
                .collect(),
        )
    }

    /// Snapshot of the tower hosted by a cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerSnapshot> {
        world
            .towers
            .get(cell)
            .map(|tower| tower.snapshot(world.stage.grid_size()))
    }

    /// Snapshot of a tower by identifier.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world
            .towers
            .find(id)
            .map(|tower| tower.snapshot(world.stage.grid_size()))
    }

    /// Captures the cooldown state of every placed tower.
    #[must_use]
    pub fn tower_cooldown_view(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| TowerCooldownSnapshot {
                    tower: tower.id,
                    ready_in: tower.cooldown_remaining,
                })
                .collect(),
        )
    }

    /// Dry-runs the placement validator; returns the price on success.
    pub fn placement_preview(
        world: &World,
        kind: &TowerKind,
        cell: CellCoord,
    ) -> Result<u64, PlacementError> {
        world.validate_placement(kind, cell)
    }

    /// Number of the most recently started wave.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveNumber> {
        world.current_wave
    }

    /// Balance of one currency.
    #[must_use]
    pub fn balance(world: &World, currency: &Currency) -> u64 {
        world.ledger.balance(currency)
    }

    /// Every currency balance.
    #[must_use]
    pub fn ledger(world: &World) -> &Ledger {
        &world.ledger
    }

    /// Remaining player health.
    #[must_use]
    pub fn player_health(world: &World) -> u32 {
        world.player_health
    }

    /// Whether the stage is still running, won, or lost.
    #[must_use]
    pub fn outcome(world: &World) -> Outcome {
        world.outcome
    }

    /// Provides read-only access to the stage definition.
    #[must_use]
    pub fn stage(world: &World) -> &StageDefinition {
        &world.stage
    }

    /// Provides read-only access to the path enemies follow.
    #[must_use]
    pub fn path(world: &World) -> &WaypointPath {
        &world.stage.path
    }

    /// Provides read-only access to the session tunables.
    #[must_use]
    pub fn settings(world: &World) -> &GameSettings {
        &world.settings
    }

    /// Provides read-only access to the enemy catalog.
    #[must_use]
    pub fn enemy_catalog(world: &World) -> &EnemyCatalog {
        &world.enemy_catalog
    }

    /// Provides read-only access to the tower catalog.
    #[must_use]
    pub fn tower_catalog(world: &World) -> &TowerCatalog {
        &world.tower_catalog
    }

    /// Reports whether the stage has ended.
    #[must_use]
    pub fn is_finished(world: &World) -> bool {
        world.outcome.is_finished()
    }
}
