#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Path Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that double as the outward notifications of the simulation. Systems consume
//! immutable snapshots and respond exclusively with new command batches.
//!
//! Immutable, pre-validated definitions (enemy and tower catalogs, wave
//! tables, stage layout) also live here so that every crate observes the same
//! configuration types without depending on the loader.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod catalog;
mod path;

pub use catalog::{
    AttackMode, Blast, DebuffTable, DotDebuff, EnemyCatalog, EnemyStats, GameDefinition,
    GameSettings, SlowDebuff, SpawnOrder, StageDefinition, TargetPriority, TowerCatalog,
    TowerDefinition, TowerLevel, WaveDefinition, WaveTable,
};
pub use path::{PathError, WaypointPath};

/// Currency credited for kills and spent on towers unless configured otherwise.
pub const GOLD: &str = "gold";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances every walking enemy: status decay, damage-over-time and motion.
    AdvanceEnemies {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Counts down the cooldown of every placed tower.
    AdvanceTowers {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Records that the scheduler expanded a wave into its spawn queue.
    StartWave {
        /// Number of the wave that began.
        wave: WaveNumber,
        /// Number of enemies queued for the wave.
        queued: u32,
    },
    /// Requests that an enemy of the provided type enters at the path start.
    SpawnEnemy {
        /// Type of enemy to instantiate.
        kind: EnemyKind,
    },
    /// Records that the in-progress wave has no queued or active enemies left.
    CompleteWave {
        /// Number of the wave that finished.
        wave: WaveNumber,
    },
    /// Records that no further wave definition exists.
    DeclareVictory,
    /// Executes one attack cycle for a tower whose cooldown elapsed.
    ///
    /// `targets` holds the primary selections; an empty list is an idle cycle
    /// that still resets the cooldown.
    ResolveAttack {
        /// Tower performing the attack.
        tower: TowerId,
        /// Enemies selected by the targeting policy.
        targets: Vec<EnemyId>,
    },
    /// Requests purchase and placement of a tower at the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Grid cell that receives the tower.
        cell: CellCoord,
    },
    /// Requests that the tower at the provided cell advances one level.
    UpgradeTower {
        /// Cell hosting the tower to upgrade.
        cell: CellCoord,
    },
    /// Requests that the tower at the provided cell is sold.
    SellTower {
        /// Cell hosting the tower to sell.
        cell: CellCoord,
    },
    /// Removes an enemy without rewarding or damaging anyone.
    RemoveEnemy {
        /// Enemy to remove.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that enemies were advanced by the provided duration.
    EnemiesAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// Number of the wave.
        wave: WaveNumber,
        /// Number of enemies queued for the wave.
        queued: u32,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Handle allocated to the enemy.
        enemy: EnemyId,
        /// Type of the spawned enemy.
        kind: EnemyKind,
        /// Health the enemy starts with.
        health: u32,
    },
    /// Reports that an enemy walked off the final waypoint.
    EnemyReachedEnd {
        /// Handle of the departed enemy.
        enemy: EnemyId,
        /// Type of the departed enemy.
        kind: EnemyKind,
        /// Contact damage dealt to the player.
        damage: u32,
    },
    /// Reports that an enemy's health reached zero.
    EnemyKilled {
        /// Handle of the slain enemy.
        enemy: EnemyId,
        /// Type of the slain enemy.
        kind: EnemyKind,
        /// Reward deposited for the kill.
        reward: u64,
    },
    /// Reports that an enemy was removed explicitly.
    EnemyRemoved {
        /// Handle of the removed enemy.
        enemy: EnemyId,
    },
    /// Reports that the player lost health.
    PlayerDamaged {
        /// Damage applied to the player.
        damage: u32,
        /// Health remaining after the damage.
        remaining: u32,
    },
    /// Announces that the player's health reached zero.
    PlayerGameOver,
    /// Announces that a wave finished.
    WaveCompleted {
        /// Number of the completed wave.
        wave: WaveNumber,
    },
    /// Announces that every configured wave has been cleared.
    Victory,
    /// Reports the outcome of a tower attack cycle.
    TowerAttacked {
        /// Tower that attacked.
        tower: TowerId,
        /// Number of enemies affected, including blast victims.
        hits: u32,
    },
    /// Confirms that a tower was purchased and placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of the placed tower.
        kind: TowerKind,
        /// Cell hosting the tower.
        cell: CellCoord,
        /// Cost withdrawn for the purchase.
        cost: u64,
    },
    /// Reports that a placement request was rejected without mutation.
    TowerPlacementRejected {
        /// Type of tower requested.
        kind: TowerKind,
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced one level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the tower.
        level: u32,
    },
    /// Reports that an upgrade request was rejected without mutation.
    TowerUpgradeRejected {
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Cell the tower vacated.
        cell: CellCoord,
        /// Amount refunded to the ledger.
        refund: u64,
    },
    /// Reports that a sale request was rejected without mutation.
    TowerSaleRejected {
        /// Cell provided in the request.
        cell: CellCoord,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Reports a changed currency balance.
    CurrencyChanged {
        /// Currency whose balance changed.
        currency: Currency,
        /// Balance after the change.
        balance: u64,
    },
}

/// Generation-checked handle identifying an enemy slot in the world arena.
///
/// A handle stays unique after its enemy is removed: reusing the slot bumps the
/// generation, so stale handles never alias a newer enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId {
    index: u32,
    generation: u32,
}

impl EnemyId {
    /// Creates a handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based number of a wave within a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a new wave number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new key from the provided name.
            #[must_use]
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrows the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_key!(
    /// Name of an enemy type as authored in the enemy catalog.
    EnemyKind
);
string_key!(
    /// Name of a tower type as authored in the tower catalog.
    TowerKind
);
string_key!(
    /// Name of a currency tracked by the economy ledger.
    Currency
);

impl Currency {
    /// The default currency used for purchases and rewards.
    #[must_use]
    pub fn gold() -> Self {
        Self::new(GOLD)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that authored paths may enter from outside the
/// visible grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// World-space center of the cell for the provided cell edge length.
    #[must_use]
    pub fn center(self, grid_size: f32) -> Vec2 {
        Vec2::new(
            self.column as f32 * grid_size + grid_size * 0.5,
            self.row as f32 * grid_size + grid_size * 0.5,
        )
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Kinds of timed status effects an enemy can carry.
///
/// Bleeding and burning are both damage-over-time effects; they are keyed
/// separately so one source may contribute both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusKind {
    /// Fractional speed reduction.
    Slow,
    /// Damage-over-time applied as bleeding.
    Bleeding,
    /// Damage-over-time applied as burning.
    Burning,
}

impl StatusKind {
    /// Reports whether the effect deals periodic damage.
    #[must_use]
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Bleeding | Self::Burning)
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The cell already hosts a tower.
    #[error("cell is already occupied")]
    Occupied,
    /// The cell belongs to the enemy path.
    #[error("cell lies on the enemy path")]
    OnPath,
    /// The cell lies in a row reserved for the interface.
    #[error("cell lies in a reserved row")]
    ReservedRow,
    /// The cell lies outside the stage grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The ledger cannot cover the level-one cost.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// The requested tower type is not in the catalog.
    #[error("unknown tower type")]
    UnknownTowerKind,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No tower occupies the cell.
    #[error("no tower occupies the cell")]
    MissingTower,
    /// The tower already reached its maximum level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// The tower's type disappeared from the catalog.
    #[error("unknown tower type")]
    UnknownTowerKind,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SaleError {
    /// No tower occupies the cell.
    #[error("no tower occupies the cell")]
    MissingTower,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Handle assigned to the enemy.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// World-space center of the enemy.
    pub position: Vec2,
    /// Current health.
    pub health: u32,
    /// Health the enemy spawned with.
    pub max_health: u32,
    /// Fraction of the total path length covered, in `[0, 1]`.
    pub progress: f32,
    /// Multiplier applied to base speed by active slows, in `[0, 1]`.
    pub speed_multiplier: f32,
    /// Order in which the enemy spawned; drives stable scan order.
    pub spawn_sequence: u64,
}

impl EnemySnapshot {
    /// Health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    /// Reports whether a slow is currently reducing the enemy's speed.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        self.speed_multiplier < 1.0
    }
}

/// Read-only snapshot describing all active enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view ordered by spawn sequence.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.spawn_sequence);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Type of the tower.
    pub kind: TowerKind,
    /// Cell hosting the tower.
    pub cell: CellCoord,
    /// Current level, starting at one.
    pub level: u32,
    /// World-space center of the tower.
    pub position: Vec2,
    /// Targeting radius in world units.
    pub range: f32,
    /// How the tower distributes its effect.
    pub attack_mode: AttackMode,
    /// Policy choosing the primary target.
    pub priority: TargetPriority,
}

/// Read-only snapshot describing all placed towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower described by the snapshot.
    pub tower: TowerId,
    /// Time remaining before the tower may attack again.
    pub ready_in: Duration,
}

/// Read-only view over tower cooldowns ordered by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a cooldown view sorted by tower identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Primary targets chosen for a tower during the current tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower the selection belongs to.
    pub tower: TowerId,
    /// Enemies the tower applies its effect to directly.
    pub enemies: Vec<EnemyId>,
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, EnemyId, PlacementError, StatusKind, UpgradeError, WaveNumber};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, -3);
        assert_eq!(origin.manhattan_distance(destination), 7);
        assert_eq!(destination.manhattan_distance(origin), 7);
    }

    #[test]
    fn cell_center_sits_in_the_middle_of_the_cell() {
        let center = CellCoord::new(2, 3).center(10.0);
        assert!((center.x - 25.0).abs() < f32::EPSILON);
        assert!((center.y - 35.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wave_number_advances_by_one() {
        assert_eq!(WaveNumber::new(3).next(), WaveNumber::new(4));
        assert_eq!(WaveNumber::new(u32::MAX).next(), WaveNumber::new(u32::MAX));
    }

    #[test]
    fn only_bleeding_and_burning_tick_damage() {
        assert!(!StatusKind::Slow.is_damage_over_time());
        assert!(StatusKind::Bleeding.is_damage_over_time());
        assert!(StatusKind::Burning.is_damage_over_time());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn rejection_reasons_round_trip_through_bincode() {
        assert_round_trip(&PlacementError::OnPath);
        assert_round_trip(&UpgradeError::MaxLevel);
    }

    #[test]
    fn enemy_handle_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(4, 9));
    }
}
