//! Immutable definitions consumed by the simulation.
//!
//! These values are produced by an external loader and validated before they
//! reach the world. The simulation never mutates them.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Currency, EnemyKind, TowerKind, WaveNumber, WaypointPath};

/// Combat and reward statistics of one enemy type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyStats {
    /// Health the enemy spawns with.
    pub health: u32,
    /// Base speed in world units per second.
    pub speed: f32,
    /// Damage dealt to the player on reaching the end of the path.
    pub damage: u32,
    /// Gold credited when the enemy is killed.
    pub reward: u64,
    /// Image reference forwarded to presentation layers.
    pub image: Option<String>,
}

/// Enemy statistics keyed by type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnemyCatalog {
    entries: BTreeMap<EnemyKind, EnemyStats>,
}

impl EnemyCatalog {
    /// Creates a catalog from the provided entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (EnemyKind, EnemyStats)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Looks up the statistics for an enemy type.
    #[must_use]
    pub fn get(&self, kind: &EnemyKind) -> Option<&EnemyStats> {
        self.entries.get(kind)
    }

    /// Reports whether the catalog defines the enemy type.
    #[must_use]
    pub fn contains(&self, kind: &EnemyKind) -> bool {
        self.entries.contains_key(kind)
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&EnemyKind, &EnemyStats)> {
        self.entries.iter()
    }
}

/// How a tower distributes its effect among enemies in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMode {
    /// One enemy chosen by the priority policy, optionally followed by a blast.
    SingleTarget,
    /// Every enemy in range.
    Area,
}

/// Policy that orders in-range enemies when choosing a single target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetPriority {
    /// Furthest along the path.
    #[default]
    First,
    /// Least progress along the path.
    Last,
    /// Lowest current health.
    LowestHealth,
    /// Highest current health.
    HighestHealth,
    /// Uniformly random among enemies in range.
    Random,
}

impl TargetPriority {
    /// Resolves an authored policy name; unknown names fall back to [`Self::First`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "first" | "first_enemy" => Self::First,
            "last" | "last_enemy" => Self::Last,
            "lowest_health" => Self::LowestHealth,
            "highest_health" => Self::HighestHealth,
            "random" => Self::Random,
            _ => Self::First,
        }
    }
}

/// Timed speed reduction applied on hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowDebuff {
    /// Fraction of base speed removed, in `[0, 1]`.
    pub fraction: f32,
    /// Time the slow lasts after the latest hit.
    pub duration: Duration,
}

/// Timed damage-over-time applied on hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotDebuff {
    /// Damage dealt every application period.
    pub damage: u32,
    /// Time the effect lasts after the latest hit.
    pub duration: Duration,
}

/// Debuffs a tower level applies to every enemy it hits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DebuffTable {
    /// Optional slow.
    pub slow: Option<SlowDebuff>,
    /// Optional bleeding damage-over-time.
    pub bleeding: Option<DotDebuff>,
    /// Optional burning damage-over-time.
    pub burning: Option<DotDebuff>,
    /// Gold deposited per enemy hit, independent of kills.
    pub gold_on_hit: Option<u64>,
}

/// Secondary explosion around a single-target tower's primary target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blast {
    /// Radius in grid units around the primary target.
    pub radius: f32,
    /// Damage dealt to every other enemy inside the radius.
    pub damage: u32,
}

/// Statistics of one tower level.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerLevel {
    /// Direct damage per hit.
    pub damage: u32,
    /// Attack period.
    pub cooldown: Duration,
    /// Targeting radius in grid units.
    pub range: f32,
    /// Purchase cost of this level.
    pub cost: u64,
    /// Debuffs applied on hit.
    pub debuffs: DebuffTable,
    /// Optional blast around the primary target.
    pub blast: Option<Blast>,
    /// Image reference forwarded to presentation layers.
    pub image: Option<String>,
}

/// Complete definition of a tower type.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerDefinition {
    /// How the tower distributes its effect.
    pub attack_mode: AttackMode,
    /// Policy choosing the primary target.
    pub priority: TargetPriority,
    /// Per-level statistics; index zero describes level one.
    pub levels: Vec<TowerLevel>,
}

impl TowerDefinition {
    /// Highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    /// Statistics for the one-based level, if defined.
    #[must_use]
    pub fn level(&self, level: u32) -> Option<&TowerLevel> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }
}

/// Tower definitions keyed by type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TowerCatalog {
    entries: BTreeMap<TowerKind, TowerDefinition>,
}

impl TowerCatalog {
    /// Creates a catalog from the provided entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (TowerKind, TowerDefinition)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Looks up the definition of a tower type.
    #[must_use]
    pub fn get(&self, kind: &TowerKind) -> Option<&TowerDefinition> {
        self.entries.get(kind)
    }

    /// Iterates over all entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&TowerKind, &TowerDefinition)> {
        self.entries.iter()
    }
}

/// One wave of a stage.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveDefinition {
    /// Time between consecutive spawns.
    pub spawn_interval: Duration,
    /// Authored `(type, count)` pairs. Non-positive counts are kept so the
    /// scheduler can report and skip them.
    pub enemies: Vec<(EnemyKind, i64)>,
}

/// Waves of a stage keyed by one-based number.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveTable {
    waves: BTreeMap<WaveNumber, WaveDefinition>,
}

impl WaveTable {
    /// Creates a table from the provided waves.
    #[must_use]
    pub fn new(waves: impl IntoIterator<Item = (WaveNumber, WaveDefinition)>) -> Self {
        Self {
            waves: waves.into_iter().collect(),
        }
    }

    /// Looks up a wave by number.
    #[must_use]
    pub fn get(&self, wave: WaveNumber) -> Option<&WaveDefinition> {
        self.waves.get(&wave)
    }

    /// Number of defined waves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether the table defines no waves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}

/// Layout and waves of one stage.
#[derive(Clone, Debug, PartialEq)]
pub struct StageDefinition {
    /// Human readable stage name.
    pub name: String,
    /// Number of grid columns available for placement.
    pub columns: u32,
    /// Number of grid rows available for placement.
    pub rows: u32,
    /// Path walked by every enemy; carries the cell edge length.
    pub path: WaypointPath,
    /// Waves of the stage.
    pub waves: WaveTable,
}

impl StageDefinition {
    /// Edge length of a grid cell in world units.
    #[must_use]
    pub fn grid_size(&self) -> f32 {
        self.path.grid_size()
    }
}

/// Order in which queued enemies leave the spawn queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnOrder {
    /// Queue order: wave table order, each type's count in sequence.
    #[default]
    Sequential,
    /// Uniform random pop driven by a seeded generator.
    Random {
        /// Seed of the generator; equal seeds replay identically.
        seed: u64,
    },
}

/// Session-wide tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSettings {
    /// Health the player starts with.
    pub player_health: u32,
    /// Pause between a completed wave and the next one.
    pub wave_delay: Duration,
    /// Balances the ledger starts with.
    pub starting_balances: Vec<(Currency, u64)>,
    /// Spawn queue pop order.
    pub spawn_order: SpawnOrder,
    /// Seed used by random target selection.
    pub targeting_seed: u64,
    /// Share of the level-one cost refunded when selling, in percent.
    pub sell_refund_percent: u32,
    /// Number of top rows reserved for the interface.
    pub reserved_rows: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            player_health: 100,
            wave_delay: Duration::from_secs(3),
            starting_balances: vec![(Currency::gold(), 75)],
            spawn_order: SpawnOrder::Sequential,
            targeting_seed: 0,
            sell_refund_percent: 50,
            reserved_rows: 1,
        }
    }
}

/// Everything a session needs besides the stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameDefinition {
    /// Session-wide tunables.
    pub settings: GameSettings,
    /// Enemy statistics.
    pub enemies: EnemyCatalog,
    /// Tower definitions.
    pub towers: TowerCatalog,
}
