//! Serde mirrors of the authored TOML documents.
//!
//! Field names follow the authored keys. Nothing here is validated; see the
//! conversions in the crate root.

use std::collections::BTreeMap;

use serde::Deserialize;

fn default_player_health() -> i64 {
    100
}

fn default_wave_delay() -> f64 {
    3.0
}

fn default_refund_percent() -> i64 {
    50
}

fn default_reserved_rows() -> i64 {
    1
}

fn default_starting_balances() -> BTreeMap<String, i64> {
    BTreeMap::from([(path_defence_core::GOLD.to_owned(), 75)])
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GameDocument {
    #[serde(default)]
    pub(crate) settings: SettingsDocument,
    #[serde(default)]
    pub(crate) enemies: BTreeMap<String, EnemyDocument>,
    #[serde(default)]
    pub(crate) towers: BTreeMap<String, TowerDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SettingsDocument {
    #[serde(default = "default_player_health")]
    pub(crate) player_health: i64,
    #[serde(default = "default_wave_delay")]
    pub(crate) wave_delay: f64,
    #[serde(default = "default_starting_balances")]
    pub(crate) starting_balances: BTreeMap<String, i64>,
    #[serde(default)]
    pub(crate) spawn_order: SpawnOrderDocument,
    #[serde(default)]
    pub(crate) spawn_seed: u64,
    #[serde(default)]
    pub(crate) targeting_seed: u64,
    #[serde(default = "default_refund_percent")]
    pub(crate) sell_refund_percent: i64,
    #[serde(default = "default_reserved_rows")]
    pub(crate) reserved_rows: i64,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            player_health: default_player_health(),
            wave_delay: default_wave_delay(),
            starting_balances: default_starting_balances(),
            spawn_order: SpawnOrderDocument::default(),
            spawn_seed: 0,
            targeting_seed: 0,
            sell_refund_percent: default_refund_percent(),
            reserved_rows: default_reserved_rows(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SpawnOrderDocument {
    #[default]
    Sequential,
    Random,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EnemyDocument {
    #[serde(default = "EnemyDocument::default_health")]
    pub(crate) health: i64,
    #[serde(default = "EnemyDocument::default_speed")]
    pub(crate) speed: f64,
    #[serde(default = "EnemyDocument::default_damage")]
    pub(crate) damage: i64,
    #[serde(default)]
    pub(crate) reward: i64,
    #[serde(default)]
    pub(crate) image: Option<String>,
}

impl EnemyDocument {
    fn default_health() -> i64 {
        100
    }

    fn default_speed() -> f64 {
        100.0
    }

    fn default_damage() -> i64 {
        10
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerDocument {
    #[serde(default)]
    pub(crate) attack_type: Option<String>,
    #[serde(default)]
    pub(crate) attack_priority: Option<String>,
    #[serde(default)]
    pub(crate) max_level: Option<i64>,
    #[serde(default)]
    pub(crate) image: Option<String>,
    pub(crate) levels: Vec<TowerLevelDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerLevelDocument {
    #[serde(default)]
    pub(crate) damage: i64,
    /// Attack period in seconds.
    pub(crate) speed: f64,
    pub(crate) range: f64,
    #[serde(default)]
    pub(crate) cost: i64,
    pub(crate) slow_percent: Option<f64>,
    pub(crate) slow_duration: Option<f64>,
    pub(crate) bleeding_damage: Option<i64>,
    pub(crate) bleeding_duration: Option<f64>,
    pub(crate) burning_damage: Option<i64>,
    pub(crate) burning_duration: Option<f64>,
    pub(crate) add_gold_amount: Option<i64>,
    pub(crate) blast_radius: Option<f64>,
    pub(crate) blast_damage: Option<i64>,
    pub(crate) image: Option<String>,
}

fn default_grid_size() -> f64 {
    64.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StageDocument {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default = "default_grid_size")]
    pub(crate) grid_size: f64,
    pub(crate) columns: i64,
    pub(crate) rows: i64,
    pub(crate) walk_path: Vec<String>,
    #[serde(default)]
    pub(crate) waves: BTreeMap<String, WaveDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WaveDocument {
    #[serde(default)]
    pub(crate) spawn_rate: Option<f64>,
    #[serde(default)]
    pub(crate) enemies: BTreeMap<String, toml::Value>,
}
