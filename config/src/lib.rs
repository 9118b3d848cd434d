#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loader that turns authored TOML documents into validated definitions.
//!
//! Two documents describe a session. The game document carries settings,
//! enemy statistics and tower levels; the stage document carries the grid,
//! the walk path and the waves. Every numeric range is checked here so the
//! simulation can treat its inputs as trusted.

mod documents;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use path_defence_core::{
    AttackMode, Blast, Currency, DebuffTable, DotDebuff, EnemyCatalog, EnemyKind, EnemyStats,
    GameDefinition, GameSettings, PathError, SlowDebuff, SpawnOrder, StageDefinition,
    TargetPriority, TowerCatalog, TowerDefinition, TowerKind, TowerLevel, WaveDefinition,
    WaveNumber, WaveTable, WaypointPath,
};
use thiserror::Error;
use tracing::{info, warn};

use documents::{
    EnemyDocument, GameDocument, SettingsDocument, SpawnOrderDocument, StageDocument,
    TowerDocument, TowerLevelDocument, WaveDocument,
};

/// Spawn interval applied when a wave omits `spawn_rate`.
pub const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_secs(2);

/// Errors raised while loading configuration. All of them are fatal for the stage.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read from disk.
    #[error("failed to read {}", path.display())]
    Io {
        /// Location of the document.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML or does not match the expected shape.
    #[error("failed to parse {document} document")]
    Parse {
        /// Which document failed.
        document: &'static str,
        /// Underlying parser failure.
        #[source]
        source: toml::de::Error,
    },
    /// The stage's walk path is malformed.
    #[error("invalid walk path in stage `{stage}`")]
    Path {
        /// Stage whose path failed.
        stage: String,
        /// Underlying path failure.
        #[source]
        source: PathError,
    },
    /// A session setting is out of range.
    #[error("invalid setting `{field}`: {reason}")]
    Settings {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
    /// An enemy definition is out of range.
    #[error("invalid enemy `{kind}`: {reason}")]
    Enemy {
        /// Offending enemy type.
        kind: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A tower definition is out of range.
    #[error("invalid tower `{kind}`: {reason}")]
    Tower {
        /// Offending tower type.
        kind: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A wave definition is out of range.
    #[error("invalid wave `{wave}`: {reason}")]
    Wave {
        /// Key of the offending wave.
        wave: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The stage layout is out of range.
    #[error("invalid stage `{stage}`: {reason}")]
    Stage {
        /// Offending stage.
        stage: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Reads and validates a game document from disk.
pub fn load_game(path: impl AsRef<Path>) -> Result<GameDefinition, ConfigError> {
    let path = path.as_ref();
    let game = parse_game(&read(path)?)?;
    info!(
        path = %path.display(),
        enemies = game.enemies.iter().count(),
        towers = game.towers.iter().count(),
        "game configuration loaded"
    );
    Ok(game)
}

/// Reads and validates a stage document from disk.
///
/// The file stem names the stage unless the document sets `name`.
pub fn load_stage(path: impl AsRef<Path>) -> Result<StageDefinition, ConfigError> {
    let path = path.as_ref();
    let fallback = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stage".to_owned());
    let stage = parse_stage(&read(path)?, &fallback)?;
    info!(
        path = %path.display(),
        stage = %stage.name,
        waves = stage.waves.len(),
        "stage configuration loaded"
    );
    Ok(stage)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses and validates a game document.
pub fn parse_game(source: &str) -> Result<GameDefinition, ConfigError> {
    let document: GameDocument = toml::from_str(source).map_err(|source| ConfigError::Parse {
        document: "game",
        source,
    })?;

    let settings = convert_settings(document.settings)?;
    let enemies = document
        .enemies
        .into_iter()
        .map(|(kind, enemy)| {
            let stats = convert_enemy(&kind, enemy)?;
            Ok((EnemyKind::new(kind), stats))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    let towers = document
        .towers
        .into_iter()
        .map(|(kind, tower)| {
            let definition = convert_tower(&kind, tower)?;
            Ok((TowerKind::new(kind), definition))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(GameDefinition {
        settings,
        enemies: EnemyCatalog::new(enemies),
        towers: TowerCatalog::new(towers),
    })
}

/// Parses and validates a stage document; `fallback_name` applies when it has no `name`.
pub fn parse_stage(source: &str, fallback_name: &str) -> Result<StageDefinition, ConfigError> {
    let document: StageDocument = toml::from_str(source).map_err(|source| ConfigError::Parse {
        document: "stage",
        source,
    })?;
    let name = document.name.unwrap_or_else(|| fallback_name.to_owned());
    let stage_error = |reason: String| ConfigError::Stage {
        stage: name.clone(),
        reason,
    };

    let columns = u32::try_from(document.columns)
        .ok()
        .filter(|columns| *columns > 0)
        .ok_or_else(|| stage_error(format!("columns must be positive, got {}", document.columns)))?;
    let rows = u32::try_from(document.rows)
        .ok()
        .filter(|rows| *rows > 0)
        .ok_or_else(|| stage_error(format!("rows must be positive, got {}", document.rows)))?;

    let path = WaypointPath::parse(&document.walk_path, document.grid_size as f32).map_err(
        |source| ConfigError::Path {
            stage: name.clone(),
            source,
        },
    )?;

    let waves = document
        .waves
        .into_iter()
        .map(|(key, wave)| convert_wave(&key, wave))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(StageDefinition {
        name,
        columns,
        rows,
        path,
        waves: WaveTable::new(waves),
    })
}

fn convert_settings(document: SettingsDocument) -> Result<GameSettings, ConfigError> {
    let settings_error = |field, reason: String| ConfigError::Settings { field, reason };

    let player_health = positive_u32(document.player_health)
        .ok_or_else(|| settings_error("player_health", "must be positive".to_owned()))?;
    let wave_delay = seconds(document.wave_delay)
        .ok_or_else(|| settings_error("wave_delay", "must be non-negative".to_owned()))?;
    let sell_refund_percent = u32::try_from(document.sell_refund_percent)
        .ok()
        .filter(|percent| *percent <= 100)
        .ok_or_else(|| settings_error("sell_refund_percent", "must be within 0..=100".to_owned()))?;
    let reserved_rows = u32::try_from(document.reserved_rows)
        .map_err(|_| settings_error("reserved_rows", "must be non-negative".to_owned()))?;

    let starting_balances = document
        .starting_balances
        .into_iter()
        .map(|(currency, amount)| {
            u64::try_from(amount)
                .map(|amount| (Currency::new(currency.clone()), amount))
                .map_err(|_| {
                    settings_error(
                        "starting_balances",
                        format!("balance of `{currency}` must be non-negative"),
                    )
                })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let spawn_order = match document.spawn_order {
        SpawnOrderDocument::Sequential => SpawnOrder::Sequential,
        SpawnOrderDocument::Random => SpawnOrder::Random {
            seed: document.spawn_seed,
        },
    };

    Ok(GameSettings {
        player_health,
        wave_delay,
        starting_balances,
        spawn_order,
        targeting_seed: document.targeting_seed,
        sell_refund_percent,
        reserved_rows,
    })
}

fn convert_enemy(kind: &str, document: EnemyDocument) -> Result<EnemyStats, ConfigError> {
    let enemy_error = |reason: &str| ConfigError::Enemy {
        kind: kind.to_owned(),
        reason: reason.to_owned(),
    };

    let health =
        positive_u32(document.health).ok_or_else(|| enemy_error("health must be positive"))?;
    if !document.speed.is_finite() || document.speed <= 0.0 {
        return Err(enemy_error("speed must be positive"));
    }
    let damage =
        u32::try_from(document.damage).map_err(|_| enemy_error("damage must be non-negative"))?;
    let reward =
        u64::try_from(document.reward).map_err(|_| enemy_error("reward must be non-negative"))?;

    Ok(EnemyStats {
        health,
        speed: document.speed as f32,
        damage,
        reward,
        image: document.image,
    })
}

fn convert_tower(kind: &str, document: TowerDocument) -> Result<TowerDefinition, ConfigError> {
    let tower_error = |reason: String| ConfigError::Tower {
        kind: kind.to_owned(),
        reason,
    };

    let attack_mode = match document.attack_type.as_deref() {
        None | Some("single_target") => AttackMode::SingleTarget,
        Some(name) if name.eq_ignore_ascii_case("aoe") => AttackMode::SingleTarget,
        Some("around" | "area") => AttackMode::Area,
        Some(other) => return Err(tower_error(format!("unknown attack type `{other}`"))),
    };
    let priority = document
        .attack_priority
        .as_deref()
        .map(TargetPriority::from_name)
        .unwrap_or_default();

    let mut levels = document.levels;
    if let Some(max_level) = document.max_level {
        let max_level = usize::try_from(max_level)
            .ok()
            .filter(|max_level| (1..=levels.len()).contains(max_level))
            .ok_or_else(|| {
                tower_error(format!(
                    "max_level {max_level} must be within 1..={}",
                    levels.len()
                ))
            })?;
        levels.truncate(max_level);
    }
    if levels.is_empty() {
        return Err(tower_error("at least one level is required".to_owned()));
    }

    let levels = levels
        .into_iter()
        .enumerate()
        .map(|(index, level)| {
            convert_level(level, attack_mode, document.image.as_deref())
                .map_err(|reason| tower_error(format!("level {}: {reason}", index + 1)))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(TowerDefinition {
        attack_mode,
        priority,
        levels,
    })
}

fn convert_level(
    document: TowerLevelDocument,
    attack_mode: AttackMode,
    fallback_image: Option<&str>,
) -> Result<TowerLevel, String> {
    let damage = u32::try_from(document.damage).map_err(|_| "damage must be non-negative")?;
    let cooldown = seconds(document.speed)
        .filter(|cooldown| !cooldown.is_zero())
        .ok_or("speed must be a positive number of seconds")?;
    if !document.range.is_finite() || document.range < 0.0 {
        return Err("range must be non-negative".to_owned());
    }
    let cost = u64::try_from(document.cost).map_err(|_| "cost must be non-negative")?;

    let slow = match (document.slow_percent, document.slow_duration) {
        (None, None) => None,
        (Some(percent), Some(duration)) => {
            if !(0.0..=100.0).contains(&percent) {
                return Err("slow_percent must be within 0..=100".to_owned());
            }
            Some(SlowDebuff {
                fraction: (percent / 100.0) as f32,
                duration: seconds(duration).ok_or("slow_duration must be non-negative")?,
            })
        }
        _ => return Err("slow_percent and slow_duration must be set together".to_owned()),
    };
    let bleeding = dot("bleeding", document.bleeding_damage, document.bleeding_duration)?;
    let burning = dot("burning", document.burning_damage, document.burning_duration)?;
    let gold_on_hit = document
        .add_gold_amount
        .map(u64::try_from)
        .transpose()
        .map_err(|_| "add_gold_amount must be non-negative")?;

    let blast = match (document.blast_radius, document.blast_damage) {
        (None, None) => None,
        (Some(_), Some(_)) if attack_mode == AttackMode::Area => {
            return Err("blasts require a single-target attack type".to_owned());
        }
        (Some(radius), Some(damage)) => {
            if !radius.is_finite() || radius < 0.0 {
                return Err("blast_radius must be non-negative".to_owned());
            }
            Some(Blast {
                radius: radius as f32,
                damage: u32::try_from(damage).map_err(|_| "blast_damage must be non-negative")?,
            })
        }
        _ => return Err("blast_radius and blast_damage must be set together".to_owned()),
    };

    Ok(TowerLevel {
        damage,
        cooldown,
        range: document.range as f32,
        cost,
        debuffs: DebuffTable {
            slow,
            bleeding,
            burning,
            gold_on_hit,
        },
        blast,
        image: document.image.or_else(|| fallback_image.map(str::to_owned)),
    })
}

fn dot(
    name: &str,
    damage: Option<i64>,
    duration: Option<f64>,
) -> Result<Option<DotDebuff>, String> {
    match (damage, duration) {
        (None, None) => Ok(None),
        (Some(damage), Some(duration)) => Ok(Some(DotDebuff {
            damage: u32::try_from(damage)
                .map_err(|_| format!("{name}_damage must be non-negative"))?,
            duration: seconds(duration)
                .ok_or_else(|| format!("{name}_duration must be non-negative"))?,
        })),
        _ => Err(format!("{name}_damage and {name}_duration must be set together")),
    }
}

fn convert_wave(
    key: &str,
    document: WaveDocument,
) -> Result<(WaveNumber, WaveDefinition), ConfigError> {
    let wave_error = |reason: &str| ConfigError::Wave {
        wave: key.to_owned(),
        reason: reason.to_owned(),
    };

    let number = key
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| wave_error("wave keys must be positive integers"))?;
    let spawn_interval = match document.spawn_rate {
        None => DEFAULT_SPAWN_INTERVAL,
        Some(rate) => match seconds(rate).filter(|interval| !interval.is_zero()) {
            Some(interval) => interval,
            None => {
                warn!(wave = key, rate, "spawn_rate must be positive, using the default");
                DEFAULT_SPAWN_INTERVAL
            }
        },
    };
    let enemies = document
        .enemies
        .into_iter()
        .filter_map(|(kind, count)| match count.as_integer() {
            Some(count) => Some((EnemyKind::new(kind), count)),
            None => {
                warn!(wave = key, %kind, %count, "enemy count is not an integer, skipping");
                None
            }
        })
        .collect();

    Ok((
        WaveNumber::new(number),
        WaveDefinition {
            spawn_interval,
            enemies,
        },
    ))
}

fn positive_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|value| *value > 0)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_keys_must_be_positive_numbers() {
        let wave = || WaveDocument {
            spawn_rate: None,
            enemies: Default::default(),
        };
        assert!(convert_wave("0", wave()).is_err());
        assert!(convert_wave("first", wave()).is_err());
        let (number, definition) = convert_wave("3", wave()).expect("valid wave");
        assert_eq!(number, WaveNumber::new(3));
        assert_eq!(definition.spawn_interval, DEFAULT_SPAWN_INTERVAL);
    }

    #[test]
    fn bad_wave_entries_fall_back_instead_of_failing() {
        let document = WaveDocument {
            spawn_rate: Some(-1.0),
            enemies: [
                ("ghoul".to_owned(), toml::Value::Float(1.5)),
                ("grunt".to_owned(), toml::Value::Integer(2)),
                ("imp".to_owned(), toml::Value::String("many".to_owned())),
            ]
            .into_iter()
            .collect(),
        };

        let (_, definition) = convert_wave("1", document).expect("wave still loads");
        assert_eq!(definition.spawn_interval, DEFAULT_SPAWN_INTERVAL);
        assert_eq!(definition.enemies, vec![(EnemyKind::new("grunt"), 2)]);
    }

    #[test]
    fn negative_seconds_are_rejected() {
        assert_eq!(seconds(-0.5), None);
        assert_eq!(seconds(f64::NAN), None);
        assert_eq!(seconds(1.5), Some(Duration::from_millis(1_500)));
    }

    #[test]
    fn half_specified_debuffs_are_rejected() {
        assert!(dot("burning", Some(3), None).is_err());
        assert_eq!(dot("burning", None, None), Ok(None));
    }
}
