//! Game configuration: economy, spawn schedule, bug and frog catalogs.
//!
//! Every struct carries `#[serde(default)]`, so a JSON document only needs
//! the fields it changes. `{}` is the stock game. Durations are seconds.

use croak_levelgen::LevelConfig;
use serde::{Deserialize, Serialize};

use crate::tick::TickConfig;

/// Errors from loading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config must define at least one {kind} type")]
    Empty { kind: &'static str },

    #[error("duplicate {kind} type id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f64 },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: i64,
        max: i64,
    },
}

/// Largest accepted `level.terrain_radius`.
pub const MAX_TERRAIN_RADIUS: i32 = 64;

/// Largest accepted `level.path_bounds`.
pub const MAX_PATH_BOUNDS: i32 = 64;

/// Largest accepted `level.path_length`; the walk recurses once per tile.
pub const MAX_PATH_LENGTH: usize = 1024;

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// A kind of bug the spawner can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugType {
    pub id: String,
    pub name: String,
    pub health: f64,
    /// Path cells per second.
    pub speed: f64,
    /// Money paid out when the bug dies.
    pub worth: i64,
    /// Opaque presentation key.
    pub asset_source: String,
}

impl Default for BugType {
    fn default() -> Self {
        Self {
            id: "fly".to_owned(),
            name: "Fly".to_owned(),
            health: 1.0,
            speed: 2.0,
            worth: 10,
            asset_source: "flySheet".to_owned(),
        }
    }
}

/// Which frog component a frog type is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrogVariant {
    /// Bites the bug furthest along the path, then eats it on a kill.
    #[default]
    Frog,
    /// Damages every bug in range and never eats.
    Plague,
}

/// A frog the shop sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrogType {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub asset_source: String,
    /// Seconds between attacks.
    pub attack_interval: f64,
    /// Seconds spent eating after a kill.
    pub eat_duration: f64,
    /// Damage per attack.
    pub strength: f64,
    /// Attack radius in cells.
    pub range: f64,
    pub variant: FrogVariant,
}

impl Default for FrogType {
    fn default() -> Self {
        Self {
            id: "frog".to_owned(),
            name: "Froggy".to_owned(),
            price: 100,
            asset_source: "frogSheet".to_owned(),
            attack_interval: 1.0,
            eat_duration: 2.0,
            strength: 1.0,
            range: 4.0,
            variant: FrogVariant::Frog,
        }
    }
}

fn default_bug_types() -> Vec<BugType> {
    let bug = |id: &str, name: &str, health, speed, worth, asset: &str| BugType {
        id: id.to_owned(),
        name: name.to_owned(),
        health,
        speed,
        worth,
        asset_source: asset.to_owned(),
    };
    vec![
        bug("fly", "Fly", 1.0, 2.0, 10, "flySheet"),
        bug("spider", "Spider", 5.0, 1.0, 30, "spiderSheet"),
        bug("butterfly", "Butterfly", 3.0, 3.0, 20, "butterflySheet"),
    ]
}

fn default_frog_types() -> Vec<FrogType> {
    vec![
        FrogType::default(),
        FrogType {
            id: "fast-frog".to_owned(),
            name: "Fast Froggy".to_owned(),
            price: 120,
            asset_source: "fastFrogSheet".to_owned(),
            attack_interval: 0.6,
            strength: 0.75,
            range: 3.0,
            ..FrogType::default()
        },
        FrogType {
            id: "plague-frog".to_owned(),
            name: "Plague Froggy".to_owned(),
            price: 140,
            asset_source: "plagueFrogSheet".to_owned(),
            attack_interval: 0.5,
            strength: 0.25,
            range: 2.0,
            variant: FrogVariant::Plague,
            ..FrogType::default()
        },
    ]
}

// ---------------------------------------------------------------------------
// SpawnConfig
// ---------------------------------------------------------------------------

/// Bug spawn schedule.
///
/// One bug every `interval` seconds. After each wave of `wave_size` bugs the
/// interval shrinks by `interval_step`, down to `min_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub interval: f64,
    pub wave_size: u32,
    pub interval_step: f64,
    pub min_interval: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval: 2.5,
            wave_size: 6,
            interval_step: 0.05,
            min_interval: 0.25,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Complete game setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub lives: f64,
    pub money: i64,
    pub spawn: SpawnConfig,
    /// Spawn candidates, picked uniformly.
    pub bug_types: Vec<BugType>,
    /// Shop catalog, in display order.
    pub frog_types: Vec<FrogType>,
    pub tick: TickConfig,
    /// Canvas units per cell side.
    pub cell_size: f64,
    pub level: LevelConfig,
    /// Seeds spawning, and the level when it has no seed of its own.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lives: 25.0,
            money: 100,
            spawn: SpawnConfig::default(),
            bug_types: default_bug_types(),
            frog_types: default_frog_types(),
            tick: TickConfig::default(),
            cell_size: 40.0,
            level: LevelConfig::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the game relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("lives", self.lives)?;
        non_negative("money", self.money as f64)?;
        positive("tick.fixed_dt", self.tick.fixed_dt)?;
        positive("cell_size", self.cell_size)?;
        positive("spawn.interval", self.spawn.interval)?;
        positive("spawn.min_interval", self.spawn.min_interval)?;
        non_negative("spawn.interval_step", self.spawn.interval_step)?;

        let level = &self.level;
        non_negative("level.terrain_radius", f64::from(level.terrain_radius))?;
        non_negative("level.path_bounds", f64::from(level.path_bounds))?;
        at_most(
            "level.terrain_radius",
            i64::from(level.terrain_radius),
            i64::from(MAX_TERRAIN_RADIUS),
        )?;
        at_most(
            "level.path_bounds",
            i64::from(level.path_bounds),
            i64::from(MAX_PATH_BOUNDS),
        )?;
        at_most(
            "level.path_length",
            i64::try_from(level.path_length).unwrap_or(i64::MAX),
            MAX_PATH_LENGTH as i64,
        )?;

        if self.bug_types.is_empty() {
            return Err(ConfigError::Empty { kind: "bug" });
        }
        if self.frog_types.is_empty() {
            return Err(ConfigError::Empty { kind: "frog" });
        }
        unique_ids("bug", self.bug_types.iter().map(|b| b.id.as_str()))?;
        unique_ids("frog", self.frog_types.iter().map(|f| f.id.as_str()))?;

        for bug in &self.bug_types {
            positive(&format!("bug '{}' health", bug.id), bug.health)?;
            non_negative(&format!("bug '{}' speed", bug.id), bug.speed)?;
            non_negative(&format!("bug '{}' worth", bug.id), bug.worth as f64)?;
        }
        for frog in &self.frog_types {
            positive(&format!("frog '{}' attack_interval", frog.id), frog.attack_interval)?;
            non_negative(&format!("frog '{}' eat_duration", frog.id), frog.eat_duration)?;
            non_negative(&format!("frog '{}' strength", frog.id), frog.strength)?;
            non_negative(&format!("frog '{}' range", frog.id), frog.range)?;
            non_negative(&format!("frog '{}' price", frog.id), frog.price as f64)?;
        }
        Ok(())
    }

    pub fn bug_type(&self, id: &str) -> Option<&BugType> {
        self.bug_types.iter().find(|b| b.id == id)
    }

    pub fn frog_type(&self, id: &str) -> Option<&FrogType> {
        self.frog_types.iter().find(|f| f.id == id)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_owned(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field: field.to_owned(),
            value,
        })
    }
}

fn at_most(field: &'static str, value: i64, max: i64) -> Result<(), ConfigError> {
    if value <= max {
        Ok(())
    } else {
        Err(ConfigError::TooLarge { field, value, max })
    }
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                kind,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
