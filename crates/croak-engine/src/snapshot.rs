//! Serializable view of a session with a BLAKE3 state hash.
//!
//! A [`GameSnapshot`] is what a presentation layer needs to draw a frame:
//! economy, phase, every bug and frog with its world position, and the
//! pending selection. The hash covers all of it, so two sessions driven by
//! the same seed and inputs report the same hash tick for tick.
//!
//! # Usage
//!
//! ```
//! use croak_engine::prelude::*;
//!
//! let config = GameConfig { seed: Some(3), ..GameConfig::default() };
//! let mut a = Game::new(config.clone()).unwrap();
//! let mut b = Game::new(config).unwrap();
//!
//! let mut tick_loop = TickLoop::new(TickConfig::default());
//! for _ in 0..240 {
//!     let tick = tick_loop.tick();
//!     a.update(&tick);
//!     b.update(&tick);
//! }
//!
//! let snapshot = a.snapshot();
//! assert_eq!(snapshot.hash.len(), 64);
//! assert_eq!(snapshot.hash, b.state_hash());
//! ```

use croak_core::{Coord, Vector2};
use croak_ecs::EntityId;
use serde::{Deserialize, Serialize};

use crate::components::{Bug, Frog, FrogState, Health, PathFollower, Position};
use crate::events::{AttackMode, Phase};
use crate::game::{Game, PendingFrog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugView {
    pub entity: EntityId,
    pub kind: String,
    pub position: Vector2,
    pub health: f64,
    /// Last waypoint passed.
    pub path_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrogView {
    pub entity: EntityId,
    pub kind: String,
    pub mode: AttackMode,
    pub position: Vector2,
    pub range: f64,
    pub state: FrogState,
}

/// Point-in-time view of a [`Game`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub ticks: u64,
    pub time: f64,
    pub lives: f64,
    pub money: i64,
    /// Fingerprint of the level, once generated.
    pub level: Option<String>,
    pub path: Vec<Coord>,
    pub bugs: Vec<BugView>,
    pub frogs: Vec<FrogView>,
    pub pending: Option<PendingFrog>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of every other field.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HashableState<'a> {
    phase: Phase,
    ticks: u64,
    time: f64,
    lives: f64,
    money: i64,
    level: &'a Option<String>,
    path: &'a [Coord],
    bugs: &'a [BugView],
    frogs: &'a [FrogView],
    pending: &'a Option<PendingFrog>,
}

fn compute_hash(state: &HashableState<'_>) -> String {
    let json_bytes =
        serde_json::to_vec(state).expect("GameSnapshot state should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Game snapshot methods
// ---------------------------------------------------------------------------

impl Game {
    /// Capture the current state.
    pub fn snapshot(&self) -> GameSnapshot {
        let world = self.world();
        let bugs: Vec<BugView> = self
            .bugs()
            .iter()
            .filter_map(|&entity| {
                let bug = world.get_component::<Bug>(entity)?;
                Some(BugView {
                    entity,
                    kind: bug.kind().to_owned(),
                    position: world.get_component::<Position>(entity)?.get(),
                    health: world.get_component::<Health>(entity).map_or(0.0, Health::value),
                    path_index: world
                        .get_component::<PathFollower>(entity)
                        .map_or(0, PathFollower::index),
                })
            })
            .collect();
        let frogs: Vec<FrogView> = self
            .frogs()
            .iter()
            .filter_map(|&entity| {
                let frog = world.get_component::<Frog>(entity)?;
                Some(FrogView {
                    entity,
                    kind: frog.kind().to_owned(),
                    mode: frog.mode(),
                    position: world.get_component::<Position>(entity)?.get(),
                    range: frog.range(),
                    state: frog.state(),
                })
            })
            .collect();
        let level = self.level().map(|level| level.fingerprint());
        let path = self
            .level()
            .map(|level| level.path_array().to_vec())
            .unwrap_or_default();
        let pending = self.pending().cloned();

        let hash = compute_hash(&HashableState {
            phase: self.phase(),
            ticks: self.ticks(),
            time: self.time(),
            lives: self.lives(),
            money: self.money(),
            level: &level,
            path: &path,
            bugs: &bugs,
            frogs: &frogs,
            pending: &pending,
        });

        GameSnapshot {
            phase: self.phase(),
            ticks: self.ticks(),
            time: self.time(),
            lives: self.lives(),
            money: self.money(),
            level,
            path,
            bugs,
            frogs,
            pending,
            hash,
        }
    }

    /// BLAKE3 hex digest of [`snapshot`](Self::snapshot).
    pub fn state_hash(&self) -> String {
        self.snapshot().hash
    }
}

impl GameSnapshot {
    /// Recompute the hash from the other fields and compare.
    pub fn verify(&self) -> bool {
        let expected = compute_hash(&HashableState {
            phase: self.phase,
            ticks: self.ticks,
            time: self.time,
            lives: self.lives,
            money: self.money,
            level: &self.level,
            path: &self.path,
            bugs: &self.bugs,
            frogs: &self.frogs,
            pending: &self.pending,
        });
        expected == self.hash
    }
}
