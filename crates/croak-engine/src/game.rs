//! The tower-defense session: level generation, economy, placement and
//! combat resolution on top of the ECS world.
//!
//! Each [`Game::update`] while playing:
//!
//! 1. updates the world (frogs tick their attack timers, bugs walk);
//! 2. resolves the events components queued, in order: frog attacks pick
//!    targets and deal damage, deaths pay out, arrivals cost lives;
//! 3. prunes destroyed entities;
//! 4. runs the spawner.

use std::rc::Rc;

use croak_core::{Coord, EventBus, Vector2};
use croak_ecs::{EcsError, EntityId, World};
use croak_levelgen::{GenerationStep, Level, LevelGenerator, PlacementError};
use serde::{Deserialize, Serialize};

use crate::components::{
    self, Bug, BugConfig, Frog, FrogConfig, Health, PathFollower, PlagueFrog, Position,
};
use crate::config::{ConfigError, FrogType, FrogVariant, GameConfig};
use crate::events::{AttackMode, EventQueue, GameEvent, Phase, ShopItem};
use crate::geometry::WorldGeometry;
use crate::spawner::Spawner;
use crate::tick::Tick;

/// Keeps the spawn stream independent of the level stream of the same seed.
const SPAWN_STREAM: u64 = 0x2545_F491_4F6C_DD1D;

/// Errors from player actions and setup.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("not allowed while {phase}")]
    WrongPhase { phase: Phase },

    #[error("unknown frog type '{id}'")]
    UnknownFrogType { id: String },

    #[error("unknown bug type '{id}'")]
    UnknownBugType { id: String },

    #[error("no frog is selected")]
    NoPendingFrog,

    #[error("{entity} is not a placed frog")]
    UnknownFrog { entity: EntityId },

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("costs {price} but only {money} available")]
    InsufficientFunds { price: i64, money: i64 },

    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A frog following the cursor, not yet placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFrog {
    pub entity: EntityId,
    pub kind: String,
    pub price: i64,
    pub cell: Coord,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// One play session.
pub struct Game {
    config: GameConfig,
    seed: u64,
    phase: Phase,
    world: World,
    events: Rc<EventBus<GameEvent>>,
    queue: EventQueue,
    geometry: WorldGeometry,
    generator: Option<LevelGenerator>,
    level: Option<Level>,
    waypoints: Rc<[Vector2]>,
    spawner: Spawner,
    lives: f64,
    money: i64,
    bugs: Vec<EntityId>,
    frogs: Vec<EntityId>,
    pending: Option<PendingFrog>,
    ticks: u64,
    time: f64,
}

impl Game {
    /// Validate `config` and start generating the level.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut level_config = config.level.clone();
        level_config.seed = level_config.seed.or(Some(seed));
        let generator = LevelGenerator::new(level_config);
        Self::build(config, seed, Some(generator), None)
    }

    /// Start a session on an already generated level, skipping the
    /// generating phase.
    pub fn with_level(config: GameConfig, level: Level) -> Result<Self, GameError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::build(config, seed, None, Some(level))
    }

    fn build(
        config: GameConfig,
        seed: u64,
        generator: Option<LevelGenerator>,
        level: Option<Level>,
    ) -> Result<Self, GameError> {
        let mut world = World::new();
        components::register_all(&mut world)?;
        let spawner = Spawner::new(
            config.spawn.clone(),
            config.bug_types.len(),
            seed ^ SPAWN_STREAM,
        );
        let mut game = Self {
            seed,
            phase: Phase::Generating,
            world,
            events: Rc::new(EventBus::new()),
            queue: EventQueue::new(),
            geometry: WorldGeometry::new(config.cell_size),
            generator,
            level: None,
            waypoints: Rc::from(Vec::new()),
            spawner,
            lives: config.lives,
            money: config.money,
            bugs: Vec::new(),
            frogs: Vec::new(),
            pending: None,
            ticks: 0,
            time: 0.0,
            config,
        };
        if let Some(level) = level {
            game.begin_play(level);
        }
        Ok(game)
    }

    // -- accessors ----------------------------------------------------------

    /// Bus the game publishes [`GameEvent`]s on.
    pub fn events(&self) -> &Rc<EventBus<GameEvent>> {
        &self.events
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lives(&self) -> f64 {
        self.lives
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    /// The level, once generation has finished.
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn geometry(&self) -> &WorldGeometry {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: WorldGeometry) {
        self.geometry = geometry;
    }

    /// Live bugs, oldest first.
    pub fn bugs(&self) -> &[EntityId] {
        &self.bugs
    }

    /// Placed frogs, in placement order.
    pub fn frogs(&self) -> &[EntityId] {
        &self.frogs
    }

    pub fn pending(&self) -> Option<&PendingFrog> {
        self.pending.as_ref()
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulation time of the last update.
    pub fn time(&self) -> f64 {
        self.time
    }

    // -- driving ------------------------------------------------------------

    /// Advance the session by one tick.
    pub fn update(&mut self, tick: &Tick) {
        self.ticks += 1;
        self.time = tick.time;
        match self.phase {
            Phase::Generating => self.generate_step(),
            Phase::Playing => self.play(tick.delta, tick.time),
            Phase::GameOver => {}
        }
    }

    fn generate_step(&mut self) {
        let Some(generator) = self.generator.as_mut() else {
            return;
        };
        if let GenerationStep::Collapsing { remaining } = generator.step() {
            tracing::trace!(remaining, "level generating");
            return;
        }
        if let Some(generator) = self.generator.take() {
            let level = generator.finish();
            self.begin_play(level);
        }
    }

    fn begin_play(&mut self, level: Level) {
        self.waypoints = level
            .path_array()
            .iter()
            .map(|&c| Vector2::from_coord(c))
            .collect();
        tracing::debug!(
            fingerprint = %level.fingerprint(),
            path_tiles = level.path_array().len(),
            "level ready"
        );
        self.level = Some(level);
        self.set_phase(Phase::Playing);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        tracing::debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
        self.events.emit(GameEvent::StateChanged { phase });
    }

    fn play(&mut self, delta: f64, time: f64) {
        if self.lives <= 0.0 {
            return;
        }
        self.world.update(delta, time);

        while let Some(event) = self.queue.pop() {
            self.resolve(event);
        }

        let world = &self.world;
        self.bugs.retain(|&bug| world.is_alive(bug));
        self.frogs.retain(|&frog| world.is_alive(frog));
        self.world.prune_destroyed();

        if self.phase != Phase::Playing {
            return;
        }
        if let Some(index) = self.spawner.update(delta) {
            let id = self.config.bug_types[index].id.clone();
            if let Err(err) = self.spawn_bug(&id) {
                tracing::warn!(bug = %id, error = %err, "spawn failed");
            }
        }
    }

    /// Announce lives, money and the shop catalog.
    pub fn announce(&self) {
        self.events.emit(GameEvent::UiSetLives { lives: self.lives });
        self.events.emit(GameEvent::UiSetMoney { money: self.money });
        for frog in &self.config.frog_types {
            self.events.emit(GameEvent::ShopSetItem(ShopItem {
                id: frog.id.clone(),
                name: frog.name.clone(),
                price: frog.price,
            }));
        }
    }

    // -- combat -------------------------------------------------------------

    fn resolve(&mut self, event: GameEvent) {
        match &event {
            GameEvent::FrogEatBug { frog, mode } => self.attack(*frog, *mode),
            GameEvent::BugDied { worth, .. } => {
                self.money += worth;
                self.events.emit(event.clone());
                self.events.emit(GameEvent::UiSetMoney { money: self.money });
                return;
            }
            GameEvent::BugReachedEnd { entity } => {
                let remaining = self
                    .world
                    .get_component::<Health>(*entity)
                    .map_or(0.0, Health::value);
                if remaining <= 0.0 {
                    // Already killed; its health pays out on the next update.
                    tracing::trace!(bug = %entity, "dead bug reached the end");
                    return;
                }
                self.world.destroy_entity(*entity);
                self.lives -= remaining;
                self.events.emit(event.clone());
                self.events.emit(GameEvent::UiSetLives { lives: self.lives });
                if self.lives <= 0.0 {
                    tracing::debug!(ticks = self.ticks, "out of lives");
                    self.set_phase(Phase::GameOver);
                }
                return;
            }
            _ => {}
        }
        self.events.emit(event);
    }

    /// Whether `bug` can still be targeted: alive and not yet out at the
    /// end of the path.
    fn targetable(&self, bug: EntityId) -> bool {
        self.world.is_alive(bug)
            && self
                .world
                .get_component::<Health>(bug)
                .is_some_and(Health::is_alive)
            && !self
                .world
                .get_component::<PathFollower>(bug)
                .is_some_and(PathFollower::reached_end)
    }

    fn position_of(&self, entity: EntityId) -> Option<Vector2> {
        self.world.get_component::<Position>(entity).map(Position::get)
    }

    fn attack(&mut self, frog: EntityId, mode: AttackMode) {
        let Some(frog_position) = self.position_of(frog) else {
            return;
        };
        let Some((strength, range)) = self
            .world
            .get_component::<Frog>(frog)
            .map(|f| (f.strength(), f.range()))
        else {
            return;
        };

        let mut in_range = Vec::new();
        for &bug in &self.bugs {
            if !self.targetable(bug) {
                continue;
            }
            let Some(position) = self.position_of(bug) else {
                continue;
            };
            let distance = position.distance_to(frog_position);
            let index = self
                .world
                .get_component::<PathFollower>(bug)
                .map_or(0, PathFollower::index);
            in_range.push((bug, distance, index));
        }

        match mode {
            AttackMode::Single => {
                // Furthest along the path wins; ties keep the oldest bug.
                let mut target: Option<(EntityId, usize)> = None;
                for &(bug, distance, index) in &in_range {
                    if distance <= range && target.map_or(true, |(_, furthest)| index > furthest) {
                        target = Some((bug, index));
                    }
                }
                let Some((bug, _)) = target else {
                    return;
                };
                if self.damage(bug, strength) {
                    tracing::trace!(frog = %frog, bug = %bug, "frog eats");
                    if let Some(f) = self.world.get_component_mut::<Frog>(frog) {
                        f.start_eating();
                    }
                }
            }
            AttackMode::Area => {
                for &(bug, distance, _) in &in_range {
                    if distance < range {
                        self.damage(bug, strength);
                    }
                }
            }
        }
    }

    /// Returns whether this hit was lethal.
    fn damage(&mut self, bug: EntityId, amount: f64) -> bool {
        self.world
            .get_component_mut::<Health>(bug)
            .is_some_and(|health| health.damage(amount))
    }

    // -- spawning -----------------------------------------------------------

    /// Spawn a bug of type `id` at the start of the path.
    pub fn spawn_bug(&mut self, id: &str) -> Result<EntityId, GameError> {
        self.require_playing()?;
        let kind = self
            .config
            .bug_type(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownBugType { id: id.to_owned() })?;
        let entity = self.world.create_entity();
        let config = BugConfig {
            kind,
            waypoints: Rc::clone(&self.waypoints),
            queue: self.queue.clone(),
        };
        self.world.add_component::<Bug>(entity, config)?;
        self.bugs.push(entity);
        tracing::trace!(bug = %entity, kind = id, "bug spawned");
        Ok(entity)
    }

    // -- placement ----------------------------------------------------------

    fn require_playing(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Playing => Ok(()),
            phase => Err(GameError::WrongPhase { phase }),
        }
    }

    fn frog_type(&self, id: &str) -> Result<FrogType, GameError> {
        self.config
            .frog_type(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownFrogType { id: id.to_owned() })
    }

    fn create_frog(&mut self, kind: FrogType, cell: Coord) -> Result<EntityId, GameError> {
        let entity = self.world.create_entity();
        let variant = kind.variant;
        let config = FrogConfig {
            kind,
            cell,
            queue: self.queue.clone(),
        };
        let added = match variant {
            FrogVariant::Frog => self.world.add_component::<Frog>(entity, config).map(|_| ()),
            FrogVariant::Plague => self
                .world
                .add_component::<PlagueFrog>(entity, config)
                .map(|_| ()),
        };
        if let Err(err) = added {
            self.world.destroy_entity(entity);
            return Err(err.into());
        }
        Ok(entity)
    }

    /// Whether a frog costing `price` may be placed on `cell` right now.
    pub fn check_placement(&self, cell: Coord, price: i64) -> Result<(), GameError> {
        let level = self.level.as_ref().ok_or(GameError::WrongPhase { phase: self.phase })?;
        level.check_placement(cell.x, cell.y)?;
        if self.money < price {
            return Err(GameError::InsufficientFunds {
                price,
                money: self.money,
            });
        }
        Ok(())
    }

    /// Toggle the shop selection.
    ///
    /// Any pending frog is discarded. Selecting the type that was already
    /// pending leaves nothing selected and returns `None`; otherwise a new
    /// inactive frog of type `id` becomes pending.
    pub fn select_frog(&mut self, id: &str) -> Result<Option<EntityId>, GameError> {
        self.require_playing()?;
        let kind = self.frog_type(id)?;
        if let Some(pending) = self.pending.take() {
            self.world.destroy_entity(pending.entity);
            if pending.kind == id {
                return Ok(None);
            }
        }
        let cell = self
            .level
            .as_ref()
            .and_then(|level| level.path().first())
            .unwrap_or_default();
        let price = kind.price;
        let entity = self.create_frog(kind, cell)?;
        self.world.set_active(entity, false);
        self.pending = Some(PendingFrog {
            entity,
            kind: id.to_owned(),
            price,
            cell,
        });
        Ok(Some(entity))
    }

    /// Move the pending frog to `cell` and report whether it could be
    /// placed there.
    pub fn hover(&mut self, cell: Coord) -> Result<(), GameError> {
        let pending = self.pending.as_mut().ok_or(GameError::NoPendingFrog)?;
        pending.cell = cell;
        let (entity, price) = (pending.entity, pending.price);
        if let Some(position) = self.world.get_component_mut::<Position>(entity) {
            position.set(Vector2::from_coord(cell));
        }
        self.check_placement(cell, price)
    }

    /// [`hover`](Self::hover) at the cell under a canvas point.
    pub fn hover_canvas(&mut self, point: Vector2) -> Result<(), GameError> {
        let cell = self.geometry.canvas_to_cell(point);
        self.hover(cell)
    }

    /// Place the pending frog where it hovers. On failure it stays pending.
    pub fn place_pending(&mut self) -> Result<EntityId, GameError> {
        self.require_playing()?;
        let pending = self.pending.clone().ok_or(GameError::NoPendingFrog)?;
        self.check_placement(pending.cell, pending.price)?;
        self.pending = None;
        self.commit_frog(pending.entity, pending.cell, pending.price)?;
        Ok(pending.entity)
    }

    /// Buy and place a frog of type `id` on `cell` directly.
    pub fn place_frog(&mut self, id: &str, cell: Coord) -> Result<EntityId, GameError> {
        self.require_playing()?;
        let kind = self.frog_type(id)?;
        let price = kind.price;
        self.check_placement(cell, price)?;
        let entity = self.create_frog(kind, cell)?;
        self.commit_frog(entity, cell, price)?;
        Ok(entity)
    }

    /// Take a placed frog off the board and free its cell. Returns the
    /// cell. The price is not refunded.
    pub fn remove_frog(&mut self, frog: EntityId) -> Result<Coord, GameError> {
        self.require_playing()?;
        let index = self
            .frogs
            .iter()
            .position(|&f| f == frog)
            .ok_or(GameError::UnknownFrog { entity: frog })?;
        let cell = self
            .position_of(frog)
            .map(|position| self.geometry.snap(position))
            .unwrap_or_default();
        if let Some(level) = self.level.as_mut() {
            if !level.vacate(cell.x, cell.y, frog.to_raw()) {
                tracing::warn!(frog = %frog, cell = ?cell, "frog was not on its cell");
            }
        }
        self.world.destroy_entity(frog);
        self.frogs.remove(index);
        tracing::debug!(frog = %frog, cell = ?cell, "frog removed");
        Ok(cell)
    }

    fn commit_frog(&mut self, entity: EntityId, cell: Coord, price: i64) -> Result<(), GameError> {
        if let Some(level) = self.level.as_mut() {
            level.occupy(cell.x, cell.y, entity.to_raw())?;
        }
        self.world.set_active(entity, true);
        self.money -= price;
        self.frogs.push(entity);
        tracing::debug!(frog = %entity, cell = ?cell, money = self.money, "frog placed");
        self.events.emit(GameEvent::UiSetMoney { money: self.money });
        Ok(())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("lives", &self.lives)
            .field("money", &self.money)
            .field("bugs", &self.bugs.len())
            .field("frogs", &self.frogs.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}
