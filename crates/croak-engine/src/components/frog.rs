use std::any::{Any, TypeId};

use croak_core::{Coord, Vector2};
use croak_ecs::{Component, ComponentType, Context};
use serde::{Deserialize, Serialize};

use super::Position;
use crate::config::FrogType;
use crate::events::{AttackMode, EventQueue, GameEvent};

pub struct FrogConfig {
    pub kind: FrogType,
    pub cell: Coord,
    pub queue: EventQueue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrogState {
    /// Attacking every `attack_interval`.
    Ready,
    /// Chewing; no attacks until the meal is done.
    Eating,
}

/// A tower. While ready it raises `frogEatBug` every attack interval; the
/// game resolves targets and damage.
#[derive(Debug)]
pub struct Frog {
    kind: String,
    mode: AttackMode,
    strength: f64,
    range: f64,
    attack_interval: f64,
    eat_duration: f64,
    attack_timer: f64,
    eat_remaining: f64,
    state: FrogState,
    queue: EventQueue,
}

impl Frog {
    fn build(cx: &mut Context<'_>, config: FrogConfig, mode: AttackMode) -> Self {
        let FrogConfig { kind, cell, queue } = config;
        if let Err(err) = cx.add::<Position>(Vector2::from_coord(cell)) {
            tracing::warn!(entity = %cx.entity(), error = %err, "frog without position");
        }
        Frog {
            kind: kind.id,
            mode,
            strength: kind.strength,
            range: kind.range,
            attack_interval: kind.attack_interval,
            eat_duration: kind.eat_duration,
            attack_timer: 0.0,
            eat_remaining: 0.0,
            state: FrogState::Ready,
            queue,
        }
    }

    /// Frog type id.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn mode(&self) -> AttackMode {
        self.mode
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Attack radius in cells.
    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn state(&self) -> FrogState {
        self.state
    }

    pub fn is_eating(&self) -> bool {
        self.state == FrogState::Eating
    }

    /// Seconds until the current meal is finished.
    pub fn eat_remaining(&self) -> f64 {
        self.eat_remaining
    }

    /// Start chewing a kill. Area attackers never eat.
    pub fn start_eating(&mut self) {
        if self.mode == AttackMode::Area || self.eat_duration <= 0.0 {
            return;
        }
        self.state = FrogState::Eating;
        self.eat_remaining = self.eat_duration;
    }

    fn tick(&mut self, cx: &Context<'_>) {
        match self.state {
            FrogState::Eating => {
                self.eat_remaining -= cx.delta();
                if self.eat_remaining <= 0.0 {
                    self.eat_remaining = 0.0;
                    self.state = FrogState::Ready;
                }
            }
            FrogState::Ready => {
                if self.attack_timer >= self.attack_interval {
                    self.queue.push(GameEvent::FrogEatBug {
                        frog: cx.entity(),
                        mode: self.mode,
                    });
                    self.attack_timer -= self.attack_interval;
                }
                self.attack_timer += cx.delta();
            }
        }
    }
}

impl Component for Frog {
    fn update(&mut self, cx: &mut Context<'_>) {
        self.tick(cx);
    }
}

impl ComponentType for Frog {
    const NAME: &'static str = "frog";
    type Config = FrogConfig;

    fn pre_update(cx: &mut Context<'_>, config: FrogConfig) -> Self {
        Frog::build(cx, config, AttackMode::Single)
    }
}

/// A frog that hits every bug in range and never eats.
///
/// Answers lookups for [`Frog`].
#[derive(Debug)]
pub struct PlagueFrog {
    frog: Frog,
}

impl PlagueFrog {
    pub fn frog(&self) -> &Frog {
        &self.frog
    }
}

impl Component for PlagueFrog {
    fn update(&mut self, cx: &mut Context<'_>) {
        self.frog.tick(cx);
    }

    fn upcast(&self, base: TypeId) -> Option<&dyn Any> {
        (base == TypeId::of::<Frog>()).then_some(&self.frog as &dyn Any)
    }

    fn upcast_mut(&mut self, base: TypeId) -> Option<&mut dyn Any> {
        (base == TypeId::of::<Frog>()).then_some(&mut self.frog as &mut dyn Any)
    }
}

impl ComponentType for PlagueFrog {
    const NAME: &'static str = "plague-frog";
    type Config = FrogConfig;

    fn bases() -> Vec<TypeId> {
        vec![TypeId::of::<Frog>()]
    }

    fn pre_update(cx: &mut Context<'_>, config: FrogConfig) -> Self {
        PlagueFrog {
            frog: Frog::build(cx, config, AttackMode::Area),
        }
    }
}
