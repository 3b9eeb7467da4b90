use croak_core::{EventBus, NamedEvent};
use croak_ecs::{Component, ComponentType, Context, EntityId};

/// Event name of [`Death`] on a health's own bus.
pub const DEATH: &str = "death";

/// Fired once when a health runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Death {
    pub entity: EntityId,
}

impl NamedEvent for Death {
    fn event_name(&self) -> &str {
        DEATH
    }
}

/// Hit points. At zero or below, the next update fires [`DEATH`] and
/// destroys the entity.
pub struct Health {
    health: f64,
    max: f64,
    dead: bool,
    events: EventBus<Death>,
}

impl Health {
    pub fn value(&self) -> f64 {
        self.health
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Subtract `amount`. Returns `true` if this hit is the one that
    /// brought the health from above zero to zero or below.
    pub fn damage(&mut self, amount: f64) -> bool {
        let was_alive = self.is_alive();
        self.health -= amount;
        was_alive && !self.is_alive()
    }

    pub fn set(&mut self, health: f64) {
        self.health = health;
    }

    /// This health's own bus; carries [`DEATH`].
    pub fn events(&self) -> &EventBus<Death> {
        &self.events
    }
}

impl Component for Health {
    fn update(&mut self, cx: &mut Context<'_>) {
        if self.is_alive() {
            return;
        }
        if !self.dead {
            self.dead = true;
            self.events.emit(Death {
                entity: cx.entity(),
            });
        }
        cx.destroy_entity();
    }
}

impl ComponentType for Health {
    const NAME: &'static str = "health";
    type Config = f64;

    fn pre_update(_cx: &mut Context<'_>, health: f64) -> Self {
        Health {
            health,
            max: health,
            dead: false,
            events: EventBus::new(),
        }
    }
}

impl std::fmt::Debug for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Health")
            .field("health", &self.health)
            .field("max", &self.max)
            .field("dead", &self.dead)
            .finish()
    }
}
