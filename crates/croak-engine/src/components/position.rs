use croak_core::Vector2;
use croak_ecs::{Component, ComponentType, Context};

/// World position in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vector2);

impl Position {
    pub fn get(&self) -> Vector2 {
        self.0
    }

    pub fn set(&mut self, position: Vector2) {
        self.0 = position;
    }
}

impl Component for Position {}

impl ComponentType for Position {
    const NAME: &'static str = "position";
    type Config = Vector2;

    fn pre_update(_cx: &mut Context<'_>, position: Vector2) -> Self {
        Position(position)
    }
}
