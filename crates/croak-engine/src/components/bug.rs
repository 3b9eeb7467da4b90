use std::rc::Rc;

use croak_core::Vector2;
use croak_ecs::{Component, ComponentType, Context};

use super::{Health, PathFollower, PathFollowerConfig, Position, DEATH};
use crate::config::BugType;
use crate::events::{EventQueue, GameEvent};

pub struct BugConfig {
    pub kind: BugType,
    pub waypoints: Rc<[Vector2]>,
    pub queue: EventQueue,
}

/// A creep walking the path.
///
/// Construction adds a [`Position`] at the first waypoint, a [`Health`]
/// whose death is relayed as `bugDied`, and a [`PathFollower`]. Arrival at
/// the last waypoint is relayed once as `bugReachedEnd`.
#[derive(Debug)]
pub struct Bug {
    kind: String,
    worth: i64,
    reported_end: bool,
    queue: EventQueue,
}

impl Bug {
    /// Bug type id.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn worth(&self) -> i64 {
        self.worth
    }
}

impl Component for Bug {
    fn update(&mut self, cx: &mut Context<'_>) {
        if self.reported_end {
            return;
        }
        if cx.get::<PathFollower>().is_some_and(PathFollower::reached_end) {
            self.reported_end = true;
            self.queue.push(GameEvent::BugReachedEnd {
                entity: cx.entity(),
            });
        }
    }
}

impl ComponentType for Bug {
    const NAME: &'static str = "bug";
    type Config = BugConfig;

    fn pre_update(cx: &mut Context<'_>, config: BugConfig) -> Self {
        let BugConfig {
            kind,
            waypoints,
            queue,
        } = config;
        let entity = cx.entity();
        let start = waypoints.first().copied().unwrap_or(Vector2::ZERO);

        if let Err(err) = cx.add::<Position>(start) {
            tracing::warn!(entity = %entity, error = %err, "bug without position");
        }
        match cx.add::<Health>(kind.health) {
            Ok(health) => {
                let queue = queue.clone();
                let worth = kind.worth;
                health.events().on(DEATH, move |death| {
                    queue.push(GameEvent::BugDied {
                        entity: death.entity,
                        worth,
                    });
                });
            }
            Err(err) => tracing::warn!(entity = %entity, error = %err, "bug without health"),
        }
        let follower = PathFollowerConfig {
            waypoints,
            speed: kind.speed,
        };
        if let Err(err) = cx.add::<PathFollower>(follower) {
            tracing::warn!(entity = %entity, error = %err, "bug without path follower");
        }

        Bug {
            kind: kind.id,
            worth: kind.worth,
            reported_end: false,
            queue,
        }
    }
}
