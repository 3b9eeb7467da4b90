use std::rc::Rc;

use croak_core::Vector2;
use croak_ecs::{Component, ComponentType, Context};

use super::Position;

/// Most waypoints a follower may pass in one update.
pub const MAX_HOPS_PER_TICK: usize = 100;

pub struct PathFollowerConfig {
    /// World positions to visit, in order. The first is the start.
    pub waypoints: Rc<[Vector2]>,
    /// Cells per second.
    pub speed: f64,
}

/// Moves the entity's [`Position`] along a waypoint list.
///
/// Distance left over after reaching a waypoint carries on toward the next
/// one within the same update. Arriving at the final waypoint sets
/// [`reached_end`](Self::reached_end); what happens then is up to the
/// owner.
#[derive(Debug)]
pub struct PathFollower {
    waypoints: Rc<[Vector2]>,
    /// Index of the last waypoint passed.
    index: usize,
    speed: f64,
    reached_end: bool,
}

impl PathFollower {
    /// Index of the last waypoint passed. Larger means further along.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    pub fn waypoints(&self) -> &[Vector2] {
        &self.waypoints
    }

    /// Move from `from` by `distance` along the remaining waypoints and
    /// return the new position.
    fn travel(&mut self, from: Vector2, mut distance: f64) -> Vector2 {
        let mut current = from;
        for _ in 0..MAX_HOPS_PER_TICK {
            if self.index + 1 >= self.waypoints.len() {
                self.reached_end = true;
                break;
            }
            let target = self.waypoints[self.index + 1];
            let to_target = current.distance_to(target);
            if distance < to_target {
                current += (target - current).normalize() * distance;
                break;
            }
            distance -= to_target;
            self.index += 1;
            current = target;
        }
        current
    }
}

impl Component for PathFollower {
    fn update(&mut self, cx: &mut Context<'_>) {
        if self.reached_end {
            return;
        }
        let distance = self.speed * cx.delta();
        let Some(position) = cx.get_mut::<Position>() else {
            return;
        };
        let next = self.travel(position.get(), distance);
        position.set(next);
    }
}

impl ComponentType for PathFollower {
    const NAME: &'static str = "path-follower";
    type Config = PathFollowerConfig;

    fn pre_update(_cx: &mut Context<'_>, config: PathFollowerConfig) -> Self {
        PathFollower {
            waypoints: config.waypoints,
            index: 0,
            speed: config.speed,
            reached_end: false,
        }
    }
}
