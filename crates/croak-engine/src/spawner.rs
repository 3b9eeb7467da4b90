//! Bug spawn timer and wave schedule.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::config::SpawnConfig;

/// Slack for comparing intervals that were reduced by repeated subtraction.
const EPSILON: f64 = 1e-9;

/// Decides when to spawn and which bug type.
///
/// The timer starts full, so the first update spawns. Each spawn counts
/// down the current wave; once a wave is used up and the interval is still
/// above the floor, the interval shrinks by one step and a new wave begins.
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnConfig,
    interval: f64,
    timer: f64,
    wave_remaining: u32,
    kinds: usize,
    spawned: u64,
    rng: Pcg64,
}

impl Spawner {
    /// A spawner choosing among `kinds` bug types.
    pub fn new(config: SpawnConfig, kinds: usize, seed: u64) -> Self {
        Self {
            interval: config.interval,
            timer: config.interval,
            wave_remaining: config.wave_size,
            config,
            kinds,
            spawned: 0,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Advance by `delta` seconds. Returns the index of the bug type to
    /// spawn, if one is due.
    pub fn update(&mut self, delta: f64) -> Option<usize> {
        let mut spawn = None;
        if self.timer >= self.interval && self.kinds > 0 {
            self.timer -= self.interval;
            spawn = Some(self.rng.gen_range(0..self.kinds));
            self.spawned += 1;

            if self.wave_remaining == 0 && self.interval > self.config.min_interval + EPSILON {
                self.interval = (self.interval - self.config.interval_step)
                    .max(self.config.min_interval);
                self.wave_remaining = self.config.wave_size;
                tracing::debug!(interval = self.interval, "spawn interval shortened");
            }
            self.wave_remaining = self.wave_remaining.saturating_sub(1);
        }
        self.timer += delta;
        spawn
    }

    /// Seconds between spawns right now.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Spawns left before the interval may shrink.
    pub fn wave_remaining(&self) -> u32 {
        self.wave_remaining
    }

    /// Bugs spawned so far.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_spawns() {
        let mut spawner = Spawner::new(SpawnConfig::default(), 3, 1);
        assert!(spawner.update(0.1).is_some());
        assert!(spawner.update(0.1).is_none());
        assert_eq!(spawner.spawned(), 1);
    }

    #[test]
    fn waves_shorten_interval_to_floor() {
        let config = SpawnConfig {
            interval: 1.0,
            wave_size: 2,
            interval_step: 0.25,
            min_interval: 0.5,
        };
        let mut spawner = Spawner::new(config, 1, 0);
        let mut intervals = Vec::new();
        for _ in 0..40 {
            // One spawn per update: jump the timer straight to due.
            let delta = spawner.interval();
            assert_eq!(spawner.update(delta), Some(0));
            intervals.push(spawner.interval());
        }
        // Wave of 2 at 1.0, then the third spawn shortens it.
        assert_eq!(&intervals[..4], &[1.0, 1.0, 0.75, 0.75]);
        assert_eq!(*intervals.last().unwrap(), 0.5);
        assert!(intervals.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn same_seed_same_choices() {
        let run = |seed| {
            let mut spawner = Spawner::new(SpawnConfig::default(), 3, seed);
            (0..200).filter_map(|_| spawner.update(0.5)).collect::<Vec<_>>()
        };
        assert_eq!(run(8), run(8));
        assert!(run(8).iter().all(|&k| k < 3));
    }
}
