//! Fixed-timestep tick driver.
//!
//! The [`TickLoop`] turns either explicit [`tick`](TickLoop::tick) calls or
//! elapsed wall time fed to [`advance`](TickLoop::advance) into a stream of
//! fixed-size [`Tick`]s, published on its own [`EventBus`] under
//! [`UPDATE`]. Every tick carries the same `delta`, and simulation time is
//! derived from the tick count, so a run is reproducible regardless of how
//! the host's frames are spaced.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use croak_engine::tick::{TickConfig, TickLoop};
//!
//! let mut tick_loop = TickLoop::new(TickConfig { fixed_dt: 0.5, ..Default::default() });
//! let seen = Rc::new(Cell::new(0.0));
//! let sink = Rc::clone(&seen);
//! tick_loop.on_update(move |tick| sink.set(tick.time));
//!
//! tick_loop.start();
//! assert_eq!(tick_loop.advance(1.2), 2);
//! assert_eq!(seen.get(), 1.0);
//! assert_eq!(tick_loop.sim_time(), 1.0);
//! ```

use croak_core::{EventBus, NamedEvent};
use serde::{Deserialize, Serialize};

/// Event name ticks are published under.
pub const UPDATE: &str = "update";

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Most ticks a single [`TickLoop::advance`] call may run. Elapsed time
    /// beyond that is dropped so a long host stall does not snowball.
    pub max_catch_up: u32,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz, catching up at most 5 ticks per call.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_catch_up: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// 1-based tick number.
    pub index: u64,
    /// Seconds covered by this tick.
    pub delta: f64,
    /// Simulation time at the end of this tick, in seconds.
    pub time: f64,
}

impl NamedEvent for Tick {
    fn event_name(&self) -> &str {
        UPDATE
    }
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Fixed-interval tick driver.
///
/// [`tick`](Self::tick) and [`run_ticks`](Self::run_ticks) always step.
/// [`advance`](Self::advance) only steps while the loop is started.
pub struct TickLoop {
    events: EventBus<Tick>,
    tick_counter: u64,
    fixed_dt: f64,
    config: TickConfig,
    /// Unspent elapsed time, below `fixed_dt` after `advance`.
    accumulator: f64,
    running: bool,
}

impl TickLoop {
    /// Create a stopped tick loop at tick 0.
    pub fn new(config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            events: EventBus::new(),
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            config,
            accumulator: 0.0,
            running: false,
        }
    }

    /// Subscribe to every tick.
    pub fn on_update<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Tick) + 'static,
    {
        self.events.on(UPDATE, callback);
        self
    }

    pub fn events(&self) -> &EventBus<Tick> {
        &self.events
    }

    // -- control ------------------------------------------------------------

    pub fn start(&mut self) {
        if !self.running {
            tracing::debug!(tick = self.tick_counter, "tick loop started");
        }
        self.running = true;
    }

    /// Stop advancing. Pending accumulated time is discarded.
    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(tick = self.tick_counter, "tick loop stopped");
        }
        self.running = false;
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // -- stepping -----------------------------------------------------------

    /// Execute one tick and publish it.
    pub fn tick(&mut self) -> Tick {
        self.tick_counter += 1;
        let tick = Tick {
            index: self.tick_counter,
            delta: self.fixed_dt,
            time: self.sim_time(),
        };
        self.events.emit(tick);
        tick
    }

    /// Run `count` ticks in sequence. Returns `count`.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        for _ in 0..count {
            self.tick();
        }
        count
    }

    /// Feed `elapsed` seconds of host time and run every whole tick it
    /// covers, up to `max_catch_up`. Returns the number of ticks run.
    ///
    /// Does nothing while stopped. Negative or non-finite input is ignored.
    pub fn advance(&mut self, elapsed: f64) -> u32 {
        if !self.running || !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed;

        let mut ran = 0;
        while self.accumulator >= self.fixed_dt && ran < self.config.max_catch_up {
            self.accumulator -= self.fixed_dt;
            self.tick();
            ran += 1;
        }
        if self.accumulator >= self.fixed_dt {
            let dropped = (self.accumulator / self.fixed_dt).floor() as u64;
            tracing::debug!(dropped, "tick loop fell behind; dropping ticks");
            self.accumulator = 0.0;
        }
        ran
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid drift from repeated
    /// addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_counter", &self.tick_counter)
            .field("fixed_dt", &self.fixed_dt)
            .field("running", &self.running)
            .field("subscribers", &self.events.subscriber_count(UPDATE))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
