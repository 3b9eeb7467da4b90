//! Headless tower-defense session -- generates a level, buys one frog next
//! to the path and lets the bugs come.
//!
//! Run with:
//!   cargo run --example headless -p croak-engine [-- CONFIG.json [TICKS]]
//!
//! Set `RUST_LOG=croak_engine=debug` to watch phase changes and placements.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context as _;
use croak_engine::prelude::*;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn load_config(path: Option<&str>) -> Result<GameConfig, anyhow::Error> {
    let Some(path) = path else {
        return Ok(GameConfig {
            seed: Some(2024),
            ..GameConfig::default()
        });
    };
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    GameConfig::from_json(&json).with_context(|| format!("parsing {path}"))
}

/// The free cell closest to the first path tile.
fn frog_spot(level: &Level) -> Option<Coord> {
    let start = Vector2::from_coord(*level.path_array().first()?);
    level
        .grid()
        .keys()
        .into_iter()
        .filter(|c| level.check_placement(c.x, c.y).is_ok())
        .min_by(|a, b| {
            let da = Vector2::from_coord(*a).distance_to(start);
            let db = Vector2::from_coord(*b).distance_to(start);
            da.total_cmp(&db)
        })
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = load_config(args.next().as_deref())?;
    let ticks: u64 = match args.next() {
        Some(n) => n.parse().context("TICKS must be a number")?,
        None => 60 * 60,
    };

    let game = Rc::new(RefCell::new(Game::new(config.clone())?));
    let mut tick_loop = TickLoop::new(config.tick.clone());

    // -- event log ----------------------------------------------------------

    let kills = Rc::new(RefCell::new(0u32));
    {
        let game = game.borrow();
        let events = game.events();
        events.on("shopSetItem", |event: &GameEvent| {
            if let GameEvent::ShopSetItem(item) = event {
                println!("shop: {} ({}) costs {}", item.name, item.id, item.price);
            }
        });
        events.on("stateChanged", |event: &GameEvent| {
            if let GameEvent::StateChanged { phase } = event {
                println!("phase -> {phase}");
            }
        });
        let counter = Rc::clone(&kills);
        events.on("bugDied", move |_: &GameEvent| *counter.borrow_mut() += 1);
        events.on("uiSetLives", |event: &GameEvent| {
            if let GameEvent::UiSetLives { lives } = event {
                println!("lives: {lives}");
            }
        });
        game.announce();
    }

    let driven = Rc::clone(&game);
    tick_loop.on_update(move |tick| driven.borrow_mut().update(tick));

    // -- generate -----------------------------------------------------------

    while game.borrow().phase() == Phase::Generating {
        tick_loop.tick();
    }

    {
        let mut game = game.borrow_mut();
        let level = game.level().context("level missing after generation")?;
        println!(
            "level {} ({} path tiles, seed {})",
            &level.fingerprint()[..12],
            level.path_array().len(),
            level.seed()
        );
        let spot = frog_spot(level);
        let kind = game.config().frog_types.first().map(|f| f.id.clone());
        match (spot, kind) {
            (Some(cell), Some(kind)) => {
                let frog = game.place_frog(&kind, cell)?;
                println!("placed {kind} {frog} at {cell:?}");
            }
            _ => println!("nowhere to place a frog"),
        }
    }

    // -- play ---------------------------------------------------------------

    for _ in 0..ticks {
        tick_loop.tick();
        if game.borrow().phase() == Phase::GameOver {
            break;
        }
    }

    let game = game.borrow();
    let snapshot = game.snapshot();
    println!("--- after {} ticks ({:.1}s) ---", snapshot.ticks, snapshot.time);
    println!("phase:   {}", snapshot.phase);
    println!("lives:   {}", snapshot.lives);
    println!("money:   {}", snapshot.money);
    println!("spawned: {}", game.spawner().spawned());
    println!("killed:  {}", kills.borrow());
    println!("alive:   {}", snapshot.bugs.len());
    println!("hash:    {}", snapshot.hash);

    Ok(())
}
