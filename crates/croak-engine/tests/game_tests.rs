//! End-to-end gameplay tests.
//!
//! Sessions start on pre-generated levels and are driven with hand-made
//! one-second ticks so every step of the combat and economy rules can be
//! followed exactly.

use std::cell::RefCell;
use std::rc::Rc;

use croak_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn level(seed: u64) -> Level {
    LevelGenerator::generate(LevelConfig {
        seed: Some(seed),
        ..LevelConfig::default()
    })
}

fn bug(health: f64, speed: f64, worth: i64) -> BugType {
    BugType {
        id: "test-bug".to_owned(),
        health,
        speed,
        worth,
        ..BugType::default()
    }
}

fn frog(variant: FrogVariant, strength: f64, range: f64) -> FrogType {
    FrogType {
        id: "test-frog".to_owned(),
        price: 100,
        attack_interval: 0.5,
        eat_duration: 2.0,
        strength,
        range,
        variant,
        ..FrogType::default()
    }
}

fn config(bug: BugType, frog: FrogType) -> GameConfig {
    GameConfig {
        seed: Some(1),
        bug_types: vec![bug],
        frog_types: vec![frog],
        ..GameConfig::default()
    }
}

/// Run `n` one-second ticks.
fn run(game: &mut Game, n: u64) {
    for _ in 0..n {
        let index = game.ticks() + 1;
        game.update(&Tick {
            index,
            delta: 1.0,
            time: index as f64,
        });
    }
}

/// A free cell within `radius` of the path start.
fn spot_near_start(game: &Game, radius: f64) -> Coord {
    let level = game.level().unwrap();
    let start = Vector2::from_coord(level.path_array()[0]);
    level
        .grid()
        .keys()
        .into_iter()
        .find(|&c| {
            level.check_placement(c.x, c.y).is_ok()
                && Vector2::from_coord(c).distance_to(start) <= radius
        })
        .unwrap()
}

fn record(game: &Game) -> Rc<RefCell<Vec<GameEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in [
        "bugDied",
        "bugReachedEnd",
        "frogEatBug",
        "stateChanged",
        "uiSetLives",
        "uiSetMoney",
        "shopSetItem",
    ] {
        let sink = Rc::clone(&log);
        game.events()
            .on(name, move |event: &GameEvent| sink.borrow_mut().push(event.clone()));
    }
    log
}

// ---------------------------------------------------------------------------
// Economy and lives
// ---------------------------------------------------------------------------

#[test]
fn bug_reaching_end_costs_remaining_health() {
    let cfg = config(bug(3.0, 100.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    let mut game = Game::with_level(cfg, level(4)).unwrap();
    let log = record(&game);

    run(&mut game, 1);
    assert_eq!(game.bugs().len(), 1);
    let walker = game.bugs()[0];

    run(&mut game, 1);
    assert_eq!(game.lives(), 22.0);
    assert!(game.bugs().is_empty());
    assert!(!game.world().is_alive(walker));

    let log = log.borrow();
    assert!(log.contains(&GameEvent::BugReachedEnd { entity: walker }));
    assert!(log.contains(&GameEvent::UiSetLives { lives: 22.0 }));
    assert!(!log.iter().any(|e| matches!(e, GameEvent::BugDied { .. })));
}

#[test]
fn running_out_of_lives_ends_the_game() {
    let mut cfg = config(bug(5.0, 100.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    cfg.lives = 3.0;
    let mut game = Game::with_level(cfg, level(4)).unwrap();
    let log = record(&game);

    run(&mut game, 2);
    assert_eq!(game.phase(), Phase::GameOver);
    assert_eq!(game.lives(), -2.0);
    assert!(log.borrow().contains(&GameEvent::StateChanged {
        phase: Phase::GameOver
    }));

    // Nothing moves after game over.
    let hash = game.state_hash();
    let spawned = game.spawner().spawned();
    run(&mut game, 5);
    assert_eq!(game.spawner().spawned(), spawned);
    assert_eq!(game.lives(), -2.0);
    assert_ne!(game.state_hash(), hash, "tick counter still advances");
}

#[test]
fn frog_kills_eats_and_earns() {
    let cfg = config(bug(1.0, 0.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    let mut game = Game::with_level(cfg, level(6)).unwrap();
    let log = record(&game);

    let cell = spot_near_start(&game, 3.0);
    let frog = game.place_frog("test-frog", cell).unwrap();
    assert_eq!(game.money(), 0);

    // Tick 1: the bug spawns. Tick 2: the frog bites it to zero.
    run(&mut game, 2);
    let victim = game.bugs()[0];
    assert!(game.world().get_component::<Frog>(frog).unwrap().is_eating());
    assert_eq!(game.money(), 0);

    // Tick 3: the bug's health destroys it and the death pays out.
    run(&mut game, 1);
    assert!(game.bugs().is_empty());
    assert_eq!(game.money(), 10);

    let log = log.borrow();
    assert!(log.contains(&GameEvent::FrogEatBug {
        frog,
        mode: AttackMode::Single
    }));
    assert!(log.contains(&GameEvent::BugDied {
        entity: victim,
        worth: 10
    }));
    assert!(log.contains(&GameEvent::UiSetMoney { money: 10 }));
}

#[test]
fn eating_frog_does_not_attack() {
    let mut cfg = config(bug(1.0, 0.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    cfg.spawn.interval = 1.0;
    let mut game = Game::with_level(cfg, level(6)).unwrap();
    let cell = spot_near_start(&game, 3.0);
    let frog = game.place_frog("test-frog", cell).unwrap();

    // Bite at tick 2, chew through ticks 3 and 4.
    run(&mut game, 2);
    let attacks = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&attacks);
    game.events()
        .on("frogEatBug", move |_: &GameEvent| *sink.borrow_mut() += 1);
    run(&mut game, 2);
    assert_eq!(*attacks.borrow(), 0);
    assert_eq!(
        game.world().get_component::<Frog>(frog).unwrap().state(),
        FrogState::Ready
    );
}

#[test]
fn plague_frog_hits_everything_in_range_and_never_eats() {
    let cfg = config(bug(1.0, 0.0, 5), frog(FrogVariant::Plague, 0.5, 4.0));
    let mut game = Game::with_level(cfg, level(6)).unwrap();
    let cell = spot_near_start(&game, 3.0);
    let frog = game.place_frog("test-frog", cell).unwrap();

    // Looked up as a plain frog, through its base.
    assert_eq!(
        game.world().get_component::<Frog>(frog).unwrap().mode(),
        AttackMode::Area
    );
    assert!(game.world().has_component::<PlagueFrog>(frog));

    run(&mut game, 1);
    game.spawn_bug("test-bug").unwrap();
    assert_eq!(game.bugs().len(), 2);

    // Two half-strength bites kill both bugs.
    run(&mut game, 2);
    for &bug in game.bugs() {
        let health = game.world().get_component::<Health>(bug).unwrap();
        assert_eq!(health.value(), 0.0);
    }
    assert!(!game.world().get_component::<Frog>(frog).unwrap().is_eating());

    run(&mut game, 1);
    assert_eq!(game.money(), 10);
}

#[test]
fn bite_landing_as_bug_escapes_costs_lives_once() {
    let cfg = config(bug(3.0, 100.0, 10), frog(FrogVariant::Frog, 5.0, 100.0));
    let mut game = Game::with_level(cfg, level(4)).unwrap();
    let log = record(&game);
    let cell = spot_near_start(&game, 20.0);
    let frog = game.place_frog("test-frog", cell).unwrap();

    // Tick 1 spawns the bug. On tick 2 the frog's attack and the bug's
    // arrival are queued together, the older frog first.
    run(&mut game, 2);
    assert_eq!(game.lives(), 22.0);
    assert!(game.bugs().is_empty());
    assert_eq!(game.money(), 0);
    assert!(!game.world().get_component::<Frog>(frog).unwrap().is_eating());

    let log = log.borrow();
    assert!(log.iter().any(|e| matches!(e, GameEvent::FrogEatBug { .. })));
    assert!(!log.iter().any(|e| matches!(e, GameEvent::BugDied { .. })));
    assert!(log
        .iter()
        .all(|e| !matches!(e, GameEvent::UiSetLives { lives } if *lives > 25.0)));
}

#[test]
fn bug_killed_short_of_the_end_pays_and_costs_nothing() {
    let level = level(4);
    let span = (level.path_array().len() - 1) as f64;
    let cfg = config(bug(3.0, span * 0.75, 10), frog(FrogVariant::Frog, 5.0, 100.0));
    let mut game = Game::with_level(cfg, level).unwrap();
    let log = record(&game);
    let cell = spot_near_start(&game, 20.0);
    game.place_frog("test-frog", cell).unwrap();

    // Bitten on tick 2 three quarters of the way along. On tick 3 its
    // health removes it before it can walk the rest.
    run(&mut game, 3);
    assert_eq!(game.lives(), 25.0);
    assert_eq!(game.money(), 10);
    assert!(game.bugs().is_empty());

    let log = log.borrow();
    assert!(log.iter().any(|e| matches!(e, GameEvent::BugDied { worth: 10, .. })));
    assert!(!log.iter().any(|e| matches!(e, GameEvent::BugReachedEnd { .. })));
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

#[test]
fn placement_rules() {
    let cfg = config(bug(1.0, 1.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    let mut game = Game::with_level(cfg, level(9)).unwrap();

    let on_path = game.level().unwrap().path_array()[2];
    let result = game.place_frog("test-frog", on_path);
    assert!(matches!(
        result,
        Err(GameError::Placement(PlacementError::OnPath { .. }))
    ));

    let result = game.place_frog("test-frog", Coord::new(50, 50));
    assert!(matches!(
        result,
        Err(GameError::Placement(PlacementError::NoCell { .. }))
    ));

    let result = game.place_frog("no-such-frog", Coord::new(0, 0));
    assert!(matches!(result, Err(GameError::UnknownFrogType { .. })));

    let cell = spot_near_start(&game, 6.0);
    game.place_frog("test-frog", cell).unwrap();
    let result = game.place_frog("test-frog", cell);
    assert!(matches!(
        result,
        Err(GameError::Placement(PlacementError::Occupied { .. }))
    ));

    let other = spot_near_start(&game, 20.0);
    let result = game.place_frog("test-frog", other);
    assert!(matches!(
        result,
        Err(GameError::InsufficientFunds {
            price: 100,
            money: 0
        })
    ));
    assert_eq!(game.frogs().len(), 1);
}

#[test]
fn select_hover_place() {
    let mut cfg = config(bug(1.0, 1.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    cfg.frog_types.push(FrogType {
        id: "other".to_owned(),
        price: 10,
        ..FrogType::default()
    });
    let mut game = Game::with_level(cfg, level(2)).unwrap();

    assert!(matches!(game.hover(Coord::new(0, 0)), Err(GameError::NoPendingFrog)));

    // Selecting the same type twice clears the selection.
    let first = game.select_frog("test-frog").unwrap().unwrap();
    assert!(!game.world().is_active(first));
    assert_eq!(game.select_frog("test-frog").unwrap(), None);
    assert!(game.pending().is_none());
    assert!(!game.world().is_alive(first));

    // Switching types replaces the pending frog.
    let a = game.select_frog("test-frog").unwrap().unwrap();
    let b = game.select_frog("other").unwrap().unwrap();
    assert_ne!(a, b);
    assert!(!game.world().is_alive(a));
    assert_eq!(game.pending().unwrap().kind, "other");

    let on_path = game.level().unwrap().path_array()[0];
    assert!(game.hover(on_path).is_err());
    assert!(game.place_pending().is_err());
    assert!(game.pending().is_some());

    let cell = spot_near_start(&game, 6.0);
    let canvas = game.geometry().cell_to_canvas(cell);
    game.hover_canvas(canvas).unwrap();
    assert_eq!(
        game.world().get_component::<Position>(b).unwrap().get(),
        Vector2::from_coord(cell)
    );

    let placed = game.place_pending().unwrap();
    assert_eq!(placed, b);
    assert!(game.world().is_active(b));
    assert_eq!(game.money(), 90);
    assert_eq!(game.frogs(), &[b]);
    assert!(game.pending().is_none());
    assert!(game.level().unwrap().cell(cell.x, cell.y).unwrap().is_occupied());
}

#[test]
fn removing_a_frog_frees_its_cell() {
    let cfg = config(bug(1.0, 1.0, 10), frog(FrogVariant::Frog, 1.0, 4.0));
    let mut game = Game::with_level(cfg, level(2)).unwrap();
    let cell = spot_near_start(&game, 6.0);
    let frog = game.place_frog("test-frog", cell).unwrap();
    assert!(game.level().unwrap().check_placement(cell.x, cell.y).is_err());

    assert_eq!(game.remove_frog(frog).unwrap(), cell);
    assert!(game.frogs().is_empty());
    assert!(!game.world().is_alive(frog));
    assert!(game.level().unwrap().check_placement(cell.x, cell.y).is_ok());
    assert_eq!(game.money(), 0);

    assert!(matches!(
        game.remove_frog(frog),
        Err(GameError::UnknownFrog { .. })
    ));
}

#[test]
fn announce_fills_ui_and_shop() {
    let game = Game::with_level(GameConfig::default(), level(1)).unwrap();
    let log = record(&game);
    game.announce();
    let log = log.borrow();
    assert_eq!(log[0], GameEvent::UiSetLives { lives: 25.0 });
    assert_eq!(log[1], GameEvent::UiSetMoney { money: 100 });
    let shop: Vec<_> = log[2..]
        .iter()
        .map(|e| match e {
            GameEvent::ShopSetItem(item) => (item.id.as_str(), item.price),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(
        shop,
        vec![("frog", 100), ("fast-frog", 120), ("plague-frog", 140)]
    );
}

// ---------------------------------------------------------------------------
// Generation and determinism
// ---------------------------------------------------------------------------

#[test]
fn actions_rejected_while_generating() {
    let mut game = Game::new(GameConfig {
        seed: Some(5),
        ..GameConfig::default()
    })
    .unwrap();
    assert_eq!(game.phase(), Phase::Generating);
    assert!(matches!(
        game.select_frog("frog"),
        Err(GameError::WrongPhase {
            phase: Phase::Generating
        })
    ));
    assert!(game.level().is_none());
}

#[test]
fn driven_by_tick_loop_deterministically() {
    let play = || {
        let game = Rc::new(RefCell::new(
            Game::new(GameConfig {
                seed: Some(77),
                ..GameConfig::default()
            })
            .unwrap(),
        ));
        let mut tick_loop = TickLoop::new(TickConfig::default());
        let driven = Rc::clone(&game);
        tick_loop.on_update(move |tick| driven.borrow_mut().update(tick));
        tick_loop.run_ticks(600);
        let game = game.borrow();
        assert_eq!(game.ticks(), 600);
        assert_eq!(game.phase(), Phase::Playing);
        assert!(game.spawner().spawned() > 0);
        let snapshot = game.snapshot();
        assert!(snapshot.verify());
        snapshot
    };
    let a = play();
    let b = play();
    assert_eq!(a.hash, b.hash);
    assert_eq!(a, b);
}
