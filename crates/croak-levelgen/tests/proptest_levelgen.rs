//! Property tests for path walking and level generation.
//!
//! Paths are generated from random seeds, start points, bounds and lengths;
//! the structural guarantees of the walk must hold for all of them. Levels
//! are checked for reproducibility and placement consistency.

use croak_core::Coord;
use croak_levelgen::prelude::*;
use croak_levelgen::{PathBounds, Propagation};
use proptest::prelude::*;

fn direction_strategy() -> impl Strategy<Value = Option<Direction>> {
    prop_oneof![
        Just(None),
        prop::sample::select(Direction::ALL.to_vec()).prop_map(Some),
    ]
}

fn manhattan(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn walk_is_a_bounded_non_touching_snake(
        seed in any::<u64>(),
        radius in 1..7i32,
        start_x in -6..7i32,
        start_y in -6..7i32,
        direction in direction_strategy(),
        length in 0..60usize,
    ) {
        let bounds = PathBounds::symmetric(radius);
        let mut generator = PathGenerator::with_seed(seed).with_bounds(bounds);
        let path = generator.generate(start_x, start_y, direction, length, Path::new());

        prop_assert!(path.len() <= length);
        if length == 0 {
            prop_assert!(path.is_empty());
            return Ok(());
        }
        prop_assert_eq!(path.first(), Some(Coord::new(start_x, start_y)));

        let tiles = path.coords();
        for (i, &tile) in tiles.iter().enumerate() {
            prop_assert_eq!(path.index_of(tile.x, tile.y), Some(i));
            // Every tile after the caller-supplied start is inside the box.
            if i > 0 {
                prop_assert!(bounds.contains(tile));
            }
            for (j, &other) in tiles.iter().enumerate().skip(i + 1) {
                prop_assert_eq!(manhattan(tile, other) == 1, j == i + 1);
            }
        }
    }

    #[test]
    fn forced_first_step_is_honored_when_taken(
        seed in any::<u64>(),
        direction in prop::sample::select(Direction::ALL.to_vec()),
    ) {
        let mut generator = PathGenerator::with_seed(seed);
        let path = generator.generate(0, 0, Some(direction), 10, Path::new());
        prop_assert!(path.len() >= 2);
        prop_assert_eq!(path.coords()[1], direction.step(Coord::new(0, 0)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn levels_are_reproducible_and_consistent(
        seed in any::<u64>(),
        pass_start in any::<bool>(),
    ) {
        let config = LevelConfig {
            seed: Some(seed),
            propagation: if pass_start { Propagation::PassStart } else { Propagation::Live },
            ..LevelConfig::default()
        };
        let a = LevelGenerator::generate(config.clone());
        let b = LevelGenerator::generate(config);

        prop_assert_eq!(a.fingerprint(), b.fingerprint());
        prop_assert_eq!(a.path_array(), b.path_array());
        prop_assert_eq!(a.seed(), seed);

        for (coord, cell) in a.grid().iter() {
            prop_assert_eq!((cell.x, cell.y), (coord.x, coord.y));
            prop_assert_eq!(cell.on_path, a.path().contains(coord.x, coord.y));
            if !cell.on_path {
                prop_assert!(a.check_placement(coord.x, coord.y).is_ok());
            }
        }
    }
}
