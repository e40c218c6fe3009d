use civsim::{
    civilisation::DEFAULT_POWER_RANGE, CivilisationAttributes, CivilisationId, Grid, Registry, Rgb,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn single(power: f64) -> (CivilisationId, Registry) {
    let a = CivilisationId::new(1);
    let registry = Registry::neutral_only().with(
        a,
        CivilisationAttributes {
            color: Rgb(220, 40, 40),
            power,
        },
    );
    (a, registry)
}

#[test]
fn centre_seed_at_full_power_takes_three_by_three_in_one_turn() {
    let (a, registry) = single(1.0);
    let mut grid = Grid::new(3, 3);
    grid.set(1, 1, a);

    grid.apply_turn(a, &registry, &mut ChaCha8Rng::seed_from_u64(0));

    assert_eq!(grid.population_counts().get(&a), Some(&9));
    assert!(grid.check_end());
}

#[test]
fn zero_power_leaves_grid_untouched() {
    let (a, registry) = single(0.0);
    let mut grid = Grid::new(3, 3);
    grid.set(1, 1, a);
    let before = grid.clone();

    grid.apply_turn(a, &registry, &mut ChaCha8Rng::seed_from_u64(0));

    assert_eq!(grid, before);
}

#[test]
fn uniform_grid_has_ended() {
    let (a, _) = single(0.5);
    let mut grid = Grid::new(5, 4);
    for y in 0..5 {
        for x in 0..4 {
            grid.set(y, x, a);
        }
    }
    assert!(grid.check_end());
    assert_eq!(grid.sole_owner(), Some(a));
}

#[test]
fn cascade_never_reaches_rows_above_the_seed() {
    let (a, registry) = single(1.0);
    let mut grid = Grid::new(10, 10);
    grid.set(5, 5, a);

    grid.apply_turn(a, &registry, &mut ChaCha8Rng::seed_from_u64(8));

    for y in 0..4 {
        for x in 0..10 {
            assert!(grid.owner(y, x).is_neutral(), "({y}, {x}) was converted");
        }
    }
    // Everything right of the seed on its own row falls to the forward scan.
    for x in 5..10 {
        assert_eq!(grid.owner(5, x), a);
    }
    assert_eq!(grid.owner(9, 9), a);
}

#[test]
fn owners_stay_registered_over_many_rounds() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let registry = Registry::initialize(CivilisationId::range(6), 0.05..0.4, &mut rng);
    let mut grid = Grid::initialize(20, 30, &registry, &mut rng);

    for _ in 0..50 {
        for id in registry.civilisations() {
            grid.apply_turn(id, &registry, &mut rng);
        }
        assert!(grid.owners().iter().all(|&owner| registry.contains(owner)));
    }
}

#[test]
fn later_turns_see_earlier_conversions() {
    // A moves first; by B's turn it has already taken B's only cell.
    let a = CivilisationId::new(1);
    let b = CivilisationId::new(2);
    let registry = Registry::neutral_only()
        .with(
            a,
            CivilisationAttributes {
                color: Rgb(1, 1, 1),
                power: 1.0,
            },
        )
        .with(
            b,
            CivilisationAttributes {
                color: Rgb(2, 2, 2),
                power: 1.0,
            },
        );
    let mut grid = Grid::new(1, 4);
    grid.set(0, 0, a);
    grid.set(0, 3, b);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    for id in registry.civilisations() {
        grid.apply_turn(id, &registry, &mut rng);
    }

    assert_eq!(grid.sole_owner(), Some(a));
}

proptest! {
    #[test]
    fn neighbourhoods_are_symmetric(
        height in 1usize..12,
        width in 1usize..12,
        y in 0usize..12,
        x in 0usize..12,
    ) {
        let y = y % height;
        let x = x % width;
        let grid = Grid::new(height, width);
        for (ny, nx) in grid.neighbours_of(y, x) {
            prop_assert!((ny, nx) != (y, x));
            prop_assert!(grid.neighbours_of(ny, nx).contains(&(y, x)));
        }
    }

    #[test]
    fn neighbour_count_follows_position(height in 2usize..12, width in 2usize..12) {
        let grid = Grid::new(height, width);
        for y in 0..height {
            for x in 0..width {
                let on_row_edge = y == 0 || y == height - 1;
                let on_col_edge = x == 0 || x == width - 1;
                let expected = match (on_row_edge, on_col_edge) {
                    (true, true) => 3,
                    (true, false) | (false, true) => 5,
                    (false, false) => 8,
                };
                prop_assert_eq!(grid.neighbours_of(y, x).len(), expected);
            }
        }
    }

    #[test]
    fn check_end_agrees_with_population(seed in any::<u64>(), rounds in 0usize..6) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registry = Registry::initialize(CivilisationId::range(3), 0.3..0.9, &mut rng);
        let mut grid = Grid::initialize(5, 5, &registry, &mut rng);
        for _ in 0..rounds {
            for id in registry.civilisations() {
                grid.apply_turn(id, &registry, &mut rng);
            }
        }
        prop_assert_eq!(grid.check_end(), grid.population_counts().len() == 1);
    }

    #[test]
    fn fresh_grids_are_neutral_apart_from_seeds(seed in any::<u64>(), count in 1u32..10) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let registry = Registry::initialize(CivilisationId::range(count), DEFAULT_POWER_RANGE, &mut rng);
        let grid = Grid::initialize(8, 8, &registry, &mut rng);
        let owned = grid.cells().iter().filter(|id| !id.is_neutral()).count();
        prop_assert!(owned >= 1 && owned <= count as usize);
    }
}
