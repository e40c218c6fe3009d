use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use crate::civilisation::{CivilisationId, Registry};

/// Moore neighbourhood of `(y, x)` clipped to a `height` x `width` grid,
/// in row-major order and without the centre cell.
pub fn moore_neighbourhood(
    y: usize,
    x: usize,
    height: usize,
    width: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let rows = y.saturating_sub(1)..(y + 2).min(height);
    let cols = x.saturating_sub(1)..(x + 2).min(width);
    rows.flat_map(move |ny| cols.clone().map(move |nx| (ny, nx)))
        .filter(move |&(ny, nx)| (ny, nx) != (y, x))
}

/// Row-major ownership map of a fixed-size board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<CivilisationId>,
}

impl Grid {
    /// All-neutral grid.
    pub fn new(height: usize, width: usize) -> Self {
        assert!(
            height > 0 && width > 0,
            "grid dimensions must be positive, got {height}x{width}"
        );
        Self {
            height,
            width,
            cells: vec![CivilisationId::NEUTRAL; height * width],
        }
    }

    /// Neutral grid with one random seed cell per civilisation, placed in
    /// turn order. A later civilisation drawing an occupied cell takes it
    /// over, so an early one can start with no cells at all.
    pub fn initialize<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        registry: &Registry,
        rng: &mut R,
    ) -> Self {
        let mut grid = Self::new(height, width);
        for id in registry.civilisations() {
            let y = rng.gen_range(0..height);
            let x = rng.gen_range(0..width);
            grid.set(y, x, id);
        }
        grid
    }

    /// Like [`Grid::initialize`], but redraws until every civilisation has
    /// its own seed cell.
    pub fn initialize_distinct<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        registry: &Registry,
        rng: &mut R,
    ) -> Self {
        let mut grid = Self::new(height, width);
        assert!(
            registry.civilisation_count() <= grid.cells.len(),
            "{} civilisations do not fit on {height}x{width} distinct cells",
            registry.civilisation_count()
        );
        for id in registry.civilisations() {
            loop {
                let y = rng.gen_range(0..height);
                let x = rng.gen_range(0..width);
                if grid.owner(y, x).is_neutral() {
                    grid.set(y, x, id);
                    break;
                }
            }
        }
        grid
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cells(&self) -> &[CivilisationId] {
        &self.cells
    }

    pub fn owner(&self, y: usize, x: usize) -> CivilisationId {
        self.cells[self.index(y, x)]
    }

    pub fn set(&mut self, y: usize, x: usize, owner: CivilisationId) {
        let index = self.index(y, x);
        self.cells[index] = owner;
    }

    pub fn neighbours_of(&self, y: usize, x: usize) -> Vec<(usize, usize)> {
        moore_neighbourhood(y, x, self.height, self.width).collect()
    }

    /// One turn of `attacker`: every cell it owns rolls once per neighbour
    /// and takes the neighbour when the roll is below its power.
    ///
    /// The scan reads and writes the same cells. A neighbour taken ahead of
    /// the scan position is owned by `attacker` by the time the scan reaches
    /// it and attacks in turn, so conversions cascade towards higher
    /// `(y, x)` within a single call.
    ///
    /// Returns the number of cells that changed owner.
    pub fn apply_turn<R: Rng + ?Sized>(
        &mut self,
        attacker: CivilisationId,
        registry: &Registry,
        rng: &mut R,
    ) -> usize {
        let power = registry.power(attacker);
        let mut conversions = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[y * self.width + x] != attacker {
                    continue;
                }
                for (ny, nx) in moore_neighbourhood(y, x, self.height, self.width) {
                    if rng.gen::<f64>() < power {
                        let target = &mut self.cells[ny * self.width + nx];
                        if *target != attacker {
                            *target = attacker;
                            conversions += 1;
                        }
                    }
                }
            }
        }
        conversions
    }

    /// True once a single id owns every cell.
    pub fn check_end(&self) -> bool {
        let first = self.cells[0];
        self.cells.iter().all(|&owner| owner == first)
    }

    /// The id owning every cell, if the grid has converged.
    pub fn sole_owner(&self) -> Option<CivilisationId> {
        self.check_end().then(|| self.cells[0])
    }

    pub fn population_counts(&self) -> BTreeMap<CivilisationId, usize> {
        let mut counts = BTreeMap::new();
        for &owner in &self.cells {
            *counts.entry(owner).or_insert(0) += 1;
        }
        counts
    }

    pub fn owners(&self) -> BTreeSet<CivilisationId> {
        self.cells.iter().copied().collect()
    }

    fn index(&self, y: usize, x: usize) -> usize {
        assert!(
            y < self.height && x < self.width,
            "cell ({y}, {x}) outside {}x{} grid",
            self.height,
            self.width
        );
        y * self.width + x
    }
}
