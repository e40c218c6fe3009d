use std::collections::BTreeMap;
use std::ops::Range;

use tracing::{debug, info};

use crate::{
    civilisation::{CivilisationId, Registry, DEFAULT_POWER_RANGE},
    frame::{Frame, PaletteEntry, PopulationEntry, PowerEntry},
    grid::Grid,
    rng::{RngManager, Stream},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub seed: u64,
    pub height: usize,
    pub width: usize,
    pub civilisations: u32,
    pub power_range: Range<f64>,
    /// Rounds per second requested from the presentation layer.
    pub speed: u32,
    /// Redraw seed cells until no two civilisations share one.
    pub distinct_seeds: bool,
    /// Roll fresh colours and powers on every restart instead of keeping
    /// the first registry for the lifetime of the controller.
    pub reroll_registry_on_restart: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            height: 72,
            width: 100,
            civilisations: 5,
            power_range: DEFAULT_POWER_RANGE,
            speed: 5,
            distinct_seeds: false,
            reroll_registry_on_restart: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Paused,
    Advanced { round: u64, conversions: usize },
    Converged { round: u64, survivor: CivilisationId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub rounds: u64,
    pub survivor: Option<CivilisationId>,
}

/// Owns one game: its registry, its grid and the pause/speed state the
/// presentation layer drives.
pub struct Controller {
    settings: ControllerSettings,
    rng: RngManager,
    registry: Registry,
    grid: Grid,
    paused: bool,
    speed: u32,
    round: u64,
    restarts: u64,
    /// Bumped on every change a renderer can see.
    version: u64,
}

impl Controller {
    /// Builds the first game. The controller starts paused.
    pub fn new(settings: ControllerSettings) -> Self {
        assert!(settings.speed >= 1, "speed must be at least 1");
        let mut rng = RngManager::new(settings.seed);
        let registry = roll_registry(&settings, &mut rng);
        let grid = seed_grid(&settings, &registry, &mut rng);
        info!(
            seed = settings.seed,
            height = settings.height,
            width = settings.width,
            civilisations = settings.civilisations,
            "game created"
        );
        Self {
            speed: settings.speed,
            settings,
            rng,
            registry,
            grid,
            paused: true,
            round: 0,
            restarts: 0,
            version: 0,
        }
    }

    /// Controller around a hand-built registry and grid. Restarts keep the
    /// dimensions of `grid`.
    pub fn with_state(mut settings: ControllerSettings, registry: Registry, grid: Grid) -> Self {
        assert!(settings.speed >= 1, "speed must be at least 1");
        settings.height = grid.height();
        settings.width = grid.width();
        assert!(
            grid.cells().iter().all(|&owner| registry.contains(owner)),
            "grid holds owners missing from the registry"
        );
        Self {
            rng: RngManager::new(settings.seed),
            speed: settings.speed,
            settings,
            registry,
            grid,
            paused: true,
            round: 0,
            restarts: 0,
            version: 0,
        }
    }

    /// Throws the current game away and starts a new one, paused.
    pub fn restart(&mut self) {
        if self.settings.reroll_registry_on_restart {
            self.registry = roll_registry(&self.settings, &mut self.rng);
        }
        self.grid = seed_grid(&self.settings, &self.registry, &mut self.rng);
        self.paused = true;
        self.round = 0;
        self.restarts += 1;
        self.version += 1;
        info!(restarts = self.restarts, "game restarted");
    }

    /// Plays one round, every civilisation taking its turn in ascending id
    /// order on the grid left by the previous one. Pauses on convergence.
    pub fn step(&mut self) -> StepOutcome {
        if self.paused {
            return StepOutcome::Paused;
        }

        let rng = self.rng.stream(Stream::Turns);
        let mut conversions = 0;
        for id in self.registry.civilisations() {
            conversions += self.grid.apply_turn(id, &self.registry, &mut *rng);
        }
        self.round += 1;
        self.version += 1;
        debug!(round = self.round, conversions, "round played");

        match self.grid.sole_owner() {
            Some(survivor) => {
                self.paused = true;
                info!(round = self.round, %survivor, "grid converged");
                StepOutcome::Converged {
                    round: self.round,
                    survivor,
                }
            }
            None => StepOutcome::Advanced {
                round: self.round,
                conversions,
            },
        }
    }

    /// Unpauses and plays until the grid converges or `max_rounds` rounds
    /// have been played, handing a frame to `hook` after every round.
    pub fn run_with_hook<F>(&mut self, max_rounds: u64, mut hook: F) -> RunSummary
    where
        F: FnMut(&Frame),
    {
        self.paused = false;
        let mut rounds = 0;
        let mut survivor = None;
        while rounds < max_rounds {
            let outcome = self.step();
            rounds += 1;
            hook(&self.frame());
            if let StepOutcome::Converged { survivor: id, .. } = outcome {
                survivor = Some(id);
                break;
            }
        }
        self.paused = true;
        RunSummary { rounds, survivor }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.version += 1;
        debug!(paused = self.paused, "pause toggled");
    }

    /// Adjusts the speed by `delta`, never going below one round per second.
    pub fn set_speed(&mut self, delta: i32) {
        self.speed = self.speed.saturating_add_signed(delta).max(1);
        self.version += 1;
        debug!(speed = self.speed, "speed changed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn owner(&self, y: usize, x: usize) -> CivilisationId {
        self.grid.owner(y, x)
    }

    pub fn population_counts(&self) -> BTreeMap<CivilisationId, usize> {
        self.grid.population_counts()
    }

    /// Population by descending cell count, ties broken by id.
    pub fn ranked_population(&self) -> Vec<PopulationEntry> {
        let mut ranked: Vec<PopulationEntry> = self
            .grid
            .population_counts()
            .into_iter()
            .map(|(id, cells)| PopulationEntry { id, cells })
            .collect();
        ranked.sort_by(|a, b| b.cells.cmp(&a.cells).then(a.id.cmp(&b.id)));
        ranked
    }

    /// Power in whole percent for every civilisation still on the board.
    pub fn power_percentages(&self) -> Vec<PowerEntry> {
        self.ranked_population()
            .into_iter()
            .filter(|entry| !entry.id.is_neutral())
            .map(|entry| PowerEntry {
                id: entry.id,
                percent: (self.registry.power(entry.id) * 100.0).round() as u32,
            })
            .collect()
    }

    pub fn frame(&self) -> Frame {
        Frame {
            version: self.version,
            round: self.round,
            restarts: self.restarts,
            speed: self.speed,
            paused: self.paused,
            converged: self.grid.check_end(),
            height: self.grid.height(),
            width: self.grid.width(),
            cells: self.grid.cells().to_vec(),
            palette: self
                .registry
                .iter()
                .map(|(id, attributes)| PaletteEntry {
                    id,
                    color: attributes.color.to_hex(),
                })
                .collect(),
            population: self.ranked_population(),
            power: self.power_percentages(),
        }
    }
}

fn roll_registry(settings: &ControllerSettings, rng: &mut RngManager) -> Registry {
    Registry::initialize(
        CivilisationId::range(settings.civilisations),
        settings.power_range.clone(),
        rng.stream(Stream::Registry),
    )
}

fn seed_grid(settings: &ControllerSettings, registry: &Registry, rng: &mut RngManager) -> Grid {
    let stream = rng.stream(Stream::Seeding);
    if settings.distinct_seeds {
        Grid::initialize_distinct(settings.height, settings.width, registry, stream)
    } else {
        Grid::initialize(settings.height, settings.width, registry, stream)
    }
}
