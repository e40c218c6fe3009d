use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::controller::ControllerSettings;

fn default_width() -> usize {
    100
}

fn default_height() -> usize {
    72
}

fn default_civilisation_count() -> u32 {
    5
}

fn default_power_min() -> f64 {
    0.05
}

fn default_power_max() -> f64 {
    0.1
}

fn default_speed() -> u32 {
    5
}

fn default_max_rounds() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub grid: GridSpec,
    #[serde(default)]
    pub civilisations: CivilisationSpec,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,
    #[serde(default)]
    pub distinct_seeds: bool,
    #[serde(default = "default_true")]
    pub reroll_registry_on_restart: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSpec {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CivilisationSpec {
    #[serde(default = "default_civilisation_count")]
    pub count: u32,
    #[serde(default = "default_power_min")]
    pub power_min: f64,
    #[serde(default = "default_power_max")]
    pub power_max: f64,
}

impl Default for CivilisationSpec {
    fn default() -> Self {
        Self {
            count: default_civilisation_count(),
            power_min: default_power_min(),
            power_max: default_power_max(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("grid must be at least 1x1, got {height}x{width}")]
    EmptyGrid { height: usize, width: usize },
    #[error("grid of {height}x{width} cells is too large")]
    GridTooLarge { height: usize, width: usize },
    #[error("scenario must define at least one civilisation")]
    NoCivilisations,
    #[error("power range [{min}, {max}) must satisfy 0 <= min < max <= 1")]
    PowerRange { min: f64, max: f64 },
    #[error("speed must be at least 1")]
    ZeroSpeed,
    #[error("{count} civilisations cannot get distinct seeds on {cells} cells")]
    TooCrowded { count: u32, cells: usize },
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let GridSpec { width, height } = self.grid;
        if width == 0 || height == 0 {
            return Err(ScenarioError::EmptyGrid { height, width });
        }
        if self.civilisations.count == 0 {
            return Err(ScenarioError::NoCivilisations);
        }
        let CivilisationSpec {
            power_min: min,
            power_max: max,
            ..
        } = self.civilisations;
        if !(0.0 <= min && min < max && max <= 1.0) {
            return Err(ScenarioError::PowerRange { min, max });
        }
        if self.speed == 0 {
            return Err(ScenarioError::ZeroSpeed);
        }
        let cells = width
            .checked_mul(height)
            .ok_or(ScenarioError::GridTooLarge { height, width })?;
        if self.distinct_seeds && self.civilisations.count as usize > cells {
            return Err(ScenarioError::TooCrowded {
                count: self.civilisations.count,
                cells,
            });
        }
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            seed: self.seed,
            height: self.grid.height,
            width: self.grid.width,
            civilisations: self.civilisations.count,
            power_range: self.civilisations.power_min..self.civilisations.power_max,
            speed: self.speed,
            distinct_seeds: self.distinct_seeds,
            reroll_registry_on_restart: self.reroll_registry_on_restart,
        }
    }

    pub fn rounds(&self, override_rounds: Option<u64>) -> u64 {
        override_rounds.unwrap_or(self.max_rounds)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Reads, parses and validates a scenario file relative to the base dir.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}
