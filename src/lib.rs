pub mod civilisation;
pub mod controller;
pub mod frame;
pub mod grid;
pub mod rng;
pub mod scenario;
pub mod web;

pub use civilisation::{CivilisationAttributes, CivilisationId, Registry, Rgb};
pub use controller::{Controller, ControllerSettings, RunSummary, StepOutcome};
pub use frame::Frame;
pub use grid::Grid;
pub use scenario::{Scenario, ScenarioError, ScenarioLoader};
