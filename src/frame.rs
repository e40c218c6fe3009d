use serde::Serialize;

use crate::civilisation::CivilisationId;

/// Everything a renderer needs for one picture of the game.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// Controller version this frame was taken at; newer frames win.
    pub version: u64,
    pub round: u64,
    pub restarts: u64,
    pub speed: u32,
    pub paused: bool,
    pub converged: bool,
    pub height: usize,
    pub width: usize,
    /// Row-major owner ids.
    pub cells: Vec<CivilisationId>,
    pub palette: Vec<PaletteEntry>,
    /// Largest population first.
    pub population: Vec<PopulationEntry>,
    pub power: Vec<PowerEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaletteEntry {
    pub id: CivilisationId,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationEntry {
    pub id: CivilisationId,
    pub cells: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerEntry {
    pub id: CivilisationId,
    pub percent: u32,
}
