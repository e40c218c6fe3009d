use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Owner of a grid cell. `NEUTRAL` marks unowned cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CivilisationId(u32);

impl CivilisationId {
    pub const NEUTRAL: CivilisationId = CivilisationId(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_neutral(self) -> bool {
        self == Self::NEUTRAL
    }

    /// Ids `1..=count`, the active civilisations of a standard game.
    pub fn range(count: u32) -> impl Iterator<Item = CivilisationId> {
        (1..=count).map(CivilisationId)
    }
}

impl fmt::Display for CivilisationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_neutral() {
            write!(f, "neutral")
        } else {
            write!(f, "civ#{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Rgb(rng.gen(), rng.gen(), rng.gen())
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CivilisationAttributes {
    pub color: Rgb,
    /// Probability that a single neighbour trial converts the neighbour.
    pub power: f64,
}

impl CivilisationAttributes {
    pub const NEUTRAL: CivilisationAttributes = CivilisationAttributes {
        color: Rgb::BLACK,
        power: 0.0,
    };
}

pub const DEFAULT_POWER_RANGE: Range<f64> = 0.05..0.1;

/// Colour and power of every civilisation in a game, neutral included.
///
/// Built once per game and read-only afterwards. Iteration is in ascending
/// id order, which is also the turn order of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    entries: BTreeMap<CivilisationId, CivilisationAttributes>,
}

impl Registry {
    /// Registry holding only neutral.
    pub fn neutral_only() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(CivilisationId::NEUTRAL, CivilisationAttributes::NEUTRAL);
        Self { entries }
    }

    /// Rolls a random colour and a power in `power_range` for every id.
    pub fn initialize<R, I>(ids: I, power_range: Range<f64>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = CivilisationId>,
    {
        assert!(
            0.0 <= power_range.start && power_range.start < power_range.end && power_range.end <= 1.0,
            "power range {power_range:?} must be a non-empty interval within [0, 1]"
        );
        let mut ids: Vec<CivilisationId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        assert!(!ids.is_empty(), "a game needs at least one civilisation");

        let mut registry = Self::neutral_only();
        for id in ids {
            let color = Rgb::random(rng);
            let power = rng.gen_range(power_range.clone());
            registry.insert(id, CivilisationAttributes { color, power });
        }
        registry
    }

    /// Registers `id` with fixed attributes, replacing any previous entry.
    pub fn insert(&mut self, id: CivilisationId, attributes: CivilisationAttributes) {
        assert!(!id.is_neutral(), "neutral attributes are fixed");
        assert!(
            (0.0..=1.0).contains(&attributes.power),
            "power {} of {id} outside [0, 1]",
            attributes.power
        );
        self.entries.insert(id, attributes);
    }

    pub fn with(mut self, id: CivilisationId, attributes: CivilisationAttributes) -> Self {
        self.insert(id, attributes);
        self
    }

    pub fn get(&self, id: CivilisationId) -> Option<&CivilisationAttributes> {
        self.entries.get(&id)
    }

    /// Attributes of a registered id. Panics on unknown ids.
    pub fn attributes(&self, id: CivilisationId) -> &CivilisationAttributes {
        match self.entries.get(&id) {
            Some(attributes) => attributes,
            None => panic!("{id} is not registered"),
        }
    }

    pub fn power(&self, id: CivilisationId) -> f64 {
        self.attributes(id).power
    }

    pub fn color(&self, id: CivilisationId) -> Rgb {
        self.attributes(id).color
    }

    pub fn contains(&self, id: CivilisationId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Active civilisations in turn order.
    pub fn civilisations(&self) -> impl Iterator<Item = CivilisationId> + '_ {
        self.entries.keys().copied().filter(|id| !id.is_neutral())
    }

    pub fn civilisation_count(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (CivilisationId, &CivilisationAttributes)> + '_ {
        self.entries.iter().map(|(id, attributes)| (*id, attributes))
    }
}
