//! Canned chip enumerators for collector and server tests.

use sensorex_core::{Chip, ChipEnumerator, Feature};

/// A [`ChipEnumerator`] returning a fixed chip list.
#[derive(Debug, Clone)]
pub struct StaticChips {
    chips: Vec<Chip>,
}

impl StaticChips {
    /// Enumerate exactly the given chips on every scrape.
    pub fn new(chips: Vec<Chip>) -> Self {
        Self { chips }
    }
}

impl ChipEnumerator for StaticChips {
    fn chips(&self) -> Vec<Chip> {
        self.chips.clone()
    }
}

/// One chip with a feature in each of the four families plus one that no
/// family claims.
pub fn demo_chip() -> Chip {
    let feature = |name: &str, value: f64| Feature {
        name: name.to_string(),
        label: name.to_string(),
        value,
    };
    Chip {
        name: "nct6775-isa-0290".to_string(),
        adaptor: "ISA adapter".to_string(),
        features: vec![
            feature("fan1", 1200.0),
            feature("in0", 1.05),
            feature("power1", 35.0),
            feature("temp2", 42.5),
            feature("unrelated_x", 1.0),
        ],
    }
}
