//! In-crate test fixtures.
//!
//! The workspace's `sensorex-test-utils` crate offers the same
//! [`StaticChips`] fixture, but it depends on `sensorex-core`, so the in-crate
//! unit tests cannot use it without pulling two copies of this crate into the
//! dependency graph (their [`ChipEnumerator`] would then be a different type
//! than the one under test). This module provides the identical fixture built
//! against the internal types so unit tests type-check. Integration tests under
//! `tests/` use the shared `sensorex-test-utils` copy instead.

use crate::hwmon::{Chip, ChipEnumerator};

/// A [`ChipEnumerator`] returning a fixed chip list.
#[derive(Debug, Clone)]
pub(crate) struct StaticChips {
    chips: Vec<Chip>,
}

impl StaticChips {
    /// Enumerate exactly the given chips on every scrape.
    pub(crate) fn new(chips: Vec<Chip>) -> Self {
        Self { chips }
    }
}

impl ChipEnumerator for StaticChips {
    fn chips(&self) -> Vec<Chip> {
        self.chips.clone()
    }
}
