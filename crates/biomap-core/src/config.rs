//! Grid configuration shared by the engine, the wasm bindings and the CLI.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

// ── Slider range ──────────────────────────────────────────────────────────────

/// Smallest cell edge offered by the detail slider, in degrees.
pub const DETAIL_LEVEL_MIN: f64 = 0.25;
/// Largest cell edge offered by the detail slider, in degrees.
pub const DETAIL_LEVEL_MAX: f64 = 10.0;
pub const DETAIL_LEVEL_STEP: f64 = 0.25;

/// How sites are assigned to grid cells. Both strategies produce the same cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulateStrategy {
    /// O(1) coordinate-to-key hashing per site.
    #[default]
    Hashed,
    /// Every candidate cell tested against every unassigned site.
    Scan,
}

/// Parameters for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Cell edge length in degrees.
    pub detail_level: f64,
    pub strategy: PopulateStrategy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            detail_level: 1.0,
            strategy: PopulateStrategy::Hashed,
        }
    }
}

impl GridConfig {
    pub fn new(detail_level: f64) -> Self {
        Self { detail_level, ..Self::default() }
    }

    pub fn with_strategy(mut self, strategy: PopulateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reject detail levels the partitioner cannot work with.
    ///
    /// Levels outside the slider range are still accepted.
    pub fn validate(&self) -> Result<()> {
        if !self.detail_level.is_finite() || self.detail_level <= 0.0 {
            return Err(Error::InvalidDetailLevel(self.detail_level));
        }
        if !(DETAIL_LEVEL_MIN..=DETAIL_LEVEL_MAX).contains(&self.detail_level) {
            warn!(
                detail_level = self.detail_level,
                "detail level outside slider range [{DETAIL_LEVEL_MIN}, {DETAIL_LEVEL_MAX}]"
            );
        }
        Ok(())
    }

    /// Round the detail level to the nearest slider step inside the slider range.
    pub fn snap_to_slider(mut self) -> Self {
        if self.detail_level.is_finite() {
            let steps = (self.detail_level / DETAIL_LEVEL_STEP).round();
            self.detail_level =
                (steps * DETAIL_LEVEL_STEP).clamp(DETAIL_LEVEL_MIN, DETAIL_LEVEL_MAX);
        } else {
            self.detail_level = Self::default().detail_level;
        }
        self
    }
}
