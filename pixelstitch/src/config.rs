//! Tuning parameters for corner extraction and matching.
//!
//! All structs deserialize with `serde`, and missing fields fall back to their defaults, so
//! a partial JSON file such as `{"matching": {"window_size": 5}}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StitchError};

/// Parameters of the Harris cornerness response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarrisParams {
    /// Side of the box window over which the structure tensor is summed.
    pub block_size: usize,
    /// Sobel aperture: 3, 5 or 7.
    pub aperture_size: usize,
    /// Sensitivity constant in `det - k * trace^2`.
    pub k: f64,
}

impl Default for HarrisParams {
    fn default() -> Self {
        HarrisParams {
            block_size: 2,
            aperture_size: 3,
            k: 0.04,
        }
    }
}

/// Parameters of the corner extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerConfig {
    /// A pixel becomes a corner when its response, normalized to `[0, 255]` and truncated,
    /// is strictly greater than this value.
    pub threshold: f32,
    pub harris: HarrisParams,
}

impl Default for CornerConfig {
    fn default() -> Self {
        CornerConfig {
            threshold: 120.0,
            harris: HarrisParams::default(),
        }
    }
}

/// How a corner picks its partner when several candidates pass the SSD threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationPolicy {
    /// Keep the candidate with the smallest SSD; ties keep the first one examined.
    #[default]
    MinimumBelowThreshold,
    /// Keep the last candidate examined that passed the threshold.
    LastBelowThreshold,
}

/// Parameters of the patch matching stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Half side of the compared patch; patches are `(2 * window_size + 1)` pixels square.
    pub window_size: usize,
    /// Candidates are accepted only when their patch SSD is strictly below this value.
    pub ssd_threshold: f64,
    pub policy: AssociationPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            window_size: 7,
            ssd_threshold: 7000.0,
            policy: AssociationPolicy::default(),
        }
    }
}

impl MatchConfig {
    /// Minimum distance, in pixels, between an eligible corner and any image edge.
    pub fn edge_margin(&self) -> usize {
        self.window_size.saturating_add(2)
    }
}

/// Complete configuration of a [crate::stitch_pipeline::StitchPipeline].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub corners: CornerConfig,
    pub matching: MatchConfig,
}

impl HarrisParams {
    /// Rejects a zero block size, apertures other than 3, 5 or 7, and a non-finite `k`.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(StitchError::InvalidConfig(
                "harris.block_size must be at least 1".to_string(),
            ));
        }
        if !matches!(self.aperture_size, 3 | 5 | 7) {
            return Err(StitchError::InvalidConfig(format!(
                "harris.aperture_size must be 3, 5 or 7, got {}",
                self.aperture_size
            )));
        }
        if !self.k.is_finite() {
            return Err(StitchError::InvalidConfig("harris.k must be finite".to_string()));
        }
        Ok(())
    }
}

impl CornerConfig {
    pub fn validate(&self) -> Result<()> {
        self.harris.validate()?;
        if !self.threshold.is_finite() {
            return Err(StitchError::InvalidConfig(
                "corners.threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl StitchConfig {
    /// Checks every parameter for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.corners.validate()?;
        let ssd = self.matching.ssd_threshold;
        if !ssd.is_finite() || ssd <= 0.0 {
            return Err(StitchError::InvalidConfig(format!(
                "matching.ssd_threshold must be a positive number, got {ssd}"
            )));
        }
        Ok(())
    }
}
