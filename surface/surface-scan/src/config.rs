//! Scanner configuration.

use surface_planes::{ClassificationParams, LabelMask, PlaneFindingParams};

use crate::error::{ScanError, ScanResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of a [`SurfaceScanner`](crate::SurfaceScanner).
///
/// With the `serde` feature, missing fields fall back to their defaults,
/// so hosts can load partial configuration files.
///
/// # Example
///
/// ```
/// use surface_planes::{LabelMask, PlaneFindingParams};
/// use surface_scan::ScannerConfig;
///
/// let config = ScannerConfig::default()
///     .with_planes(PlaneFindingParams::coarse())
///     .with_draw_mask(LabelMask::FLOOR | LabelMask::TABLE)
///     .with_plane_thickness(0.02);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScannerConfig {
    /// Extraction parameters.
    pub planes: PlaneFindingParams,
    /// Classification parameters.
    pub classification: ClassificationParams,
    /// Thickness of the slabs handed to the renderer, in metres.
    /// Default: 0.01.
    pub plane_thickness: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            planes: PlaneFindingParams::for_rooms(),
            classification: ClassificationParams::default(),
            plane_thickness: 0.01,
        }
    }
}

impl ScannerConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the extraction parameters.
    #[must_use]
    pub fn with_planes(mut self, planes: PlaneFindingParams) -> Self {
        self.planes = planes;
        self
    }

    /// Sets the classification parameters.
    #[must_use]
    pub fn with_classification(mut self, classification: ClassificationParams) -> Self {
        self.classification = classification;
        self
    }

    /// Sets which labels are drawn.
    #[must_use]
    pub fn with_draw_mask(mut self, mask: LabelMask) -> Self {
        self.classification.draw_mask = mask;
        self
    }

    /// Sets the rendered slab thickness.
    #[must_use]
    pub const fn with_plane_thickness(mut self, thickness: f64) -> Self {
        self.plane_thickness = thickness;
        self
    }

    /// Check every nested parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Plane`] for bad extraction or classification
    /// parameters and [`ScanError::InvalidParameter`] for a bad thickness.
    pub fn validate(&self) -> ScanResult<()> {
        self.planes.validate()?;
        self.classification.validate()?;
        if !(self.plane_thickness >= 0.0 && self.plane_thickness.is_finite()) {
            return Err(ScanError::invalid(format!(
                "plane_thickness must be non-negative, got {}",
                self.plane_thickness
            )));
        }
        Ok(())
    }
}
