use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::assignment::Strategy;
use crate::error::Error;

/// Calibration and tuning knobs for the whole tracker.
///
/// Every field has a default matching the deployed calibration, so a partial
/// JSON document only needs to name the values it overrides.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub depth: DepthConfig,
    pub distance: DistanceConfig,
    pub tracking: TrackingConfig,
    pub alert: AlertConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DepthConfig {
    pub grid_width: usize,
    pub grid_height: usize,

    /// Side of the square frame the detector boxes live in, px
    pub frame_size: f32,

    /// Depth output is rotated by 180° relative to the camera frame
    pub flipped: bool,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            grid_width: 256,
            grid_height: 256,
            frame_size: 480.0,
            flipped: true,
        }
    }
}

impl DepthConfig {
    #[inline]
    pub fn scale(&self) -> f32 {
        self.grid_width as f32 / self.frame_size
    }
}

/// `disparity = slope * raw + intercept`, then `baseline * focal / disparity`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DistanceConfig {
    pub slope: f32,
    pub intercept: f32,
    pub baseline_mm: f32,
    pub focal_length_px: f32,
    pub far_sentinel_mm: f32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            slope: 0.144,
            intercept: -13.0,
            baseline_mm: 119.975,
            focal_length_px: 1397.0,
            far_sentinel_mm: 168_000.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    pub retention_ms: u64,
    pub velocity_time_unit_ms: u64,
    pub strategy: Strategy,

    // None keeps the ungated nearest-neighbour behaviour
    pub max_association_distance: Option<f32>,

    pub min_confidence: f32,
    pub min_box_size: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            retention_ms: 2000,
            velocity_time_unit_ms: 300,
            strategy: Strategy::Greedy,
            max_association_distance: None,
            min_confidence: 0.5,
            min_box_size: 16.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// ROI centre in (frame y, frame x) order, the sensor is mounted rotated
    pub roi_anchor: (f32, f32),
    pub roi_radius: f32,

    /// Frame y separating the far side (<=) from the near side (>)
    pub split_y: f32,
    pub dead_zone: f32,
    pub debounce_ms: u64,

    /// How long a stale track still takes part in alerting
    pub stale_grace_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            roi_anchor: (240.0, 560.0 + 80.0),
            roi_radius: 240.0,
            split_y: 240.0,
            dead_zone: 2.0,
            debounce_ms: 3000,
            stale_grace_ms: 500,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;

        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.tracking.retention_ms == 0 {
            return Err(Error::config("tracking.retention_ms", "must be positive"));
        }

        if self.tracking.velocity_time_unit_ms == 0 {
            return Err(Error::config(
                "tracking.velocity_time_unit_ms",
                "must be positive",
            ));
        }

        if !(0.0..=1.0).contains(&self.tracking.min_confidence) {
            return Err(Error::config(
                "tracking.min_confidence",
                format!("{} is outside [0, 1]", self.tracking.min_confidence),
            ));
        }

        if self.tracking.min_box_size.is_nan() || self.tracking.min_box_size < 0.0 {
            return Err(Error::config("tracking.min_box_size", "must be >= 0"));
        }

        if let Some(gate) = self.tracking.max_association_distance {
            if gate.is_nan() || gate <= 0.0 {
                return Err(Error::config(
                    "tracking.max_association_distance",
                    "must be positive",
                ));
            }
        }

        if self.alert.debounce_ms == 0 {
            return Err(Error::config("alert.debounce_ms", "must be positive"));
        }

        if self.alert.roi_radius.is_nan() || self.alert.roi_radius <= 0.0 {
            return Err(Error::config("alert.roi_radius", "must be positive"));
        }

        if self.alert.dead_zone.is_nan() || self.alert.dead_zone < 0.0 {
            return Err(Error::config("alert.dead_zone", "must be >= 0"));
        }

        if self.depth.grid_width == 0 || self.depth.grid_height == 0 {
            return Err(Error::config("depth", "grid must not be empty"));
        }

        if self.depth.frame_size.is_nan() || self.depth.frame_size <= 0.0 {
            return Err(Error::config("depth.frame_size", "must be positive"));
        }

        Ok(())
    }
}
