use serde_derive::{Deserialize, Serialize};

use crate::config::DistanceConfig;

/// Turns the model's relative disparity into metres via a fixed stereo
/// calibration.
#[derive(Debug, Clone)]
pub struct DistanceConverter {
    config: DistanceConfig,
}

impl DistanceConverter {
    pub fn new(config: DistanceConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn adjusted(&self, disparity: f32) -> f32 {
        self.config.slope * disparity + self.config.intercept
    }

    /// Distance in metres.
    ///
    /// A negative adjusted disparity is non-physical and reported as the far
    /// sentinel. Exactly zero still goes through the division and yields
    /// infinity; callers treat both as "no proximity concern".
    pub fn to_meters(&self, disparity: f32) -> f32 {
        let adj = self.adjusted(disparity);

        let distance_mm = if adj >= 0.0 {
            self.config.baseline_mm * self.config.focal_length_px / adj
        } else {
            self.config.far_sentinel_mm
        };

        distance_mm / 1000.0
    }

    #[inline]
    pub fn far_sentinel_m(&self) -> f32 {
        self.config.far_sentinel_mm / 1000.0
    }
}

/// Coarse range label shown next to each tracked object
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceRange {
    /// 1~3 m, highlighted
    Close,
    /// 3~6 m
    Mid,
    /// 6~10 m
    Far,
    /// 10 m and beyond
    Distant,
}

impl DistanceRange {
    pub fn of(distance_m: f32) -> Self {
        if distance_m < 3.0 {
            DistanceRange::Close
        } else if distance_m < 6.0 {
            DistanceRange::Mid
        } else if distance_m < 10.0 {
            DistanceRange::Far
        } else {
            DistanceRange::Distant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistanceRange::Close => "1~3[m]",
            DistanceRange::Mid => "3~6[m]",
            DistanceRange::Far => "6~10[m]",
            DistanceRange::Distant => "10[m]~",
        }
    }
}
