use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::config::TrackingConfig;

use nalgebra as na;

/// One raw detector output for a single frame
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(rename = "label")]
    pub class: String,
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: impl Into<String>, bbox: BBox<Ltrb>, confidence: f32) -> Self {
        Self {
            class: class.into(),
            bbox,
            confidence,
        }
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox.center()
    }

    /// Half of the box extent along the frame x axis. The camera is mounted
    /// rotated, so this is the object's half height on screen.
    #[inline(always)]
    pub fn half_height(&self) -> f32 {
        self.bbox.width() / 2.0
    }

    /// Whether this detection is worth fusing at all
    pub fn admissible(&self, config: &TrackingConfig) -> bool {
        if self.confidence.is_nan() || self.confidence < config.min_confidence {
            return false;
        }

        let b = &self.bbox;
        if ![b.left(), b.top(), b.right(), b.bottom()]
            .iter()
            .all(|v| v.is_finite())
        {
            tracing::warn!(class = %self.class, bbox = ?b.as_slice(), "non-finite rectangle");
            return false;
        }

        if self.bbox.width() < config.min_box_size || self.bbox.height() < config.min_box_size {
            tracing::warn!(
                class = %self.class,
                bbox = ?self.bbox.as_slice(),
                "degenerate rectangle"
            );

            return false;
        }

        true
    }
}

/// A detection paired with its fused metric distance
#[derive(Debug, Clone)]
pub struct Measurement {
    pub det: Detection,
    pub distance_m: f32,
}

impl Measurement {
    #[inline]
    pub fn class(&self) -> &str {
        &self.det.class
    }

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        self.det.center()
    }
}
