use ndarray::prelude::*;

use crate::bbox::{BBox, Ltrb};
use crate::config::DepthConfig;
use crate::error::Error;

const SAMPLE_COUNT: usize = 5;

/// Dense disparity grid for one frame, indexed `[row, col]`.
#[derive(Debug, Clone)]
pub struct DepthMap {
    data: Array2<f32>,
    scale: f32,
    flipped: bool,
}

impl DepthMap {
    /// `scale` maps frame pixels into grid cells
    pub fn new(data: Array2<f32>, scale: f32, flipped: bool) -> Self {
        Self {
            data,
            scale,
            flipped,
        }
    }

    pub fn with_config(data: Array2<f32>, config: &DepthConfig) -> Result<Self, Error> {
        let expected = (config.grid_height, config.grid_width);
        let actual = data.dim();

        if expected != actual {
            return Err(Error::DepthShape { expected, actual });
        }

        Ok(Self::new(data, config.scale(), config.flipped))
    }

    /// Uniform map, mostly useful when no depth model is attached
    pub fn uniform(value: f32, config: &DepthConfig) -> Self {
        Self::new(
            Array2::from_elem((config.grid_height, config.grid_width), value),
            config.scale(),
            config.flipped,
        )
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }

    /// Reads the grid at depth-space `(x, y)` before orientation is applied.
    /// Anything outside the grid is `None`.
    pub fn at(&self, x: i64, y: i64) -> Option<f32> {
        let (h, w) = self.data.dim();
        let (w, h) = (w as i64, h as i64);

        let (col, row) = if self.flipped {
            ((w - 1).checked_sub(x)?, (h - 1).checked_sub(y)?)
        } else {
            (x, y)
        };

        if col < 0 || row < 0 || col >= w || row >= h {
            return None;
        }

        self.data.get((row as usize, col as usize)).copied()
    }

    fn at_clamped(&self, x: i64, y: i64) -> f32 {
        let (h, w) = self.data.dim();
        if w == 0 || h == 0 {
            return f32::NAN;
        }

        let x = x.clamp(0, w as i64 - 1);
        let y = y.clamp(0, h as i64 - 1);

        self.at(x, y).unwrap_or(f32::NAN)
    }

    /// Robust disparity for the object inside `bbox`.
    ///
    /// Five cells are read around the box centre (centre, then a quarter of
    /// the box up, right, down and left). Cells off the grid are ignored; the
    /// extreme low and high readings are dropped and the rest averaged. With
    /// fewer than three usable cells only the centre reading is returned,
    /// clamped onto the grid when the centre itself lies outside it. Offsets
    /// that overflow the index space count as off the grid.
    pub fn sample(&self, bbox: &BBox<Ltrb>) -> f32 {
        let center = bbox.center();

        let cx = (center.x * self.scale).floor() as i64;
        let cy = (center.y * self.scale).floor() as i64;
        let ox = ((bbox.width().abs() / 4.0) * self.scale) as i64;
        let oy = ((bbox.height().abs() / 4.0) * self.scale) as i64;

        let offsets: [(i64, i64); SAMPLE_COUNT] = [(0, 0), (0, -oy), (ox, 0), (0, oy), (-ox, 0)];

        let mut values = [0.0f32; SAMPLE_COUNT];
        let mut valid = 0;

        for (dx, dy) in offsets {
            let cell = cx
                .checked_add(dx)
                .zip(cy.checked_add(dy))
                .and_then(|(x, y)| self.at(x, y));

            if let Some(v) = cell {
                if v.is_finite() {
                    values[valid] = v;
                    valid += 1;
                }
            }
        }

        let value = if valid < 3 {
            self.at_clamped(cx, cy)
        } else {
            trimmed_mean(&mut values[..valid])
        };

        tracing::trace!(cx, cy, valid, value, "depth sample");

        value
    }
}

/// Mean of `values` with the single lowest and highest entries dropped.
/// Expects at least three values.
fn trimmed_mean(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));

    let inner = &values[1..values.len() - 1];

    inner.iter().sum::<f32>() / inner.len() as f32
}
