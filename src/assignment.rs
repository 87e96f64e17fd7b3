use nalgebra as na;
use pathfinding::prelude::{kuhn_munkres_min, Matrix};
use serde_derive::{Deserialize, Serialize};

// Hungarian weights must be integers; distances keep three decimals.
const COST_MULTIPLIER: f32 = 1000.0;
const FORBIDDEN_COST: i64 = i64::MAX / 1024;

/// What the associator needs to know about a track or a detection
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub class: &'a str,
    pub pos: na::Point2<f32>,
}

impl<'a> Candidate<'a> {
    pub fn new(class: &'a str, pos: na::Point2<f32>) -> Self {
        Self { class, pos }
    }

    #[inline]
    fn distance_to(&self, other: &Candidate<'_>, gate: Option<f32>) -> Option<f32> {
        if self.class != other.class {
            return None;
        }

        let d = na::distance(&self.pos, &other.pos);
        if d.is_nan() {
            return None;
        }

        match gate {
            Some(max) if d > max => None,
            _ => Some(d),
        }
    }
}

/// Pairs tracks with detections of the same class. Returns
/// `(track_index, detection_index)` pairs; every index appears at most once.
pub trait Associate {
    fn associate(
        &self,
        tracks: &[Candidate<'_>],
        dets: &[Candidate<'_>],
        gate: Option<f32>,
    ) -> Vec<(usize, usize)>;
}

/// Each track in turn takes its nearest unclaimed detection. Equal distances
/// go to the detection seen first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Associate for Greedy {
    fn associate(
        &self,
        tracks: &[Candidate<'_>],
        dets: &[Candidate<'_>],
        gate: Option<f32>,
    ) -> Vec<(usize, usize)> {
        let mut claimed = vec![false; dets.len()];
        let mut pairs = Vec::with_capacity(tracks.len().min(dets.len()));

        for (ti, track) in tracks.iter().enumerate() {
            let mut best: Option<(usize, f32)> = None;

            for (di, det) in dets.iter().enumerate() {
                if claimed[di] {
                    continue;
                }

                if let Some(d) = track.distance_to(det, gate) {
                    if best.map_or(true, |(_, min)| d < min) {
                        best = Some((di, d));
                    }
                }
            }

            if let Some((di, _)) = best {
                claimed[di] = true;
                pairs.push((ti, di));
            }
        }

        pairs
    }
}

/// Minimum total distance assignment (Kuhn-Munkres)
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimal;

impl Associate for Optimal {
    fn associate(
        &self,
        tracks: &[Candidate<'_>],
        dets: &[Candidate<'_>],
        gate: Option<f32>,
    ) -> Vec<(usize, usize)> {
        if tracks.is_empty() || dets.is_empty() {
            return Vec::new();
        }

        // the solver wants rows <= columns
        let transpose = tracks.len() > dets.len();
        let (rows, columns) = if transpose {
            (dets.len(), tracks.len())
        } else {
            (tracks.len(), dets.len())
        };

        let mut weights = Matrix::new(rows, columns, FORBIDDEN_COST);
        for r in 0..rows {
            for c in 0..columns {
                let (ti, di) = if transpose { (c, r) } else { (r, c) };

                if let Some(d) = tracks[ti].distance_to(&dets[di], gate) {
                    let cost = (d * COST_MULTIPLIER).round() as i64;
                    weights[(r, c)] = cost.min(FORBIDDEN_COST - 1);
                }
            }
        }

        let (_, assignment) = kuhn_munkres_min(&weights);

        let mut pairs: Vec<_> = assignment
            .into_iter()
            .enumerate()
            .filter(|&(r, c)| weights[(r, c)] < FORBIDDEN_COST)
            .map(|(r, c)| if transpose { (c, r) } else { (r, c) })
            .collect();

        pairs.sort_unstable();
        pairs
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Greedy,
    Optimal,
}

impl Associate for Strategy {
    #[inline]
    fn associate(
        &self,
        tracks: &[Candidate<'_>],
        dets: &[Candidate<'_>],
        gate: Option<f32>,
    ) -> Vec<(usize, usize)> {
        match self {
            Strategy::Greedy => Greedy.associate(tracks, dets, gate),
            Strategy::Optimal => Optimal.associate(tracks, dets, gate),
        }
    }
}
