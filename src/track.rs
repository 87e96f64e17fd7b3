use serde_derive::{Deserialize, Serialize};

use crate::distance::DistanceRange;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    /// Created this tick, not yet matched to anything
    New,
    /// Followed across at least two ticks and updated this tick
    Matched,
    /// Missed this tick, waiting for a match or eviction
    Stale,
}

/// Read-only copy of a live track, handed out to renderers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: u32,
    pub class: String,
    pub state: TrackState,

    // frame px, box centre
    pub position: (f32, f32),
    pub distance_m: f32,
    pub range: DistanceRange,

    // px per velocity time unit
    pub velocity: (f32, f32),
    pub half_height: f32,

    // in ms
    pub time_since_update: u64,

    pub color: [u8; 3],
}
