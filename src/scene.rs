use nalgebra as na;
use tracing::debug;

use crate::assignment::{Associate, Candidate};
use crate::config::TrackingConfig;
use crate::detection::Measurement;
use crate::distance::DistanceRange;
use crate::history::{History, Sample};
use crate::track::{Track, TrackState};

const PALETTE: [[u8; 3]; 14] = [
    [0x00, 0x00, 0xFF],
    [0x00, 0xFF, 0x00],
    [0xFF, 0xFF, 0x00],
    [0x00, 0xFF, 0xFF],
    [0xFF, 0x00, 0xFF],
    [0xFF, 0xFF, 0xFF],
    [0x55, 0xFF, 0x55],
    [0xFF, 0xA5, 0x00],
    [0xFF, 0x88, 0x88],
    [0xAA, 0xAA, 0xFF],
    [0xFF, 0xFF, 0xAA],
    [0x55, 0xAA, 0xAA],
    [0xAA, 0x33, 0xAA],
    [0x0D, 0x00, 0x68],
];

/// One live track owned by the [`Scene`]
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: u32,
    pub class: String,
    pub history: History,
    last: Sample,
    pub half_height: f32,
    pub velocity: na::Vector2<f32>,
    pub state: TrackState,
    pub last_alert: Option<u64>,
    color: [u8; 3],
}

impl Participant {
    pub(crate) fn new(id: u32, ts: u64, m: &Measurement, color: [u8; 3]) -> Self {
        let first = Sample {
            pos: m.position(),
            distance_m: m.distance_m,
            ts,
        };

        Self {
            id,
            class: m.det.class.clone(),
            history: History::new(first),
            last: first,
            half_height: m.det.half_height(),
            velocity: na::Vector2::zeros(),
            state: TrackState::New,
            last_alert: None,
            color,
        }
    }

    pub(crate) fn update(&mut self, ts: u64, m: &Measurement, unit_ms: u64) {
        debug_assert_eq!(self.class, m.det.class);

        self.last = Sample {
            pos: m.position(),
            distance_m: m.distance_m,
            ts,
        };
        self.history.push(self.last);

        if let Some(vel) = self.history.velocity(unit_ms) {
            self.velocity = vel;
        }

        self.half_height = m.det.half_height();
        self.state = TrackState::Matched;
    }

    /// Newest sample, kept even after the history has been trimmed
    #[inline]
    pub fn latest(&self) -> &Sample {
        &self.last
    }

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        self.latest().pos
    }

    #[inline]
    pub fn last_update(&self) -> u64 {
        self.latest().ts
    }

    pub fn snapshot(&self, now: u64) -> Track {
        let last = self.latest();

        Track {
            track_id: self.id,
            class: self.class.clone(),
            state: self.state,
            position: (last.pos.x, last.pos.y),
            distance_m: last.distance_m,
            range: DistanceRange::of(last.distance_m),
            velocity: (self.velocity.x, self.velocity.y),
            half_height: self.half_height,
            time_since_update: now.saturating_sub(last.ts),
            color: self.color,
        }
    }
}

/// The track store: owns every live track and runs per-tick association.
pub struct Scene {
    config: TrackingConfig,
    tracks: Vec<Participant>,
    classes: Vec<String>,
    next_id: u32,
    last_ts: u64,
}

impl Scene {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            tracks: Vec::with_capacity(32),
            classes: Vec::new(),
            next_id: 1,
            last_ts: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn participants(&self) -> &[Participant] {
        &self.tracks
    }

    #[inline]
    pub(crate) fn participants_mut(&mut self) -> &mut [Participant] {
        &mut self.tracks
    }

    pub fn get(&self, id: u32) -> Option<&Participant> {
        self.tracks.iter().find(|p| p.id == id)
    }

    fn color_of(&mut self, class: &str) -> [u8; 3] {
        let idx = match self.classes.iter().position(|c| c == class) {
            Some(idx) => idx,
            None => {
                self.classes.push(class.to_string());
                self.classes.len() - 1
            }
        };

        PALETTE[idx % PALETTE.len()]
    }

    /// Runs one tick: associate, update matched tracks, age and evict the
    /// rest, then open tracks for whatever detections are left.
    pub fn update(&mut self, ts: u64, measurements: &[Measurement]) {
        self.last_ts = ts;

        let pairs = {
            let tracks: Vec<_> = self
                .tracks
                .iter()
                .map(|p| Candidate::new(&p.class, p.position()))
                .collect();

            let dets: Vec<_> = measurements
                .iter()
                .map(|m| Candidate::new(m.class(), m.position()))
                .collect();

            self.config.strategy.associate(
                &tracks,
                &dets,
                self.config.max_association_distance,
            )
        };

        let mut matched = vec![false; self.tracks.len()];
        let mut claimed = vec![false; measurements.len()];

        for (ti, di) in pairs {
            let track = &mut self.tracks[ti];
            track.update(ts, &measurements[di], self.config.velocity_time_unit_ms);

            debug!(
                id = track.id,
                class = %track.class,
                vx = track.velocity.x,
                vy = track.velocity.y,
                "track matched"
            );

            matched[ti] = true;
            claimed[di] = true;
        }

        for (track, hit) in self.tracks.iter_mut().zip(&matched) {
            if !hit && track.state != TrackState::Stale {
                debug!(id = track.id, class = %track.class, "track stale");
                track.state = TrackState::Stale;
            }
        }

        let retention = self.config.retention_ms;
        self.tracks.retain_mut(|t| {
            t.history.trim(ts, retention);

            if t.history.is_empty() {
                debug!(id = t.id, class = %t.class, "track evicted");
                return false;
            }

            true
        });

        for (m, claimed) in measurements.iter().zip(claimed) {
            if claimed {
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;

            let color = self.color_of(m.class());
            debug!(id, class = %m.class(), "track created");

            self.tracks.push(Participant::new(id, ts, m, color));
        }
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.tracks
            .iter()
            .map(|p| p.snapshot(self.last_ts))
            .collect()
    }
}
