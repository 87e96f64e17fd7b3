use std::fmt;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use tracing::info;

use crate::config::AlertConfig;
use crate::scene::Participant;
use crate::track::TrackState;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AlertDirection {
    NearSide,
    FarSide,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDirection::NearSide => write!(f, "near-side"),
            AlertDirection::FarSide => write!(f, "far-side"),
        }
    }
}

/// Proximity warning for the speech/vibration collaborator
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Alert {
    pub direction: AlertDirection,
    pub class: String,
    pub track_id: u32,
    pub distance_m: f32,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction, self.class)
    }
}

pub struct AlertEngine {
    config: AlertConfig,
}

impl AlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// The sensor is mounted rotated, so the probe swaps axes and sits at the
    /// leading edge of the box along frame x.
    pub fn in_roi(&self, pos: na::Point2<f32>, half_height: f32) -> bool {
        let probe = na::Point2::new(pos.y, pos.x + half_height);
        let anchor = na::Point2::new(self.config.roi_anchor.0, self.config.roi_anchor.1);

        na::distance(&probe, &anchor) <= self.config.roi_radius
    }

    #[inline]
    pub fn side(&self, pos: na::Point2<f32>) -> AlertDirection {
        if pos.y > self.config.split_y {
            AlertDirection::NearSide
        } else {
            AlertDirection::FarSide
        }
    }

    /// Far-side objects approach with negative dy, near-side ones with
    /// positive dy. Anything inside the dead zone counts as not moving.
    pub fn approaching(&self, pos: na::Point2<f32>, velocity: na::Vector2<f32>) -> bool {
        match self.side(pos) {
            AlertDirection::FarSide => velocity.y < -self.config.dead_zone,
            AlertDirection::NearSide => velocity.y >= self.config.dead_zone,
        }
    }

    fn eligible(&self, now: u64, p: &Participant) -> bool {
        match p.state {
            TrackState::Matched => true,
            TrackState::Stale => now.saturating_sub(p.last_update()) <= self.config.stale_grace_ms,
            TrackState::New => false,
        }
    }

    fn cooled_down(&self, now: u64, p: &Participant) -> bool {
        match p.last_alert {
            Some(at) => now.saturating_sub(at) >= self.config.debounce_ms,
            None => true,
        }
    }

    /// Checks every track and returns the alerts due this tick. The only
    /// state touched is each firing track's debounce timestamp.
    pub fn scan(&self, now: u64, tracks: &mut [Participant]) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for p in tracks.iter_mut() {
            if !self.eligible(now, p) {
                continue;
            }

            let pos = p.position();
            if !self.in_roi(pos, p.half_height) || !self.approaching(pos, p.velocity) {
                continue;
            }

            if !self.cooled_down(now, p) {
                continue;
            }

            p.last_alert = Some(now);

            let alert = Alert {
                direction: self.side(pos),
                class: p.class.clone(),
                track_id: p.id,
                distance_m: p.latest().distance_m,
            };

            info!(
                id = p.id,
                class = %p.class,
                direction = %alert.direction,
                distance_m = alert.distance_m,
                "proximity alert"
            );

            alerts.push(alert);
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::detection::{Detection, Measurement};

    fn engine() -> AlertEngine {
        AlertEngine::new(AlertConfig::default())
    }

    // near side, inside the ROI, approaching at 3 px per unit
    fn oncoming(state: TrackState, last_update: u64) -> Participant {
        let m = Measurement {
            det: Detection::new("bicycle", BBox::xywh(600.0, 253.0, 80.0, 100.0).as_ltrb(), 0.9),
            distance_m: 2.0,
        };

        let mut p = Participant::new(1, last_update, &m, [0, 0, 0]);
        p.velocity = na::Vector2::new(0.0, 3.0);
        p.state = state;
        p
    }

    #[test]
    fn roi_contains_anchor() {
        let e = engine();

        // probe = (y, x + hh) = (240, 640)
        assert!(e.in_roi(na::Point2::new(600.0, 240.0), 40.0));
        // 240 px straight out along frame x, still on the rim
        assert!(e.in_roi(na::Point2::new(360.0, 240.0), 40.0));
        assert!(!e.in_roi(na::Point2::new(350.0, 240.0), 40.0));
        assert!(!e.in_roi(na::Point2::new(600.0, 0.0 - 1.0), 40.0));
    }

    #[test]
    fn sides_split_on_y() {
        let e = engine();

        assert_eq!(e.side(na::Point2::new(0.0, 240.0)), AlertDirection::FarSide);
        assert_eq!(e.side(na::Point2::new(0.0, 240.5)), AlertDirection::NearSide);
    }

    #[test]
    fn direction_test_respects_dead_zone() {
        let e = engine();
        let far = na::Point2::new(600.0, 200.0);
        let near = na::Point2::new(600.0, 300.0);

        assert!(e.approaching(far, na::Vector2::new(0.0, -5.0)));
        assert!(!e.approaching(far, na::Vector2::new(0.0, -2.0)));
        assert!(!e.approaching(far, na::Vector2::new(0.0, -1.0)));
        assert!(!e.approaching(far, na::Vector2::new(0.0, 5.0)));

        assert!(e.approaching(near, na::Vector2::new(0.0, 2.0)));
        assert!(e.approaching(near, na::Vector2::new(0.0, 5.0)));
        assert!(!e.approaching(near, na::Vector2::new(0.0, 1.0)));
        assert!(!e.approaching(near, na::Vector2::new(0.0, -5.0)));
    }

    #[test]
    fn eligibility_depends_on_state_and_age() {
        let e = engine();

        let mut tracks = [oncoming(TrackState::New, 1000)];
        assert!(e.scan(1000, &mut tracks).is_empty());

        let mut tracks = [oncoming(TrackState::Matched, 1000)];
        assert_eq!(e.scan(1000, &mut tracks).len(), 1);

        // stale, last updated within the grace window
        let mut tracks = [oncoming(TrackState::Stale, 1000)];
        let alerts = e.scan(1500, &mut tracks);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].direction, AlertDirection::NearSide);
        assert_eq!(tracks[0].last_alert, Some(1500));

        let mut tracks = [oncoming(TrackState::Stale, 1000)];
        assert!(e.scan(1501, &mut tracks).is_empty());
        assert_eq!(tracks[0].last_alert, None);
    }

    #[test]
    fn alert_text() {
        let alert = Alert {
            direction: AlertDirection::FarSide,
            class: "person".into(),
            track_id: 3,
            distance_m: 2.5,
        };

        assert_eq!(alert.to_string(), "far-side person");
        assert_eq!(
            serde_json::to_value(alert.direction).unwrap(),
            serde_json::json!("far-side")
        );
    }
}
