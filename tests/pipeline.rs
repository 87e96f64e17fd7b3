use proxtrack::bbox::BBox;
use proxtrack::config::Config;
use proxtrack::distance::DistanceRange;
use proxtrack::error::Error;
use proxtrack::{
    AlertDirection, DepthMap, Detection, Frame, Pipeline, ProximityTracker, TrackState, Tracking,
};

fn det(class: &str, cx: f32, cy: f32) -> Detection {
    // 80 px along frame x gives a half height of 40
    Detection::new(class, BBox::xywh(cx, cy, 80.0, 100.0).as_ltrb(), 0.9)
}

fn frame(ts: u64, detections: Vec<Detection>) -> Frame {
    let config = Config::default();

    Frame::new(ts, detections, DepthMap::uniform(500.0, &config.depth))
}

fn tracker() -> ProximityTracker {
    ProximityTracker::new(Config::default()).unwrap()
}

#[test]
fn new_track_becomes_matched_with_velocity() {
    let mut t = tracker();

    let alerts = t.update(&frame(1000, vec![det("person", 240.0, 200.0)])).unwrap();
    assert!(alerts.is_empty());

    let tracks = t.tracks();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].state, TrackState::New);
    assert_eq!(tracks[0].class, "person");
    assert_eq!(tracks[0].position, (240.0, 200.0));
    assert_eq!(tracks[0].velocity, (0.0, 0.0));

    t.update(&frame(1100, vec![det("person", 250.0, 205.0)])).unwrap();

    let tracks = t.tracks();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].track_id, 1);
    assert_eq!(tracks[0].state, TrackState::Matched);

    let (vx, vy) = tracks[0].velocity;
    assert!(vx > 0.0 && vy > 0.0);
    assert!((vx - 30.0).abs() < 1e-3);
    assert!((vy - 15.0).abs() < 1e-3);
}

#[test]
fn fused_distance_reaches_snapshot() {
    let mut t = tracker();
    t.update(&frame(0, vec![det("person", 240.0, 200.0)])).unwrap();

    let tracks = t.tracks();
    let expected = 119.975 * 1397.0 / (0.144 * 500.0 - 13.0) / 1000.0;

    assert!((tracks[0].distance_m - expected).abs() < 1e-3);
    assert_eq!(tracks[0].range, DistanceRange::Close);
}

#[test]
fn non_physical_depth_is_far() {
    let config = Config::default();
    let mut t = tracker();

    let depth = DepthMap::uniform(10.0, &config.depth);
    t.update(&Frame::new(0, vec![det("car", 240.0, 200.0)], depth))
        .unwrap();

    let tracks = t.tracks();
    assert_eq!(tracks[0].distance_m, 168.0);
    assert_eq!(tracks[0].range, DistanceRange::Distant);
}

#[test]
fn classes_never_mix() {
    let mut t = tracker();

    t.update(&frame(0, vec![det("person", 240.0, 200.0)])).unwrap();
    t.update(&frame(100, vec![det("car", 241.0, 200.0)])).unwrap();
    t.update(&frame(200, vec![det("car", 242.0, 200.0), det("person", 300.0, 300.0)]))
        .unwrap();

    let scene = t.scene();
    assert_eq!(scene.len(), 2);

    for p in scene.participants() {
        match p.id {
            1 => {
                assert_eq!(p.class, "person");
                assert_eq!(p.history.iter().map(|s| s.ts).collect::<Vec<_>>(), vec![0, 200]);
            }
            2 => {
                assert_eq!(p.class, "car");
                assert_eq!(p.history.len(), 2);
            }
            other => panic!("unexpected track {}", other),
        }
    }
}

#[test]
fn empty_ticks_age_tracks_until_eviction() {
    let mut t = tracker();

    t.update(&frame(0, vec![det("person", 240.0, 200.0)])).unwrap();

    for ts in (100..=2000).step_by(100) {
        t.update(&frame(ts, vec![])).unwrap();
        let tracks = t.tracks();
        assert_eq!(tracks.len(), 1, "evicted early at {}", ts);
        assert_eq!(tracks[0].state, TrackState::Stale);
        assert_eq!(tracks[0].time_since_update, ts);
    }

    t.update(&frame(2001, vec![])).unwrap();
    assert!(t.tracks().is_empty());
}

#[test]
fn match_just_inside_retention_survives() {
    let mut t = tracker();

    t.update(&frame(0, vec![det("person", 240.0, 200.0)])).unwrap();
    t.update(&frame(1999, vec![det("person", 250.0, 200.0)])).unwrap();
    t.update(&frame(2500, vec![])).unwrap();

    let tracks = t.tracks();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].track_id, 1);
}

#[test]
fn histories_stay_non_empty() {
    let mut t = tracker();

    let script: Vec<(u64, Vec<Detection>)> = vec![
        (0, vec![det("person", 10.0, 10.0), det("dog", 400.0, 100.0)]),
        (700, vec![det("person", 20.0, 15.0)]),
        (1400, vec![]),
        (2100, vec![det("dog", 380.0, 110.0), det("dog", 50.0, 50.0)]),
        (2800, vec![]),
        (3500, vec![det("person", 30.0, 20.0)]),
        (6000, vec![]),
    ];

    for (ts, dets) in script {
        t.update(&frame(ts, dets)).unwrap();
        assert!(t.scene().participants().iter().all(|p| !p.history.is_empty()));
    }

    assert!(t.tracks().is_empty());
}

#[test]
fn far_side_approach_alerts_once() {
    let mut t = tracker();

    // probe point (y, x + 40) lands on the anchor (240, 640)
    assert!(t.update(&frame(0, vec![det("person", 600.0, 245.0)])).unwrap().is_empty());

    let alerts = t.update(&frame(300, vec![det("person", 600.0, 240.0)])).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, AlertDirection::FarSide);
    assert_eq!(alerts[0].class, "person");
    assert_eq!(alerts[0].track_id, 1);
    assert_eq!(alerts[0].to_string(), "far-side person");

    assert_eq!(t.tracks()[0].velocity, (0.0, -5.0));
}

#[test]
fn dead_zone_suppresses_alert() {
    let mut t = tracker();

    t.update(&frame(0, vec![det("person", 600.0, 241.0)])).unwrap();
    let alerts = t.update(&frame(300, vec![det("person", 600.0, 240.0)])).unwrap();

    assert!(alerts.is_empty());
    assert_eq!(t.tracks()[0].velocity, (0.0, -1.0));
}

#[test]
fn near_side_approach_alerts() {
    let mut t = tracker();

    t.update(&frame(0, vec![det("bicycle", 600.0, 250.0)])).unwrap();
    let alerts = t.update(&frame(300, vec![det("bicycle", 600.0, 253.0)])).unwrap();

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, AlertDirection::NearSide);
    assert_eq!(alerts[0].to_string(), "near-side bicycle");
}

#[test]
fn receding_or_outside_roi_is_quiet() {
    let mut t = tracker();

    // far side moving away
    t.update(&frame(0, vec![det("person", 600.0, 230.0)])).unwrap();
    assert!(t.update(&frame(300, vec![det("person", 600.0, 236.0)])).unwrap().is_empty());

    // approaching but well outside the ROI
    let mut t = tracker();
    t.update(&frame(0, vec![det("person", 100.0, 100.0)])).unwrap();
    assert!(t.update(&frame(300, vec![det("person", 100.0, 80.0)])).unwrap().is_empty());
}

#[test]
fn debounce_limits_alert_rate() {
    let mut t = tracker();
    let mut fired = Vec::new();

    for step in 0..=60u64 {
        let ts = step * 100;
        let y = 242.0 - 2.0 * step as f32;

        let alerts = t.update(&frame(ts, vec![det("person", 600.0, y)])).unwrap();
        assert!(alerts.len() <= 1);

        if !alerts.is_empty() {
            fired.push(ts);
        }
    }

    assert_eq!(fired, vec![100, 3100]);

    for w in fired.windows(2) {
        assert!(w[1] - w[0] >= 3000);
    }
}

#[test]
fn weak_and_tiny_detections_are_ignored() {
    let mut t = tracker();

    let weak = Detection::new("person", BBox::xywh(240.0, 200.0, 80.0, 100.0).as_ltrb(), 0.2);
    let tiny = Detection::new("person", BBox::xywh(100.0, 100.0, 8.0, 8.0).as_ltrb(), 0.95);

    t.update(&frame(0, vec![weak, tiny])).unwrap();
    assert!(t.tracks().is_empty());
}

#[test]
fn rejects_bad_config() {
    let mut config = Config::default();
    config.tracking.retention_ms = 0;

    assert!(matches!(
        ProximityTracker::new(config),
        Err(Error::InvalidConfig { .. })
    ));

    let mut config = Config::default();
    config.alert.roi_radius = -1.0;
    assert!(Pipeline::from_config(config).is_err());
}

#[test]
fn pipeline_concurrent_inference() {
    let config = Config::default();
    let pipeline = Pipeline::from_config(config.clone()).unwrap();

    let out = pipeline
        .process_with(
            0,
            || vec![det("person", 240.0, 200.0)],
            || DepthMap::uniform(500.0, &config.depth),
        )
        .unwrap()
        .unwrap();

    assert_eq!(out.tracks.len(), 1);
    assert!(out.alerts.is_empty());
    assert_eq!(pipeline.snapshot()[0].class, "person");

    let json = serde_json::to_string(&*pipeline.snapshot()).unwrap();
    assert!(json.contains("\"class\":\"person\""));
}

#[test]
fn stale_track_alerts_only_within_grace() {
    let mut config = Config::default();
    config.alert.debounce_ms = 100;
    let mut t = ProximityTracker::new(config).unwrap();

    t.update(&frame(0, vec![det("bicycle", 600.0, 250.0)])).unwrap();
    assert_eq!(t.update(&frame(300, vec![det("bicycle", 600.0, 253.0)])).unwrap().len(), 1);

    // missed for 100 ms, still close enough to the last update
    let alerts = t.update(&frame(400, vec![])).unwrap();
    assert_eq!(t.tracks()[0].state, TrackState::Stale);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, AlertDirection::NearSide);

    // 600 ms since the last update
    assert!(t.update(&frame(900, vec![])).unwrap().is_empty());
    assert_eq!(t.tracks().len(), 1);
}

#[test]
fn malformed_boxes_are_a_normal_tick() {
    let mut t = tracker();

    let huge = Detection::new("person", BBox::ltrb(0.0, 0.0, 1e30, 100.0), 0.9);
    let nan = Detection::new("person", BBox::ltrb(f32::NAN, 0.0, 40.0, 80.0), 0.9);

    t.update(&frame(0, vec![huge.clone(), nan.clone()])).unwrap();
    let tracks = t.tracks();
    assert_eq!(tracks.len(), 1);
    assert!(tracks[0].position.0.is_finite());

    // the NaN box never becomes a track, so it cannot steal the real match
    t.update(&frame(100, vec![nan, det("person", 240.0, 200.0), huge])).unwrap();
    assert_eq!(t.tracks().len(), 2);
    assert!(t.tracks().iter().all(|tr| tr.position.0.is_finite()));
}
