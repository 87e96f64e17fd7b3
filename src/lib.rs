pub mod alert;
pub mod assignment;
pub mod bbox;
pub mod config;
pub mod depth;
pub mod detection;
pub mod distance;
pub mod error;
pub mod frame;
pub mod history;
pub mod pipeline;
pub mod scene;

mod track;

pub use alert::{Alert, AlertDirection};
pub use config::Config;
pub use depth::DepthMap;
pub use detection::Detection;
pub use frame::Frame;
pub use pipeline::{Pipeline, PipelineStats, TickOutput};
pub use track::{Track, TrackState};

use alert::AlertEngine;
use detection::Measurement;
use distance::DistanceConverter;
use error::Error;
use scene::Scene;
use std::sync::Arc;

pub trait Tracking {
    fn update(&mut self, frame: &Frame) -> Result<Vec<Alert>, Error>;
    fn tracks(&self) -> Arc<[Track]>;
}

/// Depth fusion, track store and alert decision for a single camera.
pub struct ProximityTracker {
    config: Config,
    converter: DistanceConverter,
    scene: Scene,
    alerts: AlertEngine,
}

impl ProximityTracker {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            converter: DistanceConverter::new(config.distance.clone()),
            scene: Scene::new(config.tracking.clone()),
            alerts: AlertEngine::new(config.alert.clone()),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Admits the frame's detections and attaches a metric distance to each
    pub fn measure(&self, frame: &Frame) -> Vec<Measurement> {
        frame
            .iter()
            .filter(|det| det.admissible(&self.config.tracking))
            .map(|det| {
                let disparity = frame.depth.sample(&det.bbox);

                Measurement {
                    det: det.clone(),
                    distance_m: self.converter.to_meters(disparity),
                }
            })
            .collect()
    }
}

impl crate::Tracking for ProximityTracker {
    fn update(&mut self, frame: &Frame) -> Result<Vec<Alert>, Error> {
        let expected = (self.config.depth.grid_height, self.config.depth.grid_width);
        let actual = frame.depth.dim();

        if expected != actual {
            return Err(Error::DepthShape { expected, actual });
        }

        let measurements = self.measure(frame);
        self.scene.update(frame.timestamp, &measurements);

        Ok(self
            .alerts
            .scan(frame.timestamp, self.scene.participants_mut()))
    }

    #[inline]
    fn tracks(&self) -> Arc<[Track]> {
        self.scene.tracks().into()
    }
}
