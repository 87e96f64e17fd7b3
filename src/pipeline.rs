use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::Error;
use crate::{Alert, Config, DepthMap, Detection, Frame, ProximityTracker, Track, Tracking};

/// Result of one fused tick
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub timestamp: u64,
    pub tracks: Arc<[Track]>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub dropped: u64,
    pub alerts: u64,
}

/// Runs ticks one at a time against a single tracker.
///
/// A frame arriving while another tick holds the tracker is dropped, not
/// queued. Readers take the last published snapshot and never wait on the
/// writer.
pub struct Pipeline<T: Tracking = ProximityTracker> {
    tracker: Mutex<T>,
    snapshot: RwLock<Arc<[Track]>>,
    processed: AtomicU64,
    dropped: AtomicU64,
    alerts: AtomicU64,
}

impl Pipeline<ProximityTracker> {
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let tracker = ProximityTracker::new(config)?;
        info!("pipeline ready");

        Ok(Self::new(tracker))
    }
}

impl<T: Tracking> Pipeline<T> {
    pub fn new(tracker: T) -> Self {
        let empty: Arc<[Track]> = Arc::new([]);

        Self {
            tracker: Mutex::new(tracker),
            snapshot: RwLock::new(empty),
            processed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            alerts: AtomicU64::new(0),
        }
    }

    fn drop_frame(&self, timestamp: u64) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(timestamp, "tick in flight, frame dropped");
    }

    fn fuse(&self, tracker: &mut T, frame: &Frame) -> Result<TickOutput, Error> {
        let alerts = tracker.update(frame)?;
        let tracks = tracker.tracks();

        *self.snapshot.write() = tracks.clone();

        self.processed.fetch_add(1, Ordering::Relaxed);
        self.alerts.fetch_add(alerts.len() as u64, Ordering::Relaxed);

        Ok(TickOutput {
            timestamp: frame.timestamp,
            tracks,
            alerts,
        })
    }

    /// Fuses `frame` unless another tick is running, in which case the frame
    /// is released and `Ok(None)` returned.
    pub fn try_process(&self, frame: Frame) -> Result<Option<TickOutput>, Error> {
        let mut tracker = match self.tracker.try_lock() {
            Some(guard) => guard,
            None => {
                self.drop_frame(frame.timestamp);
                return Ok(None);
            }
        };

        self.fuse(&mut tracker, &frame).map(Some)
    }

    /// Claims the tick, runs both inference callbacks concurrently and fuses
    /// once both have finished. Inference is skipped entirely when the tick
    /// is dropped.
    pub fn process_with<D, P>(
        &self,
        timestamp: u64,
        detect: D,
        depth: P,
    ) -> Result<Option<TickOutput>, Error>
    where
        D: FnOnce() -> Vec<Detection> + Send,
        P: FnOnce() -> DepthMap + Send,
    {
        let mut tracker = match self.tracker.try_lock() {
            Some(guard) => guard,
            None => {
                self.drop_frame(timestamp);
                return Ok(None);
            }
        };

        let (detections, depth) = std::thread::scope(|s| {
            let depth = s.spawn(depth);
            let detections = detect();

            (detections, depth.join())
        });

        let depth = match depth {
            Ok(depth) => depth,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        let frame = Frame::new(timestamp, detections, depth);

        self.fuse(&mut tracker, &frame).map(Some)
    }

    /// Last published track snapshot
    pub fn snapshot(&self) -> Arc<[Track]> {
        self.snapshot.read().clone()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            processed: self.processed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
        }
    }

    /// Direct access to the tracker, waiting for any running tick
    pub fn with_tracker<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.tracker.lock();
        f(&mut *guard)
    }
}
