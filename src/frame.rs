use crate::depth::DepthMap;
use crate::detection::Detection;

/// Everything the tracker consumes for one camera tick
pub struct Frame {
    pub detections: Vec<Detection>,
    pub depth: DepthMap,
    pub timestamp: u64, // monotonic, in ms
}

impl Frame {
    pub fn new(timestamp: u64, detections: Vec<Detection>, depth: DepthMap) -> Self {
        Self {
            detections,
            depth,
            timestamp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
