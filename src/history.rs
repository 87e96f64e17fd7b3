use std::collections::VecDeque;
use std::fmt;

use nalgebra as na;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub pos: na::Point2<f32>,
    pub distance_m: f32,
    // in ms
    pub ts: u64,
}

/// Position samples of one track, oldest first, bounded by age rather than
/// by count.
#[derive(Clone, Default)]
pub struct History {
    deque: VecDeque<Sample>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl History {
    pub fn new(first: Sample) -> Self {
        let mut deque = VecDeque::with_capacity(16);
        deque.push_back(first);

        Self { deque }
    }

    #[inline]
    pub fn push(&mut self, sample: Sample) {
        self.deque.push_back(sample);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ Sample> {
        self.deque.iter()
    }

    /// Pops samples older than `retention_ms` from the front, one at a time.
    /// Returns how many were dropped.
    pub fn trim(&mut self, now: u64, retention_ms: u64) -> usize {
        let mut dropped = 0;

        while let Some(front) = self.deque.front() {
            if now.saturating_sub(front.ts) > retention_ms {
                self.deque.pop_front();
                dropped += 1;
            } else {
                break;
            }
        }

        dropped
    }

    /// Displacement between the two newest samples expressed per `unit_ms`.
    ///
    /// Samples sharing a timestamp give the raw displacement.
    pub fn velocity(&self, unit_ms: u64) -> Option<na::Vector2<f32>> {
        let mut iter = self.deque.iter().rev();

        let top = iter.next()?;
        let prev = iter.next()?;

        let dl = top.pos - prev.pos;
        let dt = top.ts.saturating_sub(prev.ts);

        if dt == 0 {
            return Some(dl);
        }

        Some(dl * (unit_ms as f32 / dt as f32))
    }
}
