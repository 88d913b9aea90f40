//! Rolling gaze-direction history and windowed angular velocity.
//!
//! The focus aggregator uses the average angular velocity over the last few
//! frames to tell a steady look apart from a saccade in progress.

use std::collections::VecDeque;

use super::math::Vec3;

/// Default number of directions retained.
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded, insertion-ordered history of gaze directions.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    directions: VecDeque<Vec3>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` directions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            directions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a direction, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, direction: Vec3) {
        self.directions.push_back(direction);
        self.evict();
    }

    /// Change the capacity. Shrinking drops the oldest entries in bulk.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict();
    }

    fn evict(&mut self) {
        if self.directions.len() > self.capacity {
            let excess = self.directions.len() - self.capacity;
            self.directions.drain(..excess);
        }
    }

    /// Average angular velocity (degrees/second) over the last `frame_count`
    /// frame-to-frame velocities.
    ///
    /// Velocities are formed between every consecutive pair in the buffer
    /// using one shared `dt_s`, so the result is approximate when the frame
    /// time varies. Returns `None` when fewer than `frame_count` directions
    /// are stored, when no pair exists yet, or when `dt_s` is not positive.
    pub fn window_average(&self, frame_count: usize, dt_s: f64) -> Option<f32> {
        if self.directions.len() < frame_count || self.directions.len() < 2 {
            return None;
        }
        if !(dt_s > 0.0) || !dt_s.is_finite() {
            return None;
        }

        let dt = dt_s as f32;
        let pair_count = self.directions.len() - 1;
        let window = frame_count.clamp(1, pair_count);

        let total: f32 = self
            .directions
            .iter()
            .zip(self.directions.iter().skip(1))
            .skip(pair_count - window)
            .map(|(prev, cur)| cur.angle_deg(*prev) / dt)
            .sum();

        Some(total / window as f32)
    }

    /// Directions, oldest first.
    pub fn directions(&self) -> impl Iterator<Item = &Vec3> {
        self.directions.iter()
    }

    pub fn latest(&self) -> Option<Vec3> {
        self.directions.back().copied()
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.directions.clear();
    }
}
