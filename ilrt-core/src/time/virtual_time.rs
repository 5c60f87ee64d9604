//! Virtual playback time
//!
//! Playback runs on a virtual clock that starts at 0, advances at
//! `speed` virtual milliseconds per wall-clock millisecond and stands still
//! while paused. The tracker never reads a clock itself; every operation
//! takes the wall-clock instant from the caller.
//!
//! ```text
//! wall:     start ────── set_speed(2) ────── pause ······· resume ──────▶
//! virtual:  0 ──(x1)──▶ a ──────(x2)──────▶ b    (frozen)  b ──(x2)───▶
//! ```
//!
//! Every regime change (speed, pause) first folds the elapsed segment into
//! `virtual_at_segment_start`, so a segment only ever runs at one speed.

use crate::errors::{IlrtError, IlrtResult};

use super::Timestamp;

/// Maps wall-clock instants to elapsed virtual playback time
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualTimeTracker {
    started: bool,
    paused: bool,
    segment_start_wall: Timestamp,
    virtual_at_segment_start: i64,
    speed: f64,
}

impl Default for VirtualTimeTracker {
    fn default() -> Self {
        Self {
            started: false,
            paused: false,
            segment_start_wall: 0,
            virtual_at_segment_start: 0,
            speed: 1.0,
        }
    }
}

impl VirtualTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time 0 at `now`, playing at speed 1.0
    pub fn start(&mut self, now: Timestamp) {
        self.started = true;
        self.paused = false;
        self.segment_start_wall = now;
        self.virtual_at_segment_start = 0;
        self.speed = 1.0;
    }

    /// Elapsed virtual milliseconds at wall-clock `now`
    ///
    /// Frozen while paused and 0 before [`start`](Self::start).
    pub fn current_virtual_time(&self, now: Timestamp) -> i64 {
        if !self.is_playing() {
            return self.virtual_at_segment_start;
        }
        let elapsed = now.saturating_sub(self.segment_start_wall);
        self.virtual_at_segment_start
            .saturating_add(scale(elapsed, self.speed))
    }

    /// Change the speed factor.
    ///
    /// While playing the elapsed segment is captured first, so virtual time
    /// is continuous across the change. Rejects non-positive and non-finite
    /// factors without touching state.
    pub fn set_speed(&mut self, now: Timestamp, factor: f64) -> IlrtResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(IlrtError::InvalidSpeed(factor));
        }
        if self.is_playing() {
            self.capture(now);
        }
        self.speed = factor;
        Ok(())
    }

    /// Freeze virtual time. No-op when paused or not started.
    pub fn pause(&mut self, now: Timestamp) {
        if !self.is_playing() {
            return;
        }
        self.capture(now);
        self.paused = true;
    }

    /// Continue from the frozen value. No-op unless paused.
    pub fn resume(&mut self, now: Timestamp) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.segment_start_wall = now;
    }

    /// Wall-clock milliseconds until virtual time reaches `target`, 0 if it
    /// already has
    pub fn calculate_delay(&self, target: i64, now: Timestamp) -> i64 {
        let remaining = target.saturating_sub(self.current_virtual_time(now));
        if remaining <= 0 {
            return 0;
        }
        (remaining as f64 / self.speed) as i64
    }

    /// Back to the freshly constructed state, speed included
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed
    }

    fn is_playing(&self) -> bool {
        self.started && !self.paused
    }

    fn capture(&mut self, now: Timestamp) {
        self.virtual_at_segment_start = self.current_virtual_time(now);
        self.segment_start_wall = now;
    }
}

/// `elapsed · speed`, truncated toward zero
fn scale(elapsed: i64, speed: f64) -> i64 {
    (elapsed as f64 * speed) as i64
}
