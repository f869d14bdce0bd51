use crate::model::WorkoutSession;

/// Running duration of the open session, with pause bookkeeping.
///
/// Lives only in memory: reopening a session starts over with no recorded
/// pauses, so the elapsed time then includes any earlier paused stretch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElapsedClock {
    start_timestamp_ms: i64,
    accumulated_pause_secs: i64,
    paused_at_ms: Option<i64>,
}

impl ElapsedClock {
    pub fn new(start_timestamp_ms: i64) -> Self {
        Self {
            start_timestamp_ms,
            accumulated_pause_secs: 0,
            paused_at_ms: None,
        }
    }

    pub fn for_session(session: &WorkoutSession) -> Self {
        Self::new(session.started_at_ms())
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    pub fn accumulated_pause_secs(&self) -> i64 {
        self.accumulated_pause_secs
    }

    pub fn pause(&mut self, now_ms: i64) {
        if self.paused_at_ms.is_none() {
            self.paused_at_ms = Some(now_ms);
        }
    }

    pub fn resume(&mut self, now_ms: i64) {
        if let Some(paused_at) = self.paused_at_ms.take() {
            self.accumulated_pause_secs += ((now_ms - paused_at) / 1000).max(0);
        }
    }

    pub fn toggle(&mut self, now_ms: i64) {
        if self.is_paused() {
            self.resume(now_ms);
        } else {
            self.pause(now_ms);
        }
    }

    /// Whole seconds since the start minus paused time, never negative.
    /// Frozen at the pause instant while paused.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        let at = self.paused_at_ms.unwrap_or(now_ms);
        let raw = (at - self.start_timestamp_ms).div_euclid(1000);
        (raw - self.accumulated_pause_secs).max(0) as u64
    }
}
