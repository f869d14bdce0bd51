//! Countdown shown between sets.
//!
//! The timer keeps an absolute deadline while running, so `remaining` tracks
//! real elapsed time no matter how irregularly `tick` is called. It owns no
//! thread; whoever drives it (see [`crate::runtime`]) supplies `now`.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One-tap choices offered by the full-screen timer.
pub const REST_PRESETS_SECS: [u32; 6] = [30, 60, 90, 120, 180, 300];

/// 1-based pick from [`REST_PRESETS_SECS`].
pub fn preset_secs(position: usize) -> Option<u32> {
    position
        .checked_sub(1)
        .and_then(|i| REST_PRESETS_SECS.get(i))
        .copied()
}

/// Ascending three-tone completion cue.
pub const COMPLETION_TONES_HZ: [u32; 3] = [880, 1100, 1320];

/// Vibrate / pause / vibrate.
pub const HAPTIC_PATTERN_MS: [u64; 3] = [150, 80, 250];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Side effects fired once when a countdown runs out.
pub trait CompletionSignal {
    fn play_completion_tone(&self);
    fn trigger_haptic_pulse(&self);
}

/// Does nothing; for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSignal;

impl CompletionSignal for SilentSignal {
    fn play_completion_tone(&self) {}
    fn trigger_haptic_pulse(&self) {}
}

/// Rings the terminal bell once per tone. Terminals have no haptics, so the
/// pulse is only logged.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSignal {
    pub bell: bool,
}

impl CompletionSignal for TerminalSignal {
    fn play_completion_tone(&self) {
        if !self.bell {
            return;
        }
        let mut err = std::io::stderr();
        for (i, hz) in COMPLETION_TONES_HZ.iter().enumerate() {
            if i > 0 {
                std::thread::sleep(Duration::from_millis(130));
            }
            tracing::trace!(hz, "completion tone");
            let _ = err.write_all(b"\x07");
            let _ = err.flush();
        }
    }

    fn trigger_haptic_pulse(&self) {
        tracing::debug!(pattern = ?HAPTIC_PATTERN_MS, "haptic pulse requested");
    }
}

/// Counts how often each side effect fired. Clones share the counters.
#[derive(Debug, Clone, Default)]
pub struct RecordingSignal {
    tones: Arc<AtomicUsize>,
    pulses: Arc<AtomicUsize>,
}

impl RecordingSignal {
    pub fn tones(&self) -> usize {
        self.tones.load(Ordering::SeqCst)
    }

    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl CompletionSignal for RecordingSignal {
    fn play_completion_tone(&self) {
        self.tones.fetch_add(1, Ordering::SeqCst);
    }

    fn trigger_haptic_pulse(&self) {
        self.pulses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Single rest countdown. Starting a new rest replaces whatever was running.
#[derive(Debug)]
pub struct RestTimer<S: CompletionSignal> {
    duration_secs: u32,
    remaining_ms: u64,
    deadline: Option<Instant>,
    phase: TimerPhase,
    label: String,
    signal: S,
}

impl<S: CompletionSignal> RestTimer<S> {
    pub fn new(signal: S) -> Self {
        Self {
            duration_secs: crate::model::DEFAULT_TARGET_REST_SECS,
            remaining_ms: 0,
            deadline: None,
            phase: TimerPhase::Idle,
            label: String::new(),
            signal,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Whole seconds left, rounded up so `0` only shows once time is out.
    pub fn remaining_secs(&self) -> u32 {
        u32::try_from(self.remaining_ms.div_ceil(1000)).unwrap_or(u32::MAX)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_active(&self) -> bool {
        self.phase != TimerPhase::Idle
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    /// Fraction of the rest already spent, `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 1.0;
        }
        let duration = self.duration_secs as f64;
        ((duration - self.remaining_secs() as f64) / duration).clamp(0.0, 1.0)
    }

    /// Begins a fresh countdown from any phase, overriding label and duration.
    pub fn start(&mut self, secs: u32, label: impl Into<String>, now: Instant) {
        self.duration_secs = secs;
        self.label = label.into();
        self.run_for(secs as u64 * 1000, now);
        tracing::debug!(secs, label = %self.label, "rest started");
    }

    /// Re-reads the deadline. Returns `true` exactly when this call moved the
    /// timer from Running to Finished.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.remaining_ms = deadline.saturating_duration_since(now).as_millis() as u64;
        if self.remaining_ms > 0 {
            return false;
        }
        self.deadline = None;
        self.phase = TimerPhase::Finished;
        tracing::debug!(label = %self.label, "rest finished");
        self.signal.play_completion_tone();
        self.signal.trigger_haptic_pulse();
        true
    }

    pub fn pause(&mut self, now: Instant) {
        if self.phase != TimerPhase::Running {
            return;
        }
        self.tick(now);
        if self.phase == TimerPhase::Running {
            self.deadline = None;
            self.phase = TimerPhase::Paused;
        }
    }

    /// Continues a paused countdown; a timer with nothing left stays put.
    pub fn resume(&mut self, now: Instant) {
        if self.phase == TimerPhase::Paused && self.remaining_ms > 0 {
            self.run_for(self.remaining_ms, now);
        }
    }

    /// Runs the configured duration again from the top.
    pub fn restart(&mut self, now: Instant) {
        if self.phase != TimerPhase::Idle {
            self.run_for(self.duration_secs as u64 * 1000, now);
        }
    }

    /// Adds `delta_secs` to both remaining and total time, clamping at zero,
    /// so the progress fraction stays meaningful mid-countdown.
    pub fn adjust(&mut self, delta_secs: i32, now: Instant) {
        if self.phase == TimerPhase::Idle {
            return;
        }
        if self.phase == TimerPhase::Running {
            // may finish on its own before the adjustment lands
            self.tick(now);
        }
        let delta_ms = delta_secs as i64 * 1000;
        let duration = (self.duration_secs as i64 + delta_secs as i64).max(0);
        self.duration_secs = u32::try_from(duration).unwrap_or(u32::MAX);
        // never more left than the whole rest
        self.remaining_ms = ((self.remaining_ms as i64 + delta_ms).max(0) as u64)
            .min(self.duration_secs as u64 * 1000);

        if self.remaining_ms == 0 {
            self.deadline = None;
            self.phase = TimerPhase::Finished;
            return;
        }
        match self.phase {
            TimerPhase::Running => {
                self.deadline = Some(now + Duration::from_millis(self.remaining_ms));
            }
            TimerPhase::Finished => self.phase = TimerPhase::Paused,
            TimerPhase::Paused | TimerPhase::Idle => {}
        }
    }

    /// Clears the timer back to Idle from any phase.
    pub fn dismiss(&mut self) {
        self.deadline = None;
        self.remaining_ms = 0;
        self.phase = TimerPhase::Idle;
        self.label.clear();
    }

    fn run_for(&mut self, ms: u64, now: Instant) {
        self.remaining_ms = ms;
        self.deadline = Some(now + Duration::from_millis(ms));
        self.phase = TimerPhase::Running;
    }
}
