//! Countdown between wallpaper changes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The timer is not running.
    Idle,
    Remaining(u64),
    /// Countdown hit zero and has been re-armed to the full interval.
    Expired,
}

/// Driven once per second by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationTimer {
    state: TimerState,
    remaining: u64,
}

impl RotationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns false if the timer was already running.
    pub fn start(&mut self, interval_secs: u64) -> bool {
        if self.is_running() {
            return false;
        }
        if self.remaining == 0 {
            self.remaining = interval_secs;
        }
        self.state = TimerState::Running;
        true
    }

    pub fn tick(&mut self, interval_secs: u64) -> Tick {
        if !self.is_running() {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = interval_secs;
            Tick::Expired
        } else {
            Tick::Remaining(self.remaining)
        }
    }

    /// Keeps the remaining time for a later `start`.
    pub fn pause(&mut self) {
        self.state = TimerState::Stopped;
    }

    pub fn stop(&mut self, interval_secs: u64) {
        self.state = TimerState::Stopped;
        self.remaining = interval_secs;
    }

    pub fn reset(&mut self, interval_secs: u64) {
        self.remaining = interval_secs;
    }
}
