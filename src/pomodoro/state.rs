use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::Notification;

use super::config::PomodoroDurations;

/// How many work intervals make up one full cycle before a long break.
pub const SESSIONS_PER_CYCLE: u32 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroMode {
    Work,
    Break,
    LongBreak,
}

impl Default for PomodoroMode {
    fn default() -> Self {
        PomodoroMode::Work
    }
}

/// Which branch an interval completion took. Carries enough context to
/// build the matching user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalTransition {
    ShortBreakStarted,
    LongBreakStarted,
    BackToWork,
}

impl IntervalTransition {
    pub fn notification(&self, durations: &PomodoroDurations) -> Notification {
        match self {
            IntervalTransition::LongBreakStarted => Notification::success(
                "🎉 Great work!",
                format!(
                    "Time for a long break ({} minutes). You've completed {} Pomodoro sessions!",
                    durations.long_break_min, SESSIONS_PER_CYCLE
                ),
            ),
            IntervalTransition::ShortBreakStarted => Notification::info(
                "⏰ Break time!",
                format!(
                    "Take a {}-minute break. You've earned it!",
                    durations.break_min
                ),
            ),
            IntervalTransition::BackToWork => Notification::info(
                "🚀 Back to work!",
                "Break's over. Time to focus and get things done!",
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    pub mode: PomodoroMode,
    /// Seconds remaining in the current interval. Always within
    /// `[0, durations.seconds(mode)]`.
    pub time_left: u32,
    pub is_running: bool,
    /// Completed work intervals since the last long break, in `[0, 4)`.
    pub session_count: u32,
    pub durations: PomodoroDurations,
    #[serde(skip)]
    pub interval_started_at: Option<DateTime<Utc>>,
}

impl Default for PomodoroState {
    fn default() -> Self {
        let durations = PomodoroDurations::default();
        Self {
            mode: PomodoroMode::Work,
            time_left: durations.seconds(PomodoroMode::Work),
            is_running: false,
            session_count: 0,
            durations,
            interval_started_at: None,
        }
    }
}

impl PomodoroState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full duration, in seconds, of the interval the state is currently in.
    pub fn full_seconds(&self) -> u32 {
        self.durations.seconds(self.mode)
    }

    /// Restores `time_left` to the full duration of the current mode. Mode
    /// and session count are untouched.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.time_left = self.full_seconds();
        self.interval_started_at = None;
    }

    /// Replaces the durations (clamping each to its allowed range) and
    /// re-applies the current mode's duration to `time_left`. Leaves the
    /// timer idle.
    pub fn apply_durations(&mut self, durations: PomodoroDurations) {
        self.durations = durations.clamped();
        self.is_running = false;
        self.time_left = self.full_seconds();
        self.interval_started_at = None;
    }

    /// One second elapsed. Returns the transition taken when the interval
    /// completed, `None` while it is still counting down.
    pub fn tick(&mut self) -> Option<IntervalTransition> {
        if self.time_left > 1 {
            self.time_left -= 1;
            return None;
        }
        self.time_left = 0;
        Some(self.complete_interval())
    }

    /// Interval completion transition. The timer never auto-continues into
    /// the next phase, so this always leaves the state idle.
    pub fn complete_interval(&mut self) -> IntervalTransition {
        let transition = match self.mode {
            PomodoroMode::Work => {
                self.session_count += 1;
                if self.session_count >= SESSIONS_PER_CYCLE {
                    self.session_count = 0;
                    self.mode = PomodoroMode::LongBreak;
                    IntervalTransition::LongBreakStarted
                } else {
                    self.mode = PomodoroMode::Break;
                    IntervalTransition::ShortBreakStarted
                }
            }
            PomodoroMode::Break | PomodoroMode::LongBreak => {
                self.mode = PomodoroMode::Work;
                IntervalTransition::BackToWork
            }
        };
        self.time_left = self.full_seconds();
        self.is_running = false;
        self.interval_started_at = None;
        transition
    }

    /// "Session N of 4" as rendered next to the countdown.
    pub fn session_label(&self) -> String {
        format!("Session {} of {}", self.session_count + 1, SESSIONS_PER_CYCLE)
    }
}
