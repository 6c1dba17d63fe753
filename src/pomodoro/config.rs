use serde::{Deserialize, Serialize};

use super::PomodoroMode;

pub const WORK_MIN_RANGE: (u32, u32) = (1, 60);
pub const BREAK_MIN_RANGE: (u32, u32) = (1, 30);
pub const LONG_BREAK_MIN_RANGE: (u32, u32) = (5, 60);

/// Interval durations in minutes. Values outside the allowed range for a
/// mode are clamped to the nearest bound when applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroDurations {
    pub work_min: u32,
    pub break_min: u32,
    pub long_break_min: u32,
}

impl Default for PomodoroDurations {
    fn default() -> Self {
        Self {
            work_min: 25,
            break_min: 5,
            long_break_min: 15,
        }
    }
}

impl PomodoroDurations {
    pub fn clamped(self) -> Self {
        Self {
            work_min: self.work_min.clamp(WORK_MIN_RANGE.0, WORK_MIN_RANGE.1),
            break_min: self.break_min.clamp(BREAK_MIN_RANGE.0, BREAK_MIN_RANGE.1),
            long_break_min: self
                .long_break_min
                .clamp(LONG_BREAK_MIN_RANGE.0, LONG_BREAK_MIN_RANGE.1),
        }
    }

    pub fn minutes(&self, mode: PomodoroMode) -> u32 {
        match mode {
            PomodoroMode::Work => self.work_min,
            PomodoroMode::Break => self.break_min,
            PomodoroMode::LongBreak => self.long_break_min,
        }
    }

    pub fn seconds(&self, mode: PomodoroMode) -> u32 {
        self.minutes(mode) * 60
    }
}

/// Parses a minutes field coming from a free-form input. Non-numeric input
/// falls back to the minimum bound; out-of-range values are clamped.
pub fn parse_minutes(input: &str, min: u32, max: u32) -> u32 {
    input
        .trim()
        .parse::<u32>()
        .unwrap_or(min)
        .clamp(min, max)
}
