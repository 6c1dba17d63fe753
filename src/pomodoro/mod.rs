pub mod config;
pub mod controller;
pub mod state;

pub use config::{parse_minutes, PomodoroDurations};
pub use controller::{CompletedInterval, PomodoroController, PomodoroEvent, PomodoroSnapshot};
pub use state::{IntervalTransition, PomodoroMode, PomodoroState, SESSIONS_PER_CYCLE};
