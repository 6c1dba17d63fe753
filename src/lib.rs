pub mod api;
pub mod chat;
pub mod notify;
pub mod pomodoro;

pub use api::{
    ApiError, BreakdownPlan, Subtask, TaskBreakdownClient, TranscriptionClient,
    TranscriptionResult,
};
pub use chat::{
    ChatError, ChatMessage, ChatTransport, HttpChatTransport, Role, SendOutcome, StressChat,
};
pub use notify::{Notification, NotificationKind};
pub use pomodoro::{
    PomodoroController, PomodoroDurations, PomodoroEvent, PomodoroMode, PomodoroSnapshot,
    PomodoroState,
};

/// Initializes logging (reads RUST_LOG env var). Safe to call more than
/// once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
