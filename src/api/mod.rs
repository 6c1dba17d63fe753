pub mod breakdown;
pub mod transcription;

use reqwest::StatusCode;
use thiserror::Error;

pub use breakdown::{BreakdownPlan, Subtask, TaskBreakdownClient};
pub use transcription::{TranscriptionClient, TranscriptionResult};

/// Failures talking to the plain request/response backends (task breakdown,
/// transcription). Reported as transient toasts, never fatal.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("input is empty")]
    EmptyInput,
    #[error("endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
