use thiserror::Error;

use crate::notify::Notification;

/// Failure classes for a chat send. Capacity errors (`RateLimited`,
/// `PaymentRequired`) get their own toasts; everything else surfaces as the
/// generic send failure. None of these are fatal to the hosting surface.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("payment required")]
    PaymentRequired,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed stream: {0}")]
    Stream(String),
    #[error("stream ended without producing any reply content")]
    EmptyReply,
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}

impl ChatError {
    /// The user-facing toast for this failure.
    pub fn notification(&self) -> Notification {
        match self {
            ChatError::RateLimited => {
                Notification::error("Rate limit exceeded", "Please try again later.")
            }
            ChatError::PaymentRequired => {
                Notification::error("Payment required", "Please add credits to your workspace.")
            }
            ChatError::Transport(_) | ChatError::Stream(_) | ChatError::EmptyReply => {
                Notification::error("Error", "Failed to send message. Please try again.")
            }
        }
    }
}
