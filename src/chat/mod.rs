pub mod client;
pub mod error;
pub mod message;
pub mod stream;
pub mod transcript;

pub use client::{ByteStream, ChatTransport, HttpChatTransport, SendOutcome, StressChat};
pub use error::ChatError;
pub use message::{ChatMessage, Role};
pub use stream::StreamAssembler;
pub use transcript::Transcript;
