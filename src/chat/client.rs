use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use log::warn;
use reqwest::StatusCode;

use super::{
    error::ChatError, message::ChatMessage, stream::StreamAssembler, transcript::Transcript,
};

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// Seam between the dialog logic and the network. One stream per send; the
/// implementation classifies capacity statuses before handing the body over.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<ByteStream, ChatError>;
}

/// reqwest-backed transport for the streaming chat completion endpoint.
pub struct HttpChatTransport {
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl HttpChatTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<ByteStream, ChatError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "messages": messages }));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(ChatError::RateLimited),
            StatusCode::PAYMENT_REQUIRED => Err(ChatError::PaymentRequired),
            status if !status.is_success() => Err(ChatError::Transport(format!(
                "chat endpoint returned {status}"
            ))),
            _ => Ok(Box::pin(response.bytes_stream().map_err(ChatError::from))),
        }
    }
}

/// Did `send_message` actually initiate a send? Validation failures (blank
/// input, send already in flight) are suppressed rather than surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    NotSent,
}

/// One stress-chat dialog: the transcript plus the single-send-in-flight
/// rule. A failed send rolls the transcript back to its pre-send length, so
/// the caller only ever observes whole turns.
pub struct StressChat<T: ChatTransport> {
    transport: T,
    transcript: Transcript,
    in_flight: bool,
}

impl<T: ChatTransport> StressChat<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            transcript: Transcript::new(),
            in_flight: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Clears the dialog. Does not abort an in-flight send; the flag only
    /// gates new sends.
    pub fn reset(&mut self) {
        self.transcript.clear();
    }

    /// Appends the user turn, streams the assistant reply into the
    /// transcript, and finalizes it. Any error between opening the stream
    /// and the sentinel rolls the optimistic user turn back.
    pub async fn send_message(&mut self, text: &str) -> Result<SendOutcome, ChatError> {
        let text = text.trim();
        if text.is_empty() || self.in_flight {
            return Ok(SendOutcome::NotSent);
        }

        let len_before = self.transcript.len();
        self.transcript.push_user(text);
        self.in_flight = true;
        let result = self.stream_reply().await;
        self.in_flight = false;

        match result {
            Ok(()) => {
                self.transcript.finalize_reply();
                Ok(SendOutcome::Sent)
            }
            Err(err) => {
                warn!("chat send failed: {err}");
                self.transcript.rollback_to(len_before);
                Err(err)
            }
        }
    }

    async fn stream_reply(&mut self) -> Result<(), ChatError> {
        let mut body = self.transport.open_stream(self.transcript.messages()).await?;
        let mut assembler = StreamAssembler::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for delta in assembler.push_chunk(&chunk)? {
                self.transcript.apply_delta(&delta);
            }
            if assembler.is_done() {
                break;
            }
        }

        if !self.transcript.has_reply_content() {
            return Err(ChatError::EmptyReply);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;
    use futures::stream;

    struct ScriptedTransport {
        chunks: Vec<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(chunks: Vec<&[u8]>) -> Self {
            Self {
                chunks: chunks.into_iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open_stream(&self, _messages: &[ChatMessage]) -> Result<ByteStream, ChatError> {
            let items: Vec<Result<Bytes, ChatError>> = self
                .chunks
                .iter()
                .cloned()
                .map(|c| Ok(Bytes::from(c)))
                .collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    struct RefusingTransport {
        status: StatusCode,
    }

    #[async_trait]
    impl ChatTransport for RefusingTransport {
        async fn open_stream(&self, _messages: &[ChatMessage]) -> Result<ByteStream, ChatError> {
            match self.status {
                StatusCode::TOO_MANY_REQUESTS => Err(ChatError::RateLimited),
                StatusCode::PAYMENT_REQUIRED => Err(ChatError::PaymentRequired),
                status => Err(ChatError::Transport(format!(
                    "chat endpoint returned {status}"
                ))),
            }
        }
    }

    struct DyingTransport;

    #[async_trait]
    impl ChatTransport for DyingTransport {
        async fn open_stream(&self, _messages: &[ChatMessage]) -> Result<ByteStream, ChatError> {
            let items: Vec<Result<Bytes, ChatError>> = vec![
                Ok(Bytes::from_static(
                    b"data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n",
                )),
                Err(ChatError::Transport("connection reset".into())),
            ];
            Ok(Box::pin(stream::iter(items)))
        }
    }

    #[tokio::test]
    async fn streamed_deltas_become_one_assistant_message() {
        let transport = ScriptedTransport::new(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n" as &[u8],
            b"data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            b"data: [DONE]\n",
        ]);
        let mut chat = StressChat::new(transport);
        let outcome = chat.send_message("I'm overwhelmed").await.unwrap();
        assert_eq!(outcome, SendOutcome::Sent);
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, Role::User);
        assert_eq!(chat.messages()[1].role, Role::Assistant);
        assert_eq!(chat.messages()[1].content, "Hello");
    }

    #[tokio::test]
    async fn frame_split_across_reads_yields_the_same_reply() {
        let transport = ScriptedTransport::new(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"" as &[u8],
            b"}}]}\n",
            b"data: [DONE]\n",
        ]);
        let mut chat = StressChat::new(transport);
        chat.send_message("hello").await.unwrap();
        assert_eq!(chat.messages()[1].content, "Hi");
    }

    #[tokio::test]
    async fn rate_limit_rolls_back_the_user_message() {
        let mut chat = StressChat::new(RefusingTransport {
            status: StatusCode::TOO_MANY_REQUESTS,
        });
        let len_before = chat.messages().len();
        let err = chat.send_message("help").await.unwrap_err();
        assert!(matches!(err, ChatError::RateLimited));
        assert_eq!(chat.messages().len(), len_before);
        assert_eq!(err.notification().title, "Rate limit exceeded");
    }

    #[tokio::test]
    async fn payment_required_is_reported_distinctly() {
        let mut chat = StressChat::new(RefusingTransport {
            status: StatusCode::PAYMENT_REQUIRED,
        });
        let err = chat.send_message("help").await.unwrap_err();
        assert!(matches!(err, ChatError::PaymentRequired));
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn mid_stream_failure_rolls_back_the_partial_reply() {
        let mut chat = StressChat::new(DyingTransport);
        let err = chat.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert!(chat.messages().is_empty());
        assert!(!chat.is_in_flight());
    }

    #[tokio::test]
    async fn stream_without_content_is_an_empty_reply_error() {
        let transport =
            ScriptedTransport::new(vec![b": keep-alive\n" as &[u8], b"data: [DONE]\n"]);
        let mut chat = StressChat::new(transport);
        let err = chat.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyReply));
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn blank_input_is_not_sent() {
        let transport = ScriptedTransport::new(vec![]);
        let mut chat = StressChat::new(transport);
        let outcome = chat.send_message("   ").await.unwrap();
        assert_eq!(outcome, SendOutcome::NotSent);
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn successful_turns_accumulate_in_the_transcript() {
        let transport = ScriptedTransport::new(vec![
            b"data: {\"choices\":[{\"delta\":{\"content\":\"sure\"}}]}\n" as &[u8],
            b"data: [DONE]\n",
        ]);
        let mut chat = StressChat::new(transport);
        chat.send_message("first").await.unwrap();
        chat.send_message("second").await.unwrap();
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(chat.messages()[2].content, "second");
        assert_eq!(chat.messages()[3].content, "sure");
        chat.reset();
        assert!(chat.messages().is_empty());
    }
}
