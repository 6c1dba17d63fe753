use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Transcribed audio plus the study feedback generated for it. Extra
/// response fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionResult {
    pub transcription: String,
    #[serde(default)]
    pub feedback: String,
}

pub struct TranscriptionClient {
    client: reqwest::Client,
    base_url: String,
}

impl TranscriptionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Uploads a recorded voice note as the multipart `audio` field.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<TranscriptionResult, ApiError> {
        if audio.is_empty() {
            return Err(ApiError::EmptyInput);
        }

        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/webm")?;
        let form = Form::new().part("audio", part);

        let response = self
            .client
            .post(format!("{}/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    /// Cheap reachability probe against the backend root.
    pub async fn check_health(&self) -> bool {
        match self.client.get(format!("{}/", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_parses_with_and_without_feedback() {
        let full: TranscriptionResult = serde_json::from_str(
            r#"{"transcription":"hello world","feedback":"clear pacing","message":"ok"}"#,
        )
        .unwrap();
        assert_eq!(full.transcription, "hello world");
        assert_eq!(full.feedback, "clear pacing");

        let bare: TranscriptionResult =
            serde_json::from_str(r#"{"transcription":"hello"}"#).unwrap();
        assert_eq!(bare.feedback, "");
    }

    #[tokio::test]
    async fn empty_audio_is_rejected_before_any_request() {
        let client = TranscriptionClient::new("http://127.0.0.1:9");
        let err = client.transcribe(Vec::new(), "voice_note.webm").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyInput));
    }

    #[tokio::test]
    async fn unreachable_backend_reports_unhealthy() {
        let client = TranscriptionClient::new("http://127.0.0.1:9");
        assert!(!client.check_health().await);
    }
}
