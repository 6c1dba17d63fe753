use serde::Deserialize;

use super::error::ChatError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Cap on bytes held back waiting for the rest of a frame. A well-behaved
/// upstream never comes close; a misbehaving one fails hard instead of
/// growing the buffer without limit.
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct CompletionFrame {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: CompletionDelta,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionDelta {
    content: Option<String>,
}

impl CompletionFrame {
    fn into_delta_content(mut self) -> Option<String> {
        if self.choices.is_empty() {
            return None;
        }
        self.choices.swap_remove(0).delta.content
    }
}

/// Incremental decoder for the newline-delimited chat response stream.
///
/// Network reads do not align with frame boundaries, so a `data: ` line may
/// arrive split across two reads. A line that fails to parse as JSON is
/// pushed back onto the front of the buffer, newline included, and decoding
/// stops until more bytes arrive; chunked delivery is therefore transparent
/// to the caller.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffer: Vec<u8>,
    done: bool,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the terminal `[DONE]` sentinel has been observed. Further
    /// chunks are ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds one network read and returns the content deltas it completed.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Vec<String>, ChatError> {
        let mut deltas = Vec::new();
        if self.done {
            return Ok(deltas);
        }
        self.buffer.extend_from_slice(chunk);

        while let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline_index).collect();
            line.pop();
            if matches!(line.last(), Some(b'\r')) {
                line.pop();
            }

            let text = String::from_utf8_lossy(&line);
            if text.trim().is_empty() || text.starts_with(':') {
                continue;
            }
            let Some(payload) = text.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload == DONE_SENTINEL {
                self.done = true;
                return Ok(deltas);
            }

            match serde_json::from_str::<CompletionFrame>(payload) {
                Ok(frame) => {
                    if let Some(content) = frame.into_delta_content() {
                        if !content.is_empty() {
                            deltas.push(content);
                        }
                    }
                }
                Err(_) => {
                    // Most likely a frame split across reads. Put the whole
                    // line back, newline and all, and wait for more bytes.
                    let mut restored = line;
                    restored.push(b'\n');
                    restored.extend_from_slice(&self.buffer);
                    self.buffer = restored;
                    break;
                }
            }
        }

        if self.buffer.len() > MAX_PENDING_BYTES {
            return Err(ChatError::Stream(format!(
                "pending frame exceeded {} bytes",
                MAX_PENDING_BYTES
            )));
        }
        Ok(deltas)
    }
}
