use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Fixed reply when retrieval finds nothing to ground an answer on.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// Prefix of the synthetic reply emitted when generation fails.
pub const GENERATION_APOLOGY: &str =
    "I apologize, but I encountered an error while generating a response: ";

/// Who said a chat message. Closed set; match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. History is ordered, append-only, and owned
/// by the caller; the pipeline only ever borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Pull-based, single-consumption token stream.
///
/// Each `next` may block on network I/O to the model endpoint. Dropping the
/// stream early is always safe: the producer task exits on its first failed
/// send, so no background work continues once the consumer stops pulling.
pub struct AnswerStream {
    rx: mpsc::Receiver<String>,
}

impl AnswerStream {
    pub(crate) fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// A stream that yields exactly one fragment.
    pub(crate) fn of(fragment: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(fragment.into());
        Self { rx }
    }

    /// Next fragment, or `None` when generation is finished.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Drain the stream into a single string.
    pub async fn collect(mut self) -> String {
        let mut full = String::new();
        while let Some(fragment) = self.next().await {
            full.push_str(&fragment);
        }
        full
    }
}

/// How the answer came to be. Tests assert on the variant instead of
/// string-matching the stream contents.
pub enum Answer {
    /// Normal generation grounded in retrieved context.
    Generated(AnswerStream),
    /// Retrieval found nothing; the stream carries the fixed sentinel.
    NoContext(AnswerStream),
    /// Generation failed; the stream carries a one-fragment apology.
    Degraded(AnswerStream),
}

impl Answer {
    pub fn into_stream(self) -> AnswerStream {
        match self {
            Answer::Generated(s) | Answer::NoContext(s) | Answer::Degraded(s) => s,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Answer::Degraded(_))
    }
}

/// A retrieved passage as shown to the user alongside the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Chunk content, truncated to 200 characters with a trailing ellipsis.
    pub content: String,
    pub source: String,
    pub page: Option<u32>,
}

/// Result of a streaming query. `sources` is fully materialized before the
/// stream yields anything.
pub struct QueryResult {
    pub answer: Answer,
    pub sources: Vec<SourceInfo>,
    pub num_sources: usize,
}

/// Result of a non-streaming query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub num_sources: usize,
}

/// Component health, recomputed on demand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ingestion: bool,
    pub retrieval: bool,
    pub generation: bool,
}
