//! Prompt construction and answer generation.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::types::{Answer, AnswerStream, ChatMessage, Role, GENERATION_APOLOGY};
use crate::llm::{GenerateRequest, LlmProvider};
use crate::store::ChunkSearchResult;

/// Only the most recent messages are rendered into the prompt.
const HISTORY_WINDOW: usize = 10;

const PROMPT_TEMPLATE: &str = "\
You are a helpful assistant that answers questions based on the provided context.

Context:
{context}

Conversation so far:
{chat_history}

Question: {question}

Instructions:
- Answer the question based on the context provided
- If the context doesn't contain enough information to answer the question, say so
- Be concise and accurate
- Cite specific information from the context when relevant
- Reply to human social conversations
- If the question and the context are unrelated, point out that they do not match
- Format the answer so that it is easy to read
- Emojis are welcome when they help clarity

Answer:";

pub struct ResponseGenerator {
    provider: Arc<dyn LlmProvider>,
    llm_model: String,
}

impl ResponseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, llm_model: String) -> Self {
        Self {
            provider,
            llm_model,
        }
    }

    /// Streaming answer for `question` grounded in `relevant_docs`.
    ///
    /// Fragments arrive in strict model emission order. A failure before the
    /// stream starts yields `Answer::Degraded` with a one-fragment apology;
    /// a failure mid-stream injects the same apology into the live stream
    /// and ends it.
    pub async fn generate_response_stream(
        &self,
        question: &str,
        relevant_docs: &[ChunkSearchResult],
        chat_history: &[ChatMessage],
    ) -> Answer {
        let prompt = build_prompt(question, relevant_docs, chat_history);

        let mut inner = match self
            .provider
            .stream_generate(GenerateRequest::new(prompt), &self.llm_model)
            .await
        {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!("Error generating streaming response: {}", e);
                return Answer::Degraded(AnswerStream::of(format!("{}{}", GENERATION_APOLOGY, e)));
            }
        };

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            while let Some(item) = inner.recv().await {
                match item {
                    Ok(fragment) => {
                        if tx.send(fragment).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Stream interrupted: {}", e);
                        let _ = tx.send(format!("{}{}", GENERATION_APOLOGY, e)).await;
                        return;
                    }
                }
            }
        });

        Answer::Generated(AnswerStream::from_receiver(rx))
    }

    /// Non-streaming answer; failures become the apology string.
    pub async fn generate_response(
        &self,
        question: &str,
        relevant_docs: &[ChunkSearchResult],
        chat_history: &[ChatMessage],
    ) -> String {
        let prompt = build_prompt(question, relevant_docs, chat_history);

        match self
            .provider
            .generate(GenerateRequest::new(prompt), &self.llm_model)
            .await
        {
            Ok(response) => response.trim().to_string(),
            Err(e) => {
                tracing::error!("Error generating response: {}", e);
                format!("{}{}", GENERATION_APOLOGY, e)
            }
        }
    }

    /// Health probe: a trivial prompt through the generation path.
    pub async fn probe(&self) -> bool {
        match self
            .provider
            .generate(GenerateRequest::new("Test"), &self.llm_model)
            .await
        {
            Ok(response) => !response.trim().is_empty(),
            Err(_) => false,
        }
    }
}

pub(crate) fn build_prompt(
    question: &str,
    relevant_docs: &[ChunkSearchResult],
    chat_history: &[ChatMessage],
) -> String {
    let context: Vec<&str> = relevant_docs
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect();

    PROMPT_TEMPLATE
        .replace("{context}", &context.join("\n\n"))
        .replace("{chat_history}", &format_chat_history(chat_history))
        .replace("{question}", question)
}

/// Render the last `HISTORY_WINDOW` messages oldest-first, or a fixed
/// sentinel when there is no history yet.
pub(crate) fn format_chat_history(chat_history: &[ChatMessage]) -> String {
    if chat_history.is_empty() {
        return "No previous conversation.".to_string();
    }

    let start = chat_history.len().saturating_sub(HISTORY_WINDOW);
    chat_history[start..]
        .iter()
        .map(|msg| match msg.role {
            Role::User => format!("Human: {}", msg.content),
            Role::Assistant => format!("Assistant: {}", msg.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChunkSearchResult, StoredChunk};

    fn result(content: &str) -> ChunkSearchResult {
        ChunkSearchResult {
            chunk: StoredChunk {
                chunk_id: "c".to_string(),
                content: content.to_string(),
                source: "doc.txt".to_string(),
                page: None,
                metadata: None,
            },
            score: 1.0,
        }
    }

    #[test]
    fn empty_history_renders_sentinel() {
        assert_eq!(format_chat_history(&[]), "No previous conversation.");
    }

    #[test]
    fn history_keeps_only_the_last_ten_messages_oldest_first() {
        let history: Vec<ChatMessage> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {}", i))
                } else {
                    ChatMessage::assistant(format!("answer {}", i))
                }
            })
            .collect();

        let rendered = format_chat_history(&history);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 10);
        // Messages 0 and 1 fell out of the window.
        assert_eq!(lines[0], "Human: question 2");
        assert_eq!(lines[9], "Assistant: answer 11");
        for (i, line) in lines.iter().enumerate() {
            if i % 2 == 0 {
                assert!(line.starts_with("Human: "));
            } else {
                assert!(line.starts_with("Assistant: "));
            }
        }
    }

    #[test]
    fn prompt_substitutes_all_placeholders() {
        let docs = vec![result("first passage"), result("second passage")];
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        let prompt = build_prompt("what is this?", &docs, &history);

        assert!(prompt.contains("first passage\n\nsecond passage"));
        assert!(prompt.contains("Human: hi\nAssistant: hello"));
        assert!(prompt.contains("Question: what is this?"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{chat_history}"));
        assert!(!prompt.contains("{question}"));
    }
}
