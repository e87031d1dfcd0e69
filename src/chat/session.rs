//! Core chat session management.
//!
//! A `ChatSession` binds one model for its whole life, sends questions through
//! a [`ChatBackend`] and turns raw responses into [`Turn`]s.

use tracing::debug;

use crate::error::Result;
use crate::observability::{CHAT_REPLIES_PARSED, CHAT_REPLY_MISSES, CHAT_TURN_ERRORS, CHAT_TURNS};
use crate::reply::{FALLBACK_REPLY, ReplyExtractor};

/// Transport used by the chat session.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `question` for `model` and returns the raw response body.
    async fn ask(&self, model: &str, question: &str) -> Result<String>;
}

/// One question and the reply shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// What the user sent.
    pub question: String,
    /// The reply fragment, or [`FALLBACK_REPLY`].
    pub reply: String,
    /// False when the response held no reply fragment.
    pub parsed: bool,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// The model bound to the session.
    pub model: String,
    /// Questions sent, successful or not.
    pub turns_sent: u64,
    /// Responses with a reply fragment.
    pub replies_parsed: u64,
    /// Responses shown with the fallback text.
    pub fallback_replies: u64,
    /// Turns that failed on the wire.
    pub failed_turns: u64,
}

/// A chat session bound to a single model.
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    extractor: Box<dyn ReplyExtractor>,
    model: &'static str,
    stats: SessionStats,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Creates a new chat session.  The model cannot be changed afterwards.
    pub fn new(backend: B, model: &'static str, extractor: Box<dyn ReplyExtractor>) -> Self {
        Self {
            backend,
            extractor,
            model,
            stats: SessionStats {
                model: model.to_string(),
                ..SessionStats::default()
            },
        }
    }

    /// Returns the bound model.
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Returns the backend the session sends through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Sends one question and extracts the reply.
    ///
    /// A response without a reply fragment is not an error; the turn carries
    /// [`FALLBACK_REPLY`] instead.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the request fails.
    pub async fn send(&mut self, question: &str) -> Result<Turn> {
        self.stats.turns_sent += 1;
        CHAT_TURNS.click();
        let body = match self.backend.ask(self.model, question).await {
            Ok(body) => body,
            Err(err) => {
                self.stats.failed_turns += 1;
                CHAT_TURN_ERRORS.click();
                return Err(err);
            }
        };
        let turn = match self.extractor.extract(&body) {
            Some(reply) => {
                self.stats.replies_parsed += 1;
                CHAT_REPLIES_PARSED.click();
                Turn {
                    question: question.to_string(),
                    reply,
                    parsed: true,
                }
            }
            None => {
                debug!(body_len = body.len(), "no reply fragment in response");
                self.stats.fallback_replies += 1;
                CHAT_REPLY_MISSES.click();
                Turn {
                    question: question.to_string(),
                    reply: FALLBACK_REPLY.to_string(),
                    parsed: false,
                }
            }
        };
        Ok(turn)
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;
    use crate::reply::RegexReplyExtractor;

    struct FakeBackend {
        responses: Mutex<VecDeque<Result<String>>>,
        asked: Mutex<Vec<(String, String)>>,
    }

    impl FakeBackend {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for FakeBackend {
        async fn ask(&self, model: &str, question: &str) -> Result<String> {
            self.asked
                .lock()
                .unwrap()
                .push((model.to_string(), question.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::connection("no more responses", None)))
        }
    }

    fn session(responses: Vec<Result<String>>) -> ChatSession<FakeBackend> {
        ChatSession::new(
            FakeBackend::new(responses),
            "DeepSeek-R1",
            Box::new(RegexReplyExtractor::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn parsed_reply() {
        let mut session = session(vec![Ok(
            "<div class=\"response-content\">4</div>".to_string()
        )]);
        let turn = session.send("2+2?").await.unwrap();
        assert_eq!(
            turn,
            Turn {
                question: "2+2?".to_string(),
                reply: "4".to_string(),
                parsed: true,
            }
        );
        let asked = session.backend().asked.lock().unwrap().clone();
        assert_eq!(asked, vec![("DeepSeek-R1".to_string(), "2+2?".to_string())]);
    }

    #[tokio::test]
    async fn fallback_reply() {
        let mut session = session(vec![Ok("<html></html>".to_string())]);
        let turn = session.send("hello").await.unwrap();
        assert_eq!(turn.reply, FALLBACK_REPLY);
        assert!(!turn.parsed);
    }

    #[tokio::test]
    async fn transport_error_is_returned_and_counted() {
        let mut session = session(vec![
            Err(Error::timeout("slow", Some(30.0))),
            Ok("<div class=\"response-content\">ok</div>".to_string()),
        ]);
        let err = session.send("one").await.unwrap_err();
        assert!(err.is_timeout());
        let turn = session.send("two").await.unwrap();
        assert_eq!(turn.reply, "ok");

        let stats = session.stats();
        assert_eq!(stats.model, "DeepSeek-R1");
        assert_eq!(stats.turns_sent, 2);
        assert_eq!(stats.failed_turns, 1);
        assert_eq!(stats.replies_parsed, 1);
        assert_eq!(stats.fallback_replies, 0);
    }

    #[test]
    fn model_is_bound_at_construction() {
        let session = session(Vec::new());
        assert_eq!(session.model(), "DeepSeek-R1");
        assert_eq!(session.stats().turns_sent, 0);
    }
}
