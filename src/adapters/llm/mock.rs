//! Mock chat model for testing.
//!
//! Configurable implementation of the [`ChatModel`] port: scripted
//! replies consumed in order, simulated latency for deadline tests,
//! error injection, and call recording for verification.
//!
//! # Example
//!
//! ```ignore
//! let model = MockChatModel::new()
//!     .with_reply("Hello!")
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ChatModel, Completion, CompletionRequest, ModelError};

/// A scripted outcome for one `complete` call.
#[derive(Debug, Clone)]
enum MockReply {
    Success(String),
    Error(ModelError),
}

/// Mock chat model.
#[derive(Clone)]
pub struct MockChatModel {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Duration,
}

impl MockChatModel {
    /// Creates a mock with no scripted replies; unscripted calls answer
    /// with a fixed placeholder.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Queues a successful reply.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Success(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: ModelError) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Error(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded requests.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockReply::Success("mock reply".to_string()))
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| "mock-model".to_string());
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Success(content) => Ok(Completion { content, model }),
            MockReply::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ModelRole;

    #[tokio::test]
    async fn scripted_replies_come_back_in_order() {
        let model = MockChatModel::new().with_reply("one").with_reply("two");

        let first = model.complete(CompletionRequest::new()).await.unwrap();
        let second = model.complete(CompletionRequest::new()).await.unwrap();
        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
    }

    #[tokio::test]
    async fn unscripted_calls_get_a_placeholder() {
        let model = MockChatModel::new();
        let reply = model.complete(CompletionRequest::new()).await.unwrap();
        assert_eq!(reply.content, "mock reply");
    }

    #[tokio::test]
    async fn errors_are_injected() {
        let model = MockChatModel::new().with_error(ModelError::RateLimited);
        assert!(matches!(
            model.complete(CompletionRequest::new()).await,
            Err(ModelError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let model = MockChatModel::new();
        let request = CompletionRequest::new().with_message(ModelRole::User, "hi");
        model.complete(request).await.unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(model.calls()[0].messages[0].content, "hi");
    }
}
