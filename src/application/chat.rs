//! Chat service - mention replies and companion chat.
//!
//! Mention replies race the model against a deadline and always come back
//! as a string: the caller gets a fixed fallback on timeout or failure,
//! never an error. Companion chat keeps a bounded per-user history in the
//! task store and periodically refreshes an LLM-written personality
//! sketch that is fed back into later prompts.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::chat::{self, ChatMessage};
use crate::domain::foundation::UserId;
use crate::ports::{ChatModel, CompletionRequest, ModelRole, StoreError, TaskStore};

/// System prompt for mention replies.
const STUDY_ASSISTANT_PROMPT: &str = "You are a professional study-planning assistant. \
Help the user manage homework, reviews and study time. \
Reply in Traditional Chinese, friendly and professional.";

/// System prompt for companion chat.
const COMPANION_PROMPT: &str = "You are a warm, understanding mentor and study companion. \
You understand the stress, fatigue and anxiety of studying. Offer warm encouragement and \
practical advice, adjust your tone to the student's personality, and keep replies to two \
to four short paragraphs. Reply in Traditional Chinese with a warm, natural tone.";

/// System prompt for the personality analysis pass.
const ANALYST_PROMPT: &str = "You are a professional counselor who understands students \
through their conversations.";

/// Returned when a mention reply exceeds the deadline.
pub const TIMEOUT_FALLBACK: &str =
    "Sorry, that took too long to think about. Please try again later.";

/// Returned when the model fails outright on a mention reply.
pub const REPLY_FALLBACK: &str =
    "Sorry, the assistant cannot respond right now. Please try again later.";

/// Returned when companion chat fails; warmer than the mention fallback.
pub const COMPANION_FALLBACK: &str =
    "Sorry, I'm a little tired right now... but I'm always here for you. Shall we talk later?";

/// Companion replies sample warmer than the default.
const COMPANION_TEMPERATURE: f32 = 0.8;

/// Chat failures that cannot be expressed as a fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one companion-chat exchange.
#[derive(Debug, Clone)]
pub struct ConversationReply {
    /// The assistant's reply (or the fallback).
    pub content: String,
    /// Exchanges stored after this one.
    pub exchanges: usize,
    /// The personality sketch was re-analyzed on this exchange.
    pub personality_refreshed: bool,
    /// The reply is the fallback; nothing was persisted.
    pub is_fallback: bool,
}

/// A read-only view of a user's chat state.
#[derive(Debug, Clone)]
pub struct ChatHistoryView {
    /// Stored history, oldest first.
    pub history: Vec<ChatMessage>,
    /// Current personality sketch, empty until analyzed.
    pub personality: String,
}

impl ChatHistoryView {
    /// Number of full exchanges in the history.
    pub fn exchanges(&self) -> usize {
        self.history.len() / 2
    }

    /// The most recent `n` (user, assistant) pairs, newest first.
    pub fn recent_exchanges(&self, n: usize) -> Vec<(&ChatMessage, &ChatMessage)> {
        self.history
            .chunks_exact(2)
            .rev()
            .take(n)
            .map(|pair| (&pair[0], &pair[1]))
            .collect()
    }
}

/// Mention-reply and companion-chat service.
pub struct ChatService {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn TaskStore>,
    chat_model: String,
    reply_timeout: Duration,
}

impl ChatService {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn TaskStore>,
        chat_model: impl Into<String>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            model,
            store,
            chat_model: chat_model.into(),
            reply_timeout,
        }
    }

    /// Produces a mention reply.
    ///
    /// Always returns a string: the model's reply, or a fixed fallback
    /// when the deadline expires or the model fails. The partial result
    /// of a timed-out completion is discarded; there are no retries.
    pub async fn generate_reply(&self, prompt: &str) -> String {
        let request = CompletionRequest::new()
            .with_model(&self.chat_model)
            .with_system_prompt(STUDY_ASSISTANT_PROMPT)
            .with_message(ModelRole::User, prompt);

        match tokio::time::timeout(self.reply_timeout, self.model.complete(request)).await {
            Ok(Ok(completion)) => completion.content,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "mention reply failed");
                REPLY_FALLBACK.to_string()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.reply_timeout.as_secs(),
                    "mention reply timed out"
                );
                TIMEOUT_FALLBACK.to_string()
            }
        }
    }

    /// One companion-chat exchange: reply, persist, maybe refresh the
    /// personality sketch.
    pub async fn converse(
        &self,
        user: UserId,
        message: &str,
    ) -> Result<ConversationReply, ChatError> {
        let mut profile = self.store.load(user).await?;
        chat::trim_history(&mut profile.chat_history);
        profile.chat_history.push(ChatMessage::user(message));

        let mut system_prompt = COMPANION_PROMPT.to_string();
        if !profile.personality_profile.is_empty() {
            system_prompt.push_str("\n\nAbout this student's personality:\n");
            system_prompt.push_str(&profile.personality_profile);
        }

        let request = CompletionRequest::new()
            .with_model(&self.chat_model)
            .with_system_prompt(system_prompt)
            .with_history(&profile.chat_history)
            .with_temperature(COMPANION_TEMPERATURE);

        let content = match self.model.complete(request).await {
            Ok(completion) => completion.content,
            Err(e) => {
                tracing::error!(user = %user, error = %e, "companion chat failed");
                // Nothing is persisted on failure, so history holds only
                // complete exchanges.
                return Ok(ConversationReply {
                    content: COMPANION_FALLBACK.to_string(),
                    exchanges: profile.chat_history.len() / 2,
                    personality_refreshed: false,
                    is_fallback: true,
                });
            }
        };

        profile.chat_history.push(ChatMessage::assistant(&content));
        chat::trim_history(&mut profile.chat_history);

        let mut personality_refreshed = false;
        if chat::should_refresh_personality(profile.chat_history.len()) {
            if let Some(sketch) = self.analyze_personality(&profile.chat_history).await {
                profile.personality_profile = sketch;
                personality_refreshed = true;
            }
        }

        let exchanges = profile.chat_exchanges();
        self.store.save(user, &profile).await?;

        Ok(ConversationReply {
            content,
            exchanges,
            personality_refreshed,
            is_fallback: false,
        })
    }

    /// The stored history and personality sketch.
    pub async fn history(&self, user: UserId) -> Result<ChatHistoryView, ChatError> {
        let profile = self.store.load(user).await?;
        Ok(ChatHistoryView {
            history: profile.chat_history,
            personality: profile.personality_profile,
        })
    }

    /// Clears history and personality; returns the exchange count that
    /// was stored.
    pub async fn clear(&self, user: UserId) -> Result<usize, ChatError> {
        let mut profile = self.store.load(user).await?;
        let exchanges = profile.chat_exchanges();
        profile.chat_history.clear();
        profile.personality_profile.clear();
        self.store.save(user, &profile).await?;
        Ok(exchanges)
    }

    /// Runs the personality-analysis completion over the recent history.
    ///
    /// Failures keep the previous sketch; analysis is best-effort.
    async fn analyze_personality(&self, history: &[ChatMessage]) -> Option<String> {
        let transcript: String = history
            .iter()
            .map(|m| {
                let role = match m.role {
                    chat::ChatRole::User => "student",
                    chat::ChatRole::Assistant => "mentor",
                };
                format!("{}: {}\n", role, m.content)
            })
            .collect();

        let prompt = format!(
            "Based on the following conversation history, describe this student in two or \
three sentences: their emotional tendencies, their way of expressing themselves, and the \
kind of support they need most.\n\nConversation history:\n{}",
            transcript
        );

        let request = CompletionRequest::new()
            .with_model(&self.chat_model)
            .with_system_prompt(ANALYST_PROMPT)
            .with_message(ModelRole::User, prompt);

        match self.model.complete(request).await {
            Ok(completion) => Some(completion.content),
            Err(e) => {
                tracing::error!(error = %e, "personality analysis failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::MockChatModel;
    use crate::domain::planner::UserProfile;
    use crate::ports::ModelError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryStore {
        profiles: Mutex<HashMap<UserId, UserProfile>>,
    }

    impl InMemoryStore {
        fn seed(&self, user: UserId, profile: UserProfile) {
            self.profiles.lock().unwrap().insert(user, profile);
        }

        fn profile(&self, user: UserId) -> UserProfile {
            self.profiles
                .lock()
                .unwrap()
                .get(&user)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl TaskStore for InMemoryStore {
        async fn load(&self, user: UserId) -> Result<UserProfile, StoreError> {
            Ok(self.profile(user))
        }

        async fn save(&self, user: UserId, profile: &UserProfile) -> Result<(), StoreError> {
            self.profiles.lock().unwrap().insert(user, profile.clone());
            Ok(())
        }
    }

    fn user() -> UserId {
        UserId::new(5)
    }

    fn service_with(
        model: MockChatModel,
        timeout: Duration,
    ) -> (ChatService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        let service = ChatService::new(
            Arc::new(model),
            Arc::clone(&store) as Arc<dyn TaskStore>,
            "test-model",
            timeout,
        );
        (service, store)
    }

    #[tokio::test]
    async fn mention_reply_returns_model_content() {
        let (service, _) = service_with(
            MockChatModel::new().with_reply("Study 25 minutes, rest 5."),
            Duration::from_secs(1),
        );
        let reply = service.generate_reply("how should I study?").await;
        assert_eq!(reply, "Study 25 minutes, rest 5.");
    }

    #[tokio::test]
    async fn mention_reply_times_out_to_the_fixed_fallback() {
        let (service, _) = service_with(
            MockChatModel::new()
                .with_reply("too late")
                .with_delay(Duration::from_millis(100)),
            Duration::from_millis(20),
        );
        let reply = service.generate_reply("hello?").await;
        assert_eq!(reply, TIMEOUT_FALLBACK);
    }

    #[tokio::test]
    async fn mention_reply_maps_model_errors_to_the_fallback() {
        let (service, _) = service_with(
            MockChatModel::new().with_error(ModelError::Unavailable("down".into())),
            Duration::from_secs(1),
        );
        let reply = service.generate_reply("hello?").await;
        assert_eq!(reply, REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn converse_persists_both_turns() {
        let (service, store) = service_with(
            MockChatModel::new().with_reply("You're doing great."),
            Duration::from_secs(1),
        );

        let reply = service.converse(user(), "I'm exhausted").await.unwrap();
        assert_eq!(reply.content, "You're doing great.");
        assert_eq!(reply.exchanges, 1);
        assert!(!reply.is_fallback);

        let profile = store.profile(user());
        assert_eq!(profile.chat_history.len(), 2);
        assert_eq!(profile.chat_history[0].content, "I'm exhausted");
    }

    #[tokio::test]
    async fn converse_failure_returns_fallback_and_persists_nothing() {
        let (service, store) = service_with(
            MockChatModel::new().with_error(ModelError::Network("reset".into())),
            Duration::from_secs(1),
        );

        let reply = service.converse(user(), "hi").await.unwrap();
        assert!(reply.is_fallback);
        assert_eq!(reply.content, COMPANION_FALLBACK);
        assert!(store.profile(user()).chat_history.is_empty());
    }

    #[tokio::test]
    async fn personality_refreshes_on_the_fifth_exchange() {
        let model = MockChatModel::new()
            .with_reply("chat reply")
            .with_reply("anxious but diligent; needs encouragement");
        let (service, store) = service_with(model.clone(), Duration::from_secs(1));

        // Seed four complete exchanges; the fifth lands on the refresh
        // threshold (10 entries).
        let mut profile = UserProfile::default();
        for i in 0..4 {
            profile.chat_history.push(ChatMessage::user(format!("q{}", i)));
            profile
                .chat_history
                .push(ChatMessage::assistant(format!("a{}", i)));
        }
        store.seed(user(), profile);

        let reply = service.converse(user(), "fifth question").await.unwrap();
        assert!(reply.personality_refreshed);
        assert_eq!(
            store.profile(user()).personality_profile,
            "anxious but diligent; needs encouragement"
        );
        // Chat completion plus analysis completion.
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn stored_personality_reaches_the_system_prompt() {
        let model = MockChatModel::new().with_reply("ok");
        let (service, store) = service_with(model.clone(), Duration::from_secs(1));

        let profile = UserProfile {
            personality_profile: "optimistic, direct".to_string(),
            ..Default::default()
        };
        store.seed(user(), profile);

        service.converse(user(), "hello").await.unwrap();

        let call = &model.calls()[0];
        let system = call.system_prompt.as_deref().unwrap();
        assert!(system.contains("optimistic, direct"));
    }

    #[tokio::test]
    async fn history_is_bounded_by_the_window() {
        let model = MockChatModel::new();
        let (service, store) = service_with(model, Duration::from_secs(1));

        let mut profile = UserProfile::default();
        for i in 0..15 {
            profile.chat_history.push(ChatMessage::user(format!("q{}", i)));
            profile
                .chat_history
                .push(ChatMessage::assistant(format!("a{}", i)));
        }
        store.seed(user(), profile);

        service.converse(user(), "one more").await.unwrap();

        let stored = store.profile(user()).chat_history;
        assert!(stored.len() <= chat::HISTORY_WINDOW);
        assert_eq!(stored.last().unwrap().content, "mock reply");
    }

    #[tokio::test]
    async fn clear_resets_history_and_personality() {
        let (service, store) = service_with(
            MockChatModel::new().with_reply("hi"),
            Duration::from_secs(1),
        );
        service.converse(user(), "hello").await.unwrap();

        let cleared = service.clear(user()).await.unwrap();
        assert_eq!(cleared, 1);

        let profile = store.profile(user());
        assert!(profile.chat_history.is_empty());
        assert!(profile.personality_profile.is_empty());

        let view = service.history(user()).await.unwrap();
        assert_eq!(view.exchanges(), 0);
    }

    #[tokio::test]
    async fn recent_exchanges_come_back_newest_first() {
        let view = ChatHistoryView {
            history: vec![
                ChatMessage::user("q1"),
                ChatMessage::assistant("a1"),
                ChatMessage::user("q2"),
                ChatMessage::assistant("a2"),
            ],
            personality: String::new(),
        };

        let recent = view.recent_exchanges(3);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0.content, "q2");
        assert_eq!(recent[1].0.content, "q1");
    }
}
