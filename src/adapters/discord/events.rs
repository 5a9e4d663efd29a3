//! Gateway event handler - mention replies.
//!
//! Mentioning the bot asks the LLM for a quick answer behind a
//! "thinking" placeholder. The reply deadline and both fallback strings
//! live in the chat service; nothing here can crash the event loop.

use serenity::async_trait;
use serenity::builder::EditMessage;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use std::sync::Arc;

use super::format;
use crate::application::ChatService;

/// Handler answering bot mentions with LLM replies.
pub struct MentionHandler {
    chat: Arc<ChatService>,
}

impl MentionHandler {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl EventHandler for MentionHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, "connected to the gateway");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        if !msg.mentions_me(&ctx.http).await.unwrap_or(false) {
            return;
        }

        let prompt = {
            let bot_id = ctx.cache.current_user().id;
            msg.content
                .replace(&format!("<@{}>", bot_id), "")
                .replace(&format!("<@!{}>", bot_id), "")
                .trim()
                .to_string()
        };

        if prompt.is_empty() {
            let hint = "How can I help? 📖\nTry `/chat` to talk, or `/guide` for every command!";
            if let Err(e) = msg.reply(&ctx.http, hint).await {
                tracing::error!(error = %e, "failed to send mention hint");
            }
            return;
        }

        let mut thinking = match msg.reply(&ctx.http, "Thinking... 🤔").await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, "failed to send placeholder reply");
                return;
            }
        };

        let answer = self.chat.generate_reply(&prompt).await;
        let content = format::truncate_chars(&answer, format::MAX_MESSAGE_CHARS);

        if let Err(e) = thinking
            .edit(&ctx.http, EditMessage::new().content(content))
            .await
        {
            tracing::error!(error = %e, "failed to edit placeholder reply");
        }
    }
}
