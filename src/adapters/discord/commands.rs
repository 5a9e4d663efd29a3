//! Slash commands - the command surface over the application services.
//!
//! Command bodies only translate between Discord and the services:
//! user-input errors come back as inline messages, external-service
//! errors are logged and surfaced as a generic apology, and nothing here
//! is allowed to crash the event loop.

use futures::{Stream, StreamExt};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use crate::adapters::knowledge::ingest_sources;
use crate::application::{
    ChatService, PlannerError, PlannerService, QuizError, QuizService, SessionRegistry,
};
use crate::config::StorageConfig;
use crate::domain::foundation::{ChannelId, GuildId, TaskId, UserId, VoiceChannelId};
use crate::domain::quiz::AnswerChoice;
use crate::domain::session::StartOutcome;
use crate::ports::{AudioPlayer, BankError, KnowledgeBank};

use super::format;

/// Shared state handed to every command.
pub struct Data {
    pub registry: Arc<SessionRegistry>,
    pub planner: Arc<PlannerService>,
    pub chat: Arc<ChatService>,
    pub quiz: Arc<QuizService>,
    pub bank: Arc<dyn KnowledgeBank>,
    pub player: Arc<dyn AudioPlayer>,
    pub storage: StorageConfig,
    /// Channel receiving activity embeds; notifications are skipped when unset.
    pub notification_channel: Option<serenity::ChannelId>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Every command, in registration order.
pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        focus(),
        focus_stop(),
        music_stop(),
        join_voice(),
        add_homework(),
        add_review(),
        delete_task(),
        complete_task(),
        start_timer(),
        stop_timer(),
        tasks(),
        calendar(),
        agenda(),
        quiz(),
        answer(),
        reload_bank(),
        ingest_bank(),
        chat(),
        chat_history(),
        chat_clear(),
        guide(),
    ]
}

fn author(ctx: &Context<'_>) -> UserId {
    UserId::new(ctx.author().id.get())
}

/// The invoker's current voice channel, from the gateway cache.
fn voice_channel_of(ctx: &Context<'_>) -> Option<(GuildId, VoiceChannelId)> {
    let guild = ctx.guild()?;
    let channel = guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|state| state.channel_id)?;
    Some((
        GuildId::new(guild.id.get()),
        VoiceChannelId::new(channel.get()),
    ))
}

/// Maps planner failures onto inline messages; store failures get the
/// generic apology and a log line.
fn planner_message(error: &PlannerError) -> String {
    match error {
        PlannerError::InvalidDate(input) => format!(
            "❌ Bad date {:?} - use the YYYY-MM-DD format (e.g. 2026-02-15)",
            input
        ),
        PlannerError::InvalidMonth { year, month } => {
            format!("❌ {}-{} is not a valid month", year, month)
        }
        PlannerError::InvalidConfidence(value) => {
            format!("❌ Confidence must be between 1 and 10, got {}", value)
        }
        PlannerError::UnknownTask(id) => format!("❌ There is no task {}!", id),
        PlannerError::TaskCompleted(id) => {
            format!("✅ Task {} is already done - no timing needed!", id)
        }
        PlannerError::TimerAlreadyRunning(id) => {
            format!("⏱️ Task {} is already being timed!", id)
        }
        PlannerError::TimerNotRunning(id) => format!("❌ Task {} is not being timed!", id),
        PlannerError::Store(e) => {
            tracing::error!(error = %e, "task store failed");
            "❌ Something went wrong saving your data, please try again later.".to_string()
        }
    }
}

/// Best-effort activity embed to the configured notification channel.
async fn notify_activity(ctx: &Context<'_>, embed: serenity::CreateEmbed) {
    let Some(channel) = ctx.data().notification_channel else {
        return;
    };
    let message = serenity::CreateMessage::new().embed(embed);
    if let Err(e) = channel.send_message(ctx.serenity_context(), message).await {
        tracing::error!(error = %e, "activity notification failed");
    }
}

// ---- Focus sessions and voice ----

/// Start a focus session (25 min focus + 5 min break)
#[poise::command(slash_command, guild_only)]
pub async fn focus(ctx: Context<'_>) -> Result<(), Error> {
    let user = author(&ctx);
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("❌ Focus sessions only work inside a server.").await?;
        return Ok(());
    };
    let guild = GuildId::new(guild_id.get());

    // Join the invoker's voice channel when they are in one; a session
    // without audio is still a session.
    if let Some((voice_guild, voice_channel)) = voice_channel_of(&ctx) {
        if let Err(e) = ctx.data().player.join(voice_guild, voice_channel).await {
            tracing::error!(error = %e, "could not join voice channel");
            ctx.say(format!("⚠️ Could not join your voice channel: {}", e))
                .await?;
        }
    }

    let channel = ChannelId::new(ctx.channel_id().get());
    match ctx.data().registry.start(user, guild, channel) {
        StartOutcome::Restarted => {
            ctx.say("🔄 Found a running timer - restarted it for you!").await?
        }
        StartOutcome::Started => ctx.say("🚀 Focus session launched. Let's go!").await?,
    };
    Ok(())
}

/// Stop your focus session and its background audio
#[poise::command(slash_command, guild_only)]
pub async fn focus_stop(ctx: Context<'_>) -> Result<(), Error> {
    let user = author(&ctx);
    let phase = ctx.data().registry.phase(user);
    if ctx.data().registry.cancel(user) {
        let phase = phase.map(|p| p.to_string()).unwrap_or_default();
        ctx.say(format!(
            "🛑 Focus session stopped during the {} phase. See you at the next one!",
            phase
        ))
        .await?;
    } else {
        ctx.say("❌ You don't have a running focus session.").await?;
    }
    Ok(())
}

/// Stop the background audio without touching the timer
#[poise::command(slash_command, guild_only)]
pub async fn music_stop(ctx: Context<'_>) -> Result<(), Error> {
    if ctx.data().registry.stop_audio(author(&ctx)) {
        ctx.say("🔇 Background audio stopped!").await?;
    } else {
        ctx.say("❌ No background audio is playing for you.").await?;
    }
    Ok(())
}

/// Bring the bot into your voice channel
#[poise::command(slash_command, guild_only)]
pub async fn join_voice(ctx: Context<'_>) -> Result<(), Error> {
    let Some((guild, channel)) = voice_channel_of(&ctx) else {
        ctx.say("❌ Join a voice channel first, then I can follow you!")
            .await?;
        return Ok(());
    };

    match ctx.data().player.join(guild, channel).await {
        Ok(()) => {
            ctx.say(format!("🔊 Joined <#{}>", channel.get())).await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "voice join failed");
            ctx.say(format!("❌ Could not join the voice channel: {}", e))
                .await?;
        }
    }
    Ok(())
}

// ---- Planner ----

/// Add a homework task
#[poise::command(slash_command)]
pub async fn add_homework(
    ctx: Context<'_>,
    #[description = "Due date (YYYY-MM-DD)"] date: String,
    #[description = "Subject"] subject: String,
    #[description = "Pages or range (e.g. p.1-10)"] pages: String,
    #[description = "Estimated minutes"]
    #[min = 1]
    estimated_minutes: u32,
) -> Result<(), Error> {
    let result = ctx
        .data()
        .planner
        .add_homework(author(&ctx), &date, &subject, &pages, estimated_minutes)
        .await;

    match result {
        Ok(added) => {
            ctx.send(poise::CreateReply::default().embed(format::homework_added_embed(&added)))
                .await?;

            let notice = serenity::CreateEmbed::new()
                .title("📝 Homework added")
                .description(format!("<@{}> planned new homework", ctx.author().id.get()))
                .color(format::BLURPLE)
                .field("Subject", &subject, true)
                .field("Due", &date, true)
                .timestamp(serenity::Timestamp::now());
            notify_activity(&ctx, notice).await;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Add a review task, optionally spread over the forgetting curve
#[poise::command(slash_command)]
pub async fn add_review(
    ctx: Context<'_>,
    #[description = "Subject"] subject: String,
    #[description = "Range to review (e.g. ch. 1-3)"] range: String,
    #[description = "Confidence 1-10 (1 = shaky, 10 = solid)"]
    #[min = 1]
    #[max = 10]
    confidence: u8,
    #[description = "Estimated minutes"]
    #[min = 1]
    estimated_minutes: u32,
    #[description = "Schedule follow-ups after 1, 3, 7, 14 and 30 days"]
    spaced_repetition: Option<bool>,
) -> Result<(), Error> {
    let result = ctx
        .data()
        .planner
        .add_review(
            author(&ctx),
            &subject,
            &range,
            confidence,
            estimated_minutes,
            spaced_repetition.unwrap_or(false),
        )
        .await;

    match result {
        Ok(added) => {
            ctx.send(poise::CreateReply::default().embed(format::review_added_embed(&added)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Delete a task
#[poise::command(slash_command)]
pub async fn delete_task(
    ctx: Context<'_>,
    #[description = "Task id"]
    #[min = 1]
    task_id: u32,
) -> Result<(), Error> {
    match ctx
        .data()
        .planner
        .delete_task(author(&ctx), TaskId::new(task_id))
        .await
    {
        Ok(task) => {
            let embed = serenity::CreateEmbed::new()
                .title("🗑️ Task deleted")
                .description(format!(
                    "Removed the **{}** {} ({})",
                    task.subject,
                    task.kind.label(),
                    task.id
                ))
                .color(format::RED);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Mark a task as completed
#[poise::command(slash_command)]
pub async fn complete_task(
    ctx: Context<'_>,
    #[description = "Task id"]
    #[min = 1]
    task_id: u32,
) -> Result<(), Error> {
    match ctx
        .data()
        .planner
        .complete_task(author(&ctx), TaskId::new(task_id))
        .await
    {
        Ok(report) if report.already_completed => {
            ctx.say(format!("✅ Task {} was already completed!", report.task.id))
                .await?;
        }
        Ok(report) => {
            ctx.send(poise::CreateReply::default().embed(format::task_completed_embed(&report)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Start timing a task
#[poise::command(slash_command)]
pub async fn start_timer(
    ctx: Context<'_>,
    #[description = "Task id"]
    #[min = 1]
    task_id: u32,
) -> Result<(), Error> {
    match ctx
        .data()
        .planner
        .start_timer(author(&ctx), TaskId::new(task_id))
        .await
    {
        Ok(started) => {
            ctx.send(poise::CreateReply::default().embed(format::timer_started_embed(&started)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Stop timing a task and record the elapsed time
#[poise::command(slash_command)]
pub async fn stop_timer(
    ctx: Context<'_>,
    #[description = "Task id"]
    #[min = 1]
    task_id: u32,
) -> Result<(), Error> {
    match ctx
        .data()
        .planner
        .stop_timer(author(&ctx), TaskId::new(task_id))
        .await
    {
        Ok(report) => {
            ctx.send(poise::CreateReply::default().embed(format::timer_report_embed(&report)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// List all your tasks
#[poise::command(slash_command)]
pub async fn tasks(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().planner.overview(author(&ctx)).await {
        Ok(overview) if overview.pending.is_empty() && overview.completed.is_empty() => {
            ctx.say("You have no tasks yet! Start with `/add_homework` or `/add_review` 📚")
                .await?;
        }
        Ok(overview) => {
            ctx.send(poise::CreateReply::default().embed(format::overview_embed(&overview)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Show a month of deadlines
#[poise::command(slash_command)]
pub async fn calendar(
    ctx: Context<'_>,
    #[description = "Year (defaults to this year)"] year: Option<i32>,
    #[description = "Month 1-12 (defaults to this month)"]
    #[min = 1]
    #[max = 12]
    month: Option<u32>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let today = chrono::Utc::now().date_naive();
    let year = year.unwrap_or(chrono::Datelike::year(&today));
    let month = month.unwrap_or(chrono::Datelike::month(&today));

    match ctx.data().planner.month_overview(author(&ctx), year, month).await {
        Ok(overview) => {
            ctx.send(poise::CreateReply::default().embed(format::month_embed(&overview)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

/// Show everything due on one date
#[poise::command(slash_command)]
pub async fn agenda(
    ctx: Context<'_>,
    #[description = "Date (YYYY-MM-DD)"] date: String,
) -> Result<(), Error> {
    match ctx.data().planner.agenda(author(&ctx), &date).await {
        Ok(agenda) => {
            ctx.send(poise::CreateReply::default().embed(format::agenda_embed(&agenda)))
                .await?;
        }
        Err(e) => {
            ctx.say(planner_message(&e)).await?;
        }
    }
    Ok(())
}

// ---- Quiz ----

async fn autocomplete_category(
    ctx: Context<'_>,
    partial: &str,
) -> impl Stream<Item = String> {
    let partial = partial.to_lowercase();
    let categories = ctx.data().bank.categories().await;
    futures::stream::iter(categories).filter(move |category| {
        futures::future::ready(category.to_lowercase().starts_with(&partial))
    })
}

/// Answer choices offered by /answer.
#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum AnswerParam {
    A,
    B,
    C,
    D,
}

impl From<AnswerParam> for AnswerChoice {
    fn from(param: AnswerParam) -> Self {
        match param {
            AnswerParam::A => AnswerChoice::A,
            AnswerParam::B => AnswerChoice::B,
            AnswerParam::C => AnswerChoice::C,
            AnswerParam::D => AnswerChoice::D,
        }
    }
}

/// Get a quiz question from a subject's bank
#[poise::command(slash_command)]
pub async fn quiz(
    ctx: Context<'_>,
    #[description = "Subject"]
    #[autocomplete = "autocomplete_category"]
    subject: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().quiz.make_question(author(&ctx), &subject).await {
        Ok(question) => {
            let bank_size = ctx.data().bank.chunk_count(&subject).await;
            ctx.send(
                poise::CreateReply::default()
                    .embed(format::quiz_embed(&subject, &question, bank_size)),
            )
            .await?;
        }
        Err(QuizError::Bank(BankError::UnknownCategory(_))) => {
            ctx.say(format!(
                "❌ There is no question bank for \"{}\" - check the loaded subjects.",
                subject
            ))
            .await?;
        }
        Err(QuizError::Bank(BankError::EmptyCategory(_))) => {
            ctx.say(format!("⚠️ The \"{}\" bank is empty.", subject)).await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "quiz generation failed");
            ctx.say("❌ The quiz system hit an error, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Answer your pending quiz question
#[poise::command(slash_command)]
pub async fn answer(
    ctx: Context<'_>,
    #[description = "Your choice"] choice: AnswerParam,
) -> Result<(), Error> {
    match ctx.data().quiz.answer(author(&ctx), choice.into()) {
        Ok(outcome) => {
            ctx.send(poise::CreateReply::default().embed(format::answer_embed(&outcome)))
                .await?;
        }
        Err(QuizError::NoPendingQuestion) => {
            ctx.say("❌ No question is waiting for you - grab one with `/quiz` first!")
                .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "quiz answer failed");
            ctx.say("❌ The quiz system hit an error, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Reload the question bank from disk
#[poise::command(slash_command)]
pub async fn reload_bank(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().bank.reload().await {
        Ok(stats) => {
            ctx.say(format!(
                "✅ Bank reloaded: {} subject(s), {} chunk(s).",
                stats.categories, stats.chunks
            ))
            .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "bank reload failed");
            ctx.say("❌ Reloading the bank failed, see the logs.").await?;
        }
    }
    Ok(())
}

/// Ingest new source documents and reload the bank
#[poise::command(slash_command)]
pub async fn ingest_bank(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let storage = ctx.data().storage.clone();
    let ingested = ingest_sources(&storage.source_dir, &storage.bank_dir).await;

    match ingested {
        Ok(report) => {
            let stats = match ctx.data().bank.reload().await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!(error = %e, "bank reload after ingest failed");
                    ctx.say("❌ Ingested, but reloading the bank failed - see the logs.")
                        .await?;
                    return Ok(());
                }
            };
            ctx.say(format!(
                "✅ Ingest done: {} new chunk(s), {} source(s) already banked. \
The bank now holds {} subject(s) with {} chunk(s).",
                report.new_chunks, report.skipped_sources, stats.categories, stats.chunks
            ))
            .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "ingest failed");
            ctx.say(format!("❌ Ingest failed: {}", e)).await?;
        }
    }
    Ok(())
}

// ---- Chat ----

/// Talk through your study stress with the bot
#[poise::command(slash_command)]
pub async fn chat(
    ctx: Context<'_>,
    #[description = "What's on your mind?"] message: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().chat.converse(author(&ctx), &message).await {
        Ok(reply) => {
            ctx.send(poise::CreateReply::default().embed(format::chat_embed(&reply)))
                .await?;

            if !reply.is_fallback {
                let notice = serenity::CreateEmbed::new()
                    .title("💬 Chat visit")
                    .description(format!("<@{}> dropped by to chat", ctx.author().id.get()))
                    .color(format::SOFT_BLUE)
                    .field("Exchanges", reply.exchanges.to_string(), true)
                    .timestamp(serenity::Timestamp::now());
                notify_activity(&ctx, notice).await;
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "chat failed");
            ctx.say("❌ Something went wrong saving the chat, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Look back at your chat history
#[poise::command(slash_command)]
pub async fn chat_history(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().chat.history(author(&ctx)).await {
        Ok(view) if view.history.is_empty() => {
            ctx.say("We haven't talked yet! Start with `/chat` 💙").await?;
        }
        Ok(view) => {
            ctx.send(poise::CreateReply::default().embed(format::chat_history_embed(&view)))
                .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "chat history failed");
            ctx.say("❌ Could not read your chat history, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Wipe the chat history and start over
#[poise::command(slash_command)]
pub async fn chat_clear(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().chat.clear(author(&ctx)).await {
        Ok(exchanges) => {
            let embed = serenity::CreateEmbed::new()
                .title("🔄 Memory reset")
                .description(format!(
                    "We talked {} time(s); I'll treasure those. Let's get to know each other again 💙",
                    exchanges
                ))
                .color(format::SOFT_BLUE);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "chat clear failed");
            ctx.say("❌ Could not clear your chat history, please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Show the command guide
#[poise::command(slash_command)]
pub async fn guide(ctx: Context<'_>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(format::guide_embed()))
        .await?;
    Ok(())
}
