//! Studykeeper binary: configuration, adapters, and the Discord client.

use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use studykeeper::adapters::discord::{
    all_commands, Data, DiscordNotifier, MentionHandler, SongbirdPlayer,
};
use studykeeper::adapters::knowledge::DirKnowledgeBank;
use studykeeper::adapters::llm::{OpenRouterClient, OpenRouterConfig};
use studykeeper::adapters::storage::JsonTaskStore;
use studykeeper::application::{
    ChatService, PlannerService, QuizService, SessionRegistry, SessionTiming,
};
use studykeeper::config::AppConfig;
use studykeeper::ports::{AudioPlayer, ChatModel, KnowledgeBank, SessionNotifier, TaskStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Startup failures are the only thing allowed to terminate the process.
    let config = AppConfig::load()?;
    config.validate()?;

    let store: Arc<dyn TaskStore> = Arc::new(JsonTaskStore::new(&config.storage.data_file));
    let bank: Arc<dyn KnowledgeBank> = Arc::new(DirKnowledgeBank::new(&config.storage.bank_dir));

    match bank.reload().await {
        Ok(stats) => tracing::info!(
            categories = stats.categories,
            chunks = stats.chunks,
            "knowledge bank loaded"
        ),
        Err(e) => tracing::error!(error = %e, "knowledge bank failed to load; quizzes disabled until /reload_bank"),
    }

    let llm: Arc<dyn ChatModel> = Arc::new(OpenRouterClient::new(
        OpenRouterConfig::new(config.llm.api_key())
            .with_base_url(&config.llm.base_url)
            .with_model(&config.llm.chat_model),
    ));

    let planner = Arc::new(PlannerService::new(Arc::clone(&store)));
    let chat = Arc::new(ChatService::new(
        Arc::clone(&llm),
        Arc::clone(&store),
        config.llm.chat_model.clone(),
        config.llm.reply_timeout(),
    ));
    let quiz = Arc::new(QuizService::new(
        Arc::clone(&llm),
        Arc::clone(&bank),
        config.llm.quiz_model.clone(),
    ));

    let manager = songbird::Songbird::serenity();
    let player: Arc<dyn AudioPlayer> = Arc::new(SongbirdPlayer::new(
        Arc::clone(&manager),
        config.audio.sound_file.clone(),
    ));

    let timing = SessionTiming {
        focus: config.session.focus(),
        brk: config.session.brk(),
        audio_poll: config.audio.poll_interval(),
    };
    let focus_minutes = config.session.focus_secs / 60;
    let break_minutes = config.session.break_secs / 60;

    let guild_id = config.discord.guild_id;
    let notification_channel = config
        .discord
        .notification_channel_id
        .map(serenity::ChannelId::new);
    let storage_config = config.storage.clone();

    let setup_planner = Arc::clone(&planner);
    let setup_chat = Arc::clone(&chat);
    let setup_quiz = Arc::clone(&quiz);
    let setup_bank = Arc::clone(&bank);
    let setup_player = Arc::clone(&player);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "registering slash commands");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                if let Some(guild) = guild_id {
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        serenity::GuildId::new(guild),
                    )
                    .await?;
                    tracing::info!(guild, "registered guild commands");
                }

                let notifier: Arc<dyn SessionNotifier> = Arc::new(DiscordNotifier::new(
                    ctx.http.clone(),
                    focus_minutes,
                    break_minutes,
                ));
                let registry =
                    SessionRegistry::new(Arc::clone(&setup_player), notifier, timing);

                Ok(Data {
                    registry,
                    planner: setup_planner,
                    chat: setup_chat,
                    quiz: setup_quiz,
                    bank: setup_bank,
                    player: setup_player,
                    storage: storage_config,
                    notification_channel,
                })
            })
        })
        .build();

    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    use songbird::SerenityInit;
    let mut client = serenity::ClientBuilder::new(config.discord.token(), intents)
        .framework(framework)
        .event_handler(MentionHandler::new(Arc::clone(&chat)))
        .register_songbird_with(manager)
        .await?;

    tracing::info!("studykeeper is starting");
    client.start().await?;
    Ok(())
}
