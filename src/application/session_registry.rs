//! Session registry - one focus session and one audio loop per user.
//!
//! The registry owns every live focus session. A session is a spawned
//! timer task walking `Focus -> Break -> Done`, paired with an optional
//! audio-loop sub-task that keeps the guild's voice channel playing until
//! it is cancelled. Both carry an explicit [`CancellationToken`] checked
//! at every suspension point; cancellation is cooperative.
//!
//! Invariants:
//! - at most one live session and one live audio loop per user;
//! - `start` cancels any prior session (and its audio loop) before the
//!   new one is registered;
//! - the audio loop outlives the `Done` phase and only ends on an
//!   explicit stop or session cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::{ChannelId, GuildId, Timestamp, UserId};
use crate::domain::session::{SessionPhase, StartOutcome};
use crate::ports::{AudioError, AudioPlayer, SessionEvent, SessionNotifier};

/// Timer lengths for a session run; compressible for tests.
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    /// Focus phase length.
    pub focus: Duration,
    /// Break phase length.
    pub brk: Duration,
    /// Check interval of the audio poll-and-restart fallback.
    pub audio_poll: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            focus: Duration::from_secs(25 * 60),
            brk: Duration::from_secs(5 * 60),
            audio_poll: Duration::from_millis(500),
        }
    }
}

/// A live session entry.
struct ActiveSession {
    generation: u64,
    cancel: CancellationToken,
    started_at: Timestamp,
    phase: Arc<Mutex<SessionPhase>>,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// A live audio-loop entry.
struct AudioLoop {
    generation: u64,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

/// Registry of live focus sessions and audio loops.
///
/// Map mutations happen under a mutex; the critical sections never await,
/// so same-user operations observe each other atomically even on a
/// multi-threaded runtime.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<UserId, ActiveSession>>,
    audio_loops: Mutex<HashMap<UserId, AudioLoop>>,
    player: Arc<dyn AudioPlayer>,
    notifier: Arc<dyn SessionNotifier>,
    timing: SessionTiming,
    generation: AtomicU64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new(
        player: Arc<dyn AudioPlayer>,
        notifier: Arc<dyn SessionNotifier>,
        timing: SessionTiming,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            audio_loops: Mutex::new(HashMap::new()),
            player,
            notifier,
            timing,
            generation: AtomicU64::new(1),
        })
    }

    /// Starts a focus session for `user`, cancelling any prior one first.
    ///
    /// The phase task and the audio-loop sub-task are registered before
    /// this returns, so a concurrent `cancel` can always find them.
    pub fn start(
        self: &Arc<Self>,
        user: UserId,
        guild: GuildId,
        channel: ChannelId,
    ) -> StartOutcome {
        let outcome = if self.cancel(user) {
            StartOutcome::Restarted
        } else {
            StartOutcome::Started
        };

        self.spawn_audio_loop(user, guild, channel);

        let generation = self.next_generation();
        let cancel = CancellationToken::new();
        let phase = Arc::new(Mutex::new(SessionPhase::Focus));
        let task = tokio::spawn(Self::run_session(
            Arc::clone(self),
            user,
            channel,
            cancel.clone(),
            Arc::clone(&phase),
            generation,
            outcome == StartOutcome::Restarted,
        ));

        self.sessions.lock().unwrap().insert(
            user,
            ActiveSession {
                generation,
                cancel,
                started_at: Timestamp::now(),
                phase,
                task,
            },
        );

        tracing::info!(user = %user, guild = %guild, ?outcome, "focus session started");
        outcome
    }

    /// Cancels `user`'s session and its audio loop.
    ///
    /// Returns `false` with no side effect when no session exists.
    pub fn cancel(&self, user: UserId) -> bool {
        let Some(session) = self.sessions.lock().unwrap().remove(&user) else {
            return false;
        };
        session.cancel.cancel();

        if let Some(audio) = self.audio_loops.lock().unwrap().remove(&user) {
            audio.cancel.cancel();
        }

        tracing::info!(user = %user, "focus session cancelled");
        true
    }

    /// Stops only the audio loop. Returns `false` when none is running;
    /// stopping twice is a no-op.
    pub fn stop_audio(&self, user: UserId) -> bool {
        let Some(audio) = self.audio_loops.lock().unwrap().remove(&user) else {
            return false;
        };
        audio.cancel.cancel();
        tracing::info!(user = %user, "audio loop stopped");
        true
    }

    /// Whether `user` has a live session.
    pub fn has_session(&self, user: UserId) -> bool {
        self.sessions.lock().unwrap().contains_key(&user)
    }

    /// Whether `user` has a live audio loop.
    pub fn has_audio_loop(&self, user: UserId) -> bool {
        self.audio_loops.lock().unwrap().contains_key(&user)
    }

    /// When `user`'s session started, if one is live.
    pub fn started_at(&self, user: UserId) -> Option<Timestamp> {
        self.sessions
            .lock()
            .unwrap()
            .get(&user)
            .map(|s| s.started_at)
    }

    /// The phase `user`'s session is currently in, if one is live.
    pub fn phase(&self, user: UserId) -> Option<SessionPhase> {
        self.sessions
            .lock()
            .unwrap()
            .get(&user)
            .map(|s| *s.phase.lock().unwrap())
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Cancels every live session and audio loop.
    pub fn shutdown(&self) {
        let sessions = std::mem::take(&mut *self.sessions.lock().unwrap());
        for (_, session) in sessions {
            session.cancel.cancel();
        }
        let loops = std::mem::take(&mut *self.audio_loops.lock().unwrap());
        for (_, audio) in loops {
            audio.cancel.cancel();
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Removes the session entry if it is still the one `generation`
    /// belongs to. A newer session under the same user is left alone.
    fn finish_session(&self, user: UserId, generation: u64) {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions
            .get(&user)
            .is_some_and(|s| s.generation == generation)
        {
            sessions.remove(&user);
        }
    }

    /// Same as [`finish_session`](Self::finish_session), for audio loops.
    fn finish_audio(&self, user: UserId, generation: u64) {
        let mut loops = self.audio_loops.lock().unwrap();
        if loops
            .get(&user)
            .is_some_and(|a| a.generation == generation)
        {
            loops.remove(&user);
        }
    }

    /// The phase task: focus, break, done. Each sleep races the
    /// cancellation token; cancellation unwinds without further
    /// announcements.
    async fn run_session(
        registry: Arc<Self>,
        user: UserId,
        channel: ChannelId,
        cancel: CancellationToken,
        phase: Arc<Mutex<SessionPhase>>,
        generation: u64,
        restarted: bool,
    ) {
        let notifier = Arc::clone(&registry.notifier);

        notifier
            .notify(channel, user, SessionEvent::FocusStarted { restarted })
            .await;

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(user = %user, "session cancelled during focus");
                return;
            }
            _ = sleep(registry.timing.focus) => {}
        }

        *phase.lock().unwrap() = SessionPhase::Focus.next();
        notifier.notify(channel, user, SessionEvent::BreakStarted).await;

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(user = %user, "session cancelled during break");
                return;
            }
            _ = sleep(registry.timing.brk) => {}
        }

        *phase.lock().unwrap() = SessionPhase::Done;
        notifier.notify(channel, user, SessionEvent::Completed).await;

        // The session ends here; the audio loop deliberately keeps
        // playing until stopped on its own.
        registry.finish_session(user, generation);
    }

    /// Registers and spawns the audio-loop sub-task, cancelling any prior
    /// loop for the user first.
    fn spawn_audio_loop(self: &Arc<Self>, user: UserId, guild: GuildId, channel: ChannelId) {
        if let Some(previous) = self.audio_loops.lock().unwrap().remove(&user) {
            previous.cancel.cancel();
        }

        let generation = self.next_generation();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run_audio_loop(
            Arc::clone(self),
            user,
            guild,
            channel,
            cancel.clone(),
            generation,
        ));

        self.audio_loops.lock().unwrap().insert(
            user,
            AudioLoop {
                generation,
                cancel,
                task,
            },
        );
    }

    /// The audio-loop sub-task. Plays until cancelled; playback errors
    /// are reported to the invoking channel and end only this loop.
    async fn run_audio_loop(
        registry: Arc<Self>,
        user: UserId,
        guild: GuildId,
        channel: ChannelId,
        cancel: CancellationToken,
        generation: u64,
    ) {
        let player = Arc::clone(&registry.player);

        if !player.is_connected(guild).await {
            registry
                .notifier
                .notify(
                    channel,
                    user,
                    SessionEvent::AudioFailed {
                        reason: AudioError::NoVoiceConnection.to_string(),
                    },
                )
                .await;
            registry.finish_audio(user, generation);
            return;
        }

        let result = if player.supports_looping() {
            match player.play(guild, true).await {
                Ok(()) => {
                    cancel.cancelled().await;
                    let _ = player.stop(guild).await;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            Self::poll_and_restart(&*player, guild, &cancel, registry.timing.audio_poll).await
        };

        if let Err(e) = result {
            tracing::warn!(user = %user, guild = %guild, error = %e, "audio loop failed");
            registry
                .notifier
                .notify(
                    channel,
                    user,
                    SessionEvent::AudioFailed {
                        reason: e.to_string(),
                    },
                )
                .await;
        } else {
            tracing::debug!(user = %user, "audio loop ended");
        }

        registry.finish_audio(user, generation);
    }

    /// Fallback for playback layers without native looping: restart the
    /// track whenever it has gone silent, checking every `poll`.
    async fn poll_and_restart(
        player: &dyn AudioPlayer,
        guild: GuildId,
        cancel: &CancellationToken,
        poll: Duration,
    ) -> Result<(), AudioError> {
        loop {
            if !player.is_playing(guild).await {
                player.play(guild, false).await?;
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = player.stop(guild).await;
                    return Ok(());
                }
                _ = sleep(poll) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audio::MockAudioPlayer;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Notifier that records every event for assertions.
    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl RecordingNotifier {
        fn events(&self) -> Vec<SessionEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionNotifier for RecordingNotifier {
        async fn notify(&self, _channel: ChannelId, _user: UserId, event: SessionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn fast_timing() -> SessionTiming {
        SessionTiming {
            focus: Duration::from_millis(30),
            brk: Duration::from_millis(30),
            audio_poll: Duration::from_millis(5),
        }
    }

    fn user() -> UserId {
        UserId::new(42)
    }

    fn guild() -> GuildId {
        GuildId::new(7)
    }

    fn channel() -> ChannelId {
        ChannelId::new(99)
    }

    fn registry_with(
        player: MockAudioPlayer,
    ) -> (Arc<SessionRegistry>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = SessionRegistry::new(
            Arc::new(player),
            Arc::clone(&notifier) as Arc<dyn SessionNotifier>,
            fast_timing(),
        );
        (registry, notifier)
    }

    #[tokio::test]
    async fn start_registers_exactly_one_session_and_audio_loop() {
        let (registry, _) = registry_with(MockAudioPlayer::new().with_connected(guild()));

        let outcome = registry.start(user(), guild(), channel());
        assert_eq!(outcome, StartOutcome::Started);
        assert!(registry.has_session(user()));
        assert!(registry.has_audio_loop(user()));
        assert_eq!(registry.active_count(), 1);
    }

    #[tokio::test]
    async fn restart_replaces_the_previous_session() {
        let (registry, _) = registry_with(MockAudioPlayer::new().with_connected(guild()));

        registry.start(user(), guild(), channel());
        let outcome = registry.start(user(), guild(), channel());

        assert_eq!(outcome, StartOutcome::Restarted);
        assert_eq!(registry.active_count(), 1);
        assert!(registry.has_audio_loop(user()));
    }

    #[tokio::test]
    async fn cancel_without_session_is_a_no_op() {
        let (registry, notifier) = registry_with(MockAudioPlayer::new());

        assert!(!registry.cancel(user()));
        assert!(notifier.events().is_empty());
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn cancel_takes_the_audio_loop_down_with_the_session() {
        let player = MockAudioPlayer::new().with_connected(guild());
        let (registry, _) = registry_with(player.clone());

        registry.start(user(), guild(), channel());
        // Let the loop start playing before cancelling.
        sleep(Duration::from_millis(10)).await;

        assert!(registry.cancel(user()));
        assert!(!registry.has_session(user()));
        assert!(!registry.has_audio_loop(user()));

        sleep(Duration::from_millis(10)).await;
        assert!(!player.is_playing_now(guild()));
    }

    #[tokio::test]
    async fn phase_advances_with_the_timers() {
        let (registry, _) = registry_with(MockAudioPlayer::new().with_connected(guild()));

        registry.start(user(), guild(), channel());
        assert_eq!(registry.phase(user()), Some(SessionPhase::Focus));
        assert!(registry.started_at(user()).is_some());

        // Past the focus timer, inside the break.
        sleep(Duration::from_millis(45)).await;
        assert_eq!(registry.phase(user()), Some(SessionPhase::Break));

        // Past the break: the session is gone.
        sleep(Duration::from_millis(60)).await;
        assert_eq!(registry.phase(user()), None);
        assert_eq!(registry.started_at(user()), None);
    }

    #[tokio::test]
    async fn session_completes_but_audio_keeps_playing() {
        let player = MockAudioPlayer::new().with_connected(guild());
        let (registry, notifier) = registry_with(player.clone());

        registry.start(user(), guild(), channel());
        // Focus (30ms) + break (30ms) + slack.
        sleep(Duration::from_millis(120)).await;

        assert!(!registry.has_session(user()));
        assert!(registry.has_audio_loop(user()));
        assert!(player.is_playing_now(guild()));

        let events = notifier.events();
        assert_eq!(
            events,
            vec![
                SessionEvent::FocusStarted { restarted: false },
                SessionEvent::BreakStarted,
                SessionEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn stop_audio_is_idempotent() {
        let player = MockAudioPlayer::new().with_connected(guild());
        let (registry, _) = registry_with(player.clone());

        registry.start(user(), guild(), channel());
        sleep(Duration::from_millis(10)).await;

        assert!(registry.stop_audio(user()));
        assert!(!registry.stop_audio(user()));
        assert!(registry.has_session(user()));

        sleep(Duration::from_millis(10)).await;
        assert!(!player.is_playing_now(guild()));
    }

    #[tokio::test]
    async fn missing_voice_connection_is_reported_not_fatal() {
        let (registry, notifier) = registry_with(MockAudioPlayer::new());

        registry.start(user(), guild(), channel());
        sleep(Duration::from_millis(10)).await;

        // The session itself survives; only the audio loop gave up.
        assert!(registry.has_session(user()));
        assert!(!registry.has_audio_loop(user()));
        assert!(notifier
            .events()
            .iter()
            .any(|e| matches!(e, SessionEvent::AudioFailed { .. })));
    }

    #[tokio::test]
    async fn playback_error_is_reported_and_loop_ends() {
        let player = MockAudioPlayer::new()
            .with_connected(guild())
            .with_play_error(AudioError::MissingAudioFile("bell.mp3".into()));
        let (registry, notifier) = registry_with(player);

        registry.start(user(), guild(), channel());
        sleep(Duration::from_millis(10)).await;

        assert!(!registry.has_audio_loop(user()));
        assert!(notifier.events().iter().any(|e| matches!(
            e,
            SessionEvent::AudioFailed { reason } if reason.contains("bell.mp3")
        )));
    }

    #[tokio::test]
    async fn poll_mode_restarts_silent_playback() {
        let player = MockAudioPlayer::new()
            .with_connected(guild())
            .with_looping_support(false)
            .with_silent_playback();
        let (registry, _) = registry_with(player.clone());

        registry.start(user(), guild(), channel());
        sleep(Duration::from_millis(40)).await;
        registry.stop_audio(user());

        // Every poll found silence and restarted the track.
        assert!(player.play_count() >= 2);
    }

    #[tokio::test]
    async fn different_users_run_independently() {
        let other = UserId::new(43);
        let player = MockAudioPlayer::new().with_connected(guild());
        let (registry, _) = registry_with(player);

        registry.start(user(), guild(), channel());
        registry.start(other, guild(), channel());
        assert_eq!(registry.active_count(), 2);

        registry.cancel(user());
        assert!(!registry.has_session(user()));
        assert!(registry.has_session(other));
    }

    #[tokio::test]
    async fn shutdown_cancels_everything() {
        let player = MockAudioPlayer::new().with_connected(guild());
        let (registry, _) = registry_with(player);

        registry.start(user(), guild(), channel());
        registry.start(UserId::new(43), guild(), channel());

        registry.shutdown();
        assert_eq!(registry.active_count(), 0);
        assert!(!registry.has_audio_loop(user()));
    }
}
