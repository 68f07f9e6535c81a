//! # Player Engine
//!
//! The canonical playback state machine, run as an actor. One mailbox
//! carries host commands (with reply channels), backend signals, session
//! signals, and ticker ticks; the engine task processes one message at a
//! time, which makes it the single serialization point and the sole mutator
//! of session state. Platform callbacks never touch state directly — they
//! marshal signals onto the mailbox.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use bridge_traits::{BackendSignal, MediaBackend, SessionSignal};

use crate::config::PlayerConfig;
use crate::error::{Result, StreamError};
use crate::events::{EventBus, PlayerEvent};
use crate::session::{PlaybackSession, PlayerState};
use crate::ticker::TimeTicker;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Host command, carried on the mailbox with its reply channel.
pub(crate) enum Command {
    Play { url: Url, reply: Reply<()> },
    Pause { reply: Reply<()> },
    Resume { reply: Reply<()> },
    Stop { reply: Reply<()> },
    Seek { position_seconds: f64, reply: Reply<()> },
    SetRate { rate: f64, reply: Reply<()> },
    CurrentState { reply: oneshot::Sender<PlayerState> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Everything the engine mailbox carries.
pub(crate) enum EngineMsg {
    Command(Command),
    Backend(BackendSignal),
    Session(SessionSignal),
    Tick,
}

enum Flow {
    Continue,
    Shutdown,
}

/// Reorder an immediately-available batch of mailbox messages before
/// processing.
///
/// Policy: an explicit stop command is applied before anything else in the
/// batch; otherwise a failure signal is applied before any
/// ready/buffering signal it raced with. Everything else keeps arrival
/// order, and the reorder is stable.
fn reorder_batch(batch: &mut Vec<EngineMsg>) {
    if let Some(pos) = batch
        .iter()
        .position(|m| matches!(m, EngineMsg::Command(Command::Stop { .. })))
    {
        if pos > 0 {
            let msg = batch.remove(pos);
            batch.insert(0, msg);
        }
        return;
    }

    let first_status = batch.iter().position(|m| {
        matches!(
            m,
            EngineMsg::Backend(
                BackendSignal::ReadyToPlay
                    | BackendSignal::BufferingStarted
                    | BackendSignal::BufferingEnded
            )
        )
    });
    let failure = batch
        .iter()
        .position(|m| matches!(m, EngineMsg::Backend(BackendSignal::PlaybackFailed { .. })));

    if let (Some(status), Some(fail)) = (first_status, failure) {
        if fail > status {
            let msg = batch.remove(fail);
            batch.insert(status, msg);
        }
    }
}

fn emit(bus: &EventBus, event: PlayerEvent) {
    trace!(event = event.description(), "emitting");
    if bus.emit(event).is_err() {
        trace!("no subscribers attached");
    }
}

/// The engine actor. Owns the backend exclusively for the lifetime of the
/// streamer and releases it on teardown.
pub(crate) struct PlayerEngine<B: MediaBackend> {
    backend: B,
    config: PlayerConfig,
    bus: EventBus,
    mailbox: mpsc::Receiver<EngineMsg>,
    mailbox_tx: mpsc::Sender<EngineMsg>,
    session: Option<PlaybackSession>,
    ticker: Option<TimeTicker>,
}

impl<B: MediaBackend> PlayerEngine<B> {
    pub(crate) fn new(
        backend: B,
        config: PlayerConfig,
        bus: EventBus,
        mailbox: mpsc::Receiver<EngineMsg>,
        mailbox_tx: mpsc::Sender<EngineMsg>,
    ) -> Self {
        Self {
            backend,
            config,
            bus,
            mailbox,
            mailbox_tx,
            session: None,
            ticker: None,
        }
    }

    /// Run until shutdown or until every command/signal sender is gone.
    pub(crate) async fn run(mut self) {
        debug!("engine started");
        while let Some(first) = self.mailbox.recv().await {
            let mut batch = vec![first];
            while let Ok(msg) = self.mailbox.try_recv() {
                batch.push(msg);
            }
            reorder_batch(&mut batch);

            for msg in batch {
                if let Flow::Shutdown = self.handle(msg).await {
                    debug!("engine stopped");
                    return;
                }
            }
        }
        // Facade and all signal handles dropped; tear down quietly.
        self.release_session(false).await;
        debug!("engine mailbox closed");
    }

    fn current_state(&self) -> PlayerState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(PlayerState::Idle)
    }

    async fn handle(&mut self, msg: EngineMsg) -> Flow {
        match msg {
            EngineMsg::Command(cmd) => return self.handle_command(cmd).await,
            EngineMsg::Backend(signal) => self.handle_backend(signal).await,
            EngineMsg::Session(signal) => self.handle_session(signal).await,
            EngineMsg::Tick => self.handle_tick().await,
        }
        Flow::Continue
    }

    async fn handle_command(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Play { url, reply } => {
                let result = self.handle_play(url).await;
                reply.send(result).ok();
            }
            Command::Pause { reply } => {
                reply.send(self.handle_pause().await).ok();
            }
            Command::Resume { reply } => {
                reply.send(self.handle_resume().await).ok();
            }
            Command::Stop { reply } => {
                reply.send(self.handle_stop().await).ok();
            }
            Command::Seek {
                position_seconds,
                reply,
            } => {
                reply.send(self.handle_seek(position_seconds).await).ok();
            }
            Command::SetRate { rate, reply } => {
                reply.send(self.handle_set_rate(rate).await).ok();
            }
            Command::CurrentState { reply } => {
                reply.send(self.current_state()).ok();
            }
            Command::Shutdown { reply } => {
                info!("engine shutting down");
                self.release_session(true).await;
                reply.send(()).ok();
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_play(&mut self, url: Url) -> Result<()> {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.state.is_active())
        {
            info!(%url, "replacing live session");
            self.release_session(true).await;
        } else {
            // A terminal session is replaced silently.
            self.session = None;
        }

        info!(%url, "starting stream");
        let session = PlaybackSession::new(url.clone());

        if let Err(e) = self.backend.load(&url).await {
            return self.fail_play(session, e.to_string());
        }
        if let Err(e) = self.backend.play().await {
            return self.fail_play(session, e.to_string());
        }

        self.session = Some(session);
        self.spawn_ticker();
        Ok(())
    }

    /// Synchronous load/play failure: the error goes back to the caller and
    /// is also emitted as a durable event.
    fn fail_play(&mut self, mut session: PlaybackSession, message: String) -> Result<()> {
        error!(%message, "failed to start stream");
        session.state = PlayerState::Failed;
        self.session = Some(session);
        emit(&self.bus, PlayerEvent::Error {
            message: message.clone(),
        });
        Err(StreamError::Backend(message))
    }

    async fn handle_pause(&mut self) -> Result<()> {
        let state = self.current_state();
        if !matches!(state, PlayerState::Playing | PlayerState::Buffering) {
            return Err(StreamError::invalid_state("pause", state));
        }

        self.backend.pause().await?;
        if let Some(session) = self.session.as_mut() {
            session.state = PlayerState::Paused;
            session.is_buffering = false;
            // A host pause sticks even across an interruption in progress.
            session.paused_by_interruption = false;
        }
        info!("paused");
        emit(&self.bus, PlayerEvent::Pause);
        Ok(())
    }

    async fn handle_resume(&mut self) -> Result<()> {
        let state = self.current_state();
        if state != PlayerState::Paused {
            return Err(StreamError::invalid_state("resume", state));
        }

        self.backend.play().await?;
        if let Some(session) = self.session.as_mut() {
            session.state = PlayerState::Playing;
            session.paused_by_interruption = false;
        }
        info!("resumed");
        emit(&self.bus, PlayerEvent::Play);
        Ok(())
    }

    async fn handle_stop(&mut self) -> Result<()> {
        let state = self.current_state();
        if !state.is_active() {
            return Err(StreamError::invalid_state("stop", state));
        }

        self.stop_session().await;
        Ok(())
    }

    async fn handle_seek(&mut self, position_seconds: f64) -> Result<()> {
        if position_seconds.is_nan() {
            return Err(StreamError::InvalidArgument(
                "seek position must be a number".to_string(),
            ));
        }

        let state = self.current_state();
        if !state.accepts_transport() {
            return Err(StreamError::invalid_state("seek", state));
        }

        // Negative positions clamp to the start rather than erroring.
        let clamped = position_seconds.max(0.0);
        self.backend.seek(clamped).await?;
        if let Some(session) = self.session.as_mut() {
            // Optimistic; the next time update reconciles against the
            // backend's actual position.
            session.set_position(clamped);
        }
        debug!(position = clamped, "seeked");
        Ok(())
    }

    async fn handle_set_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(StreamError::InvalidArgument(format!(
                "playback rate must be a positive number, got {}",
                rate
            )));
        }

        let state = self.current_state();
        if !state.accepts_transport() {
            return Err(StreamError::invalid_state("set rate", state));
        }

        self.backend.set_rate(rate).await?;
        if let Some(session) = self.session.as_mut() {
            session.rate = rate;
        }
        debug!(rate, "rate changed");
        Ok(())
    }

    // ========================================================================
    // Backend signals
    // ========================================================================

    async fn handle_backend(&mut self, signal: BackendSignal) {
        let state = self.current_state();
        if state == PlayerState::Idle || state.is_terminal() {
            warn!(?signal, %state, "ignoring backend signal");
            return;
        }

        match signal {
            BackendSignal::ReadyToPlay | BackendSignal::BufferingEnded => self.on_ready(),
            BackendSignal::BufferingStarted => self.on_buffering_started(),
            BackendSignal::PlaybackFailed { message } => self.fail_session(message).await,
            BackendSignal::EndOfMedia => {
                info!("end of media");
                self.stop_session().await;
            }
        }
    }

    fn on_ready(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.state {
            PlayerState::Loading => {
                session.state = PlayerState::Playing;
                info!("stream ready, playing");
                emit(&self.bus, PlayerEvent::Play);
            }
            PlayerState::Buffering => {
                session.state = PlayerState::Playing;
                session.is_buffering = false;
                debug!("buffering ended");
                // Recovery always reads buffering-end then play, never pause.
                emit(&self.bus, PlayerEvent::Buffering { is_buffering: false });
                emit(&self.bus, PlayerEvent::Play);
            }
            state => debug!(%state, "ready signal ignored"),
        }
    }

    fn on_buffering_started(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.state {
            PlayerState::Playing => {
                session.state = PlayerState::Buffering;
                session.is_buffering = true;
                debug!("buffering started");
                emit(&self.bus, PlayerEvent::Buffering { is_buffering: true });
            }
            state => debug!(%state, "buffering signal ignored"),
        }
    }

    // ========================================================================
    // Session signals
    // ========================================================================

    async fn handle_session(&mut self, signal: SessionSignal) {
        let state = self.current_state();
        if state == PlayerState::Idle || state.is_terminal() {
            warn!(?signal, %state, "ignoring session signal");
            return;
        }

        match signal {
            SessionSignal::InterruptionBegan => {
                if matches!(state, PlayerState::Playing | PlayerState::Buffering) {
                    if let Err(e) = self.backend.pause().await {
                        warn!(error = %e, "backend pause failed on interruption");
                    }
                    if let Some(session) = self.session.as_mut() {
                        session.state = PlayerState::Paused;
                        session.is_buffering = false;
                        session.paused_by_interruption = true;
                    }
                    info!("interrupted, paused");
                    emit(&self.bus, PlayerEvent::Pause);
                }
            }
            SessionSignal::InterruptionEnded { should_resume } => {
                let interrupted = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.state == PlayerState::Paused && s.paused_by_interruption);
                if !interrupted {
                    debug!("interruption ended with nothing to resume");
                    return;
                }
                if let Some(session) = self.session.as_mut() {
                    session.paused_by_interruption = false;
                }
                if should_resume {
                    if let Err(e) = self.backend.play().await {
                        warn!(error = %e, "backend resume failed after interruption");
                        return;
                    }
                    if let Some(session) = self.session.as_mut() {
                        session.state = PlayerState::Playing;
                    }
                    info!("interruption ended, resumed");
                    emit(&self.bus, PlayerEvent::Play);
                }
            }
            SessionSignal::RouteChanged { device_lost } => {
                // Headphones unplugged, bluetooth dropped: pause rather than
                // blast the built-in speaker. Applies to a still-loading
                // session too, so the stream does not start playing on the
                // replacement route. Not an interruption pause; the host
                // must resume explicitly.
                if device_lost && state != PlayerState::Paused {
                    if let Err(e) = self.backend.pause().await {
                        warn!(error = %e, "backend pause failed on route change");
                    }
                    if let Some(session) = self.session.as_mut() {
                        session.state = PlayerState::Paused;
                        session.is_buffering = false;
                        session.paused_by_interruption = false;
                    }
                    info!("output device lost, paused");
                    emit(&self.bus, PlayerEvent::Pause);
                }
            }
        }
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    async fn handle_tick(&mut self) {
        let state = self.current_state();
        if !state.emits_time_updates() {
            trace!(%state, "tick ignored");
            return;
        }

        match self.backend.position().await {
            Ok(position) => {
                if let Some(session) = self.session.as_mut() {
                    session.set_position(position);
                    let current_time = session.position_seconds;
                    emit(&self.bus, PlayerEvent::TimeUpdate { current_time });
                }
            }
            Err(e) => debug!(error = %e, "position query failed"),
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    fn spawn_ticker(&mut self) {
        debug_assert!(self.ticker.is_none());
        self.ticker = Some(TimeTicker::spawn(
            self.config.time_update_interval,
            self.mailbox_tx.clone(),
            || EngineMsg::Tick,
        ));
    }

    /// Transition the live session to `Stopped` and release the backend.
    ///
    /// The ticker is cancelled and awaited before the stop event goes out,
    /// so once the caller's reply arrives no stale tick can surface.
    async fn stop_session(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.shutdown().await;
        }
        if let Err(e) = self.backend.stop().await {
            warn!(error = %e, "backend stop failed during teardown");
        }
        if let Some(session) = self.session.as_mut() {
            session.state = PlayerState::Stopped;
            session.is_buffering = false;
            session.paused_by_interruption = false;
        }
        info!("stream stopped");
        emit(&self.bus, PlayerEvent::Stop);
    }

    /// Transition the live session to `Failed` and release the backend.
    /// Exactly one error event per failure; no automatic retry.
    async fn fail_session(&mut self, message: String) {
        if let Some(ticker) = self.ticker.take() {
            ticker.shutdown().await;
        }
        if let Err(e) = self.backend.stop().await {
            warn!(error = %e, "backend stop failed after playback failure");
        }
        if let Some(session) = self.session.as_mut() {
            session.state = PlayerState::Failed;
            session.is_buffering = false;
            session.paused_by_interruption = false;
        }
        error!(%message, "playback failed");
        emit(&self.bus, PlayerEvent::Error { message });
    }

    /// Drop the session entirely (back to `Idle`), emitting a stop event for
    /// it if it was still live.
    async fn release_session(&mut self, emit_stop: bool) {
        if let Some(ticker) = self.ticker.take() {
            ticker.shutdown().await;
        }
        let Some(session) = self.session.take() else {
            return;
        };
        if session.state.is_active() {
            if let Err(e) = self.backend.stop().await {
                warn!(error = %e, "backend stop failed during teardown");
            }
            if emit_stop {
                emit(&self.bus, PlayerEvent::Stop);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;

    mockall::mock! {
        Backend {}

        #[async_trait::async_trait]
        impl MediaBackend for Backend {
            async fn load(&mut self, url: &Url) -> BridgeResult<()>;
            async fn play(&mut self) -> BridgeResult<()>;
            async fn pause(&mut self) -> BridgeResult<()>;
            async fn stop(&mut self) -> BridgeResult<()>;
            async fn seek(&mut self, position_seconds: f64) -> BridgeResult<()>;
            async fn set_rate(&mut self, rate: f64) -> BridgeResult<()>;
            async fn position(&mut self) -> BridgeResult<f64>;
        }
    }

    fn engine_with(backend: MockBackend) -> (PlayerEngine<MockBackend>, EventBus) {
        let bus = EventBus::new(16);
        let (tx, rx) = mpsc::channel(16);
        let engine = PlayerEngine::new(backend, PlayerConfig::default(), bus.clone(), rx, tx);
        (engine, bus)
    }

    fn url() -> Url {
        Url::parse("https://example.com/live/stream.m3u8").unwrap()
    }

    fn stop_msg() -> EngineMsg {
        let (reply, _rx) = oneshot::channel();
        EngineMsg::Command(Command::Stop { reply })
    }

    #[test]
    fn test_batch_stop_command_wins() {
        let mut batch = vec![
            EngineMsg::Backend(BackendSignal::ReadyToPlay),
            EngineMsg::Backend(BackendSignal::BufferingStarted),
            stop_msg(),
        ];
        reorder_batch(&mut batch);
        assert!(matches!(
            batch[0],
            EngineMsg::Command(Command::Stop { .. })
        ));
        // The rest keeps arrival order.
        assert!(matches!(
            batch[1],
            EngineMsg::Backend(BackendSignal::ReadyToPlay)
        ));
    }

    #[test]
    fn test_batch_failure_beats_status_signals() {
        let mut batch = vec![
            EngineMsg::Backend(BackendSignal::BufferingStarted),
            EngineMsg::Backend(BackendSignal::PlaybackFailed {
                message: "boom".into(),
            }),
        ];
        reorder_batch(&mut batch);
        assert!(matches!(
            batch[0],
            EngineMsg::Backend(BackendSignal::PlaybackFailed { .. })
        ));
    }

    #[test]
    fn test_batch_in_order_when_no_race() {
        let mut batch = vec![
            EngineMsg::Backend(BackendSignal::PlaybackFailed {
                message: "boom".into(),
            }),
            EngineMsg::Backend(BackendSignal::ReadyToPlay),
        ];
        reorder_batch(&mut batch);
        // Failure already precedes the status signal; nothing moves.
        assert!(matches!(
            batch[0],
            EngineMsg::Backend(BackendSignal::PlaybackFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_play_then_ready_emits_play() {
        let mut backend = MockBackend::new();
        backend.expect_load().times(1).returning(|_| Ok(()));
        backend.expect_play().times(1).returning(|| Ok(()));
        backend.expect_stop().returning(|| Ok(()));
        let (mut engine, bus) = engine_with(backend);
        let mut sub = bus.subscribe();

        engine.handle_play(url()).await.unwrap();
        assert_eq!(engine.current_state(), PlayerState::Loading);

        engine.handle_backend(BackendSignal::ReadyToPlay).await;
        assert_eq!(engine.current_state(), PlayerState::Playing);
        assert_eq!(sub.recv().await.unwrap(), PlayerEvent::Play);

        engine.release_session(false).await;
    }

    #[tokio::test]
    async fn test_invalid_rate_never_reaches_backend() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_| Ok(()));
        backend.expect_play().returning(|| Ok(()));
        backend.expect_set_rate().times(0);
        backend.expect_stop().returning(|| Ok(()));
        let (mut engine, _bus) = engine_with(backend);

        engine.handle_play(url()).await.unwrap();
        engine.handle_backend(BackendSignal::ReadyToPlay).await;

        let err = engine.handle_set_rate(0.0).await.unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));
        let err = engine.handle_set_rate(-1.0).await.unwrap_err();
        assert!(matches!(err, StreamError::InvalidArgument(_)));

        let rate = engine.session.as_ref().map(|s| s.rate);
        assert_eq!(rate, Some(1.0));

        engine.release_session(false).await;
    }

    #[tokio::test]
    async fn test_seek_clamps_negative_to_zero() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_| Ok(()));
        backend.expect_play().returning(|| Ok(()));
        backend
            .expect_seek()
            .withf(|pos| *pos == 0.0)
            .times(1)
            .returning(|_| Ok(()));
        backend.expect_stop().returning(|| Ok(()));
        let (mut engine, _bus) = engine_with(backend);

        engine.handle_play(url()).await.unwrap();
        engine.handle_backend(BackendSignal::ReadyToPlay).await;

        engine.handle_seek(-7.5).await.unwrap();
        let position = engine.session.as_ref().map(|s| s.position_seconds);
        assert_eq!(position, Some(0.0));

        engine.release_session(false).await;
    }

    #[tokio::test]
    async fn test_commands_rejected_in_terminal_state() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_| Ok(()));
        backend.expect_play().returning(|| Ok(()));
        backend.expect_stop().returning(|| Ok(()));
        let (mut engine, _bus) = engine_with(backend);

        engine.handle_play(url()).await.unwrap();
        engine.handle_backend(BackendSignal::ReadyToPlay).await;
        engine
            .handle_backend(BackendSignal::PlaybackFailed {
                message: "network down".into(),
            })
            .await;

        assert_eq!(engine.current_state(), PlayerState::Failed);
        assert!(matches!(
            engine.handle_pause().await,
            Err(StreamError::InvalidState {
                command: "pause",
                state: PlayerState::Failed,
            })
        ));
    }

    #[tokio::test]
    async fn test_signals_ignored_after_failure() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_| Ok(()));
        backend.expect_play().returning(|| Ok(()));
        backend.expect_stop().returning(|| Ok(()));
        let (mut engine, bus) = engine_with(backend);
        let mut sub = bus.subscribe();

        engine.handle_play(url()).await.unwrap();
        engine
            .handle_backend(BackendSignal::PlaybackFailed {
                message: "gone".into(),
            })
            .await;
        engine.handle_backend(BackendSignal::ReadyToPlay).await;

        assert_eq!(engine.current_state(), PlayerState::Failed);
        assert!(matches!(
            sub.recv().await.unwrap(),
            PlayerEvent::Error { .. }
        ));
        assert!(sub.try_recv().is_err());
    }
}
