//! # Remote Streamer Facade
//!
//! The host-facing handle over the engine actor. Thin by design: every
//! method sends one command through the mailbox and awaits the engine's
//! reply, so a call returns only after the engine has applied (or rejected)
//! it. That makes [`stop`](RemoteStreamer::stop) synchronous from the
//! caller's point of view — once it returns, the ticker is gone and no
//! further events for that session are delivered.
//!
//! ## Usage
//!
//! ```no_run
//! use core_playback::RemoteStreamer;
//! # use bridge_traits::{MediaBackend, BackendSignal};
//! # async fn example(backend: impl MediaBackend + 'static) -> Result<(), Box<dyn std::error::Error>> {
//! let streamer = RemoteStreamer::new(backend)?;
//! let mut events = streamer.events();
//!
//! streamer.play("https://radio.example.com/live.m3u8").await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

use bridge_traits::{BackendSignal, MediaBackend, SessionSignal};

use crate::config::PlayerConfig;
use crate::engine::{Command, EngineMsg, PlayerEngine};
use crate::error::{Result, StreamError};
use crate::events::{EventBus, EventSubscription};
use crate::session::PlayerState;

/// Cloneable signal intake for platform glue.
///
/// Backend and session conditions (readiness, stalls, failures,
/// interruptions, route changes) are marshaled onto the engine mailbox
/// through this handle instead of mutating state from callback contexts.
#[derive(Clone)]
pub struct SignalHandle {
    tx: mpsc::Sender<EngineMsg>,
}

impl SignalHandle {
    /// Report a raw player signal.
    pub async fn backend(&self, signal: BackendSignal) -> Result<()> {
        self.tx
            .send(EngineMsg::Backend(signal))
            .await
            .map_err(|_| StreamError::Terminated)
    }

    /// Report an audio-session condition.
    pub async fn session(&self, signal: SessionSignal) -> Result<()> {
        self.tx
            .send(EngineMsg::Session(signal))
            .await
            .map_err(|_| StreamError::Terminated)
    }
}

/// Control surface for one remote audio stream.
///
/// Owns the engine task for its lifetime. Dropping the streamer (and every
/// [`SignalHandle`]) closes the mailbox and the engine tears the session
/// down quietly; call [`shutdown`](Self::shutdown) for a deterministic stop.
pub struct RemoteStreamer {
    tx: mpsc::Sender<EngineMsg>,
    bus: EventBus,
    engine: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteStreamer {
    /// Create a streamer over the given backend with default configuration.
    pub fn new<B: MediaBackend + 'static>(backend: B) -> Result<Self> {
        Self::with_config(backend, PlayerConfig::default())
    }

    /// Create a streamer with explicit configuration.
    ///
    /// Spawns the engine actor on the current tokio runtime.
    pub fn with_config<B: MediaBackend + 'static>(
        backend: B,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate().map_err(StreamError::InvalidArgument)?;

        let bus = EventBus::new(config.event_buffer_size);
        let (tx, rx) = mpsc::channel(config.mailbox_depth);
        let engine = PlayerEngine::new(backend, config, bus.clone(), rx, tx.clone());
        let handle = tokio::spawn(engine.run());

        Ok(Self {
            tx,
            bus,
            engine: Mutex::new(Some(handle)),
        })
    }

    /// Start streaming the given URL.
    ///
    /// Accepts progressive and HLS URLs alike; the URL is only validated to
    /// parse. A live session is stopped and replaced (its `stop` event is
    /// emitted first). Playback begins at rate 1.0 once the backend reports
    /// readiness.
    pub async fn play(&self, url: &str) -> Result<()> {
        let url = Url::parse(url)
            .map_err(|e| StreamError::InvalidArgument(format!("invalid stream URL: {}", e)))?;
        self.command(|reply| Command::Play { url, reply }).await
    }

    /// Pause the current stream, keeping it loaded.
    pub async fn pause(&self) -> Result<()> {
        self.command(|reply| Command::Pause { reply }).await
    }

    /// Resume a paused stream.
    pub async fn resume(&self) -> Result<()> {
        self.command(|reply| Command::Resume { reply }).await
    }

    /// Stop the current stream and release the backend player.
    ///
    /// When this returns, no further events for the session are delivered,
    /// even for late-arriving backend signals.
    pub async fn stop(&self) -> Result<()> {
        self.command(|reply| Command::Stop { reply }).await
    }

    /// Seek to an absolute position in seconds.
    ///
    /// Negative positions clamp to the start. Does not change state.
    pub async fn seek_to(&self, position_seconds: f64) -> Result<()> {
        self.command(|reply| Command::Seek {
            position_seconds,
            reply,
        })
        .await
    }

    /// Change the playback rate. The rate must be finite and positive.
    pub async fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.command(|reply| Command::SetRate { rate, reply }).await
    }

    /// Query the canonical player state.
    pub async fn current_state(&self) -> Result<PlayerState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineMsg::Command(Command::CurrentState { reply }))
            .await
            .map_err(|_| StreamError::Terminated)?;
        rx.await.map_err(|_| StreamError::Terminated)
    }

    /// Attach a new event subscriber.
    pub fn events(&self) -> EventSubscription {
        self.bus.subscribe()
    }

    /// Access the underlying event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Detach every live event subscription. Idempotent.
    pub fn remove_all_listeners(&self) {
        self.bus.remove_all_listeners();
    }

    /// A cloneable signal intake for platform glue.
    pub fn signal_handle(&self) -> SignalHandle {
        SignalHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stop any live session and terminate the engine task. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(EngineMsg::Command(Command::Shutdown { reply }))
            .await
            .is_err()
        {
            // Engine already gone.
            return Ok(());
        }
        rx.await.map_err(|_| StreamError::Terminated)?;

        let handle = self.engine.lock().take();
        if let Some(handle) = handle {
            handle.await.ok();
        }
        Ok(())
    }

    async fn command(&self, build: impl FnOnce(oneshot::Sender<Result<()>>) -> Command) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineMsg::Command(build(reply)))
            .await
            .map_err(|_| StreamError::Terminated)?;
        rx.await.map_err(|_| StreamError::Terminated)?
    }
}
