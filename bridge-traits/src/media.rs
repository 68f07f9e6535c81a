//! Media backend bridge trait and the raw signal vocabulary.
//!
//! A [`MediaBackend`] wraps exactly one native or browser playback primitive
//! (AVPlayer, ExoPlayer, `HTMLAudioElement`, ...) and exposes the imperative
//! command surface the playback core drives. Host platforms provide concrete
//! implementations that satisfy their platform constraints (desktop, mobile,
//! web).
//!
//! Commands flow one way (core → backend); status flows back as *raw
//! signals*. Implementations never mutate core state directly — they push
//! [`BackendSignal`]s through the signal handle the core hands them, and the
//! core's state machine decides what each signal means in context. Session
//! level conditions (interruptions, route changes) arrive the same way as
//! [`SessionSignal`]s, typically produced by the platform's audio-session
//! glue rather than the player itself.

use crate::{error::Result, platform::PlatformSendSync};
use url::Url;

/// Raw status signal reported by a [`MediaBackend`].
///
/// These mirror the native player's own vocabulary as closely as possible;
/// normalization into a consistent state machine happens in the core, not in
/// the backend. A backend should forward what its player reports and nothing
/// more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSignal {
    /// The stream is ready and the player is progressing (or able to
    /// progress) at the requested rate.
    ReadyToPlay,
    /// The player has stalled waiting for data (not likely to keep up /
    /// waiting to play at the specified rate).
    BufferingStarted,
    /// The player has buffered enough to resume progressing.
    BufferingEnded,
    /// Fatal playback failure. The message carries native error detail
    /// (network failure, resource not found, codec error).
    PlaybackFailed { message: String },
    /// The stream played to its end.
    EndOfMedia,
}

/// Audio-session level signal, produced by platform glue rather than the
/// player primitive itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The session was interrupted (incoming call, another app took the
    /// output).
    InterruptionBegan,
    /// The interruption ended. `should_resume` carries the platform's hint
    /// that playback may continue where it left off.
    InterruptionEnded { should_resume: bool },
    /// The audio route changed. `device_lost` is true when the previous
    /// output device disappeared (headphones unplugged, bluetooth dropped).
    RouteChanged { device_lost: bool },
}

/// Trait for platform-specific playback backends.
///
/// The core owns the backend exclusively for the lifetime of one playback
/// session and releases it on teardown; all methods take `&mut self`.
/// Commands should be fast and non-blocking — a backend that needs real work
/// (network, decoder spin-up) performs it asynchronously and reports the
/// outcome through its signal stream.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait MediaBackend: PlatformSendSync {
    /// Prepare the given stream URL for playback. Implementations allocate
    /// the native player item here and begin loading; readiness is reported
    /// via [`BackendSignal::ReadyToPlay`].
    async fn load(&mut self, url: &Url) -> Result<()>;

    /// Begin or resume playback of the loaded stream.
    async fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the stream loaded.
    async fn pause(&mut self) -> Result<()>;

    /// Stop playback and release the native player item.
    async fn stop(&mut self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    async fn seek(&mut self, position_seconds: f64) -> Result<()>;

    /// Adjust the playback rate. The core validates the rate before calling;
    /// implementations only receive finite, positive values.
    async fn set_rate(&mut self, rate: f64) -> Result<()>;

    /// Query the current playback position in seconds.
    async fn position(&mut self) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_signal_equality() {
        assert_eq!(BackendSignal::ReadyToPlay, BackendSignal::ReadyToPlay);
        assert_ne!(
            BackendSignal::BufferingStarted,
            BackendSignal::BufferingEnded
        );
        assert_eq!(
            BackendSignal::PlaybackFailed {
                message: "404".into()
            },
            BackendSignal::PlaybackFailed {
                message: "404".into()
            }
        );
    }

    #[test]
    fn session_signal_carries_resume_hint() {
        let ended = SessionSignal::InterruptionEnded {
            should_resume: true,
        };
        match ended {
            SessionSignal::InterruptionEnded { should_resume } => assert!(should_resume),
            _ => panic!("wrong variant"),
        }
    }
}
