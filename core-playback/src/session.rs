//! # Playback Session Model
//!
//! The canonical player state enum and the per-stream session record the
//! engine mutates.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical playback state.
///
/// Every native player vocabulary (AVPlayer time-control states, ExoPlayer
/// `STATE_*` constants, media-element readyState) is normalized into this
/// one machine. The engine is the sole mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    /// No session exists.
    Idle,
    /// `play(url)` accepted; waiting for the backend to report readiness.
    Loading,
    /// Progressing at the requested rate.
    Playing,
    /// Paused by the host or by a session condition (interruption, route
    /// loss).
    Paused,
    /// Stalled waiting for data; playback resumes automatically when the
    /// backend reports readiness again.
    Buffering,
    /// Terminal: stopped by the host or end of media. Only `play(url)`
    /// re-enters the machine.
    Stopped,
    /// Terminal: fatal backend failure. Only `play(url)` re-enters the
    /// machine.
    Failed,
}

impl PlayerState {
    /// Returns `true` for states no signal or transport command can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Returns `true` while a session is live (a backend is loaded).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Loading | Self::Playing | Self::Paused | Self::Buffering
        )
    }

    /// Returns `true` in states that accept `seek_to` and
    /// `set_playback_rate`.
    pub fn accepts_transport(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused | Self::Buffering)
    }

    /// Returns `true` in states where the time-update ticker emits.
    pub fn emits_time_updates(&self) -> bool {
        matches!(self, Self::Playing | Self::Buffering)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One active remote stream.
///
/// At most one session exists at a time; `play(url)` while a session is live
/// stops and replaces it. Destroyed (backend unloaded, ticker cancelled) on
/// stop or fatal failure.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Stream source. Validated only as "parses as a URI" — progressive vs
    /// HLS is the backend's concern.
    pub source_url: Url,
    /// Current canonical state.
    pub state: PlayerState,
    /// Last known position in seconds. Updated optimistically on seek and
    /// reconciled against the backend on every time update.
    pub position_seconds: f64,
    /// Playback rate. 1.0 unless changed by the host.
    pub rate: f64,
    /// Whether the backend is currently stalled for data.
    pub is_buffering: bool,
    /// Set when an interruption (not the host) paused this session, so that
    /// `InterruptionEnded { should_resume: true }` only resumes what the
    /// interruption paused.
    pub(crate) paused_by_interruption: bool,
}

impl PlaybackSession {
    /// Create a fresh session in `Loading` for the given source.
    pub fn new(source_url: Url) -> Self {
        Self {
            source_url,
            state: PlayerState::Loading,
            position_seconds: 0.0,
            rate: 1.0,
            is_buffering: false,
            paused_by_interruption: false,
        }
    }

    /// Record a new position, keeping it non-negative.
    pub fn set_position(&mut self, position_seconds: f64) {
        self.position_seconds = position_seconds.max(0.0);
    }
}
