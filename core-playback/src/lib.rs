//! # Core Playback
//!
//! The playback core of the remote streamer: a canonical state machine and
//! event-normalization layer over heterogeneous native players.
//!
//! ## Architecture
//!
//! ```text
//! host commands          platform glue
//!      │                      │ raw signals
//!      ▼                      ▼
//! ┌──────────────┐   ┌──────────────┐
//! │RemoteStreamer│──▶│   mailbox    │◀── ticker ticks
//! └──────────────┘   └──────┬───────┘
//!                           ▼
//!                    ┌──────────────┐  commands   ┌──────────────┐
//!                    │ PlayerEngine │────────────▶│ MediaBackend │
//!                    └──────┬───────┘             └──────────────┘
//!                           │ PlayerEvent
//!                           ▼
//!                    ┌──────────────┐  subscribe  ┌──────────────┐
//!                    │   EventBus   │────────────▶│ host app(s)  │
//!                    └──────────────┘             └──────────────┘
//! ```
//!
//! The engine actor is the sole mutator of playback state. Raw backend
//! vocabulary (stalls, readiness, interruptions, route changes, failures)
//! is normalized into one state machine and a stable event vocabulary
//! (`play`, `pause`, `stop`, `timeUpdate`, `buffering`, `error`) that hosts
//! consume identically on every platform.
//!
//! ## Modules
//!
//! - [`controller`] — the `RemoteStreamer` facade and `SignalHandle`
//! - [`events`] — `PlayerEvent` vocabulary and the broadcast `EventBus`
//! - [`session`] — `PlayerState` and the per-stream session record
//! - [`config`] — engine configuration
//! - [`error`] — `StreamError`

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod session;

mod engine;
mod ticker;

pub use config::PlayerConfig;
pub use controller::{RemoteStreamer, SignalHandle};
pub use error::{Result, StreamError};
pub use events::{EventBus, EventSubscription, PlayerEvent};
pub use session::{PlaybackSession, PlayerState};
