//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific glue. Each trait represents a capability the core
//! requires but that must be implemented differently per platform (desktop,
//! iOS, Android, web).
//!
//! ## Traits
//!
//! - [`MediaBackend`](media::MediaBackend) — imperative control over one
//!   native/browser playback primitive (load, play, pause, stop, seek, rate)
//! - [`LoggerSink`](logging::LoggerSink) — forward structured logs to host
//!   logging (OSLog/Logcat/console)
//!
//! Alongside the traits, this crate owns the *raw signal vocabulary*
//! ([`BackendSignal`](media::BackendSignal),
//! [`SessionSignal`](media::SessionSignal)) that platform glue pushes into
//! the core. Signals are typed messages, not broadcast notification names:
//! there is no string-matched, process-global observer registry anywhere in
//! this system.
//!
//! ## Error Handling
//!
//! Bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., HTTP status, native error codes)
//!
//! ## Thread Safety
//!
//! On native targets all bridge traits require `Send + Sync` so they can be
//! moved into the engine task. WASM builds relax those bounds through the
//! conditional markers in [`platform`].

pub mod error;
pub mod logging;
pub mod media;
pub mod platform;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{BackendSignal, MediaBackend, SessionSignal};
