//! # Core Runtime
//!
//! Runtime infrastructure shared by the playback crates:
//!
//! - **Logging**: `tracing` initialization with host sink forwarding
//!   ([`logging`])
//! - **Errors**: runtime-level error types ([`error`])
//!
//! This crate is intentionally small. It owns concerns that sit *around*
//! playback rather than inside it, so `core-playback` can stay focused on
//! state and events.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
