//! Logging system demonstration
//!
//! Shows the logging infrastructure in its different output modes, including
//! forwarding to a host [`LoggerSink`].
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use bridge_traits::logging::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{debug, error, info, span, trace, warn, Level};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let filter = args.get(2).cloned();

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true)
        .with_logger_sink(Arc::new(ConsoleLogger {
            min_level: LogLevel::Warn,
        }));

    if let Some(f) = filter {
        config = config.with_filter(f);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging Demo ===");
    info!(format = ?format, "Logging initialized");

    demo_log_levels();
    demo_structured_logging();
    demo_spans().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log (also mirrored to the host sink)");
    error!("This is an ERROR level log (also mirrored to the host sink)");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        url = "https://radio.example.com/live.m3u8",
        state = "playing",
        rate = 1.0,
        "Stream started"
    );

    info!(
        position_seconds = 42.5,
        is_buffering = false,
        "Playback progressing"
    );
}

async fn demo_spans() {
    let span = span!(Level::INFO, "playback_session", url = "https://radio.example.com/live.m3u8");
    let _enter = span.enter();

    info!("Session starting");

    {
        let inner = span!(Level::DEBUG, "loading");
        let _inner = inner.enter();
        debug!("Waiting for backend readiness");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    {
        let inner = span!(Level::DEBUG, "buffering");
        let _inner = inner.enter();
        debug!(is_buffering = true, "Stream stalled");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        debug!(is_buffering = false, "Stream recovered");
    }

    info!("Session stopped");
}
