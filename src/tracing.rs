//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing. Safe to call multiple times.
///
/// `RUST_LOG` overrides the configured level. Output goes to stderr so
/// search results on stdout stay pipeable; `json` switches the format for
/// log collectors.
pub fn init(level: &str, json: bool) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let directive = if is_test { "debug" } else { level };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("mneme={directive},warn")));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(std::io::stderr);

        let result = if is_test {
            builder.with_test_writer().finish().try_init()
        } else if json {
            builder.json().finish().try_init()
        } else {
            builder.compact().finish().try_init()
        };
        if let Err(e) = result {
            eprintln!("Failed to initialize tracing: {e}");
        }
    });
}
