//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_directive` (for example
/// `"lullaby_core=info"`). Returns false when a subscriber was already
/// installed, which makes repeated calls from tests harmless.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_directive.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
