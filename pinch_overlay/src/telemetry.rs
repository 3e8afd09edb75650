//! Tracing subscriber setup shared by both binaries.

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Install a global fmt subscriber.  `RUST_LOG` wins over `default_directive`.
/// Calling twice is harmless; the second call is ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_filter(filter),
        )
        .try_init();
}
