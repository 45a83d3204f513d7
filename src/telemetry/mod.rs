//! Log output setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "info,catch_roulette=debug,tower_http=info,axum=info";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default directives, e.g.
/// `RUST_LOG=debug,tower_http=warn`. `LOG_FORMAT=compact` switches to
/// single-line output without targets.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let compact = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("compact"));

    let registry = tracing_subscriber::registry().with(filter);
    if compact {
        registry.with(fmt::layer().compact().with_target(false)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
