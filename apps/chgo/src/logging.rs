//! Log output setup.
//!
//! Logs go to stderr so that listings on stdout stay machine readable. The
//! filter comes from `RUST_LOG` when set, otherwise from the verbose flag.
//! Setting `CHGO_LOG_JSON` switches to one JSON object per line.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

const LOG_JSON_ENV: &str = "CHGO_LOG_JSON";

/// Installs the global tracing subscriber.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let subscriber = tracing_subscriber::registry().with(filter);

    if std::env::var_os(LOG_JSON_ENV).is_some() {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .without_time();

        subscriber.with(fmt_layer).init();
    }
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "chgo=debug" } else { "chgo=info" }
}
