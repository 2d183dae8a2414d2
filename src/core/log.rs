//! Logging setup for the CLI
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Maps the number of `-v` flags to a level for this crate.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Logs go to stderr so quote tables on stdout stay pipeable. `RUST_LOG`
/// overrides the level for other crates.
pub fn init_logging(verbosity: u8) {
    let level_filter = level_for(verbosity);
    let app_filter = Targets::new().with_target("markup", level_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string()));

    let layer = fmt::layer().with_writer(std::io::stderr).without_time();
    let registry = tracing_subscriber::registry()
        .with(app_filter)
        .with(env_filter);
    if verbosity > 0 {
        registry.with(layer.pretty()).init();
    } else {
        registry.with(layer.compact().with_target(false)).init();
    }
}
