use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

const SERVICE_NAME: &str = "chring";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a subscriber that emits bunyan formatted json lines to stdout.
/// The level defaults to INFO and can be overridden via `RUST_LOG`
pub fn initialize_json_subscriber() {
    let formatting_layer = BunyanFormattingLayer::new(SERVICE_NAME.to_string(), std::io::stdout);

    Registry::default()
        .with(env_filter())
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .init();
}

/// Installs a human readable subscriber. The level defaults to INFO and can be overridden via `RUST_LOG`
pub fn initialize_fmt_subscriber() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}
