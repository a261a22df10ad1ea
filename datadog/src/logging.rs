//! Log output for the provider process

use tracing::Level;

/// Environment variable Terraform uses to request a log level
pub const LOG_LEVEL_ENV: &str = "TF_LOG";

fn level_from(value: Option<&str>) -> Level {
    match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => Level::TRACE,
        Some("DEBUG") => Level::DEBUG,
        Some("WARN") => Level::WARN,
        Some("ERROR") => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs a stderr fmt subscriber at the `TF_LOG` level.
///
/// Called from [`crate::DatadogProvider::new`]. Stdout belongs to the plugin
/// handshake, so nothing is logged there. Later calls are no-ops.
pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
