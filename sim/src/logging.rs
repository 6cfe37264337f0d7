//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `BACKROOM_LOG`: Filter-Direktiven (z.B. `debug` oder `backroom_client=trace`)
//! - `BACKROOM_LOG_FORMAT`: Format (text/json)
//!
//! Ohne Umgebungsvariablen gelten die Werte aus `[logging]`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("BACKROOM_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var("BACKROOM_LOG_FORMAT").unwrap_or_else(|_| format.to_string());

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}
