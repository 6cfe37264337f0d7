//! Backroom Simulation – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und spielt das
//! Nachrichten-Skript ueber das In-Process-Relay ab.

use anyhow::Result;
use backroom_sim::{config::SimConfig, logging::logging_initialisieren, Simulation};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("BACKROOM_CONFIG").unwrap_or_else(|_| "backroom.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let geladen = SimConfig::laden(&config_pfad)?;
    let datei_fehlt = geladen.is_none();
    let config = geladen.unwrap_or_default();

    logging_initialisieren(&config.logging.level, &config.logging.format);

    if datei_fehlt {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Backroom Simulation wird gestartet"
    );

    let bericht = Simulation::neu(config).ausfuehren().await?;
    tracing::info!(bericht = %serde_json::to_string(&bericht)?, "Bericht");

    Ok(())
}
