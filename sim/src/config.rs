//! Simulations-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, sodass die Simulation ohne Konfigurationsdatei laeuft.

use std::collections::HashSet;

use anyhow::bail;
use backroom_client::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::logging::{log_format_gueltig, log_level_gueltig};

/// Vollstaendige Simulations-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wie lange auf ausstehende Zustellungen gewartet wird
    pub zustell_zeitlimit_ms: u64,
    /// Teilnehmer-Namen, in dieser Reihenfolge gestartet
    pub teilnehmer: Vec<String>,
    pub logging: LoggingEinstellungen,
    pub session: SessionConfig,
    /// Skript der zu sendenden Nachrichten
    pub nachrichten: Vec<SkriptNachricht>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            zustell_zeitlimit_ms: 2_000,
            teilnehmer: vec!["alice".into(), "bob".into()],
            logging: LoggingEinstellungen::default(),
            session: SessionConfig::default(),
            nachrichten: vec![
                SkriptNachricht::neu("alice", "bob", "hello"),
                SkriptNachricht::neu("bob", "alice", "hallo alice"),
                SkriptNachricht::neu("alice", "carol", "bist du da?"),
            ],
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Eine Nachricht im Simulations-Skript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkriptNachricht {
    pub von: String,
    pub an: String,
    pub text: String,
}

impl SkriptNachricht {
    pub fn neu(von: &str, an: &str, text: &str) -> Self {
        Self {
            von: von.into(),
            an: an.into(),
            text: text.into(),
        }
    }
}

impl SimConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei
    ///
    /// `None` wenn die Datei fehlt; der Aufrufer nimmt dann die
    /// Standardwerte und meldet das, sobald das Logging steht.
    pub fn laden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.pruefen()?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiges Log-Level: {:?}", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format: {:?}", self.logging.format);
        }

        let mut gesehen = HashSet::new();
        for name in &self.teilnehmer {
            if name.trim().is_empty() {
                bail!("Leerer Teilnehmer-Name");
            }
            if !gesehen.insert(name.trim()) {
                bail!("Teilnehmer doppelt: {name}");
            }
        }

        for nachricht in &self.nachrichten {
            if !gesehen.contains(nachricht.von.trim()) {
                bail!("Absender '{}' ist kein Teilnehmer", nachricht.von);
            }
        }
        Ok(())
    }
}
