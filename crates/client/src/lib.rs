//! backroom-client – Ende-zu-Ende verschluesselte Direktnachrichten
//!
//! Dieses Crate implementiert:
//! - PeerDirectory: Name -> Public Key, mit Cache und Single-Flight-Abfragen
//! - Session: Zustandsmaschine Unkeyed -> Keyed -> Joined -> Active,
//!   Senden und Empfangen verschluesselter DMs
//! - SessionConfig: Zeitlimits und Queue-Groessen
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use backroom_client::{Session, SessionConfig};
//! use backroom_core::PeerName;
//! use backroom_relay::Relay;
//!
//! #[tokio::main]
//! async fn main() {
//!     let relay = Relay::new();
//!     let (link, inbound) = relay.verbinden();
//!
//!     let (session, mut ui) = Session::neu(PeerName::from("alice"), Arc::new(link), SessionConfig::default());
//!     let session = Arc::new(session);
//!     session.starten().await.unwrap();
//!
//!     tokio::spawn({
//!         let session = Arc::clone(&session);
//!         async move { session.run(inbound).await }
//!     });
//!
//!     session.send(&PeerName::from("bob"), "hallo").await.unwrap();
//!     while let Some(event) = ui.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod session;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use config::SessionConfig;
pub use directory::PeerDirectory;
pub use error::{SessionError, SessionResult};
pub use session::{Session, SessionState};
