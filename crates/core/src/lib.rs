//! backroom-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen backroom-Crates gemeinsam genutzt werden: Teilnehmer-Namen,
//! die ausgehende Seite des Message-Bus und die Ereignisse fuer die UI.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{BackroomError, Result};
pub use event::{MessageBus, SessionEvent};
pub use types::{ConnectionId, PeerName};
