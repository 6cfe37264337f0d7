//! backroom-relay – Honest-but-curious Relay im Prozess
//!
//! Das Relay kennt Namen, oeffentliche Schluessel (Base64) und leitet
//! undurchsichtige Envelopes weiter. Private Schluessel und abgeleitete
//! Secrets sieht es nie.
//!
//! ## Architektur
//!
//! ```text
//! RelayLink (pro Teilnehmer, implementiert MessageBus)
//!     |
//!     v
//! Relay::dispatch
//!     |
//!     +-- join        -> Namensregister + Roster an alle
//!     +-- resolvePeer -> Public Key oder null
//!     +-- dm          -> dm {from, envelope} an den Empfaenger
//!
//! EventBroadcaster – Ereignis-Queues aller Verbindungen
//! ```

pub mod broadcast;
pub mod link;
pub mod relay;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use link::RelayLink;
pub use relay::Relay;
