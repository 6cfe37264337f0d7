//! backroom-protocol – Nachrichten zwischen Client und Relay
//!
//! Dieses Crate definiert die Payloads aller Bus-Ereignisse. Envelopes
//! und Public Keys sind hier nur undurchsichtige Base64-Strings; das
//! Relay sieht niemals Klartext oder abgeleitete Schluessel.

pub mod control;

pub use control::{ClientRequest, ErrorCode, RelayResponse, ServerEvent};
