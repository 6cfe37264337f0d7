//! Unit-Tests fuer die Session (Zustandsmaschine, Senden, Empfangen)

use std::sync::Arc;
use std::time::Duration;

use backroom_core::{PeerName, SessionEvent};
use backroom_crypto::{derive_shared_key, e2e, Identity};
use backroom_protocol::ServerEvent;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::sync::mpsc;

use super::mock_bus::{MockBus, ResolveVerhalten};
use crate::{Session, SessionConfig, SessionError, SessionState};

fn session(name: &str, bus: &Arc<MockBus>) -> (Session<MockBus>, mpsc::Receiver<SessionEvent>) {
    Session::neu(PeerName::from(name), Arc::clone(bus), SessionConfig::default())
}

/// Aktive Alice-Session plus Bobs Identitaet, die Alice ueber den Bus findet
async fn alice_und_bob() -> (
    Arc<MockBus>,
    Session<MockBus>,
    mpsc::Receiver<SessionEvent>,
    Identity,
) {
    let bus = Arc::new(MockBus::neu());
    let bob = Identity::generate().expect("Identitaet fuer Bob");
    bus.key_setzen("bob", bob.public_key_base64());

    let (alice, ui) = session("alice", &bus);
    alice.starten().await.expect("Alice startet");
    (bus, alice, ui, bob)
}

fn alice_public_key(alice: &Session<MockBus>) -> Vec<u8> {
    let base64 = alice.public_key_base64().expect("Alice hat eine Identitaet");
    STANDARD.decode(base64).expect("gueltiges Base64")
}

/// Envelope von `absender` an Alice, im Transport-Format
fn envelope_an_alice(absender: &Identity, alice: &Session<MockBus>, text: &[u8]) -> String {
    let key = derive_shared_key(absender, &alice_public_key(alice)).unwrap();
    e2e::serialize(&e2e::encrypt(&key, text).unwrap())
}

// ---------------------------------------------------------------------------
// Zustandsmaschine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_zustaende_bis_active() {
    let bus = Arc::new(MockBus::neu());
    let (alice, _ui) = session("alice", &bus);
    assert_eq!(alice.state(), SessionState::Unkeyed);
    assert!(alice.public_key_base64().is_none());

    alice.generate_identity().unwrap();
    assert_eq!(alice.state(), SessionState::Keyed);

    alice.join().await.unwrap();
    assert_eq!(alice.state(), SessionState::Active);

    let joins = bus.joins();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].0, PeerName::from("alice"));
    assert_eq!(Some(joins[0].1.clone()), alice.public_key_base64());
    assert_eq!(alice_public_key(&alice).len(), 32);
}

#[tokio::test]
async fn test_identitaet_nur_einmal() {
    let bus = Arc::new(MockBus::neu());
    let (alice, _ui) = session("alice", &bus);
    alice.generate_identity().unwrap();
    let key = alice.public_key_base64();

    assert!(matches!(
        alice.generate_identity(),
        Err(SessionError::InvalidState {
            erwartet: SessionState::Unkeyed,
            aktuell: SessionState::Keyed
        })
    ));
    assert_eq!(alice.public_key_base64(), key);
}

#[tokio::test]
async fn test_join_ohne_identitaet_ist_ungueltig() {
    let bus = Arc::new(MockBus::neu());
    let (alice, _ui) = session("alice", &bus);
    assert!(matches!(
        alice.join().await,
        Err(SessionError::InvalidState { .. })
    ));
    assert!(bus.joins().is_empty());
}

#[tokio::test]
async fn test_fehlgeschlagener_join_faellt_auf_keyed_zurueck() {
    let bus = Arc::new(MockBus::neu());
    bus.join_fehler_setzen(true);
    let (alice, _ui) = session("alice", &bus);
    alice.generate_identity().unwrap();

    assert!(matches!(alice.join().await, Err(SessionError::Bus(_))));
    assert_eq!(alice.state(), SessionState::Keyed);

    bus.join_fehler_setzen(false);
    alice.join().await.unwrap();
    assert_eq!(alice.state(), SessionState::Active);
}

#[tokio::test]
async fn test_senden_vor_active_ist_ungueltig() {
    let bus = Arc::new(MockBus::neu());
    bus.key_setzen("bob", STANDARD.encode([9u8; 32]));
    let (alice, _ui) = session("alice", &bus);
    alice.generate_identity().unwrap();

    let result = alice.send(&PeerName::from("bob"), "zu frueh").await;
    assert!(matches!(
        result,
        Err(SessionError::InvalidState {
            erwartet: SessionState::Active,
            aktuell: SessionState::Keyed
        })
    ));
    assert_eq!(bus.resolve_aufrufe(), 0);
    assert!(bus.gesendet().is_empty());
}

#[tokio::test]
async fn test_verlassen_schliesst_die_session() {
    let (bus, alice, _ui, _bob) = alice_und_bob().await;

    alice.verlassen().await.unwrap();
    assert_eq!(alice.state(), SessionState::Closed);
    assert_eq!(bus.leaves(), 1);

    assert!(matches!(
        alice.send(&PeerName::from("bob"), "zu spaet").await,
        Err(SessionError::InvalidState { .. })
    ));
    assert!(matches!(
        alice.verlassen().await,
        Err(SessionError::InvalidState { .. })
    ));
    assert_eq!(bus.leaves(), 1);
}

// ---------------------------------------------------------------------------
// Senden
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_senden_erzeugt_ein_entschluesselbares_envelope() {
    let (bus, alice, _ui, bob) = alice_und_bob().await;

    alice.send(&PeerName::from("bob"), "hello").await.unwrap();

    let gesendet = bus.gesendet();
    assert_eq!(gesendet.len(), 1);
    assert_eq!(gesendet[0].0, PeerName::from("bob"));

    let key = derive_shared_key(&bob, &alice_public_key(&alice)).unwrap();
    let envelope = e2e::deserialize(&gesendet[0].1).unwrap();
    assert_eq!(e2e::decrypt(&key, &envelope).unwrap(), b"hello");
}

#[tokio::test]
async fn test_unbekannter_empfaenger_sendet_nichts() {
    let (bus, alice, _ui, _bob) = alice_und_bob().await;

    let result = alice.send(&PeerName::from("carol"), "hallo?").await;
    match result {
        Err(SessionError::UnknownRecipient(name)) => assert_eq!(name, PeerName::from("carol")),
        andere => panic!("Erwartet UnknownRecipient, bekommen {andere:?}"),
    }
    assert!(bus.gesendet().is_empty());
    assert_eq!(alice.state(), SessionState::Active);
}

#[tokio::test]
async fn test_ungueltiger_peer_key_sendet_nichts() {
    let bus = Arc::new(MockBus::neu());
    bus.key_setzen("kurz", STANDARD.encode([1u8; 31]));
    let (alice, _ui) = session("alice", &bus);
    alice.starten().await.unwrap();

    let kurz = PeerName::from("kurz");
    assert!(matches!(
        alice.send(&kurz, "x").await,
        Err(SessionError::UnknownRecipient(_))
    ));
    assert!(bus.gesendet().is_empty());
    assert!(!alice.directory().is_cached(&kurz));

    // Peer joint neu mit gueltigem Key: der naechste Versuch klappt
    let neu = Identity::generate().unwrap();
    bus.key_setzen("kurz", neu.public_key_base64());
    alice.send(&kurz, "x").await.unwrap();
    assert_eq!(bus.gesendet().len(), 1);
    assert_eq!(bus.resolve_aufrufe(), 2);
}

#[tokio::test]
async fn test_punkt_kleiner_ordnung_ist_ungueltiger_key() {
    let bus = Arc::new(MockBus::neu());
    bus.key_setzen("null", STANDARD.encode([0u8; 32]));
    let (alice, _ui) = session("alice", &bus);
    alice.starten().await.unwrap();

    assert!(matches!(
        alice.send(&PeerName::from("null"), "x").await,
        Err(SessionError::InvalidKey(_))
    ));
    assert!(bus.gesendet().is_empty());
}

#[tokio::test]
async fn test_wiederholtes_senden_nutzt_den_cache() {
    let (bus, alice, _ui, _bob) = alice_und_bob().await;
    let bob = PeerName::from("bob");

    alice.send(&bob, "eins").await.unwrap();
    alice.send(&bob, "zwei").await.unwrap();

    assert_eq!(bus.resolve_aufrufe(), 1);
    let gesendet = bus.gesendet();
    assert_eq!(gesendet.len(), 2);
    // Frische Nonce: gleiche Laenge, aber verschiedene Envelopes
    assert_ne!(gesendet[0].1, gesendet[1].1);
}

// ---------------------------------------------------------------------------
// Empfangen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empfangen_entschluesselt() {
    let (_bus, alice, _ui, bob) = alice_und_bob().await;
    let envelope = envelope_an_alice(&bob, &alice, "hello".as_bytes());

    let text = alice.receive(&PeerName::from("bob"), &envelope).await.unwrap();
    assert_eq!(text, "hello");
}

#[tokio::test]
async fn test_abgeschnittenes_envelope_ist_malformed() {
    let (bus, alice, _ui, _bob) = alice_und_bob().await;
    let kurz = STANDARD.encode([0u8; 20]);

    assert!(matches!(
        alice.receive(&PeerName::from("bob"), &kurz).await,
        Err(SessionError::MalformedEnvelope(_))
    ));
    // Kein Verzeichnis-Lookup fuer unlesbare Envelopes
    assert_eq!(bus.resolve_aufrufe(), 0);
}

#[tokio::test]
async fn test_unbekannter_absender() {
    let (_bus, alice, _ui, _bob) = alice_und_bob().await;
    let dave = Identity::generate().unwrap();
    let envelope = envelope_an_alice(&dave, &alice, b"wer bin ich");

    assert!(matches!(
        alice.receive(&PeerName::from("dave"), &envelope).await,
        Err(SessionError::UnknownSender(_))
    ));
}

#[tokio::test]
async fn test_falscher_absender_schlaegt_authentifizierung_fehl() {
    let (_bus, alice, _ui, _bob) = alice_und_bob().await;
    // Mallory verschluesselt, das Relay behauptet "bob"
    let mallory = Identity::generate().unwrap();
    let envelope = envelope_an_alice(&mallory, &alice, b"ich bin bob");

    assert!(matches!(
        alice.receive(&PeerName::from("bob"), &envelope).await,
        Err(SessionError::Authentication)
    ));
}

#[tokio::test]
async fn test_kein_utf8_ist_invalid_plaintext() {
    let (_bus, alice, _ui, bob) = alice_und_bob().await;
    let envelope = envelope_an_alice(&bob, &alice, &[0xff, 0xfe, 0x00]);

    assert!(matches!(
        alice.receive(&PeerName::from("bob"), &envelope).await,
        Err(SessionError::InvalidPlaintext(_))
    ));
}

// ---------------------------------------------------------------------------
// Eingehende Ereignisse
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_eingehende_dm_landet_in_der_ui() {
    let (_bus, alice, mut ui, bob) = alice_und_bob().await;
    let envelope = envelope_an_alice(&bob, &alice, b"hallo Alice");

    alice
        .handle_inbound(ServerEvent::Dm {
            from: PeerName::from("bob"),
            envelope,
        })
        .await;

    assert_eq!(
        ui.try_recv().unwrap(),
        SessionEvent::Nachricht {
            von: PeerName::from("bob"),
            text: "hallo Alice".into()
        }
    );
}

#[tokio::test]
async fn test_manipulierte_dm_wird_als_warnung_gemeldet() {
    let (_bus, alice, mut ui, bob) = alice_und_bob().await;
    let envelope = envelope_an_alice(&bob, &alice, b"original");
    let mut bytes = STANDARD.decode(&envelope).unwrap();
    let letztes = bytes.len() - 1;
    bytes[letztes] ^= 0x01;

    alice
        .handle_inbound(ServerEvent::Dm {
            from: PeerName::from("bob"),
            envelope: STANDARD.encode(&bytes),
        })
        .await;

    match ui.try_recv().unwrap() {
        SessionEvent::Warnung { von, .. } => assert_eq!(von, PeerName::from("bob")),
        andere => panic!("Erwartet Warnung, bekommen {andere:?}"),
    }
    assert_eq!(alice.state(), SessionState::Active);
}

#[tokio::test]
async fn test_malformed_dm_erzeugt_kein_ui_ereignis() {
    let (_bus, alice, mut ui, _bob) = alice_und_bob().await;

    alice
        .handle_inbound(ServerEvent::Dm {
            from: PeerName::from("bob"),
            envelope: "kein envelope".into(),
        })
        .await;

    assert!(ui.try_recv().is_err());
}

#[tokio::test]
async fn test_roster_wird_unveraendert_weitergereicht() {
    let (_bus, alice, mut ui, _bob) = alice_und_bob().await;
    let namen = vec![PeerName::from("alice"), PeerName::from("bob")];

    alice
        .handle_inbound(ServerEvent::Roster {
            names: namen.clone(),
        })
        .await;

    assert_eq!(ui.try_recv().unwrap(), SessionEvent::Roster { namen });
}

#[tokio::test]
async fn test_run_ueberlebt_fehlerhafte_nachrichten() {
    let (_bus, alice, mut ui, bob) = alice_und_bob().await;
    let alice = Arc::new(alice);
    let (tx, rx) = mpsc::channel(8);

    let gut = envelope_an_alice(&bob, &alice, b"nach dem Muell");
    let schleife = tokio::spawn({
        let alice = Arc::clone(&alice);
        async move { alice.run(rx).await }
    });

    tx.send(ServerEvent::Dm {
        from: PeerName::from("bob"),
        envelope: "AAAA".into(),
    })
    .await
    .unwrap();
    tx.send(ServerEvent::Dm {
        from: PeerName::from("niemand"),
        envelope: gut.clone(),
    })
    .await
    .unwrap();
    tx.send(ServerEvent::Dm {
        from: PeerName::from("bob"),
        envelope: gut,
    })
    .await
    .unwrap();
    drop(tx);
    schleife.await.unwrap();

    assert_eq!(
        ui.recv().await,
        Some(SessionEvent::Nachricht {
            von: PeerName::from("bob"),
            text: "nach dem Muell".into()
        })
    );
    assert_eq!(alice.state(), SessionState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_haengende_abfrage_blockiert_andere_absender_nicht() {
    let (bus, alice, mut ui, bob) = alice_und_bob().await;
    let alice = Arc::new(alice);
    // Bob landet im Cache, danach haengt jede weitere Abfrage
    alice.send(&PeerName::from("bob"), "hi").await.unwrap();
    bus.verhalten_setzen(ResolveVerhalten::Haengt);

    let (tx, rx) = mpsc::channel(8);
    let schleife = tokio::spawn({
        let alice = Arc::clone(&alice);
        async move { alice.run(rx).await }
    });

    let fremd = Identity::generate().unwrap();
    tx.send(ServerEvent::Dm {
        from: PeerName::from("fremd"),
        envelope: envelope_an_alice(&fremd, &alice, b"wartet"),
    })
    .await
    .unwrap();
    tx.send(ServerEvent::Dm {
        from: PeerName::from("bob"),
        envelope: envelope_an_alice(&bob, &alice, b"sofort"),
    })
    .await
    .unwrap();

    let event = tokio::time::timeout(Duration::from_millis(100), ui.recv())
        .await
        .expect("Bobs DM wartet nicht auf die fremde Abfrage");
    assert_eq!(
        event,
        Some(SessionEvent::Nachricht {
            von: PeerName::from("bob"),
            text: "sofort".into()
        })
    );

    // Die fremde Abfrage laeuft ins Zeitlimit, danach endet die Schleife
    drop(tx);
    schleife.await.unwrap();
    assert!(ui.try_recv().is_err());
    assert_eq!(bus.resolve_aufrufe(), 2);
}

#[tokio::test]
async fn test_volle_ui_queue_blockiert_nicht() {
    let bus = Arc::new(MockBus::neu());
    let config = SessionConfig {
        event_queue_groesse: 1,
        ..SessionConfig::default()
    };
    let (alice, mut ui) = Session::neu(PeerName::from("alice"), Arc::clone(&bus), config);
    alice.starten().await.unwrap();

    for _ in 0..3 {
        alice
            .handle_inbound(ServerEvent::Roster { names: vec![] })
            .await;
    }

    assert!(ui.try_recv().is_ok());
    assert!(ui.try_recv().is_err());
}
