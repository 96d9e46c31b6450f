//! Integration tests for the protocol layer

use ris_core::{GameListing, GameState, ResultReport, ResultVerdict, YDate};
use ris_network::{decode, Client, ClientConfig, Endpoint, NetworkError, ServerAddress, Transport};

#[test]
fn test_listing_example() {
    let listing: GameListing =
        decode(r#"{"g1":{"mindate":{"year":1,"day":1},"players":["alice"]}}"#).unwrap();

    assert_eq!(listing.len(), 1);
    assert_eq!(listing["g1"].players, vec!["alice".to_string()]);
}

#[test]
fn test_join_example() {
    let game: GameState = decode(
        r#"{"mindate":{"year":1,"day":1},"players":{
            "alice":{"date":{"year":1,"day":1},"leader":true},
            "bob":{"date":{"year":1,"day":1},"leader":false}}}"#,
    )
    .unwrap();

    assert_eq!(game.min_date, YDate::new(1, 1));
    assert!(!game.players["bob"].is_leader);
}

#[test]
fn test_result_for_current_player() {
    let report: ResultReport =
        decode(r#"{"bob":{"date":{"year":3,"day":40},"first":"was_leader"}}"#).unwrap();

    let mine = report.for_player("bob").unwrap();
    assert_eq!(mine.verdict, ResultVerdict::WasLeader);
    assert_eq!(mine.date, YDate::new(3, 40));
}

#[test]
fn test_error_document_beats_payload() {
    let err = decode::<GameListing>(r#"{"err":"internal error","code":500}"#).unwrap_err();
    assert!(matches!(err, NetworkError::Protocol { .. }));
    assert!(!err.is_no_entry());
}

#[test]
fn test_every_endpoint_marks_json() {
    let address = ServerAddress::default();
    let endpoints = vec![
        Endpoint::ListGames,
        Endpoint::Join {
            game: "g1".to_string(),
            name: "bob".to_string(),
        },
        Endpoint::Part {
            game: "g1".to_string(),
            name: "bob".to_string(),
        },
        Endpoint::ReadGame {
            game: "g1".to_string(),
        },
        Endpoint::Sync {
            game: "g1".to_string(),
            player: "bob".to_string(),
            date: YDate::new(1, 5),
            kia: 2,
        },
        Endpoint::Result {
            game: "g1".to_string(),
            contract: "FirstSatellite".to_string(),
        },
    ];

    for endpoint in endpoints {
        let url = endpoint.url(&address).unwrap();
        assert_eq!(url.path(), endpoint.path());
        assert!(url.query().unwrap_or_default().starts_with("json=1"));
    }
}

#[tokio::test]
async fn test_client_as_transport_object() {
    let client = Client::with_config(ClientConfig::default()).expect("Failed to create client");
    let transport: Box<dyn Transport> = Box::new(client);

    // Nothing listens on the discard port; we only check the failure shape.
    let address = ServerAddress::new("127.0.0.1", 9);
    let result = transport.fetch(&address, &Endpoint::ListGames).await;
    assert!(result.is_err());
}
