//! Client integration tests against scripted mock servers.

mod support;

use shoal::{Client, Endpoint, Error, Value};
use support::*;

fn client_for(server: &MockServer) -> Client {
    Client::new(Endpoint::new(server.host(), server.port()))
}

#[tokio::test]
async fn set_get_roundtrip() {
    init_tracing();
    let server = MockServer::spawn(vec![status("OK"), bulk(b"foobar")]).await;
    let mut client = client_for(&server);

    assert!(client.set(b"mykey", b"foobar").await.unwrap());
    let value = client.get(b"mykey").await.unwrap();
    assert_eq!(value.as_deref(), Some(&b"foobar"[..]));

    let received = server.received();
    assert_command(&received[0], &[b"set", b"mykey", b"foobar"]);
    assert_command(&received[1], &[b"get", b"mykey"]);
}

#[tokio::test]
async fn connect_is_lazy() {
    let server = MockServer::spawn(vec![status("PONG")]).await;
    let mut client = client_for(&server);

    assert!(!client.is_connected());
    assert_eq!(server.command_count(), 0);

    assert!(client.ping().await.unwrap());
    assert!(client.is_connected());
}

#[tokio::test]
async fn get_missing_key_is_none() {
    let server = MockServer::spawn(vec![null_bulk()]).await;
    let mut client = client_for(&server);

    assert_eq!(client.get(b"missing").await.unwrap(), None);
}

#[tokio::test]
async fn auth_is_sent_before_first_command() {
    let server = MockServer::spawn(vec![status("OK"), status("PONG")]).await;
    let mut client = Client::new(Endpoint {
        host: server.host(),
        port: server.port(),
        password: Some("sekrit".to_string()),
        ..Endpoint::default()
    });

    assert!(client.ping().await.unwrap());

    let received = server.received();
    assert_command(&received[0], &[b"AUTH", b"sekrit"]);
    assert_command(&received[1], &[b"ping"]);
}

#[tokio::test]
async fn rejected_auth_is_typed() {
    let server = MockServer::spawn(vec![error("ERR invalid password")]).await;
    let mut client = Client::new(Endpoint {
        host: server.host(),
        port: server.port(),
        password: Some("wrong".to_string()),
        ..Endpoint::default()
    });

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn nonzero_db_is_selected_on_connect() {
    let server = MockServer::spawn(vec![status("OK"), status("PONG")]).await;
    let mut client = Client::new(Endpoint {
        host: server.host(),
        port: server.port(),
        db: 3,
        ..Endpoint::default()
    });

    assert!(client.ping().await.unwrap());

    let received = server.received();
    assert_command(&received[0], &[b"SELECT", b"3"]);
    assert_command(&received[1], &[b"ping"]);
}

#[tokio::test]
async fn server_error_reply_is_raised_verbatim() {
    let server = MockServer::spawn(vec![error("ERR wrong kind of value")]).await;
    let mut client = client_for(&server);

    let err = client.incr(b"a-list").await.unwrap_err();
    assert!(matches!(err, Error::Server(ref msg) if msg == "ERR wrong kind of value"));
}

#[tokio::test]
async fn arity_violation_never_reaches_the_wire() {
    let server = MockServer::spawn(vec![]).await;
    let mut client = client_for(&server);

    let err = client
        .call("set", vec!["only-a-key".into()])
        .await
        .unwrap_err();
    match err {
        Error::ArgumentCount {
            command, actual, ..
        } => {
            assert_eq!(command, "set");
            assert_eq!(actual, 1);
        }
        other => panic!("expected ArgumentCount, got {:?}", other),
    }

    // The client never even connected.
    assert!(!client.is_connected());
    assert_eq!(server.command_count(), 0);
}

#[tokio::test]
async fn lost_connection_reconnects_on_next_call() {
    let server = MockServer::spawn(vec![
        status("OK"),
        drop_connection(),
        status("OK"),
    ])
    .await;
    let mut client = client_for(&server);

    // First call works.
    assert!(client.set(b"k", b"v").await.unwrap());

    // The server drops the connection instead of answering: the call
    // fails with a socket error and the client disconnects.
    let err = client.set(b"k", b"v2").await.unwrap_err();
    assert!(matches!(err, Error::Socket(_)));
    assert!(!client.is_connected());

    // No retry happened within the failing call; the next call opens a
    // fresh connection and succeeds.
    assert!(client.set(b"k", b"v3").await.unwrap());
    assert_eq!(server.command_count(), 3);
}

#[tokio::test]
async fn unknown_command_passes_through_raw() {
    let server = MockServer::spawn(vec![bulk(b"raw answer")]).await;
    let mut client = client_for(&server);

    let value = client
        .call("object", vec!["ENCODING".into(), "mykey".into()])
        .await
        .unwrap();
    assert_eq!(value, Value::Bytes(bytes::Bytes::from("raw answer")));
    assert_command(&server.received()[0], &[b"object", b"ENCODING", b"mykey"]);
}

#[tokio::test]
async fn hgetall_regroups_pairs_in_order() {
    let reply = array(&[bulk(b"name"), bulk(b"Ariz"), bulk(b"level"), bulk(b"9")]);
    let server = MockServer::spawn(vec![reply]).await;
    let mut client = client_for(&server);

    let pairs = client.hgetall(b"user:1").await.unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(&pairs[0].0[..], b"name");
    assert_eq!(pairs[0].1, Value::Bytes(bytes::Bytes::from("Ariz")));
    assert_eq!(&pairs[1].0[..], b"level");
}

#[tokio::test]
async fn odd_hgetall_reply_is_protocol_error() {
    let reply = array(&[bulk(b"name"), bulk(b"Ariz"), bulk(b"orphan")]);
    let server = MockServer::spawn(vec![reply]).await;
    let mut client = client_for(&server);

    let err = client.hgetall(b"user:1").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn mget_maps_nulls_to_none() {
    let reply = array(&[bulk(b"1"), null_bulk(), bulk(b"3")]);
    let server = MockServer::spawn(vec![reply]).await;
    let mut client = client_for(&server);

    let values = client.mget(&[b"a", b"b", b"c"]).await.unwrap();
    assert_eq!(
        values,
        vec![
            Some(bytes::Bytes::from("1")),
            None,
            Some(bytes::Bytes::from("3")),
        ]
    );
}

#[tokio::test]
async fn sort_builds_option_arguments() {
    use shoal::{Order, SortOptions};

    let server = MockServer::spawn(vec![array(&[bulk(b"c"), bulk(b"b"), bulk(b"a")])]).await;
    let mut client = client_for(&server);

    let options = SortOptions::new()
        .alpha()
        .order(Order::Descending)
        .limit(0, 3);
    let sorted = client.sort(b"letters", options).await.unwrap();
    assert_eq!(sorted.len(), 3);

    assert_command(
        &server.received()[0],
        &[b"sort", b"letters", b"LIMIT", b"0", b"3", b"ALPHA", b"DESC"],
    );
}

#[tokio::test]
async fn quit_closes_and_next_call_reconnects() {
    // The second script entry answers the best-effort QUIT the client
    // writes while closing; the client never reads it.
    let server = MockServer::spawn(vec![status("PONG"), status("OK"), status("PONG")]).await;
    let mut client = client_for(&server);

    assert!(client.ping().await.unwrap());
    client.quit().await;
    assert!(!client.is_connected());

    assert!(client.ping().await.unwrap());
    assert!(client.is_connected());
}
