//! Live feed tests: a WebSocket bound to one user receives that user's
//! committed events for the subscribed topics, and nothing else.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::TestServer;
use trailpass::domain::UserId;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer, user: UserId) -> Socket {
    let Ok(mut request) = format!("ws://{}/ws", server.addr).into_client_request() else {
        panic!("bad ws url");
    };
    let Ok(value) = HeaderValue::from_str(&user.to_string()) else {
        panic!("bad header");
    };
    request.headers_mut().insert("x-user-id", value);
    let Ok((socket, _)) = connect_async(request).await else {
        panic!("ws connect failed");
    };
    socket
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), socket.next()).await
        else {
            panic!("no ws message within 5s");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                panic!("ws message is not JSON");
            };
            return value;
        }
    }
}

async fn send_command(socket: &mut Socket, id: &str, payload: Value) -> Value {
    let msg = json!({ "id": id, "type": "command", "payload": payload });
    let Ok(()) = socket.send(Message::text(msg.to_string())).await else {
        panic!("ws send failed");
    };
    next_json(socket).await
}

#[tokio::test]
async fn upgrade_requires_identity() {
    let server = TestServer::start().await;
    let result = connect_async(format!("ws://{}/ws", server.addr)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn feed_carries_only_own_subscribed_events() {
    let server = TestServer::start().await;
    let ana = server.user().await;
    let ben = server.user().await;
    let plaza = server.destination("PLAZA-1", 41.3851, 2.1734, 40).await;

    let mut socket = connect(&server, ana).await;
    let response = send_command(
        &mut socket,
        "sub-1",
        json!({ "command": "subscribe", "topics": ["checkins"] }),
    )
    .await;
    assert_eq!(response["type"], "response");
    assert_eq!(response["id"], "sub-1");
    assert_eq!(response["payload"]["subscribed"], json!(["checkins"]));

    // Ben's activity must not reach Ana's feed.
    let (status, _) = server.check_in(ben, &plaza).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    let (status, _) = server.check_in(ana, &plaza).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);

    let event = next_json(&mut socket).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "check_in_settled");
    assert_eq!(event["payload"]["user_id"], ana.to_string());
    assert_eq!(event["payload"]["total_points"], 50);
}

#[tokio::test]
async fn wildcard_includes_badge_awards() {
    let server = TestServer::start().await;
    let ana = server.user().await;
    let plaza = server.destination("PLAZA-2", 41.3851, 2.1734, 40).await;

    let mut socket = connect(&server, ana).await;
    let response = send_command(
        &mut socket,
        "sub-all",
        json!({ "command": "subscribe", "topics": ["*"] }),
    )
    .await;
    assert_eq!(response["payload"]["wildcard"], true);

    let (status, _) = server.check_in(ana, &plaza).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);

    let mut kinds = vec![
        next_json(&mut socket).await["payload"]["event_type"].clone(),
        next_json(&mut socket).await["payload"]["event_type"].clone(),
    ];
    kinds.sort_by_key(ToString::to_string);
    assert_eq!(kinds, vec![json!("badge_earned"), json!("check_in_settled")]);
}

#[tokio::test]
async fn unknown_commands_get_an_error_frame() {
    let server = TestServer::start().await;
    let ana = server.user().await;
    let mut socket = connect(&server, ana).await;

    let response = send_command(&mut socket, "x", json!({ "command": "teleport" })).await;
    assert_eq!(response["type"], "error");
    assert_eq!(response["payload"]["code"], 404);
}
