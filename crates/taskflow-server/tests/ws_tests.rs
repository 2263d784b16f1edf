//! Socket endpoint over a real listener

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use taskflow_core::{Actor, MemoryStore, User};
use taskflow_server::auth::{LoginRequest, RegisterRequest};
use taskflow_server::{build_router, AppState, ServerConfig};
use taskflow_test_utils::{project_draft, task_draft};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve() -> (SocketAddr, AppState) {
    let state = AppState::new(ServerConfig::with_secret("ws-secret"), Arc::new(MemoryStore::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn account(state: &AppState, first: &str, role: &str) -> (User, String) {
    let email = format!("{}@example.com", first.to_lowercase());
    let user = state
        .accounts
        .register(RegisterRequest {
            first_name: Some(first.to_string()),
            last_name: Some("Socket".to_string()),
            email: Some(email.clone()),
            password: Some("pa55word".to_string()),
            role: Some(role.parse().unwrap()),
        })
        .await
        .unwrap();
    let session = state
        .accounts
        .login(LoginRequest {
            email: Some(email),
            password: Some("pa55word".to_string()),
        })
        .await
        .unwrap();
    (user, session.token)
}

async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn join(socket: &mut Socket, room: &str) -> Value {
    let frame = json!({ "event": "joinUserRoom", "data": room }).to_string();
    socket.send(Message::Text(frame)).await.unwrap();
    next_frame(socket).await
}

#[tokio::test]
async fn assignment_is_pushed_to_the_joined_room() {
    let (addr, state) = serve().await;
    let (manager, _) = account(&state, "Mia", "manager").await;
    let (member, token) = account(&state, "Uma", "user").await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token={token}")).await.unwrap();
    let ack = join(&mut socket, &member.id.to_string()).await;
    assert_eq!(ack["event"], "joined");

    let actor = Actor::new(manager.id, manager.role);
    let project = state
        .services
        .projects
        .create_project(project_draft("Launch"), &actor)
        .await
        .unwrap();
    let task = state
        .services
        .tasks
        .create_task(task_draft("Write docs", &project, Some(member.id)), &actor)
        .await
        .unwrap();

    let pushed = next_frame(&mut socket).await;
    assert_eq!(pushed["event"], "receiveNotification");
    assert_eq!(pushed["data"]["message"], "You have been assigned a new task: Write docs");
    assert_eq!(pushed["data"]["link"], format!("/tasks/{}", task.id));
}

#[tokio::test]
async fn joining_someone_elses_room_is_rejected() {
    let (addr, state) = serve().await;
    let (other, _) = account(&state, "Otto", "user").await;
    let (_, token) = account(&state, "Eve", "user").await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token={token}")).await.unwrap();
    let reply = join(&mut socket, &other.id.to_string()).await;

    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "You can only join your own room");
    assert_eq!(state.rooms.room_size(other.id), 0);
}

#[tokio::test]
async fn handshake_without_token_is_refused() {
    let (addr, _) = serve().await;
    assert!(connect_async(format!("ws://{addr}/ws")).await.is_err());
}

#[tokio::test]
async fn disconnect_leaves_the_room() {
    let (addr, state) = serve().await;
    let (member, token) = account(&state, "Uma", "user").await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token={token}")).await.unwrap();
    join(&mut socket, &member.id.to_string()).await;
    assert_eq!(state.rooms.room_size(member.id), 1);

    socket.close(None).await.unwrap();
    for _ in 0..50 {
        if state.rooms.room_size(member.id) == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.rooms.room_size(member.id), 0);
}
