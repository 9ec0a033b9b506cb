//! HTTP API behaviour against a real listener.

use std::time::Duration;

use events::{Board, Post, Room};
use serde_json::{Value, json};
use server::{AppState, ServerConfig, routes};
use tokio::net::TcpListener;
use tokio::time::timeout;

async fn spawn_server() -> (String, AppState) {
    let state = AppState::new(ServerConfig::default());
    let app = routes::app(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), state)
}

async fn create_board(http: &reqwest::Client, base: &str, title: &str) -> Board {
    let response = http.post(format!("{base}/api/boards")).json(&json!({"title": title})).send().await.expect("send");
    assert_eq!(response.status(), 201);
    response.json().await.expect("board")
}

#[tokio::test]
async fn healthz_is_ok() {
    let (base, _) = spawn_server().await;
    let response = reqwest::get(format!("{base}/healthz")).await.expect("send");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn post_moderation_flow() {
    let (base, state) = spawn_server().await;
    let http = reqwest::Client::new();
    let board = create_board(&http, &base, "Wall").await;

    let (admin, mut admin_rx) = state.rooms.connect().await;
    state.rooms.join(admin, &Room::Admin).await;
    let (viewer, mut viewer_rx) = state.rooms.connect().await;
    state.rooms.join(viewer, &Room::Board(board.id)).await;

    let created: Post = http
        .post(format!("{base}/api/posts"))
        .json(&json!({"message": "hello", "nickname": "ann"}))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("post");
    assert_eq!(created.board_id, board.id);

    let new_post = timeout(Duration::from_secs(1), admin_rx.recv()).await.expect("in time").expect("envelope");
    assert_eq!(new_post.data["type"], "NEW_POST");
    assert!(viewer_rx.try_recv().is_err(), "viewers never see pending posts");

    let response = http
        .patch(format!("{base}/api/posts/{}", created.id))
        .json(&json!({"status": "APPROVED"}))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), 200);

    let updated = timeout(Duration::from_secs(1), admin_rx.recv()).await.expect("in time").expect("envelope");
    assert_eq!(updated.data["type"], "POST_STATUS_UPDATED");
    let approved = timeout(Duration::from_secs(1), viewer_rx.recv()).await.expect("in time").expect("envelope");
    assert_eq!(approved.data["type"], "NEW_APPROVED_POST");
    assert_eq!(approved.data["data"]["id"], json!(created.id));

    let listed: Vec<Post> = http
        .get(format!("{base}/api/posts?boardId={}&status=APPROVED", board.id))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("posts");
    assert_eq!(listed.len(), 1);

    let active: Board = reqwest::get(format!("{base}/api/boards/active")).await.expect("send").json().await.expect("board");
    assert_eq!(active.posts.map(|p| p.len()), Some(1));
}

#[tokio::test]
async fn errors_carry_code_and_message() {
    let (base, _) = spawn_server().await;
    let http = reqwest::Client::new();

    let response = http.post(format!("{base}/api/posts")).json(&json!({"message": "x"})).send().await.expect("send");
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["code"], "E_NO_ACTIVE_BOARD");

    create_board(&http, &base, "Wall").await;
    let response = http.post(format!("{base}/api/posts")).json(&json!({"message": "  "})).send().await.expect("send");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["code"], "E_EMPTY_POST");
    assert!(body["error"].is_string());

    let response = http.get(format!("{base}/api/posts?status=LATER")).send().await.expect("send");
    assert_eq!(response.status(), 400);

    let response = http.patch(format!("{base}/api/posts/999")).json(&json!({"status": "REJECTED"})).send().await.expect("send");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn activation_broadcasts_to_everyone() {
    let (base, state) = spawn_server().await;
    let http = reqwest::Client::new();
    create_board(&http, &base, "One").await;
    let two = create_board(&http, &base, "Two").await;
    let (_lurker, mut rx) = state.rooms.connect().await;

    let response = http.post(format!("{base}/api/boards/{}/activate", two.id)).send().await.expect("send");
    assert_eq!(response.status(), 200);
    let envelope = timeout(Duration::from_secs(1), rx.recv()).await.expect("in time").expect("envelope");
    assert_eq!(envelope.data["type"], "BOARD_UPDATE");

    let boards: Vec<Board> = reqwest::get(format!("{base}/api/boards")).await.expect("send").json().await.expect("boards");
    assert_eq!(boards.iter().filter(|b| b.is_active).count(), 1);
}

#[tokio::test]
async fn unknown_polling_session_is_not_found() {
    let (base, _) = spawn_server().await;
    let sid = "00000000-0000-4000-8000-000000000000";
    let response = reqwest::get(format!("{base}/api/socketio/poll/{sid}")).await.expect("send");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn polling_session_round_trip() {
    let (base, state) = spawn_server().await;
    let http = reqwest::Client::new();

    let hello: Value = http.post(format!("{base}/api/socketio/poll")).send().await.expect("send").json().await.expect("json");
    assert_eq!(hello["event"], "connected");
    let sid = hello["data"]["sid"].as_str().expect("sid").to_owned();
    let session = format!("{base}/api/socketio/poll/{sid}");

    let response = http.post(&session).body(r#"[{"event":"join-admin"}]"#).send().await.expect("send");
    assert_eq!(response.status(), 204);
    assert_eq!(state.rooms.member_count(&Room::Admin).await, 1);

    let response = http.delete(&session).send().await.expect("send");
    assert_eq!(response.status(), 204);
    assert_eq!(state.rooms.connection_count().await, 0);
    assert_eq!(http.get(&session).send().await.expect("send").status(), 404);
}

