use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use kanban_sync::{
    Board, BoardApi, Card, CardUpdate, ChatMessage, Column, HttpBoardApi, KanbanClient,
    MemoryCredentialStore, Session, SessionState, SyncConfig, SyncError,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify};

const GOOD_TOKEN: &str = "good-token";
const HELD_TOKEN: &str = "held-token";

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    method: String,
    path: String,
    body: Option<Value>,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    // requests carrying HELD_TOKEN wait for this before being rejected
    release_held: Arc<Notify>,
}

impl MockState {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }
}

fn board() -> Board {
    Board::new(
        1,
        "My Board",
        vec![
            Column::new(1, "Backlog", 0).with_cards(vec![
                Card::new(1, "Card A", 0),
                Card::new(2, "Card B", 1),
            ]),
            Column::new(2, "Done", 1),
        ],
    )
}

fn reordered_board() -> Board {
    Board::new(
        1,
        "My Board",
        vec![
            Column::new(1, "Backlog", 0).with_cards(vec![
                Card::new(2, "Card B", 0),
                Card::new(1, "Card A", 1),
            ]),
            Column::new(2, "Done", 1),
        ],
    )
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let path = uri.path().to_owned();
    state.requests.lock().expect("requests lock").push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        body: serde_json::from_str(&body).ok(),
        authorization: authorization.clone(),
    });

    if authorization.as_deref() == Some(format!("Bearer {HELD_TOKEN}").as_str()) {
        state.release_held.notified().await;
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }

    let expected = format!("Bearer {GOOD_TOKEN}");
    if authorization.as_deref() != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"})));
    }

    match path.as_str() {
        "/api/auth/me" => (StatusCode::OK, Json(json!({"username": "user"}))),
        "/api/chat" => (
            StatusCode::OK,
            Json(json!({
                "message": "Moved it.",
                "board_updates": [{"action": "move_card", "card_id": 1, "target_column_id": 2, "position": 0}],
                "board": board(),
            })),
        ),
        "/api/board/cards/999" => (StatusCode::NOT_FOUND, Json(json!({"detail": "Card not found"}))),
        "/api/board/cards/1/move" => (StatusCode::OK, Json(json!(reordered_board()))),
        _ => (StatusCode::OK, Json(json!(board()))),
    }
}

async fn spawn_mock_server() -> (String, MockState, oneshot::Sender<()>) {
    let state = MockState::default();
    let app = Router::new().fallback(handle).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("run mock server");
    });
    (format!("http://{address}/api"), state, shutdown_tx)
}

fn config(url: &str) -> SyncConfig {
    let mut config = SyncConfig::default().with_api_url(url);
    config.request_timeout = Duration::from_secs(3);
    config.rename_debounce = Duration::from_millis(50);
    config
}

fn api_with_token(url: &str, token: &str) -> (HttpBoardApi, Session) {
    let session = Session::new(Arc::new(MemoryCredentialStore::with_token(token)));
    session.login_succeeded("user", token);
    let api = HttpBoardApi::new(&config(url), session.clone()).expect("build api");
    (api, session)
}

#[tokio::test]
async fn requests_carry_paths_bodies_and_bearer_credential() {
    let (url, state, _shutdown) = spawn_mock_server().await;
    let (api, _session) = api_with_token(&url, GOOD_TOKEN);

    assert_eq!(api.fetch_board().await.expect("fetch"), board());
    api.rename_column(1, "Todo").await.expect("rename");
    api.create_card(2, "New card", "Notes").await.expect("create");
    api.update_card(
        2,
        &CardUpdate {
            title: Some("Renamed".to_owned()),
            details: None,
        },
    )
    .await
    .expect("update");
    api.delete_card(2).await.expect("delete");
    assert_eq!(api.move_card(1, 1, 1).await.expect("move"), reordered_board());

    let history = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello")];
    let reply = api.send_chat("Move card A", &history).await.expect("chat");
    assert_eq!(reply.message, "Moved it.");
    assert_eq!(reply.board_updates.len(), 1);

    let requests = state.requests();
    let summary: Vec<(&str, &str)> = requests
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("GET", "/api/board"),
            ("PUT", "/api/board/columns/1"),
            ("POST", "/api/board/cards"),
            ("PUT", "/api/board/cards/2"),
            ("DELETE", "/api/board/cards/2"),
            ("PUT", "/api/board/cards/1/move"),
            ("POST", "/api/chat"),
        ]
    );
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer good-token")));

    assert_eq!(requests[0].body, None);
    assert_eq!(requests[1].body, Some(json!({"title": "Todo"})));
    assert_eq!(
        requests[2].body,
        Some(json!({"column_id": 2, "title": "New card", "details": "Notes"}))
    );
    assert_eq!(requests[3].body, Some(json!({"title": "Renamed"})));
    assert_eq!(requests[5].body, Some(json!({"column_id": 1, "position": 1})));
    assert_eq!(
        requests[6].body,
        Some(json!({
            "message": "Move card A",
            "history": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"}
            ]
        }))
    );
}

#[tokio::test]
async fn rejected_credential_invalidates_session() {
    let (url, _state, _shutdown) = spawn_mock_server().await;
    let (api, session) = api_with_token(&url, "expired");
    assert_eq!(session.state().username(), Some("user"));

    let err = api.fetch_board().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.credential().is_none());
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let (url, _state, _shutdown) = spawn_mock_server().await;
    let (api, _session) = api_with_token(&url, GOOD_TOKEN);

    match api.delete_card(999).await {
        Err(SyncError::Api { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("Card not found"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let (api, _session) = api_with_token("http://127.0.0.1:9/api", GOOD_TOKEN);
    assert!(matches!(api.fetch_board().await, Err(SyncError::Transport(_))));
}

#[tokio::test]
async fn client_restores_session_and_reconciles_drag() {
    let (url, state, _shutdown) = spawn_mock_server().await;
    let client = KanbanClient::new(
        config(&url),
        Arc::new(MemoryCredentialStore::with_token(GOOD_TOKEN)),
    )
    .expect("build client");

    let loaded = client.start().await.expect("start");
    assert_eq!(loaded, Some(board()));
    assert_eq!(client.session().state().username(), Some("user"));

    let handle = client
        .dispatcher()
        .drag_end("card-1", Some("card-2"))
        .expect("drag resolves to a move");
    handle.await.expect("move task");

    assert_eq!(client.store().snapshot(), Some(reordered_board()));
    let paths: Vec<String> = state.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/api/auth/me", "/api/board", "/api/board/cards/1/move"]);
}

#[tokio::test]
async fn client_without_credential_stays_unauthenticated() {
    let (url, state, _shutdown) = spawn_mock_server().await;
    let client = KanbanClient::new(config(&url), Arc::new(MemoryCredentialStore::default()))
        .expect("build client");

    assert_eq!(client.start().await.expect("start"), None);
    assert_eq!(client.session().state(), SessionState::Unauthenticated);
    assert!(state.requests().is_empty());
}

#[tokio::test]
async fn logout_discards_local_state() {
    let (url, _state, _shutdown) = spawn_mock_server().await;
    let client = KanbanClient::new(
        config(&url),
        Arc::new(MemoryCredentialStore::with_token(GOOD_TOKEN)),
    )
    .expect("build client");
    client.start().await.expect("start");
    assert!(client.store().is_loaded());

    client.logout();

    assert!(!client.store().is_loaded());
    assert!(client.session().credential().is_none());
}

#[tokio::test]
async fn expired_credential_mid_session_clears_board() {
    let (url, _state, _shutdown) = spawn_mock_server().await;
    let client = KanbanClient::new(
        config(&url),
        Arc::new(MemoryCredentialStore::with_token(GOOD_TOKEN)),
    )
    .expect("build client");
    client.start().await.expect("start");
    let watcher = client.watch_session();
    let mut events = client.session().subscribe();

    // server starts rejecting the stored credential
    client.session().login_succeeded("user", "revoked");

    client
        .dispatcher()
        .create_card(1, "New", "")
        .expect("valid card")
        .await
        .expect("create task");
    events.changed().await.expect("session event");
    assert_eq!(*events.borrow(), SessionState::Unauthenticated);

    tokio::time::timeout(Duration::from_secs(1), async {
        while client.store().is_loaded() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("board cleared after expiry");
    watcher.abort();
}

#[tokio::test]
async fn late_rejection_of_replaced_credential_keeps_new_session() {
    let (url, state, _shutdown) = spawn_mock_server().await;
    let (api, session) = api_with_token(&url, HELD_TOKEN);

    let stale_request = tokio::spawn({
        let api = api.clone();
        async move { api.fetch_board().await }
    });
    tokio::time::timeout(Duration::from_secs(3), async {
        while state.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("held request reached the server");

    session.login_succeeded("user", GOOD_TOKEN);
    state.release_held.notify_one();

    let result = stale_request.await.expect("request task");
    assert!(matches!(result, Err(SyncError::Unauthorized)));
    assert_eq!(session.state().username(), Some("user"));
    assert_eq!(session.credential().as_deref(), Some(GOOD_TOKEN));

    assert_eq!(api.fetch_board().await.expect("fetch with new credential"), board());
}
