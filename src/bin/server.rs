use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use sliding_robots::catalog::PuzzleCatalog;
use sliding_robots::engine::now_ms;
use sliding_robots::error::CatalogError;
use sliding_robots::input::{map_key, ControlAction, InputAction};
use sliding_robots::records_store::RecordsStore;
use sliding_robots::server_protocol::{parse_client_message, ParsedClientMessage};
use sliding_robots::server_utils::{parse_port, resolve_static_dir};
use sliding_robots::session::{KeyOutcome, Session, SessionOptions};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const OUTBOUND_QUEUE_CAPACITY: usize = 256;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct AppState {
    shared: SharedState,
    // wakes the tick task once the session has something to simulate again
    wake: Arc<Notify>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    session: Session,
    catalog: PuzzleCatalog,
    records_store: RecordsStore,
    rng: StdRng,
}

impl ServerState {
    fn new(catalog: PuzzleCatalog, records_store: RecordsStore) -> Self {
        Self {
            clients: HashMap::new(),
            session: Session::new(SessionOptions::default()),
            catalog,
            records_store,
            rng: StdRng::from_os_rng(),
        }
    }

    fn apply(&mut self, action: InputAction, now_ms: u64) -> Result<KeyOutcome, CatalogError> {
        self.session
            .handle_action(action, &self.catalog, &mut self.rng, now_ms)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let port = parse_port(std::env::var("PORT").ok().as_deref());

    let catalog = match std::env::var("PUZZLE_CATALOG_PATH") {
        Ok(path) => {
            info!("[server] loading puzzle catalog from {path}");
            PuzzleCatalog::load(&PathBuf::from(path))?
        }
        Err(_) => PuzzleCatalog::builtin()?,
    };
    info!("[server] {} puzzles available", catalog.len());

    let records_path = std::env::var("RECORDS_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/records.json"));

    let records = RecordsStore::new(records_path);
    let app_state = AppState {
        shared: Arc::new(Mutex::new(ServerState::new(catalog, records))),
        wake: Arc::new(Notify::new()),
    };
    start_tick_loop(app_state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/puzzles", get(puzzles_handler))
        .route("/api/records", get(records_handler))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    let static_dir = resolve_static_dir(std::env::var("STATIC_DIR").ok().as_deref());
    let app = if let Some(static_dir) = static_dir {
        let index_file = static_dir.join("index.html");
        info!("[server] static file root: {}", static_dir.display());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("[server] static file root not found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("[server] listening on :{port}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn puzzles_handler(State(app): State<AppState>) -> impl IntoResponse {
    let guard = app.shared.lock().await;
    Json(json!({
        "ids": guard.catalog.ids(),
        "current": guard.session.puzzle_id(),
    }))
}

async fn records_handler(State(app): State<AppState>) -> impl IntoResponse {
    let guard = app.shared.lock().await;
    Json(guard.records_store.build_response())
}

async fn ws_handler(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(app, socket))
}

async fn handle_socket(app: AppState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);

    {
        let mut guard = app.shared.lock().await;
        let context = ClientContext { tx };
        guard.clients.insert(client_id.clone(), context);
        send_welcome(&mut guard, &client_id);
    }
    info!("[server] {client_id} connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                return;
            }
        }
        // the queue only closes once the server has dropped this client
        let frame = CloseFrame {
            code: close_code::AWAY,
            reason: "disconnected by server".into(),
        };
        let _ = ws_sender.send(Message::Close(Some(frame))).await;
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&app, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&app, &client_id, text).await;
                } else {
                    send_error_to_client(&app.shared, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = app.shared.lock().await;
        disconnect_client_internal(&mut guard, &client_id);
    }
    let _ = writer.await;
}

async fn handle_client_message(app: &AppState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(&app.shared, client_id, "invalid message").await;
        return;
    };

    let mut guard = app.shared.lock().await;
    let now = now_ms();
    let result = match message {
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
            return;
        }
        ParsedClientMessage::Key { code } => guard.apply(map_key(code), now),
        ParsedClientMessage::Direction { dir } => guard.apply(InputAction::Move(dir), now),
        ParsedClientMessage::SelectRobot { color } => {
            let action = InputAction::Control(ControlAction::SelectRobot(color));
            guard.apply(action, now)
        }
        ParsedClientMessage::TogglePair => {
            guard.apply(InputAction::Control(ControlAction::TogglePair), now)
        }
        ParsedClientMessage::Start => guard.apply(InputAction::Control(ControlAction::Start), now),
        ParsedClientMessage::Restart => {
            guard.apply(InputAction::Control(ControlAction::Restart), now)
        }
        ParsedClientMessage::NewPuzzle { puzzle_id: None } => {
            guard.apply(InputAction::Control(ControlAction::NewPuzzle), now)
        }
        ParsedClientMessage::NewPuzzle {
            puzzle_id: Some(id),
        } => {
            let state = &mut *guard;
            state
                .session
                .load_puzzle(id, &state.catalog, now)
                .map(|()| KeyOutcome::PuzzleLoaded)
        }
    };

    apply_outcome(&mut guard, &app.wake, client_id, result);
}

fn apply_outcome(
    state: &mut ServerState,
    wake: &Notify,
    client_id: &str,
    result: Result<KeyOutcome, CatalogError>,
) {
    match result {
        Ok(KeyOutcome::Ignored) => {}
        Ok(KeyOutcome::Accepted) => wake.notify_one(),
        Ok(KeyOutcome::ControlsChanged) => broadcast_state(state),
        Ok(KeyOutcome::PuzzleLoaded) => {
            broadcast_puzzle_init(state);
            broadcast_state(state);
            wake.notify_one();
        }
        Ok(KeyOutcome::MuteRequested) => {
            let mute = json!({ "type": "mute" });
            broadcast(state, &mute, QueuePolicy::DisconnectOnFull);
            // delivers the queued mute event now instead of with some later tick
            broadcast_state(state);
        }
        Err(error) => {
            warn!("[server] {client_id} request failed: {error}");
            send_to_client(
                state,
                client_id,
                &json!({
                    "type": "error",
                    "message": error.to_string(),
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn send_welcome(state: &mut ServerState, client_id: &str) {
    let message = json!({
        "type": "welcome",
        "clientId": client_id,
        "phase": state.session.phase(),
        "board": state.session.board(),
        "puzzle": state.session.puzzle_init(),
        "snapshot": state.session.build_snapshot(false),
    });
    send_to_client(state, client_id, &message, QueuePolicy::DisconnectOnFull);
}

fn start_tick_loop(app: AppState) {
    tokio::spawn(async move {
        let tick_ms = app.shared.lock().await.session.options().tick_ms;
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let active = app.shared.lock().await.session.should_tick(now_ms());
            if !active {
                // a notify_one issued before we start waiting leaves a permit behind
                app.wake.notified().await;
                interval.reset();
                continue;
            }
            interval.tick().await;
            let mut guard = app.shared.lock().await;
            tick_session(&mut guard);
        }
    });
}

fn tick_session(state: &mut ServerState) {
    if !state.session.should_tick(now_ms()) {
        return;
    }
    let report = state.session.tick();
    broadcast_state(state);

    if report.victory {
        announce_victory(state);
    }
}

fn announce_victory(state: &mut ServerState) {
    let Some(puzzle_id) = state.session.puzzle_id() else {
        return;
    };
    let moves = state.session.moves();
    let minimum_moves = state.session.minimum_moves();
    let record = state
        .records_store
        .record_solve(puzzle_id, moves, minimum_moves);
    info!(
        "[server] puzzle {puzzle_id} solved in {moves} moves, best {}",
        record.best_moves
    );
    broadcast(
        state,
        &json!({
            "type": "victory",
            "puzzleId": puzzle_id,
            "moves": moves,
            "minimumMoves": minimum_moves,
            "record": record,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn broadcast_state(state: &mut ServerState) {
    let snapshot = state.session.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );
}

fn broadcast_puzzle_init(state: &mut ServerState) {
    let Some(puzzle) = state.session.puzzle_init() else {
        return;
    };
    broadcast(
        state,
        &json!({
            "type": "puzzle_init",
            "puzzle": puzzle,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    if state.clients.remove(client_id).is_some() {
        info!(
            "[server] {client_id} disconnected, {} clients remain",
            state.clients.len()
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client.tx.try_send(message.to_string()).is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        warn!("[server] outbound queue full for {client_id}, disconnecting");
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client.tx.try_send(payload.clone()).is_err() && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        warn!("[server] outbound queue full for {client_id}, disconnecting");
        disconnect_client_internal(state, &client_id);
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
