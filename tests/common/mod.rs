//! In-process board backend for integration tests.
//!
//! Serves the HTTP routes the engine calls plus a websocket endpoint that
//! records join/leave requests and forwards whatever the test pushes.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
};
use boardsync_common::{
    Board, BoardId, ChannelRequest, Column, ColumnId, MoveTask, Priority, RealtimeEvent, ReorderColumns, Task,
    TaskId, WorkspaceId,
};
use tokio::sync::broadcast;

pub const BOARD: BoardId = BoardId(1);

/// Pushed to connected sockets to make the server hang up.
const HANG_UP: &str = "__hang_up__";

pub struct Backend {
    pub board: Mutex<Board>,
    pub columns: Mutex<Vec<Column>>,
    pub tasks: Mutex<Vec<Task>>,
    pub token: Option<String>,
    pub reorders: Mutex<Vec<(BoardId, ReorderColumns)>>,
    pub moves: Mutex<Vec<MoveTask>>,
    pub requests: Mutex<Vec<ChannelRequest>>,
    pub column_fetches: AtomicUsize,
    pub task_fetches: AtomicUsize,
    pub fail_commands: AtomicBool,
    frames: broadcast::Sender<String>,
}

impl Backend {
    fn new(token: Option<String>) -> Self {
        let (frames, _) = broadcast::channel(64);
        Self {
            board: Mutex::new(Board {
                id: BOARD,
                workspace_id: WorkspaceId(1),
                name: "Roadmap".to_string(),
                description: String::new(),
                archived: false,
            }),
            columns: Mutex::new(vec![column(1, "Todo", 0), column(2, "Doing", 1), column(3, "Done", 2)]),
            tasks: Mutex::new(vec![
                task(10, 1, 0, "Draft plan"),
                task(11, 1, 1, "Collect feedback"),
                task(12, 1, 2, "Review budget"),
                task(20, 2, 0, "Build prototype"),
            ]),
            token,
            reorders: Mutex::new(Vec::new()),
            moves: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            column_fetches: AtomicUsize::new(0),
            task_fetches: AtomicUsize::new(0),
            fail_commands: AtomicBool::new(false),
            frames,
        }
    }

    /// Send `event` to every connected socket.
    pub fn push(&self, event: &RealtimeEvent) {
        let _ = self.frames.send(event.to_json().unwrap());
    }

    pub fn push_raw(&self, frame: &str) {
        let _ = self.frames.send(frame.to_string());
    }

    /// Close every connected socket from the server side.
    pub fn hang_up(&self) {
        let _ = self.frames.send(HANG_UP.to_string());
    }

    pub fn task_ids_in_column(&self, column: ColumnId) -> Vec<TaskId> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.column_id == column)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.position);
        tasks.into_iter().map(|t| t.id).collect()
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        let mut columns = self.columns.lock().unwrap().clone();
        columns.sort_by_key(|c| c.position);
        columns.into_iter().map(|c| c.id).collect()
    }

    /// Server-side relocation with the same semantics as the move endpoint.
    pub fn relocate(&self, command: &MoveTask) {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(source) = tasks.iter().find(|t| t.id == command.task_id).map(|t| t.column_id) else {
            return;
        };
        let mut destination: Vec<TaskId> = {
            let mut in_column: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.column_id == command.target_column_id && t.id != command.task_id)
                .collect();
            in_column.sort_by_key(|t| t.position);
            in_column.into_iter().map(|t| t.id).collect()
        };
        let index = command.target_position.min(destination.len());
        destination.insert(index, command.task_id);

        let mut remaining: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.column_id == source && t.id != command.task_id)
            .collect();
        remaining.sort_by_key(|t| t.position);
        let remaining: Vec<TaskId> = remaining.into_iter().map(|t| t.id).collect();

        for task in tasks.iter_mut() {
            if let Some(pos) = destination.iter().position(|id| *id == task.id) {
                task.column_id = command.target_column_id;
                task.position = pos as i64;
            } else if let Some(pos) = remaining.iter().position(|id| *id == task.id) {
                task.position = pos as i64;
            }
        }
    }

    pub fn seen_requests(&self) -> Vec<ChannelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = &self.token else {
            return true;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {token}"))
    }
}

pub fn column(id: i64, name: &str, position: i64) -> Column {
    Column {
        id: ColumnId(id),
        board_id: BOARD,
        name: name.to_string(),
        position,
    }
}

pub fn task(id: i64, column: i64, position: i64, title: &str) -> Task {
    Task {
        id: TaskId(id),
        column_id: ColumnId(column),
        title: title.to_string(),
        description: String::new(),
        position,
        assignee_id: None,
        status: None,
        priority: Priority::Medium,
        due_date: None,
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Arc<Backend>,
}

impl TestServer {
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/api/ws", self.addr)
    }
}

/// Start a backend on an ephemeral port. Requests must carry `token` when
/// one is given.
pub async fn spawn_backend(token: Option<&str>) -> TestServer {
    let backend = Arc::new(Backend::new(token.map(str::to_string)));
    let app = Router::new()
        .route("/api/boards/{id}", get(get_board))
        .route("/api/boards/{id}/columns", get(get_columns))
        .route("/api/boards/{id}/tasks", get(get_tasks))
        .route("/api/boards/{id}/columns/reorder", put(reorder_columns))
        .route("/api/tasks/{id}/move", patch(move_task))
        .route("/api/ws", get(ws_handler))
        .with_state(Arc::clone(&backend));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer { addr, backend }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

type Shared = State<Arc<Backend>>;

async fn get_board(State(backend): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let board = backend.board.lock().unwrap().clone();
    if board.id != BoardId(id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(board).into_response()
}

async fn get_columns(State(backend): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend.column_fetches.fetch_add(1, Ordering::SeqCst);
    let columns: Vec<Column> = backend
        .columns
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.board_id == BoardId(id))
        .cloned()
        .collect();
    Json(columns).into_response()
}

async fn get_tasks(State(backend): Shared, headers: HeaderMap, Path(_id): Path<i64>) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend.task_fetches.fetch_add(1, Ordering::SeqCst);
    Json(backend.tasks.lock().unwrap().clone()).into_response()
}

async fn reorder_columns(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(command): Json<ReorderColumns>,
) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend.reorders.lock().unwrap().push((BoardId(id), command.clone()));
    if backend.fail_commands.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    for column in backend.columns.lock().unwrap().iter_mut() {
        if let Some(pos) = command.column_ids.iter().position(|id| *id == column.id) {
            column.position = pos as i64;
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn move_task(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(command): Json<MoveTask>,
) -> Response {
    if !backend.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if command.task_id != TaskId(id) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    backend.moves.lock().unwrap().push(command.clone());
    if backend.fail_commands.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    backend.relocate(&command);
    StatusCode::NO_CONTENT.into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(backend): Shared) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, backend))
}

async fn run_socket(mut socket: WebSocket, backend: Arc<Backend>) {
    let mut frames = backend.frames.subscribe();
    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(request) = serde_json::from_str::<ChannelRequest>(text.as_str()) {
                        backend.requests.lock().unwrap().push(request);
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
            outgoing = frames.recv() => match outgoing {
                Ok(frame) if frame == HANG_UP => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Ok(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
