//! HTTP control surface.
//!
//! A small axum facade over one [`RobotSession`]. Choreography endpoints
//! reply immediately and run the script on a spawned task; the session mutex
//! serializes the actual hardware traffic, so at most one script is touching
//! the robot at a time. The suggestion flow publishes its progress on a
//! `watch` channel, which is what `/suggest/status` reads, giving the web
//! frontend a defined completion signal to poll for.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::robot::RobotSession;
use crate::stack::Movement;

/// Progress of the most recent `/suggest` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestStatus {
    Idle,
    Pending,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestState {
    pub status: SuggestStatus,
    pub color: Option<String>,
    pub updated_at: Option<u64>,
}

impl SuggestState {
    fn idle() -> Self {
        Self {
            status: SuggestStatus::Idle,
            color: None,
            updated_at: None,
        }
    }

    fn pending(color: String) -> Self {
        Self {
            status: SuggestStatus::Pending,
            color: Some(color),
            updated_at: Some(unix_now()),
        }
    }

    fn done(color: String) -> Self {
        Self {
            status: SuggestStatus::Done,
            color: Some(color),
            updated_at: Some(unix_now()),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Shared state injected into every handler. The session handle is owned
/// here, by the process that built the router; handlers never reach for
/// globals.
pub struct AppState {
    session: Arc<Mutex<RobotSession>>,
    suggest: watch::Sender<SuggestState>,
}

impl AppState {
    pub fn new(session: RobotSession) -> Self {
        let (suggest, _) = watch::channel(SuggestState::idle());
        Self {
            session: Arc::new(Mutex::new(session)),
            suggest,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/think", post(think))
        .route("/suggest", post(suggest))
        .route("/suggest/status", get(suggest_status))
        .route("/celebrate", post(celebrate))
        .route("/sad", post(sad))
        .route("/rollback", post(rollback))
        .route("/history", get(history))
        .with_state(Arc::new(state))
}

/// Locks the session and, if it has never connected (or a previous attempt
/// failed), makes one more connect attempt before giving up on the request.
async fn ensure_connected(state: &AppState) -> bool {
    let mut session = state.session.lock().await;
    if session.is_connected() {
        return true;
    }
    info!("robot not connected, attempting to connect");
    match session.connect().await {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "robot connection failed");
            false
        }
    }
}

fn not_connected() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "robot not connected" })),
    )
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connected = state.session.lock().await.is_connected();
    Json(json!({ "status": "ok", "robot_connected": connected }))
}

async fn think(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if !ensure_connected(&state).await {
        return not_connected();
    }
    let session = state.session.clone();
    tokio::spawn(async move {
        if let Err(err) = session.lock().await.think().await {
            warn!(%err, "think choreography failed");
        }
    });
    (StatusCode::OK, Json(json!({ "status": "thinking" })))
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub color: Option<String>,
}

async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestRequest>,
) -> (StatusCode, Json<Value>) {
    let Some(color) = request.color.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing color" })),
        );
    };
    if !ensure_connected(&state).await {
        return not_connected();
    }

    state.suggest.send_replace(SuggestState::pending(color.clone()));

    let session = state.session.clone();
    let progress = state.suggest.clone();
    let task_color = color.clone();
    tokio::spawn(async move {
        if let Err(err) = session.lock().await.find_answer(&task_color).await {
            warn!(%err, color = %task_color, "find_answer choreography failed");
        }
        // Done either way; the frontend only waits for the robot to go quiet.
        progress.send_replace(SuggestState::done(task_color));
    });

    (
        StatusCode::OK,
        Json(json!({ "status": "suggesting", "color": color })),
    )
}

#[derive(Debug, Deserialize)]
pub struct SuggestStatusQuery {
    pub color: Option<String>,
}

async fn suggest_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestStatusQuery>,
) -> Json<SuggestState> {
    let snapshot = state.suggest.borrow().clone();

    // A status probe for a color other than the tracked one reports idle.
    if let (Some(wanted), Some(tracked)) = (&query.color, &snapshot.color) {
        if wanted != tracked {
            return Json(SuggestState {
                status: SuggestStatus::Idle,
                color: Some(wanted.clone()),
                updated_at: None,
            });
        }
    }

    Json(snapshot)
}

async fn celebrate(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if !ensure_connected(&state).await {
        return not_connected();
    }
    let session = state.session.clone();
    tokio::spawn(async move {
        if let Err(err) = session.lock().await.celebrate().await {
            warn!(%err, "celebrate choreography failed");
        }
    });
    (StatusCode::OK, Json(json!({ "status": "celebrating" })))
}

async fn sad(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if !ensure_connected(&state).await {
        return not_connected();
    }
    let session = state.session.clone();
    tokio::spawn(async move {
        if let Err(err) = session.lock().await.feel_sad().await {
            warn!(%err, "feel_sad choreography failed");
        }
    });
    (StatusCode::OK, Json(json!({ "status": "sad" })))
}

/// Runs rollback to completion before replying, so the caller knows the
/// robot is back where it started by the time the response lands.
async fn rollback(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if !ensure_connected(&state).await {
        return not_connected();
    }
    let mut session = state.session.lock().await;
    let undone = session.movement_history().len();
    match session.rollback().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "rolled back", "undone": undone })),
        ),
        Err(err) => {
            warn!(%err, "rollback failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
        }
    }
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<Movement>> {
    let session = state.session.lock().await;
    Json(session.movement_history().to_vec())
}
