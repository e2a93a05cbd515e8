use super::state::AppState;
use crate::bus::BusMessage;
use crate::history::RecordId;
use crate::protocol::{Ack, Background, Command, Response};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ControlStreamQuery {
    /// Location of the surface (page URL)
    pub location: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /messages
/// Deliver one command to the background
pub async fn dispatch(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<Response> {
    Json(state.background.handle(command).await)
}

/// GET /events
/// Status and notice broadcast; starts with the current status
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let background = &state.background;
    let rx = background.broadcaster().subscribe();
    let current = BusMessage::Status(background.controller().status().await);

    let live = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => return Some((message, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, {} messages skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let stream = stream::iter([current]).chain(live).map(|message| {
        let name = match &message {
            BusMessage::Status(_) => "status",
            BusMessage::Notice(_) => "notice",
        };
        Event::default().event(name).json_data(&message)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /surfaces/:surface_id/control?location=...
/// Control actions for one surface, for as long as it keeps the stream open
pub async fn control_stream(
    State(state): State<AppState>,
    Path(surface_id): Path<String>,
    Query(query): Query<ControlStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let registration = state
        .background
        .register_surface(&surface_id, &query.location)
        .await;

    let guard = SurfaceGuard {
        background: Arc::clone(&state.background),
        id: registration.id,
        token: registration.token,
    };

    let stream = stream::unfold(
        (registration.control, guard),
        |(mut control, guard)| async move {
            let action = control.recv().await?;
            Some((action, (control, guard)))
        },
    )
    .map(|action| Event::default().event("control").json_data(action));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.background.handle(Command::GetStatus).await)
}

/// GET /history
pub async fn get_history(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.background.handle(Command::GetHistory).await)
}

/// DELETE /history
pub async fn clear_history(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.background.handle(Command::ClearHistory).await)
}

/// DELETE /history/:id
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<f64>,
) -> impl IntoResponse {
    let id = RecordId::from_f64(id);

    if state.background.history().get(id).await.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(Response::Ack(Ack::failed(format!("Recording {} not found", id)))),
        );
    }

    let response = state
        .background
        .handle(Command::DeleteRecording { id })
        .await;

    let status = if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(response))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Raises the surface-closed signal when a control stream is dropped
struct SurfaceGuard {
    background: Arc<Background>,
    id: String,
    token: u64,
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        let background = Arc::clone(&self.background);
        let id = std::mem::take(&mut self.id);
        let token = self.token;

        info!("Control stream for surface {} closed", id);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    background.surface_closed(&id, token).await;
                });
            }
            Err(_) => warn!("No runtime to report surface {} closing", id),
        }
    }
}
