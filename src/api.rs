//! HTTP routes
//!
//! Every response is JSON. Failures share one envelope,
//! `{"status": "error", "message": ..., "details": ...}`, with the status
//! code taken from the error kind.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::TriageError;
use crate::models::Ticket;
use crate::service::TicketService;
use crate::validation::InputValidator;

/// Shared handler state
pub type AppState = Arc<TicketService>;

/// Build the router with all ticket routes
pub fn create_router(service: TicketService) -> Router {
    Router::new()
        .route("/ticket", post(create_ticket))
        .route("/ticket/reply", post(reply_to_ticket))
        .route("/tickets", get(list_tickets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(Arc::new(service))
}

/// An error paired with the operation it interrupted
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    error: TriageError,
}

impl ApiError {
    /// Wrap `error` raised while performing `context`
    pub const fn new(context: &'static str, error: TriageError) -> Self {
        Self { context, error }
    }

    /// HTTP status for the error kind
    pub const fn status_code(&self) -> StatusCode {
        match self.error {
            TriageError::Validation(_) => StatusCode::BAD_REQUEST,
            TriageError::NotFound(_) => StatusCode::NOT_FOUND,
            TriageError::Configuration(_) | TriageError::DataStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `message` field of the error body
    pub const fn message(&self) -> &'static str {
        match self.error {
            TriageError::Configuration(_) => "Database credentials are missing",
            TriageError::Validation(_) => "Invalid request body",
            TriageError::NotFound(_) | TriageError::DataStore(_) => self.context,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.error.kind(), "{}: {}", self.context, self.error);
        } else {
            warn!(kind = self.error.kind(), "{}: {}", self.context, self.error);
        }

        let body = json!({
            "status": "error",
            "message": self.message(),
            "details": self.error.details(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct TicketBody {
    status: &'static str,
    ticket: Ticket,
}

#[derive(Serialize)]
struct TicketListBody {
    status: &'static str,
    tickets: Vec<Ticket>,
}

#[derive(Serialize)]
struct ReplyBody {
    status: &'static str,
    updated: bool,
    ticket: Ticket,
}

fn finish<T>(
    state: &TicketService,
    operation: &'static str,
    started: Instant,
    result: Result<T, ApiError>,
) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            state.metrics().record_error(e.error.kind(), operation);
            e.error.kind()
        }
    };
    state.metrics().record_request(operation, started.elapsed(), outcome);
    result
}

/// `POST /ticket`
async fn create_ticket(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let started = Instant::now();
    let result = open_ticket(&state, &body).await;

    let ticket = finish(&state, "create_ticket", started, result)?;
    Ok((StatusCode::CREATED, Json(TicketBody { status: "ok", ticket })))
}

async fn open_ticket(state: &TicketService, body: &[u8]) -> Result<Ticket, ApiError> {
    const CONTEXT: &str = "Unable to create ticket";

    let session = state.session().map_err(|e| ApiError::new(CONTEXT, e))?;
    let org_id = InputValidator::parse_create_body(body).map_err(|e| ApiError::new(CONTEXT, e))?;
    session.create_ticket(org_id).await.map_err(|e| ApiError::new(CONTEXT, e))
}

/// `GET /tickets`
async fn list_tickets(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let started = Instant::now();
    let result = recent_tickets(&state).await;

    let tickets = finish(&state, "list_tickets", started, result)?;
    Ok(Json(TicketListBody { status: "ok", tickets }))
}

async fn recent_tickets(state: &TicketService) -> Result<Vec<Ticket>, ApiError> {
    const CONTEXT: &str = "Unable to fetch tickets";

    let session = state.session().map_err(|e| ApiError::new(CONTEXT, e))?;
    session.list_tickets().await.map_err(|e| ApiError::new(CONTEXT, e))
}

/// `POST /ticket/reply`
async fn reply_to_ticket(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse, ApiError> {
    let started = Instant::now();
    let result = score_reply(&state, &body).await;

    let ticket = finish(&state, "reply", started, result)?;
    Ok(Json(ReplyBody {
        status: "ok",
        updated: true,
        ticket,
    }))
}

async fn score_reply(state: &TicketService, body: &[u8]) -> Result<Ticket, ApiError> {
    const FETCH: &str = "Unable to fetch ticket";
    const UPDATE: &str = "Unable to update ticket";

    let session = state.session().map_err(|e| ApiError::new(UPDATE, e))?;
    let reply = InputValidator::parse_reply_body(body).map_err(|e| ApiError::new(UPDATE, e))?;

    let ticket = session
        .fetch_ticket(reply.ticket_id)
        .await
        .map_err(|e| ApiError::new(FETCH, e))?;

    session.record_reply(&ticket, reply.message).await.map_err(|e| match e {
        TriageError::NotFound(_) => ApiError::new(FETCH, e),
        other => ApiError::new(UPDATE, other),
    })
}
