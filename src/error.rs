//! Error taxonomy for authoring operations and its HTTP rendering.
//!
//! Every error is local to one user action: validation-class errors are
//! corrected by the author and resubmitted, store errors are surfaced as a
//! generic failure banner. Nothing here is fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::domain::{GameType, Subject};

/// One unmet field constraint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Violation { field: field.into(), message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    #[error("stage validation failed: {}", summarize(.violations))]
    ValidationFailed { violations: Vec<Violation> },

    #[error("missing required field: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("a level needs at least one stage")]
    EmptyStageList,

    #[error("{game_type} levels allow at most {limit} stage(s)")]
    TooManyStages { game_type: GameType, limit: usize },

    #[error("game type '{game_type}' is not defined for subject {subject}")]
    UnknownGameType { subject: Subject, game_type: String },

    #[error("unknown subject '{0}'")]
    UnknownSubject(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("cannot {action} while at step {step}")]
    InvalidTransition { step: &'static str, action: &'static str },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T, E = AuthoringError> = std::result::Result<T, E>;

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AuthoringError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AuthoringError::NotFound { entity, id: id.into() }
    }

    /// Stable machine-readable code shared by HTTP and WebSocket replies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthoringError::ValidationFailed { .. } => "VALIDATION_FAILED",
            AuthoringError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            AuthoringError::EmptyStageList => "EMPTY_STAGE_LIST",
            AuthoringError::TooManyStages { .. } => "TOO_MANY_STAGES",
            AuthoringError::UnknownGameType { .. } => "UNKNOWN_GAME_TYPE",
            AuthoringError::UnknownSubject(_) => "UNKNOWN_SUBJECT",
            AuthoringError::NotFound { .. } => "NOT_FOUND",
            AuthoringError::AlreadyExists { .. } => "ALREADY_EXISTS",
            AuthoringError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AuthoringError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AuthoringError::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            AuthoringError::ValidationFailed { violations } => violations,
            _ => &[],
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthoringError::ValidationFailed { .. }
            | AuthoringError::MissingRequiredField { .. }
            | AuthoringError::EmptyStageList
            | AuthoringError::TooManyStages { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AuthoringError::UnknownGameType { .. }
            | AuthoringError::UnknownSubject(_)
            | AuthoringError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthoringError::NotFound { .. } => StatusCode::NOT_FOUND,
            AuthoringError::AlreadyExists { .. } | AuthoringError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AuthoringError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuthoringError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "levelcraft", code = self.code(), error = %self, "Request failed");
        } else {
            info!(target: "authoring", code = self.code(), error = %self, "Request rejected");
        }

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if !self.violations().is_empty() {
            body["violations"] = json!(self.violations());
        }
        (status, axum::Json(body)).into_response()
    }
}
