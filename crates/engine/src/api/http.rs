//! HTTP routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use taleforge_domain::{GameSettings, Genre, Language, SessionId};

use super::dto::{
    CreateSessionResponse, GenreInfo, LanguageInfo, SelectOptionRequest, SessionListResponse,
    SessionViewResponse,
};
use crate::app::App;
use crate::use_cases::{SessionError, StoryError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/genres", get(list_genres))
        .route("/api/languages", get(list_languages))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route(
            "/api/sessions/{id}",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/select", post(select_option))
}

async fn health() -> &'static str {
    "OK"
}

async fn list_genres() -> Json<Vec<GenreInfo>> {
    Json(Genre::all().iter().copied().map(GenreInfo::from).collect())
}

async fn list_languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::all()
            .iter()
            .copied()
            .map(LanguageInfo::from)
            .collect(),
    )
}

// =============================================================================
// Sessions
// =============================================================================

async fn create_session(
    State(app): State<Arc<App>>,
    Json(settings): Json<GameSettings>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let id = app.sessions.create(settings).await?;
    let view = app.sessions.view(id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id,
            view: view.into(),
        }),
    ))
}

async fn list_sessions(State(app): State<Arc<App>>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: app.sessions.list(),
    })
}

async fn get_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionViewResponse>, ApiError> {
    let view = app.sessions.view(SessionId::from_uuid(id)).await?;
    Ok(Json(view.into()))
}

async fn select_option(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectOptionRequest>,
) -> Result<(StatusCode, Json<SessionViewResponse>), ApiError> {
    let view = app
        .sessions
        .select(SessionId::from_uuid(id), request.index)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(view.into())))
}

async fn delete_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if app.sessions.remove(SessionId::from_uuid(id)) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => ApiError::NotFound,
            SessionError::Story(story) => match story {
                StoryError::InvalidPhase { .. } => ApiError::Conflict(story.to_string()),
                StoryError::UnknownOption { .. } | StoryError::OptionNotOffered(_) => {
                    ApiError::BadRequest(story.to_string())
                }
                StoryError::Generation(_) => ApiError::Internal(story.to_string()),
            },
        }
    }
}
