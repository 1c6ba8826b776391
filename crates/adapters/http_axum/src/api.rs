//! JSON REST API handlers.
//!
//! - `GET  /api/entries`                    — list configured entries
//! - `GET  /api/entries/{id}/status`        — full status projection
//! - `POST /api/entries/{id}/pause`         — force-pause the thermostat
//! - `POST /api/entries/{id}/resume`        — force-resume the thermostat
//! - `POST /api/entries/{id}/recalculate`   — force a full re-evaluation

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

use zonehub_app::ports::ControlService;
use zonehub_app::status::EntryStatus;
use zonehub_domain::error::ZoneHubError;
use zonehub_domain::id::EntryId;

use crate::state::AppState;

/// Build the `/api` route tree.
pub fn routes<CS>() -> axum::Router<AppState<CS>>
where
    CS: ControlService + Send + Sync + 'static,
{
    axum::Router::new()
        .route("/entries", get(list_entries::<CS>))
        .route("/entries/{id}/status", get(entry_status::<CS>))
        .route("/entries/{id}/pause", post(pause_entry::<CS>))
        .route("/entries/{id}/resume", post(resume_entry::<CS>))
        .route("/entries/{id}/recalculate", post(recalculate_entry::<CS>))
}

/// API error payload.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Wrapper mapping [`ZoneHubError`] onto HTTP responses.
struct ApiError(ZoneHubError);

impl From<ZoneHubError> for ApiError {
    fn from(err: ZoneHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ZoneHubError::NotFound(_) => StatusCode::NOT_FOUND,
            ZoneHubError::Validation(_) => StatusCode::BAD_REQUEST,
            ZoneHubError::Command(_) | ZoneHubError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorBody {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

async fn list_entries<CS>(State(state): State<AppState<CS>>) -> Json<Vec<EntryId>>
where
    CS: ControlService + Send + Sync + 'static,
{
    Json(state.control.entries().await)
}

async fn entry_status<CS>(
    State(state): State<AppState<CS>>,
    Path(id): Path<String>,
) -> Result<Json<EntryStatus>, ApiError>
where
    CS: ControlService + Send + Sync + 'static,
{
    let status = state.control.status(&EntryId::from(id)).await?;
    Ok(Json(status))
}

async fn pause_entry<CS>(
    State(state): State<AppState<CS>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    CS: ControlService + Send + Sync + 'static,
{
    state.control.pause(&EntryId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resume_entry<CS>(
    State(state): State<AppState<CS>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    CS: ControlService + Send + Sync + 'static,
{
    state.control.resume(&EntryId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recalculate_entry<CS>(
    State(state): State<AppState<CS>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    CS: ControlService + Send + Sync + 'static,
{
    state.control.recalculate(&EntryId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
