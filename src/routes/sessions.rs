use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::TimeSession;
use crate::state::SharedState;
use crate::timer;

#[derive(Deserialize)]
pub struct UpdateSession {
    pub start_time: i64,
    pub end_time: i64,
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSession>,
) -> Result<Json<TimeSession>, AppError> {
    let session = timer::edit_session(
        &state.pool,
        id,
        req.start_time,
        req.end_time,
        &auth.principal(),
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "session.updated",
        "session",
        Some(id),
        None,
    )
    .await;

    Ok(Json(session))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    timer::delete_session(&state.pool, id, &auth.principal()).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "session.deleted",
        "session",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
