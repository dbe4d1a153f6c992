use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;
use crate::view::ProjectView;

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

/// Delete a user and, through the cascade, every project and session they
/// own.
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let removed = db::users::delete(&state.pool, id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.deleted",
        "user",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn list_user_projects(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    auth.require_admin()?;
    let now_ms = Utc::now().timestamp_millis();
    let principal = auth.principal();

    let owner = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let projects = db::projects::list_by_owner(&state.pool, owner.id).await?;

    let mut views = Vec::with_capacity(projects.len());
    for project in projects {
        let sessions = db::sessions::list_by_project(&state.pool, project.id).await?;
        views.push(ProjectView::build(
            project,
            sessions,
            now_ms,
            &principal,
            Some(owner.email.clone()),
        ));
    }
    Ok(Json(views))
}
