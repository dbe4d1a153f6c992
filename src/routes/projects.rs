use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Currency, Project, TimeSession};
use crate::state::SharedState;
use crate::timer;
use crate::view::ProjectView;

#[derive(Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub hourly_rate: f64,
    #[serde(default = "default_currency")]
    pub rate_currency: String,
    pub committed_weekly_hours: f64,
}

#[derive(Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub hourly_rate: f64,
    pub rate_currency: String,
    pub committed_weekly_hours: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn validate_fields(
    name: &str,
    hourly_rate: f64,
    rate_currency: &str,
    committed_weekly_hours: f64,
) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        return Err(AppError::Validation(
            "Project name must be between 1 and 100 characters".to_string(),
        ));
    }
    if name.contains('<') || name.contains('>') {
        return Err(AppError::Validation(
            "Project name must not contain markup".to_string(),
        ));
    }
    if !hourly_rate.is_finite() || hourly_rate <= 0.0 || hourly_rate > 10_000.0 {
        return Err(AppError::Validation(
            "Hourly rate must be between 0 and 10,000".to_string(),
        ));
    }
    if Currency::parse(rate_currency).is_none() {
        return Err(AppError::Validation(format!(
            "Unknown currency: {rate_currency}"
        )));
    }
    if !committed_weekly_hours.is_finite()
        || committed_weekly_hours <= 0.0
        || committed_weekly_hours > 168.0
    {
        return Err(AppError::Validation(
            "Weekly hours must be between 0 and 168".to_string(),
        ));
    }
    Ok(())
}

async fn build_views(
    state: &SharedState,
    auth: &AuthUser,
    projects: Vec<Project>,
    now_ms: i64,
) -> Result<Vec<ProjectView>, AppError> {
    let principal = auth.principal();

    let emails = if principal.is_admin() {
        let ids: Vec<Uuid> = projects.iter().map(|p| p.owner_id).collect();
        db::users::email_map(&state.pool, &ids).await?
    } else {
        Default::default()
    };

    let mut views = Vec::with_capacity(projects.len());
    for project in projects {
        let sessions = db::sessions::list_by_project(&state.pool, project.id).await?;
        let owner_email = emails.get(&project.owner_id).cloned();
        views.push(ProjectView::build(
            project,
            sessions,
            now_ms,
            &principal,
            owner_email,
        ));
    }
    Ok(views)
}

/// Own projects for users; every project for admins.
pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let principal = auth.principal();

    let projects = if principal.is_admin() {
        db::projects::list_all(&state.pool).await?
    } else {
        db::projects::list_by_owner(&state.pool, principal.id).await?
    };

    Ok(Json(build_views(&state, &auth, projects, now_ms).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateProject>,
) -> Result<Json<Project>, AppError> {
    validate_fields(
        &req.name,
        req.hourly_rate,
        &req.rate_currency,
        req.committed_weekly_hours,
    )?;

    let project = db::projects::create(
        &state.pool,
        auth.user_id,
        req.name.trim(),
        req.hourly_rate,
        &req.rate_currency,
        req.committed_weekly_hours,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.created",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let principal = auth.principal();

    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_view(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let sessions = db::sessions::list_by_project(&state.pool, project.id).await?;
    let owner_email = if principal.is_admin() {
        db::users::find_by_id(&state.pool, project.owner_id)
            .await?
            .map(|u| u.email)
    } else {
        None
    };

    Ok(Json(ProjectView::build(
        project,
        sessions,
        now_ms,
        &principal,
        owner_email,
    )))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> Result<Json<Project>, AppError> {
    validate_fields(
        &req.name,
        req.hourly_rate,
        &req.rate_currency,
        req.committed_weekly_hours,
    )?;

    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !auth.principal().can_manage(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let updated = db::projects::update_fields(
        &state.pool,
        id,
        req.name.trim(),
        req.hourly_rate,
        &req.rate_currency,
        req.committed_weekly_hours,
    )
    .await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.updated",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(updated))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    timer::delete_project(&state.pool, id, &auth.principal()).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.deleted",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn start_timer(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let project = timer::start(&state.pool, id, &auth.principal(), now_ms).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "timer.started",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn stop_timer(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let project = timer::stop(&state.pool, id, &auth.principal(), now_ms).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "timer.stopped",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn reset_week(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let project = timer::reset_week(&state.pool, id, &auth.principal(), now_ms).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "project.week_reset",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(project))
}

pub async fn list_sessions(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimeSession>>, AppError> {
    let project = db::projects::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !auth.principal().can_view(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let sessions = db::sessions::list_by_project(&state.pool, project.id).await?;
    Ok(Json(sessions))
}
