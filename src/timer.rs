//! The timer engine. Every operation here runs in a single transaction with
//! row locks on the projects it touches, so the project aggregate
//! (`total_time`, `is_running`, `start_time`) and the session history can
//! never be observed out of sync, and two near-simultaneous starts for the
//! same owner cannot both end up running.
//!
//! Timestamps are milliseconds since epoch and are passed in by the caller;
//! the engine never reads the clock.

use sqlx::PgPool;
use uuid::Uuid;

use crate::clock;
use crate::db;
use crate::error::AppError;
use crate::models::{Project, TimeSession};
use crate::policy::Principal;

/// Start the timer on a project.
///
/// Any other running timer owned by the same principal is interrupted
/// first: its open session is closed at `now_ms` and folded into that
/// project's `total_time`, so interrupted work is recorded rather than
/// dropped. Starting an already-running project resets its `start_time`
/// and the open session's `start_time` together, so the interval a later
/// stop writes always matches the duration it records; no error is raised.
pub async fn start(
    pool: &PgPool,
    project_id: Uuid,
    principal: &Principal,
    now_ms: i64,
) -> Result<Project, AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_control_timer(project.owner_id) {
        return Err(AppError::Forbidden(
            "Only the project owner may control its timer".to_string(),
        ));
    }

    let running = db::projects::lock_running_for_owner(&mut *tx, project.owner_id, project.id).await?;
    for other in running {
        let elapsed = match other.start_time {
            Some(start) => clock::elapsed_since_start(start, now_ms),
            None => 0,
        };
        if db::sessions::close_latest_open(&mut *tx, other.id, now_ms, elapsed)
            .await?
            .is_some()
        {
            db::projects::add_total_time(&mut *tx, other.id, elapsed).await?;
        }
        db::projects::clear_running(&mut *tx, other.id).await?;
        tracing::info!(project_id = %other.id, seconds = elapsed, "interrupted running timer");
    }

    let updated = db::projects::set_running(&mut *tx, project.id, now_ms).await?;

    // Project and open session must carry the same start_time, or the
    // duration written at stop would not match the session's interval.
    match db::sessions::find_open(&mut *tx, project.id).await? {
        Some(open) => {
            db::sessions::reset_start(&mut *tx, open.id, now_ms).await?;
        }
        None => {
            db::sessions::insert_open(&mut *tx, project.id, now_ms).await?;
        }
    }

    tx.commit().await.map_err(store_conflict)?;
    Ok(updated)
}

/// Stop the timer on a project.
///
/// The session duration is `floor((now - start_time) / 1000)`, clamped to
/// zero. The project update and the session close commit together or not at
/// all. Stopping a project that is not running is a no-op and returns the
/// project unchanged.
pub async fn stop(
    pool: &PgPool,
    project_id: Uuid,
    principal: &Principal,
    now_ms: i64,
) -> Result<Project, AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_control_timer(project.owner_id) {
        return Err(AppError::Forbidden(
            "Only the project owner may control its timer".to_string(),
        ));
    }

    let Some(start) = project.start_time.filter(|_| project.is_running) else {
        return Ok(project);
    };

    let duration = clock::elapsed_since_start(start, now_ms);

    let updated = db::projects::stop_running(&mut *tx, project.id, duration).await?;

    let closed = db::sessions::close_latest_open(&mut *tx, project.id, now_ms, duration).await?;
    if closed.is_none() {
        // A running project with no open session means aggregate and
        // history have already diverged; abort instead of widening the gap.
        return Err(AppError::Conflict(
            "No open session found for running project".to_string(),
        ));
    }

    tx.commit().await.map_err(store_conflict)?;
    Ok(updated)
}

/// Rewrite a closed session's interval and apply the duration difference to
/// the parent project's aggregate, atomically.
pub async fn edit_session(
    pool: &PgPool,
    session_id: Uuid,
    new_start_ms: i64,
    new_end_ms: i64,
    principal: &Principal,
) -> Result<TimeSession, AppError> {
    if new_end_ms <= new_start_ms {
        return Err(AppError::InvalidRange(
            "End time must be after start time".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let session = db::sessions::find_by_id(&mut *tx, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    // Lock the project before re-reading the session; start/stop lock in
    // the same order.
    let project = db::projects::find_by_id_for_update(&mut *tx, session.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_manage(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this session".to_string(),
        ));
    }

    let session = db::sessions::find_by_id_for_update(&mut *tx, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if session.is_open() {
        return Err(AppError::Validation(
            "Cannot edit a session that is still running".to_string(),
        ));
    }

    let new_duration = clock::elapsed_since_start(new_start_ms, new_end_ms);
    let diff = new_duration - session.duration;

    let updated =
        db::sessions::update_interval(&mut *tx, session.id, new_start_ms, new_end_ms, new_duration)
            .await?;
    db::projects::add_total_time(&mut *tx, project.id, diff).await?;

    tx.commit().await.map_err(store_conflict)?;
    Ok(updated)
}

/// Delete a session and subtract its duration from the parent aggregate
/// (clamped at zero). Deleting the open session of a running project also
/// stops the project, so `is_running` stays true only while an open session
/// exists.
pub async fn delete_session(
    pool: &PgPool,
    session_id: Uuid,
    principal: &Principal,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let session = db::sessions::find_by_id(&mut *tx, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let project = db::projects::find_by_id_for_update(&mut *tx, session.project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_manage(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this session".to_string(),
        ));
    }

    let session = db::sessions::find_by_id_for_update(&mut *tx, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    db::sessions::delete(&mut *tx, session.id).await?;
    db::projects::add_total_time(&mut *tx, project.id, -session.duration).await?;

    if session.is_open() && project.is_running {
        db::projects::clear_running(&mut *tx, project.id).await?;
    }

    tx.commit().await.map_err(store_conflict)?;
    Ok(())
}

/// Delete a project together with all its sessions. No orphans: both
/// deletions happen in one transaction (the FK cascade is a backstop).
pub async fn delete_project(
    pool: &PgPool,
    project_id: Uuid,
    principal: &Principal,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_manage(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let removed = db::sessions::delete_by_project(&mut *tx, project.id).await?;
    db::projects::delete(&mut *tx, project.id).await?;

    tx.commit().await.map_err(store_conflict)?;
    tracing::info!(project_id = %project_id, sessions = removed, "project deleted");
    Ok(())
}

/// Delete every session of the project that started in the current week
/// (Monday 00:00 UTC onward), then re-derive `total_time` from the closed
/// sessions that remain. If the open session fell inside the window the
/// running flag is cleared too.
pub async fn reset_week(
    pool: &PgPool,
    project_id: Uuid,
    principal: &Principal,
    now_ms: i64,
) -> Result<Project, AppError> {
    let mut tx = pool.begin().await?;

    let project = db::projects::find_by_id_for_update(&mut *tx, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if !principal.can_manage(project.owner_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this project".to_string(),
        ));
    }

    let week_start = clock::week_start_ms(now_ms);
    let removed = db::sessions::delete_since(&mut *tx, project.id, week_start).await?;

    let mut updated = db::projects::rederive_total_time(&mut *tx, project.id).await?;

    if updated.is_running && db::sessions::find_open(&mut *tx, project.id).await?.is_none() {
        db::projects::clear_running(&mut *tx, project.id).await?;
        updated = db::projects::find_by_id(&mut *tx, project.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    }

    tx.commit().await.map_err(store_conflict)?;
    tracing::info!(project_id = %project_id, sessions = removed, "week reset");
    Ok(updated)
}

fn store_conflict(err: sqlx::Error) -> AppError {
    AppError::Conflict(format!("Store write failed, retry the operation: {err}"))
}
