use uuid::Uuid;

use crate::models::TimeSession;

pub async fn list_by_project<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Vec<TimeSession>, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>(
        "SELECT * FROM time_sessions WHERE project_id = $1 ORDER BY start_time DESC",
    )
    .bind(project_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_open<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    start_time: i64,
) -> Result<TimeSession, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>(
        "INSERT INTO time_sessions (project_id, start_time, end_time, duration)
         VALUES ($1, $2, NULL, 0) RETURNING *",
    )
    .bind(project_id)
    .bind(start_time)
    .fetch_one(executor)
    .await
}

pub async fn find_open<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Option<TimeSession>, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>(
        "SELECT * FROM time_sessions WHERE project_id = $1 AND end_time IS NULL",
    )
    .bind(project_id)
    .fetch_optional(executor)
    .await
}

/// Close the most recently created open session of a project. Returns None
/// when there was nothing open to close.
pub async fn close_latest_open<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    end_time: i64,
    duration: i64,
) -> Result<Option<TimeSession>, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>(
        "UPDATE time_sessions SET end_time = $2, duration = $3
         WHERE id = (
             SELECT id FROM time_sessions
             WHERE project_id = $1 AND end_time IS NULL
             ORDER BY created_at DESC LIMIT 1
         )
         RETURNING *",
    )
    .bind(project_id)
    .bind(end_time)
    .bind(duration)
    .fetch_optional(executor)
    .await
}

/// Move an open session's start. Used when a running timer is restarted.
pub async fn reset_start<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    start_time: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE time_sessions SET start_time = $2 WHERE id = $1 AND end_time IS NULL")
        .bind(id)
        .bind(start_time)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<TimeSession>, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>("SELECT * FROM time_sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<TimeSession>, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>("SELECT * FROM time_sessions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn update_interval<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    start_time: i64,
    end_time: i64,
    duration: i64,
) -> Result<TimeSession, sqlx::Error> {
    sqlx::query_as::<_, TimeSession>(
        "UPDATE time_sessions SET start_time = $2, end_time = $3, duration = $4
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(start_time)
    .bind(end_time)
    .bind(duration)
    .fetch_one(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM time_sessions WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete_by_project<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM time_sessions WHERE project_id = $1")
        .bind(project_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every session of a project that started at or after `since` (ms).
pub async fn delete_since<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    since: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM time_sessions WHERE project_id = $1 AND start_time >= $2",
    )
    .bind(project_id)
    .bind(since)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
