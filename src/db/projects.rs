use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;

pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// Unscoped listing, admin read-all.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    hourly_rate: f64,
    rate_currency: &str,
    committed_weekly_hours: f64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects (owner_id, name, hourly_rate, rate_currency, committed_weekly_hours)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .bind(hourly_rate)
    .bind(rate_currency)
    .bind(committed_weekly_hours)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Row-locked read, used inside timer transactions.
pub async fn find_by_id_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Lock every other running project of the same owner. Scoped to the owner:
/// starting a timer must never touch somebody else's projects.
pub async fn lock_running_for_owner<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    owner_id: Uuid,
    exclude: Uuid,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects
         WHERE owner_id = $1 AND id <> $2 AND is_running
         FOR UPDATE",
    )
    .bind(owner_id)
    .bind(exclude)
    .fetch_all(executor)
    .await
}

pub async fn set_running<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    start_time: i64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET is_running = TRUE, start_time = $2, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(start_time)
    .fetch_one(executor)
    .await
}

/// Stop the timer and fold the finished session's seconds into the
/// aggregate in a single statement.
pub async fn stop_running<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    add_seconds: i64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET is_running = FALSE, start_time = NULL,
             total_time = total_time + $2, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(add_seconds)
    .fetch_one(executor)
    .await
}

pub async fn clear_running<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE projects SET is_running = FALSE, start_time = NULL, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Apply a signed delta to `total_time`, clamped so the aggregate never
/// goes negative.
pub async fn add_total_time<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    delta: i64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET total_time = GREATEST(total_time + $2, 0), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(delta)
    .fetch_one(executor)
    .await
}

/// Re-derive the aggregate from the closed sessions that remain. Used after
/// bulk deletes, where an incremental delta would drift.
pub async fn rederive_total_time<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET total_time = COALESCE((
                 SELECT SUM(duration) FROM time_sessions
                 WHERE project_id = $1 AND end_time IS NOT NULL
             ), 0),
             updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn update_fields(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    hourly_rate: f64,
    rate_currency: &str,
    committed_weekly_hours: f64,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET name = $2, hourly_rate = $3, rate_currency = $4,
             committed_weekly_hours = $5, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(hourly_rate)
    .bind(rate_currency)
    .bind(committed_weekly_hours)
    .fetch_one(pool)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
