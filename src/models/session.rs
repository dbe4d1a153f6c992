use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One contiguous interval of tracked work. `end_time = NULL` means the
/// session is open (its timer is running); `duration` is only meaningful
/// once the session is closed.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TimeSession {
    pub id: Uuid,
    pub project_id: Uuid,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub duration: i64,
    pub created_at: DateTime<Utc>,
}

impl TimeSession {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
