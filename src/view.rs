//! Read model handed to clients: a project, its sessions, and every derived
//! metric computed for a single explicit `now`.

use serde::Serialize;
use uuid::Uuid;

use crate::clock;
use crate::models::{Project, TimeSession};
use crate::policy::Principal;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
    pub rate_currency: String,
    pub committed_weekly_hours: f64,
    pub total_time: i64,
    pub is_running: bool,
    pub start_time: Option<i64>,
    pub sessions: Vec<TimeSession>,
    pub current_session_seconds: i64,
    pub total_display_seconds: i64,
    pub elapsed_display: String,
    pub earnings: String,
    pub weekly_seconds: i64,
    pub weekly_progress_percent: f64,
    pub can_control_timer: bool,
    pub can_manage: bool,
    /// Only populated for admin viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl ProjectView {
    pub fn build(
        project: Project,
        sessions: Vec<TimeSession>,
        now_ms: i64,
        principal: &Principal,
        owner_email: Option<String>,
    ) -> Self {
        let current_session_seconds = clock::current_session_seconds(&project, now_ms);
        let total_display_seconds = clock::total_display_seconds(&project, now_ms);
        let weekly_seconds =
            clock::weekly_elapsed_seconds(&sessions, current_session_seconds, now_ms);

        ProjectView {
            current_session_seconds,
            total_display_seconds,
            elapsed_display: clock::format_elapsed(total_display_seconds),
            earnings: clock::earnings(total_display_seconds, project.hourly_rate),
            weekly_seconds,
            weekly_progress_percent: clock::weekly_progress_percent(
                weekly_seconds,
                project.committed_weekly_hours,
            ),
            can_control_timer: principal.can_control_timer(project.owner_id),
            can_manage: principal.can_manage(project.owner_id),
            owner_email,
            id: project.id,
            owner_id: project.owner_id,
            name: project.name,
            hourly_rate: project.hourly_rate,
            rate_currency: project.rate_currency,
            committed_weekly_hours: project.committed_weekly_hours,
            total_time: project.total_time,
            is_running: project.is_running,
            start_time: project.start_time,
            sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use chrono::Utc;

    // Monday 2024-01-08 00:00:00 UTC
    const MONDAY_MS: i64 = 1_704_672_000_000;

    fn project(owner_id: Uuid) -> Project {
        Project {
            id: Uuid::now_v7(),
            owner_id,
            name: "Client work".to_string(),
            hourly_rate: 50.0,
            rate_currency: "USD".to_string(),
            committed_weekly_hours: 10.0,
            total_time: 3600,
            is_running: false,
            start_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn closed_session(project_id: Uuid, start_ms: i64, duration: i64) -> TimeSession {
        TimeSession {
            id: Uuid::now_v7(),
            project_id,
            start_time: start_ms,
            end_time: Some(start_ms + duration * 1000),
            duration,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_view_exposes_timer_controls() {
        let owner = Uuid::now_v7();
        let p = project(owner);
        let principal = Principal {
            id: owner,
            role: Role::User,
        };
        let view = ProjectView::build(p, vec![], MONDAY_MS, &principal, None);
        assert!(view.can_control_timer);
        assert!(view.can_manage);
        assert_eq!(view.earnings, "50.00");
        assert_eq!(view.elapsed_display, "01:00:00");
        assert_eq!(view.current_session_seconds, 0);
    }

    #[test]
    fn admin_view_can_manage_but_not_control() {
        let owner = Uuid::now_v7();
        let p = project(owner);
        let admin = Principal {
            id: Uuid::now_v7(),
            role: Role::Admin,
        };
        let view = ProjectView::build(
            p,
            vec![],
            MONDAY_MS,
            &admin,
            Some("owner@example.com".to_string()),
        );
        assert!(!view.can_control_timer);
        assert!(view.can_manage);
        assert_eq!(view.owner_email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn running_timer_feeds_every_derived_metric() {
        let owner = Uuid::now_v7();
        let mut p = project(owner);
        p.is_running = true;
        p.start_time = Some(MONDAY_MS);
        let now = MONDAY_MS + 90 * 60 * 1000; // 90 minutes in
        let principal = Principal {
            id: owner,
            role: Role::User,
        };
        let sessions = vec![closed_session(p.id, MONDAY_MS - 86_400_000, 1800)];
        let view = ProjectView::build(p, sessions, now, &principal, None);

        assert_eq!(view.current_session_seconds, 5400);
        assert_eq!(view.total_display_seconds, 9000);
        assert_eq!(view.earnings, "125.00");
        // Last week's session does not count toward this week.
        assert_eq!(view.weekly_seconds, 5400);
        assert!((view.weekly_progress_percent - 15.0).abs() < 1e-9);
    }
}
