use uuid::Uuid;

/// Roles known to the system. Admins can see and manage everything but have
/// no timer rights anywhere; timers are strictly owner-operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The acting identity for a request: who is asking, and in what role.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Start/stop rights. Owner-only; admins are excluded even from their
    /// own projects.
    pub fn can_control_timer(&self, owner_id: Uuid) -> bool {
        self.role != Role::Admin && self.id == owner_id
    }

    /// Edit/delete rights over a project and its sessions.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.role == Role::Admin || self.id == owner_id
    }

    pub fn can_view(&self, owner_id: Uuid) -> bool {
        self.can_manage(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::now_v7(),
            role,
        }
    }

    #[test]
    fn owner_controls_own_timer() {
        let p = principal(Role::User);
        assert!(p.can_control_timer(p.id));
        assert!(p.can_manage(p.id));
        assert!(p.can_view(p.id));
    }

    #[test]
    fn user_has_no_rights_on_others_projects() {
        let p = principal(Role::User);
        let other = Uuid::now_v7();
        assert!(!p.can_control_timer(other));
        assert!(!p.can_manage(other));
        assert!(!p.can_view(other));
    }

    #[test]
    fn admin_manages_but_never_controls_timers() {
        let p = principal(Role::Admin);
        let other = Uuid::now_v7();
        assert!(p.can_manage(other));
        assert!(p.can_view(other));
        assert!(!p.can_control_timer(other));
        // Not even their own.
        assert!(!p.can_control_timer(p.id));
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
    }
}
