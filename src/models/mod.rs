pub mod audit_event;
pub mod project;
pub mod refresh_token;
pub mod session;
pub mod user;

pub use audit_event::AuditEvent;
pub use project::{Currency, Project};
pub use refresh_token::RefreshToken;
pub use session::TimeSession;
pub use user::User;
