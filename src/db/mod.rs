pub mod audit;
pub mod projects;
pub mod refresh_tokens;
pub mod sessions;
pub mod users;
