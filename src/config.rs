use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub registration: RegistrationMode,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("TIMECLOCK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TIMECLOCK_HOST: {e}"))?;

        let port: u16 = env_or("TIMECLOCK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid TIMECLOCK_PORT: {e}"))?;

        let registration = match env_or("TIMECLOCK_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        let log_level = env_or("TIMECLOCK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            registration,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
