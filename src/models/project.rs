use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timer state lives denormalized on the project row: `total_time` is the
/// sum of all closed session durations, `start_time` is set only while a
/// timer is running. Timestamps are milliseconds since epoch.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
    pub rate_currency: String,
    pub committed_weekly_hours: f64,
    pub total_time: i64,
    pub is_running: bool,
    pub start_time: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Currencies a project rate may be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Inr,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Inr => "INR",
        }
    }

    pub fn parse(s: &str) -> Option<Currency> {
        match s {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "JPY" => Some(Currency::Jpy),
            "CAD" => Some(Currency::Cad),
            "AUD" => Some(Currency::Aud),
            "INR" => Some(Currency::Inr),
            _ => None,
        }
    }
}
