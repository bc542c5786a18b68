use crate::spreadsheet::DEFAULT_PREVIEW_ROWS;
use chrono::Duration;
use std::{env, str::FromStr};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_MB: usize = 10;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 12 * 60;
const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;
const MAX_PREVIEW_ROWS: usize = 10_000;
const DEFAULT_MAX_SESSIONS: usize = 1_000;
const MAX_SESSIONS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub preview_rows: usize,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let upload_mb = read_var(&lookup, "DASHBOARD_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB);
        let ttl_minutes = read_var(&lookup, "DASHBOARD_SESSION_TTL_MINUTES", DEFAULT_SESSION_TTL_MINUTES);

        Self {
            port: read_var(&lookup, "PORT", DEFAULT_PORT),
            max_upload_bytes: upload_mb.clamp(1, 1024) * 1024 * 1024,
            preview_rows: read_var(&lookup, "DASHBOARD_PREVIEW_ROWS", DEFAULT_PREVIEW_ROWS).clamp(1, MAX_PREVIEW_ROWS),
            session_ttl: Duration::minutes(ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES)),
            max_sessions: read_var(&lookup, "DASHBOARD_MAX_SESSIONS", DEFAULT_MAX_SESSIONS).clamp(1, MAX_SESSIONS),
        }
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("invalid {key}={raw:?}, using {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.preview_rows, 25);
        assert_eq!(config.session_ttl, Duration::hours(12));
        assert_eq!(config.max_sessions, 1_000);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[("PORT", "9090"), ("DASHBOARD_PREVIEW_ROWS", "5"), ("DASHBOARD_MAX_UPLOAD_MB", "2")]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DASHBOARD_SESSION_TTL_MINUTES", "-")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl, Duration::hours(12));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = config_from(&[
            ("DASHBOARD_PREVIEW_ROWS", "18446744073709551615"),
            ("DASHBOARD_MAX_UPLOAD_MB", "0"),
            ("DASHBOARD_MAX_SESSIONS", "0"),
        ]);
        assert_eq!(config.preview_rows, 10_000);
        assert_eq!(config.max_upload_bytes, 1024 * 1024);
        assert_eq!(config.max_sessions, 1);

        let config = config_from(&[("DASHBOARD_PREVIEW_ROWS", "0")]);
        assert_eq!(config.preview_rows, 1);
    }
}
