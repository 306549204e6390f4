//! Server configuration from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `DATABASE_URL` | required |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `ALLOWED_ORIGINS` | `FRONTEND_ORIGIN`, else `http://localhost:3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `RUN_MIGRATIONS` | `true` |
//! | `LOG_FORMAT` | `text` |
//! | `LOG_FILE` | stdout only |
//! | `LOG_ANSI` | auto |

use axum::http::HeaderValue;
use notekeep_core::{Error, Result};
use notekeep_db::pool::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Also write to this file (daily rotation)
    pub file: Option<String>,
    /// Force ANSI colors on or off
    pub ansi: Option<bool>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            json: lookup("LOG_FORMAT").is_some_and(|v| v.trim().eq_ignore_ascii_case("json")),
            file: lookup("LOG_FILE").filter(|v| !v.trim().is_empty()),
            ansi: lookup("LOG_ANSI").map(|v| parse_bool(&v)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<HeaderValue>,
    pub max_connections: u32,
    pub run_migrations: bool,
    pub log: LogConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_string()))?;

        let host = lookup("HOST")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Config(format!(
                        "DB_MAX_CONNECTIONS must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let origins = lookup("ALLOWED_ORIGINS")
            .or_else(|| lookup("FRONTEND_ORIGIN"))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins: parse_allowed_origins(&origins),
            max_connections,
            run_migrations: lookup("RUN_MIGRATIONS").map_or(true, |v| parse_bool(&v)),
            log: LogConfig::from_lookup(&lookup),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a comma-separated origin list. Invalid entries are skipped with a
/// warning; an empty result falls back to [`DEFAULT_ALLOWED_ORIGIN`].
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "*" || !(trimmed.starts_with("http://") || trimmed.starts_with("https://"))
            {
                tracing::warn!("Ignoring invalid CORS origin '{}'", trimmed);
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN)]
    } else {
        origins
    }
}

/// Replace the password in a connection URL for logging.
pub fn redact_database_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => url.to_string(),
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ApiConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/n")]))
                .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.run_migrations);
        assert_eq!(config.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN]);
        assert_eq!(
            config.log,
            LogConfig {
                json: false,
                file: None,
                ansi: None
            }
        );
    }

    #[test]
    fn test_database_url_required() {
        let err = ApiConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ApiConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("RUN_MIGRATIONS", "false"),
            ("LOG_FORMAT", "JSON"),
            ("LOG_FILE", "/var/log/notekeep.log"),
            ("LOG_ANSI", "0"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.max_connections, 3);
        assert!(!config.run_migrations);
        assert!(config.log.json);
        assert_eq!(config.log.file.as_deref(), Some("/var/log/notekeep.log"));
        assert_eq!(config.log.ansi, Some(false));
    }

    #[test]
    fn test_invalid_numbers_are_config_errors() {
        for pairs in [
            [("DATABASE_URL", "postgres://db/n"), ("PORT", "http")],
            [("DATABASE_URL", "postgres://db/n"), ("PORT", "70000")],
            [("DATABASE_URL", "postgres://db/n"), ("DB_MAX_CONNECTIONS", "0")],
        ] {
            assert!(matches!(
                ApiConfig::from_lookup(lookup_from(&pairs)),
                Err(Error::Config(_))
            ));
        }
    }

    #[test]
    fn test_frontend_origin_fallback() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("FRONTEND_ORIGIN", "https://notes.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.allowed_origins, vec!["https://notes.example.com"]);

        let config = ApiConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/n"),
            ("FRONTEND_ORIGIN", "https://notes.example.com"),
            ("ALLOWED_ORIGINS", "https://a.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.allowed_origins, vec!["https://a.example.com"]);
    }

    #[test]
    fn test_parse_allowed_origins() {
        let origins = parse_allowed_origins("https://a.example.com, http://localhost:3000/ ,");
        assert_eq!(
            origins,
            vec!["https://a.example.com", "http://localhost:3000"]
        );

        let origins = parse_allowed_origins("*,not-a-url,https://ok.example.com");
        assert_eq!(origins, vec!["https://ok.example.com"]);

        assert_eq!(parse_allowed_origins(""), vec![DEFAULT_ALLOWED_ORIGIN]);
        assert_eq!(parse_allowed_origins("*"), vec![DEFAULT_ALLOWED_ORIGIN]);
    }

    #[test]
    fn test_redact_database_url() {
        assert_eq!(
            redact_database_url("postgres://notekeep:s3cret@db:5432/notekeep"),
            "postgres://notekeep:***@db:5432/notekeep"
        );
        assert_eq!(
            redact_database_url("postgres://db:5432/notekeep"),
            "postgres://db:5432/notekeep"
        );
        assert_eq!(
            redact_database_url("postgres://user@db/notekeep"),
            "postgres://user@db/notekeep"
        );
    }
}
