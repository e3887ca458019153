//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use ebm_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_JWT_TTL_MINUTES: i64 = 60;
/// One year.
pub const MAX_JWT_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set together with {1}")]
    Incomplete(&'static str, &'static str),
}

/// Credentials of the built-in administrator (all authorities).
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub login: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    /// Postgres when set, in-memory stores otherwise.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let jwt_ttl = match get("JWT_TTL_MINUTES") {
            None => Duration::minutes(DEFAULT_JWT_TTL_MINUTES),
            Some(raw) => match raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_JWT_TTL_MINUTES).contains(m))
                .and_then(Duration::try_minutes)
            {
                Some(ttl) => ttl,
                None => {
                    return Err(ConfigError::Invalid {
                        var: "JWT_TTL_MINUTES",
                        value: raw,
                        reason: format!("expected between 1 and {MAX_JWT_TTL_MINUTES} minutes"),
                    });
                }
            },
        };

        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(raw) => raw.parse().map_err(|e: ebm_observability::UnknownLogFormat| ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_LOGIN"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(login), Some(password)) => Some(BootstrapAdmin { login, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete("BOOTSTRAP_ADMIN_LOGIN", "BOOTSTRAP_ADMIN_PASSWORD"));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete("BOOTSTRAP_ADMIN_PASSWORD", "BOOTSTRAP_ADMIN_LOGIN"));
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_ttl,
            database_url: get("DATABASE_URL"),
            log_format,
            bootstrap_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(c.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(c.jwt_ttl, Duration::minutes(60));
        assert_eq!(c.database_url, None);
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.bootstrap_admin, None);
    }

    #[test]
    fn reads_every_variable() {
        let c = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s"),
            ("JWT_TTL_MINUTES", "15"),
            ("DATABASE_URL", "postgres://localhost/ebm"),
            ("LOG_FORMAT", "pretty"),
            ("BOOTSTRAP_ADMIN_LOGIN", "admin"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "admin123"),
        ])
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.jwt_ttl, Duration::minutes(15));
        assert_eq!(c.log_format, LogFormat::Pretty);
        assert_eq!(c.bootstrap_admin.unwrap().login, "admin");
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(
            config(&[("JWT_TTL_MINUTES", "-1")]),
            Err(ConfigError::Invalid { var: "JWT_TTL_MINUTES", .. })
        ));
        for oversized in ["525601", "9999999999999999"] {
            assert!(matches!(
                config(&[("JWT_TTL_MINUTES", oversized)]),
                Err(ConfigError::Invalid { var: "JWT_TTL_MINUTES", .. })
            ));
        }
        assert_eq!(
            config(&[("JWT_TTL_MINUTES", "525600")]).unwrap().jwt_ttl,
            Duration::minutes(MAX_JWT_TTL_MINUTES)
        );
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(config(&[("LOG_FORMAT", "xml")]), Err(ConfigError::Invalid { .. })));
        assert!(matches!(
            config(&[("BOOTSTRAP_ADMIN_LOGIN", "admin")]),
            Err(ConfigError::Incomplete(..))
        ));
    }
}
