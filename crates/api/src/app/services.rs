//! Service wiring: store backend selection and token issuance.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;

use ebm_auth::{hash_password, verify_password, Hs256JwtValidator, JwtClaims, Permission};
use ebm_core::DomainError;
use ebm_infra::{AppConfig, Registry, Stores};

use crate::app::dto::LoginResponse;
use crate::app::errors::ApiError;

/// Postgres stores when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_registry(config: &AppConfig) -> anyhow::Result<Registry> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; using in-memory stores");
        return Ok(Registry::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    let stores = Stores::postgres(pool).await.context("failed to prepare schema")?;
    tracing::info!("using Postgres stores");
    Ok(Registry::new(stores))
}

/// Everything the handlers reach through `Extension<Arc<AppServices>>`.
pub struct AppServices {
    registry: Registry,
    tokens: Arc<Hs256JwtValidator>,
    token_ttl: Duration,
    bootstrap_admin: Option<AdminCredentials>,
}

/// The bootstrap administrator with its password kept only as a hash.
struct AdminCredentials {
    login: String,
    password_hash: String,
}

impl AppServices {
    pub fn new(config: &AppConfig, registry: Registry, tokens: Arc<Hs256JwtValidator>) -> Self {
        let bootstrap_admin = config.bootstrap_admin.as_ref().and_then(|admin| {
            match hash_password(&admin.password) {
                Ok(password_hash) => Some(AdminCredentials {
                    login: admin.login.clone(),
                    password_hash,
                }),
                Err(error) => {
                    tracing::error!(%error, "bootstrap admin disabled: password could not be hashed");
                    None
                }
            }
        });
        Self {
            registry,
            tokens,
            token_ttl: config.jwt_ttl,
            bootstrap_admin,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Checks credentials and issues a bearer token. The bootstrap
    /// administrator, when configured, is granted the wildcard authority.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let (user_id, authorities) = match &self.bootstrap_admin {
            Some(admin) if admin.login == login => {
                if !verify_password(password, &admin.password_hash) {
                    tracing::warn!(login, "login rejected: wrong bootstrap password");
                    return Err(DomainError::Unauthorized.into());
                }
                (None, vec![Permission::WILDCARD.as_str().to_string()])
            }
            _ => {
                let user = self.registry.users().authenticate(login, password).await?;
                (user.id, user.authorities())
            }
        };

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| ApiError::Internal("token expiry out of range".into()))?;
        let claims = JwtClaims {
            sub: login.to_string(),
            user_id,
            authorities,
            issued_at: now,
            expires_at,
        };
        let token = self.tokens.issue(&claims)?;
        tracing::info!(login, "token issued");
        Ok(LoginResponse {
            token,
            token_type: "Bearer",
            expires_at: claims.expires_at,
            authorities: claims.authorities,
        })
    }
}
