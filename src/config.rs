use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Secrets and lifetimes for the tokens embedded in activation and
/// password-reset links. Each purpose signs with its own secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionTokenConfig {
    pub activation_secret: String,
    pub reset_secret: String,
    pub activation_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public base URL that activation/reset links are built against.
    pub app_url: String,
    pub mail_from: String,
    pub jwt: JwtConfig,
    pub tokens: ActionTokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let app_url = std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".into());
        let mail_from =
            std::env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@authgate.local".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authgate-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let tokens = ActionTokenConfig {
            activation_secret: std::env::var("ACTIVATION_TOKEN_SECRET")?,
            reset_secret: std::env::var("RESET_TOKEN_SECRET")?,
            activation_ttl_minutes: std::env::var("ACTIVATION_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            reset_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        Ok(Self {
            database_url,
            app_url,
            mail_from,
            jwt,
            tokens,
        })
    }
}
