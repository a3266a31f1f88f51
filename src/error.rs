use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::tokens::TokenError;

/// Everything the account endpoints can fail with. Converted to a response
/// exactly once, at the `IntoResponse` boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Warning! This email address already exists")]
    DuplicateEmail,

    #[error("This account no longer exists")]
    AccountNotFound,

    #[error("Email address is already verified")]
    AlreadyVerified,

    // Clients must not be able to tell a bad signature from a stale link,
    // so the two token variants share one message.
    #[error("This link is invalid or has expired")]
    TokenInvalid,

    #[error("This link is invalid or has expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("database error")]
    Database(#[source] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::DuplicateEmail
            | AuthError::AccountNotFound
            | AuthError::AlreadyVerified
            | AuthError::TokenInvalid
            | AuthError::TokenExpired => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            // The unique index on users.email is the race guard for
            // concurrent signups; surface it as the business conflict.
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateEmail,
            _ => AuthError::Database(e),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::TokenInvalid,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "Internal server error".to_string()
            }
            AuthError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(
            AuthError::Validation("Please fill in all the fields".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AccountNotFound.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AlreadyVerified.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn credential_errors_map_to_unauthorized() {
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn infrastructure_errors_map_to_server_error() {
        assert_eq!(
            AuthError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn expired_and_invalid_tokens_are_indistinguishable_to_clients() {
        let expired = AuthError::from(TokenError::Expired);
        let invalid = AuthError::from(TokenError::Invalid);
        assert_eq!(expired.status(), invalid.status());
        assert_eq!(expired.to_string(), invalid.to_string());
    }

    #[test]
    fn plain_database_errors_are_not_conflicts() {
        let err = AuthError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AuthError::Database(_)));
    }
}
