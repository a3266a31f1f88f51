use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::ActionTokenConfig, state::AppState};

/// What a lifecycle token entitles its holder to do.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Activation,
    Reset,
}

/// Claims carried by activation and password-reset tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: Uuid,              // user ID
    pub exp: usize,             // expiration time
    pub iat: usize,             // issued at
    pub iss: String,            // issuer
    pub aud: String,            // audience
    pub purpose: TokenPurpose,  // activation or reset
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

/// Signs and verifies the short-lived tokens embedded in activation and
/// password-reset links. Each purpose carries its own secret, so a token
/// minted for one flow cannot verify in the other even before the purpose
/// claim is compared.
#[derive(Clone)]
pub struct ActionTokenKeys {
    activation_encoding: EncodingKey,
    activation_decoding: DecodingKey,
    reset_encoding: EncodingKey,
    reset_decoding: DecodingKey,
    issuer: String,
    audience: String,
    activation_ttl: TimeDuration,
    reset_ttl: TimeDuration,
}

impl FromRef<AppState> for ActionTokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let ActionTokenConfig {
            activation_secret,
            reset_secret,
            activation_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.tokens.clone();
        Self {
            activation_encoding: EncodingKey::from_secret(activation_secret.as_bytes()),
            activation_decoding: DecodingKey::from_secret(activation_secret.as_bytes()),
            reset_encoding: EncodingKey::from_secret(reset_secret.as_bytes()),
            reset_decoding: DecodingKey::from_secret(reset_secret.as_bytes()),
            issuer: state.config.jwt.issuer.clone(),
            audience: state.config.jwt.audience.clone(),
            activation_ttl: TimeDuration::minutes(activation_ttl_minutes),
            reset_ttl: TimeDuration::minutes(reset_ttl_minutes),
        }
    }
}

impl ActionTokenKeys {
    fn encoding(&self, purpose: TokenPurpose) -> &EncodingKey {
        match purpose {
            TokenPurpose::Activation => &self.activation_encoding,
            TokenPurpose::Reset => &self.reset_encoding,
        }
    }

    fn decoding(&self, purpose: TokenPurpose) -> &DecodingKey {
        match purpose {
            TokenPurpose::Activation => &self.activation_decoding,
            TokenPurpose::Reset => &self.reset_decoding,
        }
    }

    fn ttl(&self, purpose: TokenPurpose) -> TimeDuration {
        match purpose {
            TokenPurpose::Activation => self.activation_ttl,
            TokenPurpose::Reset => self.reset_ttl,
        }
    }

    fn issue_with_ttl(
        &self,
        purpose: TokenPurpose,
        user_id: Uuid,
        ttl: TimeDuration,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = ActionClaims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            purpose,
        };
        let token = encode(&Header::default(), &claims, self.encoding(purpose))?;
        debug!(user_id = %user_id, purpose = ?purpose, "action token signed");
        Ok(token)
    }

    /// Sign a token for `purpose`. Stateless; nothing is stored server-side.
    pub fn issue(&self, purpose: TokenPurpose, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_with_ttl(purpose, user_id, self.ttl(purpose))
    }

    /// Verify signature, expiry and purpose, returning the embedded user id.
    pub fn verify(&self, purpose: TokenPurpose, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data =
            decode::<ActionClaims>(token, self.decoding(purpose), &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        if data.claims.purpose != purpose {
            return Err(TokenError::Invalid);
        }

        debug!(user_id = %data.claims.sub, purpose = ?purpose, "action token verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(activation_secret: &str, reset_secret: &str) -> ActionTokenKeys {
        ActionTokenKeys {
            activation_encoding: EncodingKey::from_secret(activation_secret.as_bytes()),
            activation_decoding: DecodingKey::from_secret(activation_secret.as_bytes()),
            reset_encoding: EncodingKey::from_secret(reset_secret.as_bytes()),
            reset_decoding: DecodingKey::from_secret(reset_secret.as_bytes()),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            activation_ttl: TimeDuration::minutes(60),
            reset_ttl: TimeDuration::minutes(60),
        }
    }

    #[test]
    fn issue_and_verify_activation_token() {
        let keys = make_keys("activation-secret", "reset-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue(TokenPurpose::Activation, user_id).expect("issue");
        let decoded = keys
            .verify(TokenPurpose::Activation, &token)
            .expect("verify");
        assert_eq!(decoded, user_id);
    }

    #[test]
    fn issue_and_verify_reset_token() {
        let keys = make_keys("activation-secret", "reset-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue(TokenPurpose::Reset, user_id).expect("issue");
        let decoded = keys.verify(TokenPurpose::Reset, &token).expect("verify");
        assert_eq!(decoded, user_id);
    }

    #[test]
    fn purposes_are_isolated_by_secret() {
        let keys = make_keys("activation-secret", "reset-secret");
        let token = keys
            .issue(TokenPurpose::Activation, Uuid::new_v4())
            .expect("issue");
        assert_eq!(
            keys.verify(TokenPurpose::Reset, &token),
            Err(TokenError::Invalid)
        );
        let token = keys
            .issue(TokenPurpose::Reset, Uuid::new_v4())
            .expect("issue");
        assert_eq!(
            keys.verify(TokenPurpose::Activation, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn purposes_are_isolated_even_with_a_shared_secret() {
        // Misconfigured deployments can end up with one secret for both
        // purposes; the purpose claim still has to reject the crossover.
        let keys = make_keys("same-secret", "same-secret");
        let token = keys
            .issue(TokenPurpose::Activation, Uuid::new_v4())
            .expect("issue");
        assert_eq!(
            keys.verify(TokenPurpose::Reset, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn expired_token_fails_as_expired() {
        let keys = make_keys("activation-secret", "reset-secret");
        let token = keys
            .issue_with_ttl(
                TokenPurpose::Activation,
                Uuid::new_v4(),
                TimeDuration::minutes(-5),
            )
            .expect("issue");
        assert_eq!(
            keys.verify(TokenPurpose::Activation, &token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn garbage_token_fails_as_invalid() {
        let keys = make_keys("activation-secret", "reset-secret");
        assert_eq!(
            keys.verify(TokenPurpose::Activation, "not-a-token"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn tampered_token_fails_as_invalid() {
        let keys = make_keys("activation-secret", "reset-secret");
        let token = keys
            .issue(TokenPurpose::Activation, Uuid::new_v4())
            .expect("issue");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert_eq!(
            keys.verify(TokenPurpose::Activation, &tampered),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn wrong_issuer_fails_as_invalid() {
        let signer = make_keys("activation-secret", "reset-secret");
        let token = signer
            .issue(TokenPurpose::Activation, Uuid::new_v4())
            .expect("issue");

        let mut verifier = make_keys("activation-secret", "reset-secret");
        verifier.issuer = "someone-else".into();
        assert_eq!(
            verifier.verify(TokenPurpose::Activation, &token),
            Err(TokenError::Invalid)
        );
    }
}
