use axum::{
    extract::{FromRef, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ActivateRequest, AuthResponse, ForgotRequest, LoginRequest, MessageResponse,
            PublicUser, RefreshRequest, ResetRequest, SignupRequest,
        },
        providers::list_providers,
        repo::NewUser,
        repo_types::User,
        services::{
            hash_password, validate_password, validate_signup, verify_password, AuthUser, JwtKeys,
        },
        tokens::{ActionTokenKeys, TokenPurpose},
    },
    error::AuthError,
    mailer::{MailKind, OutboundMail},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/activate", put(activate))
        .route("/auth/forgot", post(forgot))
        .route("/auth/reset", post(reset))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/providers", get(list_providers))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn action_link(base: &str, path: &str, token: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), path, token)
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();
    validate_signup(&payload)?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "signup duplicate email");
        return Err(AuthError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    let name = format!("{} {}", payload.first_name.trim(), payload.last_name.trim());
    let user = User::create(
        &state.db,
        &NewUser {
            name: &name,
            email: &payload.email,
            phone: payload.phone.trim(),
            password_hash: &hash,
        },
    )
    .await?;

    let keys = ActionTokenKeys::from_ref(&state);
    let token = keys.issue(TokenPurpose::Activation, user.id)?;
    let mail = OutboundMail {
        to: user.email.clone(),
        recipient_name: user.name.clone(),
        subject: "Activate your account".into(),
        link: action_link(&state.config.app_url, "activate", &token),
        kind: MailKind::Activation,
    };
    // The row is committed; a delivery failure must not undo the signup.
    if let Err(e) = state.mailer.send(&mail).await {
        error!(error = %e, user_id = %user.id, "activation mail delivery failed");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(MessageResponse {
        message: "Registration successful! Please check your email to activate your account."
            .into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn activate(
    State(state): State<AppState>,
    Json(payload): Json<ActivateRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let keys = ActionTokenKeys::from_ref(&state);
    let user_id = keys.verify(TokenPurpose::Activation, &payload.token)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    if user.email_verified {
        warn!(user_id = %user.id, "activation of already verified account");
        return Err(AuthError::AlreadyVerified);
    }

    User::mark_email_verified(&state.db, user.id).await?;

    info!(user_id = %user.id, "account activated");
    Ok(Json(MessageResponse {
        message: "Your account has been successfully verified.".into(),
    }))
}

const FORGOT_MESSAGE: &str =
    "If that email address is registered, a password reset link has been sent.";

#[instrument(skip(state, payload))]
pub async fn forgot(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();

    // Same response either way; an unknown address must not be observable.
    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        info!("password reset requested for unknown email");
        return Ok(Json(MessageResponse {
            message: FORGOT_MESSAGE.into(),
        }));
    };

    let keys = ActionTokenKeys::from_ref(&state);
    let token = keys.issue(TokenPurpose::Reset, user.id)?;
    let mail = OutboundMail {
        to: user.email.clone(),
        recipient_name: user.name.clone(),
        subject: "Reset your password".into(),
        link: action_link(&state.config.app_url, "reset", &token),
        kind: MailKind::PasswordReset,
    };
    // Nothing was committed yet, so a delivery failure fails the request.
    state.mailer.send(&mail).await?;

    info!(user_id = %user.id, "password reset mail dispatched");
    Ok(Json(MessageResponse {
        message: FORGOT_MESSAGE.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let keys = ActionTokenKeys::from_ref(&state);
    let user_id = keys.verify(TokenPurpose::Reset, &payload.token)?;
    validate_password(&payload.password)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    let hash = hash_password(&payload.password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password updated");
    Ok(Json(MessageResponse {
        message: "Your account password has been successfully updated.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!("login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AuthError::InvalidCredentials)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Json(PublicUser::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_links_embed_the_token_under_the_flow_path() {
        assert_eq!(
            action_link("http://localhost:3000", "activate", "tok123"),
            "http://localhost:3000/activate/tok123"
        );
        assert_eq!(
            action_link("https://app.example.com/", "reset", "tok456"),
            "https://app.example.com/reset/tok456"
        );
    }

    #[test]
    fn message_response_serializes_as_message_field() {
        let response = MessageResponse {
            message: "Your account has been successfully verified.".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            "{\"message\":\"Your account has been successfully verified.\"}"
        );
    }
}
