use axum::{
    extract::{FromRef, Multipart, State},
    Json,
};
use time::{format_description::FormatItem, macros::format_description, Date};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginBody, RegisterForm},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{NewUser, User},
    },
    error::ApiError,
    state::AppState,
    uploads,
};

const BIRTHDATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AuthResponse>, ApiError> {
    let form = RegisterForm::from_multipart(multipart).await?;

    // Duplicate check before any side effect: a 409 must leave no asset
    // file and no row behind.
    if User::find_by_email(&state.db, &form.email).await?.is_some() {
        warn!(email = %form.email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let password_hash = hash_password(&form.password)?;

    let birthdate = Date::parse(&form.birthdate, BIRTHDATE_FORMAT).map_err(|e| {
        warn!(error = %e, "unparseable birthdate");
        ApiError::InvalidBirthdate
    })?;

    let image_path = uploads::store(
        &state.config.upload_dir,
        &form.image.bytes,
        &form.image.original_name,
    )
    .await?;

    let user = match User::create(
        &state.db,
        NewUser {
            dog_name: &form.dog_name,
            email: &form.email,
            password_hash: &password_hash,
            birthdate,
            description: &form.description,
            image_path: &image_path,
        },
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            // Lost the check-then-insert race (or the store failed): the
            // asset was already written, so take it back out.
            uploads::remove(&state.config.upload_dir, &image_path).await;
            return Err(e.into());
        }
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    LoginBody(payload): LoginBody,
) -> Result<Json<AuthResponse>, ApiError> {
    // Unknown email and wrong password produce the same response so that
    // login cannot be used to probe which emails are registered.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}
