use axum::extract::FromRef;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, SignUpRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_dummy, verify_password},
        repo_types::NewUser,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(st, req))]
pub async fn register(st: &AppState, req: SignUpRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);

    if st.users.exists_by_email(&email).await? {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateUser);
    }

    let password_hash = hash_password(&req.password)?;
    let new_user = NewUser {
        first_name: req.first_name.trim().to_string(),
        last_name: req
            .last_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        email,
        password_hash,
    };

    let user = st.users.create(new_user).await?.ok_or_else(|| {
        warn!("email registered concurrently");
        AppError::DuplicateUser
    })?;

    let token = JwtKeys::from_ref(st).issue(user.id)?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(user),
    })
}

/// Unknown email and wrong password both end in `InvalidCredentials`.
#[instrument(skip(st, req))]
pub async fn login(st: &AppState, req: LoginRequest) -> AppResult<AuthResponse> {
    let email = normalize_email(&req.email);

    let Some(user) = st.users.find_by_email(&email).await? else {
        verify_dummy(&req.password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(st).issue(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(user),
    })
}

#[instrument(skip(st))]
pub async fn get_profile(st: &AppState, user_id: i64) -> AppResult<PublicUser> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(PublicUser::from(user))
}

/// Deletes the account together with every task it owns.
#[instrument(skip(st))]
pub async fn delete_account(st: &AppState, user_id: i64) -> AppResult<()> {
    let open_tasks = st.tasks.count_incomplete(user_id).await?;
    if !st.users.delete(user_id).await? {
        warn!(user_id, "delete of unknown account");
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id, open_tasks, "user account deleted");
    Ok(())
}
