use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{UserCreate, UserResponse};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = UserRepository::new(state.get_db());
    let user = repo.create(payload).await?;

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("Created user has no id"))?;
    let token = state
        .jwt_service
        .generate_token(&user_id, &user.username, user.role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    tracing::info!(target: "security", user = %user.username, role = %user.role, "user registered");

    Ok(ok_with_message(
        AuthResponse {
            token,
            user: UserResponse::from(&user),
        },
        "Registered",
    ))
}

/// POST /api/auth/login
///
/// 用户名不存在和密码错误返回同一个错误，避免枚举用户名。
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<AuthResponse>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let verified = user
        .verify_password(&payload.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !verified {
        tracing::warn!(target: "security", user = %payload.username, "login failed");
        return Err(AppError::invalid_credentials());
    }
    if !user.is_active {
        return Err(AppError::forbidden("Account is disabled"));
    }

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("Stored user has no id"))?;
    let token = state
        .jwt_service
        .generate_token(&user_id, &user.username, user.role)
        .map_err(|e| AppError::internal(e.to_string()))?;

    tracing::info!(target: "security", user = %user.username, "login ok");

    Ok(ok_with_message(
        AuthResponse {
            token,
            user: UserResponse::from(&user),
        },
        "Logged in",
    ))
}
