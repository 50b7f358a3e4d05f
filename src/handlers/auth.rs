// src/handlers/auth.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AuthPayload, AuthResponse},
};

// POST /api/auth — la contraseña compartida hace de token de sesión
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AuthPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    if payload.password != state.crm_password {
        return Err(AppError::WrongPassword);
    }

    Ok(Json(AuthResponse {
        success: true,
        token: state.crm_password.clone(),
    }))
}
