// src/handlers/leads.rs

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{common::error::AppError, config::AppState, middleware::auth::CrmToken};

// GET /api/leads — proxy de lectura sobre la planilla (requiere bearer)
pub async fn list(
    State(state): State<AppState>,
    _token: CrmToken,
) -> Result<Json<Value>, AppError> {
    let rows = state
        .sheets
        .fetch_rows()
        .await
        .map_err(AppError::UpstreamFetch)?;

    Ok(Json(rows))
}

// POST /api/leads — alta o actualización. El alta es pública (viene del
// formulario); la actualización exige la contraseña dentro del body.
pub async fn mutate(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or_default();

    if action == "update" {
        let password = body.get("password").and_then(Value::as_str);
        if password != Some(state.crm_password.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    state
        .sheets
        .forward(&body)
        .await
        .map_err(AppError::UpstreamSend)?;

    // la respuesta de la planilla no se inspecciona: con que el POST haya
    // salido alcanza
    Ok(Json(json!({ "success": true })))
}
