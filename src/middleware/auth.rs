// src/middleware/auth.rs

use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{common::error::AppError, config::AppState};

// Extractor para las rutas protegidas del CRM: exige el header
// `Authorization: Bearer <token>` con el secreto compartido.
pub struct CrmToken(pub String);

impl FromRequestParts<AppState> for CrmToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized)?;

        if bearer.token() != state.crm_password {
            return Err(AppError::Unauthorized);
        }

        Ok(CrmToken(bearer.token().to_owned()))
    }
}
