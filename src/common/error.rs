use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nuestro tipo de error, con `thiserror` para mejor ergonomía.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Contraseña incorrecta")]
    WrongPassword,

    #[error("No autorizado")]
    Unauthorized,

    #[error("Método no permitido")]
    MethodNotAllowed,

    // La planilla no respondió o devolvió algo que no es JSON
    #[error("Error al obtener datos")]
    UpstreamFetch(#[source] anyhow::Error),

    #[error("Error al enviar datos")]
    UpstreamSend(#[source] anyhow::Error),

    // Variante genérica para cualquier otro error inesperado
    #[error("Error interno del servidor")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // La UI muestra este texto tal cual; no distinguimos contraseña
            // equivocada de auth inalcanzable a propósito.
            AppError::WrongPassword => (StatusCode::UNAUTHORIZED, "Contraseña incorrecta"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "No autorizado"),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Método no permitido"),

            AppError::UpstreamFetch(err) => {
                tracing::error!("Falla leyendo la planilla: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al obtener datos")
            }
            AppError::UpstreamSend(err) => {
                tracing::error!("Falla escribiendo en la planilla: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al enviar datos")
            }
            AppError::Internal(err) => {
                tracing::error!("Error interno del servidor: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocurrió un error inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
