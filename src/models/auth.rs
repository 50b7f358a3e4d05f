// src/models/auth.rs

use serde::{Deserialize, Serialize};

// Cuerpo de POST /api/auth
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub password: String,
}

// Respuesta de autenticación: el token ES la contraseña compartida
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
}
