// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;

use crate::services::sheets::{GoogleSheetsClient, SheetsGateway};

#[derive(Clone)]
pub struct AppState {
    // La contraseña compartida del CRM también hace de token de sesión.
    pub crm_password: String,
    pub sheets: Arc<dyn SheetsGateway>,
}

impl AppState {
    // La firma retorna un Result: si falta una variable obligatoria la
    // aplicación no debe arrancar.
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let crm_password = env::var("CRM_PASSWORD").context("CRM_PASSWORD debe estar definida")?;
        let script_url =
            env::var("GOOGLE_SCRIPT_URL").context("GOOGLE_SCRIPT_URL debe estar definida")?;

        let sheets: Arc<dyn SheetsGateway> = Arc::new(GoogleSheetsClient::new(script_url));

        Ok(Self {
            crm_password,
            sheets,
        })
    }

    pub fn port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000)
    }
}
