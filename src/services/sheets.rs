// src/services/sheets.rs

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

// Gateway hacia la planilla. Detrás de un trait para poder enchufar un
// doble en los tests de los handlers.
#[async_trait]
pub trait SheetsGateway: Send + Sync {
    async fn fetch_rows(&self) -> anyhow::Result<Value>;
    async fn forward(&self, body: &Value) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    script_url: String,
}

impl GoogleSheetsClient {
    pub fn new(script_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            script_url,
        }
    }
}

#[async_trait]
impl SheetsGateway for GoogleSheetsClient {
    async fn fetch_rows(&self) -> anyhow::Result<Value> {
        // cache-buster: la macro de la planilla cachea los GET con ganas
        let url = format!("{}?t={}", self.script_url, Utc::now().timestamp_millis());

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("GET hacia la planilla falló")?;
        let rows = response
            .json()
            .await
            .context("la planilla no devolvió JSON")?;
        Ok(rows)
    }

    async fn forward(&self, body: &Value) -> anyhow::Result<()> {
        // La macro sólo acepta text/plain y responde con un redirect que no
        // inspeccionamos: los datos llegan igual.
        self.http
            .post(&self.script_url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(serde_json::to_string(body)?)
            .send()
            .await
            .context("POST hacia la planilla falló")?;
        Ok(())
    }
}
