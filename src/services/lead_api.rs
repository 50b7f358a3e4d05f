// src/services/lead_api.rs

//! Cliente consumidor de los dos endpoints del proxy. Toda operación de red
//! atrapa sus propios errores de transporte y los convierte en booleanos u
//! opcionales: nada de acá puede tirar una excepción hacia la vista.

use serde_json::{json, Value};
use tracing::error;

use crate::form::SubmitLead;
use crate::models::lead::{parse_external_lead, CreateLeadPayload, CrmFlag, Lead, LeadDraft};
use crate::services::crm_service::CrmApi;

#[derive(Clone)]
pub struct LeadApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl LeadApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    // Helper compartido por el alta y los toggles
    async fn post_to_api(&self, payload: &Value) -> bool {
        let result = self
            .http
            .post(format!("{}/leads", self.base_url))
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                error!("Error enviando datos: {err}");
                false
            }
        }
    }

    // Serializa el borrador al formato de la planilla y lo manda. true sólo
    // con respuesta 2xx; el reintento queda en manos del que llama.
    pub async fn submit_lead(&self, draft: &LeadDraft) -> bool {
        let payload = CreateLeadPayload::from_draft(draft);
        match serde_json::to_value(&payload) {
            Ok(value) => self.post_to_api(&value).await,
            Err(err) => {
                error!("Error preparando lead: {err}");
                false
            }
        }
    }

    // Contraseña correcta → el servidor devuelve la misma contraseña como
    // token opaco. Cualquier falla (401 o red caída) devuelve None sin
    // distinguir la causa.
    pub async fn authenticate_crm(&self, password: &str) -> Option<String> {
        let response = self
            .http
            .post(format!("{}/auth", self.base_url))
            .json(&json!({ "password": password }))
            .send()
            .await
            .map_err(|err| error!("Error de autenticación: {err}"))
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: Value = response.json().await.ok()?;
        body.get("token")?.as_str().map(str::to_owned)
    }

    // Variante que falla cerrada: cualquier error se loguea y sale una
    // lista vacía.
    pub async fn get_leads(&self, token: &str) -> Vec<Lead> {
        match self.fetch_leads(token).await {
            Ok(leads) => leads,
            Err(err) => {
                error!("Error obteniendo leads: {err}");
                Vec::new()
            }
        }
    }

    pub async fn toggle_lead_flag(
        &self,
        id: &str,
        flag: CrmFlag,
        current: bool,
        token: &str,
    ) -> bool {
        self.post_to_api(&update_payload(id, flag, current, token))
            .await
    }
}

// Cuerpo del update de un solo campo: el valor viaja ya negado y la
// contraseña va dentro del body, no en el header.
fn update_payload(id: &str, flag: CrmFlag, current: bool, token: &str) -> Value {
    json!({
        "action": "update",
        "id": id,
        "field": flag.field(),
        "value": !current,
        "password": token,
    })
}

impl SubmitLead for LeadApiClient {
    async fn submit_lead(&self, draft: &LeadDraft) -> bool {
        LeadApiClient::submit_lead(self, draft).await
    }
}

impl CrmApi for LeadApiClient {
    async fn authenticate(&self, password: &str) -> Option<String> {
        self.authenticate_crm(password).await
    }

    async fn fetch_leads(&self, token: &str) -> anyhow::Result<Vec<Lead>> {
        let response = self
            .http
            .get(format!("{}/leads", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Error: {}", response.status());
        }

        let data: Value = response.json().await?;
        let Some(rows) = data.as_array() else {
            return Ok(Vec::new());
        };

        // la planilla agrega al final; el CRM quiere lo más nuevo primero
        Ok(rows.iter().map(parse_external_lead).rev().collect())
    }

    async fn toggle_flag(&self, id: &str, flag: CrmFlag, current: bool, token: &str) -> bool {
        self.toggle_lead_flag(id, flag, current, token).await
    }
}
