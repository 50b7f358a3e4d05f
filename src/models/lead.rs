// src/models/lead.rs

use chrono::{Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- CATÁLOGOS ---

pub const PROCEDURES: [&str; 7] = [
    "Lipoescultura",
    "Abdominoplastia",
    "Aumento Mamario",
    "Mastopexia",
    "Blefaroplastia",
    "Rinoplastia",
    "Otro procedimiento",
];

// Centinela del catálogo: habilita el campo de texto libre y frena el auto-avance
pub const OTHER_PROCEDURE: &str = "Otro procedimiento";

pub const BUDGET_RANGES: [&str; 5] = [
    "8.000.000 - 15.000.000",
    "15.000.000 - 25.000.000",
    "25.000.000 - 35.000.000",
    "35.000.000 - 45.000.000",
    "45.000.000 o más",
];

pub const SOURCES: [&str; 7] = [
    "Recomendación de amigos o familiares",
    "Recomendación de otro médico",
    "Instagram",
    "Facebook",
    "Tiktok",
    "Búsqueda por Google",
    "Otro",
];

pub const DEFAULT_COUNTRY_CODE: &str = "+595";

// --- BORRADOR (vive sólo mientras el asistente está abierto) ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadDraft {
    pub full_name: String,
    pub email: String,
    // "{código de país} {número local}", armado por el asistente
    pub whatsapp: String,
    pub location: String,
    pub procedure: String,
    pub other_procedure: String,
    pub budget: String,
    pub source: String,
    pub motivation: String,
}

impl LeadDraft {
    // Etiqueta efectiva del procedimiento para el registro enviado
    pub fn effective_procedure(&self) -> String {
        if self.procedure == OTHER_PROCEDURE {
            if self.other_procedure.is_empty() {
                "Otro".to_string()
            } else {
                self.other_procedure.clone()
            }
        } else if self.procedure.is_empty() {
            "No especificado".to_string()
        } else {
            self.procedure.clone()
        }
    }
}

// --- REGISTRO NUEVO (la forma que espera la planilla) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadPayload {
    pub action: String,
    pub id: String,
    #[serde(rename = "Fecha")]
    pub fecha: String,
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "Whatsapp")]
    pub whatsapp: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Ubicacion")]
    pub ubicacion: String,
    #[serde(rename = "Procedimiento")]
    pub procedimiento: String,
    #[serde(rename = "Presupuesto")]
    pub presupuesto: String,
    #[serde(rename = "Fuente")]
    pub fuente: String,
    #[serde(rename = "Motivacion")]
    pub motivacion: String,
    // Estados CRM: siempre nacen en falso, sólo el CRM los cambia
    pub contacted: bool,
    pub converted: bool,
    pub lost: bool,
}

impl CreateLeadPayload {
    pub fn from_draft(draft: &LeadDraft) -> Self {
        // El apóstrofe inicial obliga a la planilla a tratar el número como
        // texto y no como fórmula.
        let whatsapp = if draft.whatsapp.is_empty() {
            String::new()
        } else {
            format!("'{}", draft.whatsapp)
        };

        Self {
            action: "create".to_string(),
            id: short_id(),
            fecha: Local::now().format("%-d/%-m/%Y, %H:%M:%S").to_string(),
            nombre: draft.full_name.clone(),
            whatsapp,
            email: draft.email.clone(),
            ubicacion: draft.location.clone(),
            procedimiento: draft.effective_procedure(),
            presupuesto: draft.budget.clone(),
            fuente: draft.source.clone(),
            motivacion: draft.motivation.clone(),
            contacted: false,
            converted: false,
            lost: false,
        }
    }
}

// Token corto base 36. Sin detección de colisiones: con el volumen del
// consultorio el riesgo es aceptable.
pub fn short_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// --- MODELO DE LECTURA DEL CRM ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub date: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub location: String,
    pub procedure: String,
    pub budget: String,
    pub source: String,
    pub motivation: String,
    pub contacted: bool,
    pub converted: bool,
    pub lost: bool,
}

// Los tres estados que el CRM puede girar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrmFlag {
    Contacted,
    Converted,
    Lost,
}

impl CrmFlag {
    pub fn field(self) -> &'static str {
        match self {
            CrmFlag::Contacted => "contacted",
            CrmFlag::Converted => "converted",
            CrmFlag::Lost => "lost",
        }
    }

    pub fn get(self, lead: &Lead) -> bool {
        match self {
            CrmFlag::Contacted => lead.contacted,
            CrmFlag::Converted => lead.converted,
            CrmFlag::Lost => lead.lost,
        }
    }

    pub fn set(self, lead: &mut Lead, value: bool) {
        match self {
            CrmFlag::Contacted => lead.contacted = value,
            CrmFlag::Converted => lead.converted = value,
            CrmFlag::Lost => lead.lost = value,
        }
    }
}

// Frontera de normalización: la planilla devuelve claves en inglés o en
// español según la generación de la hoja, y los booleanos suelen llegar
// como texto. Toda esa tolerancia vive acá y en ningún otro lado.
pub fn parse_external_lead(raw: &Value) -> Lead {
    Lead {
        id: pick(raw, &["id"]).unwrap_or_else(short_id),
        date: pick(raw, &["date", "Fecha"]).unwrap_or_else(|| Utc::now().to_rfc3339()),
        name: pick(raw, &["name", "Nombre"]).unwrap_or_else(|| "Sin nombre".to_string()),
        phone: pick(raw, &["phone", "Whatsapp"]).unwrap_or_default(),
        email: pick(raw, &["email", "Email"]).unwrap_or_default(),
        location: pick(raw, &["location", "Ubicacion"]).unwrap_or_default(),
        procedure: pick(raw, &["procedure", "Procedimiento"]).unwrap_or_default(),
        budget: pick(raw, &["budget", "Presupuesto"]).unwrap_or_default(),
        source: pick(raw, &["source", "Fuente"]).unwrap_or_default(),
        motivation: pick(raw, &["motivation", "Motivacion"]).unwrap_or_default(),
        contacted: coerce_bool(raw.get("contacted")),
        converted: coerce_bool(raw.get("converted")),
        lost: coerce_bool(raw.get("lost")),
    }
}

// El primer valor no vacío gana; cadena vacía cuenta como ausente.
fn pick(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_string(raw.get(key)?))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Comparación textual, no identidad booleana: "TRUE" y true valen igual.
fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn effective_procedure_resolves_sentinel_and_empties() {
        let mut draft = LeadDraft {
            procedure: "Rinoplastia".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.effective_procedure(), "Rinoplastia");

        draft.procedure = OTHER_PROCEDURE.to_string();
        assert_eq!(draft.effective_procedure(), "Otro");

        draft.other_procedure = "Otoplastia".to_string();
        assert_eq!(draft.effective_procedure(), "Otoplastia");

        draft.procedure.clear();
        assert_eq!(draft.effective_procedure(), "No especificado");
    }

    #[test]
    fn payload_forces_text_marker_and_fresh_crm_flags() {
        let draft = LeadDraft {
            full_name: "María González".to_string(),
            whatsapp: "+595 981123456".to_string(),
            procedure: "Rinoplastia".to_string(),
            budget: "15.000.000 - 25.000.000".to_string(),
            ..Default::default()
        };

        let payload = CreateLeadPayload::from_draft(&draft);

        assert_eq!(payload.action, "create");
        assert!(payload.whatsapp.starts_with('\''));
        assert_eq!(payload.whatsapp, "'+595 981123456");
        assert_eq!(payload.nombre, "María González");
        assert_eq!(payload.procedimiento, "Rinoplastia");
        assert!(!payload.contacted && !payload.converted && !payload.lost);
        assert_eq!(payload.id.len(), 9);
    }

    #[test]
    fn payload_leaves_missing_phone_empty() {
        let payload = CreateLeadPayload::from_draft(&LeadDraft::default());
        assert_eq!(payload.whatsapp, "");
    }

    #[test]
    fn payload_serializes_with_sheet_column_names() {
        let draft = LeadDraft {
            full_name: "Ana".to_string(),
            location: "Asunción".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(CreateLeadPayload::from_draft(&draft)).unwrap();

        assert_eq!(value["Nombre"], "Ana");
        assert_eq!(value["Ubicacion"], "Asunción");
        assert_eq!(value["action"], "create");
        assert_eq!(value["contacted"], false);
        assert!(value.get("full_name").is_none());
    }

    #[test]
    fn parses_spanish_column_names() {
        let raw = json!({
            "id": "abc123xyz",
            "Fecha": "1/2/2025, 10:30:00",
            "Nombre": "Carla Ruiz",
            "Whatsapp": "'+595 981000111",
            "Ubicacion": "Luque",
            "Procedimiento": "Lipoescultura",
            "Presupuesto": "8.000.000 - 15.000.000",
            "Fuente": "Instagram",
            "contacted": "TRUE",
            "converted": "false",
        });

        let lead = parse_external_lead(&raw);
        assert_eq!(lead.name, "Carla Ruiz");
        assert_eq!(lead.phone, "'+595 981000111");
        assert_eq!(lead.location, "Luque");
        assert!(lead.contacted);
        assert!(!lead.converted);
        assert!(!lead.lost);
    }

    #[test]
    fn parses_english_column_names_over_spanish() {
        let raw = json!({
            "id": "x",
            "name": "English",
            "Nombre": "Español",
            "contacted": true,
        });

        let lead = parse_external_lead(&raw);
        assert_eq!(lead.name, "English");
        assert!(lead.contacted);
    }

    #[test]
    fn empty_strings_fall_back_like_missing_keys() {
        let raw = json!({ "id": "x", "name": "", "Nombre": "Desde la hoja" });
        assert_eq!(parse_external_lead(&raw).name, "Desde la hoja");

        let raw = json!({ "id": "x" });
        assert_eq!(parse_external_lead(&raw).name, "Sin nombre");
    }

    #[test]
    fn stringly_booleans_are_compared_by_text() {
        for (input, expected) in [
            (json!("true"), true),
            (json!("TRUE"), true),
            (json!("false"), false),
            (json!("1"), false),
            (json!(null), false),
        ] {
            let raw = json!({ "id": "x", "contacted": input });
            assert_eq!(parse_external_lead(&raw).contacted, expected);
        }
    }

    #[test]
    fn numeric_scalars_are_stringified() {
        let raw = json!({ "id": 42, "Whatsapp": 981123456 });
        let lead = parse_external_lead(&raw);
        assert_eq!(lead.id, "42");
        assert_eq!(lead.phone, "981123456");
    }
}
