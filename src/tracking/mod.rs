// src/tracking/mod.rs

//! Contrato de tracking de conversiones. El núcleo nunca toca los globales
//! de las plataformas de anuncios: recibe un `ConversionTracker` inyectado
//! y emite eventos; los adaptadores viven en `pixel`.

pub mod pixel;

use serde_json::{json, Value};

pub const CURRENCY: &str = "PYG";

// Datos que acompañan a la conversión de un formulario completado
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionData {
    pub procedure: String,
    pub budget: String,
    pub source: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    // Primer avance fuera de la intro (para medir abandono)
    FormStart,
    // Cada paso completado del funnel
    FormStep { index: usize, name: &'static str },
    // Vista de la página de gracias tras el redirect
    PageView,
    LeadConversion(ConversionData),
}

// Capacidad inyectada: el asistente y la página de gracias emiten por acá.
// El tracking jamás bloquea ni hace fallar el flujo del usuario.
pub trait ConversionTracker: Send + Sync {
    fn emit(&self, event: TrackingEvent);
}

pub struct NoopTracker;

impl ConversionTracker for NoopTracker {
    fn emit(&self, _event: TrackingEvent) {}
}

// Tabla fija rango → valor numérico para las plataformas de anuncios
pub fn budget_value(budget: &str) -> u64 {
    match budget {
        "8.000.000 - 15.000.000" => 11_500_000,
        "15.000.000 - 25.000.000" => 20_000_000,
        "25.000.000 - 35.000.000" => 30_000_000,
        "35.000.000 - 45.000.000" => 40_000_000,
        "45.000.000 o más" => 50_000_000,
        _ => 0,
    }
}

// Parámetros del evento "generate_lead" (con las dimensiones custom)
pub fn generate_lead_params(data: &ConversionData) -> Value {
    json!({
        "event_category": "form",
        "event_label": data.procedure,
        "value": budget_value(&data.budget),
        "currency": CURRENCY,
        "procedure_type": data.procedure,
        "budget_range": data.budget,
        "lead_source": data.source,
        "lead_location": data.location,
    })
}

// Parámetros del evento "Lead" del pixel de Meta
pub fn lead_params(data: &ConversionData) -> Value {
    json!({
        "content_name": data.procedure,
        "content_category": "Consultation Request",
        "value": budget_value(&data.budget),
        "currency": CURRENCY,
    })
}
