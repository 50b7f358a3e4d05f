// src/form.rs

//! Máquina de estados del cuestionario de evaluación. Es dueña del borrador,
//! del paso actual y de los flags de error/touched por campo; las
//! transiciones están custodiadas por la validación. La red y el tracking
//! entran inyectados, así que todo el flujo se prueba sin tocar nada externo.

use std::time::Duration;

use crate::models::lead::{LeadDraft, DEFAULT_COUNTRY_CODE, OTHER_PROCEDURE};
use crate::tracking::{ConversionData, ConversionTracker, TrackingEvent};
use crate::validation::{validate_email, validate_phone, REQUIRED_ERROR};

// Pausa antes del auto-avance en los pasos de selección: el usuario ve su
// elección marcada antes de que cambie la pantalla.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(300);

// Largo mínimo del número local antes de poder salir del paso de contacto
pub const MIN_LOCAL_PHONE_LEN: usize = 4;

// Mensaje del aviso de reintento manual cuando el envío falla
pub const SUBMIT_RETRY_MESSAGE: &str =
    "Hubo un problema al enviar sus datos. Por favor, verifique su conexión e intente nuevamente.";

// El orden de los pasos es una decisión de producto: la selección de
// procedimiento y presupuesto van antes que los datos de contacto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Intro,
    Procedure,
    Budget,
    Contact,
    Details,
    Motivation,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Intro,
        Step::Procedure,
        Step::Budget,
        Step::Contact,
        Step::Details,
        Step::Motivation,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    // Nombre simbólico que viaja en los eventos de funnel
    pub fn name(self) -> &'static str {
        match self {
            Step::Intro => "intro",
            Step::Procedure => "procedure",
            Step::Budget => "budget",
            Step::Contact => "contact",
            Step::Details => "details",
            Step::Motivation => "motivation",
        }
    }

    fn next(self) -> Option<Step> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Email,
    Whatsapp,
    Location,
    Procedure,
    OtherProcedure,
    Budget,
    Source,
    Motivation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    // El asistente queda donde está; la UI muestra SUBMIT_RETRY_MESSAGE
    Failed,
    NotAttempted,
}

// Destino del borrador finalizado; el cliente real vive en services::lead_api
#[allow(async_fn_in_trait)]
pub trait SubmitLead {
    async fn submit_lead(&self, draft: &LeadDraft) -> bool;
}

pub struct ConsultationForm<S, T> {
    api: S,
    tracker: T,
    pub draft: LeadDraft,
    country_code: String,
    local_phone: String,
    step: Step,
    email_error: Option<&'static str>,
    whatsapp_error: Option<&'static str>,
    email_touched: bool,
    whatsapp_touched: bool,
    started: bool,
    is_submitting: bool,
    submitted: bool,
}

impl<S: SubmitLead, T: ConversionTracker> ConsultationForm<S, T> {
    pub fn new(api: S, tracker: T) -> Self {
        Self {
            api,
            tracker,
            draft: LeadDraft::default(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            local_phone: String::new(),
            step: Step::Intro,
            email_error: None,
            whatsapp_error: None,
            email_touched: false,
            whatsapp_touched: false,
            started: false,
            is_submitting: false,
            submitted: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn email_error(&self) -> Option<&'static str> {
        self.email_error
    }

    pub fn whatsapp_error(&self) -> Option<&'static str> {
        self.whatsapp_error
    }

    // La UI sólo pinta el error de un campo que ya fue tocado
    pub fn email_touched(&self) -> bool {
        self.email_touched
    }

    pub fn whatsapp_touched(&self) -> bool {
        self.whatsapp_touched
    }

    // Avanza un paso si las reglas del paso actual lo permiten. Si no,
    // fuerza el touched del campo culpable y deja el error a la vista.
    pub fn advance(&mut self) {
        match self.step {
            Step::Contact => {
                if self.draft.whatsapp.is_empty()
                    || self.whatsapp_error.is_some()
                    || self.local_phone.chars().count() < MIN_LOCAL_PHONE_LEN
                {
                    self.whatsapp_touched = true;
                    self.whatsapp_error =
                        validate_phone(&self.draft.whatsapp).or(Some(REQUIRED_ERROR));
                    return;
                }
            }
            Step::Details => {
                // El correo es opcional, pero si escribieron algo inválido no se sale
                if !self.draft.email.is_empty() && self.email_error.is_some() {
                    self.email_touched = true;
                    return;
                }
            }
            _ => {}
        }

        let Some(next) = self.step.next() else {
            return;
        };
        let leaving_intro = self.step == Step::Intro;
        self.step = next;

        if leaving_intro && !self.started {
            self.started = true;
            self.tracker.emit(TrackingEvent::FormStart);
        }
        self.tracker.emit(TrackingEvent::FormStep {
            index: next.index(),
            name: next.name(),
        });
    }

    // Volver atrás nunca valida ni emite eventos
    pub fn retreat(&mut self) {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
    }

    pub fn set_field(&mut self, field: Field, value: &str) {
        match field {
            Field::FullName => self.draft.full_name = value.to_string(),
            Field::Email => {
                self.draft.email = value.to_string();
                // el correo se revalida en cada tecla, no espera al blur
                self.email_error = validate_email(value);
            }
            Field::Whatsapp => {
                self.draft.whatsapp = value.to_string();
                if self.whatsapp_touched {
                    self.whatsapp_error = validate_phone(value);
                }
            }
            Field::Location => self.draft.location = value.to_string(),
            Field::Procedure => self.draft.procedure = value.to_string(),
            Field::OtherProcedure => self.draft.other_procedure = value.to_string(),
            Field::Budget => self.draft.budget = value.to_string(),
            Field::Source => self.draft.source = value.to_string(),
            Field::Motivation => self.draft.motivation = value.to_string(),
        }
    }

    pub fn set_country_code(&mut self, code: &str) {
        self.country_code = code.to_string();
        self.sync_phone();
    }

    // El input de teléfono sólo deja pasar dígitos, espacios y guiones
    pub fn set_local_phone(&mut self, value: &str) {
        self.local_phone = value
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == ' ' || *c == '-')
            .collect();
        self.sync_phone();
    }

    fn sync_phone(&mut self) {
        self.draft.whatsapp = format!("{} {}", self.country_code, self.local_phone);
        if self.whatsapp_touched {
            self.whatsapp_error = validate_phone(&self.draft.whatsapp);
        }
    }

    // Salir del campo marca touched y recalcula el error
    pub fn blur(&mut self, field: Field) {
        match field {
            Field::Email => {
                self.email_touched = true;
                self.email_error = validate_email(&self.draft.email);
            }
            Field::Whatsapp => {
                self.whatsapp_touched = true;
                self.whatsapp_error = validate_phone(&self.draft.whatsapp);
            }
            _ => {}
        }
    }

    // Pasos de selección: marca la opción y auto-avanza tras una pausa
    // corta. Elegir "Otro procedimiento" no avanza: falta el texto libre.
    pub async fn select_choice(&mut self, field: Field, value: &str) {
        self.set_field(field, value);
        if field == Field::Procedure && value == OTHER_PROCEDURE {
            return;
        }
        tokio::time::sleep(AUTO_ADVANCE_DELAY).await;
        self.advance();
    }

    // Enter avanza, salvo en el último paso donde envía. Shift+Enter no se
    // intercepta nunca (deja escribir saltos de línea en la motivación).
    pub async fn press_enter(&mut self, shift: bool) -> SubmitOutcome {
        if shift {
            return SubmitOutcome::NotAttempted;
        }
        if self.step == Step::Motivation {
            self.submit().await
        } else {
            self.advance();
            SubmitOutcome::NotAttempted
        }
    }

    // Sólo desde el último paso y sin envío en vuelo. En éxito marca el
    // estado terminal y emite la conversión; en falla queda todo donde
    // estaba para que el usuario reintente a mano.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.step != Step::Motivation || self.is_submitting || self.submitted {
            return SubmitOutcome::NotAttempted;
        }

        self.is_submitting = true;
        let ok = self.api.submit_lead(&self.draft).await;
        self.is_submitting = false;

        if !ok {
            return SubmitOutcome::Failed;
        }

        self.tracker.emit(TrackingEvent::LeadConversion(ConversionData {
            procedure: self.analytics_procedure(),
            budget: self.draft.budget.clone(),
            source: self.draft.source.clone(),
            location: self.draft.location.clone(),
        }));
        self.submitted = true;
        SubmitOutcome::Sent
    }

    // La conversión lleva la etiqueta resuelta del procedimiento; a
    // diferencia del registro enviado, acá no hay relleno "No especificado".
    fn analytics_procedure(&self) -> String {
        if self.draft.procedure == OTHER_PROCEDURE {
            if self.draft.other_procedure.is_empty() {
                "Otro".to_string()
            } else {
                self.draft.other_procedure.clone()
            }
        } else {
            self.draft.procedure.clone()
        }
    }
}
