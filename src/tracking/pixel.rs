// src/tracking/pixel.rs

//! Adaptador real sobre los scripts de las plataformas de anuncios. El
//! script se carga asíncronamente, así que puede no estar disponible cuando
//! el flujo llega a la página de gracias: antes de disparar se sondea su
//! disponibilidad hasta un tope, y si no aparece el evento se descarta en
//! silencio.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::sleep;

use super::{generate_lead_params, lead_params, ConversionData, ConversionTracker, TrackingEvent};

pub const SCRIPT_POLL_TIMEOUT: Duration = Duration::from_secs(5);
pub const SCRIPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Pausa entre PageView y la conversión para que el script registre primero
// el cambio de página
pub const SEQUENCE_DELAY: Duration = Duration::from_millis(100);

// Lo único que el núcleo sabe del script de la plataforma: si ya cargó y
// cómo llamarlo.
pub trait PixelScript: Send + Sync {
    fn is_loaded(&self) -> bool;
    fn call(&self, event: &str, params: Option<Value>);
}

// Sondea la disponibilidad del script cada `interval` hasta `timeout`.
pub async fn wait_for_script(
    script: &dyn PixelScript,
    timeout: Duration,
    interval: Duration,
) -> bool {
    if script.is_loaded() {
        return true;
    }

    let mut elapsed = Duration::ZERO;
    while elapsed < timeout {
        sleep(interval).await;
        elapsed += interval;
        if script.is_loaded() {
            return true;
        }
    }

    tracing::warn!("script de pixel no disponible después de {timeout:?}");
    false
}

// Dispara un evento esperando primero a que el script esté cargado.
// Devuelve false si se agotó la espera; nunca propaga errores.
pub async fn fire_event(script: &dyn PixelScript, event: &str, params: Option<Value>) -> bool {
    if !wait_for_script(script, SCRIPT_POLL_TIMEOUT, SCRIPT_POLL_INTERVAL).await {
        tracing::warn!(event, "evento de pixel descartado: script no cargado");
        return false;
    }
    script.call(event, params);
    true
}

// Secuencia de la página de gracias: PageView primero, la conversión
// después de una pausa corta. Si se llega sin datos (acceso directo a la
// ruta) sólo se registra el PageView.
pub async fn fire_thank_you_sequence(script: &dyn PixelScript, conversion: Option<&ConversionData>) {
    if !fire_event(script, "PageView", None).await {
        return;
    }

    let Some(data) = conversion else {
        tracing::warn!("acceso directo a la página de gracias sin datos de conversión");
        return;
    };

    sleep(SEQUENCE_DELAY).await;
    fire_event(script, "Lead", Some(lead_params(data))).await;
}

// Adaptador ConversionTracker → script: cada evento sale en una tarea
// separada para que el tracking nunca bloquee al flujo que lo emite.
pub struct ScriptTracker {
    script: Arc<dyn PixelScript>,
}

impl ScriptTracker {
    pub fn new(script: Arc<dyn PixelScript>) -> Self {
        Self { script }
    }
}

impl ConversionTracker for ScriptTracker {
    fn emit(&self, event: TrackingEvent) {
        let script = Arc::clone(&self.script);
        tokio::spawn(async move {
            match event {
                TrackingEvent::FormStart => {
                    fire_event(
                        &*script,
                        "begin_checkout",
                        Some(json!({
                            "event_category": "form",
                            "event_label": "consultation_form_started",
                        })),
                    )
                    .await;
                }
                TrackingEvent::FormStep { index, name } => {
                    fire_event(
                        &*script,
                        "form_step_completed",
                        Some(json!({
                            "event_category": "form",
                            "event_label": name,
                            "value": index,
                        })),
                    )
                    .await;
                }
                TrackingEvent::PageView => {
                    fire_event(&*script, "PageView", None).await;
                }
                TrackingEvent::LeadConversion(data) => {
                    fire_event(&*script, "generate_lead", Some(generate_lead_params(&data)))
                        .await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // Script falso: "carga" después de N consultas y graba las llamadas
    struct FakeScript {
        checks_until_loaded: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl FakeScript {
        fn loads_after(checks: usize) -> Self {
            Self {
                checks_until_loaded: AtomicUsize::new(checks),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn never_loads() -> Self {
            Self::loads_after(usize::MAX)
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PixelScript for FakeScript {
        fn is_loaded(&self) -> bool {
            let remaining = self.checks_until_loaded.load(Ordering::SeqCst);
            if remaining == 0 {
                return true;
            }
            if remaining != usize::MAX {
                self.checks_until_loaded.store(remaining - 1, Ordering::SeqCst);
            }
            false
        }

        fn call(&self, event: &str, _params: Option<Value>) {
            self.calls.lock().unwrap().push(event.to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_as_soon_as_the_script_loads() {
        let script = FakeScript::loads_after(3);
        let start = tokio::time::Instant::now();

        let loaded = wait_for_script(&script, SCRIPT_POLL_TIMEOUT, SCRIPT_POLL_INTERVAL).await;

        assert!(loaded);
        assert_eq!(start.elapsed(), SCRIPT_POLL_INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_timeout() {
        let script = FakeScript::never_loads();
        let start = tokio::time::Instant::now();

        let loaded = wait_for_script(&script, SCRIPT_POLL_TIMEOUT, SCRIPT_POLL_INTERVAL).await;

        assert!(!loaded);
        assert_eq!(start.elapsed(), SCRIPT_POLL_TIMEOUT);
        assert!(script.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn discarded_event_never_calls_the_script() {
        let script = FakeScript::never_loads();
        assert!(!fire_event(&script, "Lead", None).await);
        assert!(script.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn thank_you_sequence_orders_page_view_before_lead() {
        let script = FakeScript::loads_after(0);
        let data = ConversionData {
            procedure: "Rinoplastia".to_string(),
            budget: "15.000.000 - 25.000.000".to_string(),
            source: "Instagram".to_string(),
            location: "Asunción".to_string(),
        };

        fire_thank_you_sequence(&script, Some(&data)).await;

        assert_eq!(script.calls(), vec!["PageView", "Lead"]);
    }

    #[tokio::test(start_paused = true)]
    async fn direct_visit_only_registers_the_page_view() {
        let script = FakeScript::loads_after(0);

        fire_thank_you_sequence(&script, None).await;

        assert_eq!(script.calls(), vec!["PageView"]);
    }
}
