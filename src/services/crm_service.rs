// src/services/crm_service.rs

//! Sesión y lógica de listado del CRM interno. La sesión es dueña del token
//! (la contraseña compartida, opaca para este módulo), lo espeja en un
//! almacenamiento durable para restaurarla al recargar, y aplica los giros
//! de estado de forma optimista.

use std::path::PathBuf;

use tracing::{error, warn};

use crate::models::lead::{CrmFlag, Lead};

// Clave fija del almacenamiento durable de la sesión
pub const TOKEN_STORAGE_KEY: &str = "crm_token";

pub const LOGIN_ERROR: &str = "Contraseña incorrecta";
pub const FETCH_ERROR: &str = "Error al conectar con la base de datos.";

// Lo que la sesión necesita de la API; el cliente real vive en lead_api
#[allow(async_fn_in_trait)]
pub trait CrmApi {
    async fn authenticate(&self, password: &str) -> Option<String>;
    async fn fetch_leads(&self, token: &str) -> anyhow::Result<Vec<Lead>>;
    async fn toggle_flag(&self, id: &str, flag: CrmFlag, current: bool, token: &str) -> bool;
}

// Espejo durable del token de sesión
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

// Implementación con un archivo plano bajo el directorio indicado
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(TOKEN_STORAGE_KEY),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save(&self, token: &str) {
        if let Err(err) = std::fs::write(&self.path, token) {
            warn!("No se pudo guardar el token de sesión: {err}");
        }
    }

    fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub struct CrmSession<C, S> {
    api: C,
    store: S,
    token: Option<String>,
    leads: Vec<Lead>,
    error: Option<&'static str>,
}

impl<C: CrmApi, S: TokenStore> CrmSession<C, S> {
    // Restaura la sesión previa si quedó un token guardado
    pub fn new(api: C, store: S) -> Self {
        let token = store.load();
        Self {
            api,
            store,
            token,
            leads: Vec::new(),
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub async fn login(&mut self, password: &str) -> bool {
        self.error = None;
        match self.api.authenticate(password).await {
            Some(token) => {
                self.store.save(&token);
                self.token = Some(token);
                true
            }
            None => {
                self.error = Some(LOGIN_ERROR);
                false
            }
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.store.clear();
    }

    // Trae la lista fresca. Si la red falla queda la última lista buena y
    // un error visible en línea.
    pub async fn refresh(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };

        match self.api.fetch_leads(&token).await {
            Ok(leads) => {
                self.leads = leads;
                self.error = None;
            }
            Err(err) => {
                error!("Error al obtener leads: {err}");
                self.error = Some(FETCH_ERROR);
            }
        }
    }

    // Giro optimista: la vista cambia antes de que la red confirme y no se
    // revierte si el guardado falla; el próximo refresh impone la verdad
    // de la planilla.
    pub async fn toggle(&mut self, id: &str, flag: CrmFlag) -> bool {
        let Some(token) = self.token.clone() else {
            return false;
        };
        let Some(lead) = self.leads.iter_mut().find(|l| l.id == id) else {
            return false;
        };

        let current = flag.get(lead);
        flag.set(lead, !current);
        self.api.toggle_flag(id, flag, current, &token).await
    }

    pub fn filtered(&self, term: &str) -> Vec<&Lead> {
        filter_leads(&self.leads, term)
    }

    pub fn export_csv(&self) -> String {
        to_csv(&self.leads)
    }
}

// Búsqueda por nombre, whatsapp o procedimiento. Término vacío devuelve
// todo en el mismo orden.
pub fn filter_leads<'a>(leads: &'a [Lead], term: &str) -> Vec<&'a Lead> {
    let needle = term.to_lowercase();
    leads
        .iter()
        .filter(|lead| {
            lead.name.to_lowercase().contains(&needle)
                || lead.phone.contains(term)
                || lead.procedure.to_lowercase().contains(&needle)
        })
        .collect()
}

// Export heredado: 11 columnas fijas, todo entre comillas dobles, SI/NO
// para los estados. Los consumidores aguas abajo dependen del formato
// byte a byte, no tocar.
pub fn to_csv(leads: &[Lead]) -> String {
    const HEADERS: [&str; 11] = [
        "ID",
        "Fecha",
        "Nombre",
        "Whatsapp",
        "Email",
        "Ubicacion",
        "Procedimiento",
        "Presupuesto",
        "Fuente",
        "Contactado",
        "Convertido",
    ];

    fn si_no(value: bool) -> &'static str {
        if value {
            "SI"
        } else {
            "NO"
        }
    }

    let mut lines = vec![HEADERS.join(",")];
    for lead in leads {
        let row = [
            lead.id.as_str(),
            lead.date.as_str(),
            lead.name.as_str(),
            lead.phone.as_str(),
            lead.email.as_str(),
            lead.location.as_str(),
            lead.procedure.as_str(),
            lead.budget.as_str(),
            lead.source.as_str(),
            si_no(lead.contacted),
            si_no(lead.converted),
        ];
        lines.push(
            row.iter()
                .map(|field| format!("\"{field}\""))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn lead(id: &str, name: &str, phone: &str, procedure: &str) -> Lead {
        Lead {
            id: id.to_string(),
            date: "2025-02-01T10:30:00Z".to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: String::new(),
            location: "Asunción".to_string(),
            procedure: procedure.to_string(),
            budget: "8.000.000 - 15.000.000".to_string(),
            source: "Instagram".to_string(),
            motivation: String::new(),
            contacted: false,
            converted: false,
            lost: false,
        }
    }

    // API falsa respaldada por un vector compartido que hace de planilla
    #[derive(Clone)]
    struct FakeApi {
        password: String,
        backend: Arc<Mutex<Vec<Lead>>>,
        fail_fetch: Arc<Mutex<bool>>,
    }

    impl FakeApi {
        fn new(password: &str, leads: Vec<Lead>) -> Self {
            Self {
                password: password.to_string(),
                backend: Arc::new(Mutex::new(leads)),
                fail_fetch: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl CrmApi for FakeApi {
        async fn authenticate(&self, password: &str) -> Option<String> {
            (password == self.password).then(|| self.password.clone())
        }

        async fn fetch_leads(&self, _token: &str) -> anyhow::Result<Vec<Lead>> {
            if *self.fail_fetch.lock().unwrap() {
                anyhow::bail!("red caída");
            }
            Ok(self.backend.lock().unwrap().clone())
        }

        async fn toggle_flag(&self, id: &str, flag: CrmFlag, current: bool, _token: &str) -> bool {
            let mut backend = self.backend.lock().unwrap();
            let Some(lead) = backend.iter_mut().find(|l| l.id == id) else {
                return false;
            };
            flag.set(lead, !current);
            true
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        token: Mutex<Option<String>>,
    }

    impl TokenStore for MemoryStore {
        fn load(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }

        fn save(&self, token: &str) {
            *self.token.lock().unwrap() = Some(token.to_string());
        }

        fn clear(&self) {
            *self.token.lock().unwrap() = None;
        }
    }

    #[tokio::test]
    async fn login_with_the_shared_password_yields_it_as_token() {
        let api = FakeApi::new("secreto123", Vec::new());
        let mut session = CrmSession::new(api, MemoryStore::default());

        assert!(session.login("secreto123").await);
        assert_eq!(session.token(), Some("secreto123"));
        assert!(session.is_authenticated());
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn failed_login_surfaces_the_generic_message() {
        let api = FakeApi::new("secreto123", Vec::new());
        let mut session = CrmSession::new(api, MemoryStore::default());

        assert!(!session.login("otra").await);
        assert_eq!(session.error(), Some(LOGIN_ERROR));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn session_restores_from_the_store_and_logout_clears_it() {
        let store = MemoryStore::default();
        store.save("secreto123");

        let api = FakeApi::new("secreto123", Vec::new());
        let mut session = CrmSession::new(api, store);
        assert!(session.is_authenticated());

        session.logout();
        assert!(!session.is_authenticated());

        // el almacenamiento quedó limpio: una sesión nueva arranca deslogueada
        let api = FakeApi::new("secreto123", Vec::new());
        let session = CrmSession::new(api, MemoryStore::default());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_last_list_and_flags_the_error() {
        let api = FakeApi::new("s", vec![lead("a", "Ana", "+595 981", "Rinoplastia")]);
        let fail = Arc::clone(&api.fail_fetch);
        let mut session = CrmSession::new(api, MemoryStore::default());
        session.login("s").await;

        session.refresh().await;
        assert_eq!(session.leads().len(), 1);

        *fail.lock().unwrap() = true;
        session.refresh().await;
        assert_eq!(session.leads().len(), 1);
        assert_eq!(session.error(), Some(FETCH_ERROR));
    }

    #[tokio::test]
    async fn toggle_flips_locally_before_the_network_answers() {
        let api = FakeApi::new("s", vec![lead("a", "Ana", "+595 981", "Rinoplastia")]);
        let mut session = CrmSession::new(api, MemoryStore::default());
        session.login("s").await;
        session.refresh().await;

        assert!(session.toggle("a", CrmFlag::Contacted).await);
        assert!(session.leads()[0].contacted);
    }

    #[tokio::test]
    async fn double_toggle_round_trips_to_the_original_value() {
        let api = FakeApi::new("s", vec![lead("a", "Ana", "+595 981", "Rinoplastia")]);
        let mut session = CrmSession::new(api.clone(), MemoryStore::default());
        session.login("s").await;
        session.refresh().await;

        session.toggle("a", CrmFlag::Contacted).await;
        session.toggle("a", CrmFlag::Contacted).await;

        session.refresh().await;
        assert!(!session.leads()[0].contacted);
    }

    #[test]
    fn empty_term_returns_everything_in_order() {
        let leads = vec![
            lead("a", "Ana", "1", "Rinoplastia"),
            lead("b", "Berta", "2", "Lipoescultura"),
        ];
        let filtered = filter_leads(&leads, "");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, "a");
        assert_eq!(filtered[1].id, "b");
    }

    #[test]
    fn filters_by_name_phone_or_procedure() {
        let leads = vec![
            lead("a", "Ana María", "+595 981123456", "Rinoplastia"),
            lead("b", "Berta", "+595 971000000", "Lipoescultura"),
        ];

        assert_eq!(filter_leads(&leads, "ana")[0].id, "a");
        assert_eq!(filter_leads(&leads, "981123")[0].id, "a");
        assert_eq!(filter_leads(&leads, "LIPO")[0].id, "b");
        assert!(filter_leads(&leads, "mastopexia").is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let leads = vec![
            lead("a", "Ana", "1", "Rinoplastia"),
            lead("b", "Berta", "2", "Lipoescultura"),
        ];

        let once: Vec<Lead> = filter_leads(&leads, "rino").into_iter().cloned().collect();
        let twice: Vec<Lead> = filter_leads(&once, "rino").into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn csv_of_an_empty_list_is_just_the_header() {
        assert_eq!(
            to_csv(&[]),
            "ID,Fecha,Nombre,Whatsapp,Email,Ubicacion,Procedimiento,Presupuesto,Fuente,Contactado,Convertido"
        );
    }

    #[test]
    fn csv_row_has_eleven_quoted_fields_with_si_no_states() {
        let mut sample = lead("abc123", "Ana", "'+595 981123456", "Rinoplastia");
        sample.contacted = true;

        let csv = to_csv(&[sample]);
        let mut lines = csv.lines();
        lines.next().unwrap();

        let row = lines.next().unwrap();
        assert!(lines.next().is_none());

        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 11);
        assert!(fields.iter().all(|f| f.starts_with('"') && f.ends_with('"')));
        assert_eq!(fields[0], "\"abc123\"");
        assert_eq!(fields[9], "\"SI\"");
        assert_eq!(fields[10], "\"NO\"");
    }
}
