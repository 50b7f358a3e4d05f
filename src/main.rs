//src/main.rs

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use clinica_leads::common::error::AppError;
use clinica_leads::config::AppState;
use clinica_leads::handlers;

#[tokio::main]
async fn main() {
    // Inicializa el logger antes que cualquier otra cosa.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() está bien acá: si la configuración falla, la aplicación no debe arrancar.
    let app_state = AppState::new().expect("Falla al inicializar el estado de la aplicación.");

    // CORS abierto: el frontend vive en otro origen y el preflight OPTIONS
    // corta acá mismo con 200.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    // Las dos rutas del proxy más el health check
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth", post(handlers::auth::login))
        .route(
            "/api/leads",
            get(handlers::leads::list).post(handlers::leads::mutate),
        )
        .method_not_allowed_fallback(|| async { AppError::MethodNotAllowed })
        .layer(cors)
        .with_state(app_state);

    // Inicia el servidor
    let addr = format!("0.0.0.0:{}", AppState::port());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falla al iniciar el listener TCP");
    tracing::info!("🚀 Servidor escuchando en {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Error en el servidor Axum");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Falla al instalar el handler de Ctrl+C");
        tracing::info!("Ctrl+C recibido, apagando");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Falla al instalar el handler de señales")
            .recv()
            .await;
        tracing::info!("SIGTERM recibido, apagando");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
