use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use clinicdesk::config::AppConfig;
use clinicdesk::db;
use clinicdesk::handlers;
use clinicdesk::services::ai::groq::GroqProvider;
use clinicdesk::services::ai::ollama::OllamaProvider;
use clinicdesk::services::ai::LlmProvider;
use clinicdesk::services::session::MemorySessionStore;
use clinicdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    db::seed::load_if_empty(&conn, &config.seed_path)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(
                !config.groq_api_key.is_empty(),
                "GROQ_API_KEY must be set when LLM_PROVIDER=groq"
            );
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
            ))
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm,
        sessions: Box::new(MemorySessionStore::new()),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .route("/doctors", get(handlers::doctors::list_doctors))
        .route("/doctors", post(handlers::doctors::add_doctor))
        .route("/doctors/departments", get(handlers::doctors::list_departments))
        .route(
            "/doctors/department/:department",
            get(handlers::doctors::doctors_by_department),
        )
        .route(
            "/doctors/:id/availability/:date",
            get(handlers::doctors::doctor_availability),
        )
        .route("/doctors/:id", delete(handlers::doctors::delete_doctor))
        .route("/bookings", post(handlers::bookings::create_booking))
        .route("/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/bookings/patient/:name",
            get(handlers::bookings::bookings_for_patient),
        )
        .route("/bookings/:id", delete(handlers::bookings::cancel_booking))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
