//! Axum-based HTTP gateway for AniCare. Config-driven via CoreConfig.

mod error;
mod handlers;

use anicare_core::{
    default_products, default_training_programs, CoreConfig, MemoryStore, PetCareStore, SledStore, StorageBackend,
};
use anicare_skills::{CareRecommendationGenerator, ChatResponder, LlmMode, ModelRouter, TextGenerator};
use axum::http::Method;
use axum::{extract::State, routing::get, routing::post, Json, Router};
use handlers::{catalog, chat, profiles};
use std::net::SocketAddr;
use std::path::Path as StdPath;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn open_store(config: &CoreConfig) -> Result<Arc<dyn PetCareStore>, String> {
    match config.storage_backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Sled => {
            let path = config.sled_path();
            let store = SledStore::open_path(&path)
                .map_err(|e| format!("{} LOCKED or inaccessible: {}", path.display(), e))?;
            Ok(Arc::new(store))
        }
    }
}

fn listen_addr(config: &CoreConfig) -> Result<SocketAddr, String> {
    format!("{}:{}", config.bind_address, config.port)
        .parse()
        .map_err(|e| format!("Invalid bind address '{}': {}", config.bind_address, e))
}

/// Pre-flight check: config loads, store opens and is readable, port is available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking {} store... ", config.storage_backend.as_str());
    let store = open_store(&config)?;
    store
        .latest_profile()
        .map_err(|e| format!("profile read failed: {}", e))?;
    let products = store.products(None).map_err(|e| format!("catalog read failed: {}", e))?;
    drop(store);
    println!("OK ({} catalog products)", products.len());

    print!("Checking generation credential... ");
    if ModelRouter::api_key_from_env().is_some() {
        println!("OK");
    } else {
        println!("MISSING (rule-based fallbacks will answer)");
    }

    let addr = listen_addr(&config)?;
    print!("Checking {}... ", addr);
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", config.port, e));
        }
    }

    println!("\nSUCCESS: ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[anicare-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(target: "anicare::gateway", "{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = Arc::new(CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?);

    let store = open_store(&config)?;
    match store.seed_catalog(default_products(), default_training_programs()) {
        Ok(true) => tracing::info!(target: "anicare::gateway", "Catalog seeded"),
        Ok(false) => tracing::debug!(target: "anicare::gateway", "Catalog already present"),
        Err(e) => tracing::warn!(target: "anicare::gateway", error = %e, "Failed to seed catalog"),
    }

    let model_router =
        Arc::new(ModelRouter::from_config(&config).map_err(|e| format!("HTTP client setup failed: {}", e))?);
    if model_router.mode() == LlmMode::Live && !model_router.has_api_key() {
        tracing::warn!(
            target: "anicare::gateway",
            "No OPENAI_API_KEY set; recommendations and chat will use rule-based fallbacks"
        );
    }

    let addr = listen_addr(&config)?;
    let app = build_app(AppState::new(Arc::clone(&config), Arc::clone(&store), model_router));

    tracing::info!(
        target: "anicare::gateway",
        backend = config.storage_backend.as_str(),
        llm_mode = %config.llm_mode,
        "{} listening on {}",
        config.app_name,
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {} failed: {}", addr, e))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(target: "anicare::gateway", error = %e, "Could not listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!(target: "anicare::gateway", "Shutting down");
        })
        .await
        .map_err(|e| format!("server error: {}", e))?;
    store.flush().map_err(|e| format!("store flush failed: {}", e))
}

fn build_app(state: AppState) -> Router {
    let frontend_enabled = state.config.frontend_enabled;
    let frontend_dir = StdPath::new(&state.config.frontend_dir).to_path_buf();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route(
            "/api/pet-profiles",
            post(profiles::create_profile).get(profiles::latest_profile),
        )
        .route("/api/pet-profiles/:id", get(profiles::get_profile))
        .route("/api/care-recommendations/:profile_id", get(profiles::care_recommendations))
        .route("/api/chat", post(chat::send_message))
        .route("/api/chat/:session_id", get(chat::history))
        .route("/api/products", get(catalog::products))
        .route("/api/products/recommended", get(catalog::recommended_products))
        .route("/api/training-programs", get(catalog::training_programs))
        .with_state(state);

    if frontend_enabled {
        let index_file = frontend_dir.join("index.html");
        if !index_file.exists() {
            tracing::warn!(
                target: "anicare::gateway",
                path = %index_file.display(),
                "Frontend enabled but index.html is missing"
            );
        }
        // Unknown paths fall through to index.html for client-side routing.
        app = app.fallback_service(ServeDir::new(&frontend_dir).fallback(ServeFile::new(index_file)));
    }

    app.layer(TraceLayer::new_for_http()).layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) store: Arc<dyn PetCareStore>,
    pub(crate) model_router: Arc<ModelRouter>,
    pub(crate) recommendations: Arc<CareRecommendationGenerator>,
    pub(crate) chat: Arc<ChatResponder>,
}

impl AppState {
    fn new(config: Arc<CoreConfig>, store: Arc<dyn PetCareStore>, model_router: Arc<ModelRouter>) -> Self {
        let generator: Arc<dyn TextGenerator> = model_router.clone();
        Self::with_generator(config, store, model_router, generator)
    }

    /// `generator` backs both features; `model_router` is only reported by `/api/status`.
    fn with_generator(
        config: Arc<CoreConfig>,
        store: Arc<dyn PetCareStore>,
        model_router: Arc<ModelRouter>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            store,
            model_router,
            recommendations: Arc::new(CareRecommendationGenerator::new(Arc::clone(&generator))),
            chat: Arc::new(ChatResponder::new(generator)),
        }
    }
}

/// GET /api/health – liveness check for UI and scripts.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/status – app identity, generation mode and storage backend.
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "app_name": state.config.app_name,
        "llm_mode": state.model_router.mode().as_str(),
        "model": state.model_router.model(),
        "api_key_configured": state.model_router.has_api_key(),
        "storage_backend": state.store.backend_name(),
        "frontend_enabled": state.config.frontend_enabled,
    }))
}
