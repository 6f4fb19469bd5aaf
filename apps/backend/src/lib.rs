pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        // RPC boundary
        .route("/rpc/get_cards_for_study", post(routes::study::get_cards_for_study))
        .route("/rpc/record_sr_review", post(routes::study::record_sr_review))
        .route("/rpc/get_teacher_stats", post(routes::teacher::get_teacher_stats))
        .route("/rpc/get_teacher_lessons", post(routes::teacher::get_teacher_lessons))
        .route("/rpc/delete_lesson", post(routes::teacher::delete_lesson))
        .route("/rpc/flag_content", post(routes::moderation::flag_content))
        // User routes
        .route("/api/users/me", get(routes::users::me))
        // Lesson routes
        .route("/api/lessons", get(routes::lessons::list).post(routes::lessons::create))
        .route("/api/lessons/:id/enroll", post(routes::lessons::enroll))
        .route("/api/lessons/:id/cards", post(routes::lessons::create_card))
        // Card routes
        .route("/api/cards/:id", put(routes::lessons::update_card))
        .route("/api/cards/:id/moderate", post(routes::moderation::moderate_card))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.max_connections).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let addr = config.bind_addr();
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    };

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
