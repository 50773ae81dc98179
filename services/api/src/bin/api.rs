//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    web::{
        achievements::{
            achievement_overview_handler, check_achievements_handler, unlock_achievement_handler,
        },
        challenges::{
            generate_today_handler, report_challenge_progress_handler, today_challenges_handler,
        },
        quizzes::{attempt_history_handler, submit_attempt_handler},
        rest::{
            category_progress_handler, progress_overview_handler, record_signs_handler,
            record_streak_handler, streak_calendar_handler, user_stats_handler, ApiDoc,
        },
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), db_adapter));

    // --- 4. Configure CORS ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, HeaderName::from_static("x-user-id")]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/users/streak", post(record_streak_handler))
        .route("/users/streak-calendar", get(streak_calendar_handler))
        .route("/users/stats", get(user_stats_handler))
        .route("/progress", get(progress_overview_handler))
        .route(
            "/progress/{category_id}",
            get(category_progress_handler).post(record_signs_handler),
        )
        .route("/quizzes/{quiz_id}/attempt", post(submit_attempt_handler))
        .route("/quizzes/{quiz_id}/attempts", get(attempt_history_handler))
        .route("/achievements", get(achievement_overview_handler))
        .route("/achievements/check", post(check_achievements_handler))
        .route(
            "/achievements/{achievement_id}/unlock",
            post(unlock_achievement_handler),
        )
        .route("/challenges/today", get(today_challenges_handler))
        .route("/challenges/generate-today", post(generate_today_handler))
        .route(
            "/challenges/{challenge_id}/progress",
            post(report_challenge_progress_handler),
        )
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
