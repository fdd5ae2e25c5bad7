//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{InAppNotifier, MemoryStore, PgStore, PushGatewayNotifier},
    config::Config,
    error::ApiError,
    web::{
        cards_handler, matches_handler, middleware::require_actor, publish_listing_handler,
        rebuild_matches_handler, register_actor_handler, report_handler, rest::ApiDoc,
        state::AppState, submit_swipe_handler, ws_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use matchdeck_core::domain::Match;
use matchdeck_core::engine::SwipeEngine;
use matchdeck_core::ports::{MatchNotificationService, MatchingStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
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

    // --- 2. Select the Store (Postgres, or in-memory fallback) ---
    let store: Arc<dyn MatchingStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = Arc::new(PgStore::new(db_pool));
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            pg_store
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store (nothing will survive a restart)");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Initialize Notification Adapters ---
    let (events, _) = broadcast::channel::<Match>(256);
    let mut notifiers: Vec<Arc<dyn MatchNotificationService>> =
        vec![Arc::new(InAppNotifier::new(events.clone()))];
    if let Some(push_gateway_url) = &config.push_gateway_url {
        info!("Push notifications enabled via {}", push_gateway_url);
        notifiers.push(Arc::new(PushGatewayNotifier::new(
            reqwest::Client::new(),
            push_gateway_url.clone(),
        )));
    }

    // --- 4. Build the Engine and Shared AppState ---
    let engine = SwipeEngine::new(store.clone(), notifiers);
    let app_state = Arc::new(AppState {
        engine,
        store,
        config: config.clone(),
        events,
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Ingest and operator routes: called by the upstream profile system and
    // operators, protected at the network level rather than per-actor.
    let ingest_routes = Router::new()
        .route("/actors", post(register_actor_handler))
        .route("/listings", post(publish_listing_handler))
        .route("/admin/rebuild-matches", post(rebuild_matches_handler));

    // Actor routes (verified x-actor-id required)
    let actor_routes = Router::new()
        .route("/swipes", post(submit_swipe_handler))
        .route("/cards", get(cards_handler))
        .route("/matches", get(matches_handler))
        .route("/reports", post(report_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_actor,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(ingest_routes)
        .merge(actor_routes)
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
