use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;
use crate::utils::error::Result;

pub mod routes;
pub mod state;

use routes::*;
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/profits/offers", get(offer_stats_handler))
        .route("/profits/affiliates", get(affiliate_stats_handler))
        .route("/profits/advertisers", get(advertiser_stats_handler))
        .route("/dashboard/stats", get(dashboard_stats_handler))
        .route("/conversions", get(conversions_handler))
        .route("/offers", get(offers_handler))
        .route("/affiliates", get(affiliates_handler))
        .route("/affiliates/tiers", get(affiliate_tiers_handler))
        .route("/advertisers", get(advertisers_handler))
        .route("/advertisers/:id", get(advertiser_handler))
        .route("/dashboard", get(affiliate_dashboard_handler))
        .route("/everflow/test", get(test_connection_handler))
        .route("/debug/everflow", get(debug_config_handler))
        .route("/debug/everflow/test", get(debug_sample_call_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    info!("Initializing state...");
    let address = config.server.address();
    let state = AppState::new(config)?;

    info!("Starting server...");
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
