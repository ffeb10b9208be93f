use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use scheduling_cell::{LiveQueueHandle, LiveQueueMonitor, SupabaseAppointmentSource, SystemClock};
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic front-office API server");

    // Load configuration
    let config = AppConfig::from_env();
    let state = Arc::new(config);

    // Waiting-room displays kept live by this process
    let monitors = spawn_queue_monitors(&state);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], state.server_port));
    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    for monitor in monitors {
        info!("Stopping queue display for doctor {}", monitor.doctor_id());
        monitor.stop().await;
    }
}

fn spawn_queue_monitors(config: &Arc<AppConfig>) -> Vec<LiveQueueHandle> {
    let source = Arc::new(SupabaseAppointmentSource::new(config));

    config
        .queue_display_doctor_ids
        .iter()
        .map(|doctor_id| {
            info!("Starting queue display for doctor {}", doctor_id);
            LiveQueueMonitor::new(
                doctor_id.clone(),
                source.clone(),
                Arc::new(SystemClock),
                &config.scheduling,
            )
            .spawn()
        })
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
