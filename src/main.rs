use axum::{routing::get, Router};
use std::time::Duration;
use tokio::task;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showseat::{config::Config, controllers, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Showseat API");

    let state = AppState::new(config).await?;
    info!("Database connected, migrations applied");

    // Periodic stuck-seat reconciliation: compensation failures and abandoned
    // holds are reclaimed here.
    let sweep_state = state.clone();
    task::spawn(async move {
        let interval = Duration::from_secs(sweep_state.config.reconcile.sweep_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            match sweep_state.reconcile.sweep_all().await {
                Ok(report) => {
                    if report.stuck_released > 0 || report.expired_holds_released > 0 {
                        info!(
                            stuck = report.stuck_released,
                            expired_holds = report.expired_holds_released,
                            "reconciliation sweep completed"
                        );
                    }
                }
                Err(e) => error!(error = %e, "reconciliation sweep failed"),
            }
        }
    });

    let app = Router::new()
        .route("/", get(|| async { "Showseat API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", state.config.app.host, state.config.app.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
