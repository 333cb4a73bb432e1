//! # Inkwell Blog Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let telemetry = TelemetryConfig::from_env();
    telemetry::init_telemetry(&telemetry);

    let config = AppConfig::from_env();

    tracing::info!(
        service = %telemetry.service_name,
        "Starting blog server on {}:{}",
        config.host,
        config.port
    );

    let state = web::Data::new(AppState::new(&config).await);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(state.clone())
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
