use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jobrunner::Supervisor;
use jobs_server::auth::Credentials;
use jobs_server::config::ServerConfig;
use jobs_server::error::json_error_handler;
use jobs_server::handlers::{self, AppState};
use jobs_server::{routes, tls};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let tls_config = tls::load_server_config(&config.cert_file, &config.key_file)
        .context("loading TLS certificate and key")?;

    let credentials = Arc::new(Credentials::stored());
    let state = web::Data::new(AppState::new(Arc::new(Supervisor::new())));

    info!(port = config.port, "listening for job requests");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(handlers::health)
            .service(routes::jobs(credentials.clone()))
    })
    .bind_rustls_0_23(("0.0.0.0", config.port), tls_config)
    .context("binding HTTPS listener")?
    .run()
    .await?;

    Ok(())
}
