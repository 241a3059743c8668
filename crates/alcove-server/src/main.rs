mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use alcove_api::auth::{AppState, AppStateInner};
use alcove_api::mailer::Mailer;
use alcove_kv::KvClient;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alcove=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Shared state
    let kv = KvClient::new(config.kv_url.parse()?, &config.kv_token);
    let mailer = Mailer::new(
        config.mail_api_url.parse()?,
        &config.mail_api_key,
        config.mail_from(),
    );
    let state: AppState = Arc::new(AppStateInner {
        kv,
        mailer,
        site_name: config.site_name.clone(),
    });

    let app = alcove_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("alcove server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
