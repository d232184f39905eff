use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ipo_common::NotifyConfig;
use ipo_notify::webhook::Webhook;
use ipo_notify::{build_router, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = NotifyConfig::from_env().context("Failed to load notify configuration")?;
    config.log_redacted();

    let mailer = mailer::build_mailer(
        config.email_provider,
        config.email_api_key.as_deref(),
        config.mailgun_domain.as_deref(),
    )
    .context("Failed to configure email provider")?;

    let state = Arc::new(AppState {
        mailer,
        email_from: config.email_from.clone(),
        email_to: config.email_to.clone(),
        digest_token: config.digest_token.clone(),
        webhook: config.webhook_url.as_deref().map(Webhook::new),
    });
    let app = build_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    info!("IPO notify server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
