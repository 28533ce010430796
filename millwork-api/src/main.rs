use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use millwork_api::{app, state::{AppState, AuthConfig}};
use millwork_store::{FileRuleRepository, RuleSnapshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "millwork_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = millwork_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Millwork API on port {}", config.server.port);

    // Pricing rules
    let rule_repo = Arc::new(FileRuleRepository::new(&config.pricing.rules_path));
    let rules = RuleSnapshot::default();
    let count = rules
        .refresh(rule_repo.as_ref())
        .await
        .with_context(|| format!("Failed to load pricing rules from {}", config.pricing.rules_path))?;
    tracing::info!("{} pricing rules active", count);

    let app_state = AppState::new(
        rules,
        rule_repo,
        config.presets.clone(),
        AuthConfig { secret: config.auth.jwt_secret.clone() },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
