mod anonymize;
mod config;
mod errors;
mod extract;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::anonymize::PatternSet;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::judge::{DisabledJudge, Judge, LlmJudge};
use crate::screening::roles::RoleCatalog;
use crate::screening::Screener;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable values or an inconsistent policy)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Name/pattern database (fatal only when no list loads at all)
    let patterns = PatternSet::load(&config.names_dir, &config.phone_patterns)
        .with_context(|| format!("Failed to build pattern set from {}", config.names_dir.display()))?;

    // Role catalog
    let catalog = RoleCatalog::load(&config.roles_path)?;

    // External judge (disabled unless a provider is configured)
    let judge: Arc<dyn Judge> = match &config.llm {
        Some(settings) => {
            let llm = LlmClient::new(settings.clone()).context("Failed to build LLM client")?;
            info!(
                "Judge enabled (provider: {}, model: {})",
                llm.provider(),
                llm.model()
            );
            Arc::new(LlmJudge::new(llm))
        }
        None => {
            info!("Judge disabled; decisions are skills-only");
            Arc::new(DisabledJudge)
        }
    };

    let screener = Screener::new(patterns, catalog, judge)
        .with_policy(config.policy)
        .with_weights(config.weights)
        .with_judge_timeout(config.judge_timeout);
    info!(
        "Decision policy: skills threshold {:.2}, hard floor {:.2}",
        config.policy.skills_threshold(),
        config.policy.hard_floor()
    );

    // Build app state
    let state = AppState {
        screener: Arc::new(screener),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
