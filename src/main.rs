use aletheia::analysis::client::GeminiClient;
use aletheia::analysis::Analyzer;
use aletheia::config::Config;
use aletheia::engine::session::Session;
use aletheia::engine::{Dashboard, DashboardCommand};
use aletheia::feed::cache::CachedFeed;
use aletheia::feed::google_news::GoogleNewsRss;
use aletheia::publish::{PublishDesk, PublishTarget};
use aletheia::tui::{self, state::AppState};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("aletheia.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aletheia=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load_or_default(Path::new("config.toml"))?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();
    let api_key = Config::google_api_key();
    if api_key.is_none() {
        tracing::warn!("no model API key found; analysis will fail until GOOGLE_API_KEY is set");
    }

    let client = GeminiClient::new(&config.model, api_key).context("building model client")?;
    let has_credential = client.has_credential();
    let analyzer = Analyzer::new(Box::new(client));

    let feed = CachedFeed::new(
        GoogleNewsRss::new(&config.feed).context("building feed client")?,
        Duration::from_secs(config.feed.cache_ttl_s),
    );

    let mut default_targets = BTreeSet::new();
    for label in &config.publish.default_targets {
        match PublishTarget::from_label(label) {
            Some(target) => {
                default_targets.insert(target);
            }
            None => tracing::warn!(label = %label, "unknown publish target in config"),
        }
    }

    let session = Session::new(
        config.model.models.clone(),
        config.dashboard.auto_process,
        default_targets,
    );

    // Channels
    let (state_tx, state_rx) = watch::channel(AppState::new(has_credential));
    let (cmd_tx, cmd_rx) = mpsc::channel::<DashboardCommand>(16);

    let dashboard = Dashboard::new(session, Box::new(feed), analyzer, PublishDesk::dry_run(), state_tx);
    let engine = tokio::spawn(dashboard.run(cmd_rx));

    tracing::info!(model = %config.model.models.first().map(String::as_str).unwrap_or(""), "dashboard started");

    tui::run_tui(state_rx, cmd_tx, config.dashboard.default_topic.clone()).await?;

    engine.abort();
    tracing::info!("dashboard stopped");
    Ok(())
}
