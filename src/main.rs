mod bot;
mod config;
mod db;
mod scheduler;
mod sources;
mod utils;

use crate::bot::platform::{OperatorAlert, TenantState};
use crate::bot::{Notifier, TelegramPlatform};
use crate::config::{BooruSourceConfig, Config};
use crate::db::repo::Repo;
use crate::scheduler::PollScheduler;
use crate::sources::{BooruSource, ContentSource, FurAffinitySource};
use crate::utils::spoiler::SpoilerPolicy;
use anyhow::{Context, Result};
use booru_client::BooruClient;
use fa_client::FaClient;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Everything a scheduler needs besides its source
struct Shared {
    repo: Arc<Repo>,
    tenants: Arc<dyn TenantState>,
    notifier: Notifier,
    alert: Arc<dyn OperatorAlert>,
    config: Config,
}

impl Shared {
    fn spawn<S: ContentSource>(
        &self,
        source: S,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let scheduler = Arc::new(PollScheduler::new(
            source,
            self.repo.clone(),
            self.tenants.clone(),
            self.notifier.clone(),
            self.alert.clone(),
            self.config.telegram.owner_id,
            &self.config.scheduler,
        ));
        tokio::spawn(scheduler.run(shutdown))
    }

    fn booru_source(
        &self,
        section: &BooruSourceConfig,
        default_service: &str,
        http: &reqwest::Client,
    ) -> BooruSource {
        let service_type = section
            .service_type
            .clone()
            .unwrap_or_else(|| default_service.to_string());
        let client = BooruClient::with_client(http.clone(), section.client_config());
        BooruSource::new(service_type, client, self.config.scheduler.page_size)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    let log_level = config.log_level();
    let log_dir = &config.logging.dir;

    std::fs::create_dir_all(log_dir)?;

    // Daily rotated log file
    let file_appender = tracing_appender::rolling::daily(log_dir, "feedbot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = ChronoLocal::rfc_3339();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_timer(local_timer.clone());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_timer(local_timer)
        .with_writer(non_blocking);

    let filter_layer = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("sqlx=warn".parse()?)
        .add_directive("sea_orm=warn".parse()?);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Starting feedbot...");
    info!("Logs are written to: {}", log_dir);

    // Connect to database
    let db = db::establish_connection(&config.database.url).await?;
    info!("Database connection established");

    migration::Migrator::up(&db, None).await?;
    info!("✅ Database migrations completed");

    let repo = Arc::new(Repo::new(db));
    repo.ping().await?;
    info!("✅ Database ping successful");

    // One HTTP client shared by every content source
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let bot = bot::build_bot(&config.telegram)?;
    let platform = Arc::new(TelegramPlatform::new(bot, repo.clone()));
    let tenants: Arc<dyn TenantState> = repo.clone();

    if config.telegram.owner_id.is_none() {
        warn!("telegram.owner_id is not set, failure alerts will only be logged");
    }

    let notifier = Notifier::new(
        platform.clone(),
        tenants.clone(),
        SpoilerPolicy::new(config.content.spoiler_tags()),
        config.content.footer_url.as_deref(),
    );

    let shared = Shared {
        repo,
        tenants,
        notifier,
        alert: platform,
        config: config.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    if let Some(section) = config.booru.as_ref().filter(|s| s.enabled) {
        let source = shared.booru_source(section, "BixiBooru", &http);
        info!("✅ {} source enabled ({})", source.service_type(), section.base_url);
        handles.push(shared.spawn(source, shutdown_rx.clone()));
    }

    if let Some(section) = config.e621.as_ref().filter(|s| s.enabled) {
        let source = shared.booru_source(section, "e621", &http);
        info!("✅ {} source enabled ({})", source.service_type(), section.base_url);
        handles.push(shared.spawn(source, shutdown_rx.clone()));
    }

    if let Some(section) = config.furaffinity.as_ref().filter(|s| s.enabled) {
        let client = FaClient::with_client(http.clone(), section.client_config());
        let source = FurAffinitySource::new(client, config.scheduler.page_size as usize);
        info!("✅ {} source enabled", source.service_type());
        handles.push(shared.spawn(source, shutdown_rx.clone()));
    }

    if handles.is_empty() {
        warn!("No content source is enabled, nothing to poll");
    }

    info!("🤖 feedbot running with {} scheduler(s)", handles.len());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down...");

    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Scheduler task ended abnormally: {}", e);
        }
    }

    info!("✅ Shutdown complete");
    Ok(())
}
