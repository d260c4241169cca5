use anyhow::{Context, Result};
use clap::Parser;
use loove_server::config::{AppConfig, CliConfig, FileConfig};
use loove_server::notifications::NoopPushDelivery;
use loove_server::{
    CatalogIndex, CatalogIndexConfig, DocumentStore, FsBlobStore, NotificationScheduler,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Root directory of the local bucket (media folders plus the db/ tree).
    #[clap(long, value_parser = parse_path)]
    pub bucket_dir: Option<PathBuf>,

    /// Public base URL the signed stream links are rooted at.
    #[clap(long)]
    pub public_base_url: Option<String>,

    /// Secret shared with the media proxy for URL signing.
    #[clap(long)]
    pub url_signing_secret: Option<String>,

    /// Lifetime of signed stream URLs, in seconds.
    #[clap(long, default_value_t = 3600)]
    pub sign_ttl_sec: u64,

    /// How long the catalog snapshot stays warm, in seconds.
    #[clap(long, default_value_t = 600)]
    pub catalog_ttl_sec: u64,

    /// Notification scheduler polling interval, in seconds.
    #[clap(long, default_value_t = 60)]
    pub poll_interval_sec: u64,

    /// Page size for bucket listing calls.
    #[clap(long, default_value_t = 1000)]
    pub page_size: usize,

    /// Optional TOML config file; its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn into_cli_config(self) -> (CliConfig, Option<PathBuf>) {
        let config_path = self.config.clone();
        (
            CliConfig {
                bucket_dir: self.bucket_dir,
                public_base_url: self.public_base_url,
                url_signing_secret: self.url_signing_secret,
                sign_ttl_sec: self.sign_ttl_sec,
                catalog_ttl_sec: self.catalog_ttl_sec,
                poll_interval_sec: self.poll_interval_sec,
                page_size: self.page_size,
            },
            config_path,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (cli, config_path) = CliArgs::parse().into_cli_config();
    let file_config = config_path.as_deref().map(FileConfig::load).transpose()?;
    let config = AppConfig::resolve(&cli, file_config)?;
    info!("serving bucket at {:?}", config.bucket_dir);

    let blobs = Arc::new(FsBlobStore::new(
        config.bucket_dir.clone(),
        config.public_base_url.clone(),
        config.url_signing_secret.clone(),
    ));
    let documents = Arc::new(DocumentStore::new(blobs.clone()));
    let catalog = Arc::new(CatalogIndex::new(
        blobs.clone(),
        CatalogIndexConfig {
            ttl: config.catalog_ttl,
            page_size: config.page_size,
            ..Default::default()
        },
    ));
    // A cold catalog is not fatal; the first search warms it instead.
    match catalog.warm_up().await {
        Ok(count) => info!("catalog ready with {count} tracks"),
        Err(err) => error!("catalog warm-up failed: {err}"),
    }

    let scheduler = Arc::new(NotificationScheduler::new(
        blobs,
        documents,
        Arc::new(NoopPushDelivery),
        config.poll_interval,
    ));
    let cancel = CancellationToken::new();
    let scheduler_task = {
        let scheduler = scheduler.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");
    cancel.cancel();
    scheduler_task.await.context("joining scheduler task")?;
    Ok(())
}
