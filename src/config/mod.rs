mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that participate in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub bucket_dir: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub url_signing_secret: Option<String>,
    pub sign_ttl_sec: u64,
    pub catalog_ttl_sec: u64,
    pub poll_interval_sec: u64,
    pub page_size: usize,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bucket_dir: PathBuf,
    pub public_base_url: String,
    pub url_signing_secret: String,
    pub sign_ttl: Duration,
    pub catalog_ttl: Duration,
    pub poll_interval: Duration,
    pub page_size: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let bucket_dir = file
            .bucket_dir
            .map(PathBuf::from)
            .or_else(|| cli.bucket_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("bucket_dir must be specified via --bucket-dir or in config file")
            })?;
        if !bucket_dir.is_dir() {
            bail!("bucket directory does not exist: {:?}", bucket_dir);
        }

        let public_base_url = file
            .public_base_url
            .or_else(|| cli.public_base_url.clone())
            .ok_or_else(|| anyhow::anyhow!("public_base_url must be specified"))?;

        let url_signing_secret = file
            .url_signing_secret
            .or_else(|| cli.url_signing_secret.clone())
            .ok_or_else(|| anyhow::anyhow!("url_signing_secret must be specified"))?;

        let sign_ttl = Duration::from_secs(file.sign_ttl_sec.unwrap_or(cli.sign_ttl_sec));
        let catalog_ttl = Duration::from_secs(file.catalog_ttl_sec.unwrap_or(cli.catalog_ttl_sec));
        let poll_interval =
            Duration::from_secs(file.poll_interval_sec.unwrap_or(cli.poll_interval_sec));
        if poll_interval.is_zero() {
            bail!("poll_interval_sec must be at least 1");
        }
        let page_size = file.page_size.unwrap_or(cli.page_size);
        if page_size == 0 {
            bail!("page_size must be at least 1");
        }

        Ok(Self {
            bucket_dir,
            public_base_url,
            url_signing_secret,
            sign_ttl,
            catalog_ttl,
            poll_interval,
            page_size,
        })
    }
}
