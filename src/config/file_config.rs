use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration file. Every field mirrors a CLI argument
/// and overrides it when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bucket_dir: Option<String>,
    pub public_base_url: Option<String>,
    pub url_signing_secret: Option<String>,
    pub sign_ttl_sec: Option<u64>,
    pub catalog_ttl_sec: Option<u64>,
    pub poll_interval_sec: Option<u64>,
    pub page_size: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_partial_config() {
        let config: FileConfig = toml::from_str(
            r#"
            bucket_dir = "/srv/loove"
            catalog_ttl_sec = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.bucket_dir.as_deref(), Some("/srv/loove"));
        assert_eq!(config.catalog_ttl_sec, Some(120));
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("tpyo = 1").is_err());
    }
}
