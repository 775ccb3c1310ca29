//! Sitemap generation configuration.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    entry::MAX_SITEMAP_URLS,
    error::{CoreError, Result},
    normalize::Normalizer,
    validate::ValidationLevel,
};

/// Configuration shared by documents, streams and the index writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Base URL that relative entry URLs resolve against
    /// (e.g. "https://example.com").
    #[serde(default)]
    pub base_url: Option<String>,

    /// Serialization cache TTL in milliseconds. Zero disables caching.
    #[serde(default)]
    pub cache_ttl_ms: u64,

    /// Maximum entries per document when partitioning.
    #[serde(default = "default_sitemap_size")]
    pub sitemap_size: usize,

    /// Whether partitioned documents are gzip-compressed.
    #[serde(default)]
    pub gzip: bool,

    /// XSL stylesheet href emitted as a processing instruction.
    #[serde(default)]
    pub xsl: Option<String>,

    /// Validation strictness on entry admission.
    #[serde(default)]
    pub validation: ValidationLevel,
}

fn default_sitemap_size() -> usize {
    MAX_SITEMAP_URLS
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            cache_ttl_ms: 0,
            sitemap_size: default_sitemap_size(),
            gzip: false,
            xsl: None,
            validation: ValidationLevel::default(),
        }
    }
}

impl SitemapConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sitemap_size == 0 {
            return Err(CoreError::config("sitemap_size cannot be zero"));
        }

        if self.sitemap_size > MAX_SITEMAP_URLS {
            return Err(CoreError::config(format!(
                "sitemap_size {} exceeds the protocol limit of {MAX_SITEMAP_URLS}",
                self.sitemap_size
            )));
        }

        if let Some(base) = &self.base_url {
            url::Url::parse(base).map_err(|source| CoreError::InvalidUrl {
                url: base.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Build a normalizer for this configuration.
    pub fn normalizer(&self) -> Result<Normalizer> {
        Normalizer::new(self.base_url.as_deref())
    }

    /// Cache TTL as a duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}
