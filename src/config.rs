// Global configuration constants - single source of truth

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keys::NAMESPACE_SEPARATOR;
use crate::store::StoreError;

pub struct Config;

impl Config {
    // Store file
    pub const DEFAULT_FILE_NAME: &'static str = "crawl_store.redb";
    pub const DEFAULT_FILE_MODE: u32 = 0o600;

    // Namespacing
    pub const DEFAULT_PREFIX: &'static str = "crawl";
}

/// How hard redb should try to persist each commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilityLevel {
    /// Commit is durable when the call returns.
    #[default]
    Immediate,
    /// Commit is persisted at some point after it returns.
    Eventual,
    /// Commit is not persisted until a later durable commit.
    None,
}

impl From<DurabilityLevel> for redb::Durability {
    fn from(level: DurabilityLevel) -> Self {
        match level {
            DurabilityLevel::Immediate => redb::Durability::Immediate,
            DurabilityLevel::Eventual => redb::Durability::Eventual,
            DurabilityLevel::None => redb::Durability::None,
        }
    }
}

/// Tuning passed straight through to redb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Page cache size in bytes; redb's default when unset.
    pub cache_size: Option<usize>,
    pub durability: DurabilityLevel,
}

/// Everything needed to open a [`CrawlStore`](crate::store::CrawlStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Permission bits for a newly created store file (unix only).
    pub mode: u32,
    /// Key prefix separating logical crawlers inside one root namespace.
    pub prefix: String,
    /// Root namespace name. Falls back to the prefix.
    pub bucket: Option<String>,
    pub engine: EngineOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Config::DEFAULT_FILE_NAME),
            mode: Config::DEFAULT_FILE_MODE,
            prefix: Config::DEFAULT_PREFIX.to_string(),
            bucket: None,
            engine: EngineOptions::default(),
        }
    }
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_engine(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }

    pub fn bucket_name(&self) -> &str {
        self.bucket.as_deref().unwrap_or(&self.prefix)
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let bucket = self.bucket_name();
        if bucket.is_empty() {
            return Err(StoreError::Config("bucket name must not be empty".to_string()));
        }
        // A separator would make this root look like a child of another root.
        if bucket.contains(NAMESPACE_SEPARATOR) {
            return Err(StoreError::Config(format!(
                "bucket name {:?} must not contain {:?}",
                bucket, NAMESPACE_SEPARATOR
            )));
        }
        Ok(())
    }
}
