//! Analysis and engine configuration.
//!
//! [`AnalysisConfig`] is the per-call configuration surface: every field is
//! optional and unset fields inherit the engine defaults. [`EngineConfig`]
//! is loaded once from YAML and carries those defaults plus cache, directory
//! scan and batch settings.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::extract::BUILTIN_EXTRACTORS;
use crate::interpret::BUILTIN_INTERPRETERS;

/// Default cache time-to-live, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default number of results held in memory.
pub const DEFAULT_CACHE_ENTRIES: usize = 1000;

/// Per-call analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    /// Seconds a cached result stays valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor_options: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter_options: Option<BTreeMap<String, Value>>,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extractors<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.extractors = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn interpreters<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.interpreters = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = Some(enabled);
        self
    }

    pub fn cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl = Some(secs);
        self
    }

    pub fn extractor_option(mut self, extractor: &str, options: Value) -> Self {
        self.extractor_options
            .get_or_insert_with(BTreeMap::new)
            .insert(extractor.to_string(), options);
        self
    }

    pub fn interpreter_option(mut self, interpreter: &str, options: Value) -> Self {
        self.interpreter_options
            .get_or_insert_with(BTreeMap::new)
            .insert(interpreter.to_string(), options);
        self
    }

    /// Overlay `overrides` on `self`: every field set in `overrides` wins.
    pub fn merge(&self, overrides: &AnalysisConfig) -> AnalysisConfig {
        AnalysisConfig {
            extractors: overrides.extractors.clone().or_else(|| self.extractors.clone()),
            interpreters: overrides
                .interpreters
                .clone()
                .or_else(|| self.interpreters.clone()),
            use_cache: overrides.use_cache.or(self.use_cache),
            cache_ttl: overrides.cache_ttl.or(self.cache_ttl),
            extractor_options: overrides
                .extractor_options
                .clone()
                .or_else(|| self.extractor_options.clone()),
            interpreter_options: overrides
                .interpreter_options
                .clone()
                .or_else(|| self.interpreter_options.clone()),
        }
    }

    /// Fill every unset field. Plugin lists fall back to `extractors` and
    /// `interpreters`, the names currently registered.
    pub fn resolve(&self, extractors: &[String], interpreters: &[String]) -> ResolvedConfig {
        ResolvedConfig {
            extractors: self.extractors.clone().unwrap_or_else(|| extractors.to_vec()),
            interpreters: self
                .interpreters
                .clone()
                .unwrap_or_else(|| interpreters.to_vec()),
            use_cache: self.use_cache.unwrap_or(true),
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            extractor_options: self.extractor_options.clone().unwrap_or_default(),
            interpreter_options: self.interpreter_options.clone().unwrap_or_default(),
        }
    }

    /// Reject configurations no call could run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_names("extractors", self.extractors.as_deref())?;
        check_names("interpreters", self.interpreters.as_deref())?;
        if self.use_cache != Some(false) && self.cache_ttl == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "cacheTtl must be positive while caching is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_names(field: &str, names: Option<&[String]>) -> Result<(), AnalysisError> {
    let Some(names) = names else {
        return Ok(());
    };
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(format!(
                "{} contains an empty name",
                field
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(AnalysisError::InvalidConfig(format!(
                "{} lists '{}' more than once",
                field, name
            )));
        }
    }
    Ok(())
}

/// An [`AnalysisConfig`] with every field concrete.
///
/// Its JSON form is canonical (fixed field order, sorted option maps) and is
/// what cache keys are derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub extractors: Vec<String>,
    pub interpreters: Vec<String>,
    pub use_cache: bool,
    pub cache_ttl: u64,
    pub extractor_options: BTreeMap<String, Value>,
    pub interpreter_options: BTreeMap<String, Value>,
}

impl ResolvedConfig {
    /// Canonical JSON used for cache keys.
    pub fn canonical_json(&self) -> String {
        // serde_json maps are sorted unless preserve_order is enabled
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// Persist results to disk.
    pub persist: bool,
    /// Persistence directory; the platform cache directory when unset.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_ENTRIES,
            persist: false,
            directory: None,
        }
    }
}

/// Engine-wide configuration, usually loaded from YAML.
///
/// ```yaml
/// defaults:
///   interpreters: [dependency_summary]
///   cacheTtl: 600
/// cache:
///   max_entries: 500
///   persist: true
/// exclude:
///   - "**/node_modules/**"
/// parallel: true
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: AnalysisConfig,
    pub cache: CacheConfig,
    /// Glob patterns skipped by directory scans.
    pub exclude: Vec<String>,
    /// Analyze batches on the rayon thread pool.
    pub parallel: bool,
}

impl EngineConfig {
    /// Parse an engine configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_str(&content)
    }

    /// Parse an engine configuration from YAML text.
    pub fn parse_str(content: &str) -> Result<Self, AnalysisError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.defaults.validate()?;
        if self.cache.max_entries == 0 {
            return Err(AnalysisError::InvalidConfig(
                "cache.max_entries must be positive".to_string(),
            ));
        }
        self.exclude_set()?;
        Ok(())
    }

    /// Compiled exclude globs.
    pub fn exclude_set(&self) -> Result<GlobSet, AnalysisError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|err| {
                AnalysisError::InvalidConfig(format!("invalid exclude glob '{}': {}", pattern, err))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|err| AnalysisError::InvalidConfig(format!("invalid exclude globs: {}", err)))
    }
}

/// Built-in plugin names, for resolving a config without an engine.
pub fn builtin_names() -> (Vec<String>, Vec<String>) {
    (
        BUILTIN_EXTRACTORS.iter().map(|s| s.to_string()).collect(),
        BUILTIN_INTERPRETERS.iter().map(|s| s.to_string()).collect(),
    )
}
