//! The analysis orchestrator.
//!
//! [`AnalysisEngine`] drives parse, extract, interpret and cache for each
//! file:
//!
//! ```text
//! Idle -> CacheCheck -> Parsing -> Extracting -> Interpreting -> Caching -> Done
//! ```
//!
//! Per-file problems (no provider, unreadable file, no tree) end the
//! pipeline early with an error-shaped [`AnalysisResult`]. Only call-level
//! misuse, a disabled engine or an invalid configuration, is returned as
//! `Err`. Within one file the stages always run in order; across files,
//! [`AnalysisEngine::analyze_batch_parallel`] may run pipelines
//! concurrently, sharing only the cache and the metrics.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use globset::GlobSet;
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{cache_key, CacheReport, CacheStats, ResultCache};
use crate::config::{AnalysisConfig, EngineConfig, ResolvedConfig};
use crate::error::AnalysisError;
use crate::extract::{self, Extractor, ExtractorRegistry};
use crate::interpret::{self, Interpreter, InterpreterRegistry};
use crate::parser::{ParserRegistry, SyntaxProvider};
use crate::plugin::{ExecutionReport, PluginContext};

mod metrics;
mod result;

pub use metrics::{EngineMetrics, RunningAverage};
pub use result::{AnalysisResult, InterpretedData, MemoryUsage, PerformanceMetrics, ResultMetadata};

use result::millis;

/// Bytes read from files an extension alone does not place.
const SNIFF_BYTES: u64 = 4096;

/// Language recorded when no provider claims a file.
const UNKNOWN_LANGUAGE: &str = "unknown";

/// Facade over the parser, extractor and interpreter registries.
pub struct AnalysisEngine {
    parsers: RwLock<ParserRegistry>,
    extractors: RwLock<ExtractorRegistry>,
    interpreters: RwLock<InterpreterRegistry>,
    cache: ResultCache<AnalysisResult>,
    config: EngineConfig,
    exclude: GlobSet,
    metrics: Mutex<EngineMetrics>,
    enabled: AtomicBool,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    /// Engine with every built-in provider and plugin and default settings.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), GlobSet::empty())
    }

    /// Engine with built-ins and the given settings.
    pub fn with_config(config: EngineConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let exclude = config.exclude_set()?;
        Ok(Self::build(config, exclude))
    }

    /// Engine configured from a YAML file.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        Self::with_config(EngineConfig::parse_file(path)?)
    }

    fn build(config: EngineConfig, exclude: GlobSet) -> Self {
        crate::analysis::register_analyzers();
        Self {
            parsers: RwLock::new(ParserRegistry::with_builtin()),
            extractors: RwLock::new(extract::builtin_registry()),
            interpreters: RwLock::new(interpret::builtin_registry()),
            cache: ResultCache::from_config(&config.cache),
            config,
            exclude,
            metrics: Mutex::new(EngineMetrics::default()),
            enabled: AtomicBool::new(true),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Lifecycle

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Reject every analysis call until re-enabled.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn ensure_enabled(&self) -> Result<(), AnalysisError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(AnalysisError::EngineDisabled)
        }
    }

    // Registration

    /// Register a syntax provider. A name collision replaces the earlier one.
    pub fn register_parser(&self, provider: Arc<dyn SyntaxProvider>) {
        self.parsers.write().register(provider);
    }

    pub fn register_extractor(&self, name: &str, extractor: Box<Extractor>) {
        self.extractors.write().register(name, extractor);
    }

    pub fn register_interpreter(&self, name: &str, interpreter: Box<Interpreter>) {
        self.interpreters.write().register(name, interpreter);
    }

    /// Remove and dispose an extractor.
    pub fn unregister_extractor(&self, name: &str) -> bool {
        self.extractors.write().unregister(name)
    }

    /// Remove and dispose an interpreter.
    pub fn unregister_interpreter(&self, name: &str) -> bool {
        self.interpreters.write().unregister(name)
    }

    pub fn extractor_names(&self) -> Vec<String> {
        self.extractors.read().names()
    }

    pub fn interpreter_names(&self) -> Vec<String> {
        self.interpreters.read().names()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.parsers.read().supported_languages()
    }

    /// Language id of the provider that would claim the file.
    pub fn detect_language(&self, path: &Path, content: Option<&str>) -> Option<String> {
        self.parsers.read().detect_language(path, content)
    }

    // Analysis

    /// Analyze a file on disk.
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let path = path.as_ref();
        let resolved = self.prepare(config)?;
        Ok(self.run(path, &resolved, || {
            fs::read_to_string(path).map_err(|source| AnalysisError::Io {
                path: path.display().to_string(),
                source,
            })
        }))
    }

    /// Analyze raw source text. `virtual_path` is used for language
    /// detection, dependency resolution and the cache key.
    pub fn analyze_content<P: AsRef<Path>>(
        &self,
        content: &str,
        virtual_path: P,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let resolved = self.prepare(config)?;
        Ok(self.run(virtual_path.as_ref(), &resolved, || Ok(content.to_string())))
    }

    /// Analyze files one after another, in input order. A failing file
    /// yields an error-shaped result and the batch continues.
    pub fn analyze_batch<P: AsRef<Path>>(
        &self,
        paths: &[P],
        config: &AnalysisConfig,
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        self.prepare(config)?;
        Ok(paths
            .iter()
            .map(|path| self.analyze_or_fail(path.as_ref(), config))
            .collect())
    }

    /// Analyze files on the rayon pool. Results keep input order.
    pub fn analyze_batch_parallel<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
        config: &AnalysisConfig,
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        self.prepare(config)?;
        Ok(paths
            .par_iter()
            .map(|path| self.analyze_or_fail(path.as_ref(), config))
            .collect())
    }

    /// Analyze every file under `root` that some provider claims and no
    /// exclude glob matches, sorted by path. Hidden directories are skipped.
    pub fn analyze_directory<P: AsRef<Path>>(
        &self,
        root: P,
        config: &AnalysisConfig,
    ) -> Result<Vec<AnalysisResult>, AnalysisError> {
        self.prepare(config)?;
        let files = self.collect_files(root.as_ref());
        info!(root = %root.as_ref().display(), files = files.len(), "analyzing directory");
        if self.config.parallel {
            self.analyze_batch_parallel(&files, config)
        } else {
            self.analyze_batch(&files, config)
        }
    }

    /// Analyze a file, giving up after `timeout`. The timeout wraps the
    /// whole pipeline; an abandoned analysis finishes in the background and
    /// its result is discarded.
    pub fn analyze_file_with_timeout<P: AsRef<Path>>(
        self: &Arc<Self>,
        path: P,
        config: &AnalysisConfig,
        timeout: Duration,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.prepare(config)?;
        let path = path.as_ref().to_path_buf();
        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(self);
        let worker_path = path.clone();
        let worker_config = config.clone();
        thread::spawn(move || {
            let _ = tx.send(engine.analyze_file(&worker_path, &worker_config));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => {
                let err = AnalysisError::Timeout {
                    path: path.display().to_string(),
                    millis: timeout.as_millis(),
                };
                warn!(path = %path.display(), "analysis timed out");
                let language = self
                    .detect_language(&path, None)
                    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
                let mut result = AnalysisResult::failed(path.display().to_string(), language, &err);
                result.performance_metrics.total_time_ms = millis(timeout);
                self.metrics.lock().record(&result, false);
                Ok(result)
            }
        }
    }

    fn analyze_or_fail(&self, path: &Path, config: &AnalysisConfig) -> AnalysisResult {
        self.analyze_file(path, config).unwrap_or_else(|err| {
            let language = self
                .detect_language(path, None)
                .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
            AnalysisResult::failed(path.display().to_string(), language, &err)
        })
    }

    /// Merge with defaults, validate and fill every field.
    fn prepare(&self, config: &AnalysisConfig) -> Result<ResolvedConfig, AnalysisError> {
        self.ensure_enabled()?;
        let merged = self.config.defaults.merge(config);
        merged.validate()?;
        Ok(merged.resolve(&self.extractor_names(), &self.interpreter_names()))
    }

    /// Cache check, then the pipeline, then write-through on success.
    fn run(
        &self,
        path: &Path,
        resolved: &ResolvedConfig,
        load: impl FnOnce() -> Result<String, AnalysisError>,
    ) -> AnalysisResult {
        let started = Instant::now();
        let path_str = path.display().to_string();

        if !resolved.use_cache {
            let mut result = self.pipeline(path, &path_str, resolved, load);
            result.performance_metrics.total_time_ms = millis(started.elapsed());
            self.metrics.lock().record(&result, false);
            return result;
        }

        let key = cache_key(&path_str, resolved);
        let slot = self.inflight_slot(&key);
        let result = {
            let _held = slot.lock();
            let lookup = Instant::now();
            if let Some(mut cached) = self.cache.get(&key) {
                debug!(path = %path_str, "cache hit");
                cached.metadata.from_cache = true;
                cached.performance_metrics =
                    PerformanceMetrics::cache_hit(lookup.elapsed(), started.elapsed());
                cached
            } else {
                let lookup_ms = millis(lookup.elapsed());
                let mut result = self.pipeline(path, &path_str, resolved, load);
                result.performance_metrics.cache_lookup_ms = lookup_ms;
                result.performance_metrics.total_time_ms = millis(started.elapsed());
                if result.is_success() {
                    self.cache.put(
                        &key,
                        result.clone(),
                        Duration::from_secs(resolved.cache_ttl),
                    );
                }
                result
            }
        };
        self.release_slot(&key, slot);

        self.metrics.lock().record(&result, true);
        result
    }

    /// Lock shared by concurrent calls for the same key.
    fn inflight_slot(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.inflight
                .lock()
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    fn release_slot(&self, key: &str, slot: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock();
        // the map and this caller hold the only references
        if Arc::strong_count(&slot) <= 2 {
            inflight.remove(key);
        }
    }

    /// Parse, extract and interpret one file.
    fn pipeline(
        &self,
        path: &Path,
        path_str: &str,
        resolved: &ResolvedConfig,
        load: impl FnOnce() -> Result<String, AnalysisError>,
    ) -> AnalysisResult {
        let source = match load() {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %path_str, error = %err, "cannot read file");
                let language = self
                    .detect_language(path, None)
                    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());
                return AnalysisResult::failed(path_str, language, &err);
            }
        };

        let Some(provider) = self.parsers.read().detect_and_get_parser(path, Some(&source)) else {
            let err = AnalysisError::UnsupportedLanguage {
                path: path_str.to_string(),
            };
            debug!(path = %path_str, "no provider claims file");
            return AnalysisResult::failed(path_str, UNKNOWN_LANGUAGE, &err);
        };

        let parse_started = Instant::now();
        let parsed = provider.parse(&source, path);
        let parse_ms = millis(parse_started.elapsed());
        let (language, tree, parse_errors, parse_warnings) = parsed.into_parts();

        let mut result = AnalysisResult::new(path_str, language.as_str());
        result.warnings = parse_warnings;
        result.performance_metrics.parse_time_ms = parse_ms;
        result.performance_metrics.memory.source_bytes = source.len();

        let Some(tree) = tree else {
            let err = AnalysisError::ParseFailure {
                path: path_str.to_string(),
                language: language.clone(),
                message: parse_errors.join("; "),
            };
            warn!(path = %path_str, language = %language, "parse failed");
            result.errors.push((&err).into());
            return result;
        };

        let context = PluginContext::new(path, language.as_str());

        let extract_started = Instant::now();
        let extraction = self.extractors.read().execute_selected(
            Some(resolved.extractors.as_slice()),
            &tree,
            &context,
            &resolved.extractor_options,
        );
        result.performance_metrics.extraction_time_ms = millis(extract_started.elapsed());

        let interpret_started = Instant::now();
        let interpretation = self.interpreters.read().execute_selected(
            Some(resolved.interpreters.as_slice()),
            &extraction.outputs,
            &context,
            &resolved.interpreter_options,
        );
        result.performance_metrics.interpretation_time_ms = millis(interpret_started.elapsed());

        let ExecutionReport {
            outputs: extracted,
            timings: extractor_timings,
            failures: extractor_failures,
            ..
        } = extraction;
        let ExecutionReport {
            outputs: interpreted,
            timings: interpreter_timings,
            failures: interpreter_failures,
            ..
        } = interpretation;

        result.metadata.extractors_used = produced(&resolved.extractors, &extracted);
        result.metadata.interpreters_used = produced(&resolved.interpreters, &interpreted);
        result
            .warnings
            .extend(extractor_failures.into_iter().chain(interpreter_failures).map(|f| f.message));

        let memory = &mut result.performance_metrics.memory;
        memory.extracted_bytes = serialized_len(&extracted);
        memory.interpreted_bytes = serialized_len(&interpreted);
        result.performance_metrics.extractor_timings = extractor_timings;
        result.performance_metrics.interpreter_timings = interpreter_timings;
        result.extracted_data = extracted;
        result.interpreted_data = interpreted;
        result
    }

    fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let parsers = self.parsers.read();
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
                !(e.file_type().is_dir() && hidden)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                !self.exclude.is_match(relative) && !self.exclude.is_match(path)
            })
            .filter(|path| {
                parsers.detect_and_get_parser(path, None).is_some()
                    || leading_content(path)
                        .is_some_and(|head| parsers.detect_and_get_parser(path, Some(&head)).is_some())
            })
            .collect();
        files.sort();
        files
    }

    // Cache and metrics

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Drop cached results for one path. Returns how many were removed.
    pub fn invalidate<P: AsRef<Path>>(&self, path: P) -> usize {
        self.cache.invalidate_path(&path.as_ref().display().to_string())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Scan persisted cache entries.
    pub fn validate_cache(&self) -> Result<CacheReport, AnalysisError> {
        self.cache.validate()
    }

    /// Delete corrupt and expired persisted cache entries.
    pub fn repair_cache(&self) -> Result<CacheReport, AnalysisError> {
        self.cache.repair()
    }

    /// Snapshot of the engine metrics.
    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.lock().clone()
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock() = EngineMetrics::default();
        self.cache.reset_stats();
    }
}

/// Selected names whose plugin produced output, in selection order.
fn produced<O>(selected: &[String], outputs: &std::collections::BTreeMap<String, Option<O>>) -> Vec<String> {
    selected
        .iter()
        .filter(|name| outputs.get(*name).is_some_and(Option::is_some))
        .cloned()
        .collect()
}

fn serialized_len<T: serde::Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

fn leading_content(path: &Path) -> Option<String> {
    let mut head = Vec::new();
    File::open(path).ok()?.take(SNIFF_BYTES).read_to_end(&mut head).ok()?;
    Some(String::from_utf8_lossy(&head).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::extract::FactSet;
    use crate::parser::SyntaxTree;
    use crate::plugin::Plugin;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    struct CountingExtractor {
        calls: Arc<AtomicUsize>,
    }

    impl Plugin for CountingExtractor {
        type Input = SyntaxTree;
        type Output = FactSet;

        fn execute(&self, tree: &SyntaxTree, _ctx: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FactSet::Custom(serde_json::json!({ "bytes": tree.source().len() })))
        }
    }

    struct SlowExtractor {
        delay: Duration,
    }

    impl Plugin for SlowExtractor {
        type Input = SyntaxTree;
        type Output = FactSet;

        fn execute(&self, _tree: &SyntaxTree, _ctx: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
            thread::sleep(self.delay);
            Ok(FactSet::Custom(Value::Null))
        }
    }

    struct FailingExtractor;

    impl Plugin for FailingExtractor {
        type Input = SyntaxTree;
        type Output = FactSet;

        fn execute(&self, _tree: &SyntaxTree, _ctx: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
            anyhow::bail!("extractor exploded")
        }
    }

    #[test]
    fn test_content_analysis_runs_every_stage() {
        let engine = AnalysisEngine::new();
        let result = engine
            .analyze_content(
                "import os\n\ndef main():\n    return os.getcwd()\n",
                "tool.py",
                &AnalysisConfig::new(),
            )
            .unwrap();

        assert!(result.is_success(), "{:?}", result.errors);
        assert_eq!(result.language, "python");
        assert_eq!(result.metadata.extractors_used, extract::BUILTIN_EXTRACTORS);
        assert_eq!(result.metadata.interpreters_used, interpret::BUILTIN_INTERPRETERS);
        assert_eq!(result.dependencies().unwrap()[0].source, "os");
        assert!(result.performance_metrics.memory.extracted_bytes > 0);
        assert_eq!(result.performance_metrics.extractor_timings.len(), 6);
    }

    #[test]
    fn test_second_call_is_cache_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = AnalysisEngine::new();
        engine.register_extractor(
            "counting",
            Box::new(CountingExtractor {
                calls: Arc::clone(&calls),
            }),
        );

        let config = AnalysisConfig::new();
        let first = engine.analyze_content("package main\n", "main.go", &config).unwrap();
        let second = engine.analyze_content("package main\n", "main.go", &config).unwrap();

        assert!(!first.metadata.from_cache);
        assert!(second.metadata.from_cache);
        assert_eq!(second.performance_metrics.parse_time_ms, 0.0);
        assert_eq!(first.extracted_data, second.extracted_data);
        assert_eq!(first.interpreted_data, second.interpreted_data);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let metrics = engine.metrics();
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
        assert_eq!(engine.cache_stats().entries, 1);
    }

    #[test]
    fn test_use_cache_false_always_computes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = AnalysisEngine::new();
        engine.register_extractor("counting", Box::new(CountingExtractor { calls: Arc::clone(&calls) }));

        let config = AnalysisConfig::new().use_cache(false);
        engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        let second = engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        assert!(!second.metadata.from_cache);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.cache_stats().entries, 0);
    }

    #[test]
    fn test_extractor_failure_is_isolated() {
        let engine = AnalysisEngine::new();
        engine.register_extractor("broken", Box::new(FailingExtractor));

        let config = AnalysisConfig::new().extractors(["dependencies", "broken", "exports"]);
        let result = engine
            .analyze_content("export const a = 1;\n", "a.ts", &config)
            .unwrap();

        assert!(result.is_success());
        assert!(result.facts("dependencies").is_some());
        assert!(result.facts("exports").is_some());
        assert_eq!(result.extracted_data.get("broken"), Some(&None));
        assert!(result.warnings.iter().any(|w| w.contains("extractor exploded")));
        assert_eq!(result.metadata.extractors_used, vec!["dependencies", "exports"]);
        // functions facts were not extracted
        assert_eq!(result.interpreted_data.get("code_metrics"), Some(&None));
    }

    #[test]
    fn test_unsupported_language_is_error_result() {
        let engine = AnalysisEngine::new();
        let result = engine
            .analyze_content("hello", "notes.txt", &AnalysisConfig::new())
            .unwrap();
        assert!(result.has_error(ErrorKind::UnsupportedLanguage));
        assert_eq!(result.language, "unknown");

        // failures are never cached
        let again = engine
            .analyze_content("hello", "notes.txt", &AnalysisConfig::new())
            .unwrap();
        assert!(!again.metadata.from_cache);
    }

    #[test]
    fn test_parse_failure_keeps_parse_timing() {
        let engine = AnalysisEngine::new();
        let result = engine
            .analyze_content("package main\0", "main.go", &AnalysisConfig::new())
            .unwrap();
        assert!(result.has_error(ErrorKind::ParseFailure));
        assert_eq!(result.language, "go");
        assert!(result.extracted_data.is_empty());
        assert_eq!(result.performance_metrics.memory.source_bytes, 13);
    }

    #[test]
    fn test_disabled_engine_rejects_calls() {
        let engine = AnalysisEngine::new();
        engine.disable();
        assert!(matches!(
            engine.analyze_content("x = 1", "a.py", &AnalysisConfig::new()),
            Err(AnalysisError::EngineDisabled)
        ));
        assert!(engine.analyze_batch(&["a.py"], &AnalysisConfig::new()).is_err());
        engine.enable();
        assert!(engine.analyze_content("x = 1", "a.py", &AnalysisConfig::new()).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let engine = AnalysisEngine::new();
        let config = AnalysisConfig::new().extractors(["exports", "exports"]);
        assert!(matches!(
            engine.analyze_content("x = 1", "a.py", &config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_batch_preserves_order_and_continues() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.go");
        fs::write(&good, "package main\n\nimport \"fmt\"\n").unwrap();
        let missing = temp.path().join("missing.py");
        let unknown = temp.path().join("data.bin");
        fs::write(&unknown, "xyz").unwrap();

        let engine = AnalysisEngine::new();
        let paths = vec![good.clone(), missing.clone(), unknown.clone()];
        let results = engine.analyze_batch(&paths, &AnalysisConfig::new()).unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(results[1].has_error(ErrorKind::ReadFailure));
        assert_eq!(results[1].language, "python");
        assert!(results[2].has_error(ErrorKind::UnsupportedLanguage));

        let parallel = engine.analyze_batch_parallel(&paths, &AnalysisConfig::new()).unwrap();
        let order: Vec<_> = parallel.iter().map(|r| r.file_path.clone()).collect();
        let expected: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let engine = AnalysisEngine::new();
        let config = AnalysisConfig::new();
        engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        assert_eq!(engine.invalidate("a.py"), 1);
        let again = engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        assert!(!again.metadata.from_cache);

        engine.clear_cache();
        assert_eq!(engine.cache_stats().entries, 0);
    }

    #[test]
    fn test_cached_result_is_independent_copy() {
        let engine = AnalysisEngine::new();
        let config = AnalysisConfig::new();
        let mut first = engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        first.extracted_data.clear();
        first.errors.push(AnalysisError::EngineDisabled.into());

        let second = engine.analyze_content("x = 1\n", "a.py", &config).unwrap();
        assert!(second.metadata.from_cache);
        assert!(second.is_success());
        assert!(!second.extracted_data.is_empty());
    }

    #[test]
    fn test_timeout_returns_result() {
        let engine = Arc::new(AnalysisEngine::new());
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.rs");
        fs::write(&file, "pub fn a() {}\n").unwrap();

        let result = engine
            .analyze_file_with_timeout(&file, &AnalysisConfig::new(), Duration::from_secs(30))
            .unwrap();
        assert!(result.is_success());
        assert_eq!(result.language, "rust");
    }

    #[test]
    fn test_timeout_expiry_is_error_shaped_and_uncached() {
        let engine = Arc::new(AnalysisEngine::new());
        engine.register_extractor(
            "slow",
            Box::new(SlowExtractor {
                delay: Duration::from_millis(400),
            }),
        );
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("slow.py");
        fs::write(&file, "x = 1\n").unwrap();

        let config = AnalysisConfig::new().extractors(["slow"]);
        let result = engine
            .analyze_file_with_timeout(&file, &config, Duration::from_millis(5))
            .unwrap();
        assert!(result.has_error(ErrorKind::Timeout));
        assert_eq!(result.language, "python");
        assert!(result.extracted_data.is_empty());
        assert!(!result.metadata.from_cache);
        assert_eq!(engine.cache_stats().entries, 0);
        assert_eq!(engine.metrics().failed_analyses, 1);

        // waits for the abandoned run to release the key
        let later = engine.analyze_file(&file, &config).unwrap();
        assert!(later.is_success());
        assert!(!later.has_error(ErrorKind::Timeout));
    }

    #[test]
    fn test_unregister_extractor() {
        let engine = AnalysisEngine::new();
        assert!(engine.unregister_extractor("identifiers"));
        assert!(!engine.extractor_names().contains(&"identifiers".to_string()));
        let result = engine.analyze_content("x = 1\n", "a.py", &AnalysisConfig::new()).unwrap();
        assert!(result.facts("identifiers").is_none());
        assert!(result.interpretation("code_metrics").is_some());
    }
}
