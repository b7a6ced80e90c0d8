//! Streaming engine metrics.
//!
//! Every figure is a running aggregate, so memory grows with the number of
//! distinct languages and plugins, never with the number of analyses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::result::AnalysisResult;

/// Streaming mean: `avg' = (avg * (n - 1) + x) / n`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunningAverage {
    pub count: u64,
    pub average: f64,
}

impl RunningAverage {
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        let n = self.count as f64;
        self.average = (self.average * (n - 1.0) + value) / n;
    }
}

/// Snapshot of engine-wide metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMetrics {
    pub total_analyses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    /// Analyses whose result carries errors.
    pub failed_analyses: u64,
    pub total_time: RunningAverage,
    pub parse_time: RunningAverage,
    pub extraction_time: RunningAverage,
    pub interpretation_time: RunningAverage,
    pub by_language: BTreeMap<String, RunningAverage>,
    pub by_extractor: BTreeMap<String, RunningAverage>,
    pub by_interpreter: BTreeMap<String, RunningAverage>,
}

impl EngineMetrics {
    /// Fold one finished analysis into the aggregates.
    pub(crate) fn record(&mut self, result: &AnalysisResult, cache_consulted: bool) {
        let perf = &result.performance_metrics;
        self.total_analyses += 1;
        self.total_time.record(perf.total_time_ms);

        if cache_consulted {
            if result.metadata.from_cache {
                self.cache_hits += 1;
            } else {
                self.cache_misses += 1;
            }
            let lookups = self.cache_hits + self.cache_misses;
            self.cache_hit_rate = self.cache_hits as f64 / lookups as f64;
        }
        if !result.is_success() {
            self.failed_analyses += 1;
        }
        if result.metadata.from_cache {
            return;
        }

        self.parse_time.record(perf.parse_time_ms);
        self.extraction_time.record(perf.extraction_time_ms);
        self.interpretation_time.record(perf.interpretation_time_ms);
        self.by_language
            .entry(result.language.clone())
            .or_default()
            .record(perf.total_time_ms);
        for (name, ms) in &perf.extractor_timings {
            self.by_extractor.entry(name.clone()).or_default().record(*ms);
        }
        for (name, ms) in &perf.interpreter_timings {
            self.by_interpreter.entry(name.clone()).or_default().record(*ms);
        }
    }
}
