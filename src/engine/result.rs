//! Analysis results.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::analysis::{ClassInfo, CommentFacts, DependencyInfo, ExportFacts, FunctionInfo, IdentifierInfo};
use crate::error::{AnalysisError, ErrorKind, ResultError};
use crate::extract::FactSet;
use crate::interpret::{ExtractedData, Interpretation};

/// Interpreter outputs keyed by interpreter name.
pub type InterpretedData = BTreeMap<String, Option<Interpretation>>;

/// Estimated memory held by each stage's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub source_bytes: usize,
    /// Serialized size of the extracted facts.
    pub extracted_bytes: usize,
    /// Serialized size of the interpretations.
    pub interpreted_bytes: usize,
}

/// Per-stage timings of one analysis, in milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub parse_time_ms: f64,
    pub extraction_time_ms: f64,
    pub interpretation_time_ms: f64,
    pub cache_lookup_ms: f64,
    pub total_time_ms: f64,
    pub extractor_timings: BTreeMap<String, f64>,
    pub interpreter_timings: BTreeMap<String, f64>,
    pub memory: MemoryUsage,
}

impl PerformanceMetrics {
    /// Timings of a cache hit: only the lookup and the total are set.
    pub fn cache_hit(lookup: Duration, total: Duration) -> Self {
        Self {
            cache_lookup_ms: millis(lookup),
            total_time_ms: millis(total),
            ..Default::default()
        }
    }
}

/// Bookkeeping about how a result was produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Milliseconds since the Unix epoch when the analysis ran.
    pub timestamp: u64,
    /// Extractors that produced a fact set, in execution order.
    pub extractors_used: Vec<String>,
    /// Interpreters that produced an output, in execution order.
    pub interpreters_used: Vec<String>,
    pub from_cache: bool,
}

/// Everything known about one analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_path: String,
    /// Detected language id, "unknown" when no provider claimed the file.
    pub language: String,
    pub extracted_data: ExtractedData,
    pub interpreted_data: InterpretedData,
    pub errors: Vec<ResultError>,
    /// Parse warnings and plugin failures.
    pub warnings: Vec<String>,
    pub performance_metrics: PerformanceMetrics,
    pub metadata: ResultMetadata,
}

impl AnalysisResult {
    /// An empty result for `file_path`.
    pub fn new(file_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
            extracted_data: ExtractedData::new(),
            interpreted_data: InterpretedData::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            performance_metrics: PerformanceMetrics::default(),
            metadata: ResultMetadata {
                timestamp: now_ms(),
                ..Default::default()
            },
        }
    }

    /// An error-shaped result.
    pub fn failed(file_path: impl Into<String>, language: impl Into<String>, error: &AnalysisError) -> Self {
        let mut result = Self::new(file_path, language);
        result.errors.push(ResultError::from(error));
        result
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Fact set produced by the extractor `name`.
    pub fn facts(&self, name: &str) -> Option<&FactSet> {
        self.extracted_data.get(name).and_then(Option::as_ref)
    }

    /// Output of the interpreter `name`.
    pub fn interpretation(&self, name: &str) -> Option<&Interpretation> {
        self.interpreted_data.get(name).and_then(Option::as_ref)
    }

    pub fn dependencies(&self) -> Option<&[DependencyInfo]> {
        self.facts("dependencies").and_then(FactSet::as_dependencies)
    }

    pub fn exports(&self) -> Option<&ExportFacts> {
        self.facts("exports").and_then(FactSet::as_exports)
    }

    pub fn functions(&self) -> Option<&[FunctionInfo]> {
        self.facts("functions").and_then(FactSet::as_functions)
    }

    pub fn classes(&self) -> Option<&[ClassInfo]> {
        self.facts("classes").and_then(FactSet::as_classes)
    }

    pub fn identifiers(&self) -> Option<&[IdentifierInfo]> {
        self.facts("identifiers").and_then(FactSet::as_identifiers)
    }

    pub fn comments(&self) -> Option<&CommentFacts> {
        self.facts("comments").and_then(FactSet::as_comments)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_shape() {
        let err = AnalysisError::UnsupportedLanguage {
            path: "notes.txt".to_string(),
        };
        let result = AnalysisResult::failed("notes.txt", "unknown", &err);
        assert!(!result.is_success());
        assert!(result.has_error(ErrorKind::UnsupportedLanguage));
        assert!(result.extracted_data.is_empty());
        assert!(!result.metadata.from_cache);
        assert!(result.metadata.timestamp > 0);
    }

    #[test]
    fn test_json_round_trip_keeps_failed_plugins() {
        let mut result = AnalysisResult::new("a.py", "python");
        result
            .extracted_data
            .insert("dependencies".to_string(), Some(FactSet::Dependencies(vec![])));
        result.extracted_data.insert("broken".to_string(), None);

        let json = result.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["extractedData"]["broken"].is_null());
        assert_eq!(value["metadata"]["fromCache"], false);

        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(back.dependencies().unwrap().is_empty());
    }
}
