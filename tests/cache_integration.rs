//! Result cache behaviour through the engine, in memory and on disk.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use codefacts::{AnalysisConfig, AnalysisEngine, AnalysisError, CacheConfig, EngineConfig};
use tempfile::TempDir;

fn project_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("project")
}

fn persistent_engine(dir: &TempDir) -> AnalysisEngine {
    let config = EngineConfig {
        cache: CacheConfig {
            persist: true,
            directory: Some(dir.path().to_path_buf()),
            ..Default::default()
        },
        ..Default::default()
    };
    AnalysisEngine::with_config(config).expect("engine should build")
}

// ============================================================================
// In-memory cache
// ============================================================================

#[test]
fn test_second_analysis_is_served_from_cache() {
    let engine = AnalysisEngine::new();
    let path = project_path().join("src/app.ts");
    let config = AnalysisConfig::new();

    let first = engine.analyze_file(&path, &config).unwrap();
    let second = engine.analyze_file(&path, &config).unwrap();

    assert!(!first.metadata.from_cache);
    assert!(second.metadata.from_cache);
    assert_eq!(first.extracted_data, second.extracted_data);
    assert_eq!(first.interpreted_data, second.interpreted_data);
    assert_eq!(second.performance_metrics.parse_time_ms, 0.0);

    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(engine.metrics().cache_hits, 1);
}

#[test]
fn test_different_config_is_a_different_entry() {
    let engine = AnalysisEngine::new();
    let path = project_path().join("scripts/report.py");

    engine.analyze_file(&path, &AnalysisConfig::new()).unwrap();
    let narrowed = engine
        .analyze_file(&path, &AnalysisConfig::new().extractors(["dependencies"]))
        .unwrap();

    assert!(!narrowed.metadata.from_cache);
    assert_eq!(narrowed.metadata.extractors_used, vec!["dependencies"]);
    assert_eq!(engine.cache_stats().entries, 2);
}

#[test]
fn test_invalidate_drops_every_config_for_a_path() {
    let engine = AnalysisEngine::new();
    let path = project_path().join("scripts/report.py");

    engine.analyze_file(&path, &AnalysisConfig::new()).unwrap();
    engine
        .analyze_file(&path, &AnalysisConfig::new().extractors(["functions"]))
        .unwrap();
    engine
        .analyze_file(project_path().join("src/util.ts"), &AnalysisConfig::new())
        .unwrap();

    assert_eq!(engine.invalidate(&path), 2);
    assert_eq!(engine.cache_stats().entries, 1);

    let again = engine.analyze_file(&path, &AnalysisConfig::new()).unwrap();
    assert!(!again.metadata.from_cache);
}

#[test]
fn test_concurrent_callers_share_one_computation() {
    let engine = Arc::new(AnalysisEngine::new());
    let path = project_path().join("src/util.ts");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let path = path.clone();
            thread::spawn(move || engine.analyze_file(&path, &AnalysisConfig::new()).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let computed = results.iter().filter(|r| !r.metadata.from_cache).count();
    assert_eq!(computed, 1);
    assert!(results
        .windows(2)
        .all(|w| w[0].extracted_data == w[1].extracted_data));
}

// ============================================================================
// Persistent cache
// ============================================================================

#[test]
fn test_results_survive_engine_restart() {
    let dir = TempDir::new().unwrap();
    let path = project_path().join("src/util.ts");

    let first = persistent_engine(&dir)
        .analyze_file(&path, &AnalysisConfig::new())
        .unwrap();
    assert!(!first.metadata.from_cache);

    let restarted = persistent_engine(&dir);
    let second = restarted.analyze_file(&path, &AnalysisConfig::new()).unwrap();
    assert!(second.metadata.from_cache);
    assert_eq!(first.extracted_data, second.extracted_data);

    let report = restarted.validate_cache().unwrap();
    assert_eq!(report.scanned, 1);
    assert!(report.is_clean());
}

#[test]
fn test_repair_removes_corrupt_entries() {
    let dir = TempDir::new().unwrap();
    let engine = persistent_engine(&dir);
    engine
        .analyze_file(project_path().join("legacy/greeter.rb"), &AnalysisConfig::new())
        .unwrap();

    let garbage = dir.path().join("0000.json");
    fs::write(&garbage, "{ not json").unwrap();

    let report = engine.validate_cache().unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.corrupt, vec![garbage.clone()]);
    match report.into_result() {
        Err(AnalysisError::CacheCorruption { entries }) => assert_eq!(entries.len(), 1),
        other => panic!("expected corruption, got {:?}", other),
    }

    let repaired = engine.repair_cache().unwrap();
    assert_eq!(repaired.removed, vec![garbage.clone()]);
    assert!(!garbage.exists());
    assert!(engine.validate_cache().unwrap().is_clean());
}

#[test]
fn test_clear_cache_empties_disk() {
    let dir = TempDir::new().unwrap();
    let engine = persistent_engine(&dir);
    engine
        .analyze_file(project_path().join("src/types.ts"), &AnalysisConfig::new())
        .unwrap();
    assert_eq!(engine.validate_cache().unwrap().scanned, 1);

    engine.clear_cache();
    assert_eq!(engine.validate_cache().unwrap().scanned, 0);
    assert!(engine.cache_stats().entries == 0);
}
