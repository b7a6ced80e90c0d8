//! Homogeneous plugin registries.
//!
//! Extractors and interpreters are both stored in a [`PluginRegistry`]:
//! an ordered `name -> plugin` map that owns each plugin and disposes it
//! exactly once when it is unregistered, replaced, cleared or dropped.
//!
//! [`PluginRegistry::execute_selected`] never fails as a whole. A missing
//! name, an `Err`, a panic, or an output rejected by the plugin's own
//! `validate` each yield `None` for that key plus a recorded
//! [`PluginFailure`]; sibling plugins still run.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Per-call information shared by every plugin of one analysis.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub file_path: PathBuf,
    pub language: String,
}

impl PluginContext {
    pub fn new(file_path: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
        }
    }
}

/// A named unit of analysis work.
pub trait Plugin: Send + Sync {
    type Input: ?Sized;
    type Output;

    /// Whether this plugin handles the language.
    fn supports(&self, _language: &str) -> bool {
        true
    }

    /// Run the plugin. `options` is `Value::Null` when the caller set none.
    fn execute(
        &self,
        input: &Self::Input,
        context: &PluginContext,
        options: &Value,
    ) -> anyhow::Result<Self::Output>;

    /// Check an output before it is accepted.
    fn validate(&self, _output: &Self::Output) -> bool {
        true
    }

    /// Release resources. Called exactly once by the owning registry.
    fn dispose(&self) {}
}

/// Owning handle that disposes its plugin when dropped.
struct PluginHandle<I: ?Sized, O> {
    plugin: Box<dyn Plugin<Input = I, Output = O>>,
}

impl<I: ?Sized, O> Drop for PluginHandle<I, O> {
    fn drop(&mut self) {
        self.plugin.dispose();
    }
}

/// Why a selected plugin produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotRegistered,
    Error,
    Panicked,
    InvalidOutput,
}

/// A plugin that yielded `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginFailure {
    pub name: String,
    pub reason: FailureReason,
    pub message: String,
}

/// Outputs of one `execute_selected` call.
#[derive(Debug)]
pub struct ExecutionReport<O> {
    /// One key per selected name that was attempted.
    pub outputs: BTreeMap<String, Option<O>>,
    /// Wall time per executed plugin, in milliseconds.
    pub timings: BTreeMap<String, f64>,
    pub failures: Vec<PluginFailure>,
    /// Selected plugins skipped because they do not support the language.
    pub skipped: Vec<String>,
}

impl<O> Default for ExecutionReport<O> {
    fn default() -> Self {
        Self {
            outputs: BTreeMap::new(),
            timings: BTreeMap::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<O> ExecutionReport<O> {
    /// Names of plugins that produced an output, in name order.
    pub fn used(&self) -> Vec<String> {
        self.outputs
            .iter()
            .filter(|(_, output)| output.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn fail(&mut self, name: &str, reason: FailureReason, message: String) {
        warn!(plugin = name, reason = ?reason, "{}", message);
        self.outputs.insert(name.to_string(), None);
        self.failures.push(PluginFailure {
            name: name.to_string(),
            reason,
            message,
        });
    }
}

/// Ordered registry of plugins sharing one input and output type.
pub struct PluginRegistry<I: ?Sized, O> {
    kind: &'static str,
    plugins: Vec<(String, PluginHandle<I, O>)>,
}

impl<I: ?Sized, O> PluginRegistry<I, O> {
    /// Create an empty registry. `kind` names the plugins in log output.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            plugins: Vec::new(),
        }
    }

    /// Register a plugin. An existing plugin of the same name is disposed
    /// and replaced in place, keeping its position.
    pub fn register(&mut self, name: &str, plugin: Box<dyn Plugin<Input = I, Output = O>>) {
        let handle = PluginHandle { plugin };
        if let Some(slot) = self.plugins.iter_mut().find(|(n, _)| n == name) {
            warn!(kind = self.kind, plugin = name, "plugin already registered, replacing");
            slot.1 = handle;
            return;
        }
        self.plugins.push((name.to_string(), handle));
    }

    /// Remove and dispose a plugin. Returns whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.plugins.iter().position(|(n, _)| n == name) {
            Some(index) => {
                self.plugins.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and dispose every plugin.
    pub fn clear(&mut self) {
        self.plugins.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|(n, _)| n == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin<Input = I, Output = O>> {
        self.plugins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handle)| handle.plugin.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run the selected plugins (all registered ones when `selected` is
    /// `None`) in selection order.
    pub fn execute_selected(
        &self,
        selected: Option<&[String]>,
        input: &I,
        context: &PluginContext,
        options: &BTreeMap<String, Value>,
    ) -> ExecutionReport<O> {
        let names = match selected {
            Some(names) => names.to_vec(),
            None => self.names(),
        };
        let mut report = ExecutionReport::default();

        for name in &names {
            let Some(plugin) = self.get(name) else {
                report.fail(
                    name,
                    FailureReason::NotRegistered,
                    format!("{} '{}' is not registered", self.kind, name),
                );
                continue;
            };
            if !plugin.supports(&context.language) {
                debug!(kind = self.kind, plugin = %name, language = %context.language, "plugin does not support language");
                report.skipped.push(name.clone());
                continue;
            }

            let plugin_options = options.get(name).unwrap_or(&Value::Null);
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                plugin.execute(input, context, plugin_options)
            }));
            report
                .timings
                .insert(name.clone(), started.elapsed().as_secs_f64() * 1000.0);

            match outcome {
                Ok(Ok(output)) if plugin.validate(&output) => {
                    report.outputs.insert(name.clone(), Some(output));
                }
                Ok(Ok(_)) => report.fail(
                    name,
                    FailureReason::InvalidOutput,
                    format!("{} '{}' produced output that failed validation", self.kind, name),
                ),
                Ok(Err(err)) => report.fail(
                    name,
                    FailureReason::Error,
                    format!("{} '{}' failed: {:#}", self.kind, name, err),
                ),
                Err(payload) => report.fail(
                    name,
                    FailureReason::Panicked,
                    format!("{} '{}' panicked: {}", self.kind, name, panic_message(&payload)),
                ),
            }
        }

        report
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behavior {
        Echo,
        Fail,
        Panic,
        Invalid,
    }

    struct TestPlugin {
        behavior: Behavior,
        disposed: Arc<AtomicUsize>,
    }

    impl Plugin for TestPlugin {
        type Input = str;
        type Output = String;

        fn execute(&self, input: &str, _ctx: &PluginContext, options: &Value) -> anyhow::Result<String> {
            match self.behavior {
                Behavior::Echo => Ok(format!("{}{}", input, options.as_str().unwrap_or(""))),
                Behavior::Fail => anyhow::bail!("boom"),
                Behavior::Panic => panic!("exploded"),
                Behavior::Invalid => Ok(String::new()),
            }
        }

        fn validate(&self, output: &String) -> bool {
            !output.is_empty()
        }

        fn dispose(&self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn plugin(behavior: Behavior, disposed: &Arc<AtomicUsize>) -> Box<dyn Plugin<Input = str, Output = String>> {
        Box::new(TestPlugin {
            behavior,
            disposed: Arc::clone(disposed),
        })
    }

    fn context() -> PluginContext {
        PluginContext::new("a.ts", "typescript")
    }

    #[test]
    fn test_partial_failure_is_isolated() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new("extractor");
        registry.register("a", plugin(Behavior::Echo, &disposed));
        registry.register("b", plugin(Behavior::Fail, &disposed));
        registry.register("c", plugin(Behavior::Echo, &disposed));

        let report = registry.execute_selected(None, "x", &context(), &BTreeMap::new());
        assert_eq!(report.outputs.len(), 3);
        assert_eq!(report.outputs["a"].as_deref(), Some("x"));
        assert_eq!(report.outputs["b"], None);
        assert_eq!(report.outputs["c"].as_deref(), Some("x"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].reason, FailureReason::Error);
        assert_eq!(report.used(), vec!["a", "c"]);
    }

    #[test]
    fn test_panic_and_invalid_output_yield_none() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new("interpreter");
        registry.register("panics", plugin(Behavior::Panic, &disposed));
        registry.register("invalid", plugin(Behavior::Invalid, &disposed));
        registry.register("ok", plugin(Behavior::Echo, &disposed));

        let report = registry.execute_selected(None, "x", &context(), &BTreeMap::new());
        assert_eq!(report.outputs["panics"], None);
        assert_eq!(report.outputs["invalid"], None);
        assert_eq!(report.outputs["ok"].as_deref(), Some("x"));
        let reasons: Vec<_> = report.failures.iter().map(|f| f.reason.clone()).collect();
        assert_eq!(reasons, vec![FailureReason::Panicked, FailureReason::InvalidOutput]);
        assert!(report.failures[0].message.contains("exploded"));
    }

    #[test]
    fn test_missing_name_yields_none() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new("extractor");
        registry.register("a", plugin(Behavior::Echo, &disposed));

        let selected = vec!["missing".to_string(), "a".to_string()];
        let report = registry.execute_selected(Some(&selected), "x", &context(), &BTreeMap::new());
        assert_eq!(report.outputs["missing"], None);
        assert_eq!(report.failures[0].reason, FailureReason::NotRegistered);
        assert_eq!(report.outputs["a"].as_deref(), Some("x"));
    }

    #[test]
    fn test_options_routed_by_name() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new("extractor");
        registry.register("a", plugin(Behavior::Echo, &disposed));
        registry.register("b", plugin(Behavior::Echo, &disposed));

        let mut options = BTreeMap::new();
        options.insert("b".to_string(), Value::String("!".to_string()));
        let report = registry.execute_selected(None, "x", &context(), &options);
        assert_eq!(report.outputs["a"].as_deref(), Some("x"));
        assert_eq!(report.outputs["b"].as_deref(), Some("x!"));
    }

    #[test]
    fn test_dispose_called_exactly_once() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut registry = PluginRegistry::new("extractor");
        registry.register("a", plugin(Behavior::Echo, &disposed));
        registry.register("b", plugin(Behavior::Echo, &disposed));
        registry.register("c", plugin(Behavior::Echo, &disposed));

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert_eq!(disposed.load(Ordering::SeqCst), 1);

        // replacing disposes the previous plugin
        registry.register("b", plugin(Behavior::Echo, &disposed));
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
        assert_eq!(registry.names(), vec!["b", "c"]);

        registry.clear();
        assert_eq!(disposed.load(Ordering::SeqCst), 4);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_disposes_remaining() {
        let disposed = Arc::new(AtomicUsize::new(0));
        {
            let mut registry = PluginRegistry::new("extractor");
            registry.register("a", plugin(Behavior::Echo, &disposed));
            registry.register("b", plugin(Behavior::Echo, &disposed));
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 2);
    }
}
