//! Adapter registry.
//!
//! Tracks which adapters initialized successfully and dispatches to them
//! with per-adapter failure isolation: an error or panic in one adapter is
//! logged and never reaches the caller or the other adapters.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::Instrumentation;
use crate::config::AdapterSettings;
use crate::error::AdapterError;
use crate::record::{AdapterStatus, CallRecord};

/// Registry of telemetry adapters.
///
/// Disabled adapters are kept only as an [`AdapterStatus`] for reporting.
#[derive(Default)]
pub struct AdapterRegistry {
    active: Vec<Box<dyn Instrumentation>>,
    statuses: Vec<AdapterStatus>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize an adapter and keep it if it came up enabled.
    pub fn register(
        &mut self,
        mut adapter: Box<dyn Instrumentation>,
        settings: &AdapterSettings,
    ) -> &AdapterStatus {
        let name = adapter.name().to_string();
        let status = match catch_unwind(AssertUnwindSafe(|| adapter.initialize(settings))) {
            Ok(status) => status,
            Err(panic) => AdapterStatus::disabled(
                name.as_str(),
                AdapterError::Init(panic_message(&*panic)),
            ),
        };

        if status.enabled {
            tracing::info!(adapter = %name, "Adapter initialized");
            self.active.push(adapter);
        } else {
            tracing::warn!(
                adapter = %name,
                error = status.init_error.as_deref().unwrap_or("unknown"),
                "Adapter disabled"
            );
        }

        let index = self.statuses.len();
        self.statuses.push(status);
        &self.statuses[index]
    }

    /// Record a status for an adapter that could not even be constructed.
    pub fn register_unavailable(&mut self, name: &str, reason: impl ToString) -> &AdapterStatus {
        tracing::warn!(adapter = %name, "Adapter unavailable");
        let index = self.statuses.len();
        self.statuses.push(AdapterStatus::disabled(name, reason));
        &self.statuses[index]
    }

    /// Enabled adapters in registration order.
    pub fn active(&self) -> impl Iterator<Item = &dyn Instrumentation> {
        self.active.iter().map(|adapter| &**adapter)
    }

    /// Number of enabled adapters.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Status of every registered adapter, enabled or not.
    pub fn statuses(&self) -> &[AdapterStatus] {
        &self.statuses
    }

    /// Hand a finalized record to every active adapter.
    ///
    /// Returns the number of adapters that accepted it.
    pub fn record_all(&self, call: &CallRecord) -> usize {
        self.active
            .iter()
            .filter(|adapter| {
                isolate(adapter.name(), "record", || adapter.record(call), AdapterError::Record)
            })
            .count()
    }

    /// Flush every active adapter. Safe to call repeatedly.
    ///
    /// Returns the number of adapters that flushed cleanly.
    pub fn flush_all(&self) -> usize {
        self.active
            .iter()
            .filter(|adapter| {
                isolate(adapter.name(), "flush", || adapter.flush(), AdapterError::Flush)
            })
            .count()
    }
}

/// Run one adapter operation, converting errors and panics into a log line.
fn isolate<F>(name: &str, op: &str, f: F, on_panic: fn(String) -> AdapterError) -> bool
where
    F: FnOnce() -> Result<(), AdapterError>,
{
    let result = catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|panic| Err(on_panic(panic_message(&*panic))));

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(adapter = %name, op, error = %e, "Adapter operation failed");
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "adapter panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::tracing::init_test_tracing;
    use crate::record::CallContext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::SystemTime;

    #[derive(Default)]
    struct Counts {
        records: AtomicUsize,
        flushes: AtomicUsize,
    }

    struct CountingAdapter {
        name: &'static str,
        init_ok: bool,
        counts: Arc<Counts>,
    }

    impl Instrumentation for CountingAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn initialize(&mut self, _settings: &AdapterSettings) -> AdapterStatus {
            if self.init_ok {
                AdapterStatus::enabled(self.name)
            } else {
                AdapterStatus::disabled(self.name, "missing credentials")
            }
        }

        fn record(&self, _call: &CallRecord) -> Result<(), AdapterError> {
            self.counts.records.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&self) -> Result<(), AdapterError> {
            self.counts.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickingAdapter;

    impl Instrumentation for PanickingAdapter {
        fn name(&self) -> &str {
            "panicky"
        }

        fn initialize(&mut self, _settings: &AdapterSettings) -> AdapterStatus {
            AdapterStatus::enabled("panicky")
        }

        fn record(&self, _call: &CallRecord) -> Result<(), AdapterError> {
            panic!("exporter exploded")
        }

        fn flush(&self) -> Result<(), AdapterError> {
            Err(AdapterError::Flush("backend unreachable".into()))
        }
    }

    fn counting_adapter(name: &'static str, init_ok: bool) -> (Box<dyn Instrumentation>, Arc<Counts>) {
        let counts = Arc::new(Counts::default());
        let adapter = CountingAdapter {
            name,
            init_ok,
            counts: counts.clone(),
        };
        (Box::new(adapter), counts)
    }

    fn record() -> CallRecord {
        let ctx = CallContext {
            sequence_number: 1,
            user_id: "ada".into(),
            session_id: "s".into(),
            model: "m".into(),
        };
        CallRecord::begin(ctx, "hi", SystemTime::now())
    }

    #[test]
    fn test_disabled_adapter_never_invoked() {
        let mut registry = AdapterRegistry::new();
        let (adapter, counts) = counting_adapter("broken", false);

        let status = registry.register(adapter, &AdapterSettings::new()).clone();
        assert!(!status.enabled);
        assert_eq!(registry.active_count(), 0);

        registry.record_all(&record());
        registry.flush_all();
        assert_eq!(counts.records.load(Ordering::SeqCst), 0);
        assert_eq!(counts.flushes.load(Ordering::SeqCst), 0);
        assert_eq!(registry.statuses().len(), 1);
    }

    #[test]
    fn test_active_preserves_registration_order() {
        let mut registry = AdapterRegistry::new();
        for name in ["first", "second", "third"] {
            let (adapter, _) = counting_adapter(name, true);
            registry.register(adapter, &AdapterSettings::new());
        }
        let names: Vec<_> = registry.active().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_adapter_isolated() {
        init_test_tracing();
        let mut registry = AdapterRegistry::new();
        registry.register(Box::new(PanickingAdapter), &AdapterSettings::new());
        let (adapter, counts) = counting_adapter("healthy", true);
        registry.register(adapter, &AdapterSettings::new());

        let delivered = registry.record_all(&record());
        assert_eq!(delivered, 1);
        assert_eq!(counts.records.load(Ordering::SeqCst), 1);

        let flushed = registry.flush_all();
        assert_eq!(flushed, 1);
        assert_eq!(counts.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flush_all_twice() {
        let mut registry = AdapterRegistry::new();
        let (adapter, counts) = counting_adapter("healthy", true);
        registry.register(adapter, &AdapterSettings::new());

        assert_eq!(registry.flush_all(), 1);
        assert_eq!(registry.flush_all(), 1);
        assert_eq!(counts.flushes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_register_unavailable() {
        let mut registry = AdapterRegistry::new();
        let status = registry.register_unavailable("langtrace", "unknown adapter");
        assert!(!status.enabled);
        assert_eq!(registry.active_count(), 0);
    }
}
