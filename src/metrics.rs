//! Observability counters emitted by tasks

use std::sync::Mutex;

/// A named counter sample with optional tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub name: String,
    pub value: u64,
    pub tags: Vec<(String, String)>,
}

impl Counter {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

/// Sink accepting counters from running tasks.
pub trait MetricSink: Send + Sync {
    fn counter(&self, counter: Counter);
}

/// Emits every counter as a structured tracing event under the `metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricSink for TracingMetrics {
    fn counter(&self, counter: Counter) {
        let tags = counter
            .tags
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        tracing::info!(
            target: "metrics",
            metric = %counter.name,
            value = counter.value,
            tags = %tags,
            "counter"
        );
    }
}

/// Keeps counters in memory, in emission order.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<Vec<Counter>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> Vec<Counter> {
        self.counters
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Latest value recorded under `name`, if any.
    pub fn value(&self, name: &str) -> Option<u64> {
        self.counters()
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }
}

impl MetricSink for InMemoryMetrics {
    fn counter(&self, counter: Counter) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.push(counter);
        }
    }
}
