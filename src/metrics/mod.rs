//! Metrics collection.
//!
//! This module provides:
//! - Simulation counts per mode
//! - Latency measurements
//! - Success/failure rates and failure categories
//!
//! # Example
//!
//! ```
//! use survey_simulator::metrics::{MetricEvent, MetricsCollector};
//!
//! let metrics = MetricsCollector::new();
//! metrics.record(MetricEvent::new("basic", 150, true));
//! metrics.record(MetricEvent::new("basic", 250, true));
//! metrics.record(MetricEvent::new("professional", 900, false).with_error("Tiempo de simulación agotado."));
//!
//! let summary = metrics.summary();
//! assert_eq!(summary.total_simulations, 3);
//! assert!((summary.overall_success_rate - 0.666).abs() < 0.01);
//! assert_eq!(summary.by_mode["basic"].max_latency_ms, 250);
//! ```

#![allow(clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::RwLock;
use std::time::Instant;

/// Maximum number of events kept; the oldest are dropped first.
pub const MAX_EVENTS: usize = 10_000;

/// One finished simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEvent {
    /// Simulation mode (`basic`, `professional`, `interview`).
    pub mode: String,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u64,
    /// Whether the simulation succeeded.
    pub success: bool,
    /// Error category for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix epoch seconds.
    pub timestamp: i64,
}

impl MetricEvent {
    /// Create a new metric event.
    #[must_use]
    pub fn new(mode: impl Into<String>, latency_ms: u64, success: bool) -> Self {
        Self {
            mode: mode.into(),
            latency_ms,
            success,
            error: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Attach the failure category.
    #[must_use]
    pub fn with_error(mut self, category: impl Into<String>) -> Self {
        self.error = Some(category.into());
        self
    }
}

/// Summary statistics for a mode.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModeSummary {
    /// Simulations run.
    pub total: u64,
    /// Successful simulations.
    pub successful: u64,
    /// Failed simulations.
    pub failed: u64,
    /// Average latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Minimum latency in milliseconds.
    pub min_latency_ms: u64,
    /// Maximum latency in milliseconds.
    pub max_latency_ms: u64,
    /// Success rate (0.0-1.0).
    pub success_rate: f64,
}

/// Overall metrics summary, served at `GET /metrics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Simulations across all modes.
    pub total_simulations: u64,
    /// Overall success rate; 1.0 when nothing has run.
    pub overall_success_rate: f64,
    /// Per-mode summaries.
    pub by_mode: BTreeMap<String, ModeSummary>,
    /// Failure counts per error category.
    pub errors: BTreeMap<String, u64>,
}

/// Thread-safe in-memory collector.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    events: RwLock<VecDeque<MetricEvent>>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a metric event.
    pub fn record(&self, event: MetricEvent) {
        match self.events.write() {
            Ok(mut events) => {
                if events.len() >= MAX_EVENTS {
                    events.pop_front();
                }
                events.push_back(event);
            }
            Err(poison_error) => {
                tracing::error!(
                    mode = %event.mode,
                    error = %poison_error,
                    "Failed to record metric event: RwLock poisoned"
                );
            }
        }
    }

    /// Get summary statistics.
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        let events: Vec<MetricEvent> = match self.events.read() {
            Ok(e) => e.iter().cloned().collect(),
            Err(poison_error) => {
                tracing::warn!(
                    error = %poison_error,
                    "Reading events from poisoned lock, using recovered data"
                );
                poison_error.into_inner().iter().cloned().collect()
            }
        };

        let mut grouped: BTreeMap<String, Vec<&MetricEvent>> = BTreeMap::new();
        let mut errors: BTreeMap<String, u64> = BTreeMap::new();
        for event in &events {
            grouped.entry(event.mode.clone()).or_default().push(event);
            if let Some(category) = &event.error {
                *errors.entry(category.clone()).or_default() += 1;
            }
        }

        let by_mode = grouped
            .into_iter()
            .map(|(mode, mode_events)| (mode, summarize(&mode_events)))
            .collect();

        let total_simulations = events.len() as u64;
        let total_successful = events.iter().filter(|e| e.success).count() as u64;
        let overall_success_rate = if total_simulations > 0 {
            total_successful as f64 / total_simulations as f64
        } else {
            1.0
        };

        MetricsSummary {
            total_simulations,
            overall_success_rate,
            by_mode,
            errors,
        }
    }
}

fn summarize(events: &[&MetricEvent]) -> ModeSummary {
    let total = events.len() as u64;
    let successful = events.iter().filter(|e| e.success).count() as u64;
    let latencies: Vec<u64> = events.iter().map(|e| e.latency_ms).collect();
    let avg_latency_ms = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
    };
    ModeSummary {
        total,
        successful,
        failed: total - successful,
        avg_latency_ms,
        min_latency_ms: latencies.iter().copied().min().unwrap_or(0),
        max_latency_ms: latencies.iter().copied().max().unwrap_or(0),
        success_rate: if total > 0 {
            successful as f64 / total as f64
        } else {
            0.0
        },
    }
}

/// Timer for measuring simulation latency.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
