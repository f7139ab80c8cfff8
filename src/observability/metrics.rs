//! Thread-safe metrics collection system
//!
//! Atomic counters for the task lifecycle and JSON-RPC traffic, plus a bounded
//! window of pipeline latencies for percentile reporting.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of pipeline latency samples retained
const MAX_LATENCY_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and a mutex-protected window
pub struct MetricsCollector {
    tasks_received: AtomicU64,
    tasks_in_flight: AtomicU64,
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_canceled: AtomicU64,

    pipeline_invocations: AtomicU64,
    pipeline_times: Mutex<VecDeque<u64>>, // in milliseconds

    rpc_requests: AtomicU64,
    rpc_errors: AtomicU64,

    uptime_start: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tasks_received: AtomicU64::new(0),
            tasks_in_flight: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_canceled: AtomicU64::new(0),
            pipeline_invocations: AtomicU64::new(0),
            pipeline_times: Mutex::new(VecDeque::new()),
            rpc_requests: AtomicU64::new(0),
            rpc_errors: AtomicU64::new(0),
            uptime_start: AtomicU64::new(current_timestamp()),
        }
    }

    // Task lifecycle metrics
    pub fn task_received(&self) {
        self.tasks_received.fetch_add(1, Ordering::Relaxed);
        self.tasks_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        self.leave_in_flight();
    }

    pub fn task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.leave_in_flight();
    }

    pub fn task_canceled(&self) {
        self.tasks_canceled.fetch_add(1, Ordering::Relaxed);
    }

    fn leave_in_flight(&self) {
        let _ = self
            .tasks_in_flight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    // Pipeline metrics
    pub fn pipeline_invoked(&self, duration: Duration) {
        self.pipeline_invocations.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.pipeline_times.lock() {
            times.push_back(duration.as_millis() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.pop_front();
            }
        }
    }

    // JSON-RPC metrics
    pub fn rpc_request(&self) {
        self.rpc_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rpc_error(&self) {
        self.rpc_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Calculate latency statistics (avg, p50, p95, p99)
    fn latency_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.pipeline_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted: Vec<u64> = times.iter().copied().collect();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        (
            avg,
            percentile(&sorted, 50.0),
            percentile(&sorted, 95.0),
            percentile(&sorted, 99.0),
        )
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_latency_ms, p50, p95, p99) = self.latency_statistics();

        MetricsSnapshot {
            tasks: TaskMetrics {
                received: self.tasks_received.load(Ordering::Relaxed),
                in_flight: self.tasks_in_flight.load(Ordering::Relaxed),
                completed: self.tasks_completed.load(Ordering::Relaxed),
                failed: self.tasks_failed.load(Ordering::Relaxed),
                canceled: self.tasks_canceled.load(Ordering::Relaxed),
            },
            pipeline: PipelineMetrics {
                invocations: self.pipeline_invocations.load(Ordering::Relaxed),
                avg_latency_ms,
                latency_p50_ms: p50,
                latency_p95_ms: p95,
                latency_p99_ms: p99,
            },
            rpc: RpcMetrics {
                requests: self.rpc_requests.load(Ordering::Relaxed),
                errors: self.rpc_errors.load(Ordering::Relaxed),
            },
            uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub tasks: TaskMetrics,
    pub pipeline: PipelineMetrics,
    pub rpc: RpcMetrics,
    pub uptime_seconds: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskMetrics {
    pub received: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub canceled: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetrics {
    pub invocations: u64,
    pub avg_latency_ms: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcMetrics {
    pub requests: u64,
    pub errors: u64,
}

// Helper functions
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}
