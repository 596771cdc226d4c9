//! Per-run counters and latency summaries.

use serde::{Deserialize, Serialize};

/// Head position observed when a request completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSample {
    /// Global tick of the completion.
    pub tick: u64,
    /// Track the head was on.
    pub track: u32,
}

/// Completion counters of one simulation run.
///
/// Lives exactly as long as its run, so independent runs never share state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    completed: u64,
    latencies: Vec<u64>,
    head_trace: Vec<HeadSample>,
}

impl SimStats {
    /// Creates empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed request.
    #[inline]
    pub fn record_completion(&mut self, tick: u64, track: u32, latency: u64) {
        self.completed += 1;
        self.latencies.push(latency);
        self.head_trace.push(HeadSample { tick, track });
    }

    /// Number of completed requests.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Completion latencies in completion order.
    #[inline]
    pub fn latencies(&self) -> &[u64] {
        &self.latencies
    }

    /// Head samples in completion order.
    #[inline]
    pub fn head_trace(&self) -> &[HeadSample] {
        &self.head_trace
    }

    /// Summary over every recorded latency.
    pub fn latency_summary(&self) -> LatencySummary {
        LatencySummary::from_latencies(&self.latencies)
    }
}

/// Aggregate view of completion latencies, in ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Number of samples.
    pub count: u64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (nearest rank).
    pub p50: u64,
    /// 95th percentile (nearest rank).
    pub p95: u64,
    /// Largest latency.
    pub max: u64,
}

impl LatencySummary {
    /// Summarizes a slice of latencies. An empty slice gives all zeros.
    pub fn from_latencies(latencies: &[u64]) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }
        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();
        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        Self {
            count: count as u64,
            mean: sum as f64 / count as f64,
            p50: nearest_rank(&sorted, 50),
            p95: nearest_rank(&sorted, 95),
            max: sorted[count - 1],
        }
    }
}

fn nearest_rank(sorted: &[u64], percentile: usize) -> u64 {
    let rank = (percentile * sorted.len()).div_ceil(100).max(1);
    sorted[rank - 1]
}
