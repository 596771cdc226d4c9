//! Simulation configuration.
//!
//! A [`SimConfig`] fully determines a run: together with its seed, two runs with
//! equal configurations produce identical reports. Configurations can be loaded
//! from TOML or JSON files; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::policy::PolicyKind;

/// Geometry and timing of the simulated drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Number of tracks on the drive.
    pub track_count: u32,
    /// Sectors on every track.
    pub sectors_per_track: u32,
    /// Ticks the head needs to cross one track.
    pub seek_ticks_per_track: u32,
    /// Ticks of rotational settle before a transfer may happen.
    pub rotational_delay_ticks: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            track_count: 500,
            sectors_per_track: 100,
            seek_ticks_per_track: 10,
            rotational_delay_ticks: 8,
        }
    }
}

impl DriveConfig {
    /// Returns the total number of sectors on the drive.
    #[inline]
    pub fn total_sectors(&self) -> u64 {
        u64::from(self.track_count) * u64::from(self.sectors_per_track)
    }
}

/// Workload population and per-request processing times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Number of competing workloads.
    pub count: usize,
    /// Probability that a file block is placed right at the allocation cursor.
    pub adjacency_probability: f64,
    /// Ticks a workload spends synthesizing a request.
    pub generation_ticks: u32,
    /// Ticks a workload spends post-processing a completed read.
    pub post_processing_ticks: u32,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            count: 10,
            adjacency_probability: 0.3,
            generation_ticks: 7,
            post_processing_ticks: 7,
        }
    }
}

/// Round-robin quantum and request-rate limiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalConfig {
    /// Ticks a workload runs before the next one is scheduled.
    pub quantum_ticks: u64,
    /// Ticks in one simulated second.
    pub ticks_per_second: u64,
    /// Upper bound of the per-second request budget.
    pub max_requests_per_second: u32,
    /// Rate parameter of the exponential budget draw.
    pub budget_lambda: f64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            quantum_ticks: 20,
            ticks_per_second: 1000,
            max_requests_per_second: 20,
            budget_lambda: 2.0,
        }
    }
}

/// Complete configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed of the run's random stream.
    pub seed: u64,
    /// Request scheduling policy.
    pub policy: PolicyKind,
    /// Total queue capacity of the policy.
    pub queue_capacity: usize,
    /// Completions after which the run stops.
    pub target_completions: u64,
    /// Number of leading latency and head samples kept in the report.
    pub sample_limit: usize,
    /// Drive geometry and timing.
    pub drive: DriveConfig,
    /// Workload population.
    pub workload: WorkloadConfig,
    /// Arrival scheduling.
    pub arrival: ArrivalConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 2,
            policy: PolicyKind::Fifo,
            queue_capacity: 20,
            target_completions: 100_000,
            sample_limit: 200,
            drive: DriveConfig::default(),
            workload: WorkloadConfig::default(),
            arrival: ArrivalConfig::default(),
        }
    }
}

impl SimConfig {
    /// Default configuration with the given policy and rate limit.
    pub fn new(policy: PolicyKind, max_requests_per_second: u32) -> Self {
        let mut config = Self {
            policy,
            ..Default::default()
        };
        config.arrival.max_requests_per_second = max_requests_per_second;
        config
    }

    /// Loads a configuration from a `.toml` or `.json` file.
    pub fn from_file(path: &Path) -> SimResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents).map_err(|e| SimError::Parse {
                reason: e.to_string(),
            }),
            "json" => serde_json::from_str(&contents).map_err(|e| SimError::Parse {
                reason: e.to_string(),
            }),
            _ => Err(SimError::Parse {
                reason: format!("unsupported config file extension: {:?}", ext),
            }),
        }
    }

    /// Checks that the configuration describes a run that can make progress.
    pub fn validate(&self) -> SimResult<()> {
        fn invalid(reason: &str) -> SimResult<()> {
            Err(SimError::InvalidConfig {
                reason: reason.to_string(),
            })
        }

        if self.drive.track_count == 0 || self.drive.sectors_per_track == 0 {
            return invalid("drive must have at least one track and one sector per track");
        }
        if self.drive.seek_ticks_per_track == 0 || self.drive.rotational_delay_ticks == 0 {
            return invalid("seek and rotational delay must be at least one tick");
        }
        if self.workload.count == 0 {
            return invalid("at least one workload is required");
        }
        if !(0.0..=1.0).contains(&self.workload.adjacency_probability) {
            return invalid("adjacency probability must be within [0, 1]");
        }
        if self.workload.generation_ticks == 0 || self.workload.post_processing_ticks == 0 {
            return invalid("workload processing times must be at least one tick");
        }
        if self.arrival.quantum_ticks == 0 || self.arrival.ticks_per_second == 0 {
            return invalid("quantum and ticks per second must be non-zero");
        }
        if self.arrival.max_requests_per_second == 0 {
            return invalid("max requests per second must be at least 1");
        }
        if self.arrival.budget_lambda.is_nan() || self.arrival.budget_lambda <= 0.0 {
            return invalid("budget lambda must be positive");
        }
        if self.queue_capacity < 2 {
            return invalid("queue capacity must be at least 2");
        }
        if self.target_completions == 0 {
            return invalid("target completions must be non-zero");
        }
        if self.sample_limit == 0 {
            return invalid("sample limit must be non-zero");
        }
        Ok(())
    }
}
