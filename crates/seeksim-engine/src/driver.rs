//! Simulation driver: wires the components together and runs the clock.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::arrival::ArrivalScheduler;
use crate::config::SimConfig;
use crate::controller::DiskController;
use crate::drive::DriveMechanics;
use crate::error::SimResult;
use crate::generator::WorkloadGenerator;
use crate::layout::SectorMap;
use crate::policy::{build_policy, PolicyKind, PolicyStats};
use crate::rng::SimRng;
use crate::stats::{HeadSample, LatencySummary, SimStats};
use crate::workload::WorkloadStats;

/// Result of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    /// Policy that scheduled the requests.
    pub policy: PolicyKind,
    /// Upper bound of the per-second request budget.
    pub max_requests_per_second: u32,
    /// Seed of the run.
    pub seed: u64,
    /// Completed requests.
    pub completed: u64,
    /// Ticks the run took.
    pub total_ticks: u64,
    /// Leading head samples, in completion order.
    pub head_trace: Vec<HeadSample>,
    /// Leading completion latencies, in completion order.
    pub latencies: Vec<u64>,
    /// Summary over every completion of the run.
    pub summary: LatencySummary,
    /// Counters of the policy.
    pub policy_stats: PolicyStats,
    /// Counters of every workload, by id.
    pub workloads: Vec<WorkloadStats>,
}

/// One simulation run.
///
/// Each tick runs the arrival scheduler, then the controller, then the drive.
/// A read completed by the controller is delivered to its workload before the
/// drive advances.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    controller: DiskController,
    arrival: ArrivalScheduler,
    rng: SimRng,
    stats: SimStats,
    clock: u64,
    sector_map: SectorMap,
}

impl Simulation {
    /// Builds a run from a configuration.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let mut rng = SimRng::new(config.seed);
        let mut sector_map =
            SectorMap::new(config.drive.track_count, config.drive.sectors_per_track);
        let workloads = WorkloadGenerator::new(&config).generate(&mut rng, &mut sector_map)?;
        debug!(
            "Laid out {} workloads over {} sectors on {} tracks",
            workloads.len(),
            sector_map.occupied_count(),
            sector_map.used_tracks()
        );

        let policy = build_policy(
            config.policy,
            config.queue_capacity,
            config.drive.sectors_per_track,
        );
        let controller = DiskController::new(
            DriveMechanics::from_config(&config.drive),
            policy,
            config.drive.sectors_per_track,
        );
        let arrival = ArrivalScheduler::new(workloads, &config.arrival);

        info!(
            "Simulation ready: policy={}, rate={}, seed={}, target={}",
            config.policy,
            config.arrival.max_requests_per_second,
            config.seed,
            config.target_completions
        );

        Ok(Self {
            config,
            controller,
            arrival,
            rng,
            stats: SimStats::new(),
            clock: 0,
            sector_map,
        })
    }

    /// Advances every component by one tick.
    pub fn step(&mut self) -> SimResult<()> {
        self.arrival.tick(&mut self.controller, &mut self.rng)?;

        if let Some(done) = self.controller.tick(self.clock, &mut self.stats)? {
            if done.request.notifies_origin() {
                if let Some(origin) = done.request.origin {
                    self.arrival.notify_read_complete(origin);
                }
            }
        }

        self.controller.drive_mut().tick();
        self.clock += 1;
        Ok(())
    }

    /// Steps until the target number of completions is reached.
    pub fn run(mut self) -> SimResult<SimReport> {
        let target = self.config.target_completions;
        while self.stats.completed() != target {
            self.step()?;
        }

        let limit = self.config.sample_limit;
        let report = SimReport {
            policy: self.config.policy,
            max_requests_per_second: self.config.arrival.max_requests_per_second,
            seed: self.config.seed,
            completed: self.stats.completed(),
            total_ticks: self.clock,
            head_trace: self.stats.head_trace().iter().take(limit).copied().collect(),
            latencies: self.stats.latencies().iter().take(limit).copied().collect(),
            summary: self.stats.latency_summary(),
            policy_stats: self.controller.policy().stats().clone(),
            workloads: self
                .arrival
                .workloads()
                .iter()
                .map(|w| w.stats().clone())
                .collect(),
        };

        info!(
            "Simulation finished: policy={}, completed={}, ticks={}, mean_latency={:.2}",
            report.policy, report.completed, report.total_ticks, report.summary.mean
        );
        Ok(report)
    }

    /// Global tick counter.
    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Counters collected so far.
    #[inline]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Sector occupancy produced by the workload generator.
    #[inline]
    pub fn sector_map(&self) -> &SectorMap {
        &self.sector_map
    }

    /// The controller, with its drive and policy.
    #[inline]
    pub fn controller(&self) -> &DiskController {
        &self.controller
    }

    /// The arrival scheduler, with its workloads.
    #[inline]
    pub fn arrival(&self) -> &ArrivalScheduler {
        &self.arrival
    }

    /// The configuration of this run.
    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

/// Runs one simulation with default settings apart from policy and rate.
pub fn run_simulation(policy: PolicyKind, max_requests_per_second: u32) -> SimResult<SimReport> {
    Simulation::new(SimConfig::new(policy, max_requests_per_second))?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn small_config(policy: PolicyKind) -> SimConfig {
        let mut config = SimConfig::new(policy, 20);
        config.target_completions = 300;
        config.sample_limit = 50;
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config(PolicyKind::Fifo);
        config.queue_capacity = 1;
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_new_lays_out_files() {
        let sim = Simulation::new(small_config(PolicyKind::Fifo)).unwrap();
        assert!(sim.sector_map().occupied_count() > 0);
        assert_eq!(sim.arrival().workloads().len(), 10);
        assert_eq!(sim.clock(), 0);
    }

    #[test]
    fn test_step_advances_clock() {
        let mut sim = Simulation::new(small_config(PolicyKind::Fifo)).unwrap();
        for _ in 0..50 {
            sim.step().unwrap();
        }
        assert_eq!(sim.clock(), 50);
        assert_eq!(sim.arrival().time(), 50);
    }

    #[test]
    fn test_run_stops_at_target() {
        let report = Simulation::new(small_config(PolicyKind::TwoQueueScan))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.completed, 300);
        assert_eq!(report.latencies.len(), 50);
        assert_eq!(report.head_trace.len(), 50);
        assert_eq!(report.summary.count, 300);
        assert_eq!(report.workloads.len(), 10);
        assert!(report.total_ticks > 300);
    }

    #[test]
    fn test_report_samples_in_completion_order() {
        let report = Simulation::new(small_config(PolicyKind::CircularScan))
            .unwrap()
            .run()
            .unwrap();
        assert!(report
            .head_trace
            .windows(2)
            .all(|w| w[0].tick < w[1].tick));
        assert!(report.latencies.iter().all(|l| *l >= 8));
    }

    #[test]
    fn test_report_serializes() {
        let report = Simulation::new(small_config(PolicyKind::ShortestSeekFirst))
            .unwrap()
            .run()
            .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"policy\":\"sstf\""));
        let back: SimReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.completed, report.completed);
    }
}
