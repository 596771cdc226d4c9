//! Round-robin arrival scheduling with a per-second request budget.
//!
//! Only one workload runs per tick. The active workload changes every quantum,
//! and at the start of every simulated second a fresh budget is drawn and split
//! across the workloads. A workload whose share of the budget is spent holds
//! its ready request until the next second.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ArrivalConfig;
use crate::controller::DiskController;
use crate::error::SimResult;
use crate::request::WorkloadId;
use crate::rng::{exponential_budget, UniformSource};
use crate::workload::Workload;

/// Budget bookkeeping of the current simulated second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetWindow {
    /// Second index, starting at zero.
    pub second: u64,
    /// Total requests admitted during this second.
    pub total: u32,
}

/// Time-slices the workloads and gates their submissions.
#[derive(Debug)]
pub struct ArrivalScheduler {
    workloads: Vec<Workload>,
    quantum: u64,
    ticks_per_second: u64,
    max_requests_per_second: u32,
    lambda: f64,
    time: u64,
    active: usize,
    budgets: Vec<u32>,
    window: BudgetWindow,
}

impl ArrivalScheduler {
    /// Creates a scheduler over `workloads`, starting with the first one active.
    pub fn new(workloads: Vec<Workload>, config: &ArrivalConfig) -> Self {
        let budgets = vec![0; workloads.len()];
        Self {
            workloads,
            quantum: config.quantum_ticks,
            ticks_per_second: config.ticks_per_second,
            max_requests_per_second: config.max_requests_per_second,
            lambda: config.budget_lambda,
            time: 0,
            active: 0,
            budgets,
            window: BudgetWindow::default(),
        }
    }

    /// Advances the scheduler, and the active workload, by one tick.
    pub fn tick<R: UniformSource + ?Sized>(
        &mut self,
        controller: &mut DiskController,
        rng: &mut R,
    ) -> SimResult<()> {
        if self.workloads.is_empty() {
            self.time += 1;
            return Ok(());
        }

        if self.time % self.ticks_per_second == 0 {
            self.start_second(rng);
        }

        let active = self.active;
        let workload = &mut self.workloads[active];
        workload.set_admission(workload.submitted_this_second() < self.budgets[active]);
        workload.tick(controller, rng)?;

        self.time += 1;
        if self.time % self.quantum == 0 {
            self.active = (self.active + 1) % self.workloads.len();
        }
        Ok(())
    }

    fn start_second<R: UniformSource + ?Sized>(&mut self, rng: &mut R) {
        let total = exponential_budget(self.max_requests_per_second, self.lambda, rng);
        self.distribute(total);
        for workload in &mut self.workloads {
            workload.reset_submitted();
        }
        self.window = BudgetWindow {
            second: self.time / self.ticks_per_second,
            total,
        };
        debug!(
            "Second {}: budget={} split={:?}",
            self.window.second, total, self.budgets
        );
    }

    /// Splits `total` one unit at a time, round-robin from the first workload.
    fn distribute(&mut self, total: u32) {
        let n = self.budgets.len() as u32;
        let (share, extra) = (total / n, total % n);
        for (idx, budget) in self.budgets.iter_mut().enumerate() {
            *budget = share + u32::from((idx as u32) < extra);
        }
    }

    /// Routes a read completion to the workload that issued it.
    pub fn notify_read_complete(&mut self, id: WorkloadId) {
        if let Some(workload) = self.workloads.get_mut(id.as_index()) {
            workload.on_read_complete();
        }
    }

    /// Ticks elapsed since the start of the run.
    #[inline]
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Index of the workload running this quantum.
    #[inline]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Per-workload budgets of the current second.
    #[inline]
    pub fn budgets(&self) -> &[u32] {
        &self.budgets
    }

    /// Budget of the current second.
    #[inline]
    pub fn window(&self) -> &BudgetWindow {
        &self.window
    }

    /// The scheduled workloads.
    #[inline]
    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{DriveMechanics, DriveTiming};
    use crate::layout::{FileKind, FileLayout};
    use crate::policy::{build_policy, PolicyKind};
    use crate::rng::SequenceSource;
    use crate::workload::{WorkloadState, WorkloadTiming};

    fn controller(capacity: usize) -> DiskController {
        DiskController::new(
            DriveMechanics::new(100, DriveTiming::default()),
            build_policy(PolicyKind::Fifo, capacity, 100),
            100,
        )
    }

    fn workloads(n: usize, rng: &mut SequenceSource) -> Vec<Workload> {
        (0..n)
            .map(|i| {
                Workload::new(
                    WorkloadId(i),
                    FileLayout::new(FileKind::Small, vec![i as u64 * 10]),
                    true,
                    WorkloadTiming {
                        generation_ticks: 2,
                        post_processing_ticks: 2,
                    },
                    rng,
                )
                .unwrap()
            })
            .collect()
    }

    fn config(quantum: u64, tps: u64, rate: u32) -> ArrivalConfig {
        ArrivalConfig {
            quantum_ticks: quantum,
            ticks_per_second: tps,
            max_requests_per_second: rate,
            budget_lambda: 2.0,
        }
    }

    #[test]
    fn test_budget_split_differs_by_at_most_one() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut sched = ArrivalScheduler::new(workloads(3, &mut rng), &config(5, 100, 20));
        sched.distribute(7);
        assert_eq!(sched.budgets(), &[3, 2, 2]);
        sched.distribute(2);
        assert_eq!(sched.budgets(), &[1, 1, 0]);
        sched.distribute(9);
        assert_eq!(sched.budgets(), &[3, 3, 3]);
    }

    #[test]
    fn test_first_tick_draws_budget() {
        // u = 0 gives the full budget of 20.
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(20);
        let mut sched = ArrivalScheduler::new(workloads(4, &mut rng), &config(5, 100, 20));

        sched.tick(&mut ctl, &mut rng).unwrap();
        assert_eq!(sched.window().total, 20);
        assert_eq!(sched.budgets(), &[5, 5, 5, 5]);
        assert_eq!(sched.time(), 1);
    }

    #[test]
    fn test_quantum_rotates_active_workload() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(20);
        let mut sched = ArrivalScheduler::new(workloads(3, &mut rng), &config(4, 1000, 20));

        let mut seen = Vec::new();
        for _ in 0..16 {
            seen.push(sched.active());
            sched.tick(&mut ctl, &mut rng).unwrap();
        }
        assert_eq!(
            seen,
            vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_only_active_workload_ticks() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(20);
        let mut sched = ArrivalScheduler::new(workloads(2, &mut rng), &config(10, 1000, 20));

        for _ in 0..3 {
            sched.tick(&mut ctl, &mut rng).unwrap();
        }
        assert_eq!(sched.workloads()[1].state(), WorkloadState::Generating { progress: 1 });
        assert_eq!(sched.workloads()[0].stats().generated, 1);
    }

    #[test]
    fn test_exhausted_budget_holds_request() {
        // Budget 20 over 20 workloads gives workload 0 exactly one submission.
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(20);
        let mut sched = ArrivalScheduler::new(workloads(20, &mut rng), &config(100, 1000, 20));

        for _ in 0..20 {
            sched.tick(&mut ctl, &mut rng).unwrap();
        }
        let w = &sched.workloads()[0];
        assert_eq!(w.submitted_this_second(), 1);
        assert_eq!(w.stats().submitted, 1);
        assert!(matches!(w.state(), WorkloadState::Ready { .. }));
        assert_eq!(ctl.policy().len(), 1);
    }

    #[test]
    fn test_new_second_resets_submissions() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(20);
        let mut sched = ArrivalScheduler::new(workloads(20, &mut rng), &config(100, 10, 20));

        for _ in 0..10 {
            sched.tick(&mut ctl, &mut rng).unwrap();
        }
        assert_eq!(sched.workloads()[0].submitted_this_second(), 1);
        sched.tick(&mut ctl, &mut rng).unwrap();
        assert_eq!(sched.window().second, 1);
        assert_eq!(sched.workloads()[0].stats().submitted, 2);
    }

    #[test]
    fn test_notify_routes_to_owner() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut sched = ArrivalScheduler::new(workloads(3, &mut rng), &config(5, 100, 20));
        sched.notify_read_complete(WorkloadId(2));
        assert_eq!(
            sched.workloads()[2].state(),
            WorkloadState::AwaitingTransfer { progress: 1 }
        );
        assert_eq!(sched.workloads()[0].state(), WorkloadState::Generating { progress: 1 });
        sched.notify_read_complete(WorkloadId(99));
    }
}
