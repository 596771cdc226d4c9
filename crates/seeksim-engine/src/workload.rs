//! Workloads issuing requests against their own file.
//!
//! A workload cycles through three states: it spends a fixed time synthesizing
//! a request, holds it until the arrival scheduler admits it and the controller
//! accepts it, and after a completed read spends a fixed time post-processing
//! the result.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::WorkloadConfig;
use crate::controller::DiskController;
use crate::error::{SimError, SimResult};
use crate::layout::{FileKind, FileLayout};
use crate::request::{Request, RequestKind, WorkloadId};
use crate::rng::UniformSource;

/// How a workload picks the next block of its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStyle {
    /// Any block, uniformly.
    Random,
    /// The block after the last one queried, wrapping at the end of the file.
    Sequential,
}

/// Lifecycle state of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadState {
    /// Synthesizing a request.
    Generating {
        /// Ticks spent so far.
        progress: u32,
    },
    /// Holding a request not yet accepted by the controller.
    Ready {
        /// The pending request.
        request: Request,
    },
    /// Post-processing a completed read.
    AwaitingTransfer {
        /// Ticks spent so far.
        progress: u32,
    },
}

/// Fixed processing times of a workload, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadTiming {
    /// Ticks to synthesize a request.
    pub generation_ticks: u32,
    /// Ticks to post-process a completed read.
    pub post_processing_ticks: u32,
}

impl Default for WorkloadTiming {
    fn default() -> Self {
        Self {
            generation_ticks: 7,
            post_processing_ticks: 7,
        }
    }
}

impl From<&WorkloadConfig> for WorkloadTiming {
    fn from(config: &WorkloadConfig) -> Self {
        Self {
            generation_ticks: config.generation_ticks,
            post_processing_ticks: config.post_processing_ticks,
        }
    }
}

/// Lifetime counters of one workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadStats {
    /// Requests synthesized.
    pub generated: u64,
    /// Requests accepted by the controller.
    pub submitted: u64,
    /// Submission attempts refused with a full queue.
    pub rejected: u64,
    /// Read completions delivered to this workload.
    pub reads_completed: u64,
    /// Ready requests discarded by an arriving read completion.
    pub dropped: u64,
}

/// One competing workload.
#[derive(Debug, Clone)]
pub struct Workload {
    id: WorkloadId,
    file: FileLayout,
    read_only: bool,
    style: AccessStyle,
    last_block: usize,
    state: WorkloadState,
    timing: WorkloadTiming,
    admission_open: bool,
    submitted_this_second: u32,
    stats: WorkloadStats,
}

impl Workload {
    /// Creates a workload over `file`.
    ///
    /// Large files pick their access style with a fair coin; smaller files are
    /// always accessed randomly. Fails if the file has no blocks.
    pub fn new<R: UniformSource + ?Sized>(
        id: WorkloadId,
        file: FileLayout,
        read_only: bool,
        timing: WorkloadTiming,
        rng: &mut R,
    ) -> SimResult<Self> {
        if file.is_empty() {
            return Err(SimError::EmptyFile { workload: id });
        }
        let style = match file.kind {
            FileKind::Large if !rng.coin() => AccessStyle::Sequential,
            _ => AccessStyle::Random,
        };
        Ok(Self {
            id,
            file,
            read_only,
            style,
            last_block: 0,
            state: WorkloadState::Generating { progress: 1 },
            timing,
            admission_open: true,
            submitted_this_second: 0,
            stats: WorkloadStats::default(),
        })
    }

    /// Advances the workload by one tick.
    pub fn tick<R: UniformSource + ?Sized>(
        &mut self,
        controller: &mut DiskController,
        rng: &mut R,
    ) -> SimResult<()> {
        self.state = match self.state {
            WorkloadState::Generating { progress } => {
                if progress == self.timing.generation_ticks {
                    let request = self.synthesize(rng);
                    self.stats.generated += 1;
                    WorkloadState::Ready { request }
                } else {
                    WorkloadState::Generating {
                        progress: progress + 1,
                    }
                }
            }
            WorkloadState::Ready { request } => {
                if !self.admission_open {
                    return Ok(());
                }
                match controller.submit(request) {
                    Ok(()) => {
                        self.submitted_this_second += 1;
                        self.stats.submitted += 1;
                        WorkloadState::Generating { progress: 1 }
                    }
                    Err(e) if e.is_queue_full() => {
                        self.stats.rejected += 1;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
            WorkloadState::AwaitingTransfer { progress } => {
                if progress == self.timing.post_processing_ticks {
                    WorkloadState::Generating { progress: 1 }
                } else {
                    WorkloadState::AwaitingTransfer {
                        progress: progress + 1,
                    }
                }
            }
        };
        Ok(())
    }

    fn synthesize<R: UniformSource + ?Sized>(&mut self, rng: &mut R) -> Request {
        let kind = if self.read_only || rng.coin() {
            RequestKind::Read
        } else {
            RequestKind::Write
        };
        let index = match self.style {
            AccessStyle::Random => rng.below(self.file.size()),
            AccessStyle::Sequential => (self.last_block + 1) % self.file.size(),
        };
        self.last_block = index;
        let request = Request::new(kind, self.file.blocks[index], self.id);
        trace!(
            "{} synthesized {} of sector {} (block {})",
            self.id,
            kind,
            request.sector,
            index
        );
        request
    }

    /// Delivers the result of a completed read; the workload starts post-processing.
    pub fn on_read_complete(&mut self) {
        if let WorkloadState::Ready { request } = self.state {
            self.stats.dropped += 1;
            warn!(
                "{} dropped unsubmitted request for sector {} on read completion",
                self.id, request.sector
            );
        }
        self.stats.reads_completed += 1;
        self.state = WorkloadState::AwaitingTransfer { progress: 1 };
    }

    /// Opens or closes the admission gate for this tick.
    #[inline]
    pub fn set_admission(&mut self, open: bool) {
        self.admission_open = open;
    }

    /// Clears the per-second submission count.
    #[inline]
    pub fn reset_submitted(&mut self) {
        self.submitted_this_second = 0;
    }

    /// Requests accepted since the start of the current second.
    #[inline]
    pub fn submitted_this_second(&self) -> u32 {
        self.submitted_this_second
    }

    /// Identifier.
    #[inline]
    pub fn id(&self) -> WorkloadId {
        self.id
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> WorkloadState {
        self.state
    }

    /// The file this workload accesses.
    #[inline]
    pub fn file(&self) -> &FileLayout {
        &self.file
    }

    /// Whether the workload only reads.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Block selection style.
    #[inline]
    pub fn access_style(&self) -> AccessStyle {
        self.style
    }

    /// Lifetime counters.
    #[inline]
    pub fn stats(&self) -> &WorkloadStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{DriveMechanics, DriveTiming};
    use crate::policy::{build_policy, PolicyKind};
    use crate::rng::SequenceSource;

    fn controller(capacity: usize) -> DiskController {
        DiskController::new(
            DriveMechanics::new(100, DriveTiming::default()),
            build_policy(PolicyKind::Fifo, capacity, 100),
            100,
        )
    }

    fn file(kind: FileKind, blocks: Vec<u64>) -> FileLayout {
        FileLayout::new(kind, blocks)
    }

    fn timing() -> WorkloadTiming {
        WorkloadTiming {
            generation_ticks: 3,
            post_processing_ticks: 2,
        }
    }

    fn tick_n(w: &mut Workload, ctl: &mut DiskController, rng: &mut SequenceSource, n: usize) {
        for _ in 0..n {
            w.tick(ctl, rng).unwrap();
        }
    }

    #[test]
    fn test_empty_file_rejected() {
        let mut rng = SequenceSource::new(vec![0.1]);
        let result = Workload::new(
            WorkloadId(4),
            file(FileKind::Small, Vec::new()),
            false,
            timing(),
            &mut rng,
        );
        assert!(matches!(
            result,
            Err(SimError::EmptyFile {
                workload: WorkloadId(4)
            })
        ));
    }

    #[test]
    fn test_access_style_selection() {
        let mut rng = SequenceSource::new(vec![0.9]);
        let small = Workload::new(WorkloadId(0), file(FileKind::Small, vec![1]), false, timing(), &mut rng)
            .unwrap();
        assert_eq!(small.access_style(), AccessStyle::Random);

        let large = Workload::new(WorkloadId(1), file(FileKind::Large, vec![1, 2]), false, timing(), &mut rng)
            .unwrap();
        assert_eq!(large.access_style(), AccessStyle::Sequential);

        let mut rng = SequenceSource::new(vec![0.2]);
        let large = Workload::new(WorkloadId(2), file(FileKind::Large, vec![1, 2]), false, timing(), &mut rng)
            .unwrap();
        assert_eq!(large.access_style(), AccessStyle::Random);
    }

    #[test]
    fn test_generation_takes_fixed_time() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();

        tick_n(&mut w, &mut ctl, &mut rng, 2);
        assert_eq!(w.state(), WorkloadState::Generating { progress: 3 });

        w.tick(&mut ctl, &mut rng).unwrap();
        let WorkloadState::Ready { request } = w.state() else {
            panic!("expected Ready, got {:?}", w.state());
        };
        assert_eq!(request.sector, 42);
        assert_eq!(request.kind, RequestKind::Read);
        assert_eq!(request.origin, Some(WorkloadId(0)));
    }

    #[test]
    fn test_submit_returns_to_generating() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();

        tick_n(&mut w, &mut ctl, &mut rng, 4);
        assert_eq!(w.state(), WorkloadState::Generating { progress: 1 });
        assert_eq!(w.submitted_this_second(), 1);
        assert_eq!(ctl.policy().len(), 1);
        assert_eq!(w.stats().submitted, 1);
    }

    #[test]
    fn test_closed_gate_holds_request() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();
        w.set_admission(false);

        tick_n(&mut w, &mut ctl, &mut rng, 10);
        assert!(matches!(w.state(), WorkloadState::Ready { .. }));
        assert_eq!(ctl.policy().len(), 0);

        w.set_admission(true);
        w.tick(&mut ctl, &mut rng).unwrap();
        assert_eq!(ctl.policy().len(), 1);
    }

    #[test]
    fn test_queue_full_retries_next_tick() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(2);
        ctl.submit(Request::detached(RequestKind::Write, 1)).unwrap();
        ctl.submit(Request::detached(RequestKind::Write, 2)).unwrap();

        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();
        tick_n(&mut w, &mut ctl, &mut rng, 6);
        assert!(matches!(w.state(), WorkloadState::Ready { .. }));
        assert_eq!(w.stats().rejected, 3);
        assert_eq!(w.submitted_this_second(), 0);
    }

    #[test]
    fn test_read_completion_post_processing() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();

        w.on_read_complete();
        assert_eq!(w.state(), WorkloadState::AwaitingTransfer { progress: 1 });
        w.tick(&mut ctl, &mut rng).unwrap();
        assert_eq!(w.state(), WorkloadState::AwaitingTransfer { progress: 2 });
        w.tick(&mut ctl, &mut rng).unwrap();
        assert_eq!(w.state(), WorkloadState::Generating { progress: 1 });
        assert_eq!(w.stats().reads_completed, 1);
    }

    #[test]
    fn test_read_completion_drops_ready_request() {
        let mut rng = SequenceSource::new(vec![0.0]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![42]), true, timing(), &mut rng)
            .unwrap();
        w.set_admission(false);
        tick_n(&mut w, &mut ctl, &mut rng, 3);
        assert!(matches!(w.state(), WorkloadState::Ready { .. }));

        w.on_read_complete();
        assert_eq!(w.state(), WorkloadState::AwaitingTransfer { progress: 1 });
        assert_eq!(w.stats().dropped, 1);
    }

    #[test]
    fn test_kind_coin_for_writable_files() {
        // Style draw is skipped for small files; then 0.7 → Write, 0.2 → Read.
        let mut rng = SequenceSource::new(vec![0.7, 0.0, 0.2, 0.0]);
        let mut ctl = controller(8);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Small, vec![5, 6]), false, timing(), &mut rng)
            .unwrap();

        tick_n(&mut w, &mut ctl, &mut rng, 3);
        let WorkloadState::Ready { request } = w.state() else {
            panic!("expected Ready");
        };
        assert_eq!(request.kind, RequestKind::Write);

        tick_n(&mut w, &mut ctl, &mut rng, 4);
        let WorkloadState::Ready { request } = w.state() else {
            panic!("expected Ready");
        };
        assert_eq!(request.kind, RequestKind::Read);
    }

    #[test]
    fn test_sequential_access_wraps() {
        // 0.9 picks the sequential style for the large file.
        let mut rng = SequenceSource::new(vec![0.9]);
        let mut ctl = controller(16);
        let blocks = vec![100, 101, 103];
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Large, blocks), true, timing(), &mut rng)
            .unwrap();
        assert_eq!(w.access_style(), AccessStyle::Sequential);

        let mut sectors = Vec::new();
        for _ in 0..4 {
            tick_n(&mut w, &mut ctl, &mut rng, 3);
            if let WorkloadState::Ready { request } = w.state() {
                sectors.push(request.sector);
            }
            w.tick(&mut ctl, &mut rng).unwrap();
        }
        assert_eq!(sectors, vec![101, 103, 100, 101]);
    }

    #[test]
    fn test_random_access_uses_uniform_index() {
        let mut rng = SequenceSource::new(vec![0.5]);
        let mut ctl = controller(4);
        let mut w = Workload::new(WorkloadId(0), file(FileKind::Medium, vec![10, 20, 30, 40]), true, timing(), &mut rng)
            .unwrap();
        tick_n(&mut w, &mut ctl, &mut rng, 3);
        let WorkloadState::Ready { request } = w.state() else {
            panic!("expected Ready");
        };
        assert_eq!(request.sector, 30);
    }
}
