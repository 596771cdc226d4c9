//! Builds the workload population and lays their files out on the drive.

use tracing::debug;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::layout::{FileKind, FileLayout, SectorMap};
use crate::request::WorkloadId;
use crate::rng::UniformSource;
use crate::workload::{Workload, WorkloadTiming};

/// Generates workloads with files allocated from a shared cursor.
///
/// Every file block is placed either at the cursor or one sector past it, with
/// `adjacency_probability` favoring the former. The cursor is shared by all
/// files, so files are interleaved the way sequential allocation under
/// contention would leave them.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    count: usize,
    adjacency_probability: f64,
    timing: WorkloadTiming,
    cursor: u64,
}

impl WorkloadGenerator {
    /// Creates a generator from the workload section of a configuration.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            count: config.workload.count,
            adjacency_probability: config.workload.adjacency_probability,
            timing: WorkloadTiming::from(&config.workload),
            cursor: 0,
        }
    }

    /// Next sector the allocation cursor points at.
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Generates every workload, marking their blocks in `map`.
    pub fn generate<R: UniformSource + ?Sized>(
        &mut self,
        rng: &mut R,
        map: &mut SectorMap,
    ) -> SimResult<Vec<Workload>> {
        let mut workloads = Vec::with_capacity(self.count);
        for idx in 0..self.count {
            workloads.push(self.generate_one(WorkloadId(idx), rng, map)?);
        }
        Ok(workloads)
    }

    fn generate_one<R: UniformSource + ?Sized>(
        &mut self,
        id: WorkloadId,
        rng: &mut R,
        map: &mut SectorMap,
    ) -> SimResult<Workload> {
        let kind = FileKind::ALL[rng.below(FileKind::ALL.len())];
        let range = kind.size_range();
        let size = range.start() + rng.below(range.end() - range.start() + 1);

        let mut blocks = Vec::with_capacity(size);
        for _ in 0..size {
            let block = if rng.chance(self.adjacency_probability) {
                let block = self.cursor;
                self.cursor += 1;
                block
            } else {
                let block = self.cursor + 1;
                self.cursor += 2;
                block
            };
            map.mark(block)?;
            blocks.push(block);
        }

        let read_only = rng.coin();
        debug!(
            "Generated {}: kind={:?}, size={}, first_block={:?}, read_only={}",
            id,
            kind,
            size,
            blocks.first(),
            read_only
        );
        Workload::new(id, FileLayout::new(kind, blocks), read_only, self.timing, rng)
    }
}
