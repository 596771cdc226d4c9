#![warn(missing_docs)]

//! SeekSim engine: tick-driven simulation of disk request scheduling
//!
//! This crate models a moving-head disk drive, the queueing policies a
//! controller may use to order requests for it, and a population of workloads
//! competing for it under a per-second request budget. A run is fully
//! determined by its [`SimConfig`] and yields a [`SimReport`] of completion
//! latencies and head positions.

pub mod arrival;
pub mod config;
pub mod controller;
pub mod drive;
pub mod driver;
pub mod error;
pub mod generator;
pub mod layout;
pub mod policy;
pub mod request;
pub mod rng;
pub mod stats;
pub mod workload;

pub use arrival::{ArrivalScheduler, BudgetWindow};
pub use config::{ArrivalConfig, DriveConfig, SimConfig, WorkloadConfig};
pub use controller::{Completion, DiskController, InFlight};
pub use drive::{DriveMechanics, DriveState, DriveTiming};
pub use driver::{run_simulation, SimReport, Simulation};
pub use error::{SimError, SimResult};
pub use generator::WorkloadGenerator;
pub use layout::{FileKind, FileLayout, SectorMap};
pub use policy::{
    build_policy, ActiveQueue, BoundedQueue, CircularScan, Fifo, PolicyKind, PolicyStats,
    SchedulingPolicy, ShortestSeekFirst, SweepDirection, TwoQueueLook, TwoQueueScan,
};
pub use request::{Request, RequestKind, WorkloadId};
pub use rng::{exponential_budget, SequenceSource, SimRng, UniformSource, MAX_BUDGET_REDRAWS};
pub use stats::{HeadSample, LatencySummary, SimStats};
pub use workload::{AccessStyle, Workload, WorkloadState, WorkloadStats, WorkloadTiming};
