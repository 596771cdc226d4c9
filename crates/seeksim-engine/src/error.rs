//! Error types for the simulation engine.

use thiserror::Error;

use crate::drive::DriveState;
use crate::request::WorkloadId;

/// Result type alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Error variants for simulation operations.
///
/// Only [`SimError::QueueFull`] is recoverable: it is the backpressure signal a
/// workload receives when the scheduling policy has no room. Every other variant
/// aborts the run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The scheduling policy queue has no free slot for the request.
    #[error("Queue full: capacity {capacity} reached")]
    QueueFull {
        /// Capacity of the queue that rejected the request.
        capacity: usize,
    },

    /// A workload was assigned a file without any blocks.
    #[error("Workload {workload} was assigned an empty file")]
    EmptyFile {
        /// The workload that could never issue a request.
        workload: WorkloadId,
    },

    /// A transfer was attempted while the drive was not settled and ready.
    #[error("Illegal transfer: drive is in state {state:?}")]
    IllegalTransfer {
        /// Drive state at the time of the call.
        state: DriveState,
    },

    /// A seek targeted a track that does not exist on the drive.
    #[error("Track {track} out of range: drive has {track_count} tracks")]
    TrackOutOfRange {
        /// Requested track.
        track: u32,
        /// Number of tracks on the drive.
        track_count: u32,
    },

    /// The generated file layout does not fit on the drive.
    #[error("Layout overflow: sector {sector} exceeds drive capacity of {capacity} sectors")]
    LayoutOverflow {
        /// First sector that did not fit.
        sector: u64,
        /// Total sectors on the drive.
        capacity: u64,
    },

    /// The simulation configuration is inconsistent.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Wraps standard I/O errors (configuration file access).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("Parse error: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },
}

impl SimError {
    /// Returns true for the backpressure condition a workload retries on.
    #[inline]
    pub fn is_queue_full(&self) -> bool {
        matches!(self, SimError::QueueFull { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_result_alias() {
        let ok: SimResult<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: SimResult<i32> = Err(SimError::QueueFull { capacity: 20 });
        assert!(err.is_err());
    }

    #[test]
    fn test_queue_full_is_recoverable() {
        assert!(SimError::QueueFull { capacity: 10 }.is_queue_full());
        assert!(!SimError::EmptyFile {
            workload: WorkloadId(3)
        }
        .is_queue_full());
    }

    #[test]
    fn test_queue_full_display() {
        let err = SimError::QueueFull { capacity: 20 };
        assert_eq!(format!("{}", err), "Queue full: capacity 20 reached");
    }

    #[test]
    fn test_illegal_transfer_mentions_state() {
        let err = SimError::IllegalTransfer {
            state: DriveState::RotationalSettle {
                position: 4,
                progress: 2,
            },
        };
        let msg = format!("{}", err);
        assert!(msg.contains("RotationalSettle"));
        assert!(msg.contains("position: 4"));
    }

    #[test]
    fn test_track_out_of_range() {
        let err = SimError::TrackOutOfRange {
            track: 900,
            track_count: 500,
        };
        assert_eq!(
            format!("{}", err),
            "Track 900 out of range: drive has 500 tracks"
        );
    }

    #[test]
    fn test_io_error_from_std() {
        let std_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err: SimError = std_err.into();
        assert!(matches!(err, SimError::Io(_)));
    }
}
