//! Mechanical drive model.
//!
//! The drive is a tick-driven state machine. A head positioned on a track must
//! settle rotationally before every transfer; moving to another track costs a
//! fixed number of ticks per track crossed and always ends in a rotational
//! settle.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::DriveConfig;
use crate::error::{SimError, SimResult};

/// Current state of the drive head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveState {
    /// Head stationary. `ready == false` means a settle is owed before a transfer.
    Idle {
        /// Current track.
        position: u32,
        /// Whether a transfer may happen now.
        ready: bool,
    },
    /// Head moving track by track toward `target`.
    Seeking {
        /// Current track.
        position: u32,
        /// Destination track.
        target: u32,
        /// Ticks spent on the current track crossing.
        progress: u32,
    },
    /// Waiting for the target sector to rotate under the head.
    RotationalSettle {
        /// Current track.
        position: u32,
        /// Ticks spent settling.
        progress: u32,
    },
}

impl DriveState {
    /// Track the head is currently over.
    #[inline]
    pub fn position(&self) -> u32 {
        match *self {
            DriveState::Idle { position, .. }
            | DriveState::Seeking { position, .. }
            | DriveState::RotationalSettle { position, .. } => position,
        }
    }
}

/// Timing constants of the drive, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveTiming {
    /// Ticks to cross one track.
    pub seek_ticks_per_track: u32,
    /// Ticks of rotational settle.
    pub rotational_delay_ticks: u32,
}

impl Default for DriveTiming {
    fn default() -> Self {
        Self {
            seek_ticks_per_track: 10,
            rotational_delay_ticks: 8,
        }
    }
}

/// A single drive head with its state machine.
#[derive(Debug, Clone)]
pub struct DriveMechanics {
    state: DriveState,
    timing: DriveTiming,
    track_count: u32,
}

impl DriveMechanics {
    /// Creates a drive parked on track 0, owing a settle.
    pub fn new(track_count: u32, timing: DriveTiming) -> Self {
        Self {
            state: DriveState::Idle {
                position: 0,
                ready: false,
            },
            timing,
            track_count,
        }
    }

    /// Creates a drive from the drive section of a configuration.
    pub fn from_config(config: &DriveConfig) -> Self {
        Self::new(
            config.track_count,
            DriveTiming {
                seek_ticks_per_track: config.seek_ticks_per_track,
                rotational_delay_ticks: config.rotational_delay_ticks,
            },
        )
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Returns the track under the head.
    #[inline]
    pub fn position(&self) -> u32 {
        self.state.position()
    }

    /// Returns the number of tracks on the drive.
    #[inline]
    pub fn track_count(&self) -> u32 {
        self.track_count
    }

    /// Returns the timing constants.
    #[inline]
    pub fn timing(&self) -> DriveTiming {
        self.timing
    }

    /// Returns true if a transfer may be performed now.
    #[inline]
    pub fn is_ready_for_transfer(&self) -> bool {
        matches!(self.state, DriveState::Idle { ready: true, .. })
    }

    /// Starts moving the head toward `target_track`.
    ///
    /// Seeking to the current track skips straight to the rotational settle.
    pub fn request_seek(&mut self, target_track: u32) -> SimResult<()> {
        if target_track >= self.track_count {
            return Err(SimError::TrackOutOfRange {
                track: target_track,
                track_count: self.track_count,
            });
        }
        let position = self.position();
        self.state = if target_track == position {
            DriveState::RotationalSettle {
                position,
                progress: 1,
            }
        } else {
            DriveState::Seeking {
                position,
                target: target_track,
                progress: 1,
            }
        };
        trace!("Seek requested: from={}, to={}", position, target_track);
        Ok(())
    }

    /// Advances the drive by one tick.
    pub fn tick(&mut self) {
        self.state = match self.state {
            DriveState::RotationalSettle { position, progress } => {
                if progress == self.timing.rotational_delay_ticks {
                    DriveState::Idle {
                        position,
                        ready: true,
                    }
                } else {
                    DriveState::RotationalSettle {
                        position,
                        progress: progress + 1,
                    }
                }
            }
            DriveState::Seeking {
                position,
                target,
                progress,
            } => {
                if position == target {
                    DriveState::RotationalSettle {
                        position,
                        progress: 1,
                    }
                } else if progress == self.timing.seek_ticks_per_track {
                    let position = if position > target {
                        position - 1
                    } else {
                        position + 1
                    };
                    DriveState::Seeking {
                        position,
                        target,
                        progress: 1,
                    }
                } else {
                    DriveState::Seeking {
                        position,
                        target,
                        progress: progress + 1,
                    }
                }
            }
            DriveState::Idle {
                position,
                ready: false,
            } => DriveState::RotationalSettle {
                position,
                progress: 1,
            },
            idle @ DriveState::Idle { ready: true, .. } => idle,
        };
    }

    /// Transfers the sector under the head.
    ///
    /// Only legal when the drive is idle and settled; afterwards a new settle
    /// is owed before the next transfer.
    pub fn perform_transfer(&mut self) -> SimResult<()> {
        match self.state {
            DriveState::Idle {
                position,
                ready: true,
            } => {
                self.state = DriveState::Idle {
                    position,
                    ready: false,
                };
                Ok(())
            }
            state => Err(SimError::IllegalTransfer { state }),
        }
    }
}
