//! Disk controller binding a scheduling policy to the drive mechanics.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::drive::DriveMechanics;
use crate::error::SimResult;
use crate::policy::SchedulingPolicy;
use crate::request::Request;
use crate::stats::SimStats;

/// A request handed to the drive and not yet transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    /// The request being served.
    pub request: Request,
    /// Controller ticks since the request was issued to the drive.
    pub elapsed: u64,
}

/// A transfer finished during a controller tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// The completed request.
    pub request: Request,
    /// Ticks between issue and transfer.
    pub latency: u64,
    /// Track of the transfer.
    pub track: u32,
}

/// Owns the drive and the policy and moves requests between them.
///
/// The controller never ticks the drive itself; the simulation driver does that
/// after the controller's own tick.
#[derive(Debug)]
pub struct DiskController {
    drive: DriveMechanics,
    policy: Box<dyn SchedulingPolicy>,
    sectors_per_track: u32,
    in_flight: Option<InFlight>,
}

impl DiskController {
    /// Creates a controller with nothing in flight.
    pub fn new(
        drive: DriveMechanics,
        policy: Box<dyn SchedulingPolicy>,
        sectors_per_track: u32,
    ) -> Self {
        Self {
            drive,
            policy,
            sectors_per_track,
            in_flight: None,
        }
    }

    /// Offers a request to the policy, propagating [`crate::SimError::QueueFull`].
    #[inline]
    pub fn submit(&mut self, request: Request) -> SimResult<()> {
        self.policy.try_enqueue(request)
    }

    /// Advances the controller by one tick at global time `now`.
    ///
    /// Returns the completion if a transfer happened during this tick.
    pub fn tick(&mut self, now: u64, stats: &mut SimStats) -> SimResult<Option<Completion>> {
        let Some(in_flight) = self.in_flight.as_mut() else {
            self.issue_next()?;
            return Ok(None);
        };

        in_flight.elapsed += 1;
        if !self.drive.is_ready_for_transfer() {
            return Ok(None);
        }

        let InFlight { request, elapsed } = *in_flight;
        self.drive.perform_transfer()?;
        let track = self.drive.position();
        stats.record_completion(now, track, elapsed);
        trace!(
            "Completed: kind={}, sector={}, track={}, latency={}",
            request.kind,
            request.sector,
            track,
            elapsed
        );

        self.issue_next()?;
        Ok(Some(Completion {
            request,
            latency: elapsed,
            track,
        }))
    }

    /// Pulls the next request from the policy and starts the seek toward it.
    fn issue_next(&mut self) -> SimResult<()> {
        let current = self.drive.position();
        self.in_flight = match self.policy.select_next(current) {
            Some(request) => {
                self.drive.request_seek(request.track(self.sectors_per_track))?;
                Some(InFlight {
                    request,
                    elapsed: 0,
                })
            }
            None => None,
        };
        Ok(())
    }

    /// The drive.
    #[inline]
    pub fn drive(&self) -> &DriveMechanics {
        &self.drive
    }

    /// Mutable access to the drive, for the driver's per-tick advance.
    #[inline]
    pub fn drive_mut(&mut self) -> &mut DriveMechanics {
        &mut self.drive
    }

    /// The policy.
    #[inline]
    pub fn policy(&self) -> &dyn SchedulingPolicy {
        self.policy.as_ref()
    }

    /// The request currently being served.
    #[inline]
    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }
}
