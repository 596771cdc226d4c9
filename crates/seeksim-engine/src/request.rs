//! Core request types for the simulation.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a workload, equal to its index in the arrival scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadId(pub usize);

impl WorkloadId {
    /// Returns the index for slice access.
    #[inline]
    pub fn as_index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workload-{}", self.0)
    }
}

/// Type of disk operation carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Read a sector; the originating workload post-processes the result.
    Read,
    /// Write a sector.
    Write,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Read => write!(f, "Read"),
            RequestKind::Write => write!(f, "Write"),
        }
    }
}

/// An I/O request against a single sector.
///
/// Requests are immutable values. The track is never stored: it depends on the
/// drive geometry and is derived with [`Request::track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    /// Operation type.
    pub kind: RequestKind,
    /// Absolute sector index on the drive.
    pub sector: u64,
    /// Workload that issued the request, if any.
    pub origin: Option<WorkloadId>,
}

impl Request {
    /// Creates a request issued by a workload.
    pub fn new(kind: RequestKind, sector: u64, origin: WorkloadId) -> Self {
        Self {
            kind,
            sector,
            origin: Some(origin),
        }
    }

    /// Creates a request with no originating workload.
    pub fn detached(kind: RequestKind, sector: u64) -> Self {
        Self {
            kind,
            sector,
            origin: None,
        }
    }

    /// Synthetic write to sector 0 that sends the head back to the first track.
    pub fn wrap_probe() -> Self {
        Self::detached(RequestKind::Write, 0)
    }

    /// Returns the track holding this request's sector.
    #[inline]
    pub fn track(&self, sectors_per_track: u32) -> u32 {
        (self.sector / u64::from(sectors_per_track)) as u32
    }

    /// Returns the absolute seek distance from `current_track`.
    #[inline]
    pub fn distance(&self, current_track: u32, sectors_per_track: u32) -> u32 {
        self.track(sectors_per_track).abs_diff(current_track)
    }

    /// Returns true if a workload should be told the result is ready.
    #[inline]
    pub fn notifies_origin(&self) -> bool {
        self.kind == RequestKind::Read && self.origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_is_floor_division() {
        let req = Request::detached(RequestKind::Read, 0);
        assert_eq!(req.track(100), 0);

        let req = Request::detached(RequestKind::Read, 99);
        assert_eq!(req.track(100), 0);

        let req = Request::detached(RequestKind::Read, 100);
        assert_eq!(req.track(100), 1);

        let req = Request::detached(RequestKind::Write, 4321);
        assert_eq!(req.track(100), 43);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let req = Request::detached(RequestKind::Read, 1050);
        assert_eq!(req.distance(4, 100), 6);
        assert_eq!(req.distance(16, 100), 6);
        assert_eq!(req.distance(10, 100), 0);
    }

    #[test]
    fn test_wrap_probe() {
        let probe = Request::wrap_probe();
        assert_eq!(probe.kind, RequestKind::Write);
        assert_eq!(probe.sector, 0);
        assert!(probe.origin.is_none());
        assert_eq!(probe.track(100), 0);
    }

    #[test]
    fn test_notifies_origin_only_for_owned_reads() {
        let id = WorkloadId(2);
        assert!(Request::new(RequestKind::Read, 5, id).notifies_origin());
        assert!(!Request::new(RequestKind::Write, 5, id).notifies_origin());
        assert!(!Request::detached(RequestKind::Read, 5).notifies_origin());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", WorkloadId(7)), "workload-7");
        assert_eq!(format!("{}", RequestKind::Read), "Read");
        assert_eq!(format!("{}", RequestKind::Write), "Write");
    }
}
