//! Request scheduling policies.
//!
//! A policy owns the bounded queue(s) of pending requests and decides which one
//! the controller serves next, given the track under the head. All scans walk the
//! queue in insertion order and keep the first of equally good candidates, so
//! tie-breaks are deterministic.

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{SimError, SimResult};
use crate::request::Request;

/// Available scheduling policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Arrival order.
    #[serde(rename = "fifo")]
    Fifo,
    /// Shortest seek first.
    #[serde(rename = "sstf")]
    ShortestSeekFirst,
    /// One-directional circular scan over a single queue.
    #[serde(rename = "cscan")]
    CircularScan,
    /// Two alternating circular-scan queues.
    #[serde(rename = "two-queue-scan")]
    TwoQueueScan,
    /// Two alternating queues served by a bidirectional LOOK sweep.
    #[serde(rename = "two-queue-look")]
    TwoQueueLook,
}

impl PolicyKind {
    /// Every policy, in presentation order.
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::Fifo,
        PolicyKind::ShortestSeekFirst,
        PolicyKind::CircularScan,
        PolicyKind::TwoQueueScan,
        PolicyKind::TwoQueueLook,
    ];

    /// Short name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Fifo => "fifo",
            PolicyKind::ShortestSeekFirst => "sstf",
            PolicyKind::CircularScan => "cscan",
            PolicyKind::TwoQueueScan => "two-queue-scan",
            PolicyKind::TwoQueueLook => "two-queue-look",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| SimError::Parse {
                reason: format!(
                    "unknown policy '{}', expected one of: fifo, sstf, cscan, two-queue-scan, two-queue-look",
                    s
                ),
            })
    }
}

/// Counters kept by every policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStats {
    /// Requests accepted into a queue.
    pub enqueued: u64,
    /// Submissions rejected because the target queue was full.
    pub rejected: u64,
    /// Queued requests handed to the controller.
    pub selected: u64,
    /// Synthetic wrap probes handed to the controller.
    pub wrap_probes: u64,
    /// Active/inactive queue flips.
    pub queue_switches: u64,
    /// LOOK sweep direction changes.
    pub direction_reversals: u64,
}

/// Interface between the controller and a scheduling discipline.
pub trait SchedulingPolicy: Send + fmt::Debug {
    /// Which policy this is.
    fn kind(&self) -> PolicyKind;

    /// Queues a request, or fails with [`SimError::QueueFull`] leaving the queues untouched.
    fn try_enqueue(&mut self, request: Request) -> SimResult<()>;

    /// Removes and returns the next request to serve, if any.
    fn select_next(&mut self, current_track: u32) -> Option<Request>;

    /// Number of queued requests.
    fn len(&self) -> usize;

    /// Total number of requests the policy can hold.
    fn capacity(&self) -> usize;

    /// Policy counters.
    fn stats(&self) -> &PolicyStats;

    /// Returns true if nothing is queued.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds a boxed policy of the given kind.
///
/// Two-queue policies split `capacity` evenly, each sub-queue holding `capacity / 2`.
pub fn build_policy(
    kind: PolicyKind,
    capacity: usize,
    sectors_per_track: u32,
) -> Box<dyn SchedulingPolicy> {
    debug!(
        "Creating policy: kind={}, capacity={}, sectors_per_track={}",
        kind, capacity, sectors_per_track
    );
    match kind {
        PolicyKind::Fifo => Box::new(Fifo::new(capacity)),
        PolicyKind::ShortestSeekFirst => {
            Box::new(ShortestSeekFirst::new(capacity, sectors_per_track))
        }
        PolicyKind::CircularScan => Box::new(CircularScan::new(capacity, sectors_per_track)),
        PolicyKind::TwoQueueScan => Box::new(TwoQueueScan::new(capacity, sectors_per_track)),
        PolicyKind::TwoQueueLook => Box::new(TwoQueueLook::new(capacity, sectors_per_track)),
    }
}

/// Fixed-capacity FIFO of requests with first-occurrence scans.
#[derive(Debug, Clone)]
pub struct BoundedQueue {
    items: VecDeque<Request>,
    capacity: usize,
}

impl BoundedQueue {
    /// Creates an empty queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a request if there is room.
    pub fn try_push(&mut self, request: Request) -> SimResult<()> {
        if self.items.len() >= self.capacity {
            return Err(SimError::QueueFull {
                capacity: self.capacity,
            });
        }
        self.items.push_back(request);
        Ok(())
    }

    /// Removes the oldest request.
    pub fn pop_front(&mut self) -> Option<Request> {
        self.items.pop_front()
    }

    /// Removes the request at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Request> {
        self.items.remove(index)
    }

    /// Number of queued requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of requests.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates queued requests oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.items.iter()
    }

    /// Index of the first request with the smallest key, skipping requests keyed `None`.
    pub fn first_min_by_key<K, F>(&self, mut key: F) -> Option<usize>
    where
        K: Ord,
        F: FnMut(&Request) -> Option<K>,
    {
        let mut best: Option<(usize, K)> = None;
        for (idx, request) in self.items.iter().enumerate() {
            if let Some(k) = key(request) {
                match &best {
                    Some((_, best_key)) if k >= *best_key => {}
                    _ => best = Some((idx, k)),
                }
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Index of the nearest request on or above `current`.
fn nearest_at_or_above(queue: &BoundedQueue, current: u32, spt: u32) -> Option<usize> {
    queue.first_min_by_key(|r| {
        let track = r.track(spt);
        (track >= current).then(|| track - current)
    })
}

/// Index of the nearest request on or below `current`.
fn nearest_at_or_below(queue: &BoundedQueue, current: u32, spt: u32) -> Option<usize> {
    queue.first_min_by_key(|r| {
        let track = r.track(spt);
        (track <= current).then(|| current - track)
    })
}

/// Outcome of a circular scan over one queue.
enum ScanPick {
    Queued(Request),
    WrapProbe,
    Empty,
}

fn circular_pick(queue: &mut BoundedQueue, current: u32, spt: u32) -> ScanPick {
    if queue.is_empty() {
        return ScanPick::Empty;
    }
    match nearest_at_or_above(queue, current, spt).and_then(|idx| queue.remove(idx)) {
        Some(request) => ScanPick::Queued(request),
        None => ScanPick::WrapProbe,
    }
}

fn record_pick(stats: &mut PolicyStats, pick: ScanPick, current: u32) -> Option<Request> {
    match pick {
        ScanPick::Queued(request) => {
            stats.selected += 1;
            Some(request)
        }
        ScanPick::WrapProbe => {
            stats.wrap_probes += 1;
            trace!("No request at or above track {}, wrapping to track 0", current);
            Some(Request::wrap_probe())
        }
        ScanPick::Empty => None,
    }
}

fn admit(queue: &mut BoundedQueue, stats: &mut PolicyStats, request: Request) -> SimResult<()> {
    match queue.try_push(request) {
        Ok(()) => {
            stats.enqueued += 1;
            trace!("Enqueued: sector={}, depth={}", request.sector, queue.len());
            Ok(())
        }
        Err(e) => {
            stats.rejected += 1;
            Err(e)
        }
    }
}

/// Serves requests in arrival order.
#[derive(Debug, Clone)]
pub struct Fifo {
    queue: BoundedQueue,
    stats: PolicyStats,
}

impl Fifo {
    /// Creates an empty FIFO policy.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
            stats: PolicyStats::default(),
        }
    }
}

impl SchedulingPolicy for Fifo {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Fifo
    }

    fn try_enqueue(&mut self, request: Request) -> SimResult<()> {
        admit(&mut self.queue, &mut self.stats, request)
    }

    fn select_next(&mut self, _current_track: u32) -> Option<Request> {
        let request = self.queue.pop_front()?;
        self.stats.selected += 1;
        Some(request)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

/// Serves the request closest to the head.
#[derive(Debug, Clone)]
pub struct ShortestSeekFirst {
    queue: BoundedQueue,
    sectors_per_track: u32,
    stats: PolicyStats,
}

impl ShortestSeekFirst {
    /// Creates an empty shortest-seek-first policy.
    pub fn new(capacity: usize, sectors_per_track: u32) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
            sectors_per_track,
            stats: PolicyStats::default(),
        }
    }
}

impl SchedulingPolicy for ShortestSeekFirst {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ShortestSeekFirst
    }

    fn try_enqueue(&mut self, request: Request) -> SimResult<()> {
        admit(&mut self.queue, &mut self.stats, request)
    }

    fn select_next(&mut self, current_track: u32) -> Option<Request> {
        let spt = self.sectors_per_track;
        let idx = self
            .queue
            .first_min_by_key(|r| Some(r.distance(current_track, spt)))?;
        let request = self.queue.remove(idx)?;
        self.stats.selected += 1;
        Some(request)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

/// One-directional circular scan.
///
/// Serves the nearest request at or above the head. When every queued request
/// lies below the head it returns a wrap probe to track 0 and leaves the queue
/// as it is.
#[derive(Debug, Clone)]
pub struct CircularScan {
    queue: BoundedQueue,
    sectors_per_track: u32,
    stats: PolicyStats,
}

impl CircularScan {
    /// Creates an empty circular scan policy.
    pub fn new(capacity: usize, sectors_per_track: u32) -> Self {
        Self {
            queue: BoundedQueue::new(capacity),
            sectors_per_track,
            stats: PolicyStats::default(),
        }
    }
}

impl SchedulingPolicy for CircularScan {
    fn kind(&self) -> PolicyKind {
        PolicyKind::CircularScan
    }

    fn try_enqueue(&mut self, request: Request) -> SimResult<()> {
        admit(&mut self.queue, &mut self.stats, request)
    }

    fn select_next(&mut self, current_track: u32) -> Option<Request> {
        let pick = circular_pick(&mut self.queue, current_track, self.sectors_per_track);
        record_pick(&mut self.stats, pick, current_track)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

/// Which of the two sub-queues is being drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveQueue {
    /// The first sub-queue is draining; arrivals go to the second.
    First,
    /// The second sub-queue is draining; arrivals go to the first.
    Second,
}

impl ActiveQueue {
    #[inline]
    fn index(self) -> usize {
        match self {
            ActiveQueue::First => 0,
            ActiveQueue::Second => 1,
        }
    }

    #[inline]
    fn other(self) -> Self {
        match self {
            ActiveQueue::First => ActiveQueue::Second,
            ActiveQueue::Second => ActiveQueue::First,
        }
    }
}

/// Active/inactive pair of sub-queues.
///
/// New requests always land in the inactive sub-queue, so the one being drained
/// never grows while it is served.
#[derive(Debug, Clone)]
struct QueuePair {
    queues: [BoundedQueue; 2],
    active: ActiveQueue,
}

impl QueuePair {
    fn new(total_capacity: usize) -> Self {
        let half = total_capacity / 2;
        Self {
            queues: [BoundedQueue::new(half), BoundedQueue::new(half)],
            active: ActiveQueue::First,
        }
    }

    fn admit(&mut self, stats: &mut PolicyStats, request: Request) -> SimResult<()> {
        let inactive = self.active.other().index();
        admit(&mut self.queues[inactive], stats, request)
    }

    /// Returns the sub-queue to serve from, flipping first if the active one is drained.
    fn serving(&mut self, stats: &mut PolicyStats) -> &mut BoundedQueue {
        if self.queues[self.active.index()].is_empty() {
            self.active = self.active.other();
            stats.queue_switches += 1;
            debug!(
                "Active queue drained, switching to {:?} (depth={})",
                self.active,
                self.queues[self.active.index()].len()
            );
        }
        &mut self.queues[self.active.index()]
    }

    fn len(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    fn capacity(&self) -> usize {
        self.queues.iter().map(|q| q.capacity()).sum()
    }
}

/// Two alternating circular-scan sub-queues.
#[derive(Debug, Clone)]
pub struct TwoQueueScan {
    pair: QueuePair,
    sectors_per_track: u32,
    stats: PolicyStats,
}

impl TwoQueueScan {
    /// Creates the policy; each sub-queue holds `capacity / 2` requests.
    pub fn new(capacity: usize, sectors_per_track: u32) -> Self {
        Self {
            pair: QueuePair::new(capacity),
            sectors_per_track,
            stats: PolicyStats::default(),
        }
    }

    /// Sub-queue currently being drained.
    pub fn active(&self) -> ActiveQueue {
        self.pair.active
    }
}

impl SchedulingPolicy for TwoQueueScan {
    fn kind(&self) -> PolicyKind {
        PolicyKind::TwoQueueScan
    }

    fn try_enqueue(&mut self, request: Request) -> SimResult<()> {
        self.pair.admit(&mut self.stats, request)
    }

    fn select_next(&mut self, current_track: u32) -> Option<Request> {
        let spt = self.sectors_per_track;
        let queue = self.pair.serving(&mut self.stats);
        let pick = circular_pick(queue, current_track, spt);
        record_pick(&mut self.stats, pick, current_track)
    }

    fn len(&self) -> usize {
        self.pair.len()
    }

    fn capacity(&self) -> usize {
        self.pair.capacity()
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}

/// Direction of a LOOK sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepDirection {
    /// Serving tracks at or above the head.
    Ascending,
    /// Serving tracks at or below the head.
    Descending,
}

/// Two alternating sub-queues served by a bidirectional LOOK sweep.
///
/// The sweep direction is shared by both sub-queues and survives queue switches.
#[derive(Debug, Clone)]
pub struct TwoQueueLook {
    pair: QueuePair,
    direction: SweepDirection,
    sectors_per_track: u32,
    stats: PolicyStats,
}

impl TwoQueueLook {
    /// Creates the policy; each sub-queue holds `capacity / 2` requests.
    pub fn new(capacity: usize, sectors_per_track: u32) -> Self {
        Self {
            pair: QueuePair::new(capacity),
            direction: SweepDirection::Ascending,
            sectors_per_track,
            stats: PolicyStats::default(),
        }
    }

    /// Sub-queue currently being drained.
    pub fn active(&self) -> ActiveQueue {
        self.pair.active
    }

    /// Current sweep direction.
    pub fn direction(&self) -> SweepDirection {
        self.direction
    }
}

impl SchedulingPolicy for TwoQueueLook {
    fn kind(&self) -> PolicyKind {
        PolicyKind::TwoQueueLook
    }

    fn try_enqueue(&mut self, request: Request) -> SimResult<()> {
        self.pair.admit(&mut self.stats, request)
    }

    fn select_next(&mut self, current_track: u32) -> Option<Request> {
        let spt = self.sectors_per_track;
        let direction = self.direction;
        let queue = self.pair.serving(&mut self.stats);
        if queue.is_empty() {
            return None;
        }

        let (idx, reversed) = match direction {
            SweepDirection::Ascending => match nearest_at_or_above(queue, current_track, spt) {
                Some(idx) => (idx, false),
                None => (queue.first_min_by_key(|r| Some(Reverse(r.track(spt))))?, true),
            },
            SweepDirection::Descending => match nearest_at_or_below(queue, current_track, spt) {
                Some(idx) => (idx, false),
                None => (queue.first_min_by_key(|r| Some(r.track(spt)))?, true),
            },
        };
        let request = queue.remove(idx)?;

        if reversed {
            self.direction = match direction {
                SweepDirection::Ascending => SweepDirection::Descending,
                SweepDirection::Descending => SweepDirection::Ascending,
            };
            self.stats.direction_reversals += 1;
            debug!(
                "Sweep reversed at track {}: now {:?}",
                current_track, self.direction
            );
        }
        self.stats.selected += 1;
        Some(request)
    }

    fn len(&self) -> usize {
        self.pair.len()
    }

    fn capacity(&self) -> usize {
        self.pair.capacity()
    }

    fn stats(&self) -> &PolicyStats {
        &self.stats
    }
}
