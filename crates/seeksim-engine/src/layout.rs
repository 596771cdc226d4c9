//! File layouts and the drive's sector occupancy map.

use std::fmt::Write as _;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Sectors shown per row when rendering a track.
const SECTORS_PER_ROW: usize = 10;

/// Size class of a workload's file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// 1 to 10 blocks.
    Small,
    /// 11 to 150 blocks.
    Medium,
    /// 151 to 500 blocks.
    Large,
}

impl FileKind {
    /// All size classes, in draw order.
    pub const ALL: [FileKind; 3] = [FileKind::Small, FileKind::Medium, FileKind::Large];

    /// Inclusive range of block counts for this class.
    pub fn size_range(&self) -> RangeInclusive<usize> {
        match self {
            FileKind::Small => 1..=10,
            FileKind::Medium => 11..=150,
            FileKind::Large => 151..=500,
        }
    }
}

/// A file laid out on the drive as an ordered list of sectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    /// Size class the file was drawn from.
    pub kind: FileKind,
    /// Sector index of every block, in file order.
    pub blocks: Vec<u64>,
}

impl FileLayout {
    /// Creates a layout from its blocks.
    pub fn new(kind: FileKind, blocks: Vec<u64>) -> Self {
        Self { kind, blocks }
    }

    /// Number of blocks in the file.
    #[inline]
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the file has no blocks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Occupancy of every sector on the drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorMap {
    track_count: u32,
    sectors_per_track: u32,
    occupied: Vec<bool>,
}

impl SectorMap {
    /// Creates an empty map for the given geometry.
    pub fn new(track_count: u32, sectors_per_track: u32) -> Self {
        let total = track_count as usize * sectors_per_track as usize;
        Self {
            track_count,
            sectors_per_track,
            occupied: vec![false; total],
        }
    }

    /// Total sectors on the drive.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.occupied.len() as u64
    }

    /// Number of tracks.
    #[inline]
    pub fn track_count(&self) -> u32 {
        self.track_count
    }

    /// Marks a sector as holding file data.
    pub fn mark(&mut self, sector: u64) -> SimResult<()> {
        let capacity = self.capacity();
        match self.occupied.get_mut(sector as usize) {
            Some(slot) => {
                *slot = true;
                Ok(())
            }
            None => Err(SimError::LayoutOverflow { sector, capacity }),
        }
    }

    /// Returns true if the sector holds file data. Out-of-range sectors are free.
    pub fn is_occupied(&self, sector: u64) -> bool {
        self.occupied.get(sector as usize).copied().unwrap_or(false)
    }

    /// Number of occupied sectors on the whole drive.
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|s| **s).count()
    }

    /// Occupancy of one track.
    pub fn track(&self, track: u32) -> &[bool] {
        let spt = self.sectors_per_track as usize;
        let start = (track as usize * spt).min(self.occupied.len());
        let end = (start + spt).min(self.occupied.len());
        &self.occupied[start..end]
    }

    /// Number of tracks holding at least one occupied sector.
    pub fn used_tracks(&self) -> u32 {
        (0..self.track_count)
            .filter(|t| self.track(*t).iter().any(|s| *s))
            .count() as u32
    }

    /// Renders the first `limit` tracks, `#` for occupied sectors and `.` for free ones.
    pub fn render_tracks(&self, limit: u32) -> String {
        let mut out = String::new();
        let spt_width = self.sectors_per_track.to_string().len();
        for track in 0..limit.min(self.track_count) {
            let sectors = self.track(track);
            let used = sectors.iter().filter(|s| **s).count();
            let _ = writeln!(out, "track {:>4}  {:>3}/{} used", track, used, sectors.len());
            for (row, chunk) in sectors.chunks(SECTORS_PER_ROW).enumerate() {
                let cells: String = chunk.iter().map(|s| if *s { '#' } else { '.' }).collect();
                let _ = writeln!(
                    out,
                    "  {:>width$} |{}|",
                    row * SECTORS_PER_ROW,
                    cells,
                    width = spt_width
                );
            }
        }
        out
    }
}
