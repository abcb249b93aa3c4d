//! The roadmap data model: per-read overlap descriptions.
//!
//! A roadmap describes one read's k-mer stream as an ordered run of segments.
//! A *novel* segment covers consecutive windows whose k-mers were all first
//! sightings; an *annotation* segment covers consecutive windows that hit the
//! index, referencing the read where the overlapping k-mers were first seen.
//! Segments are contiguous and non-overlapping in window order, and a roadmap
//! is immutable once built.

use serde::{Deserialize, Serialize};

use crate::{
    kmer::{HashLength, Strand},
    reads::ReadId,
};

/// A contiguous run of k-mer windows within a roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// A run of first-sighting windows; nothing to reference.
    Novel {
        /// Number of windows in the run.
        length: u32,
    },
    /// A run of windows overlapping a previously indexed read.
    Annotation {
        /// Identifier of the referenced read.
        read: ReadId,
        /// Offset within the referenced read where the overlap begins.
        offset: u32,
        /// Orientation of the overlap relative to the referenced read.
        strand: Strand,
        /// Number of windows in the run.
        length: u32,
    },
}

impl Segment {
    /// Number of k-mer windows covered by this segment.
    #[must_use]
    pub fn length(&self) -> u32 {
        match *self {
            Self::Novel { length } | Self::Annotation { length, .. } => length,
        }
    }

    /// Returns true for a novel run.
    #[must_use]
    pub fn is_novel(&self) -> bool {
        matches!(self, Self::Novel { .. })
    }
}

/// One read's roadmap: identifier, length, and its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    /// Identifier of the read this roadmap describes.
    pub read_id: ReadId,
    /// Length of the read in bases.
    pub read_length: u32,
    /// Segments in window order.
    pub segments: Vec<Segment>,
}

impl Roadmap {
    /// Number of k-mer windows the read spans: `read_length - k + 1`,
    /// or 0 for reads shorter than the hash length.
    #[must_use]
    pub fn kmer_span(&self, hash_length: HashLength) -> u32 {
        (self.read_length as u64 + 1).saturating_sub(hash_length.get() as u64) as u32
    }

    /// Total number of windows covered by the segments.
    ///
    /// Equals [`kmer_span`](Self::kmer_span) for reads without invalid bases;
    /// windows skipped over invalid bases are covered by no segment.
    #[must_use]
    pub fn covered_length(&self) -> u32 {
        self.segments.iter().map(Segment::length).sum()
    }
}
