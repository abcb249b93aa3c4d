//! Roadmap encoder: replays a read's k-mer stream against the index.
//!
//! For each window, in increasing offset order, the encoder resolves the
//! canonical key and performs one insert-or-fetch on the index. A miss marks
//! a first sighting and extends (or opens) a novel run; a hit closes any
//! novel run and extends the current annotation run when the hit continues
//! it, or opens a new annotation otherwise. An annotation continues when it
//! references the same read on the same relative strand and the stored
//! occurrence's offset equals the expected next coordinate, which advances by
//! one per window (forward) or recedes by one (reverse). Windows skipped over
//! invalid bases break contiguity and close whatever run is open.
//!
//! Because a read's own first sightings are inserted as it is scanned, a
//! repeated k-mer later in the same read annotates against the earlier
//! offset, exactly as a repeat across two reads would.

use crate::{
    index::{KmerIndex, Occurrence},
    kmer::Strand,
    reads::{Read, ReadId},
    roadmap::{Roadmap, Segment},
    scanner::{KmerScanner, KmerWindow},
};

/// The run currently being assembled, if any.
#[derive(Debug)]
enum RunState {
    Idle,
    Novel {
        length: u32,
    },
    Annotated {
        read: ReadId,
        strand: Strand,
        start: u32,
        next_coord: i64,
        length: u32,
    },
}

impl RunState {
    /// Closes the open run, pushing its segment, and returns to idle.
    fn close(&mut self, segments: &mut Vec<Segment>) {
        match std::mem::replace(self, Self::Idle) {
            Self::Idle => {}
            Self::Novel { length } => segments.push(Segment::Novel { length }),
            Self::Annotated {
                read,
                strand,
                start,
                length,
                ..
            } => segments.push(Segment::Annotation {
                read,
                offset: start,
                strand,
                length,
            }),
        }
    }
}

/// Encodes reads into roadmaps against a shared k-mer index.
///
/// The encoder queries and populates the index as it goes, so reads must be
/// encoded in input order for first-sighting semantics to be reproducible.
///
/// # Example
///
/// ```rust
/// use kmer_roadmap::encoder::RoadmapEncoder;
/// use kmer_roadmap::index::KmerIndex;
/// use kmer_roadmap::kmer::HashLength;
/// use kmer_roadmap::reads::ReadSet;
/// use kmer_roadmap::roadmap::Segment;
///
/// let mut reads = ReadSet::new();
/// reads.push("GATTACA");
/// reads.push("GATTACA");
///
/// let index = KmerIndex::new(HashLength::new(7)?);
/// let encoder = RoadmapEncoder::new(&index);
///
/// let first = encoder.encode(reads.get(1).unwrap());
/// let second = encoder.encode(reads.get(2).unwrap());
///
/// assert_eq!(first.segments, vec![Segment::Novel { length: 1 }]);
/// assert!(matches!(second.segments[0], Segment::Annotation { read: 1, .. }));
/// # Ok::<(), kmer_roadmap::error::HashLengthError>(())
/// ```
#[derive(Debug)]
pub struct RoadmapEncoder<'a> {
    index: &'a KmerIndex,
}

impl<'a> RoadmapEncoder<'a> {
    /// Creates an encoder over a shared index.
    #[must_use]
    pub fn new(index: &'a KmerIndex) -> Self {
        Self { index }
    }

    /// Encodes one read, scanning its windows lazily.
    #[must_use]
    pub fn encode(&self, read: &Read) -> Roadmap {
        let scanner = KmerScanner::new(read.seq(), self.index.hash_length());
        self.encode_windows(read.id(), read.len() as u32, scanner)
    }

    /// Encodes one read from a pre-scanned window stream.
    ///
    /// The windows must be exactly what [`KmerScanner`] yields for the read,
    /// in increasing offset order. This entry point lets a driver batch the
    /// codec work across reads while keeping index replay sequential.
    pub fn encode_windows(
        &self,
        read_id: ReadId,
        read_length: u32,
        windows: impl Iterator<Item = KmerWindow>,
    ) -> Roadmap {
        let mut segments = Vec::new();
        let mut state = RunState::Idle;
        let mut next_offset = 0u32;

        for window in windows {
            // A skipped window breaks contiguity for whatever run is open.
            if window.offset != next_offset {
                state.close(&mut segments);
            }
            next_offset = window.offset + 1;

            let (key, strand) = window.canonical();
            let candidate = Occurrence {
                read: read_id,
                offset: window.offset,
                strand,
            };

            match self.index.insert_if_absent(key, candidate) {
                None => {
                    state = match state {
                        RunState::Novel { length } => RunState::Novel { length: length + 1 },
                        mut other => {
                            other.close(&mut segments);
                            RunState::Novel { length: 1 }
                        }
                    };
                }
                Some(existing) => {
                    let relative = if strand == existing.strand {
                        Strand::Forward
                    } else {
                        Strand::Reverse
                    };
                    let step: i64 = match relative {
                        Strand::Forward => 1,
                        Strand::Reverse => -1,
                    };

                    state = match state {
                        RunState::Annotated {
                            read,
                            strand: run_strand,
                            start,
                            next_coord,
                            length,
                        } if read == existing.read
                            && run_strand == relative
                            && next_coord == existing.offset as i64 =>
                        {
                            RunState::Annotated {
                                read,
                                strand: run_strand,
                                start,
                                next_coord: next_coord + step,
                                length: length + 1,
                            }
                        }
                        mut other => {
                            other.close(&mut segments);
                            RunState::Annotated {
                                read: existing.read,
                                strand: relative,
                                start: existing.offset,
                                next_coord: existing.offset as i64 + step,
                                length: 1,
                            }
                        }
                    };
                }
            }
        }

        state.close(&mut segments);

        Roadmap {
            read_id,
            read_length,
            segments,
        }
    }
}
