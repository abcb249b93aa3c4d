//! K-mer indexing and overlap-roadmap encoding for genome assembly.
//!
//! This crate is the indexing stage of an assembly pipeline. Given an
//! ordered collection of DNA reads, it records the first occurrence of every
//! canonical k-mer across all reads, and encodes each read as a *roadmap*:
//! an ordered run of segments that are either *novel* (the read's k-mers
//! were first sightings) or *annotations* (the k-mers overlap a previously
//! indexed read, referencing it by identifier, offset, and strand). The
//! roadmap file feeds the downstream graph-construction stage.
//!
//! K-mers are canonicalized against their reverse complements, so overlaps
//! are found regardless of the strand a read was sequenced from. Reads are
//! consumed and roadmaps emitted in strict input order; the output is
//! byte-for-byte reproducible for a fixed input.
//!
//! File ingestion and command-line handling live with the caller: the crate
//! consumes an already-assembled [`ReadSet`] and an output sink.
//!
//! # Example
//!
//! ```rust
//! use kmer_roadmap::{build_roadmaps, HashLength, ReadSet};
//!
//! let mut reads = ReadSet::new();
//! reads.push("GATTACAGATTACA");
//! reads.push("TGTAATCTGTAATC");
//!
//! let mut out = Vec::new();
//! let stats = build_roadmaps(&reads, HashLength::new(7)?, &mut out)?;
//! assert_eq!(stats.reads, 2);
//! # Ok::<(), kmer_roadmap::RoadmapError>(())
//! ```

pub mod encoder;
pub mod error;
pub mod index;
pub mod kmer;
pub mod reads;
pub mod roadmap;
pub mod run;
pub mod scanner;
pub mod writer;

pub use encoder::RoadmapEncoder;
pub use error::RoadmapError;
pub use index::{KmerIndex, Occurrence};
pub use kmer::{HashLength, Strand};
pub use reads::{Read, ReadId, ReadSet};
pub use roadmap::{Roadmap, Segment};
pub use run::{build_roadmaps, build_roadmaps_to_path, BuildStats};
pub use writer::{
    read_roadmaps, read_roadmaps_from_path, write_roadmaps_to_path, RoadmapFile, RoadmapWriter,
};
