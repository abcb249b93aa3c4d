//! Single-pass roadmap construction over an ordered read set.
//!
//! This is the top of the pipeline: one index, one writer, one pass. Reads
//! are consumed and their roadmaps emitted in strict input order, because a
//! roadmap may reference earlier reads by identifier and the index's
//! first-sighting semantics depend on insertion order.
//!
//! The codec work is still parallelized: reads are scanned into window
//! streams in fixed-size batches with `rayon` (pure computation, no shared
//! state), then each batch is replayed sequentially against the index. The
//! output is therefore byte-for-byte identical to a fully sequential pass.
//! There is no checkpointing; an interrupted run leaves a truncated file
//! that consumers must discard.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use rayon::prelude::*;

use crate::{
    encoder::RoadmapEncoder,
    error::RoadmapError,
    index::KmerIndex,
    kmer::HashLength,
    reads::{ReadId, ReadSet},
    scanner::{KmerScanner, KmerWindow},
    writer::RoadmapWriter,
};

#[cfg(feature = "tracing")]
use tracing::{debug, info, info_span};

/// Number of reads scanned together per parallel batch.
///
/// Large enough to amortize fork/join overhead for short reads, small enough
/// to bound the buffered window memory.
const SCAN_BATCH: usize = 1024;

/// Summary counters from one indexing run, for the caller's run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of reads consumed (and roadmaps emitted).
    pub reads: u64,
    /// Number of distinct canonical k-mers indexed.
    pub indexed_kmers: u64,
}

/// Indexes every read and writes all roadmaps to `sink`.
///
/// # Errors
///
/// Returns [`RoadmapError::Write`] if the output cannot be completed; the
/// partial output is then corrupt by contract.
///
/// # Example
///
/// ```rust
/// use kmer_roadmap::{build_roadmaps, HashLength, ReadSet};
///
/// let mut reads = ReadSet::new();
/// reads.push("GATTACA");
/// reads.push("GATTACA");
///
/// let mut out = Vec::new();
/// let stats = build_roadmaps(&reads, HashLength::new(7)?, &mut out)?;
/// assert_eq!(stats.reads, 2);
/// assert_eq!(stats.indexed_kmers, 1);
/// # Ok::<(), kmer_roadmap::RoadmapError>(())
/// ```
pub fn build_roadmaps<W: Write>(
    reads: &ReadSet,
    hash_length: HashLength,
    sink: W,
) -> Result<BuildStats, RoadmapError> {
    #[cfg(feature = "tracing")]
    let span = info_span!(
        "build_roadmaps",
        reads = reads.len(),
        hash_length = hash_length.get()
    );
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let index = KmerIndex::new(hash_length);
    let encoder = RoadmapEncoder::new(&index);
    let mut writer = RoadmapWriter::new(sink, reads.len() as u64, hash_length)?;

    for batch in reads.as_slice().chunks(SCAN_BATCH) {
        let scanned: Vec<(ReadId, u32, Vec<KmerWindow>)> = batch
            .par_iter()
            .map(|read| {
                let windows: Vec<KmerWindow> =
                    KmerScanner::new(read.seq(), hash_length).collect();
                (read.id(), read.len() as u32, windows)
            })
            .collect();

        for (read_id, read_length, windows) in scanned {
            let roadmap = encoder.encode_windows(read_id, read_length, windows.into_iter());
            writer.emit(&roadmap)?;
        }

        #[cfg(feature = "tracing")]
        debug!(
            emitted = writer.emitted(),
            indexed_kmers = index.len(),
            "batch replayed"
        );
    }

    writer.finalize()?;

    #[cfg(feature = "tracing")]
    info!(indexed_kmers = index.len(), "roadmap construction complete");

    Ok(BuildStats {
        reads: reads.len() as u64,
        indexed_kmers: index.len() as u64,
    })
}

/// Indexes every read and writes all roadmaps to the file at `path`.
///
/// # Errors
///
/// Returns [`RoadmapError::RoadmapWrite`] with the path on any I/O failure.
pub fn build_roadmaps_to_path<P: AsRef<Path>>(
    reads: &ReadSet,
    hash_length: HashLength,
    path: P,
) -> Result<BuildStats, RoadmapError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| RoadmapError::RoadmapWrite {
        source,
        path: path.to_path_buf(),
    })?;
    build_roadmaps(reads, hash_length, BufWriter::new(file)).map_err(|err| match err {
        RoadmapError::Write { source } => RoadmapError::RoadmapWrite {
            source,
            path: path.to_path_buf(),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_set(sequences: &[&'static str]) -> ReadSet {
        let mut reads = ReadSet::new();
        for seq in sequences {
            reads.push(*seq);
        }
        reads
    }

    #[test]
    fn stats_count_reads_and_distinct_kmers() {
        let reads = read_set(&["GATTACA", "GATTACA"]);
        let mut out = Vec::new();
        let stats = build_roadmaps(&reads, HashLength::new(3).unwrap(), &mut out).unwrap();
        // GATTACA's five 3-mer windows have five distinct canonical keys.
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.indexed_kmers, 5);
    }

    #[test]
    fn empty_read_set_emits_header_only() {
        let reads = ReadSet::new();
        let mut out = Vec::new();
        let stats = build_roadmaps(&reads, HashLength::new(21).unwrap(), &mut out).unwrap();
        assert_eq!(stats.reads, 0);
        assert_eq!(stats.indexed_kmers, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "0\t21\n");
    }

    #[test]
    fn output_is_deterministic_across_runs() {
        let reads = read_set(&["ACGTACGTAA", "TTACGTACGT", "GGGACGTACG", "ACGTACGTAA"]);
        let k = HashLength::new(5).unwrap();

        let mut first = Vec::new();
        build_roadmaps(&reads, k, &mut first).unwrap();
        let mut second = Vec::new();
        build_roadmaps(&reads, k, &mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn batched_scan_matches_lazy_encoding() {
        use crate::writer::read_roadmaps;

        let reads = read_set(&["GATTACAT", "TGTAATCA", "GANTTACA", "CC"]);
        let k = HashLength::new(3).unwrap();

        let mut out = Vec::new();
        build_roadmaps(&reads, k, &mut out).unwrap();
        let parsed = read_roadmaps(out.as_slice()).unwrap();

        let index = KmerIndex::new(k);
        let encoder = RoadmapEncoder::new(&index);
        let expected: Vec<_> = reads.iter().map(|read| encoder.encode(read)).collect();

        assert_eq!(parsed.roadmaps, expected);
    }
}
