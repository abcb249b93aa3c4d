//! Roadmap serialization and deserialization.
//!
//! This module persists roadmaps in the order-preserving layout consumed by
//! the downstream graph-construction stage, and reads them back for
//! diagnostics and round-trip verification.
//!
//! # Text Format (Version 1)
//!
//! The roadmap file is line-oriented ASCII with tab-separated decimal fields:
//!
//! ```text
//! <sequence_count> TAB <hash_length> NL                      header, once
//! ROADMAP TAB <read_id> TAB <read_length> NL                 one per read
//! N TAB <length> NL                                          novel segment
//! A TAB <read_id> TAB <offset> TAB <strand> TAB <length> NL  annotation
//! ```
//!
//! Reads appear in input order and each read's segments in window order;
//! `<strand>` is `+` or `-`. The layout is a compatibility contract: field
//! order, separators, and record ordering are fixed, and a file whose
//! declared sequence count does not match its records is corrupt. There are
//! no resynchronization points, so consumers must treat a truncated file as
//! unusable rather than recover partial output.
//!
//! # Example
//!
//! ```rust
//! use kmer_roadmap::kmer::HashLength;
//! use kmer_roadmap::roadmap::{Roadmap, Segment};
//! use kmer_roadmap::writer::{read_roadmaps, RoadmapWriter};
//!
//! let roadmap = Roadmap {
//!     read_id: 1,
//!     read_length: 7,
//!     segments: vec![Segment::Novel { length: 5 }],
//! };
//!
//! let mut out = Vec::new();
//! let mut writer = RoadmapWriter::new(&mut out, 1, HashLength::new(3)?)?;
//! writer.emit(&roadmap)?;
//! writer.finalize()?;
//!
//! let parsed = read_roadmaps(out.as_slice())?;
//! assert_eq!(parsed.roadmaps, vec![roadmap]);
//! # Ok::<(), kmer_roadmap::error::RoadmapError>(())
//! ```

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::{
    error::RoadmapError,
    kmer::{HashLength, Strand},
    roadmap::{Roadmap, Segment},
};

/// Record tag opening each per-read block.
const ROADMAP_TAG: &str = "ROADMAP";

/// Serializes roadmaps to a sink in read-input order.
///
/// The header is written on construction; [`emit`](Self::emit) appends one
/// record per read; [`finalize`](Self::finalize) verifies that the emitted
/// count matches the declared count and flushes. Dropping the writer without
/// finalizing leaves the output unusable by contract.
#[derive(Debug)]
pub struct RoadmapWriter<W: Write> {
    sink: W,
    declared: u64,
    emitted: u64,
}

impl<W: Write> RoadmapWriter<W> {
    /// Creates a writer and emits the header line.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::Write`] if the header cannot be written.
    pub fn new(
        mut sink: W,
        sequence_count: u64,
        hash_length: HashLength,
    ) -> Result<Self, RoadmapError> {
        writeln!(sink, "{sequence_count}\t{}", hash_length.get())?;
        Ok(Self {
            sink,
            declared: sequence_count,
            emitted: 0,
        })
    }

    /// Appends one read's roadmap.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::Write`] on any I/O failure; the output must
    /// then be discarded.
    pub fn emit(&mut self, roadmap: &Roadmap) -> Result<(), RoadmapError> {
        writeln!(
            self.sink,
            "{ROADMAP_TAG}\t{}\t{}",
            roadmap.read_id, roadmap.read_length
        )?;
        for segment in &roadmap.segments {
            match *segment {
                Segment::Novel { length } => writeln!(self.sink, "N\t{length}")?,
                Segment::Annotation {
                    read,
                    offset,
                    strand,
                    length,
                } => writeln!(
                    self.sink,
                    "A\t{read}\t{offset}\t{}\t{length}",
                    strand.symbol()
                )?,
            }
        }
        self.emitted += 1;
        Ok(())
    }

    /// Number of roadmaps emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Verifies the emitted count against the header and flushes the sink.
    ///
    /// # Errors
    ///
    /// Returns [`RoadmapError::SequenceCountMismatch`] if the number of
    /// emitted roadmaps differs from the declared sequence count, or
    /// [`RoadmapError::Write`] if flushing fails.
    pub fn finalize(mut self) -> Result<(), RoadmapError> {
        if self.emitted != self.declared {
            return Err(RoadmapError::SequenceCountMismatch {
                declared: self.declared,
                found: self.emitted,
            });
        }
        self.sink.flush()?;
        Ok(())
    }
}

/// A parsed roadmap file: header values plus all records in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapFile {
    /// Declared number of reads.
    pub sequence_count: u64,
    /// Hash length the index was built with.
    pub hash_length: HashLength,
    /// Roadmaps in read-input order.
    pub roadmaps: Vec<Roadmap>,
}

/// Parses a roadmap file from a reader.
///
/// The parser is strict: unknown record tags, wrong field counts, malformed
/// numbers, and a record count that disagrees with the header are all
/// rejected, since downstream consumers have no way to resynchronize.
///
/// # Errors
///
/// Returns [`RoadmapError::Parse`] naming the offending line,
/// [`RoadmapError::SequenceCountMismatch`], or [`RoadmapError::Read`] for
/// I/O failures.
pub fn read_roadmaps<R: BufRead>(reader: R) -> Result<RoadmapFile, RoadmapError> {
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    let header = match lines.next() {
        Some(line) => {
            line_no += 1;
            line.map_err(|source| RoadmapError::Read { source })?
        }
        None => {
            return Err(parse_error(0, "missing header line"));
        }
    };

    let mut fields = header.split('\t');
    let sequence_count: u64 = parse_field(&mut fields, line_no, "sequence count")?;
    let k: usize = parse_field(&mut fields, line_no, "hash length")?;
    expect_end(&mut fields, line_no)?;
    let hash_length = HashLength::new(k)
        .map_err(|err| parse_error(line_no, format!("bad hash length: {err}")))?;

    let mut roadmaps: Vec<Roadmap> = Vec::new();
    let mut current: Option<Roadmap> = None;

    for line in lines {
        line_no += 1;
        let line = line.map_err(|source| RoadmapError::Read { source })?;
        let mut fields = line.split('\t');

        match fields.next() {
            Some(ROADMAP_TAG) => {
                if let Some(done) = current.take() {
                    roadmaps.push(done);
                }
                let read_id = parse_field(&mut fields, line_no, "read id")?;
                let read_length = parse_field(&mut fields, line_no, "read length")?;
                expect_end(&mut fields, line_no)?;
                current = Some(Roadmap {
                    read_id,
                    read_length,
                    segments: Vec::new(),
                });
            }
            Some("N") => {
                let length = parse_field(&mut fields, line_no, "segment length")?;
                expect_end(&mut fields, line_no)?;
                segments_of(&mut current, line_no)?.push(Segment::Novel { length });
            }
            Some("A") => {
                let read = parse_field(&mut fields, line_no, "referenced read id")?;
                let offset = parse_field(&mut fields, line_no, "referenced offset")?;
                let strand = parse_strand(&mut fields, line_no)?;
                let length = parse_field(&mut fields, line_no, "segment length")?;
                expect_end(&mut fields, line_no)?;
                segments_of(&mut current, line_no)?.push(Segment::Annotation {
                    read,
                    offset,
                    strand,
                    length,
                });
            }
            Some(tag) => {
                return Err(parse_error(line_no, format!("unknown record tag '{tag}'")));
            }
            None => return Err(parse_error(line_no, "empty line")),
        }
    }

    if let Some(done) = current.take() {
        roadmaps.push(done);
    }

    if roadmaps.len() as u64 != sequence_count {
        return Err(RoadmapError::SequenceCountMismatch {
            declared: sequence_count,
            found: roadmaps.len() as u64,
        });
    }

    Ok(RoadmapFile {
        sequence_count,
        hash_length,
        roadmaps,
    })
}

/// Writes a complete set of roadmaps to a file.
///
/// The declared sequence count is taken from the slice length.
///
/// # Errors
///
/// Returns [`RoadmapError::RoadmapWrite`] with the path on any I/O failure.
pub fn write_roadmaps_to_path<P: AsRef<Path>>(
    path: P,
    hash_length: HashLength,
    roadmaps: &[Roadmap],
) -> Result<(), RoadmapError> {
    let path = path.as_ref();
    let with_path = |err: RoadmapError| match err {
        RoadmapError::Write { source } => RoadmapError::RoadmapWrite {
            source,
            path: path.to_path_buf(),
        },
        other => other,
    };

    let file = File::create(path).map_err(|source| RoadmapError::RoadmapWrite {
        source,
        path: path.to_path_buf(),
    })?;
    let mut writer = RoadmapWriter::new(BufWriter::new(file), roadmaps.len() as u64, hash_length)
        .map_err(with_path)?;
    for roadmap in roadmaps {
        writer.emit(roadmap).map_err(with_path)?;
    }
    writer.finalize().map_err(with_path)
}

/// Reads a roadmap file from disk.
///
/// # Errors
///
/// Returns [`RoadmapError::RoadmapRead`] with the path if the file cannot be
/// opened, or any error from [`read_roadmaps`].
pub fn read_roadmaps_from_path<P: AsRef<Path>>(path: P) -> Result<RoadmapFile, RoadmapError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| RoadmapError::RoadmapRead {
        source,
        path: path.to_path_buf(),
    })?;
    read_roadmaps(BufReader::new(file))
}

fn parse_error(line: usize, details: impl Into<String>) -> RoadmapError {
    RoadmapError::Parse {
        details: details.into(),
        line,
    }
}

fn parse_field<'a, T>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<T, RoadmapError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let field = fields
        .next()
        .ok_or_else(|| parse_error(line, format!("missing {what}")))?;
    field
        .parse()
        .map_err(|err| parse_error(line, format!("bad {what} '{field}': {err}")))
}

fn parse_strand<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Strand, RoadmapError> {
    let field = fields
        .next()
        .ok_or_else(|| parse_error(line, "missing strand"))?;
    let mut chars = field.chars();
    match (chars.next().and_then(Strand::from_symbol), chars.next()) {
        (Some(strand), None) => Ok(strand),
        _ => Err(parse_error(line, format!("bad strand '{field}'"))),
    }
}

fn expect_end<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<(), RoadmapError> {
    match fields.next() {
        None => Ok(()),
        Some(extra) => Err(parse_error(line, format!("unexpected field '{extra}'"))),
    }
}

fn segments_of(
    current: &mut Option<Roadmap>,
    line: usize,
) -> Result<&mut Vec<Segment>, RoadmapError> {
    current
        .as_mut()
        .map(|roadmap| &mut roadmap.segments)
        .ok_or_else(|| parse_error(line, "segment record before any ROADMAP record"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: usize) -> HashLength {
        HashLength::new(n).unwrap()
    }

    fn sample_roadmaps() -> Vec<Roadmap> {
        vec![
            Roadmap {
                read_id: 1,
                read_length: 7,
                segments: vec![Segment::Novel { length: 5 }],
            },
            Roadmap {
                read_id: 2,
                read_length: 7,
                segments: vec![Segment::Annotation {
                    read: 1,
                    offset: 4,
                    strand: Strand::Reverse,
                    length: 5,
                }],
            },
            Roadmap {
                read_id: 3,
                read_length: 2,
                segments: vec![],
            },
        ]
    }

    fn write_to_vec(roadmaps: &[Roadmap], hash_length: HashLength) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer =
            RoadmapWriter::new(&mut out, roadmaps.len() as u64, hash_length).unwrap();
        for roadmap in roadmaps {
            writer.emit(roadmap).unwrap();
        }
        writer.finalize().unwrap();
        out
    }

    #[test]
    fn emits_documented_layout() {
        let out = write_to_vec(&sample_roadmaps(), k(3));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "3\t3\n\
             ROADMAP\t1\t7\n\
             N\t5\n\
             ROADMAP\t2\t7\n\
             A\t1\t4\t-\t5\n\
             ROADMAP\t3\t2\n"
        );
    }

    #[test]
    fn roundtrip_reproduces_roadmaps() {
        let roadmaps = sample_roadmaps();
        let out = write_to_vec(&roadmaps, k(3));

        let parsed = read_roadmaps(out.as_slice()).unwrap();
        assert_eq!(parsed.sequence_count, 3);
        assert_eq!(parsed.hash_length, k(3));
        assert_eq!(parsed.roadmaps, roadmaps);
    }

    #[test]
    fn roundtrip_through_file() {
        let roadmaps = sample_roadmaps();
        let tmp = tempfile::NamedTempFile::new().unwrap();

        write_roadmaps_to_path(tmp.path(), k(3), &roadmaps).unwrap();
        let parsed = read_roadmaps_from_path(tmp.path()).unwrap();
        assert_eq!(parsed.roadmaps, roadmaps);
    }

    #[test]
    fn finalize_rejects_count_mismatch() {
        let mut out = Vec::new();
        let mut writer = RoadmapWriter::new(&mut out, 2, k(3)).unwrap();
        writer.emit(&sample_roadmaps()[0]).unwrap();
        let err = writer.finalize().unwrap_err();
        assert!(matches!(
            err,
            RoadmapError::SequenceCountMismatch {
                declared: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn reader_rejects_missing_header() {
        let err = read_roadmaps(&b""[..]).unwrap_err();
        assert!(matches!(err, RoadmapError::Parse { .. }));
    }

    #[test]
    fn reader_rejects_unknown_tag() {
        let err = read_roadmaps(&b"1\t3\nBOGUS\t1\n"[..]).unwrap_err();
        assert!(
            matches!(err, RoadmapError::Parse { line: 2, ref details } if details.contains("BOGUS"))
        );
    }

    #[test]
    fn reader_rejects_segment_before_roadmap() {
        let err = read_roadmaps(&b"1\t3\nN\t5\n"[..]).unwrap_err();
        assert!(matches!(err, RoadmapError::Parse { line: 2, .. }));
    }

    #[test]
    fn reader_rejects_bad_strand() {
        let err = read_roadmaps(&b"1\t3\nROADMAP\t1\t7\nA\t1\t0\t*\t5\n"[..]).unwrap_err();
        assert!(
            matches!(err, RoadmapError::Parse { line: 3, ref details } if details.contains("strand"))
        );
    }

    #[test]
    fn reader_rejects_extra_fields() {
        let err = read_roadmaps(&b"1\t3\nROADMAP\t1\t7\t9\n"[..]).unwrap_err();
        assert!(matches!(err, RoadmapError::Parse { line: 2, .. }));
    }

    #[test]
    fn reader_rejects_truncated_file() {
        // Header declares two reads; only one record follows.
        let err = read_roadmaps(&b"2\t3\nROADMAP\t1\t7\nN\t5\n"[..]).unwrap_err();
        assert!(matches!(
            err,
            RoadmapError::SequenceCountMismatch {
                declared: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn reader_rejects_even_hash_length() {
        let err = read_roadmaps(&b"0\t4\n"[..]).unwrap_err();
        assert!(matches!(err, RoadmapError::Parse { line: 1, .. }));
    }

    #[test]
    fn empty_set_roundtrips() {
        let out = write_to_vec(&[], k(21));
        let parsed = read_roadmaps(out.as_slice()).unwrap();
        assert_eq!(parsed.sequence_count, 0);
        assert!(parsed.roadmaps.is_empty());
    }
}
