//! Error types for kmer-roadmap.
//!
//! This module provides exhaustive, strongly-typed errors for all operations
//! in the library, enabling precise error handling and informative messages.
//!
//! Per-window problems (an invalid base inside a k-mer window) are recovered
//! locally by the scanner and never surface past it; the typed
//! [`InvalidBaseError`] exists for the codec's public `encode` entry point.
//! Structural failures (write errors, count mismatches) abort a run: the
//! roadmap format has no resynchronization points, so a partially written
//! file is corrupt by contract.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in kmer-roadmap operations.
#[derive(Debug, Error)]
pub enum RoadmapError {
    /// Hash length is outside the valid range (odd, 1-31).
    #[error(transparent)]
    InvalidHashLength(#[from] HashLengthError),

    /// Encountered an invalid DNA base.
    #[error(transparent)]
    InvalidBase(#[from] InvalidBaseError),

    /// Failed to write roadmap output.
    #[error("failed to write roadmap output: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a roadmap file.
    #[error("failed to write roadmap file '{path}': {source}")]
    RoadmapWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read a roadmap file.
    #[error("failed to read roadmap file '{path}': {source}")]
    RoadmapRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read roadmap input.
    #[error("failed to read roadmap input: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// Invalid or corrupted roadmap data.
    #[error("invalid roadmap data at line {line}: {details}")]
    Parse { details: String, line: usize },

    /// The number of emitted roadmaps does not match the declared count.
    #[error("roadmap count mismatch: header declares {declared}, found {found}")]
    SequenceCountMismatch { declared: u64, found: u64 },
}

impl From<std::io::Error> for RoadmapError {
    fn from(source: std::io::Error) -> Self {
        RoadmapError::Write { source }
    }
}

/// Error for an invalid hash length.
///
/// Hash lengths must be odd and between 1 and 31. Use
/// [`HashLength::normalize`](crate::kmer::HashLength::normalize) for the
/// caller-side clamping rule that coerces arbitrary integers into range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("hash length {k} is out of range: must be an odd integer between {min} and {max}")]
pub struct HashLengthError {
    /// The invalid k value that was provided.
    pub k: usize,
    /// Minimum valid hash length.
    pub min: u8,
    /// Maximum valid hash length.
    pub max: u8,
}

/// Error for an invalid DNA base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBaseError {
    /// The invalid byte value.
    pub base: u8,
    /// Position of the invalid byte in the window.
    pub position: usize,
}

impl std::fmt::Display for InvalidBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.base.is_ascii_graphic() || self.base == b' ' {
            write!(
                f,
                "invalid base '{}' (0x{:02x}) at position {}",
                self.base as char, self.base, self.position
            )
        } else {
            write!(
                f,
                "invalid base 0x{:02x} at position {}",
                self.base, self.position
            )
        }
    }
}

impl std::error::Error for InvalidBaseError {}
