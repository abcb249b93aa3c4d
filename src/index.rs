//! The k-mer index: canonical key to first-occurrence records.
//!
//! The index maps every canonical k-mer key ever seen to the single earliest
//! occurrence of that k-mer across all reads. Entries are created, never
//! updated or deleted, for the lifetime of one indexing run; the only
//! mutating operation is insert-or-fetch.
//!
//! The map is a sharded concurrent hash table keyed by the packed canonical
//! key, so the first-sighting decision is made under one shard lock per key
//! (no cross-key contention, no ABA or update hazards). Occurrence records
//! are small `Copy` values stored inline in the shard tables, keeping
//! per-entry overhead bounded as entry count scales with total input bases.
//! Allocation failure while the index grows aborts the process: no partial
//! index is usable and the run cannot be resumed.

use std::hash::BuildHasherDefault;

use dashmap::{mapref::entry::Entry, DashMap};
use rustc_hash::FxHasher;

use crate::{
    kmer::{HashLength, Strand},
    reads::ReadId,
};

/// A custom `DashMap` w/ `FxHasher`.
type DashFx = DashMap<u64, Occurrence, BuildHasherDefault<FxHasher>>;

/// The location where a canonical k-mer was first observed.
///
/// Created once per distinct canonical key and never mutated afterwards.
/// `strand` records the orientation in which that first window matched the
/// canonical form, so later hits can derive their orientation relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Identifier of the read that first contained the k-mer.
    pub read: ReadId,
    /// 0-based offset of the window within that read.
    pub offset: u32,
    /// Orientation of that window relative to the canonical key.
    pub strand: Strand,
}

/// A concurrent map from canonical k-mer keys to first-occurrence records.
///
/// # Example
///
/// ```rust
/// use kmer_roadmap::index::{KmerIndex, Occurrence};
/// use kmer_roadmap::kmer::{HashLength, Strand};
///
/// let index = KmerIndex::new(HashLength::new(21)?);
/// let occurrence = Occurrence { read: 1, offset: 0, strand: Strand::Forward };
///
/// assert_eq!(index.insert_if_absent(42, occurrence), None);
/// // A second insertion leaves the stored record untouched.
/// let later = Occurrence { read: 7, offset: 3, strand: Strand::Reverse };
/// assert_eq!(index.insert_if_absent(42, later), Some(occurrence));
/// # Ok::<(), kmer_roadmap::error::HashLengthError>(())
/// ```
#[derive(Debug)]
pub struct KmerIndex {
    hash_length: HashLength,
    map: DashFx,
}

impl KmerIndex {
    /// Creates an empty index for k-mers of the given length.
    ///
    /// The hash length is fixed for the lifetime of the index.
    #[must_use]
    pub fn new(hash_length: HashLength) -> Self {
        Self {
            hash_length,
            map: DashMap::with_hasher(BuildHasherDefault::<FxHasher>::default()),
        }
    }

    /// Stores `occurrence` for `key` unless the key is already present.
    ///
    /// Returns `None` on a first sighting (the occurrence was stored) and
    /// `Some(existing)` on a hit, leaving the stored record untouched. The
    /// decision is atomic per key, so concurrent callers resolve each key
    /// exactly once.
    pub fn insert_if_absent(&self, key: u64, occurrence: Occurrence) -> Option<Occurrence> {
        match self.map.entry(key) {
            Entry::Occupied(existing) => Some(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(occurrence);
                None
            }
        }
    }

    /// Looks up the stored occurrence for a key without inserting.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<Occurrence> {
        self.map.get(&key).map(|entry| *entry.value())
    }

    /// Returns the k-mer length this index was built with.
    #[must_use]
    pub fn hash_length(&self) -> HashLength {
        self.hash_length
    }

    /// Returns the number of distinct canonical k-mers indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no k-mers have been indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(read: ReadId, offset: u32, strand: Strand) -> Occurrence {
        Occurrence {
            read,
            offset,
            strand,
        }
    }

    #[test]
    fn first_sighting_returns_none_and_stores() {
        let index = KmerIndex::new(HashLength::new(5).unwrap());
        assert_eq!(index.insert_if_absent(7, occ(1, 0, Strand::Forward)), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(7), Some(occ(1, 0, Strand::Forward)));
    }

    #[test]
    fn later_sightings_never_replace_the_record() {
        let index = KmerIndex::new(HashLength::new(5).unwrap());
        let first = occ(1, 4, Strand::Reverse);
        assert_eq!(index.insert_if_absent(99, first), None);

        for later in [occ(2, 0, Strand::Forward), occ(3, 17, Strand::Reverse)] {
            assert_eq!(index.insert_if_absent(99, later), Some(first));
        }
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(99), Some(first));
    }

    #[test]
    fn distinct_keys_get_distinct_entries() {
        let index = KmerIndex::new(HashLength::new(3).unwrap());
        for key in 0..64u64 {
            assert_eq!(
                index.insert_if_absent(key, occ(1, key as u32, Strand::Forward)),
                None
            );
        }
        assert_eq!(index.len(), 64);
    }

    #[test]
    fn concurrent_insertion_decides_each_key_once() {
        use std::sync::Arc;

        let index = Arc::new(KmerIndex::new(HashLength::new(5).unwrap()));
        let mut handles = Vec::new();
        for worker in 0..4u32 {
            let index = Arc::clone(&index);
            handles.push(std::thread::spawn(move || {
                let mut wins = 0usize;
                for key in 0..1000u64 {
                    if index
                        .insert_if_absent(key, occ(worker + 1, key as u32, Strand::Forward))
                        .is_none()
                    {
                        wins += 1;
                    }
                }
                wins
            }));
        }
        let total_wins: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // Every key is won by exactly one worker.
        assert_eq!(total_wins, 1000);
        assert_eq!(index.len(), 1000);
    }
}
