use std::io;

use binout::{AsIs, Serializer, VByte};
use dyn_size_of::GetSize;

use crate::chd::{BuildConf, Function};
use crate::error::{BuildError, ReconstructError};
use crate::hash::RollHash;
use crate::stats::{BuildStats, BuildStatsCollector};
use crate::table::IndexTable;

/// Space-optimized table backed by a CHD perfect hash function.
///
/// Instead of the keys themselves, the table stores per slot of the hashed
/// table only the original position and a 31-bit fingerprint (the zero-seed
/// hash) of the key claiming the slot. A lookup recomputes the fingerprint
/// and accepts the stored position only on a match, so:
///
/// - a key of the built sequence is always found at its original position
///   (no false negatives);
/// - a key outside the sequence is reported absent unless its slot and
///   fingerprint both collide with a stored key, which happens with
///   probability about 2⁻³¹ per lookup (false positives are possible).
///
/// The original key sequence is not recoverable from slots and fingerprints,
/// so [`try_keys`](IndexTable::try_keys) always fails.
pub struct ChdTable {
    hash: Function,
    /// Original key position per slot; 0 in unclaimed slots.
    indices: Box<[u32]>,
    /// Zero-seed hash of the key claiming each slot; 0 in unclaimed slots.
    fingerprints: Box<[u32]>,
    len: usize,
    stats: BuildStats,
}

impl GetSize for ChdTable {
    fn size_bytes_dyn(&self) -> usize {
        self.hash.size_bytes_dyn() + self.indices.size_bytes_dyn() + self.fingerprints.size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.hash.size_bytes_content_dyn()
            + self.indices.size_bytes_content_dyn()
            + self.fingerprints.size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

impl ChdTable {
    /// Builds the table over `mapping`, using the build configuration `conf`
    /// and reporting construction statistics to `stats`.
    ///
    /// The keys must be pairwise distinct; duplicates cannot be placed and
    /// surface as [`BuildError::SeedLimitReached`]. Use
    /// [`check_distinct`](crate::table::check_distinct) to reject them fast.
    pub fn try_with_conf_stats<K, BS>(
        mapping: &[K],
        conf: &BuildConf,
        stats: &mut BS,
    ) -> Result<Self, BuildError>
    where
        K: RollHash,
        BS: BuildStatsCollector,
    {
        let (hash, build_stats) = Function::try_build(mapping, conf, stats)?;
        let mut indices = vec![0u32; hash.table_size()].into_boxed_slice();
        let mut fingerprints = vec![0u32; hash.table_size()].into_boxed_slice();
        for (i, key) in mapping.iter().enumerate() {
            let fingerprint = key.fingerprint();
            let slot = hash.slot_of(fingerprint, key);
            indices[slot] = i as u32;
            fingerprints[slot] = fingerprint;
        }
        Ok(Self { hash, indices, fingerprints, len: mapping.len(), stats: build_stats })
    }

    /// Builds the table over `mapping`, using the build configuration `conf`.
    #[inline]
    pub fn try_with_conf<K: RollHash>(mapping: &[K], conf: &BuildConf) -> Result<Self, BuildError> {
        Self::try_with_conf_stats(mapping, conf, &mut ())
    }

    /// Builds the table over `mapping`, using the default configuration.
    #[inline]
    pub fn try_new<K: RollHash>(mapping: &[K]) -> Result<Self, BuildError> {
        Self::try_with_conf_stats(mapping, &Default::default(), &mut ())
    }

    /// Returns the position of `key` in the original sequence, or [`None`]
    /// if no stored fingerprint confirms it.
    #[inline]
    pub fn get<K: RollHash + ?Sized>(&self, key: &K) -> Option<usize> {
        let fingerprint = key.fingerprint();
        let slot = self.hash.slot_of(fingerprint, key);
        (self.fingerprints[slot] == fingerprint).then(|| self.indices[slot] as usize)
    }

    /// Returns the position of every key of `queries`, in order.
    ///
    /// Two passes: slots are resolved and fingerprint-checked for all queries
    /// first, positions are fetched after, so each query key is hashed once.
    pub fn get_all<K: RollHash>(&self, queries: &[K]) -> Vec<Option<usize>> {
        let mut result: Vec<Option<usize>> = queries
            .iter()
            .map(|key| {
                let fingerprint = key.fingerprint();
                let slot = self.hash.slot_of(fingerprint, key);
                (self.fingerprints[slot] == fingerprint).then_some(slot)
            })
            .collect();
        for entry in result.iter_mut() {
            if let Some(slot) = *entry {
                *entry = Some(self.indices[slot] as usize);
            }
        }
        result
    }

    /// Returns the length of the original key sequence,
    /// which is lower than [`table_size`](Function::table_size) of the
    /// underlying function unless the ratio is 1.0.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the underlying perfect hash function.
    #[inline]
    pub fn hash_function(&self) -> &Function {
        &self.hash
    }

    /// Returns the statistics of the displacement search that built the
    /// table. Zeroed for tables obtained with [`read`](Self::read).
    #[inline]
    pub fn build_stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Returns number of bytes which [`write`](Self::write) will write.
    pub fn write_bytes(&self) -> usize {
        self.hash.write_bytes()
            + VByte::size(self.len)
            + AsIs::array_content_size(&self.indices)
            + AsIs::array_content_size(&self.fingerprints)
    }

    /// Writes `self` to the `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        self.hash.write(output)?;
        VByte::write(output, self.len)?;
        AsIs::write_all(output, self.indices.iter())?;
        AsIs::write_all(output, self.fingerprints.iter())
    }

    /// Reads `Self` from the `input`.
    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        let hash = Function::read(input)?;
        let len = VByte::read(input)?;
        let indices = AsIs::read_n(input, hash.table_size())?;
        let fingerprints = AsIs::read_n(input, hash.table_size())?;
        Ok(Self { hash, indices, fingerprints, len, stats: BuildStats::default() })
    }
}

impl<K: RollHash> IndexTable<K> for ChdTable {
    #[inline]
    fn get(&self, key: &K) -> Option<usize> {
        ChdTable::get(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get_all(&self, keys: &[K]) -> Vec<Option<usize>> {
        ChdTable::get_all(self, keys)
    }

    fn try_keys(&self) -> Result<Box<[K]>, ReconstructError>
    where
        K: Clone,
    {
        Err(ReconstructError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key-{}", i)).collect()
    }

    #[test]
    fn maps_every_key_to_its_position() {
        let keys = ["the", "cat", "sat", "on", "mat"];
        let table = ChdTable::try_with_conf(&keys, &BuildConf::ratio(1.3)).unwrap();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i), "wrong position of {:?}", key);
        }
        assert_eq!(table.len(), keys.len());
        if let Some(i) = table.get(&"dog") {
            eprintln!("fingerprint collision: \"dog\" reported at position {}", i);
        }
    }

    #[test]
    fn no_false_negatives_on_larger_input() {
        let keys = test_keys(5000);
        let table = ChdTable::try_new(&keys).unwrap();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
    }

    #[test]
    fn batch_lookup_matches_single_lookups() {
        let keys = test_keys(100);
        let table = ChdTable::try_new(&keys).unwrap();
        let mut queries = keys.clone();
        queries.push("absent-1".to_string());
        queries.push("absent-2".to_string());
        let batch = table.get_all(&queries);
        for (query, index) in queries.iter().zip(batch) {
            assert_eq!(index, table.get(query));
        }
    }

    #[test]
    fn reconstruction_fails_explicitly() {
        let keys = test_keys(10);
        let table = ChdTable::try_new(&keys).unwrap();
        assert_eq!(<ChdTable as IndexTable<String>>::try_keys(&table).err(), Some(ReconstructError));
    }

    #[test]
    fn deterministic_rebuild() {
        let keys = test_keys(1000);
        let a = ChdTable::try_new(&keys).unwrap();
        let b = ChdTable::try_new(&keys).unwrap();
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.fingerprints, b.fingerprints);
    }

    #[test]
    fn read_write() {
        let keys = test_keys(200);
        let table = ChdTable::try_new(&keys).unwrap();
        let mut buff = Vec::new();
        table.write(&mut buff).unwrap();
        assert_eq!(buff.len(), table.write_bytes());
        let read = ChdTable::read(&mut &buff[..]).unwrap();
        assert_eq!(read.len, table.len);
        assert_eq!(read.indices, table.indices);
        assert_eq!(read.fingerprints, table.fingerprints);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(read.get(key), Some(i));
        }
    }

    #[test]
    fn stats_are_retained() {
        let keys = test_keys(500);
        let table = ChdTable::try_new(&keys).unwrap();
        assert_eq!(table.build_stats().buckets, 500 / 5 + 31);
        assert!(table.build_stats().nonempty_buckets > 0);
    }

    #[test]
    fn size_is_proportional_to_the_hashed_table() {
        let keys = test_keys(1000);
        let table = ChdTable::try_new(&keys).unwrap();
        let table_size = table.hash_function().table_size();
        assert!(table.size_bytes_dyn() >= table_size * 2 * std::mem::size_of::<u32>());
    }
}
