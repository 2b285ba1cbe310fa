use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{BuildError, ReconstructError};
use crate::table::IndexTable;

/// Exact table backed by a generic hash map, the compatibility baseline.
///
/// Construction is `O(n)` and a lookup amortized `O(1)`. Like
/// [`BinarySearchTable`](crate::table::BinarySearchTable) it is exact and can
/// reconstruct the original sequence, at the cost of storing every key.
///
/// The keys of one table should be pairwise distinct. [`new`](Self::new)
/// accepts duplicates and keeps the last-seen position for each;
/// [`try_new`](Self::try_new) rejects them instead.
pub struct HashMapTable<K> {
    keys: HashMap<K, u32>,
    /// Length of the original sequence; exceeds `keys.len()` under
    /// contract-violating duplicate input.
    len: usize,
}

impl<K: Hash + Eq + Clone> HashMapTable<K> {
    /// Builds the table over a copy of `mapping`; later changes to `mapping`
    /// do not affect the table.
    pub fn new(mapping: &[K]) -> Self {
        assert!(mapping.len() <= u32::MAX as usize, "at most 2^32-1 keys are supported");
        let mut keys = HashMap::with_capacity(mapping.len());
        for (i, key) in mapping.iter().enumerate() {
            keys.insert(key.clone(), i as u32);
        }
        Self { keys, len: mapping.len() }
    }

    /// Builds the table, failing fast with [`BuildError::DuplicateKey`]
    /// if `mapping` holds two equal keys.
    pub fn try_new(mapping: &[K]) -> Result<Self, BuildError> {
        assert!(mapping.len() <= u32::MAX as usize, "at most 2^32-1 keys are supported");
        let mut keys = HashMap::with_capacity(mapping.len());
        for (i, key) in mapping.iter().enumerate() {
            if let Some(first) = keys.insert(key.clone(), i as u32) {
                return Err(BuildError::DuplicateKey { first: first as usize, second: i });
            }
        }
        Ok(Self { keys, len: mapping.len() })
    }

    /// Returns the position of `key` in the original sequence,
    /// or [`None`] if the table holds no such key.
    #[inline]
    pub fn get(&self, key: &K) -> Option<usize> {
        self.keys.get(key).map(|&i| i as usize)
    }

    /// Returns the length of the original key sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K: Hash + Eq + Clone> IndexTable<K> for HashMapTable<K> {
    #[inline]
    fn get(&self, key: &K) -> Option<usize> {
        HashMapTable::get(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn try_keys(&self) -> Result<Box<[K]>, ReconstructError>
    where
        K: Clone,
    {
        let mut pairs: Vec<(u32, &K)> = self.keys.iter().map(|(key, &i)| (i, key)).collect();
        pairs.sort_unstable_by_key(|&(i, _)| i);
        let complete = pairs.len() == self.len
            && pairs.iter().enumerate().all(|(expected, &(i, _))| expected == i as usize);
        if !complete {
            return Err(ReconstructError);
        }
        Ok(pairs.into_iter().map(|(_, key)| key.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> Vec<String> {
        ["the", "cat", "sat", "on", "mat"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn maps_every_key_to_its_position() {
        let keys = keys();
        let table = HashMapTable::new(&keys);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
        assert_eq!(table.get(&"dog".to_string()), None);
        assert_eq!(table.len(), keys.len());
    }

    #[test]
    fn reconstructs_the_original_sequence() {
        let keys = keys();
        let table = HashMapTable::new(&keys);
        assert_eq!(&*table.try_keys().unwrap(), &keys[..]);
    }

    #[test]
    fn duplicates_keep_the_last_position() {
        let table = HashMapTable::new(&["cat", "dog", "cat"]);
        assert_eq!(table.get(&"cat"), Some(2));
        assert_eq!(table.len(), 3);
        // the mapping lost position 0, so the sequence cannot come back
        assert_eq!(table.try_keys().err(), Some(ReconstructError));
    }

    #[test]
    fn duplicates_are_rejected_by_try_new() {
        assert_eq!(
            HashMapTable::try_new(&["cat", "dog", "cat"]).err(),
            Some(BuildError::DuplicateKey { first: 0, second: 2 })
        );
        assert!(HashMapTable::try_new(&["cat", "dog"]).is_ok());
    }

    #[test]
    fn empty_table_finds_nothing() {
        let table = HashMapTable::<String>::new(&[]);
        assert_eq!(table.get(&"the".to_string()), None);
        assert!(table.is_empty());
        assert_eq!(table.try_keys().unwrap().len(), 0);
    }
}
