use crate::error::{BuildError, ReconstructError};
use crate::table::IndexTable;

/// Exact table keeping the keys in a sorted array.
///
/// Lookup is a binary search, so construction costs `O(n log n)` comparisons
/// and a lookup `O(log n)`. The table stores every key, which makes it exact
/// (no false positives) and able to reconstruct the original sequence.
///
/// The keys of one table should be pairwise distinct. [`new`](Self::new)
/// accepts duplicates and resolves each to a last-write-wins mapping;
/// [`try_new`](Self::try_new) rejects them instead.
pub struct BinarySearchTable<K> {
    /// The keys, sorted.
    keys: Box<[K]>,
    /// Original position of the key stored at the same index of `keys`.
    indices: Box<[u32]>,
}

impl<K: Ord + Clone> BinarySearchTable<K> {
    /// Builds the table over a copy of `mapping`; later changes to `mapping`
    /// do not affect the table.
    pub fn new(mapping: &[K]) -> Self {
        assert!(mapping.len() <= u32::MAX as usize, "at most 2^32-1 keys are supported");
        let mut keys: Box<[K]> = mapping.to_vec().into_boxed_slice();
        keys.sort();
        let mut indices = vec![0u32; mapping.len()].into_boxed_slice();
        for (i, key) in mapping.iter().enumerate() {
            if let Ok(pos) = keys.binary_search(key) {
                indices[pos] = i as u32;
            }
        }
        Self { keys, indices }
    }

    /// Builds the table, failing fast with [`BuildError::DuplicateKey`]
    /// if `mapping` holds two equal keys.
    pub fn try_new(mapping: &[K]) -> Result<Self, BuildError> {
        let result = Self::new(mapping);
        if let Some(pos) = result.keys.windows(2).position(|pair| pair[0] == pair[1]) {
            let duplicate = &result.keys[pos];
            let mut positions =
                mapping.iter().enumerate().filter(|&(_, key)| key == duplicate).map(|(i, _)| i);
            if let (Some(first), Some(second)) = (positions.next(), positions.next()) {
                return Err(BuildError::DuplicateKey { first, second });
            }
        }
        Ok(result)
    }

    /// Returns the position of `key` in the original sequence,
    /// or [`None`] if the table holds no such key.
    pub fn get(&self, key: &K) -> Option<usize> {
        self.keys.binary_search(key).ok().map(|pos| self.indices[pos] as usize)
    }

    /// Returns the length of the original key sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the original key sequence.
    pub fn original_keys(&self) -> Box<[K]> {
        let mut result = self.keys.to_vec();
        for (pos, key) in self.keys.iter().enumerate() {
            result[self.indices[pos] as usize] = key.clone();
        }
        result.into_boxed_slice()
    }
}

impl<K: Ord + Clone> IndexTable<K> for BinarySearchTable<K> {
    #[inline]
    fn get(&self, key: &K) -> Option<usize> {
        BinarySearchTable::get(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.keys.len()
    }

    fn try_keys(&self) -> Result<Box<[K]>, ReconstructError>
    where
        K: Clone,
    {
        Ok(self.original_keys())
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
        let table = BinarySearchTable::new(&keys);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
        assert_eq!(table.get(&"dog".to_string()), None);
        assert_eq!(table.len(), keys.len());
    }

    #[test]
    fn reconstructs_the_original_sequence() {
        let keys = keys();
        let table = BinarySearchTable::new(&keys);
        assert_eq!(&*table.original_keys(), &keys[..]);
    }

    #[test]
    fn single_key() {
        let table = BinarySearchTable::new(&["only"]);
        assert_eq!(table.get(&"only"), Some(0));
        assert_eq!(table.get(&"другой"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_table_finds_nothing() {
        let table = BinarySearchTable::<String>::new(&[]);
        assert_eq!(table.get(&"the".to_string()), None);
        assert!(table.is_empty());
    }

    #[test]
    fn duplicates_are_rejected_by_try_new() {
        let keys = ["cat", "dog", "cat", "cat"];
        assert_eq!(
            BinarySearchTable::try_new(&keys).err(),
            Some(BuildError::DuplicateKey { first: 0, second: 2 })
        );
        assert!(BinarySearchTable::try_new(&["cat", "dog"]).is_ok());
    }

    #[test]
    fn works_with_integer_keys() {
        let keys = [17u64, 3, 962, 41];
        let table = BinarySearchTable::new(&keys);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
        assert_eq!(table.get(&5), None);
    }
}
