//! Read-only tables mapping each key of a fixed set to its position in the
//! input sequence.

mod binary_search;
mod chd;
mod hash_map;

pub use binary_search::BinarySearchTable;
pub use chd::ChdTable;
pub use hash_map::HashMapTable;

use std::collections::HashMap;
use std::hash::Hash;

use crate::chd::BuildConf;
use crate::error::{BuildError, ReconstructError};
use crate::hash::RollHash;
use crate::stats::BuildStatsCollector;

/// A read-only map from the keys of a fixed sequence to their positions in it.
///
/// Built once from a key sequence, a table answers [`get`](IndexTable::get)
/// queries indefinitely and is never mutated afterwards; it can be shared
/// read-only between threads. A key outside the built sequence yields
/// [`None`], which is an ordinary result, not an error.
pub trait IndexTable<K> {
    /// Returns the position of `key` in the original sequence,
    /// or [`None`] if the table holds no such key.
    fn get(&self, key: &K) -> Option<usize>;

    /// Returns the length of the original key sequence,
    /// regardless of the size of the internal structures.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the position of every key of `keys`, in order.
    ///
    /// Equivalent to [`get`](IndexTable::get) applied to each key, which is
    /// also the default implementation; implementations override it only when
    /// they can do better.
    fn get_all(&self, keys: &[K]) -> Vec<Option<usize>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Reconstructs the original key sequence, the inverse of the mapping.
    ///
    /// Fails with [`ReconstructError`] when the table does not retain the
    /// keys (the perfect-hash variant), or when contract-violating duplicate
    /// keys left the stored mapping incomplete.
    fn try_keys(&self) -> Result<Box<[K]>, ReconstructError>
    where
        K: Clone;
}

/// Which implementation [`build`] constructs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TableKind {
    /// The exact hash-map variant: the compatibility baseline.
    #[default]
    HashMap,
    /// The space-optimized perfect-hash variant.
    Chd,
}

/// Construction configuration accepted by [`build`].
///
/// [`BinarySearchTable`] is deliberately absent from the choice;
/// callers wanting it construct it directly.
#[derive(Clone, Copy, Default)]
pub struct TableConf {
    pub kind: TableKind,
    /// Parameters of the perfect-hash construction; ignored by other kinds.
    pub chd: BuildConf,
    /// If set, duplicate keys are rejected with [`BuildError::DuplicateKey`]
    /// instead of producing a last-write-wins mapping.
    pub validate: bool,
}

impl TableConf {
    /// Returns a configuration that builds a table of the given `kind`.
    pub fn kind(kind: TableKind) -> Self {
        Self { kind, ..Default::default() }
    }

    /// Returns a configuration that builds a table of the given `kind`
    /// and rejects duplicate keys.
    pub fn validated(kind: TableKind) -> Self {
        Self { kind, validate: true, ..Default::default() }
    }
}

/// Checks that the keys of `mapping` are pairwise distinct.
pub fn check_distinct<K: Hash + Eq>(mapping: &[K]) -> Result<(), BuildError> {
    let mut seen = HashMap::with_capacity(mapping.len());
    for (i, key) in mapping.iter().enumerate() {
        if let Some(first) = seen.insert(key, i) {
            return Err(BuildError::DuplicateKey { first, second: i });
        }
    }
    Ok(())
}

/// Builds the table selected by `conf` over the keys of `mapping`,
/// reporting perfect-hash construction statistics to `stats`.
///
/// Pure construction-time dispatch: the returned table carries no
/// per-lookup overhead beyond its own implementation.
pub fn build_with_stats<K, BS>(
    mapping: &[K],
    conf: &TableConf,
    stats: &mut BS,
) -> Result<Box<dyn IndexTable<K> + Send + Sync>, BuildError>
where
    K: RollHash + Hash + Eq + Clone + Send + Sync + 'static,
    BS: BuildStatsCollector,
{
    if mapping.is_empty() {
        return Err(BuildError::EmptyInput);
    }
    if conf.validate {
        check_distinct(mapping)?;
    }
    Ok(match conf.kind {
        TableKind::HashMap => Box::new(HashMapTable::new(mapping)),
        TableKind::Chd => Box::new(ChdTable::try_with_conf_stats(mapping, &conf.chd, stats)?),
    })
}

/// Builds the table selected by `conf` over the keys of `mapping`.
#[inline]
pub fn build<K>(
    mapping: &[K],
    conf: &TableConf,
) -> Result<Box<dyn IndexTable<K> + Send + Sync>, BuildError>
where
    K: RollHash + Hash + Eq + Clone + Send + Sync + 'static,
{
    build_with_stats(mapping, conf, &mut ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_keys() -> Vec<String> {
        ["the", "cat", "sat", "on", "mat"].iter().map(|s| s.to_string()).collect()
    }

    fn test_exact_contract<T: IndexTable<String> + ?Sized>(table: &T, keys: &[String]) {
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
        assert_eq!(table.get(&"dog".to_string()), None);
        assert_eq!(table.len(), keys.len());
        assert_eq!(
            table.get_all(&["mat".to_string(), "dog".to_string(), "the".to_string()]),
            vec![Some(4), None, Some(0)]
        );
        assert_eq!(&*table.try_keys().unwrap(), keys);
    }

    #[test]
    fn hash_map_kind() {
        let keys = sentence_keys();
        let table = build(&keys, &TableConf::default()).unwrap();
        test_exact_contract(&*table, &keys);
    }

    #[test]
    fn chd_kind() {
        let keys = sentence_keys();
        let table = build(&keys, &TableConf::kind(TableKind::Chd)).unwrap();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(table.get(key), Some(i));
        }
        assert_eq!(table.len(), keys.len());
        assert_eq!(table.try_keys().err(), Some(ReconstructError));
        // a fingerprint collision for an absent key is theoretically possible;
        // report it instead of failing
        if let Some(i) = table.get(&"dog".to_string()) {
            eprintln!("fingerprint collision: \"dog\" reported at position {}", i);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            build(&Vec::<String>::new(), &TableConf::default()).err(),
            Some(BuildError::EmptyInput)
        );
    }

    #[test]
    fn validation_reports_both_positions() {
        let keys: Vec<String> = ["the", "cat", "the"].iter().map(|s| s.to_string()).collect();
        for kind in [TableKind::HashMap, TableKind::Chd] {
            assert_eq!(
                build(&keys, &TableConf::validated(kind)).err(),
                Some(BuildError::DuplicateKey { first: 0, second: 2 })
            );
        }
    }

    #[test]
    fn tables_are_shareable_between_threads() {
        let keys = sentence_keys();
        let table = build(&keys, &TableConf::kind(TableKind::Chd)).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| assert_eq!(table.get(&"sat".to_string()), Some(2)));
            }
        });
    }

    #[test]
    fn check_distinct_accepts_unique_keys() {
        assert_eq!(check_distinct(&sentence_keys()), Ok(()));
    }
}
