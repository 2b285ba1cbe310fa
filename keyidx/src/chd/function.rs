use std::cmp::Reverse;
use std::collections::HashSet;
use std::io;

use binout::{Serializer, VByte};
use bitm::{BitAccess, BitVec};
use dyn_size_of::GetSize;

use crate::error::BuildError;
use crate::hash::RollHash;
use crate::stats::{BuildStats, BuildStatsCollector};

/// Number of buckets placed between two consecutive progress reports.
const PROGRESS_INTERVAL: usize = 10_000;

/// Build configuration accepted by [`Function`] constructors.
///
/// See field descriptions for details.
#[derive(Clone, Copy)]
pub struct BuildConf {
    /// Oversizing of the target table: for `n` keys the table has
    /// `round(n * ratio)` slots. (default: `1.3`)
    ///
    /// Values close to `1.0` minimize the table at the cost of a longer
    /// displacement search. Values below `1.0` are rejected, as a table
    /// smaller than the key set cannot be collision-free.
    pub ratio: f64,

    /// Number of buckets the keys are partitioned into,
    /// or [`None`] to use `n / 5 + 31` for `n` keys. (default: `None`)
    ///
    /// More buckets mean fewer keys per bucket and an easier search,
    /// but a larger seed table.
    pub buckets: Option<usize>,

    /// Upper bound on the displacement seeds tried per bucket before the
    /// construction gives up with [`BuildError::SeedLimitReached`].
    /// (default: `1 << 20`)
    pub seed_limit: u32,
}

impl Default for BuildConf {
    fn default() -> Self {
        Self { ratio: 1.3, buckets: None, seed_limit: 1 << 20 }
    }
}

impl BuildConf {
    /// Returns a configuration with a custom [`ratio`](BuildConf::ratio).
    pub fn ratio(ratio: f64) -> Self {
        Self { ratio, ..Default::default() }
    }

    /// Returns a configuration with a custom number of [`buckets`](BuildConf::buckets).
    pub fn buckets(buckets: usize) -> Self {
        Self { buckets: Some(buckets), ..Default::default() }
    }

    /// Returns a configuration with custom [`ratio`](BuildConf::ratio)
    /// and number of [`buckets`](BuildConf::buckets).
    pub fn ratio_buckets(ratio: f64, buckets: usize) -> Self {
        Self { ratio, buckets: Some(buckets), ..Default::default() }
    }
}

/// Helper structure for the bucket partition and the displacement search.
struct Builder<'k, K> {
    keys: &'k [K],
    table_size: usize,
    /// Displacement seed per bucket; empty buckets keep seed 0.
    seeds: Box<[u32]>,
    /// Slots of the target table claimed so far.
    occupied: Box<[u64]>,
    /// Seed trials discarded because of a collision.
    collisions: u64,
    seed_limit: u32,
}

impl<'k, K: RollHash> Builder<'k, K> {
    fn new(keys: &'k [K], conf: &BuildConf) -> Result<Self, BuildError> {
        if keys.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        assert!(keys.len() <= u32::MAX as usize, "at most 2^32-1 keys are supported");
        let table_size = (keys.len() as f64 * conf.ratio).round() as usize;
        if table_size < keys.len() {
            return Err(BuildError::TableTooSmall { table_size, keys: keys.len() });
        }
        let buckets = conf.buckets.unwrap_or(keys.len() / 5 + 31);
        assert!(buckets > 0, "the number of buckets must be positive");
        Ok(Self {
            keys,
            table_size,
            seeds: vec![0u32; buckets].into_boxed_slice(),
            occupied: Box::<[u64]>::with_zeroed_bits(table_size),
            collisions: 0,
            seed_limit: conf.seed_limit,
        })
    }

    /// Partitions key positions into buckets by `fingerprint % bucket_count`
    /// and returns them with the processing order: largest bucket first.
    ///
    /// Large buckets are the hardest to place, so they go first, while the
    /// table is at its emptiest. The sort is stable, hence equal-sized buckets
    /// keep their ascending bucket numbers and rebuilds are bit-identical.
    fn partition(&self) -> (Vec<Vec<u32>>, Vec<usize>) {
        let bucket_count = self.seeds.len();
        let mut buckets = vec![Vec::new(); bucket_count];
        for (i, key) in self.keys.iter().enumerate() {
            buckets[key.fingerprint() as usize % bucket_count].push(i as u32);
        }
        let mut order: Vec<usize> = (0..buckets.len()).filter(|&b| !buckets[b].is_empty()).collect();
        order.sort_by_key(|&b| Reverse(buckets[b].len()));
        (buckets, order)
    }

    /// Searches for the lowest seed that sends every key of `bucket` to a
    /// distinct free slot. On success claims the slots and returns the seed.
    ///
    /// `slots` is scratch space reused between calls.
    fn place(&mut self, bucket: &[u32], slots: &mut Vec<usize>) -> Result<u32, BuildError> {
        for seed in 1..=self.seed_limit {
            slots.clear();
            for &key_nr in bucket {
                let slot = self.keys[key_nr as usize].roll_hash(seed) as usize % self.table_size;
                if self.occupied.get_bit(slot) || slots.contains(&slot) {
                    self.collisions += 1;
                    break;
                }
                slots.push(slot);
            }
            if slots.len() == bucket.len() {
                for &slot in slots.iter() {
                    self.occupied.set_bit(slot);
                }
                return Ok(seed);
            }
        }
        Err(BuildError::SeedLimitReached {
            bucket_size: bucket.len(),
            seed_limit: self.seed_limit,
        })
    }

    /// Runs the displacement search for every non-empty bucket.
    /// Returns the number of non-empty buckets.
    fn build_seeds<BS: BuildStatsCollector>(&mut self, stats: &mut BS) -> Result<usize, BuildError> {
        let (buckets, order) = self.partition();
        let mut slots = Vec::new();
        for (placed, &bucket_nr) in order.iter().enumerate() {
            if placed != 0 && placed % PROGRESS_INTERVAL == 0 {
                stats.progress(placed, order.len(), self.collisions);
            }
            self.seeds[bucket_nr] = self.place(&buckets[bucket_nr], &mut slots)?;
        }
        Ok(order.len())
    }

    fn stats(&self, nonempty_buckets: usize) -> BuildStats {
        BuildStats {
            buckets: self.seeds.len(),
            nonempty_buckets,
            collisions: self.collisions,
            distinct_seeds: self.seeds.iter().collect::<HashSet<_>>().len(),
            max_seed: self.seeds.iter().copied().max().unwrap_or(0),
        }
    }

    fn finish(self) -> Function {
        Function { table_size: self.table_size, seeds: self.seeds }
    }
}

/// Perfect hash function built with the compress, hash, and displace (CHD)
/// construction.
///
/// Sends every key of the sequence given during construction to a distinct
/// slot in `[0, table_size)`. A key outside that sequence is sent to an
/// arbitrary slot; pair the function with stored fingerprints (as
/// [`ChdTable`](crate::table::ChdTable) does) to detect such keys.
///
/// The function is immutable and, once returned by a constructor, can be
/// shared read-only between threads.
///
/// See: D. Belazzougui, F. C. Botelho, M. Dietzfelbinger,
/// *Hash, displace, and compress*, ESA 2009.
#[derive(Clone)]
pub struct Function {
    table_size: usize,
    seeds: Box<[u32]>,
}

impl GetSize for Function {
    fn size_bytes_dyn(&self) -> usize {
        self.seeds.size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.seeds.size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

impl Function {
    /// Returns the slot assigned to `key`, in `[0, table_size)`.
    #[inline]
    pub fn get<K: RollHash + ?Sized>(&self, key: &K) -> usize {
        self.slot_of(key.fingerprint(), key)
    }

    /// Returns the slot assigned to `key`, whose zero-seed hash is already
    /// known to be `fingerprint`. Saves one hash evaluation over [`get`](Self::get).
    #[inline]
    pub fn slot_of<K: RollHash + ?Sized>(&self, fingerprint: u32, key: &K) -> usize {
        let seed = self.seeds[fingerprint as usize % self.seeds.len()];
        key.roll_hash(seed) as usize % self.table_size
    }

    /// Returns the number of slots of the target table.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Returns the number of buckets, which equals the length of the
    /// displacement seed table.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.seeds.len()
    }

    /// Returns number of bytes which [`write`](Self::write) will write.
    pub fn write_bytes(&self) -> usize {
        VByte::size(self.table_size) + VByte::array_size(&self.seeds)
    }

    /// Writes `self` to the `output`.
    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        VByte::write(output, self.table_size)?;
        VByte::write_array(output, &self.seeds)
    }

    /// Reads `Self` from the `input`.
    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        let table_size = VByte::read(input)?;
        let seeds = VByte::read_array(input)?;
        Ok(Self { table_size, seeds })
    }

    /// Builds the function and returns it together with the statistics of the
    /// search, reporting progress to `stats` along the way.
    pub(crate) fn try_build<K, BS>(
        keys: &[K],
        conf: &BuildConf,
        stats: &mut BS,
    ) -> Result<(Self, BuildStats), BuildError>
    where
        K: RollHash,
        BS: BuildStatsCollector,
    {
        let mut builder = Builder::new(keys, conf)?;
        let nonempty_buckets = builder.build_seeds(stats)?;
        let build_stats = builder.stats(nonempty_buckets);
        stats.end(&build_stats);
        Ok((builder.finish(), build_stats))
    }

    /// Constructs [`Function`] for the given `keys`, using the build
    /// configuration `conf` and reporting statistics to `stats`.
    ///
    /// The keys must be pairwise distinct; duplicates collide at every seed
    /// and surface as [`BuildError::SeedLimitReached`].
    pub fn try_with_conf_stats<K, BS>(
        keys: &[K],
        conf: &BuildConf,
        stats: &mut BS,
    ) -> Result<Self, BuildError>
    where
        K: RollHash,
        BS: BuildStatsCollector,
    {
        Ok(Self::try_build(keys, conf, stats)?.0)
    }

    /// Constructs [`Function`] for the given `keys`, using the build
    /// configuration `conf`.
    #[inline]
    pub fn try_with_conf<K: RollHash>(keys: &[K], conf: &BuildConf) -> Result<Self, BuildError> {
        Self::try_with_conf_stats(keys, conf, &mut ())
    }

    /// Constructs [`Function`] for the given `keys`, using the default
    /// configuration.
    #[inline]
    pub fn try_new<K: RollHash>(keys: &[K]) -> Result<Self, BuildError> {
        Self::try_with_conf_stats(keys, &Default::default(), &mut ())
    }
}
