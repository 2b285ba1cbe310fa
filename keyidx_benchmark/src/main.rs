#![doc = include_str!("../README.md")]

use std::hint::black_box;

use bitm::{BitAccess, BitVec};
use butils::XorShift64;
use clap::{Parser, ValueEnum};
use cpu_time::ProcessTime;
use dyn_size_of::GetSize;
use keyidx::chd::BuildConf;
use keyidx::stats::BuildStatsPrinter;
use keyidx::{BinarySearchTable, ChdTable, HashMapTable};

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// All methods below
    All,
    /// CHD perfect-hash table
    Chd,
    /// Generic hash-map table
    HashMap,
    /// Sorted-array table with binary-search lookups
    BinarySearch,
}

/// Benchmarks read-only key-to-position tables.
#[derive(Parser)]
#[command(version)]
pub struct Conf {
    /// Method to benchmark
    #[arg(value_enum, default_value_t = Method::All)]
    pub method: Method,

    /// Number of keys
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    pub keys_num: usize,

    /// Number of absent keys to look up
    #[arg(short = 'f', long, default_value_t = 100_000)]
    pub foreign_keys_num: usize,

    /// Oversizing of the CHD target table
    #[arg(short, long, default_value_t = 1.3)]
    pub ratio: f64,

    /// Number of CHD buckets; derived from the number of keys if absent
    #[arg(short, long)]
    pub buckets: Option<usize>,

    /// Non-zero seed of the (XorShift64) key generator
    #[arg(short, long, default_value_t = 1234)]
    pub seed: u64,

    /// Number of runs the lookup time is averaged over
    #[arg(short, long, default_value_t = 3)]
    pub lookup_runs: u32,

    /// Print CHD construction statistics
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Conf {
    fn chd_conf(&self) -> BuildConf {
        BuildConf { ratio: self.ratio, buckets: self.buckets, ..Default::default() }
    }
}

/// Generates `keys_num` member keys followed by `foreign_keys_num` keys
/// absent from the member set.
///
/// XorShift64 visits each non-zero 64-bit value once per period, so the keys
/// are distinct; the foreign keys get a suffix keeping the sets disjoint.
fn gen_data(conf: &Conf) -> (Vec<String>, Vec<String>) {
    let mut generator = XorShift64(conf.seed);
    let keys = generator.by_ref().take(conf.keys_num).map(|v| format!("{:016x}", v)).collect();
    let foreign =
        generator.take(conf.foreign_keys_num).map(|v| format!("{:016x}-f", v)).collect();
    (keys, foreign)
}

/// Checks that the table assigned `position` of `input_len` to exactly one key.
fn check_position(seen: &mut [u64], input_len: usize, position: usize) {
    assert!(position < input_len, "table assigns too large position {}>{}", position, input_len);
    assert!(!seen.get_bit(position), "table assigns the same position to two keys");
    seen.set_bit(position);
}

fn benchmark<T, B, G>(
    name: &str,
    conf: &Conf,
    input: &(Vec<String>, Vec<String>),
    build: B,
    get: G,
    size_bytes: Option<fn(&T) -> usize>,
) where
    B: Fn() -> T,
    G: Fn(&T, &String) -> Option<usize>,
{
    let (keys, foreign) = input;

    let start_moment = ProcessTime::now();
    let table = build();
    let build_time = start_moment.elapsed().as_secs_f64();

    let mut seen = Box::<[u64]>::with_zeroed_bits(keys.len());
    for key in keys {
        match get(&table, key) {
            Some(position) => check_position(&mut seen, keys.len(), position),
            None => panic!("table reports the member key {:?} as absent", key),
        }
    }

    let start_moment = ProcessTime::now();
    for _ in 0..conf.lookup_runs {
        for key in keys {
            black_box(get(&table, black_box(key)));
        }
    }
    let member_time = start_moment.elapsed().as_secs_f64();

    let start_moment = ProcessTime::now();
    let mut false_positives = 0usize;
    for _ in 0..conf.lookup_runs {
        for key in foreign {
            if black_box(get(&table, black_box(key))).is_some() {
                false_positives += 1;
            }
        }
    }
    let foreign_time = start_moment.elapsed().as_secs_f64();

    print!(
        "{}: build time [ms]: {:.0}\tlookup time [ns]: {:.0}\tabsent lookup time [ns]: {:.0}",
        name,
        build_time * 1_000.0,
        member_time * 1_000_000_000.0 / (keys.len() * conf.lookup_runs as usize) as f64,
        foreign_time * 1_000_000_000.0 / (foreign.len().max(1) * conf.lookup_runs as usize) as f64,
    );
    if let Some(size_bytes) = size_bytes {
        print!("\tsize [bits/key]: {:.2}", (size_bytes(&table) * 8) as f64 / keys.len() as f64);
    }
    if false_positives != 0 {
        print!(
            "\tabsent keys reported present: {} of {}",
            false_positives / conf.lookup_runs as usize,
            foreign.len()
        );
    }
    println!();
}

fn main() {
    let conf: Conf = Conf::parse();
    assert_ne!(conf.seed, 0, "the key generator seed must be non-zero");
    println!(
        "keys: {} member + {} foreign, lookup times averaged over {} runs",
        conf.keys_num, conf.foreign_keys_num, conf.lookup_runs
    );
    let input = gen_data(&conf);

    if matches!(conf.method, Method::All | Method::Chd) {
        let chd_conf = conf.chd_conf();
        benchmark(
            "CHD",
            &conf,
            &input,
            || {
                if conf.verbose {
                    ChdTable::try_with_conf_stats(
                        &input.0,
                        &chd_conf,
                        &mut BuildStatsPrinter::stdout(),
                    )
                } else {
                    ChdTable::try_with_conf(&input.0, &chd_conf)
                }
                .unwrap_or_else(|err| panic!("CHD construction failed: {}", err))
            },
            |table, key| table.get(key),
            Some(|table: &ChdTable| table.size_bytes()),
        );
    }
    if matches!(conf.method, Method::All | Method::HashMap) {
        benchmark(
            "hash map",
            &conf,
            &input,
            || HashMapTable::new(&input.0),
            |table, key| table.get(key),
            None,
        );
    }
    if matches!(conf.method, Method::All | Method::BinarySearch) {
        benchmark(
            "binary search",
            &conf,
            &input,
            || BinarySearchTable::new(&input.0),
            |table, key| table.get(key),
            None,
        );
    }
}
