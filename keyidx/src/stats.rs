//! Collecting and reporting construction statistics.

use std::fmt::{Display, Formatter};
use std::io::Write;

/// Summary of a completed displacement search.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BuildStats {
    /// Total number of buckets, including empty ones.
    pub buckets: usize,
    /// Number of buckets holding at least one key.
    pub nonempty_buckets: usize,
    /// Number of seed trials discarded because of a collision.
    pub collisions: u64,
    /// Number of distinct values in the displacement seed table.
    pub distinct_seeds: usize,
    /// The largest displacement seed recorded.
    pub max_seed: u32,
}

impl Display for BuildStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "buckets: {} ({} non-empty)\tdiscarded trials: {}\tdistinct seeds: {}\tmax seed: {}",
            self.buckets, self.nonempty_buckets, self.collisions, self.distinct_seeds, self.max_seed
        )
    }
}

/// Receives progress reports from the displacement search.
///
/// The reports do not influence the produced structures in any way.
/// Use `&mut ()` to ignore them.
pub trait BuildStatsCollector {
    /// Called periodically with the number of buckets `placed` so far
    /// (out of `nonempty_buckets`) and the number of discarded seed trials.
    #[inline(always)]
    fn progress(&mut self, _placed: usize, _nonempty_buckets: usize, _collisions: u64) {}

    /// Called once after every bucket has been placed.
    #[inline(always)]
    fn end(&mut self, _stats: &BuildStats) {}
}

impl BuildStatsCollector for () {}

/// [`BuildStatsCollector`] that writes each report as a line of text.
pub struct BuildStatsPrinter<W: Write = std::io::Stdout> {
    writer: W,
}

impl BuildStatsPrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { writer: std::io::stdout() }
    }
}

impl<W: Write> BuildStatsPrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the printer and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> BuildStatsCollector for BuildStatsPrinter<W> {
    fn progress(&mut self, placed: usize, nonempty_buckets: usize, collisions: u64) {
        writeln!(
            self.writer,
            "placed {} of {} buckets, {} discarded trials",
            placed, nonempty_buckets, collisions
        )
        .unwrap();
    }

    fn end(&mut self, stats: &BuildStats) {
        writeln!(self.writer, "{}", stats).unwrap();
    }
}
