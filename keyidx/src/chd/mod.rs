//! Perfect hashing of a fixed key set by compress, hash, and displace (CHD).
//!
//! See: D. Belazzougui, F. C. Botelho, M. Dietzfelbinger,
//! *Hash, displace, and compress*, ESA 2009.

mod function;
pub use function::{BuildConf, Function};
