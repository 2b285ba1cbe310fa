#![doc = include_str!("../README.md")]

pub mod hash;
pub mod stats;

pub mod chd;
pub mod table;

mod error;
pub use error::{BuildError, ReconstructError};
pub use hash::RollHash;
pub use table::{BinarySearchTable, ChdTable, HashMapTable, IndexTable, TableConf, TableKind};

pub use dyn_size_of::GetSize;
