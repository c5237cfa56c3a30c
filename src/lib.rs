#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod allocator;

/// Error types reported by fallible operations.
pub mod error;

pub mod growth_policy;

/// A HashMap implementation using robin-hood hashing.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

/// A hash set implementation using robin-hood hashing.
///
/// This module provides a `HashSet` that wraps the `HashTable` and provides
/// a standard set interface with configurable hashers.
pub mod hash_set;

pub mod select;

pub use allocator::AllocError;
pub use allocator::BucketAllocator;
pub use allocator::Global;
pub use error::NotFoundError;
pub use error::TryReserveError;
pub use growth_policy::GrowthPolicy;
pub use growth_policy::ModGrowthPolicy;
pub use growth_policy::PowerOfTwoGrowthPolicy;
pub use growth_policy::PrimeGrowthPolicy;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashCache;
pub use hash_table::HashTable;
pub use hash_table::NoStoreHash;
pub use hash_table::StoreHash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder used when no default hasher is available. Supply a
        /// hasher builder explicitly.
        pub enum DefaultHashBuilder {}
    }
}
