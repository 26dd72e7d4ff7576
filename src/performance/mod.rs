//! Contract cache and parallel warm-up
//!
//! The cache gives every type one stable contract id and publishes each
//! contract exactly once, however many threads race to build it. The parallel
//! resolver fills that cache from a rayon pool before the closure pass walks
//! it in a deterministic order.

pub mod cache;
pub mod parallel;

pub use cache::{CacheStats, ContractCache};
pub use parallel::ParallelResolver;
