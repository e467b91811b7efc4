//! In-memory lookup cache

mod ttl;

pub use ttl::{CacheStats, TtlCache, TtlCacheConfig};
