//! leafnode core enrichment machinery
//!
//! This crate provides the provider-agnostic building blocks used by the
//! enrichment jobs: a bounded TTL cache, a sliding-window rate limiter,
//! the ordered multi-provider resolver, candidate validation, the batch
//! driver and the fire-and-forget fan-out trigger.

pub mod cache;
pub mod clock;
pub mod enrichment;
pub mod error;
pub mod fanout;
pub mod matching;
pub mod rate_limit;
pub mod resolver;
pub mod validation;

pub use cache::{CacheStats, TtlCache, TtlCacheConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use enrichment::{
    EnrichmentJob, EnrichmentTask, JobAbort, JobScope, JobSummary, RowOutcome,
};
pub use error::{ProviderError, ResolveError};
pub use fanout::{FanOut, INTERNAL_SECRET_HEADER, JobInvoker};
pub use rate_limit::RateLimiter;
pub use resolver::{Provider, ProviderFailure, Resolution, Resolver};
pub use validation::{
    CandidateValidator, ImageCandidate, ImageCheck, ImageHead, ImageProbe, ImageValidator,
    MIN_IMAGE_BYTES,
};
