//! Graph rewrite passes for data pipelines.

mod inject_prefetch;

pub use inject_prefetch::{AUTOTUNE, InjectPrefetchPass, PREFETCH_DATASET};
