//! Pipeline concurrente de descarga y conteo.
//!
//! URLs -> pool de workers (rate limiter + fetcher + conteo) -> conteos
//! parciales -> agregador (merge + top N) -> ranking.

pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod pool;
pub mod rate_limit;

#[cfg(test)]
mod test_utils;

pub use config::PipelineConfig;
pub use fetcher::{Fetch, HttpFetcher};
pub use pipeline::{
    cancel_after, cancel_on_ctrl_c, run_pipeline, run_sequential, Pipeline, PipelineState,
};
pub use rate_limit::RateLimiter;
