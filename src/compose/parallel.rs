//! Batch composition
//!
//! Grammar files are independent: each job owns its rule table, directives
//! and output files, so a project's grammars can be composed side by side.
//!
//! # Feature Flag
//!
//! Jobs run on rayon's work-stealing pool when the `parallel` feature is
//! enabled and sequentially otherwise. Results are in input order either way.
//!
//! ```rust,ignore
//! use bnf_composer::compose::parallel::compose_batch;
//!
//! let results = compose_batch(&composer, &jobs);
//! for (job, result) in jobs.iter().zip(&results) {
//!     match result {
//!         Ok(output) => println!("{}", output.layout.grammar_path.display()),
//!         Err(e) => eprintln!("{}: {}", job.input.display(), e),
//!     }
//! }
//! ```

use super::composer::{CompositionJob, CompositionOutput, GrammarComposer};
use super::error::Result;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compose and write every job
///
/// Uses rayon for work-stealing parallelism when the `parallel` feature is
/// enabled. `ParallelConfig::num_threads` picks a dedicated pool size; if
/// that pool cannot be built the global pool is used.
#[cfg(feature = "rayon")]
pub fn compose_batch(
    composer: &GrammarComposer,
    jobs: &[CompositionJob],
) -> Vec<Result<CompositionOutput>> {
    let run = || {
        jobs.par_iter()
            .map(|job| composer.run(job))
            .collect::<Vec<_>>()
    };

    match composer.config().parallel.num_threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(_e) => {
                log_warn!("could not build a {}-thread pool: {}", threads, _e);
                run()
            }
        },
        None => run(),
    }
}

/// Compose and write every job sequentially (fallback when rayon is not available)
#[cfg(not(feature = "rayon"))]
pub fn compose_batch(
    composer: &GrammarComposer,
    jobs: &[CompositionJob],
) -> Vec<Result<CompositionOutput>> {
    jobs.iter().map(|job| composer.run(job)).collect()
}
