//! Community recommendations from implicit interaction counts.
//!
//! The offline pipeline turns a (context, item, count) log into a sparse
//! interaction matrix, weights it with the BM25 ranking function and
//! factorizes it into low-rank latent factors by alternating least squares.
//! The resulting artifact set (item factors, weighting parameters, item
//! dictionary) is persisted and later served by [`Recommender`], which ranks
//! all communities against a preference vector solved per request.

use std::time::Instant;

use tracing::info;

pub mod als;
pub mod artifacts;
pub mod bm25;
pub mod error;
pub mod io;
pub mod linalg;
pub mod recommend;
pub mod stats;
pub mod types;

#[cfg(test)]
mod usage_tests;

pub use crate::error::Error;
pub use crate::recommend::Recommender;

/// Configuration of a training run.
pub struct TrainConfig {
    pub rank: usize,
    pub regularization: f64,
    pub sweeps: usize,
    pub k1: f64,
    pub b: f64,
    pub pool_size: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            rank: als::DEFAULT_RANK,
            regularization: als::DEFAULT_REGULARIZATION,
            sweeps: als::DEFAULT_SWEEPS,
            k1: bm25::DEFAULT_K1,
            b: bm25::DEFAULT_B,
            pool_size: num_cpus::get(),
        }
    }
}

/// Runs the full offline pipeline: builds the sparse interaction matrix from
/// the log, weights it, factorizes it and assembles the artifact set. The
/// caller decides where (and whether) to persist the artifacts.
pub fn train(
    records: &[io::Interaction],
    config: &TrainConfig,
) -> Result<artifacts::Artifacts, Error> {
    let data_dict = stats::DataDictionary::from(records.iter());
    let counts = stats::interaction_matrix(records, &data_dict)?;

    info!(
        num_items = data_dict.num_items(),
        num_contexts = data_dict.num_contexts(),
        num_records = data_dict.num_records(),
        "built interaction matrix"
    );

    let (weighted, params) =
        bm25::weight_matrix(&counts, config.k1, config.b, config.regularization);

    let factorization_start = Instant::now();
    let (item_factors, _context_factors) = als::factorize(
        &weighted,
        data_dict.num_contexts(),
        config.rank,
        config.regularization,
        config.sweeps,
        config.pool_size,
    )?;

    info!(
        rank = config.rank,
        sweeps = config.sweeps,
        elapsed_ms = factorization_start.elapsed().as_millis() as u64,
        "factorized interaction matrix"
    );

    let renaming = stats::Renaming::from(data_dict);

    Ok(artifacts::Artifacts {
        factors: item_factors,
        params,
        dictionary: renaming.into_names(),
    })
}
