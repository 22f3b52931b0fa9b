use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the training pipeline and the model loading path.
///
/// Per-request conditions (unknown community names, nothing left after
/// filtering) are not errors and never show up here; the recommender absorbs
/// them into well-defined results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("interaction log contains no records, cannot train a model")]
    EmptyLog,

    #[error("cannot read artifact {path}: {source}")]
    ArtifactUnreadable { path: PathBuf, source: io::Error },

    #[error("cannot parse artifact {path}: {source}")]
    ArtifactCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("dictionary lists {dictionary_len} communities but the factor matrix has {factor_rows} rows")]
    DictionarySizeMismatch {
        dictionary_len: usize,
        factor_rows: usize,
    },

    #[error("idf vector has {idf_len} entries but the factor matrix has {factor_rows} rows")]
    IdfSizeMismatch { idf_len: usize, factor_rows: usize },

    #[error("ill-conditioned system: {0}")]
    IllConditioned(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
