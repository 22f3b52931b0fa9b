use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::bm25::Bm25Params;
use crate::error::Error;

pub const FACTORS_FILE: &str = "factors.json";
pub const PARAMS_FILE: &str = "params.json";
pub const DICTIONARY_FILE: &str = "dictionary.json";

/// The persisted model: the item factor matrix, the weighting parameters and
/// the dense index → community name dictionary. A training run writes all
/// three into a model directory, the serving process reads them back once at
/// startup.
pub struct Artifacts {
    pub factors: Array2<f64>,
    pub params: Bm25Params,
    pub dictionary: Vec<String>,
}

impl Artifacts {
    /// Writes the artifact set. Every file goes to a temporary sibling first
    /// and is renamed into place, so a concurrent load never observes a
    /// partially written artifact.
    pub fn save(&self, model_dir: &Path) -> Result<(), Error> {
        self.validate()?;

        fs::create_dir_all(model_dir)?;
        write_artifact(&model_dir.join(FACTORS_FILE), &self.factors)?;
        write_artifact(&model_dir.join(PARAMS_FILE), &self.params)?;
        write_artifact(&model_dir.join(DICTIONARY_FILE), &self.dictionary)?;

        info!(
            num_items = self.dictionary.len(),
            rank = self.factors.ncols(),
            model_dir = %model_dir.display(),
            "wrote model artifacts"
        );

        Ok(())
    }

    /// Reads and validates a complete artifact set. Any missing or unreadable
    /// file and any dimensional inconsistency is fatal; a serving process
    /// must refuse to start on it.
    pub fn load(model_dir: &Path) -> Result<Self, Error> {
        let factors: Array2<f64> = read_artifact(&model_dir.join(FACTORS_FILE))?;
        let params: Bm25Params = read_artifact(&model_dir.join(PARAMS_FILE))?;
        let dictionary: Vec<String> = read_artifact(&model_dir.join(DICTIONARY_FILE))?;

        let artifacts = Artifacts {
            factors,
            params,
            dictionary,
        };
        artifacts.validate()?;

        Ok(artifacts)
    }

    /// Invariants shared by save and load: enforced before artifacts reach
    /// disk, and re-checked against artifact sets from foreign training runs.
    fn validate(&self) -> Result<(), Error> {
        if self.dictionary.len() != self.factors.nrows() {
            return Err(Error::DictionarySizeMismatch {
                dictionary_len: self.dictionary.len(),
                factor_rows: self.factors.nrows(),
            });
        }

        if self.params.idf.len() != self.factors.nrows() {
            return Err(Error::IdfSizeMismatch {
                idf_len: self.params.idf.len(),
                factor_rows: self.factors.nrows(),
            });
        }

        if self.params.regularization <= 0.0 {
            return Err(Error::IllConditioned(format!(
                "regularization must be positive, got {}",
                self.params.regularization
            )));
        }

        if self.params.avg_length <= 0.0 {
            return Err(Error::IllConditioned(format!(
                "average length must be positive, got {}",
                self.params.avg_length
            )));
        }

        Ok(())
    }
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_string(value)?;

    let temporary = path.with_extension("tmp");
    fs::write(&temporary, json)?;
    fs::rename(&temporary, path)?;

    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = fs::read_to_string(path).map_err(|source| Error::ArtifactUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| Error::ArtifactCorrupt {
        path: path.to_path_buf(),
        source,
    })
}
