use std::cmp::Ordering;
use std::path::Path;

use fnv::{FnvHashMap, FnvHashSet};
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::artifacts::Artifacts;
use crate::bm25::{self, Bm25Params};
use crate::error::Error;
use crate::linalg;

pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 15;

/// Serves community recommendations from a pretrained factorization model.
///
/// Everything in here is created once when the artifacts are loaded and never
/// mutated afterwards. Each request builds its own system from the gram
/// template, so one instance can be shared freely between concurrent
/// requests without locking.
pub struct Recommender {
    /// Item factors with L2-normalized rows, so dot products are cosines.
    factors: Array2<f64>,
    /// The immutable template FᵀF + λI. Requests clone it, never write it.
    gram: Array2<f64>,
    params: Bm25Params,
    names: Vec<String>,
    indices: FnvHashMap<String, u32>,
}

impl Recommender {
    pub fn from_dir(model_dir: &Path) -> Result<Self, Error> {
        Self::from_artifacts(Artifacts::load(model_dir)?)
    }

    pub fn from_artifacts(artifacts: Artifacts) -> Result<Self, Error> {
        let Artifacts {
            mut factors,
            params,
            dictionary,
        } = artifacts;

        for mut row in factors.outer_iter_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|value| value / norm);
            }
        }

        let gram = linalg::regularized_gram(&factors, params.regularization);

        let mut indices: FnvHashMap<String, u32> =
            FnvHashMap::with_capacity_and_hasher(dictionary.len(), Default::default());
        for (index, name) in dictionary.iter().enumerate() {
            indices.insert(name.clone(), index as u32);
        }

        debug!(
            num_items = dictionary.len(),
            rank = factors.ncols(),
            "initialized recommender"
        );

        Ok(Recommender {
            factors,
            gram,
            params,
            names: dictionary,
            indices,
        })
    }

    pub fn num_items(&self) -> usize {
        self.names.len()
    }

    pub fn item_name(&self, item_index: u32) -> &str {
        &self.names[item_index as usize]
    }

    pub fn item_index(&self, name: &str) -> Option<u32> {
        self.indices.get(&name.to_lowercase()).copied()
    }

    /// Recommends up to `n` communities for the given name → count mapping,
    /// best match first. Names unknown to the model are dropped silently; if
    /// nothing remains, the result is empty. Input names never appear in the
    /// result, and identical input always yields identical output.
    pub fn get_similar(
        &self,
        post_counts: &FnvHashMap<String, u64>,
        n: usize,
    ) -> Result<Vec<String>, Error> {
        let mut observed = Vec::with_capacity(post_counts.len());
        for (name, &count) in post_counts.iter() {
            if let Some(&index) = self.indices.get(&name.to_lowercase()) {
                observed.push((index, count as f64));
            }
        }

        if observed.is_empty() {
            return Ok(Vec::new());
        }

        let confidences = bm25::weight_vector(&observed, &self.params);
        let preferences = self.preference_vector(&confidences)?;

        let scores = self.factors.dot(&preferences);

        let seen: FnvHashSet<u32> = observed.iter().map(|&(index, _)| index).collect();
        let ranked = ranked_indices(&scores, |index| !seen.contains(&index));

        Ok(ranked
            .into_iter()
            .take(n)
            .map(|index| self.names[index as usize].clone())
            .collect())
    }

    /// Cosine nearest neighbors of a single item over the normalized factors,
    /// used for training-time self-evaluation of a fresh model.
    pub fn top_related(&self, item_index: u32, n: usize) -> Vec<(u32, f64)> {
        let target = self.factors.row(item_index as usize).to_owned();
        let scores = self.factors.dot(&target);

        ranked_indices(&scores, |index| index != item_index)
            .into_iter()
            .take(n)
            .map(|index| (index, scores[index as usize]))
            .collect()
    }

    /// Builds the request-local system from the gram template and solves for
    /// the latent preference vector:
    /// A_eff = template + Σ (c_i − 1)·f_i f_iᵀ, b = Σ c_i·f_i.
    fn preference_vector(&self, confidences: &[(u32, f64)]) -> Result<Array1<f64>, Error> {
        let rank = self.factors.ncols();

        let mut a = self.gram.clone();
        let mut b = Array1::<f64>::zeros(rank);

        for &(index, confidence) in confidences {
            let factor = self.factors.row(index as usize);

            for r in 0..rank {
                b[r] += confidence * factor[r];
                for s in 0..rank {
                    a[[r, s]] += (confidence - 1.0) * factor[r] * factor[s];
                }
            }
        }

        linalg::solve_spd(&a, &b)
    }
}

/// All item indices passing the filter, ordered by descending score with ties
/// broken by ascending index so that the ranking is deterministic.
fn ranked_indices<F>(scores: &Array1<f64>, keep: F) -> Vec<u32>
where
    F: Fn(u32) -> bool,
{
    let mut ranked: Vec<u32> = (0..scores.len() as u32).filter(|&index| keep(index)).collect();

    ranked.sort_by(|&a, &b| {
        scores[b as usize]
            .partial_cmp(&scores[a as usize])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });

    ranked
}

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;

    fn toy_recommender() -> Recommender {
        let artifacts = Artifacts {
            factors: array![[1.0, 0.0], [0.0, 1.0], [0.7, 0.7]],
            params: Bm25Params {
                k1: 100.0,
                b: 0.6,
                avg_length: 5.0,
                idf: vec![1.0, 1.0, 1.0],
                regularization: 0.01,
            },
            dictionary: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };

        Recommender::from_artifacts(artifacts).unwrap()
    }

    fn counts(pairs: &[(&str, u64)]) -> FnvHashMap<String, u64> {
        pairs
            .iter()
            .map(|&(name, count)| (name.to_string(), count))
            .collect()
    }

    #[test]
    fn ranks_correlated_items_first_and_excludes_the_input() {
        let recommender = toy_recommender();

        let result = recommender.get_similar(&counts(&[("a", 5)]), 15).unwrap();

        // c points in a's direction, b is orthogonal to it, a itself is seen
        assert_eq!(result, vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let recommender = toy_recommender();

        let result = recommender.get_similar(&counts(&[]), 15).unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn unknown_items_are_dropped_silently() {
        let recommender = toy_recommender();

        let result = recommender
            .get_similar(&counts(&[("unknown_item", 10)]), 15)
            .unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn input_names_are_matched_case_insensitively() {
        let recommender = toy_recommender();

        let result = recommender.get_similar(&counts(&[("A", 5)]), 15).unwrap();

        assert_eq!(result[0], "c");
        assert!(!result.contains(&"a".to_string()));
    }

    #[test]
    fn never_recommends_items_from_the_input() {
        let recommender = toy_recommender();

        let result = recommender
            .get_similar(&counts(&[("a", 5), ("c", 1)]), 15)
            .unwrap();

        assert_eq!(result, vec!["b".to_string()]);
    }

    #[test]
    fn requested_length_caps_the_result() {
        let recommender = toy_recommender();

        let result = recommender.get_similar(&counts(&[("a", 5)]), 1).unwrap();

        assert_eq!(result, vec!["c".to_string()]);
    }

    #[test]
    fn identical_requests_yield_identical_rankings() {
        let recommender = toy_recommender();
        let input = counts(&[("a", 5), ("b", 2)]);

        let first = recommender.get_similar(&input, 15).unwrap();
        let second = recommender.get_similar(&input, 15).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn gram_template_survives_requests_unchanged() {
        let recommender = toy_recommender();
        let template = recommender.gram.clone();

        recommender.get_similar(&counts(&[("a", 5)]), 15).unwrap();
        recommender.get_similar(&counts(&[("b", 9)]), 15).unwrap();

        assert_eq!(recommender.gram, template);
    }

    #[test]
    fn top_related_ranks_the_aligned_item_first() {
        let recommender = toy_recommender();

        let related = recommender.top_related(0, 2);

        assert_eq!(related.len(), 2);
        assert_eq!(related[0].0, 2); // c, cosine ~0.707 with a
        assert_eq!(related[1].0, 1); // b, orthogonal
        assert!(related[0].1 > related[1].1);
    }

    #[test]
    fn scores_are_finite_for_trained_parameter_ranges() {
        let recommender = toy_recommender();

        let result = recommender
            .get_similar(&counts(&[("a", 1_000_000)]), 15)
            .unwrap();

        assert_eq!(result.len(), 2);
    }
}
