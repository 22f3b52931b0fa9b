use serde_derive::{Deserialize, Serialize};

use crate::types::SparseMatrix;

pub const DEFAULT_K1: f64 = 100.0;
pub const DEFAULT_B: f64 = 0.6;

/// Parameters of the BM25 weighting, fixed at training time and applied
/// verbatim to every inference request. Persisted as one of the three model
/// artifacts.
///
/// The idf vector is indexed by item, the same axis as the confidence vector
/// it multiplies at inference time, so its length always equals the number of
/// rows of the factor matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub avg_length: f64,
    pub idf: Vec<f64>,
    pub regularization: f64,
}

/// Weights the items×contexts count matrix with the BM25 ranking function and
/// returns the parameters that inference needs to weight new observations the
/// same way.
///
/// With N items, the informativeness of item i seen by df_i contexts is
/// idf_i = ln(N / (1 + df_i)), and an entry saturates as
/// raw·(k1+1) / (k1·length_norm + raw), where length_norm scales the row's
/// total against the corpus average. Doubling a count never doubles its
/// weight once k1·length_norm dominates.
pub fn weight_matrix(
    counts: &SparseMatrix,
    k1: f64,
    b: f64,
    regularization: f64,
) -> (SparseMatrix, Bm25Params) {
    let num_items = counts.len();

    let idf: Vec<f64> = counts
        .iter()
        .map(|row| (num_items as f64 / (1.0 + row.len() as f64)).ln())
        .collect();

    let lengths: Vec<f64> = counts.iter().map(|row| row.values().sum()).collect();
    let avg_length = lengths.iter().sum::<f64>() / num_items as f64;

    let weighted = counts
        .iter()
        .enumerate()
        .map(|(item, row)| {
            let length_norm = (1.0 - b) + b * lengths[item] / avg_length;

            row.iter()
                .map(|(&context, &raw)| {
                    let weight = raw * (k1 + 1.0) / (k1 * length_norm + raw) * idf[item];
                    (context, weight)
                })
                .collect()
        })
        .collect();

    let params = Bm25Params {
        k1,
        b,
        avg_length,
        idf,
        regularization,
    };

    (weighted, params)
}

/// Weights a single new row of raw counts with the stored parameters. Only
/// the row's own length is computed fresh; avg_length and idf come from the
/// training corpus and are never recomputed here.
pub fn weight_vector(counts: &[(u32, f64)], params: &Bm25Params) -> Vec<(u32, f64)> {
    let length: f64 = counts.iter().map(|&(_, raw)| raw).sum();
    let length_norm = (1.0 - params.b) + params.b * length / params.avg_length;

    counts
        .iter()
        .map(|&(item, raw)| {
            let weight = raw * (params.k1 + 1.0) / (params.k1 * length_norm + raw)
                * params.idf[item as usize];
            (item, weight)
        })
        .collect()
}
