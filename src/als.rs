use std::sync::Mutex;
use std::time::Instant;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scoped_pool::Pool;
use tracing::debug;

use crate::error::Error;
use crate::linalg;
use crate::types::{self, SparseMatrix, SparseVector};

pub const DEFAULT_RANK: usize = 50;
pub const DEFAULT_REGULARIZATION: f64 = 0.01;
pub const DEFAULT_SWEEPS: usize = 15;

const INIT_SEED: u64 = 42;

/// Factorizes the BM25-weighted items×contexts matrix into two low-rank
/// dense factor matrices by alternating least squares.
///
/// Each sweep fixes one side and re-solves every row of the other side from
/// the regularized weighted normal equations; the nonzero weighted entries
/// act as confidences over an implicit binary preference. A fixed number of
/// sweeps is run, there is no convergence criterion.
///
/// Returns (item_factors, context_factors). Only the item factors are
/// persisted; the context factors exist for training-time evaluation.
pub fn factorize(
    weighted: &SparseMatrix,
    num_contexts: usize,
    rank: usize,
    regularization: f64,
    sweeps: usize,
    pool_size: usize,
) -> Result<(Array2<f64>, Array2<f64>), Error> {
    if regularization <= 0.0 {
        return Err(Error::IllConditioned(format!(
            "regularization must be positive, got {}",
            regularization
        )));
    }

    let num_items = weighted.len();
    let by_context = types::transpose(weighted, num_contexts);

    let mut rng = StdRng::seed_from_u64(INIT_SEED);
    let mut item_factors = random_factors(num_items, rank, &mut rng);
    let mut context_factors = random_factors(num_contexts, rank, &mut rng);

    let pool = Pool::new(pool_size);

    for sweep in 0..sweeps {
        let sweep_start = Instant::now();

        half_sweep(
            &pool,
            &mut item_factors,
            &context_factors,
            weighted,
            regularization,
        )?;
        half_sweep(
            &pool,
            &mut context_factors,
            &item_factors,
            &by_context,
            regularization,
        )?;

        debug!(
            sweep = sweep,
            elapsed_ms = sweep_start.elapsed().as_millis() as u64,
            "completed sweep"
        );
    }

    Ok((item_factors, context_factors))
}

fn random_factors(num_rows: usize, rank: usize, rng: &mut StdRng) -> Array2<f64> {
    Array2::from_shape_fn((num_rows, rank), |_| rng.gen_range(0.0..0.01))
}

/// Re-solves every row of the moving factor matrix against the fixed one.
/// The fixed side's regularized gram matrix is computed once per half-sweep,
/// the per-row solves run independently on the pool.
fn half_sweep(
    pool: &Pool,
    moving: &mut Array2<f64>,
    fixed: &Array2<f64>,
    observations: &SparseMatrix,
    regularization: f64,
) -> Result<(), Error> {
    let gram = linalg::regularized_gram(fixed, regularization);
    let failure: Mutex<Option<Error>> = Mutex::new(None);

    pool.scoped(|scope| {
        for (row_index, mut row) in moving.outer_iter_mut().enumerate() {
            let entries = &observations[row_index];
            let gram = &gram;
            let failure = &failure;

            scope.execute(move || {
                if entries.is_empty() {
                    // nothing observed, the regularized solution is zero
                    row.fill(0.0);
                    return;
                }

                match solve_row(entries, fixed, gram) {
                    Ok(solution) => row.assign(&solution),
                    Err(error) => *failure.lock().unwrap() = Some(error),
                }
            });
        }
    });

    match failure.into_inner().unwrap() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Solves (YᵀY + λI + Σ (c_i − 1)·y_i y_iᵀ)·x = Σ c_i·y_i for one row, where
/// the sums run over the row's nonzero weighted entries.
fn solve_row(
    entries: &SparseVector,
    fixed: &Array2<f64>,
    gram: &Array2<f64>,
) -> Result<Array1<f64>, Error> {
    let rank = fixed.ncols();

    let mut a = gram.clone();
    let mut b = Array1::<f64>::zeros(rank);

    for (&other, &confidence) in entries.iter() {
        let factor = fixed.row(other as usize);

        for r in 0..rank {
            b[r] += confidence * factor[r];
            for s in 0..rank {
                a[[r, s]] += (confidence - 1.0) * factor[r] * factor[s];
            }
        }
    }

    linalg::solve_spd(&a, &b)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::types::new_sparse_matrix;

    fn cosine(a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>) -> f64 {
        a.dot(&b) / (a.dot(&a).sqrt() * b.dot(&b).sqrt())
    }

    #[test]
    fn rejects_non_positive_regularization() {
        let weighted = new_sparse_matrix(1);

        match factorize(&weighted, 1, 2, 0.0, 1, 1) {
            Err(Error::IllConditioned(_)) => {}
            other => panic!("expected IllConditioned, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn produces_factor_matrices_of_requested_shape() {
        let mut weighted = new_sparse_matrix(3);
        weighted[0].insert(0, 2.0);
        weighted[1].insert(1, 3.0);
        weighted[2].insert(0, 1.0);

        let (item_factors, context_factors) =
            factorize(&weighted, 2, 4, 0.1, 2, 1).unwrap();

        assert_eq!(item_factors.shape(), &[3, 4]);
        assert_eq!(context_factors.shape(), &[2, 4]);
    }

    #[test]
    fn correlated_items_end_up_with_similar_factors() {
        // items 0 and 1 share the same contexts with identical confidences,
        // item 2 lives in a separate context
        let mut weighted = new_sparse_matrix(3);
        weighted[0].insert(0, 5.0);
        weighted[0].insert(1, 5.0);
        weighted[1].insert(0, 5.0);
        weighted[1].insert(1, 5.0);
        weighted[2].insert(2, 5.0);

        let (item_factors, _) = factorize(&weighted, 3, 2, 0.1, 10, 2).unwrap();

        let correlated = cosine(item_factors.row(0), item_factors.row(1));
        let uncorrelated = cosine(item_factors.row(0), item_factors.row(2));

        assert!(correlated > 0.999);
        assert!(correlated > uncorrelated);
    }

    #[test]
    fn unobserved_rows_get_zero_factors() {
        let mut weighted = new_sparse_matrix(2);
        weighted[0].insert(0, 4.0);
        // item 1 has no observations at all

        let (item_factors, _) = factorize(&weighted, 1, 3, 0.1, 3, 1).unwrap();

        for value in item_factors.row(1).iter() {
            assert_eq!(*value, 0.0);
        }
    }
}
