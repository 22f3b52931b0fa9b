/**
 * SubRec
 * Copyright (C) 2019 The SubRec contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use ndarray::{Array1, Array2};

use crate::error::Error;

/// The regularized gram matrix YᵀY + λI of a factor matrix. Both the
/// factorizer and the online preference solver start every per-row system
/// from this template.
pub fn regularized_gram(factors: &Array2<f64>, regularization: f64) -> Array2<f64> {
    let rank = factors.ncols();
    let mut gram = factors.t().dot(factors);

    for d in 0..rank {
        gram[[d, d]] += regularization;
    }

    gram
}

/// Solves A·x = b for a symmetric positive-definite A via a Cholesky
/// factorization A = L·Lᵀ and two triangular substitutions. The systems
/// solved here are rank-sized, so no pivoting or blocking is needed.
///
/// A non-positive pivot means the system is not positive definite, which only
/// happens with a non-positive regularization; we fail explicitly instead of
/// producing NaN results.
pub fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, Error> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    debug_assert_eq!(n, b.len());

    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let pivot = a[[i, i]] - sum;
                if pivot <= 0.0 {
                    return Err(Error::IllConditioned(
                        "system matrix is not positive definite".to_string(),
                    ));
                }
                l[[i, j]] = pivot.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution L·y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution Lᵀ·x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}
