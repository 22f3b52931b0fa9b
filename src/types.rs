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

use fnv::FnvHashMap;

pub type SparseVector = FnvHashMap<u32, f64>;
pub type SparseMatrix = Vec<SparseVector>;

pub fn new_sparse_matrix(num_rows: usize) -> SparseMatrix {
    vec![FnvHashMap::with_capacity_and_hasher(0, Default::default()); num_rows]
}

/// Reorients a sparse matrix so that rows become columns. The factorizer uses
/// this to drive the context half-sweeps from the item-major training matrix.
pub fn transpose(matrix: &SparseMatrix, num_columns: usize) -> SparseMatrix {
    let mut transposed = new_sparse_matrix(num_columns);

    for (row, entries) in matrix.iter().enumerate() {
        for (&column, &value) in entries.iter() {
            transposed[column as usize].insert(row as u32, value);
        }
    }

    transposed
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn transpose_reorients_entries() {
        let mut matrix = new_sparse_matrix(2);
        matrix[0].insert(1, 3.0);
        matrix[1].insert(0, 5.0);
        matrix[1].insert(2, 7.0);

        let transposed = transpose(&matrix, 3);

        assert_eq!(transposed.len(), 3);
        assert_eq!(transposed[1].get(&0), Some(&3.0));
        assert_eq!(transposed[0].get(&1), Some(&5.0));
        assert_eq!(transposed[2].get(&1), Some(&7.0));
        assert!(transposed[0].get(&0).is_none());
    }
}
