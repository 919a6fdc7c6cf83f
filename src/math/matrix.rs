use serde::{Serialize, Deserialize};
use std::ops::AddAssign;

use crate::math::init::Initializer;
use crate::math::random::RandomSource;

/// Row-major dense matrix of `f64`.
///
/// Layers store weights as `input_size × size` so that a forward pass is a
/// row vector times the matrix: `z = x · W`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Fills a `rows × cols` matrix by sampling `init` with the given fan-in
    /// and fan-out.
    pub fn initialized(
        rows: usize,
        cols: usize,
        init: Initializer,
        fan_in: usize,
        fan_out: usize,
        rng: &mut RandomSource,
    ) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = init.sample(fan_in, fan_out, rng);
            }
        }

        res
    }

    /// A `1 × n` matrix holding `values`.
    pub fn row(values: &[f64]) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values.to_vec()] }
    }

    /// Outer product `a ⊗ b`, shape `a.len() × b.len()`.
    pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
        let data = a.iter()
            .map(|x| b.iter().map(|y| x * y).collect())
            .collect();
        Matrix { rows: a.len(), cols: b.len(), data }
    }

    /// Row vector times matrix: `v · self`. `v.len()` must equal `rows`.
    pub fn left_mul(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.rows);
        let mut res = vec![0.0; self.cols];
        for (x, row) in v.iter().zip(self.data.iter()) {
            for (r, w) in res.iter_mut().zip(row.iter()) {
                *r += x * w;
            }
        }
        res
    }

    /// Matrix times column vector: `self · v`. `v.len()` must equal `cols`.
    pub fn right_mul(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.cols);
        self.data.iter()
            .map(|row| row.iter().zip(v.iter()).map(|(w, x)| w * x).sum())
            .collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |r| r.len()),
            data
        }
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|row| row.iter().all(|x| x.is_finite()))
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        if !self.same_shape(rhs) {
            panic!("Matrices are of incorrect sizes")
        }

        for (row, rhs_row) in self.data.iter_mut().zip(rhs.data.iter()) {
            for (x, y) in row.iter_mut().zip(rhs_row.iter()) {
                *x += y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_and_right_mul() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(m.left_mul(&[0.5, -1.0]), vec![-3.5, -4.0, -4.5]);
        assert_eq!(m.right_mul(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
    }

    #[test]
    fn right_mul_is_left_mul_of_the_transpose() {
        let m = Matrix::from_data(vec![vec![0.25, -1.0], vec![2.0, 0.5], vec![1.5, 3.0]]);
        let v = [1.0, -2.0];
        assert_eq!(m.right_mul(&v), m.transpose().left_mul(&v));
    }

    #[test]
    fn outer_product_shape_and_values() {
        let o = Matrix::outer(&[1.0, 2.0], &[3.0, 4.0, 5.0]);
        assert_eq!((o.rows, o.cols), (2, 3));
        assert_eq!(o.data[1], vec![6.0, 8.0, 10.0]);
    }

    #[test]
    fn add_assign_is_elementwise() {
        let mut a = Matrix::from_data(vec![vec![1.0, 2.0]]);
        let b = Matrix::from_data(vec![vec![0.5, 0.5]]);
        a += &b;
        assert_eq!(a.data[0], vec![1.5, 2.5]);
        assert!(a.is_finite());
    }

    #[test]
    fn from_empty_data_has_zero_columns() {
        let m = Matrix::from_data(vec![]);
        assert_eq!((m.rows, m.cols), (0, 0));
    }
}
