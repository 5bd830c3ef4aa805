use nalgebra::{DMatrix, DVector, Dim, Matrix, Scalar};
use nalgebra::storage::Storage;
use num::{Float, Zero};

/// Central difference approximation of the gradient of a scalar function.
pub fn gradient_fd(mut f: impl FnMut(&DVector<f64>) -> f64, x: &DVector<f64>, h: f64) -> DVector<f64> {
    let mut x = x.clone();
    let mut gradient = DVector::zeros(x.len());
    for i in 0..x.len() {
        let x_i = x[i];
        x[i] = x_i + h;
        let forward = f(&x);
        x[i] = x_i - h;
        let backward = f(&x);
        x[i] = x_i;
        gradient[i] = (forward - backward) / (2.0 * h);
    }
    gradient
}

/// Central difference approximation of the Jacobian of a vector function.
///
/// The number of rows is taken from `f(x)`.
pub fn jacobian_fd(
    mut f: impl FnMut(&DVector<f64>) -> DVector<f64>,
    x: &DVector<f64>,
    h: f64,
) -> DMatrix<f64> {
    let m = f(x).len();
    let mut x = x.clone();
    let mut jacobian = DMatrix::zeros(m, x.len());
    for j in 0..x.len() {
        let x_j = x[j];
        x[j] = x_j + h;
        let forward = f(&x);
        x[j] = x_j - h;
        let backward = f(&x);
        x[j] = x_j;
        assert_eq!(forward.len(), m, "Function output changed length");
        jacobian.set_column(j, &((forward - backward) / (2.0 * h)));
    }
    jacobian
}

/// Stacks displacements on top of multipliers into a single unknown vector.
pub fn stack_unknowns<T: Scalar + Zero>(u: &DVector<T>, lambda: &DVector<T>) -> DVector<T> {
    let mut x = DVector::zeros(u.len() + lambda.len());
    x.rows_mut(0, u.len()).copy_from(u);
    x.rows_mut(u.len(), lambda.len()).copy_from(lambda);
    x
}

/// Splits an unknown vector of length `2 n` into its displacement and multiplier halves.
pub fn split_unknowns<T: Scalar>(x: &DVector<T>) -> (DVector<T>, DVector<T>) {
    assert_eq!(x.len() % 2, 0, "Unknown vector must have even length");
    let n = x.len() / 2;
    (x.rows(0, n).into_owned(), x.rows(n, n).into_owned())
}

/// Largest entry-wise absolute difference, relative to the largest entry of `expected`
/// (or absolute, if `expected` is zero).
pub fn max_relative_difference<T, R, C, S1, S2>(actual: &Matrix<T, R, C, S1>, expected: &Matrix<T, R, C, S2>) -> T
where
    T: Scalar + Float,
    R: Dim,
    C: Dim,
    S1: Storage<T, R, C>,
    S2: Storage<T, R, C>,
{
    assert_eq!(actual.shape(), expected.shape(), "Matrices must have the same shape");
    let scale = expected.iter().fold(T::zero(), |acc, x| acc.max(x.abs()));
    let diff = actual
        .iter()
        .zip(expected.iter())
        .fold(T::zero(), |acc, (a, b)| acc.max((*a - *b).abs()));
    if scale > T::zero() {
        diff / scale
    } else {
        diff
    }
}

/// Dense copy of the entries of `m` with magnitude above `tolerance`, others set to zero.
pub fn drop_small_entries<T: Scalar + Float>(m: &DMatrix<T>, tolerance: T) -> DMatrix<T> {
    m.map(|m_ij| if m_ij.abs() > tolerance { m_ij } else { T::zero() })
}
