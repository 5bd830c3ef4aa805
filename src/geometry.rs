//! Small geometric kernel for planar interfaces.
//!
//! All functions are generic over the scalar type so that they apply both to plain `f64`
//! and to the differentiable [`Dual`](crate::dual::Dual) numbers.
use nalgebra::{ClosedAdd, ClosedMul, ClosedSub, Scalar, Vector2};
use num::Zero;
use std::ops::Neg;

/// The scalar cross product `a_x b_y - a_y b_x` of two planar vectors.
pub fn cross2<T>(a: &Vector2<T>, b: &Vector2<T>) -> T
where
    T: Scalar + ClosedMul + ClosedSub,
{
    a[0].clone() * b[1].clone() - a[1].clone() * b[0].clone()
}

/// Rotates a vector by 90 degrees counter-clockwise, i.e. applies `Q = [[0, -1], [1, 0]]`.
///
/// Applied to a surface tangent this gives the surface normal used throughout the crate.
pub fn rotate_quarter<T>(v: &Vector2<T>) -> Vector2<T>
where
    T: Scalar + Neg<Output = T>,
{
    Vector2::new(-v[1].clone(), v[0].clone())
}

/// Component of `v` along the unit direction `direction`.
pub fn scalar_projection<T>(v: &Vector2<T>, direction: &Vector2<T>) -> T
where
    T: Scalar + Zero + ClosedAdd + ClosedMul,
{
    v.dot(direction)
}

/// Projection of `v` onto the unit direction `direction`.
pub fn vector_projection<T>(v: &Vector2<T>, direction: &Vector2<T>) -> Vector2<T>
where
    T: Scalar + Zero + ClosedAdd + ClosedMul,
{
    let alpha = scalar_projection(v, direction);
    direction.map(|d| d * alpha.clone())
}

/// Evaluates `sum_i weights[i] * values[i]`.
///
/// # Panics
///
/// Panics if the number of weights and values differ.
pub fn interpolate<T>(weights: &[T], values: &[Vector2<T>]) -> Vector2<T>
where
    T: Scalar + Zero + ClosedAdd + ClosedMul,
{
    assert_eq!(weights.len(), values.len(), "One weight per nodal value required");
    let mut result = Vector2::zeros();
    for (w, v) in weights.iter().zip(values) {
        result += v.map(|v_i| v_i * w.clone());
    }
    result
}
