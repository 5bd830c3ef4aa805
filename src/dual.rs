//! Forward-mode automatic differentiation.
//!
//! A [`Dual`] carries a value together with its gradient with respect to a fixed set of
//! variables (for the mortar functional: the full unknown vector). Arithmetic on duals
//! propagates the gradient by the chain rule, so evaluating a function once on seeded
//! duals yields both the function value and one full Jacobian row per output.
//!
//! Since `Dual` satisfies the `nalgebra::Scalar` requirements and the closed arithmetic
//! traits, `Vector2<Dual>` and `DMatrix<Dual>` can be used with the usual `nalgebra` operators.
use nalgebra::{DMatrix, DVector, Vector2};
use num::{One, Zero};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A real number together with its gradient.
///
/// An empty gradient represents an identically zero gradient. Constants and value-only
/// evaluations therefore never allocate gradient storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Dual {
    value: f64,
    gradient: DVector<f64>,
}

impl Dual {
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            gradient: DVector::zeros(0),
        }
    }

    /// The independent variable with the given index out of `num_variables` variables.
    pub fn variable(value: f64, index: usize, num_variables: usize) -> Self {
        assert!(index < num_variables, "Variable index out of bounds");
        let mut gradient = DVector::zeros(num_variables);
        gradient[index] = 1.0;
        Self { value, gradient }
    }

    pub fn from_parts(value: f64, gradient: DVector<f64>) -> Self {
        Self { value, gradient }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn gradient(&self) -> &DVector<f64> {
        &self.gradient
    }

    /// Partial derivative with respect to variable `index`.
    pub fn derivative(&self, index: usize) -> f64 {
        self.gradient.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_constant(&self) -> bool {
        self.gradient.iter().all(|g| *g == 0.0)
    }

    /// Composes with a scalar function `h`, given `h(self)` and `h'(self)`.
    pub fn chain(&self, value: f64, derivative: f64) -> Self {
        Self {
            value,
            gradient: scaled(&self.gradient, derivative),
        }
    }

    /// Square root. The derivative at zero is taken to be zero.
    pub fn sqrt(&self) -> Self {
        let s = self.value.sqrt();
        if s == 0.0 {
            self.chain(s, 0.0)
        } else {
            self.chain(s, 0.5 / s)
        }
    }

    pub fn abs(&self) -> Self {
        if self.value < 0.0 {
            -self.clone()
        } else {
            self.clone()
        }
    }

    pub fn recip(&self) -> Self {
        let r = 1.0 / self.value;
        self.chain(r, -r * r)
    }

    /// Clamps into `[lower, upper]`. A clamped value is a constant.
    pub fn clamp(&self, lower: f64, upper: f64) -> Self {
        if self.value < lower {
            Self::constant(lower)
        } else if self.value > upper {
            Self::constant(upper)
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

fn scaled(a: &DVector<f64>, alpha: f64) -> DVector<f64> {
    if a.is_empty() {
        DVector::zeros(0)
    } else {
        a * alpha
    }
}

/// Computes `alpha * a + beta * b`, where an empty vector stands for zero.
fn linear_combination(a: &DVector<f64>, alpha: f64, b: &DVector<f64>, beta: f64) -> DVector<f64> {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => DVector::zeros(0),
        (true, false) => b * beta,
        (false, true) => a * alpha,
        (false, false) => {
            assert_eq!(a.len(), b.len(), "Gradients must have the same number of variables");
            let mut result = a * alpha;
            result.axpy(beta, b, 1.0);
            result
        }
    }
}

impl<'a, 'b> Add<&'b Dual> for &'a Dual {
    type Output = Dual;

    fn add(self, rhs: &'b Dual) -> Dual {
        Dual {
            value: self.value + rhs.value,
            gradient: linear_combination(&self.gradient, 1.0, &rhs.gradient, 1.0),
        }
    }
}

impl<'a, 'b> Sub<&'b Dual> for &'a Dual {
    type Output = Dual;

    fn sub(self, rhs: &'b Dual) -> Dual {
        Dual {
            value: self.value - rhs.value,
            gradient: linear_combination(&self.gradient, 1.0, &rhs.gradient, -1.0),
        }
    }
}

impl<'a, 'b> Mul<&'b Dual> for &'a Dual {
    type Output = Dual;

    fn mul(self, rhs: &'b Dual) -> Dual {
        Dual {
            value: self.value * rhs.value,
            gradient: linear_combination(&self.gradient, rhs.value, &rhs.gradient, self.value),
        }
    }
}

impl<'a, 'b> Div<&'b Dual> for &'a Dual {
    type Output = Dual;

    fn div(self, rhs: &'b Dual) -> Dual {
        let inv = 1.0 / rhs.value;
        let value = self.value * inv;
        Dual {
            value,
            gradient: linear_combination(&self.gradient, inv, &rhs.gradient, -value * inv),
        }
    }
}

/// Forwards the by-reference implementation of a binary operator to the owned combinations.
macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Dual> for Dual {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $trait<&'a Dual> for Dual {
            type Output = Dual;

            fn $method(self, rhs: &'a Dual) -> Dual {
                (&self).$method(rhs)
            }
        }

        impl<'a> $trait<Dual> for &'a Dual {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                self.$method(&rhs)
            }
        }

        impl $trait<f64> for Dual {
            type Output = Dual;

            fn $method(self, rhs: f64) -> Dual {
                (&self).$method(&Dual::constant(rhs))
            }
        }

        impl<'a> $trait<f64> for &'a Dual {
            type Output = Dual;

            fn $method(self, rhs: f64) -> Dual {
                self.$method(&Dual::constant(rhs))
            }
        }

        impl $trait<Dual> for f64 {
            type Output = Dual;

            fn $method(self, rhs: Dual) -> Dual {
                (&Dual::constant(self)).$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

macro_rules! forward_assign_op {
    ($trait:ident, $method:ident, $op:ident) => {
        impl $trait<Dual> for Dual {
            fn $method(&mut self, rhs: Dual) {
                *self = (&*self).$op(&rhs);
            }
        }

        impl<'a> $trait<&'a Dual> for Dual {
            fn $method(&mut self, rhs: &'a Dual) {
                *self = (&*self).$op(rhs);
            }
        }
    };
}

forward_assign_op!(AddAssign, add_assign, add);
forward_assign_op!(SubAssign, sub_assign, sub);
forward_assign_op!(MulAssign, mul_assign, mul);
forward_assign_op!(DivAssign, div_assign, div);

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        Dual {
            value: -self.value,
            gradient: -self.gradient,
        }
    }
}

impl<'a> Neg for &'a Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        -self.clone()
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Dual::constant(0.0)
    }

    fn is_zero(&self) -> bool {
        self.value == 0.0 && self.is_constant()
    }
}

impl One for Dual {
    fn one() -> Self {
        Dual::constant(1.0)
    }
}

impl From<f64> for Dual {
    fn from(value: f64) -> Self {
        Dual::constant(value)
    }
}

/// Seeds every entry of `x` as an independent variable.
pub fn seed(x: &DVector<f64>) -> Vec<Dual> {
    let n = x.len();
    x.iter()
        .enumerate()
        .map(|(i, x_i)| Dual::variable(*x_i, i, n))
        .collect()
}

/// Lifts every entry of `x` to a constant.
pub fn constants(x: &DVector<f64>) -> Vec<Dual> {
    x.iter().copied().map(Dual::constant).collect()
}

pub fn lift_vector(v: &Vector2<f64>) -> Vector2<Dual> {
    v.map(Dual::constant)
}

pub fn vector_values(v: &Vector2<Dual>) -> Vector2<f64> {
    v.map(|c| c.value())
}

/// Scales the vector by `1 / |v|`. Returns `None` if the length falls below `tolerance`.
pub fn normalize(v: &Vector2<Dual>, tolerance: f64) -> Option<Vector2<Dual>> {
    let length = v.dot(v).sqrt();
    if length.value() < tolerance {
        None
    } else {
        let inv = length.recip();
        Some(v.map(|c| c * &inv))
    }
}

/// Inverts a small dense matrix of duals by Gauss-Jordan elimination with partial pivoting.
///
/// Returns `None` if a pivot is smaller than `1e-14` times the largest entry of `m`,
/// i.e. if the matrix is numerically singular.
pub fn try_inverse(m: &DMatrix<Dual>) -> Option<DMatrix<Dual>> {
    assert!(m.is_square(), "Only square matrices can be inverted");
    let n = m.nrows();
    let scale = m.iter().fold(0.0f64, |acc, m_ij| acc.max(m_ij.value().abs()));
    let threshold = 1e-14 * scale;
    if n == 0 || scale == 0.0 {
        return None;
    }

    let mut a = m.clone();
    let mut inv = DMatrix::<Dual>::identity(n, n);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[(i, col)].value().abs().total_cmp(&a[(j, col)].value().abs()))?;
        if a[(pivot_row, col)].value().abs() <= threshold {
            return None;
        }
        a.swap_rows(col, pivot_row);
        inv.swap_rows(col, pivot_row);

        let pivot_inv = a[(col, col)].recip();
        for j in 0..n {
            a[(col, j)] *= &pivot_inv;
            inv[(col, j)] *= &pivot_inv;
        }

        for i in (0..n).filter(|&i| i != col) {
            let factor = a[(i, col)].clone();
            if factor.is_zero() {
                continue;
            }
            for j in 0..n {
                let a_update = &factor * &a[(col, j)];
                a[(i, j)] -= a_update;
                let inv_update = &factor * &inv[(col, j)];
                inv[(i, j)] -= inv_update;
            }
        }
    }

    Some(inv)
}
