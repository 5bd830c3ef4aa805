use crate::Real;
use log::trace;
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewtonSettings<T> {
    pub max_iterations: usize,
    /// Convergence is declared once the magnitude of a Newton step drops below this value.
    pub tolerance: T,
}

impl NewtonSettings<f64> {
    /// Settings used by the mortar contact point projectors.
    pub fn projection() -> Self {
        Self {
            max_iterations: 20,
            tolerance: 1e-10,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonResult<T> {
    pub root: T,
    /// Number of steps that were taken before the step size fell below the tolerance.
    pub iterations: usize,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NewtonError<T> {
    /// The iteration did not converge within the maximum number of iterations.
    MaximumIterationsReached { iterations: usize, last_iterate: T, last_step: T },
    /// The derivative of the residual vanished, so no step could be computed.
    SingularDerivative { iterate: T, residual: T },
    /// The iterate became infinite or NaN.
    NonFiniteIterate { iterate: T },
}

impl<T: Display> Display for NewtonError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            NewtonError::MaximumIterationsReached {
                iterations,
                last_iterate,
                last_step,
            } => write!(
                f,
                "Failed to converge within maximum number of iterations ({}). \
                 Last iterate: {}, last step: {}",
                iterations, last_iterate, last_step
            ),
            NewtonError::SingularDerivative { iterate, residual } => write!(
                f,
                "Residual derivative vanished at {} (residual {})",
                iterate, residual
            ),
            NewtonError::NonFiniteIterate { iterate } => write!(f, "Newton iterate is not finite: {}", iterate),
        }
    }
}

impl<T: Debug + Display> Error for NewtonError<T> {}

/// Solves the scalar equation `R(x) = 0` with Newton's method.
///
/// The closure returns the pair `(R(x), R'(x))`. Starting from `x0`, the iterate is updated
/// with `dx = -R(x) / R'(x)` until `|dx| < tolerance`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn newton_scalar<T, F>(mut residual: F, x0: T, settings: NewtonSettings<T>) -> Result<NewtonResult<T>, NewtonError<T>>
where
    T: Real,
    F: FnMut(T) -> (T, T),
{
    let mut x = x0;
    let mut last_step = 0.0;

    for iteration in 0..settings.max_iterations {
        let (r, dr) = residual(x);
        if dr == 0.0 {
            return Err(NewtonError::SingularDerivative { iterate: x, residual: r });
        }

        let dx = -r / dr;
        x += dx;
        last_step = dx;
        trace!("scalar Newton iteration {}: step {}", iteration, dx);

        if !x.is_finite() {
            return Err(NewtonError::NonFiniteIterate { iterate: x });
        }
        if dx.abs() < settings.tolerance {
            return Ok(NewtonResult {
                root: x,
                iterations: iteration,
            });
        }
    }

    Err(NewtonError::MaximumIterationsReached {
        iterations: settings.max_iterations,
        last_iterate: x,
        last_step,
    })
}
