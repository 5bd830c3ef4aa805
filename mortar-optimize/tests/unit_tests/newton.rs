use mortar_optimize::newton::{newton_scalar, NewtonError, NewtonSettings};
use proptest::prelude::*;

#[test]
fn linear_residual_converges_after_single_step() {
    let result = newton_scalar(|x| (2.0 * x - 0.5, 2.0), 0.0, NewtonSettings::projection()).unwrap();
    assert_eq!(result.iterations, 1);
    assert!((result.root - 0.25).abs() < 1e-14);
}

#[test]
fn root_at_initial_guess_takes_no_steps() {
    let result = newton_scalar(|x| (3.0 * x, 3.0), 0.0, NewtonSettings::projection()).unwrap();
    assert_eq!(result.iterations, 0);
    assert_eq!(result.root, 0.0);
}

#[test]
fn vanishing_derivative_is_reported() {
    let err = newton_scalar(|x| (x * x + 1.0, 2.0 * x), 0.0, NewtonSettings::projection()).unwrap_err();
    assert!(matches!(err, NewtonError::SingularDerivative { .. }));
}

#[test]
fn equation_without_real_root_exhausts_iteration_budget() {
    // x^2 + 1 has no real root; starting away from zero the iterates wander chaotically
    let settings = NewtonSettings {
        max_iterations: 20,
        tolerance: 1e-10,
    };
    let err = newton_scalar(|x| (x * x + 1.0, 2.0 * x), 0.3, settings).unwrap_err();
    match err {
        NewtonError::MaximumIterationsReached { iterations, .. } => assert_eq!(iterations, 20),
        NewtonError::SingularDerivative { .. } | NewtonError::NonFiniteIterate { .. } => {}
    }
}

proptest! {
    #[test]
    fn cubic_roots_are_found_to_tolerance(a in 0.5 .. 3.0f64) {
        // f(x) = x^3 - a has the single real root a^(1/3)
        let result = newton_scalar(|x| (x * x * x - a, 3.0 * x * x), 1.0, NewtonSettings::projection()).unwrap();
        prop_assert!((result.root - a.cbrt()).abs() < 1e-9);
        prop_assert!(result.iterations <= 20);
    }
}
