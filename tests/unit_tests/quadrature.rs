use matrixcompare::assert_scalar_eq;
use mortar::element::ElementFamily;
use mortar::quadrature::{gauss, QuadratureTable};
use proptest::prelude::*;

#[test]
fn two_point_rule_is_known() {
    let (weights, mut points) = gauss(2);
    points.sort_by(f64::total_cmp);
    let p = 1.0 / 3.0f64.sqrt();
    assert_scalar_eq!(points[0], -p, comp = abs, tol = 1e-15);
    assert_scalar_eq!(points[1], p, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[0], 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(weights[1], 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn odd_rules_contain_the_midpoint() {
    let (weights, points) = gauss(3);
    let (i, midpoint) = points
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .unwrap();
    assert_scalar_eq!(*midpoint, 0.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(weights[i], 8.0 / 9.0, comp = abs, tol = 1e-14);
}

#[test]
fn table_uses_family_defaults_unless_overridden() {
    let table = QuadratureTable::new(None);
    assert_eq!(table.rule(ElementFamily::Seg2).0.len(), 3);
    assert_eq!(table.rule(ElementFamily::Seg3).0.len(), 4);

    let table = QuadratureTable::new(Some(5));
    assert_eq!(table.rule(ElementFamily::Seg2).0.len(), 5);
    assert_eq!(table.rule(ElementFamily::Seg3).1.len(), 5);
}

#[test]
#[should_panic]
fn empty_rule_is_rejected() {
    gauss(0);
}

proptest! {
    #[test]
    fn gauss_rules_integrate_polynomials_exactly(n in 1 ..= 10usize) {
        let (weights, points) = gauss(n);
        prop_assert_eq!(weights.len(), n);
        prop_assert!(points.iter().all(|xi| xi.abs() < 1.0));
        prop_assert!(weights.iter().all(|w| *w > 0.0));

        for degree in 0 ..= 2 * n - 1 {
            let integral: f64 = weights.iter().zip(&points).map(|(w, x)| w * x.powi(degree as i32)).sum();
            let expected = if degree % 2 == 0 { 2.0 / (degree as f64 + 1.0) } else { 0.0 };
            prop_assert!((integral - expected).abs() < 1e-12, "degree {}: {} vs {}", degree, integral, expected);
        }
    }
}
