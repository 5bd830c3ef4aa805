use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mortar::element::ElementFamily;
use mortar::quadrature::QuadratureTable;
use mortar::segmentation::{compute_dual_basis, compute_segment, MortarSegment};
use nalgebra::{DMatrix, Vector2};
use proptest::prelude::*;

/// Unit slave segment from (1, 0) to (0, 0) with downward normals.
fn unit_slave() -> ([Vector2<f64>; 2], [Vector2<f64>; 2]) {
    let nodes = [Vector2::new(1.0, 0.0), Vector2::new(0.0, 0.0)];
    let normals = [Vector2::new(0.0, -1.0), Vector2::new(0.0, -1.0)];
    (nodes, normals)
}

fn full_overlap() -> MortarSegment<f64> {
    let (nodes, normals) = unit_slave();
    let master = [Vector2::new(0.0, -0.1), Vector2::new(1.0, -0.1)];
    compute_segment(ElementFamily::Seg2, &nodes, &normals, ElementFamily::Seg2, &master)
        .unwrap()
        .unwrap()
}

#[test]
fn disjoint_elements_have_no_segment() {
    let (nodes, normals) = unit_slave();
    let master = [Vector2::new(2.0, -0.1), Vector2::new(3.0, -0.1)];
    let segment = compute_segment(ElementFamily::Seg2, &nodes, &normals, ElementFamily::Seg2, &master).unwrap();
    assert_eq!(segment, None);
}

#[test]
fn partial_overlap_is_clamped_to_slave_element() {
    let (nodes, normals) = unit_slave();
    let master = [Vector2::new(0.5, -0.1), Vector2::new(2.0, -0.1)];
    let segment = compute_segment(ElementFamily::Seg2, &nodes, &normals, ElementFamily::Seg2, &master)
        .unwrap()
        .unwrap();
    assert_scalar_eq!(segment.xi_a, 0.0, comp = abs, tol = 1e-14);
    assert_eq!(segment.xi_b, -1.0);
    assert_scalar_eq!(segment.half_length, 0.5, comp = abs, tol = 1e-14);
}

#[test]
fn gram_matrix_of_full_overlap_is_consistent_mass_matrix() {
    let (nodes, _) = unit_slave();
    let segment = full_overlap();
    let table = QuadratureTable::new(None);
    let basis = compute_dual_basis(ElementFamily::Seg2, &nodes, &segment, table.rule(ElementFamily::Seg2), false);

    #[rustfmt::skip]
    let mass = DMatrix::from_row_slice(2, 2, &[
        2.0, 1.0,
        1.0, 2.0]) / 6.0;
    assert_matrix_eq!(basis.me, mass, comp = abs, tol = 1e-14);
    assert_matrix_eq!(basis.de, DMatrix::<f64>::identity(2, 2) * 0.5, comp = abs, tol = 1e-14);
    assert_eq!(basis.ae, DMatrix::identity(2, 2));
}

#[test]
fn dual_basis_of_full_overlap() {
    let (nodes, _) = unit_slave();
    let segment = full_overlap();
    let table = QuadratureTable::new(None);
    let basis = compute_dual_basis(ElementFamily::Seg2, &nodes, &segment, table.rule(ElementFamily::Seg2), true);

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(2, 2, &[
        2.0, -1.0,
        -1.0, 2.0]);
    assert_matrix_eq!(basis.ae, expected, comp = abs, tol = 1e-12);
    assert_matrix_eq!(&basis.ae * &basis.me, basis.de, comp = abs, tol = 1e-13);
}

#[test]
fn quadratic_slave_has_biorthogonal_dual_basis() {
    let nodes = [Vector2::new(2.0, 0.0), Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.05)];
    let normals = [Vector2::new(0.05, -1.0), Vector2::new(-0.05, -1.0), Vector2::new(0.0, -1.0)];
    let master = [Vector2::new(0.3, -0.2), Vector2::new(1.6, -0.2)];
    let segment = compute_segment(ElementFamily::Seg3, &nodes, &normals, ElementFamily::Seg2, &master)
        .unwrap()
        .unwrap();
    let table = QuadratureTable::new(None);
    let basis = compute_dual_basis(ElementFamily::Seg3, &nodes, &segment, table.rule(ElementFamily::Seg3), true);

    assert_eq!(basis.ae.shape(), (3, 3));
    assert_matrix_eq!(&basis.ae * &basis.me, basis.de, comp = abs, tol = 1e-12);
}

proptest! {
    #[test]
    fn dual_basis_is_biorthogonal_on_partial_overlaps(start in -0.9 .. 0.4f64, length in 1.0 .. 2.0f64) {
        let (nodes, normals) = unit_slave();
        let master = [Vector2::new(start, -0.1), Vector2::new(start + length, -0.1)];
        let segment = compute_segment(ElementFamily::Seg2, &nodes, &normals, ElementFamily::Seg2, &master)
            .unwrap()
            .unwrap();
        let table = QuadratureTable::new(None);
        let basis = compute_dual_basis(ElementFamily::Seg2, &nodes, &segment, table.rule(ElementFamily::Seg2), true);

        let residual = &basis.ae * &basis.me - &basis.de;
        prop_assert!(residual.amax() < 1e-12);
        // The multipliers remain a partition of unity on the segment
        for j in 0..2 {
            prop_assert!((basis.ae.column(j).sum() - 1.0).abs() < 1e-10);
        }
    }
}
