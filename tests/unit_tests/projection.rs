use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mortar::dual::{seed, Dual};
use mortar::element::ElementFamily;
use mortar::optimize::newton::NewtonError;
use mortar::projection::{
    project_master_to_slave, project_master_to_slave_dual, project_slave_to_master, project_slave_to_master_dual,
    ProjectionKind,
};
use nalgebra::{DVector, Vector2};
use util::gradient_fd;

fn vectors(p: &[f64]) -> Vec<Vector2<f64>> {
    p.chunks(2).map(|c| Vector2::new(c[0], c[1])).collect()
}

fn dual_vectors(p: &[Dual]) -> Vec<Vector2<Dual>> {
    p.chunks(2).map(|c| Vector2::new(c[0].clone(), c[1].clone())).collect()
}

#[test]
fn slave_point_projects_onto_straight_master_in_one_step() {
    let master = [Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0)];
    let point = Vector2::new(0.5, 1.0);
    let normal = Vector2::new(0.0, -1.0);
    let projection = project_slave_to_master(ElementFamily::Seg2, &master, &point, &normal).unwrap();
    assert_scalar_eq!(projection.xi, -0.5, comp = abs, tol = 1e-14);
    assert_eq!(projection.iterations, 1);
}

#[test]
fn master_point_projects_along_constant_slave_normals() {
    let slave = [Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0)];
    let normals = [Vector2::new(0.0, 1.0), Vector2::new(0.0, 1.0)];
    let target = Vector2::new(0.5, 0.3);
    let projection = project_master_to_slave(ElementFamily::Seg2, &slave, &normals, &target).unwrap();
    assert_scalar_eq!(projection.xi, -0.5, comp = abs, tol = 1e-14);
    assert_eq!(projection.iterations, 1);
}

#[test]
fn master_node_on_slave_surface_projects_in_one_step() {
    let slave = [Vector2::new(2.0, 1.0), Vector2::new(0.0, 0.0)];
    let normal = Vector2::new(0.5, -1.0).normalize();
    let normals = [normal, normal];
    // x_s(xi) = (1 - xi, (1 - xi) / 2), so (1.5, 0.75) sits at xi = -0.5
    let target = Vector2::new(1.5, 0.75);
    let projection = project_master_to_slave(ElementFamily::Seg2, &slave, &normals, &target).unwrap();
    assert_scalar_eq!(projection.xi, -0.5, comp = abs, tol = 1e-14);
    assert_eq!(projection.iterations, 1);
}

#[test]
fn points_outside_the_element_give_coordinates_outside_reference_interval() {
    let master = [Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)];
    let projection = project_slave_to_master(
        ElementFamily::Seg2,
        &master,
        &Vector2::new(3.0, 0.5),
        &Vector2::new(0.0, -1.0),
    )
    .unwrap();
    assert_scalar_eq!(projection.xi, 5.0, comp = abs, tol = 1e-12);
}

#[test]
fn projection_along_the_master_tangent_fails() {
    let master = [Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0)];
    let point = Vector2::new(0.5, 1.0);
    let normal = Vector2::new(1.0, 0.0);
    let err = project_slave_to_master(ElementFamily::Seg2, &master, &point, &normal).unwrap_err();
    assert_eq!(err.kind, ProjectionKind::SlaveToMaster);
    assert_eq!(err.point, point);
    assert_eq!(err.nodes, master.to_vec());
    assert!(matches!(err.failure, NewtonError::SingularDerivative { .. }));
}

#[rustfmt::skip]
fn curved_slave_parameters() -> DVector<f64> {
    DVector::from_column_slice(&[
        // Seg3 nodes: end points first, then the midpoint
        -1.0, 0.0,   1.0, 0.1,   0.0, 0.25,
        // nodal normals
        0.15, 1.0,   -0.1, 1.0,   0.02, 1.0,
        // master node to project
        0.2, 0.8,
    ])
}

#[test]
fn master_to_slave_sensitivity_matches_finite_differences() {
    let family = ElementFamily::Seg3;
    let project = |p: &DVector<f64>| {
        let p = p.as_slice();
        let nodes = vectors(&p[0..6]);
        let normals = vectors(&p[6..12]);
        let target = Vector2::new(p[12], p[13]);
        project_master_to_slave(family, &nodes, &normals, &target).unwrap().xi
    };

    let p = curved_slave_parameters();
    let dual = seed(&p);
    let nodes = dual_vectors(&dual[0..6]);
    let normals = dual_vectors(&dual[6..12]);
    let target = Vector2::new(dual[12].clone(), dual[13].clone());
    let xi = project_master_to_slave_dual(family, &nodes, &normals, &target).unwrap();

    assert_scalar_eq!(xi.value(), project(&p), comp = abs, tol = 1e-14);
    let fd_gradient = gradient_fd(project, &p, 1e-6);
    assert_matrix_eq!(xi.gradient().clone(), fd_gradient, comp = abs, tol = 1e-7);
}

#[test]
fn slave_to_master_sensitivity_matches_finite_differences() {
    let family = ElementFamily::Seg3;
    let project = |p: &DVector<f64>| {
        let p = p.as_slice();
        let nodes = vectors(&p[0..6]);
        let point = Vector2::new(p[6], p[7]);
        let normal = Vector2::new(p[8], p[9]);
        project_slave_to_master(family, &nodes, &point, &normal).unwrap().xi
    };

    #[rustfmt::skip]
    let p = DVector::from_column_slice(&[
        -1.0, -0.2,   1.0, -0.1,   0.1, -0.3,
        0.3, 0.4,
        0.05, -1.0,
    ]);
    let dual = seed(&p);
    let nodes = dual_vectors(&dual[0..6]);
    let point = Vector2::new(dual[6].clone(), dual[7].clone());
    let normal = Vector2::new(dual[8].clone(), dual[9].clone());
    let xi = project_slave_to_master_dual(family, &nodes, &point, &normal).unwrap();

    let fd_gradient = gradient_fd(project, &p, 1e-6);
    assert_matrix_eq!(xi.gradient().clone(), fd_gradient, comp = abs, tol = 1e-7);
}
