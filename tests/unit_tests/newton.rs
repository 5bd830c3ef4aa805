use crate::aligned_segments;
use matrixcompare::assert_scalar_eq;
use mortar::newton::{DenseLuSolve, NewtonDriver, UpdatePolicy};
use mortar::optimize::newton::NewtonSettings;
use mortar::problem::MortarProblem;
use mortar::settings::MortarSettings;
use nalgebra::{DMatrix, DVector, Vector2};

const STIFFNESS: f64 = 4.0;
const LOAD: f64 = 1.0;

const POLICIES: [UpdatePolicy; 3] = [
    UpdatePolicy::Total,
    UpdatePolicy::Incremental,
    UpdatePolicy::ForwardDiffCoupled,
];

/// Springs of stiffness `STIFFNESS` on every displacement dof and a vertical load on the slave nodes.
fn bulk_model(problem: &MortarProblem, slave_load: f64) -> DenseLuSolve {
    let n = problem.dofs().num_dofs();
    let mut load = DVector::zeros(n);
    for id in [0, 1] {
        let l = problem.dofs().local_index(id).unwrap();
        load[problem.dofs().displacement_dof(l, 1)] = slave_load;
    }
    DenseLuSolve::with_bulk(DMatrix::identity(n, n) * STIFFNESS, load)
}

fn driver(policy: UpdatePolicy) -> NewtonDriver {
    NewtonDriver::new(
        NewtonSettings {
            max_iterations: 10,
            tolerance: 1e-10,
        },
        policy,
    )
}

#[test]
fn update_policies_apply_solution_differently() {
    let du = DVector::from_column_slice(&[1.0, 2.0]);
    let dl = DVector::from_column_slice(&[3.0, 4.0]);
    let start = || (DVector::from_column_slice(&[10.0, 10.0]), DVector::from_column_slice(&[20.0, 20.0]));

    let (mut u, mut l) = start();
    UpdatePolicy::Total.apply_increment(&mut u, &mut l, &du, &dl);
    assert_eq!((u, l), (du.clone(), dl.clone()));

    let (mut u, mut l) = start();
    UpdatePolicy::Incremental.apply_increment(&mut u, &mut l, &du, &dl);
    assert_eq!(u, DVector::from_column_slice(&[11.0, 12.0]));
    assert_eq!(l, dl);

    let (mut u, mut l) = start();
    UpdatePolicy::ForwardDiffCoupled.apply_increment(&mut u, &mut l, &du, &dl);
    assert_eq!(u, DVector::from_column_slice(&[11.0, 12.0]));
    assert_eq!(l, DVector::from_column_slice(&[23.0, 24.0]));
}

#[test]
fn tied_springs_share_the_load_under_every_policy() {
    for policy in POLICIES {
        let mut problem = aligned_segments(MortarSettings::tie(), Vector2::zeros());
        let mut solver = bulk_model(&problem, LOAD);
        let summary = driver(policy).solve(&mut problem, &mut solver, 1.0).unwrap();
        assert!(summary.iterations <= 3, "{:?} took {} iterations", policy, summary.iterations);
        assert!(summary.active_set.is_empty());

        // k u_s + lambda / 2 = F, k u_m - lambda / 2 = 0, u_s = u_m
        for id in 0..4 {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.displacement[0], 0.0, comp = abs, tol = 1e-10);
            assert_scalar_eq!(node.displacement[1], LOAD / (2.0 * STIFFNESS), comp = abs, tol = 1e-10);
        }
        for id in [0, 1] {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.multiplier[1], LOAD, comp = abs, tol = 1e-10);
        }
    }
}

#[test]
fn pressed_contact_closes_and_carries_the_load_under_every_policy() {
    for policy in POLICIES {
        let mut problem = aligned_segments(MortarSettings::contact(), Vector2::zeros());
        let mut solver = bulk_model(&problem, -LOAD);
        let summary = driver(policy).solve(&mut problem, &mut solver, 1.0).unwrap();

        assert_eq!(summary.active_set.active_nodes().collect::<Vec<_>>(), vec![0, 1], "{:?}", policy);
        assert_eq!(summary.active_set.inactive_nodes().count(), 0);
        // The converged state reproduces its own partition
        assert_eq!(problem.active_set(&problem.unknowns()).unwrap(), summary.active_set);

        // Slave and master move together, each spring taking half of the load
        for id in 0..4 {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.displacement[1], -LOAD / (2.0 * STIFFNESS), comp = abs, tol = 1e-10);
        }
        for id in [0, 1] {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.multiplier[0], 0.0, comp = abs, tol = 1e-10);
            assert_scalar_eq!(node.multiplier[1], -LOAD, comp = abs, tol = 1e-10);
        }
    }
}

#[test]
fn pulled_contact_separates_under_every_policy() {
    for policy in POLICIES {
        let mut problem = aligned_segments(MortarSettings::contact(), Vector2::zeros());
        let mut solver = bulk_model(&problem, LOAD);
        let summary = driver(policy).solve(&mut problem, &mut solver, 1.0).unwrap();

        assert_eq!(summary.active_set.active_nodes().count(), 0, "{:?}", policy);
        assert_eq!(summary.active_set.inactive_nodes().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(problem.active_set(&problem.unknowns()).unwrap(), summary.active_set);

        for id in [0, 1] {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.displacement[1], LOAD / STIFFNESS, comp = abs, tol = 1e-10);
            assert_scalar_eq!(node.multiplier.norm(), 0.0, comp = abs, tol = 1e-10);
        }
        for id in [2, 3] {
            let node = problem.node(id).unwrap();
            assert_scalar_eq!(node.displacement.norm(), 0.0, comp = abs, tol = 1e-10);
        }
    }
}

#[test]
fn driver_reports_exhausted_iteration_budget() {
    let mut problem = aligned_segments(MortarSettings::tie(), Vector2::zeros());
    let mut solver = bulk_model(&problem, LOAD);
    let driver = NewtonDriver::new(
        NewtonSettings {
            max_iterations: 1,
            tolerance: 1e-10,
        },
        UpdatePolicy::ForwardDiffCoupled,
    );
    let err = driver.solve(&mut problem, &mut solver, 1.0).unwrap_err();
    assert!(err.to_string().contains("did not converge"));
}

#[test]
fn mismatched_bulk_model_is_rejected() {
    let mut problem = aligned_segments(MortarSettings::tie(), Vector2::zeros());
    let mut solver = DenseLuSolve::with_bulk(DMatrix::identity(2, 2), DVector::zeros(2));
    let err = NewtonDriver::default().solve(&mut problem, &mut solver, 1.0).unwrap_err();
    assert!(format!("{:?}", err).contains("Bulk stiffness"));
}
