//! Contact point projection between slave and master elements.
//!
//! Both projectors solve a scalar equation in the parametric coordinate of the target element
//! with Newton's method, starting from `xi = 0`. The differentiable variants solve on values
//! and then recover the sensitivity of the root from the implicit-function theorem: at a
//! root of `R(xi; p) = 0`,
//! ```text
//! d xi / d p = -(dR/d xi)^-1 dR/d p,
//! ```
//! so no derivatives of the Newton iterates are needed.
use crate::dual::{lift_vector, vector_values, Dual};
use crate::element::ElementFamily;
use crate::geometry::{cross2, interpolate};
use mortar_optimize::newton::{newton_scalar, NewtonError, NewtonSettings};
use nalgebra::Vector2;
use std::error::Error;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionKind {
    MasterToSlave,
    SlaveToMaster,
}

/// A converged projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub xi: f64,
    pub iterations: usize,
}

/// A failed projection, together with the inputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionError {
    pub kind: ProjectionKind,
    /// The point being projected.
    pub point: Vector2<f64>,
    /// Nodal coordinates of the element projected onto.
    pub nodes: Vec<Vector2<f64>>,
    /// Nodal normals (master to slave) or the fixed normal (slave to master).
    pub normals: Vec<Vector2<f64>>,
    pub failure: NewtonError<f64>,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} projection of point ({}, {}) failed: {}",
            self.kind, self.point[0], self.point[1], self.failure
        )
    }
}

impl Error for ProjectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.failure)
    }
}

fn weighted_sum(weights: &nalgebra::DVector<f64>, values: &[Vector2<f64>]) -> Vector2<f64> {
    interpolate(weights.as_slice(), values)
}

/// Finds `xi` on the slave element such that `x_s(xi) - target` is parallel to the
/// interpolated slave normal `n_s(xi)`.
pub fn project_master_to_slave(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<f64>],
    slave_normals: &[Vector2<f64>],
    target: &Vector2<f64>,
) -> Result<Projection, ProjectionError> {
    let residual = |xi: f64| {
        let n = slave_family.basis(xi);
        let dn = slave_family.basis_derivative(xi);
        let x = weighted_sum(&n, slave_nodes);
        let dx = weighted_sum(&dn, slave_nodes);
        let normal = weighted_sum(&n, slave_normals);
        let dnormal = weighted_sum(&dn, slave_normals);
        let r = cross2(&(x - target), &normal);
        let dr = cross2(&dx, &normal) + cross2(&(x - target), &dnormal);
        (r, dr)
    };

    newton_scalar(residual, 0.0, NewtonSettings::projection())
        .map(|result| Projection {
            xi: result.root,
            iterations: result.iterations,
        })
        .map_err(|failure| ProjectionError {
            kind: ProjectionKind::MasterToSlave,
            point: *target,
            nodes: slave_nodes.to_vec(),
            normals: slave_normals.to_vec(),
            failure,
        })
}

/// Finds `xi` on the master element such that `point - x_m(xi)` is parallel to the fixed
/// `normal`.
pub fn project_slave_to_master(
    master_family: ElementFamily,
    master_nodes: &[Vector2<f64>],
    point: &Vector2<f64>,
    normal: &Vector2<f64>,
) -> Result<Projection, ProjectionError> {
    let residual = |xi: f64| {
        let x = weighted_sum(&master_family.basis(xi), master_nodes);
        let dx = weighted_sum(&master_family.basis_derivative(xi), master_nodes);
        (cross2(&(x - point), normal), cross2(&dx, normal))
    };

    newton_scalar(residual, 0.0, NewtonSettings::projection())
        .map(|result| Projection {
            xi: result.root,
            iterations: result.iterations,
        })
        .map_err(|failure| ProjectionError {
            kind: ProjectionKind::SlaveToMaster,
            point: *point,
            nodes: master_nodes.to_vec(),
            normals: vec![*normal],
            failure,
        })
}

fn constant_weights(weights: &nalgebra::DVector<f64>) -> Vec<Dual> {
    weights.iter().copied().map(Dual::constant).collect()
}

/// The root as a dual number: value `xi`, gradient `-grad(R) / R'(xi)`.
fn implicit_root(xi: f64, residual: &Dual, d_residual_d_xi: f64) -> Dual {
    Dual::from_parts(xi, residual.gradient() * (-1.0 / d_residual_d_xi))
}

/// Differentiable [`project_master_to_slave`].
pub fn project_master_to_slave_dual(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<Dual>],
    slave_normals: &[Vector2<Dual>],
    target: &Vector2<Dual>,
) -> Result<Dual, ProjectionError> {
    let node_values: Vec<_> = slave_nodes.iter().map(vector_values).collect();
    let normal_values: Vec<_> = slave_normals.iter().map(vector_values).collect();
    let projection = project_master_to_slave(slave_family, &node_values, &normal_values, &vector_values(target))?;
    let xi = projection.xi;

    // Residual at the converged root with xi held fixed: its gradient is dR/dp
    let n = constant_weights(&slave_family.basis(xi));
    let x = interpolate(&n, slave_nodes);
    let normal = interpolate(&n, slave_normals);
    let residual = cross2(&(x - target), &normal);

    let dn = slave_family.basis_derivative(xi);
    let x_value = weighted_sum(&slave_family.basis(xi), &node_values);
    let dr_dxi = cross2(&weighted_sum(&dn, &node_values), &vector_values(&normal))
        + cross2(&(x_value - vector_values(target)), &weighted_sum(&dn, &normal_values));

    Ok(implicit_root(xi, &residual, dr_dxi))
}

/// Differentiable [`project_slave_to_master`].
pub fn project_slave_to_master_dual(
    master_family: ElementFamily,
    master_nodes: &[Vector2<Dual>],
    point: &Vector2<Dual>,
    normal: &Vector2<Dual>,
) -> Result<Dual, ProjectionError> {
    let node_values: Vec<_> = master_nodes.iter().map(vector_values).collect();
    let normal_value = vector_values(normal);
    let projection = project_slave_to_master(master_family, &node_values, &vector_values(point), &normal_value)?;
    let xi = projection.xi;

    let x = interpolate(&constant_weights(&master_family.basis(xi)), master_nodes);
    let residual = cross2(&(x - point), normal);
    let dr_dxi = cross2(
        &weighted_sum(&master_family.basis_derivative(xi), &node_values),
        &normal_value,
    );

    Ok(implicit_root(xi, &residual, dr_dxi))
}

/// Lifts plain coordinates to constant duals.
pub(crate) fn lift_all(values: &[Vector2<f64>]) -> Vec<Vector2<Dual>> {
    values.iter().map(lift_vector).collect()
}
