//! Nodal normal and tangent fields on the deformed slave surface.
use crate::dual::{normalize, vector_values, Dual};
use crate::element::Element;
use crate::error::MortarError;
use crate::fields::Field;
use crate::geometry::{interpolate, rotate_quarter};
use crate::problem::{InterfaceTopology, MortarProblem};
use crate::quadrature::QuadratureTable;
use crate::settings::{MortarSettings, TangentPolicy};
use nalgebra::Vector2;
use std::collections::BTreeMap;

/// Unit normal and tangent at a slave node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodalFrame<T: nalgebra::Scalar> {
    pub normal: Vector2<T>,
    pub tangent: Vector2<T>,
}

/// Nodal frames keyed by node id.
pub type NodalFrames = BTreeMap<usize, NodalFrame<f64>>;

/// Accumulated tangents shorter than this are considered degenerate.
const TANGENT_TOLERANCE: f64 = 1e-14;

/// Unnormalized tangent `dx/dxi` of one slave element under the given policy.
fn element_tangent(
    element: &Element,
    positions: &[Vector2<Dual>],
    policy: TangentPolicy,
    quadrature: &QuadratureTable,
) -> Vector2<Dual> {
    let family = element.family();
    let tangent_at = |xi: f64| {
        let dn: Vec<Dual> = family
            .basis_derivative(xi)
            .iter()
            .copied()
            .map(Dual::constant)
            .collect();
        interpolate(&dn, positions)
    };

    match policy {
        TangentPolicy::Midpoint => tangent_at(0.0),
        TangentPolicy::Integrated => {
            let (weights, points) = quadrature.rule(family);
            let mut tangent = Vector2::zeros();
            for (w, xi) in weights.iter().zip(points) {
                tangent += tangent_at(*xi).map(|t| t * *w);
            }
            tangent
        }
    }
}

/// Computes the differentiable nodal frames of all slave nodes.
///
/// The result is indexed by local node index and is `None` for nodes that belong to no
/// slave element.
pub(crate) fn compute_nodal_frames(
    topology: &InterfaceTopology,
    slave_elements: &[Element],
    positions: &[Vector2<Dual>],
    settings: &MortarSettings,
    quadrature: &QuadratureTable,
) -> Result<Vec<Option<NodalFrame<Dual>>>, MortarError> {
    let element_tangents: Vec<Vector2<Dual>> = slave_elements
        .iter()
        .zip(&topology.slave_connectivity)
        .map(|(element, connectivity)| {
            let element_positions: Vec<_> = connectivity.iter().map(|&l| positions[l].clone()).collect();
            element_tangent(element, &element_positions, settings.tangent_policy, quadrature)
        })
        .collect();

    topology
        .node_slave_elements
        .iter()
        .enumerate()
        .map(|(local, incident)| {
            if incident.is_empty() {
                return Ok(None);
            }
            let mut tangent = Vector2::zeros();
            for &e in incident {
                tangent += &element_tangents[e];
            }
            let tangent = normalize(&tangent, TANGENT_TOLERANCE).ok_or_else(|| {
                MortarError::GeometricDegeneracy(format!(
                    "Tangents of the slave elements around local node {} cancel out",
                    local
                ))
            })?;
            let mut normal = rotate_quarter(&tangent);
            if settings.rotate_normals {
                normal = -normal;
            }
            Ok(Some(NodalFrame { normal, tangent }))
        })
        .collect()
}

pub(crate) fn frame_values(frames: &[Option<NodalFrame<Dual>>], problem: &MortarProblem) -> NodalFrames {
    frames
        .iter()
        .enumerate()
        .filter_map(|(local, frame)| {
            frame.as_ref().map(|frame| {
                let value = NodalFrame {
                    normal: vector_values(&frame.normal),
                    tangent: vector_values(&frame.tangent),
                };
                (problem.dofs().node_id(local), value)
            })
        })
        .collect()
}

impl MortarProblem {
    /// Writes nodal normals and tangents as `Normal`/`Tangent` snapshots on every slave element.
    pub fn store_frames(&mut self, frames: &NodalFrames, time: f64) {
        for element in self.slave_elements_mut() {
            let (normals, tangents): (Vec<_>, Vec<_>) = element
                .connectivity()
                .iter()
                .filter_map(|id| frames.get(id))
                .map(|frame| (frame.normal, frame.tangent))
                .unzip();
            element.fields_mut().insert(Field::Normal, time, normals);
            element.fields_mut().insert(Field::Tangent, time, tangents);
        }
    }

    /// Computes the nodal frames of the deformed slave surface for the unknown vector `x`.
    pub fn nodal_frames(&self, x: &nalgebra::DVector<f64>) -> Result<NodalFrames, MortarError> {
        self.check_unknowns(x)?;
        let positions: Vec<Vector2<Dual>> = self
            .nodes()
            .iter()
            .enumerate()
            .map(|(local, node)| {
                let u = Vector2::new(
                    x[self.dofs().displacement_dof(local, 0)],
                    x[self.dofs().displacement_dof(local, 1)],
                );
                (node.reference.coords + u).map(Dual::constant)
            })
            .collect();
        let quadrature = QuadratureTable::new(self.settings().quadrature_order);
        let frames = compute_nodal_frames(
            self.topology(),
            self.slave_elements(),
            &positions,
            self.settings(),
            &quadrature,
        )?;
        Ok(frame_values(&frames, self))
    }

    /// Updates the normal field for the current nodal state and stores it at `time`.
    pub fn update_frames(&mut self, time: f64) -> Result<NodalFrames, MortarError> {
        let frames = self.nodal_frames(&self.unknowns())?;
        self.store_frames(&frames, time);
        Ok(frames)
    }
}
