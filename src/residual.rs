//! The mortar residual functional.
//!
//! The functional maps an unknown vector `x = [u; lambda]` to `[r_u; r_lambda]`, where `r_u`
//! collects the interface forces transferred by the multiplier and `r_lambda` the tying or
//! contact constraints. It is evaluated on [`Dual`] numbers, so one evaluation on seeded
//! unknowns yields the residual together with its exact Jacobian.
use crate::active_set::{contact_rows, ActiveSet, ContactState};
use crate::dual::{constants, lift_vector, vector_values, Dual};
use crate::error::MortarError;
use crate::geometry::interpolate;
use crate::normals::{compute_nodal_frames, NodalFrame};
use crate::problem::{MortarProblem, FIELD_DIM};
use crate::projection::{project_slave_to_master_dual, ProjectionError};
use crate::quadrature::QuadratureTable;
use crate::segmentation::{compute_dual_basis_dual, compute_segment_dual, slave_jacobian};
use crate::settings::{FailureAction, InterfaceVariant};
use itertools::izip;
use log::{debug, error};
use nalgebra::{DVector, Vector2};
use num::Zero;
use rayon::prelude::*;

pub(crate) struct FunctionalOutput {
    pub residual: Vec<Dual>,
    pub active_set: ActiveSet,
    pub frames: Vec<Option<NodalFrame<Dual>>>,
}

/// Contributions of one slave/master pair, keyed by local node index.
#[derive(Debug, Default)]
struct PairContribution {
    forces: Vec<(usize, Vector2<Dual>)>,
    ties: Vec<(usize, Vector2<Dual>)>,
    normal_gaps: Vec<(usize, Dual)>,
}

/// Per-evaluation nodal state, indexed by local node index.
struct TrialState<'a> {
    problem: &'a MortarProblem,
    references: Vec<Vector2<f64>>,
    displacements: Vec<Vector2<Dual>>,
    positions: Vec<Vector2<Dual>>,
    multipliers: Vec<Vector2<Dual>>,
    frames: Vec<Option<NodalFrame<Dual>>>,
    quadrature: QuadratureTable,
}

fn gather<T: Clone>(connectivity: &[usize], values: &[T]) -> Vec<T> {
    connectivity.iter().map(|&l| values[l].clone()).collect()
}

fn midpoint(nodes: &[Vector2<Dual>], endpoints: [usize; 2]) -> Vector2<f64> {
    (vector_values(&nodes[endpoints[0]]) + vector_values(&nodes[endpoints[1]])) * 0.5
}

impl<'a> TrialState<'a> {
    fn new(problem: &'a MortarProblem, x: &[Dual]) -> Result<Self, MortarError> {
        let dofs = problem.dofs();
        let nodal = |dof: &dyn Fn(usize, usize) -> usize| -> Vec<Vector2<Dual>> {
            (0..dofs.num_nodes())
                .map(|l| Vector2::new(x[dof(l, 0)].clone(), x[dof(l, 1)].clone()))
                .collect()
        };
        let displacements = nodal(&|l, c| dofs.displacement_dof(l, c));
        let multipliers = nodal(&|l, c| dofs.multiplier_dof(l, c));
        let references: Vec<Vector2<f64>> = problem.nodes().iter().map(|node| node.reference.coords).collect();
        let positions: Vec<Vector2<Dual>> = displacements
            .iter()
            .zip(&references)
            .map(|(u, reference)| u.zip_map(reference, |u_i, x_i| u_i + x_i))
            .collect();

        let quadrature = QuadratureTable::new(problem.settings().quadrature_order);
        let frames = compute_nodal_frames(
            problem.topology(),
            problem.slave_elements(),
            &positions,
            problem.settings(),
            &quadrature,
        )?;

        Ok(Self {
            problem,
            references,
            displacements,
            positions,
            multipliers,
            frames,
            quadrature,
        })
    }

    fn projection_failure(
        &self,
        slave_element: usize,
        master_element: usize,
        error: ProjectionError,
        action: FailureAction,
    ) -> Result<Option<PairContribution>, MortarError> {
        match action {
            FailureAction::SkipPair => {
                debug!(
                    "Skipping slave element {} / master element {}: {}",
                    slave_element, master_element, error
                );
                Ok(None)
            }
            FailureAction::Abort => {
                error!(
                    "Projection failed for slave element {} / master element {}. \
                     Point: {:?}, element nodes: {:?}, normals: {:?}, Newton: {:?}",
                    slave_element, master_element, error.point, error.nodes, error.normals, error.failure
                );
                Err(MortarError::NonConvergence {
                    slave_element,
                    master_element,
                    error,
                })
            }
        }
    }

    fn integrate_pair(&self, s: usize, m: usize) -> Result<Option<PairContribution>, MortarError> {
        let problem = self.problem;
        let settings = problem.settings();
        let topology = problem.topology();
        let slave_family = problem.slave_elements()[s].family();
        let master_family = problem.master_elements()[m].family();
        let slave_connectivity = &topology.slave_connectivity[s];
        let master_connectivity = &topology.master_connectivity[m];

        let xs = gather(slave_connectivity, &self.positions);
        let xm = gather(master_connectivity, &self.positions);

        if let Some(maximum_distance) = settings.maximum_distance {
            let distance = (midpoint(&xs, slave_family.endpoint_indices())
                - midpoint(&xm, master_family.endpoint_indices()))
            .norm();
            if distance > maximum_distance {
                debug!(
                    "Culling slave element {} / master element {} at distance {}",
                    s, m, distance
                );
                return Ok(None);
            }
        }

        let slave_normals: Vec<Vector2<Dual>> = slave_connectivity
            .iter()
            .map(|&l| {
                self.frames[l]
                    .as_ref()
                    .map(|frame| frame.normal.clone())
                    .expect("Every slave node carries a nodal frame")
            })
            .collect();

        let policy = settings.failure_policy();
        let segment = match compute_segment_dual(slave_family, &xs, &slave_normals, master_family, &xm) {
            Ok(Some(segment)) => segment,
            Ok(None) => return Ok(None),
            Err(error) => return self.projection_failure(s, m, error, policy.segmentation),
        };

        let rule = self.quadrature.rule(slave_family);
        let basis = compute_dual_basis_dual(slave_family, &xs, &segment, rule, settings.dual_basis);

        let ns = slave_family.num_nodes();
        let nm = master_family.num_nodes();
        let lambda = gather(slave_connectivity, &self.multipliers);
        let us = gather(slave_connectivity, &self.displacements);
        let um = gather(master_connectivity, &self.displacements);
        let reference_s: Vec<_> = gather(slave_connectivity, &self.references)
            .iter()
            .map(lift_vector)
            .collect();
        let reference_m: Vec<_> = gather(master_connectivity, &self.references)
            .iter()
            .map(lift_vector)
            .collect();

        let mut slave_forces = vec![Vector2::<Dual>::zeros(); ns];
        let mut master_forces = vec![Vector2::<Dual>::zeros(); nm];
        let mut ties = vec![Vector2::<Dual>::zeros(); ns];
        let mut gaps = vec![Dual::zero(); ns];

        let (weights, points) = rule;
        for (w, s_point) in izip!(weights, points) {
            let xi_s = segment.map(*s_point);
            let n1 = slave_family.basis_dual(&xi_s);
            let phi: Vec<Dual> = (&basis.ae * DVector::from_column_slice(&n1))
                .iter()
                .cloned()
                .collect();
            let weight = slave_jacobian(slave_family, &xs, &xi_s) * &segment.half_length * *w;

            let x_s = interpolate(&n1, &xs);
            let n_s = interpolate(&n1, &slave_normals);
            let xi_m = match project_slave_to_master_dual(master_family, &xm, &x_s, &n_s) {
                Ok(xi_m) => xi_m,
                Err(error) => return self.projection_failure(s, m, error, policy.integration),
            };
            let n2 = master_family.basis_dual(&xi_m);
            let x_m = interpolate(&n2, &xm);

            let traction = interpolate(&phi, &lambda).map(|l| l * &weight);
            for (force, n1_i) in slave_forces.iter_mut().zip(&n1) {
                *force += traction.map(|t| t * n1_i);
            }
            for (force, n2_k) in master_forces.iter_mut().zip(&n2) {
                *force -= traction.map(|t| t * n2_k);
            }

            match settings.variant {
                InterfaceVariant::Tie => {
                    let mut jump = interpolate(&n1, &us) - interpolate(&n2, &um);
                    if settings.adjust {
                        jump += interpolate(&n1, &reference_s) - interpolate(&n2, &reference_m);
                    }
                    for (tie, phi_j) in ties.iter_mut().zip(&phi) {
                        let w_phi = &weight * phi_j;
                        *tie += jump.map(|c| c * &w_phi);
                    }
                }
                InterfaceVariant::Contact => {
                    let gap = n_s.dot(&(x_s - x_m)) * settings.gap_sign;
                    let w_gap = &gap * &weight;
                    for (g, phi_j) in gaps.iter_mut().zip(&phi) {
                        *g += &w_gap * phi_j;
                    }
                }
            }
        }

        let mut contribution = PairContribution::default();
        contribution
            .forces
            .extend(slave_connectivity.iter().copied().zip(slave_forces));
        contribution
            .forces
            .extend(master_connectivity.iter().copied().zip(master_forces));
        match settings.variant {
            InterfaceVariant::Tie => contribution.ties.extend(slave_connectivity.iter().copied().zip(ties)),
            InterfaceVariant::Contact => contribution
                .normal_gaps
                .extend(slave_connectivity.iter().copied().zip(gaps)),
        }
        Ok(Some(contribution))
    }
}

/// Evaluates the residual functional at the (possibly seeded) unknowns `x`.
pub(crate) fn evaluate_functional(problem: &MortarProblem, x: &[Dual]) -> Result<FunctionalOutput, MortarError> {
    if x.len() != problem.num_unknowns() {
        return Err(MortarError::Configuration(format!(
            "Unknown vector has length {}, expected {}",
            x.len(),
            problem.num_unknowns()
        )));
    }

    let state = TrialState::new(problem, x)?;
    let pairs: Vec<(usize, usize)> = problem.pairing().pairs().collect();
    let contributions = pairs
        .par_iter()
        .map(|&(s, m)| state.integrate_pair(s, m))
        .collect::<Result<Vec<_>, _>>()?;

    let num_nodes = problem.dofs().num_nodes();
    let mut forces = vec![Vector2::<Dual>::zeros(); num_nodes];
    let mut ties = vec![Vector2::<Dual>::zeros(); num_nodes];
    let mut gaps = vec![Dual::zero(); num_nodes];
    let mut touched = vec![false; num_nodes];

    for contribution in contributions.into_iter().flatten() {
        for (l, force) in contribution.forces {
            forces[l] += force;
        }
        for (l, tie) in contribution.ties {
            ties[l] += tie;
            touched[l] = true;
        }
        for (l, gap) in contribution.normal_gaps {
            gaps[l] += gap;
            touched[l] = true;
        }
    }

    let dofs = problem.dofs();
    let settings = problem.settings();
    let topology = problem.topology();
    let mut residual = vec![Dual::zero(); problem.num_unknowns()];
    let mut active_set = ActiveSet::default();

    for l in 0..num_nodes {
        let lambda = &state.multipliers[l];
        let id = dofs.node_id(l);
        let rows = match settings.variant {
            InterfaceVariant::Tie if touched[l] => [ties[l][0].clone(), ties[l][1].clone()],
            InterfaceVariant::Contact if topology.is_slave_node(l) => {
                let frozen = settings.always_inactive.contains(&id);
                let (rows, contact_state) = if touched[l] || frozen {
                    let frame = state.frames[l]
                        .as_ref()
                        .expect("Every slave node carries a nodal frame");
                    contact_rows(frozen, &gaps[l], lambda, frame)
                } else {
                    ([lambda[0].clone(), lambda[1].clone()], ContactState::Inactive)
                };
                active_set.insert(id, contact_state);
                rows
            }
            // Nodes outside the mortar coupling: multiplier = 0
            _ => [lambda[0].clone(), lambda[1].clone()],
        };

        for c in 0..FIELD_DIM {
            residual[dofs.displacement_dof(l, c)] = forces[l][c].clone();
        }
        for (c, row) in rows.into_iter().enumerate() {
            residual[dofs.multiplier_dof(l, c)] = row;
        }
    }

    Ok(FunctionalOutput {
        residual,
        active_set,
        frames: state.frames,
    })
}

impl MortarProblem {
    /// Value of the residual functional `[r_u; r_lambda]` at the unknown vector `x`.
    pub fn residual(&self, x: &DVector<f64>) -> Result<DVector<f64>, MortarError> {
        self.check_unknowns(x)?;
        let output = evaluate_functional(self, &constants(x))?;
        Ok(DVector::from_iterator(
            output.residual.len(),
            output.residual.iter().map(Dual::value),
        ))
    }

    /// Contact state of every slave node at the unknown vector `x`.
    ///
    /// Empty for tied interfaces.
    pub fn active_set(&self, x: &DVector<f64>) -> Result<ActiveSet, MortarError> {
        self.check_unknowns(x)?;
        Ok(evaluate_functional(self, &constants(x))?.active_set)
    }
}
