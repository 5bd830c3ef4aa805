//! A reference Newton driver for small mortar problems.
//!
//! Every iteration assembles the mortar system at the current nodal state, solves the
//! coupled block system and updates the nodal state according to an [`UpdatePolicy`].
use crate::active_set::ActiveSet;
use crate::assembly::MortarAssembly;
use crate::problem::MortarProblem;
use eyre::{eyre, WrapErr};
use log::{debug, info};
use mortar_optimize::newton::NewtonSettings;
use nalgebra::{DMatrix, DVector, DVectorView};
use serde::{Deserialize, Serialize};

/// What the linear solve produces and how it is applied to the nodal state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdatePolicy {
    /// The solve yields total displacements and multipliers, which replace the current ones.
    Total,
    /// The solve yields a displacement increment and total multipliers:
    /// `u += du`, `lambda = dlambda`.
    Incremental,
    /// The solve yields increments of both: `u += du`, `lambda += dlambda`.
    ForwardDiffCoupled,
}

impl UpdatePolicy {
    /// Applies the solution of one linear solve to `(u, lambda)`.
    pub fn apply_increment(
        &self,
        u: &mut DVector<f64>,
        lambda: &mut DVector<f64>,
        du: &DVector<f64>,
        dlambda: &DVector<f64>,
    ) {
        match self {
            UpdatePolicy::Total => {
                u.copy_from(du);
                lambda.copy_from(dlambda);
            }
            UpdatePolicy::Incremental => {
                *u += du;
                lambda.copy_from(dlambda);
            }
            UpdatePolicy::ForwardDiffCoupled => {
                *u += du;
                *lambda += dlambda;
            }
        }
    }
}

/// Solves the coupled system
/// ```text
/// [ K   C1^T ] [ du      ]   [ f ]
/// [ C2  D    ] [ dlambda ] = [ g ]
/// ```
/// for the quantities the [`UpdatePolicy`] asks for, given the current state `(u, lambda)`.
pub trait LinearSolve {
    fn solve(
        &mut self,
        system: &MortarAssembly,
        u: DVectorView<f64>,
        lambda: DVectorView<f64>,
        policy: UpdatePolicy,
    ) -> eyre::Result<(DVector<f64>, DVector<f64>)>;
}

/// Dense LU solve of the coupled system, optionally with a linear bulk model.
///
/// The bulk model contributes `bulk_stiffness` to `K` and the residual
/// `bulk_stiffness * u - bulk_load` to the force balance.
#[derive(Debug, Clone, Default)]
pub struct DenseLuSolve {
    pub bulk_stiffness: Option<DMatrix<f64>>,
    pub bulk_load: Option<DVector<f64>>,
}

impl DenseLuSolve {
    pub fn with_bulk(stiffness: DMatrix<f64>, load: DVector<f64>) -> Self {
        Self {
            bulk_stiffness: Some(stiffness),
            bulk_load: Some(load),
        }
    }
}

impl LinearSolve for DenseLuSolve {
    fn solve(
        &mut self,
        system: &MortarAssembly,
        u: DVectorView<f64>,
        lambda: DVectorView<f64>,
        policy: UpdatePolicy,
    ) -> eyre::Result<(DVector<f64>, DVector<f64>)> {
        let n = system.num_dofs();
        let mut a = DMatrix::zeros(2 * n, 2 * n);
        let mut b = DVector::zeros(2 * n);

        a.view_mut((0, 0), (n, n)).copy_from(&DMatrix::from(&system.k));
        a.view_mut((0, n), (n, n))
            .copy_from(&DMatrix::from(&system.c1).transpose());
        a.view_mut((n, 0), (n, n)).copy_from(&DMatrix::from(&system.c2));
        a.view_mut((n, n), (n, n)).copy_from(&DMatrix::from(&system.d));
        b.rows_mut(0, n).copy_from(&system.f);
        b.rows_mut(n, n).copy_from(&system.g);

        if let Some(stiffness) = &self.bulk_stiffness {
            if stiffness.shape() != (n, n) {
                return Err(eyre!(
                    "Bulk stiffness has shape {:?}, expected ({}, {})",
                    stiffness.shape(),
                    n,
                    n
                ));
            }
            let mut k = a.view_mut((0, 0), (n, n));
            k += stiffness;
            let mut f = b.rows_mut(0, n);
            f -= stiffness * u;
        }
        if let Some(load) = &self.bulk_load {
            if load.len() != n {
                return Err(eyre!("Bulk load has length {}, expected {}", load.len(), n));
            }
            let mut f = b.rows_mut(0, n);
            f += load;
        }

        // Shift the right-hand side from increments to the quantities the policy solves for
        let mut state = DVector::zeros(2 * n);
        match policy {
            UpdatePolicy::Total => {
                state.rows_mut(0, n).copy_from(&u);
                state.rows_mut(n, n).copy_from(&lambda);
            }
            UpdatePolicy::Incremental => state.rows_mut(n, n).copy_from(&lambda),
            UpdatePolicy::ForwardDiffCoupled => {}
        }
        b += &a * state;

        let solution = a
            .lu()
            .solve(&b)
            .ok_or_else(|| eyre!("Coupled mortar system is singular"))?;
        Ok((solution.rows(0, n).into_owned(), solution.rows(n, n).into_owned()))
    }
}

/// Outcome of a converged Newton solve.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub iterations: usize,
    /// Norm of the last state change `(du, dlambda)`.
    pub increment_norm: f64,
    pub active_set: ActiveSet,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NewtonDriver {
    /// Convergence is declared once the norm of the state change drops below the tolerance.
    pub settings: NewtonSettings<f64>,
    pub policy: UpdatePolicy,
}

impl Default for NewtonDriver {
    fn default() -> Self {
        Self {
            settings: NewtonSettings {
                max_iterations: 25,
                tolerance: 1e-10,
            },
            policy: UpdatePolicy::ForwardDiffCoupled,
        }
    }
}

impl NewtonDriver {
    pub fn new(settings: NewtonSettings<f64>, policy: UpdatePolicy) -> Self {
        Self { settings, policy }
    }

    /// Drives the mortar residual (plus the solver's bulk model) to zero, starting from the
    /// current nodal state of `problem`.
    ///
    /// The converged state is written back into `problem` with snapshots at `time`.
    pub fn solve(
        &self,
        problem: &mut MortarProblem,
        solver: &mut impl LinearSolve,
        time: f64,
    ) -> eyre::Result<SolveSummary> {
        let n = problem.dofs().num_dofs();
        let x = problem.unknowns();
        let mut u = x.rows(0, n).into_owned();
        let mut lambda = x.rows(n, n).into_owned();
        let mut increment_norm = f64::INFINITY;

        for iteration in 0..self.settings.max_iterations {
            let system = problem
                .assemble(time)
                .wrap_err_with(|| format!("Failed to assemble mortar system in Newton iteration {}", iteration))?;
            let (du, dlambda) = solver
                .solve(&system, u.as_view(), lambda.as_view(), self.policy)
                .wrap_err_with(|| format!("Linear solve failed in Newton iteration {}", iteration))?;

            let (u_prev, lambda_prev) = (u.clone(), lambda.clone());
            self.policy.apply_increment(&mut u, &mut lambda, &du, &dlambda);
            let change_u = (&u - u_prev).norm_squared();
            let change_lambda = (&lambda - lambda_prev).norm_squared();
            increment_norm = (change_u + change_lambda).sqrt();

            let mut x = DVector::zeros(2 * n);
            x.rows_mut(0, n).copy_from(&u);
            x.rows_mut(n, n).copy_from(&lambda);
            problem.set_unknowns(&x, time)?;

            debug!(
                "Newton iteration {}: |(du, dlambda)| = {:e}, |f| = {:e}, |g| = {:e}",
                iteration,
                increment_norm,
                system.f.norm(),
                system.g.norm()
            );

            if increment_norm < self.settings.tolerance {
                info!("Mortar Newton solve converged after {} iterations", iteration + 1);
                let active_set = problem.active_set(&x)?;
                return Ok(SolveSummary {
                    iterations: iteration + 1,
                    increment_norm,
                    active_set,
                });
            }
        }

        Err(eyre!(
            "Mortar Newton solve did not converge within {} iterations (last increment norm {:e})",
            self.settings.max_iterations,
            increment_norm
        ))
    }
}
