//! Linearization of the mortar functional into sparse system blocks.
//!
//! The unknown vector `x = [u; lambda]` splits the Jacobian `J = dr/dx` of the residual
//! `[r_u; r_lambda]` into
//! ```text
//! J = [ J_uu  J_ul ]
//!     [ J_lu  J_ll ]
//! ```
//! from which the assembled system is `K = J_uu`, `C1 = J_ul^T`, `C2 = J_lu`, `D = J_ll`,
//! with right-hand sides `f = -r_u` and `g = -r_lambda`.
use crate::active_set::ActiveSet;
use crate::dual::{seed, Dual};
use crate::error::MortarError;
use crate::normals::{frame_values, NodalFrames};
use crate::problem::MortarProblem;
use crate::residual::evaluate_functional;
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Jacobian entries with a smaller magnitude are dropped from the sparse blocks.
pub const JACOBIAN_PRUNE_TOLERANCE: f64 = 1e-12;

/// Residual and dense Jacobian of the mortar functional at a point.
#[derive(Debug, Clone)]
pub struct Linearization {
    pub residual: DVector<f64>,
    pub jacobian: DMatrix<f64>,
    pub active_set: ActiveSet,
    pub frames: NodalFrames,
}

/// The assembled mortar system
/// ```text
/// [ K   C1^T ] [ du      ]   [ f ]
/// [ C2  D    ] [ dlambda ] = [ g ]
/// ```
#[derive(Debug, Clone)]
pub struct MortarAssembly {
    pub k: CsrMatrix<f64>,
    pub c1: CsrMatrix<f64>,
    pub c2: CsrMatrix<f64>,
    pub d: CsrMatrix<f64>,
    pub f: DVector<f64>,
    pub g: DVector<f64>,
    pub active_set: ActiveSet,
    pub frames: NodalFrames,
}

impl MortarAssembly {
    /// Number of displacement (equivalently, multiplier) degrees of freedom.
    pub fn num_dofs(&self) -> usize {
        self.f.len()
    }
}

/// Copies the block `J[rows, cols]` into a CSR matrix, dropping negligible entries.
///
/// With `transpose`, the block is stored transposed.
fn sparse_block(
    jacobian: &DMatrix<f64>,
    (row_offset, col_offset): (usize, usize),
    n: usize,
    transpose: bool,
) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    let block = jacobian.view((row_offset, col_offset), (n, n));
    for j in 0..n {
        for i in 0..n {
            let v = block[(i, j)];
            if v.abs() > JACOBIAN_PRUNE_TOLERANCE {
                if transpose {
                    coo.push(j, i, v);
                } else {
                    coo.push(i, j, v);
                }
            }
        }
    }
    CsrMatrix::from(&coo)
}

fn jacobian_from_rows(residual: &[Dual], num_unknowns: usize) -> DMatrix<f64> {
    let mut jacobian = DMatrix::zeros(residual.len(), num_unknowns);
    for (i, r_i) in residual.iter().enumerate() {
        // Constant rows keep an empty gradient
        if !r_i.gradient().is_empty() {
            jacobian.row_mut(i).tr_copy_from(r_i.gradient());
        }
    }
    jacobian
}

impl MortarProblem {
    /// Evaluates the residual and its exact Jacobian at `x` by forward differentiation.
    pub fn linearize(&self, x: &DVector<f64>) -> Result<Linearization, MortarError> {
        self.check_unknowns(x)?;
        let output = evaluate_functional(self, &seed(x))?;
        let residual = DVector::from_iterator(output.residual.len(), output.residual.iter().map(Dual::value));
        let jacobian = jacobian_from_rows(&output.residual, x.len());
        Ok(Linearization {
            residual,
            jacobian,
            active_set: output.active_set,
            frames: frame_values(&output.frames, self),
        })
    }

    /// Assembles the sparse system at the unknown vector `x` and records the nodal
    /// frames at `time`.
    pub fn assemble_at(&mut self, x: &DVector<f64>, time: f64) -> Result<MortarAssembly, MortarError> {
        let Linearization {
            residual,
            jacobian,
            active_set,
            frames,
        } = self.linearize(x)?;
        self.store_frames(&frames, time);

        let n = self.dofs().num_dofs();
        let k = sparse_block(&jacobian, (0, 0), n, false);
        let c1 = sparse_block(&jacobian, (0, n), n, true);
        let c2 = sparse_block(&jacobian, (n, 0), n, false);
        let d = sparse_block(&jacobian, (n, n), n, false);
        let f = -residual.rows(0, n).into_owned();
        let g = -residual.rows(n, n).into_owned();

        debug!(
            "Assembled mortar system: {} dofs, nnz(K) = {}, nnz(C1) = {}, nnz(C2) = {}, nnz(D) = {}, {} active nodes",
            n,
            k.nnz(),
            c1.nnz(),
            c2.nnz(),
            d.nnz(),
            active_set.active_nodes().count()
        );

        Ok(MortarAssembly {
            k,
            c1,
            c2,
            d,
            f,
            g,
            active_set,
            frames,
        })
    }

    /// Assembles the sparse system at the current nodal state.
    pub fn assemble(&mut self, time: f64) -> Result<MortarAssembly, MortarError> {
        let x = self.unknowns();
        self.assemble_at(&x, time)
    }
}
