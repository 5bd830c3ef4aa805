//! Mortar assembly for two-dimensional mesh tying and frictionless contact.
//!
//! A [`MortarProblem`](problem::MortarProblem) couples a slave and a master line surface
//! through a Lagrange multiplier field on the slave side. Assembly evaluates the mortar
//! residual on forward-mode [`Dual`](dual::Dual) numbers and splits its exact Jacobian into the
//! sparse blocks of [`MortarAssembly`](assembly::MortarAssembly).
pub mod active_set;
pub mod assembly;
pub mod dual;
pub mod element;
pub mod error;
pub mod fields;
pub mod geometry;
pub mod newton;
pub mod normals;
pub mod problem;
pub mod projection;
pub mod quadrature;
pub mod segmentation;
pub mod settings;

mod residual;

pub mod optimize {
    pub use mortar_optimize::*;
}

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use mortar_optimize::Real;
