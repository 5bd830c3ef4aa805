//! Line elements for planar interfaces.
use crate::dual::Dual;
use crate::error::MortarError;
use crate::fields::FieldStore;
use crate::Real;
use nalgebra::DVector;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The closed set of shape-function families supported on an interface.
///
/// Node ordering follows the usual convention for line elements: the two end points come
/// first, so that `[0, 1]` are always the end nodes, followed by interior nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFamily {
    /// Two-node linear segment.
    Seg2,
    /// Three-node quadratic segment; the third node sits at `xi = 0`.
    Seg3,
}

impl ElementFamily {
    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Seg2 => 2,
            Self::Seg3 => 3,
        }
    }

    /// Number of Gauss points used for mortar integrals when none is configured.
    ///
    /// Mortar integrands are products of slave and master basis functions on a sub-segment,
    /// which are integrated exactly (for affine geometry) with these orders.
    pub fn default_quadrature_order(&self) -> usize {
        match self {
            Self::Seg2 => 3,
            Self::Seg3 => 4,
        }
    }

    /// Local indices of the two end nodes.
    pub fn endpoint_indices(&self) -> [usize; 2] {
        [0, 1]
    }

    /// Reference coordinates of the element nodes.
    pub fn reference_nodes(&self) -> &'static [f64] {
        match self {
            Self::Seg2 => &[-1.0, 1.0],
            Self::Seg3 => &[-1.0, 1.0, 0.0],
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn basis<T: Real>(&self, xi: T) -> DVector<T> {
        match self {
            Self::Seg2 => DVector::from_column_slice(&[(1.0 - xi) / 2.0, (1.0 + xi) / 2.0]),
            Self::Seg3 => DVector::from_column_slice(&[
                xi * (xi - 1.0) / 2.0,
                xi * (xi + 1.0) / 2.0,
                1.0 - xi * xi,
            ]),
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn basis_derivative<T: Real>(&self, xi: T) -> DVector<T> {
        match self {
            Self::Seg2 => DVector::from_column_slice(&[-0.5, 0.5]),
            Self::Seg3 => DVector::from_column_slice(&[xi - 0.5, xi + 0.5, -2.0 * xi]),
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn basis_second_derivative<T: Real>(&self, _xi: T) -> DVector<T> {
        match self {
            Self::Seg2 => DVector::from_column_slice(&[0.0, 0.0]),
            Self::Seg3 => DVector::from_column_slice(&[1.0, 1.0, -2.0]),
        }
    }

    /// Basis values at a differentiable coordinate.
    pub fn basis_dual(&self, xi: &Dual) -> Vec<Dual> {
        let values = self.basis(xi.value());
        let derivatives = self.basis_derivative(xi.value());
        values
            .iter()
            .zip(derivatives.iter())
            .map(|(n, dn)| xi.chain(*n, *dn))
            .collect()
    }

    /// Basis derivatives at a differentiable coordinate.
    pub fn basis_derivative_dual(&self, xi: &Dual) -> Vec<Dual> {
        let derivatives = self.basis_derivative(xi.value());
        let second_derivatives = self.basis_second_derivative(xi.value());
        derivatives
            .iter()
            .zip(second_derivatives.iter())
            .map(|(dn, ddn)| xi.chain(*dn, *ddn))
            .collect()
    }
}

/// An interface element: connectivity, shape family and time-stamped field snapshots.
///
/// The connectivity refers to global node ids and never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    family: ElementFamily,
    connectivity: Vec<usize>,
    fields: FieldStore,
}

impl Element {
    pub fn new(family: ElementFamily, connectivity: Vec<usize>) -> Result<Self, MortarError> {
        if connectivity.len() != family.num_nodes() {
            return Err(MortarError::Configuration(format!(
                "{:?} element requires {} nodes, got connectivity {:?}",
                family,
                family.num_nodes(),
                connectivity
            )));
        }
        for (i, id) in connectivity.iter().enumerate() {
            if connectivity[..i].contains(id) {
                return Err(MortarError::Configuration(format!(
                    "Node {} appears more than once in connectivity {:?}",
                    id, connectivity
                )));
            }
        }
        Ok(Self {
            family,
            connectivity,
            fields: FieldStore::default(),
        })
    }

    pub fn family(&self) -> ElementFamily {
        self.family
    }

    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }
}
