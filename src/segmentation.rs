//! Mortar segments and the biorthogonal multiplier basis.
use crate::dual::{try_inverse, Dual};
use crate::element::ElementFamily;
use crate::geometry::interpolate;
use crate::projection::{lift_all, project_master_to_slave_dual, ProjectionError};
use crate::quadrature::QuadraturePair1d;
use itertools::izip;
use log::warn;
use nalgebra::{DMatrix, Scalar, Vector2};

/// Overlaps with a half length below this contribute nothing.
pub const SEGMENT_TOLERANCE: f64 = 1e-12;

/// The part `[xi_a, xi_b]` of a slave element's parameter domain covered by a master element.
#[derive(Debug, Clone, PartialEq)]
pub struct MortarSegment<T: Scalar> {
    pub xi_a: T,
    pub xi_b: T,
    /// Half the parametric length, `|xi_b - xi_a| / 2`.
    pub half_length: T,
}

impl MortarSegment<Dual> {
    /// Maps `s` in `[-1, 1]` to the slave coordinate `(1 - s)/2 xi_a + (1 + s)/2 xi_b`.
    pub fn map(&self, s: f64) -> Dual {
        &self.xi_a * (0.5 * (1.0 - s)) + &self.xi_b * (0.5 * (1.0 + s))
    }

    fn values(&self) -> MortarSegment<f64> {
        MortarSegment {
            xi_a: self.xi_a.value(),
            xi_b: self.xi_b.value(),
            half_length: self.half_length.value(),
        }
    }
}

/// Multiplier basis data of one slave/master pair.
///
/// The multiplier test functions on the segment are `Phi = Ae N1`.
#[derive(Debug, Clone, PartialEq)]
pub struct DualBasis<T: Scalar> {
    /// Diagonal matrix of integrated slave basis functions.
    pub de: DMatrix<T>,
    /// Gram matrix of the slave basis functions.
    pub me: DMatrix<T>,
    pub ae: DMatrix<T>,
}

/// Projects the master end nodes onto the slave element and clamps the result.
///
/// Returns `Ok(None)` if the overlap is empty.
pub(crate) fn compute_segment_dual(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<Dual>],
    slave_normals: &[Vector2<Dual>],
    master_family: ElementFamily,
    master_nodes: &[Vector2<Dual>],
) -> Result<Option<MortarSegment<Dual>>, ProjectionError> {
    let [a, b] = master_family.endpoint_indices();
    let xi_a = project_master_to_slave_dual(slave_family, slave_nodes, slave_normals, &master_nodes[a])?;
    let xi_b = project_master_to_slave_dual(slave_family, slave_nodes, slave_normals, &master_nodes[b])?;
    let xi_a = xi_a.clamp(-1.0, 1.0);
    let xi_b = xi_b.clamp(-1.0, 1.0);
    let half_length = (&xi_b - &xi_a).abs() * 0.5;

    if half_length.value() < SEGMENT_TOLERANCE {
        Ok(None)
    } else {
        Ok(Some(MortarSegment {
            xi_a,
            xi_b,
            half_length,
        }))
    }
}

/// Length element `|dx/dxi|` of the slave element at `xi`.
pub(crate) fn slave_jacobian(family: ElementFamily, nodes: &[Vector2<Dual>], xi: &Dual) -> Dual {
    let dx = interpolate(&family.basis_derivative_dual(xi), nodes);
    dx.dot(&dx).sqrt()
}

/// Integrates `De` and `Me` over the segment and builds `Ae`.
///
/// If the Gram matrix is singular the pair falls back to the primal basis `Ae = I`.
pub(crate) fn compute_dual_basis_dual(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<Dual>],
    segment: &MortarSegment<Dual>,
    rule: &QuadraturePair1d,
    dual_basis: bool,
) -> DualBasis<Dual> {
    let n = slave_family.num_nodes();
    let mut de = DMatrix::<Dual>::zeros(n, n);
    let mut me = DMatrix::<Dual>::zeros(n, n);

    let (weights, points) = rule;
    for (w, s) in izip!(weights, points) {
        let xi = segment.map(*s);
        let n1 = slave_family.basis_dual(&xi);
        let w = slave_jacobian(slave_family, slave_nodes, &xi) * &segment.half_length * *w;
        for i in 0..n {
            let w_ni = &w * &n1[i];
            de[(i, i)] += &w_ni;
            for j in 0..n {
                me[(i, j)] += &w_ni * &n1[j];
            }
        }
    }

    let identity = DMatrix::<Dual>::identity(n, n);
    let ae = if dual_basis {
        match try_inverse(&me) {
            Some(me_inv) => &de * me_inv,
            None => {
                warn!(
                    "Singular mortar Gram matrix on segment [{}, {}], using primal multiplier basis",
                    segment.xi_a.value(),
                    segment.xi_b.value()
                );
                identity
            }
        }
    } else {
        identity
    };

    DualBasis { de, me, ae }
}

/// Computes the mortar segment of a slave/master pair from plain coordinates.
pub fn compute_segment(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<f64>],
    slave_normals: &[Vector2<f64>],
    master_family: ElementFamily,
    master_nodes: &[Vector2<f64>],
) -> Result<Option<MortarSegment<f64>>, ProjectionError> {
    let segment = compute_segment_dual(
        slave_family,
        &lift_all(slave_nodes),
        &lift_all(slave_normals),
        master_family,
        &lift_all(master_nodes),
    )?;
    Ok(segment.map(|segment| segment.values()))
}

/// Computes `De`, `Me` and `Ae` from plain coordinates.
pub fn compute_dual_basis(
    slave_family: ElementFamily,
    slave_nodes: &[Vector2<f64>],
    segment: &MortarSegment<f64>,
    rule: &QuadraturePair1d,
    dual_basis: bool,
) -> DualBasis<f64> {
    let segment = MortarSegment {
        xi_a: Dual::constant(segment.xi_a),
        xi_b: Dual::constant(segment.xi_b),
        half_length: Dual::constant(segment.half_length),
    };
    let basis = compute_dual_basis_dual(slave_family, &lift_all(slave_nodes), &segment, rule, dual_basis);
    let values = |m: &DMatrix<Dual>| m.map(|m_ij| m_ij.value());
    DualBasis {
        de: values(&basis.de),
        me: values(&basis.me),
        ae: values(&basis.ae),
    }
}
