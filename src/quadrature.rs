//! Quadrature rules on the reference interval `[-1, 1]`.
use crate::element::ElementFamily;
use fenris_quadrature::univariate;

/// Weights and points of a one-dimensional rule.
pub type QuadraturePair1d = (Vec<f64>, Vec<f64>);

/// Gauss-Legendre quadrature for the reference interval [-1, 1].
///
/// Given `n` points, the rule integrates polynomials of order up to `2 n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> QuadraturePair1d {
    let (weights, points) = univariate::gauss(num_points);
    (weights, points.into_iter().map(|[xi]| xi).collect())
}

/// Gauss rules for every element family, computed once per assembly.
#[derive(Debug, Clone)]
pub struct QuadratureTable {
    seg2: QuadraturePair1d,
    seg3: QuadraturePair1d,
}

impl QuadratureTable {
    /// Uses `order` points for every family, or each family's default if `order` is `None`.
    pub fn new(order: Option<usize>) -> Self {
        let points = |family: ElementFamily| order.unwrap_or_else(|| family.default_quadrature_order());
        Self {
            seg2: gauss(points(ElementFamily::Seg2)),
            seg3: gauss(points(ElementFamily::Seg3)),
        }
    }

    pub fn rule(&self, family: ElementFamily) -> &QuadraturePair1d {
        match family {
            ElementFamily::Seg2 => &self.seg2,
            ElementFamily::Seg3 => &self.seg3,
        }
    }
}
