//! Configuration of a mortar interface.
use crate::error::MortarError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which constraint the interface enforces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceVariant {
    /// Mesh tying: full displacement continuity across the interface.
    Tie,
    /// Frictionless unilateral contact with a primal-dual active set.
    Contact,
}

/// How an element tangent is obtained from its deformed geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TangentPolicy {
    /// Evaluate `dx/dxi` at the element midpoint `xi = 0`.
    Midpoint,
    /// Sum `w dx/dxi` over the element quadrature rule.
    Integrated,
}

/// What to do when a contact point projection does not converge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureAction {
    /// Abort the whole assembly with [`MortarError::NonConvergence`].
    Abort,
    /// Treat the slave/master pair as non-contacting and continue.
    SkipPair,
}

/// Failure handling for the two projection call sites.
///
/// `segmentation` applies to projecting master end nodes onto the slave element,
/// `integration` to projecting slave quadrature points onto the master element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionFailurePolicy {
    pub segmentation: FailureAction,
    pub integration: FailureAction,
}

impl ProjectionFailurePolicy {
    /// Tying aborts on any failure. Contact skips pairs whose segmentation fails but
    /// aborts on failures inside the integration loop.
    pub fn for_variant(variant: InterfaceVariant) -> Self {
        match variant {
            InterfaceVariant::Tie => Self {
                segmentation: FailureAction::Abort,
                integration: FailureAction::Abort,
            },
            InterfaceVariant::Contact => Self {
                segmentation: FailureAction::SkipPair,
                integration: FailureAction::Abort,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MortarSettings {
    pub variant: InterfaceVariant,
    /// Negate all nodal normals.
    pub rotate_normals: bool,
    /// Use the biorthogonal multiplier basis instead of the primal shape functions.
    pub dual_basis: bool,
    /// Add the reference-configuration mismatch to the tying constraint.
    pub adjust: bool,
    /// Sign applied to the normal gap, either `1.0` or `-1.0`.
    pub gap_sign: f64,
    /// Pairs whose element midpoints are farther apart than this are skipped.
    pub maximum_distance: Option<f64>,
    /// Slave node ids excluded from active set switching.
    pub always_inactive: BTreeSet<usize>,
    /// Number of Gauss points for mortar integrals. Defaults to the slave family's order.
    pub quadrature_order: Option<usize>,
    pub tangent_policy: TangentPolicy,
    /// Defaults to [`ProjectionFailurePolicy::for_variant`].
    pub projection_failures: Option<ProjectionFailurePolicy>,
}

impl Default for MortarSettings {
    fn default() -> Self {
        Self {
            variant: InterfaceVariant::Tie,
            rotate_normals: false,
            dual_basis: true,
            adjust: false,
            gap_sign: -1.0,
            maximum_distance: None,
            always_inactive: BTreeSet::new(),
            quadrature_order: None,
            tangent_policy: TangentPolicy::Midpoint,
            projection_failures: None,
        }
    }
}

impl MortarSettings {
    pub fn tie() -> Self {
        Self::default()
    }

    pub fn contact() -> Self {
        Self {
            variant: InterfaceVariant::Contact,
            ..Self::default()
        }
    }

    pub fn failure_policy(&self) -> ProjectionFailurePolicy {
        self.projection_failures
            .unwrap_or_else(|| ProjectionFailurePolicy::for_variant(self.variant))
    }

    pub fn validate(&self) -> Result<(), MortarError> {
        if self.gap_sign != 1.0 && self.gap_sign != -1.0 {
            return Err(MortarError::Configuration(format!(
                "gap_sign must be 1 or -1, got {}",
                self.gap_sign
            )));
        }
        if let Some(distance) = self.maximum_distance {
            if !(distance > 0.0) {
                return Err(MortarError::Configuration(format!(
                    "maximum_distance must be positive, got {}",
                    distance
                )));
            }
        }
        if self.quadrature_order == Some(0) {
            return Err(MortarError::Configuration(
                "quadrature_order must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
