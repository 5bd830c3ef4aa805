use crate::projection::ProjectionError;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Errors returned by mortar assembly.
///
/// The variants separate problems with the input (`Configuration`), failures of the embedded
/// root finders that usually call for smaller load steps (`NonConvergence`) and degenerate
/// deformed geometry (`GeometricDegeneracy`).
#[derive(Debug, Clone, PartialEq)]
pub enum MortarError {
    /// The problem definition or the supplied data is invalid.
    Configuration(String),
    /// A contact point projection failed and the active failure policy makes this fatal.
    NonConvergence {
        slave_element: usize,
        master_element: usize,
        error: ProjectionError,
    },
    /// The deformed geometry does not admit a normal field.
    GeometricDegeneracy(String),
}

impl Display for MortarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MortarError::Configuration(msg) => write!(f, "Invalid mortar configuration: {}", msg),
            MortarError::NonConvergence {
                slave_element,
                master_element,
                error,
            } => write!(
                f,
                "Projection failed for slave element {} and master element {}: {}",
                slave_element, master_element, error
            ),
            MortarError::GeometricDegeneracy(msg) => write!(f, "Degenerate interface geometry: {}", msg),
        }
    }
}

impl Error for MortarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MortarError::NonConvergence { error, .. } => Some(error),
            _ => None,
        }
    }
}
