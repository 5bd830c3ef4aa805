use nalgebra::RealField;

pub use nalgebra;

/// Scalar Newton iteration used by the contact point projectors
pub mod newton;

pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
