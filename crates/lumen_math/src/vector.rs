//! Fallible vector normalization.

use glam::DVec3;
use thiserror::Error;

/// 3D vector with f64 components.
pub type Vector3 = DVec3;

/// Errors raised by vector algebra.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    #[error("cannot normalize degenerate vector ({x}, {y}, {z})")]
    DegenerateVector { x: f64, y: f64, z: f64 },
}

pub type MathResult<T> = Result<T, MathError>;

/// Extra operations on [`Vector3`] that glam does not provide in checked form.
pub trait Vector3Ext: Sized {
    /// Returns the vector scaled to unit length.
    ///
    /// Fails with [`MathError::DegenerateVector`] when the length is zero or
    /// not finite. There is no fallback value.
    fn unit(self) -> MathResult<Self>;
}

impl Vector3Ext for Vector3 {
    fn unit(self) -> MathResult<Self> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return Err(MathError::DegenerateVector {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }
        Ok(self / length)
    }
}
