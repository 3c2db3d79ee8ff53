//! Lumen math - vector algebra, rays and intervals.
//!
//! Vectors are glam's double precision `DVec3`, re-exported as [`Vector3`].
//! Normalization that must not silently produce NaN goes through
//! [`Vector3Ext::unit`].

// Re-export glam for convenience
pub use glam::{DQuat, DVec3};

mod interval;
mod ray;
mod vector;

pub use interval::Interval;
pub use ray::Ray;
pub use vector::{MathError, MathResult, Vector3, Vector3Ext};
