//! Lumen renderer - CPU path tracing.
//!
//! A Monte Carlo path tracer for sphere scenes lit by a sky gradient.
//! Callers build a [`Camera`] and a [`HittableList`] (usually from a
//! [`SceneDescription`] or [`ScenePreset`]) and hand them to [`render`],
//! which returns an [`ImageBuffer`] of opaque [`Argb`] pixels.

mod bucket;
mod camera;
mod color;
mod hittable;
mod material;
mod renderer;
mod sampling;
mod scene;
mod sphere;

pub use bucket::{generate_buckets, render_bucket, render_buckets, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use camera::{Camera, CameraDescription, DEFAULT_MOVE_SPEED, DEFAULT_TURN_SPEED, PITCH_LIMIT_DEGREES};
pub use color::{attenuate, clamp_channels, Argb, CHANNEL_RANGE};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Material, Scatter};
pub use renderer::{
    gamma_correct, linear_to_gamma, ray_color, render, render_cancellable, render_pixel, sky_color,
    ImageBuffer, RenderError, RenderResult, RenderSettings, SHADOW_ACNE_EPSILON,
};
pub use sampling::{pixel_rng, random_unit_vector, FALLBACK_DIRECTION, MAX_REJECTION_ATTEMPTS};
pub use scene::{GpuSphere, SceneDescription, SceneError, SceneResult, ScenePreset, SphereDescription};
pub use sphere::Sphere;

/// Re-export math types from lumen_math
pub use lumen_math::{Interval, MathError, MathResult, Ray, Vector3, Vector3Ext};
