//! Surface material record.

use crate::{hittable::HitRecord, sampling::random_unit_vector, Argb, Ray, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-surface appearance.
///
/// Only `color` takes part in light transport (as a Lambertian albedo). The
/// remaining fields are carried through scenes unchanged so that specular
/// and refractive transport can be added later.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Diffuse albedo
    pub color: Argb,
    /// Mirror reflectance in [0, 1]
    pub reflectivity: f64,
    /// Transmittance in [0, 1]
    pub transparency: f64,
    /// Index of refraction (1.0 = air)
    pub refractive_index: f64,
    /// Microfacet roughness in [0, 1]
    pub roughness: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Argb::rgb(128, 128, 128))
    }
}

/// Outcome of a surface interaction.
#[derive(Debug, Clone, Copy)]
pub struct Scatter {
    /// Per-channel attenuation in 0-255 space
    pub attenuation: Vector3,
    /// Outgoing ray
    pub scattered: Ray,
}

impl Material {
    /// Create a purely diffuse material with the given albedo.
    pub fn diffuse(color: Argb) -> Self {
        Self {
            color,
            reflectivity: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
            roughness: 0.0,
        }
    }

    pub fn with_reflectivity(mut self, reflectivity: f64) -> Self {
        self.reflectivity = reflectivity.clamp(0.0, 1.0);
        self
    }

    pub fn with_transparency(mut self, transparency: f64) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    pub fn with_refractive_index(mut self, refractive_index: f64) -> Self {
        self.refractive_index = refractive_index;
        self
    }

    pub fn with_roughness(mut self, roughness: f64) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Describe the first field outside its allowed range, if any.
    ///
    /// Deserialized materials bypass the clamping builders, so scene loading
    /// checks them here.
    pub fn range_error(&self) -> Option<String> {
        let unit = |name: &str, value: f64| {
            (!(0.0..=1.0).contains(&value))
                .then(|| format!("{} must be in [0, 1], got {}", name, value))
        };
        unit("reflectivity", self.reflectivity)
            .or_else(|| unit("transparency", self.transparency))
            .or_else(|| unit("roughness", self.roughness))
            .or_else(|| {
                (!(self.refractive_index.is_finite() && self.refractive_index > 0.0)).then(|| {
                    format!(
                        "refractive_index must be positive, got {}",
                        self.refractive_index
                    )
                })
            })
    }

    /// Lambertian bounce off the surface described by `rec`.
    pub fn scatter<R: Rng + ?Sized>(&self, rec: &HitRecord, rng: &mut R) -> Scatter {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-16 {
            scatter_direction = rec.normal;
        }

        Scatter {
            attenuation: self.color.to_channels(),
            scattered: Ray::new(rec.point, scatter_direction),
        }
    }
}
