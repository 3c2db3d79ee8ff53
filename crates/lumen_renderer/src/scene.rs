//! Scene descriptions and presets.
//!
//! A [`SceneDescription`] is plain data (serializable with serde) that builds
//! into a [`HittableList`] for rendering, or packs into the flat sphere array
//! used by GPU kernels.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Argb, HittableList, Material, Sphere, Vector3};

/// Errors that can occur while loading or building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid sphere {index}: {reason}")]
    InvalidSphere { index: usize, reason: String },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A sphere as stored in scene files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereDescription {
    pub center: Vector3,
    pub radius: f64,
    #[serde(default)]
    pub material: Material,
}

impl SphereDescription {
    pub fn new(center: Vector3, radius: f64, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }
}

/// A full scene: an unordered set of spheres lit by the sky.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub spheres: Vec<SphereDescription>,
}

impl SceneDescription {
    /// Parse a scene from JSON.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let scene: SceneDescription = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Read and parse a JSON scene file.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Loaded {} spheres from {}",
            scene.spheres.len(),
            path.display()
        );
        Ok(scene)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every sphere has a positive, finite radius, a finite center and
    /// material values inside their ranges.
    pub fn validate(&self) -> SceneResult<()> {
        for (index, s) in self.spheres.iter().enumerate() {
            if !(s.radius.is_finite() && s.radius > 0.0) {
                return Err(SceneError::InvalidSphere {
                    index,
                    reason: format!("radius must be positive, got {}", s.radius),
                });
            }
            if !s.center.is_finite() {
                return Err(SceneError::InvalidSphere {
                    index,
                    reason: "center is not finite".to_string(),
                });
            }
            if let Some(reason) = s.material.range_error() {
                return Err(SceneError::InvalidSphere { index, reason });
            }
        }
        Ok(())
    }

    /// Build the hittable list the integrator consumes.
    pub fn build(&self) -> SceneResult<HittableList> {
        self.validate()?;
        let mut world = HittableList::new();
        for s in &self.spheres {
            world.add(Box::new(Sphere::new(s.center, s.radius, s.material)));
        }
        Ok(world)
    }

    /// Flatten into the GPU sphere layout.
    pub fn to_gpu_spheres(&self) -> Vec<GpuSphere> {
        self.spheres.iter().map(GpuSphere::from).collect()
    }

    /// Flattened spheres as raw bytes, ready for a storage buffer upload.
    pub fn gpu_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.to_gpu_spheres()).to_vec()
    }
}

/// Sphere packed as 7 floats: center.xyz, radius, color.rgb (0-1).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
}

impl From<&SphereDescription> for GpuSphere {
    fn from(s: &SphereDescription) -> Self {
        Self {
            center: s.center.as_vec3().to_array(),
            radius: s.radius as f32,
            color: s.material.color.to_unit_rgb(),
        }
    }
}

/// Built-in scenes offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenePreset {
    /// No geometry, only the sky
    Empty,
    /// One sphere resting on a large ground sphere
    Simple,
    /// Three colored spheres on the ground
    Trio,
    /// A grid of small spheres on the ground
    Field,
}

impl ScenePreset {
    pub const ALL: [ScenePreset; 4] = [
        ScenePreset::Empty,
        ScenePreset::Simple,
        ScenePreset::Trio,
        ScenePreset::Field,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenePreset::Empty => "empty",
            ScenePreset::Simple => "simple",
            ScenePreset::Trio => "trio",
            ScenePreset::Field => "field",
        }
    }

    /// Scene contents for this preset.
    pub fn description(&self) -> SceneDescription {
        let spheres = match self {
            ScenePreset::Empty => Vec::new(),
            ScenePreset::Simple => vec![
                SphereDescription::new(
                    Vector3::new(0.0, 0.0, -1.0),
                    0.5,
                    Material::diffuse(Argb::rgb(128, 128, 128)),
                ),
                ground(),
            ],
            ScenePreset::Trio => vec![
                SphereDescription::new(
                    Vector3::new(-1.0, 0.0, -1.0),
                    0.5,
                    Material::diffuse(Argb::rgb(204, 51, 51)),
                ),
                SphereDescription::new(
                    Vector3::new(0.0, 0.0, -1.0),
                    0.5,
                    Material::diffuse(Argb::rgb(51, 204, 51)),
                ),
                SphereDescription::new(
                    Vector3::new(1.0, 0.0, -1.0),
                    0.5,
                    Material::diffuse(Argb::rgb(51, 51, 204)),
                ),
                ground(),
            ],
            ScenePreset::Field => field(),
        };
        SceneDescription { spheres }
    }
}

fn ground() -> SphereDescription {
    SphereDescription::new(
        Vector3::new(0.0, -100.5, -1.0),
        100.0,
        Material::diffuse(Argb::rgb(204, 204, 0)),
    )
}

/// Small spheres on a 5x5 grid with colors cycling through a fixed palette.
fn field() -> Vec<SphereDescription> {
    const PALETTE: [Argb; 5] = [
        Argb::rgb(230, 90, 70),
        Argb::rgb(240, 200, 80),
        Argb::rgb(90, 180, 110),
        Argb::rgb(70, 130, 220),
        Argb::rgb(200, 200, 200),
    ];

    let mut spheres = vec![ground()];
    for row in 0..5 {
        for col in 0..5 {
            let center = Vector3::new(-2.0 + col as f64, -0.3, -1.5 - row as f64);
            let color = PALETTE[(row + col) % PALETTE.len()];
            spheres.push(SphereDescription::new(center, 0.2, Material::diffuse(color)));
        }
    }
    spheres
}
