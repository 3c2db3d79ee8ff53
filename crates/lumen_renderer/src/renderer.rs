//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Diffuse bounces up to a configurable depth
//! - Sky gradient as the only light source
//! - Jittered multi-sampling for anti-aliasing
//! - Gamma correction (gamma = 2.0)

use crate::color::{attenuate, clamp_channels};
use crate::sampling::pixel_rng;
use crate::{Argb, Camera, Hittable, Interval, Ray, Vector3};
use lumen_math::MathError;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;

/// Lower bound on hit distance, keeps bounced rays off the surface they left.
pub const SHADOW_ACNE_EPSILON: f64 = 0.001;

/// Errors that can occur while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Render cancelled")]
    Cancelled,
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Base seed for the per-pixel generators
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 225,
            max_depth: 10,
            samples_per_pixel: 50,
            seed: 0,
        }
    }
}

impl RenderSettings {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// Reject settings the integrator cannot honour.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfiguration(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfiguration(
                "samples_per_pixel must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compute the color seen by a ray, in 0-255 channel space.
///
/// Bounces are followed iteratively with a running attenuation. A path that
/// is still bouncing after `max_depth` hits contributes black.
pub fn ray_color<R: Rng + ?Sized>(
    ray: &Ray,
    world: &dyn Hittable,
    max_depth: u32,
    rng: &mut R,
) -> Vector3 {
    let mut throughput = Argb::WHITE.to_channels();
    let mut ray = *ray;

    for _ in 0..max_depth {
        match world.hit(&ray, Interval::new(SHADOW_ACNE_EPSILON, f64::INFINITY)) {
            Some(rec) => {
                let scatter = rec.material.scatter(&rec, rng);
                throughput = attenuate(throughput, scatter.attenuation);
                ray = scatter.scattered;
            }
            None => return attenuate(sky_color(&ray), throughput),
        }
    }

    Vector3::ZERO
}

/// Vertical white-to-blue gradient seen by rays that escape the scene.
pub fn sky_color(ray: &Ray) -> Vector3 {
    let unit_direction = ray.direction().normalize_or_zero();
    let a = 0.5 * (unit_direction.y + 1.0);
    Argb::WHITE.to_channels() * (1.0 - a) + Argb::LIGHT_BLUE.to_channels() * a
}

/// Apply gamma correction (gamma = 2.0) to a linear value in [0, 1].
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert an averaged 0-255 linear color to an opaque display color.
pub fn gamma_correct(linear: Vector3) -> Argb {
    let c = clamp_channels(linear) / 255.0;
    Argb::from_channels(Vector3::new(
        255.0 * linear_to_gamma(c.x),
        255.0 * linear_to_gamma(c.y),
        255.0 * linear_to_gamma(c.z),
    ))
}

/// Render a single pixel with multi-sampling.
///
/// `(x, y)` are image coordinates with row 0 at the top. Samples are drawn
/// from a generator seeded by the pixel index, so the result does not depend
/// on which thread renders the pixel.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
    x: u32,
    y: u32,
) -> RenderResult<Argb> {
    settings.validate()?;
    if x >= settings.width || y >= settings.height {
        return Err(RenderError::InvalidConfiguration(format!(
            "pixel ({}, {}) lies outside the {}x{} image",
            x, y, settings.width, settings.height
        )));
    }
    Ok(shade_pixel(camera, world, settings, x, y))
}

/// Pixel kernel shared by the row and bucket loops. Callers have already
/// validated `settings` and keep `(x, y)` inside the image.
pub(crate) fn shade_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
    x: u32,
    y: u32,
) -> Argb {
    let mut rng = pixel_rng(settings.seed, settings.width, x, y);
    let row = settings.height - 1 - y;
    let s_scale = settings.width.saturating_sub(1).max(1) as f64;
    let t_scale = settings.height.saturating_sub(1).max(1) as f64;

    let mut pixel_color = Vector3::ZERO;
    for _ in 0..settings.samples_per_pixel {
        let s = (x as f64 + rng.gen::<f64>()) / s_scale;
        let t = (row as f64 + rng.gen::<f64>()) / t_scale;
        let ray = camera.get_ray(s, t);
        pixel_color += ray_color(&ray, world, settings.max_depth, &mut rng);
    }

    gamma_correct(pixel_color / settings.samples_per_pixel as f64)
}

/// Rendered image, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Argb>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Argb::BLACK; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Argb {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Argb) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[Argb] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Iterate rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Argb]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Copy into a `height x width` grid.
    pub fn to_grid(&self) -> Vec<Vec<Argb>> {
        self.rows().map(<[Argb]>::to_vec).collect()
    }

    /// Pixels packed as `0xAARRGGBB`.
    pub fn to_argb_u32(&self) -> Vec<u32> {
        self.pixels.iter().map(|c| c.to_u32()).collect()
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for c in &self.pixels {
            bytes.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        bytes
    }
}

/// Render the entire scene to an image buffer.
///
/// Rows are rendered in parallel, each worker writing its own slice of the
/// output buffer.
pub fn render(
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
) -> RenderResult<ImageBuffer> {
    let never = AtomicBool::new(false);
    render_cancellable(camera, world, settings, &never)
}

/// Like [`render`], but stops picking up new rows once `cancel` is set.
pub fn render_cancellable(
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
    cancel: &AtomicBool,
) -> RenderResult<ImageBuffer> {
    settings.validate()?;

    log::info!(
        "Rendering {}x{} @ {} spp, max depth {}",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        settings.max_depth
    );
    let start = Instant::now();

    let mut image = ImageBuffer::new(settings.width, settings.height);
    image
        .pixels
        .par_chunks_mut(settings.width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = shade_pixel(camera, world, settings, x as u32, y as u32);
            }
        });

    if cancel.load(Ordering::Relaxed) {
        log::warn!("Render cancelled after {:?}", start.elapsed());
        return Err(RenderError::Cancelled);
    }

    log::info!("Rendered in {:?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HittableList, Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simple_scene() -> HittableList {
        let mut world = HittableList::new();
        world.add(Box::new(Sphere::new(
            Vector3::new(0.0, 0.0, -1.0),
            0.5,
            Material::diffuse(Argb::rgb(128, 128, 128)),
        )));
        world.add(Box::new(Sphere::new(
            Vector3::new(0.0, -100.5, -1.0),
            100.0,
            Material::diffuse(Argb::rgb(128, 128, 128)),
        )));
        world
    }

    fn default_camera() -> Camera {
        Camera::new(Vector3::ZERO, Vector3::NEG_Z, Vector3::Y, 90.0, 1.0).unwrap()
    }

    fn luminance(c: Argb) -> f64 {
        c.r as f64 + c.g as f64 + c.b as f64
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_color(&Ray::new(Vector3::ZERO, Vector3::Y));
        let down = sky_color(&Ray::new(Vector3::ZERO, Vector3::NEG_Y));
        let level = sky_color(&Ray::new(Vector3::ZERO, Vector3::X));

        assert_eq!(up, Argb::LIGHT_BLUE.to_channels());
        assert_eq!(down, Argb::WHITE.to_channels());
        assert!((level - Vector3::new(191.0, 216.5, 255.0)).length() < 1e-9);
    }

    #[test]
    fn test_miss_returns_sky_regardless_of_scene() {
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vector3::ZERO, Vector3::new(0.3, 0.8, 0.1));
        let expected = sky_color(&ray);

        let empty = HittableList::new();
        assert_eq!(ray_color(&ray, &empty, 5, &mut rng), expected);

        // Geometry behind the camera does not change the miss color
        let mut behind = HittableList::new();
        behind.add(Box::new(Sphere::new(
            Vector3::new(0.0, 0.0, 10.0),
            1.0,
            Material::diffuse(Argb::rgb(255, 0, 0)),
        )));
        assert_eq!(ray_color(&ray, &behind, 5, &mut rng), expected);
    }

    #[test]
    fn test_zero_depth_is_black() {
        let mut rng = StdRng::seed_from_u64(2);
        let world = simple_scene();
        for direction in [Vector3::NEG_Z, Vector3::Y, Vector3::new(0.2, -0.9, -0.4)] {
            let ray = Ray::new(Vector3::ZERO, direction);
            assert_eq!(ray_color(&ray, &world, 0, &mut rng), Vector3::ZERO);
        }

        let settings = RenderSettings::default()
            .with_resolution(3, 3)
            .with_quality(4, 0);
        let image = render(&default_camera(), &world, &settings).unwrap();
        assert!(image.pixels.iter().all(|&p| p == Argb::BLACK));
    }

    #[test]
    fn test_hit_is_darkened_by_albedo() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut world = HittableList::new();
        world.add(Box::new(Sphere::new(
            Vector3::new(0.0, 0.0, -2.0),
            1.0,
            Material::diffuse(Argb::rgb(0, 255, 0)),
        )));

        let ray = Ray::new(Vector3::ZERO, Vector3::NEG_Z);
        for _ in 0..50 {
            let c = ray_color(&ray, &world, 8, &mut rng);
            assert_eq!(c.x, 0.0);
            assert_eq!(c.z, 0.0);
            assert!(c.y <= 255.0);
        }
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_correct() {
        assert_eq!(gamma_correct(Vector3::splat(255.0)), Argb::WHITE);
        assert_eq!(gamma_correct(Vector3::ZERO), Argb::BLACK);
        // 63.75 / 255 = 0.25 -> 0.5 -> 127
        assert_eq!(gamma_correct(Vector3::splat(63.75)), Argb::rgb(127, 127, 127));
        assert_eq!(gamma_correct(Vector3::splat(1e6)), Argb::WHITE);
    }

    #[test]
    fn test_validate() {
        assert!(RenderSettings::default().validate().is_ok());

        let zero_width = RenderSettings::default().with_resolution(0, 10);
        assert!(matches!(
            zero_width.validate(),
            Err(RenderError::InvalidConfiguration(_))
        ));

        let zero_samples = RenderSettings::default().with_quality(0, 5);
        assert!(matches!(
            render(&default_camera(), &HittableList::new(), &zero_samples),
            Err(RenderError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_render_pixel_rejects_bad_input() {
        let camera = default_camera();
        let world = HittableList::new();

        let no_samples = RenderSettings::default()
            .with_resolution(4, 4)
            .with_quality(0, 5);
        assert!(matches!(
            render_pixel(&camera, &world, &no_samples, 1, 1),
            Err(RenderError::InvalidConfiguration(_))
        ));

        let settings = RenderSettings::default()
            .with_resolution(4, 4)
            .with_quality(2, 5);
        for (x, y) in [(1, 4), (4, 1), (u32::MAX, 0)] {
            assert!(matches!(
                render_pixel(&camera, &world, &settings, x, y),
                Err(RenderError::InvalidConfiguration(_))
            ));
        }
        assert!(render_pixel(&camera, &world, &settings, 3, 3).is_ok());
    }

    #[test]
    fn test_empty_scene_is_sky() {
        let settings = RenderSettings::default()
            .with_resolution(4, 4)
            .with_quality(8, 5);
        let image = render(&default_camera(), &HittableList::new(), &settings).unwrap();

        for y in 0..4 {
            for x in 0..4 {
                let p = image.get(x, y);
                assert_eq!(p.a, 255);
                assert_eq!(p.b, 255);
                assert!(p.r >= 127 && p.g >= 178);
            }
        }
        // Top row looks further up into the blue
        assert!(image.get(1, 0).r < image.get(1, 3).r);
    }

    #[test]
    fn test_simple_scene_end_to_end() {
        let settings = RenderSettings::default()
            .with_resolution(4, 4)
            .with_quality(50, 5);
        let image = render(&default_camera(), &simple_scene(), &settings).unwrap();

        assert_eq!(image.to_grid().len(), 4);
        assert!(image.rows().all(|row| row.len() == 4));
        assert!(image.pixels.iter().all(|p| p.a == 255));

        // Bottom row sees the ground, top row sees sky
        for x in 0..4 {
            let sky = image.get(x, 0);
            let ground = image.get(x, 3);
            assert!(luminance(ground) < luminance(sky));
            assert!(ground.b < sky.b);
        }
    }

    #[test]
    fn test_render_is_deterministic_for_seed() {
        let settings = RenderSettings::default()
            .with_resolution(6, 4)
            .with_quality(4, 4)
            .with_seed(9);
        let a = render(&default_camera(), &simple_scene(), &settings).unwrap();
        let b = render(&default_camera(), &simple_scene(), &settings).unwrap();
        assert_eq!(a, b);

        let pixel = render_pixel(&default_camera(), &simple_scene(), &settings, 2, 1).unwrap();
        assert_eq!(pixel, a.get(2, 1));
    }

    #[test]
    fn test_variance_shrinks_with_samples() {
        let world = simple_scene();
        let camera = default_camera();

        // Pixel on the lower half of the sphere, lit only by bounced sky
        let spread = |samples: u32| {
            let values: Vec<f64> = (0..24)
                .map(|seed| {
                    let settings = RenderSettings::default()
                        .with_resolution(9, 9)
                        .with_quality(samples, 6)
                        .with_seed(seed);
                    luminance(render_pixel(&camera, &world, &settings, 4, 5).unwrap())
                })
                .collect();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
        };

        let few = spread(2);
        let many = spread(128);
        assert!(many < few, "variance {} should be below {}", many, few);
    }

    #[test]
    fn test_single_pixel_image() {
        let settings = RenderSettings::default()
            .with_resolution(1, 1)
            .with_quality(2, 3);
        let image = render(&default_camera(), &simple_scene(), &settings).unwrap();
        assert_eq!(image.pixels.len(), 1);
        assert_eq!(image.get(0, 0).a, 255);
    }

    #[test]
    fn test_cancelled_render() {
        let cancel = AtomicBool::new(true);
        let settings = RenderSettings::default().with_resolution(8, 8).with_quality(1, 2);
        let result = render_cancellable(&default_camera(), &simple_scene(), &settings, &cancel);
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn test_image_buffer_accessors() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(2, 1, Argb::rgb(1, 2, 3));

        assert_eq!(image.get(2, 1), Argb::rgb(1, 2, 3));
        assert_eq!(image.row(1)[2], Argb::rgb(1, 2, 3));
        assert_eq!(image.to_argb_u32()[5], 0xFF01_0203);

        let bytes = image.to_rgba_bytes();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert_eq!(&bytes[20..24], &[1, 2, 3, 255]);
    }
}
