//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel using rayon. Each finished bucket is handed to a callback
//! so a viewer can display the image progressively.

use crate::renderer::{shade_pixel, ImageBuffer, RenderError, RenderResult, RenderSettings};
use crate::{Argb, Camera, Hittable};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// A rectangular tile of the image, `index` being its place in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Whether the tile lies entirely inside a `width x height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }

    /// Squared distance from the tile centre to the image centre, in
    /// doubled pixel units so it stays integral.
    fn centre_distance(&self, width: u32, height: u32) -> u64 {
        let dx = (2 * self.x as i64 + self.width as i64) - width as i64;
        let dy = (2 * self.y as i64 + self.height as i64) - height as i64;
        (dx * dx + dy * dy) as u64
    }
}

/// Cover a `width x height` image with tiles, centre tiles first.
///
/// Edge tiles are cropped to the image. Tiles at equal distance from the
/// centre keep row-major order. A zero `bucket_size` is treated as 1.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let size = bucket_size.max(1);

    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(size as usize)
        .flat_map(|y| {
            (0..width).step_by(size as usize).map(move |x| {
                Bucket::new(x, y, size.min(width - x), size.min(height - y), 0)
            })
        })
        .collect();

    buckets.sort_by_key(|b| b.centre_distance(width, height));
    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }

    log::debug!(
        "Generated {} buckets of {}px for {}x{}",
        buckets.len(),
        size,
        width,
        height
    );
    buckets
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Argb>,
}

impl BucketResult {
    /// Create a new bucket result.
    pub fn new(bucket: Bucket, pixels: Vec<Argb>) -> Self {
        Self { bucket, pixels }
    }

    /// Copy this bucket's pixels into the full image.
    pub fn blit(&self, image: &mut ImageBuffer) {
        let b = &self.bucket;
        for (local_y, row) in self.pixels.chunks(b.width as usize).enumerate() {
            for (local_x, color) in row.iter().enumerate() {
                image.set(b.x + local_x as u32, b.y + local_y as u32, *color);
            }
        }
    }
}

/// Render a single bucket.
///
/// Fails if `settings` are invalid or the bucket reaches outside the image.
pub fn render_bucket(
    bucket: &Bucket,
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
) -> RenderResult<BucketResult> {
    settings.validate()?;
    if !bucket.fits(settings.width, settings.height) {
        return Err(RenderError::InvalidConfiguration(format!(
            "bucket {}x{} at ({}, {}) lies outside the {}x{} image",
            bucket.width, bucket.height, bucket.x, bucket.y, settings.width, settings.height
        )));
    }

    let pixels = (bucket.y..bucket.y + bucket.height)
        .flat_map(|y| (bucket.x..bucket.x + bucket.width).map(move |x| (x, y)))
        .map(|(x, y)| shade_pixel(camera, world, settings, x, y))
        .collect();

    Ok(BucketResult::new(*bucket, pixels))
}

/// Render the image bucket by bucket, in parallel.
///
/// `on_bucket` is called from worker threads as each bucket completes.
/// Buckets not yet started when `cancel` is raised are skipped and the call
/// returns [`RenderError::Cancelled`]. For the same settings the finished
/// image matches [`crate::render`] pixel for pixel.
pub fn render_buckets<F>(
    camera: &Camera,
    world: &dyn Hittable,
    settings: &RenderSettings,
    bucket_size: u32,
    cancel: &AtomicBool,
    on_bucket: F,
) -> RenderResult<ImageBuffer>
where
    F: Fn(&BucketResult) + Sync,
{
    settings.validate()?;

    let buckets = generate_buckets(settings.width, settings.height, bucket_size);
    log::info!(
        "Rendering {}x{} in {} buckets @ {} spp",
        settings.width,
        settings.height,
        buckets.len(),
        settings.samples_per_pixel
    );
    let start = Instant::now();

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .filter(|_| !cancel.load(Ordering::Relaxed))
        .map(|bucket| {
            let result = render_bucket(bucket, camera, world, settings)?;
            on_bucket(&result);
            Ok(result)
        })
        .collect::<RenderResult<_>>()?;

    if cancel.load(Ordering::Relaxed) {
        log::warn!(
            "Bucket render cancelled with {}/{} buckets done",
            results.len(),
            buckets.len()
        );
        return Err(RenderError::Cancelled);
    }

    let mut image = ImageBuffer::new(settings.width, settings.height);
    for result in &results {
        result.blit(&mut image);
    }

    log::info!("Rendered in {:?}", start.elapsed());
    Ok(image)
}
