//! Random sampling helpers.
//!
//! Every pixel gets its own generator seeded from the render seed and the
//! pixel index, so the image does not depend on how pixels are scheduled
//! across threads.

use lumen_math::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound on rejection sampling rounds in [`random_unit_vector`].
pub const MAX_REJECTION_ATTEMPTS: u32 = 100;

/// Direction returned when rejection sampling runs out of attempts.
pub const FALLBACK_DIRECTION: Vector3 = Vector3::Y;

/// Candidates shorter than this are rejected so the division stays finite.
const MIN_CANDIDATE_LENGTH: f64 = 1e-8;

/// Sample a uniformly distributed unit vector.
///
/// Draws points in the [-1, 1] cube until one lands inside the unit sphere,
/// then scales it to unit length. Gives up after [`MAX_REJECTION_ATTEMPTS`]
/// and returns [`FALLBACK_DIRECTION`].
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3 {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let p = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let length = p.length();
        if length < 1.0 && length > MIN_CANDIDATE_LENGTH {
            return p / length;
        }
    }
    FALLBACK_DIRECTION
}

/// SplitMix64 finalizer.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator for the pixel at (x, y) of an image `width` pixels wide.
pub fn pixel_rng(seed: u64, width: u32, x: u32, y: u32) -> StdRng {
    let index = y as u64 * width as u64 + x as u64;
    StdRng::seed_from_u64(mix64(seed ^ mix64(index)))
}
