//! 8-bit ARGB colors and the 0-255 channel space the integrator works in.

use lumen_math::{Interval, Vector3};
use serde::{Deserialize, Serialize};

/// Valid range of a single color channel.
pub const CHANNEL_RANGE: Interval = Interval::new(0.0, 255.0);

/// An 8-bit color with alpha, as consumed by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argb {
    #[serde(default = "opaque")]
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

fn opaque() -> u8 {
    255
}

impl Argb {
    pub const BLACK: Argb = Argb::rgb(0, 0, 0);
    pub const WHITE: Argb = Argb::rgb(255, 255, 255);
    /// Top of the sky gradient.
    pub const LIGHT_BLUE: Argb = Argb::rgb(127, 178, 255);

    /// Create a color with explicit alpha.
    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Create a fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    /// Pack as `0xAARRGGBB`.
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack from `0xAARRGGBB`.
    pub fn from_u32(packed: u32) -> Self {
        let [a, r, g, b] = packed.to_be_bytes();
        Self { a, r, g, b }
    }

    /// RGB channels as floats in 0-255 space.
    pub fn to_channels(self) -> Vector3 {
        Vector3::new(self.r as f64, self.g as f64, self.b as f64)
    }

    /// Build an opaque color from 0-255 float channels, clamping each one.
    pub fn from_channels(channels: Vector3) -> Self {
        let c = clamp_channels(channels);
        Self::rgb(c.x as u8, c.y as u8, c.z as u8)
    }

    /// RGB channels scaled to [0, 1].
    pub fn to_unit_rgb(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl Default for Argb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Clamp every channel to [0, 255].
#[inline]
pub fn clamp_channels(c: Vector3) -> Vector3 {
    Vector3::new(
        CHANNEL_RANGE.clamp(c.x),
        CHANNEL_RANGE.clamp(c.y),
        CHANNEL_RANGE.clamp(c.z),
    )
}

/// Scale `color` by a 0-255 `albedo`, component-wise: `color * albedo / 255`, clamped.
///
/// A full-intensity albedo leaves `color` untouched bit for bit.
#[inline]
pub fn attenuate(color: Vector3, albedo: Vector3) -> Vector3 {
    clamp_channels(color * (albedo / 255.0))
}
