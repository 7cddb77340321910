//! Narrow contracts the simulation draws and samples through.
//!
//! The frontends implement [`Surface`] (Canvas2D on the web, a wgpu batcher on
//! native). [`NoiseSource`] abstracts the coherent noise function so tests can
//! substitute a constant field.

use glam::Vec2;
use noise::{NoiseFn, Perlin};

/// Colour in hue/saturation/brightness with a byte-range alpha.
///
/// - `hue` in degrees \[0, 360)
/// - `saturation`, `brightness` in \[0, 100\]
/// - `alpha` in \[0, 255\]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsba {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
}

impl Hsba {
    pub fn new(hue: f32, saturation: f32, brightness: f32, alpha: f32) -> Self {
        Self {
            hue: wrap_hue(hue),
            saturation,
            brightness,
            alpha,
        }
    }

    /// Convert to straight (non-premultiplied) RGBA in \[0, 1\].
    pub fn to_rgba(self) -> [f32; 4] {
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let v = (self.brightness / 100.0).clamp(0.0, 1.0);
        let a = (self.alpha / 255.0).clamp(0.0, 1.0);
        let h = wrap_hue(self.hue) / 60.0;
        let c = v * s;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        [r + m, g + m, b + m, a]
    }

    /// CSS `rgba()` string for Canvas2D style setters.
    pub fn to_css(self) -> String {
        let [r, g, b, a] = self.to_rgba();
        format!(
            "rgba({},{},{},{:.4})",
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            a
        )
    }
}

/// Wrap any finite hue into \[0, 360).
#[inline]
pub fn wrap_hue(hue: f32) -> f32 {
    let h = hue.rem_euclid(360.0);
    if h >= 360.0 || !h.is_finite() {
        0.0
    } else {
        h
    }
}

/// 2-D drawing surface with a persistent, alpha-blended background.
pub trait Surface {
    /// Current drawable size in pixels.
    fn size(&self) -> Vec2;
    /// Blend a black full-surface rectangle with the given alpha (0..255).
    fn fade_background(&mut self, alpha: f32);
    fn line(&mut self, from: Vec2, to: Vec2, stroke_width: f32, color: Hsba);
    /// Filled circle; `diameter` follows the p5 convention.
    fn circle(&mut self, center: Vec2, diameter: f32, color: Hsba);
    /// Filled closed polygon.
    fn polygon(&mut self, points: &[Vec2], color: Hsba);
}

/// Smooth 3-D noise returning values in \[0, 1\].
pub trait NoiseSource {
    fn sample(&self, x: f64, y: f64, z: f64) -> f32;
}

/// Perlin noise remapped from \[-1, 1\] into \[0, 1\].
pub struct PerlinNoise {
    perlin: Perlin,
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }
}

impl NoiseSource for PerlinNoise {
    #[inline]
    fn sample(&self, x: f64, y: f64, z: f64) -> f32 {
        let v = self.perlin.get([x, y, z]);
        ((v * 0.5 + 0.5) as f32).clamp(0.0, 1.0)
    }
}

/// Constant noise; every sample returns the same value.
#[derive(Clone, Copy, Debug)]
pub struct FlatNoise(pub f32);

impl NoiseSource for FlatNoise {
    #[inline]
    fn sample(&self, _x: f64, _y: f64, _z: f64) -> f32 {
        self.0
    }
}
