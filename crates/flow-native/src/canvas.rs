// Triangle batcher behind the sketch's `Surface`. Every primitive becomes a
// list of pixel-space vertices; the GPU pass converts them to clip space.

use flow_core::{Hsba, Surface};
use glam::Vec2;
use std::f32::consts::TAU;

const MIN_CIRCLE_SEGMENTS: usize = 10;
const MAX_CIRCLE_SEGMENTS: usize = 48;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Default)]
pub struct ShapeBatch {
    size: Vec2,
    vertices: Vec<Vertex>,
}

impl ShapeBatch {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Vec2::new(width as f32, height as f32),
            vertices: Vec::with_capacity(64 * 1024),
        }
    }

    /// Drop last frame's geometry, keeping the allocation.
    pub fn begin(&mut self, width: u32, height: u32) {
        self.size = Vec2::new(width as f32, height as f32);
        self.vertices.clear();
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    fn tri(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        for p in [a, b, c] {
            self.vertices.push(Vertex {
                pos: p.to_array(),
                color,
            });
        }
    }

    fn quad(&mut self, a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) {
        self.tri(a, b, c, color);
        self.tri(a, c, d, color);
    }
}

#[inline]
fn circle_segments(radius: f32) -> usize {
    ((radius * 1.5) as usize).clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS)
}

impl Surface for ShapeBatch {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fade_background(&mut self, alpha: f32) {
        let color = [0.0, 0.0, 0.0, (alpha / 255.0).clamp(0.0, 1.0)];
        let (w, h) = (self.size.x, self.size.y);
        self.quad(
            Vec2::ZERO,
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
            color,
        );
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke_width: f32, color: Hsba) {
        let dir = to - from;
        let Some(unit) = dir.try_normalize() else {
            // Zero-length stroke: a round cap still paints a dot.
            self.circle(from, stroke_width, color);
            return;
        };
        let rgba = color.to_rgba();
        let half = stroke_width.max(0.5) * 0.5;
        let n = unit.perp() * half;
        // Extend by half the width to approximate round caps.
        let a = from - unit * half;
        let b = to + unit * half;
        self.quad(a + n, b + n, b - n, a - n, rgba);
    }

    fn circle(&mut self, center: Vec2, diameter: f32, color: Hsba) {
        let r = diameter * 0.5;
        if r <= 0.0 {
            return;
        }
        let rgba = color.to_rgba();
        let segments = circle_segments(r);
        let step = TAU / segments as f32;
        let mut prev = center + Vec2::new(r, 0.0);
        for i in 1..=segments {
            let next = center + Vec2::from_angle(step * i as f32) * r;
            self.tri(center, prev, next, rgba);
            prev = next;
        }
    }

    /// Fan from the centroid; fine for the star-shaped outlines the sketch draws.
    fn polygon(&mut self, points: &[Vec2], color: Hsba) {
        if points.len() < 3 {
            return;
        }
        let rgba = color.to_rgba();
        let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
        for (i, &p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            self.tri(centroid, p, q, rgba);
        }
    }
}
