use crate::constants::*;
use crate::params::ControlParams;
use crate::surface::NoiseSource;
use glam::Vec2;
use std::f32::consts::TAU;

/// Grid of force vectors rebuilt from noise every tick.
///
/// The grid always covers `floor(width / FIELD_SCALE) x floor(height / FIELD_SCALE)`
/// cells; `resize` reallocates it from scratch.
#[derive(Clone, Debug)]
pub struct FlowField {
    cols: usize,
    rows: usize,
    vectors: Vec<Vec2>,
    zoff: f64,
}

impl FlowField {
    pub fn new(width: f32, height: f32) -> Self {
        let (cols, rows) = grid_dims(width, height);
        Self {
            cols,
            rows,
            vectors: vec![Vec2::ZERO; cols * rows],
            zoff: 0.0,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Current time coordinate of the noise volume.
    pub fn zoff(&self) -> f64 {
        self.zoff
    }

    pub fn vectors(&self) -> &[Vec2] {
        &self.vectors
    }

    /// Drop every cell and reallocate for the new surface size.
    pub fn resize(&mut self, width: f32, height: f32) {
        let (cols, rows) = grid_dims(width, height);
        self.cols = cols;
        self.rows = rows;
        self.vectors = vec![Vec2::ZERO; cols * rows];
    }

    /// Resample every cell at the current `zoff`, then advance `zoff` by the flow rate.
    pub fn recompute(&mut self, params: &ControlParams, noise: &dyn NoiseSource) {
        let step = FIELD_NOISE_STEP * (1.0 + params.complexity as f64 * 0.5);
        let magnitude = FIELD_MAG_BASE + params.complexity * FIELD_MAG_SPAN;
        for y in 0..self.rows {
            let yoff = y as f64 * step;
            for x in 0..self.cols {
                let xoff = x as f64 * step;
                let angle = noise.sample(xoff, yoff, self.zoff) * TAU * FIELD_ROTATIONS;
                self.vectors[x + y * self.cols] = Vec2::from_angle(angle) * magnitude;
            }
        }
        self.zoff += FIELD_ZOFF_STEP * (1.0 + params.flow as f64 * 2.0);
    }

    /// Force at grid cell (`col`, `row`), if the cell exists.
    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> Option<Vec2> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.vectors.get(col + row * self.cols).copied()
    }

    /// Force under a pixel position. Positions outside the grid yield `None`.
    #[inline]
    pub fn lookup(&self, pos: Vec2) -> Option<Vec2> {
        if !(pos.x >= 0.0 && pos.y >= 0.0) {
            return None;
        }
        let col = (pos.x / FIELD_SCALE).floor() as usize;
        let row = (pos.y / FIELD_SCALE).floor() as usize;
        self.cell(col, row)
    }
}

/// Grid dimensions for a surface size; non-positive or non-finite sizes give an empty grid.
#[inline]
pub fn grid_dims(width: f32, height: f32) -> (usize, usize) {
    let dim = |v: f32| {
        if v.is_finite() && v > 0.0 {
            (v / FIELD_SCALE).floor() as usize
        } else {
            0
        }
    };
    (dim(width), dim(height))
}
