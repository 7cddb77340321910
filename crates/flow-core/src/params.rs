//! Control parameters and the shared cell they live in.
//!
//! The UI owns the writes; the frame loop and the note scheduler each read a
//! [`ControlParams`] snapshot once per callback. Every field is an independent
//! scalar, so per-field atomics are enough: a reader may see a stale value but
//! never a half-written one.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// One of the five continuous controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Complexity,
    Flow,
    ColorShift,
    Density,
    Growth,
}

impl Param {
    pub const ALL: [Param; 5] = [
        Param::Complexity,
        Param::Flow,
        Param::ColorShift,
        Param::Density,
        Param::Growth,
    ];

    /// Parse the names used by the slider UI (`colorShift` and `color_shift` both work).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "complexity" => Some(Param::Complexity),
            "flow" => Some(Param::Flow),
            "colorShift" | "color_shift" => Some(Param::ColorShift),
            "density" => Some(Param::Density),
            "growth" => Some(Param::Growth),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Param::Complexity => "complexity",
            Param::Flow => "flow",
            Param::ColorShift => "colorShift",
            Param::Density => "density",
            Param::Growth => "growth",
        }
    }
}

/// Immutable snapshot of the controls.
///
/// Fields:
/// - `complexity`: field turbulence and note density
/// - `flow`: field ageing speed, particle speed, trail fade and note length
/// - `color_shift`: hue rotation speed and saturation
/// - `density`: particle population target
/// - `growth`: blob/smoke/burst activity and voice richness
/// - `audio_enabled`: whether the ambient loop emits notes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlParams {
    pub complexity: f32,
    pub flow: f32,
    pub color_shift: f32,
    pub density: f32,
    pub growth: f32,
    pub audio_enabled: bool,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            complexity: 0.5,
            flow: 0.6,
            color_shift: 0.4,
            density: 0.5,
            growth: 0.3,
            audio_enabled: false,
        }
    }
}

impl ControlParams {
    /// All zeros with audio off; handy as a baseline.
    pub const ZERO: ControlParams = ControlParams {
        complexity: 0.0,
        flow: 0.0,
        color_shift: 0.0,
        density: 0.0,
        growth: 0.0,
        audio_enabled: false,
    };

    pub fn get(&self, param: Param) -> f32 {
        match param {
            Param::Complexity => self.complexity,
            Param::Flow => self.flow,
            Param::ColorShift => self.color_shift,
            Param::Density => self.density,
            Param::Growth => self.growth,
        }
    }

    pub fn with(mut self, param: Param, value: f32) -> Self {
        let slot = match param {
            Param::Complexity => &mut self.complexity,
            Param::Flow => &mut self.flow,
            Param::ColorShift => &mut self.color_shift,
            Param::Density => &mut self.density,
            Param::Growth => &mut self.growth,
        };
        *slot = value;
        self
    }

    /// Clamp every scalar into [0, 1]; NaN reads as 0.
    pub fn clamped(self) -> Self {
        Self {
            complexity: unit(self.complexity),
            flow: unit(self.flow),
            color_shift: unit(self.color_shift),
            density: unit(self.density),
            growth: unit(self.growth),
            audio_enabled: self.audio_enabled,
        }
    }
}

#[inline]
fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Thread-safe parameter cell shared between the UI, the frame loop and the scheduler.
#[derive(Debug)]
pub struct SharedParams {
    complexity: AtomicU32,
    flow: AtomicU32,
    color_shift: AtomicU32,
    density: AtomicU32,
    growth: AtomicU32,
    audio_enabled: AtomicBool,
}

impl SharedParams {
    pub fn new(initial: ControlParams) -> Self {
        Self {
            complexity: AtomicU32::new(initial.complexity.to_bits()),
            flow: AtomicU32::new(initial.flow.to_bits()),
            color_shift: AtomicU32::new(initial.color_shift.to_bits()),
            density: AtomicU32::new(initial.density.to_bits()),
            growth: AtomicU32::new(initial.growth.to_bits()),
            audio_enabled: AtomicBool::new(initial.audio_enabled),
        }
    }

    /// Convenience constructor for sharing across callbacks or threads.
    pub fn shared(initial: ControlParams) -> Arc<Self> {
        Arc::new(Self::new(initial))
    }

    fn slot(&self, param: Param) -> &AtomicU32 {
        match param {
            Param::Complexity => &self.complexity,
            Param::Flow => &self.flow,
            Param::ColorShift => &self.color_shift,
            Param::Density => &self.density,
            Param::Growth => &self.growth,
        }
    }

    pub fn set(&self, param: Param, value: f32) {
        self.slot(param).store(value.to_bits(), Ordering::Relaxed);
    }

    /// Nudge a parameter by `delta`, keeping it within [0, 1]. Returns the new value.
    pub fn adjust(&self, param: Param, delta: f32) -> f32 {
        let next = unit(self.get(param) + delta);
        self.set(param, next);
        next
    }

    pub fn get(&self, param: Param) -> f32 {
        f32::from_bits(self.slot(param).load(Ordering::Relaxed))
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        self.audio_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn toggle_audio(&self) -> bool {
        !self.audio_enabled.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::Relaxed)
    }

    /// Read every field once, clamped to [0, 1].
    pub fn snapshot(&self) -> ControlParams {
        ControlParams {
            complexity: self.get(Param::Complexity),
            flow: self.get(Param::Flow),
            color_shift: self.get(Param::ColorShift),
            density: self.get(Param::Density),
            growth: self.get(Param::Growth),
            audio_enabled: self.audio_enabled(),
        }
        .clamped()
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(ControlParams::default())
    }
}
