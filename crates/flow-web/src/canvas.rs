use flow_core::{Hsba, Surface};
use glam::Vec2;
use std::f64::consts::TAU;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Canvas2D drawing surface. Nothing is cleared between frames; the
/// translucent background fade is what produces the trails.
pub struct CanvasSurface {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| anyhow::anyhow!("getContext failed: {:?}", e))?
            .ok_or_else(|| anyhow::anyhow!("2d context unavailable"))?
            .dyn_into::<web::CanvasRenderingContext2d>()
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
        ctx.set_line_cap("round");
        let surface = Self { canvas, ctx };
        surface.clear();
        Ok(surface)
    }

    /// Paint the whole canvas opaque black (start-up and after a resize).
    pub fn clear(&self) {
        self.ctx.set_fill_style_str("rgb(0,0,0)");
        self.ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fade_background(&mut self, alpha: f32) {
        let a = (alpha / 255.0).clamp(0.0, 1.0);
        self.ctx.set_fill_style_str(&format!("rgba(0,0,0,{:.4})", a));
        self.ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    fn line(&mut self, from: Vec2, to: Vec2, stroke_width: f32, color: Hsba) {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(stroke_width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn circle(&mut self, center: Vec2, diameter: f32, color: Hsba) {
        if diameter <= 0.0 {
            return;
        }
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            diameter as f64 * 0.5,
            0.0,
            TAU,
        );
        self.ctx.fill();
    }

    fn polygon(&mut self, points: &[Vec2], color: Hsba) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.fill();
    }
}
