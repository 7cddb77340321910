use glam::Vec2;
use web_sys as web;

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        if canvas.width() != w_px.max(1) {
            canvas.set_width(w_px.max(1));
        }
        if canvas.height() != h_px.max(1) {
            canvas.set_height(h_px.max(1));
        }
    }
}

/// Map a pointer event from CSS pixels to canvas backing-store pixels.
#[inline]
pub fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let x_css = ev.client_x() as f32 - rect.left() as f32;
    let y_css = ev.client_y() as f32 - rect.top() as f32;
    let w = (rect.width() as f32).max(1.0);
    let h = (rect.height() as f32).max(1.0);
    Vec2::new(
        (x_css / w) * canvas.width() as f32,
        (y_css / h) * canvas.height() as f32,
    )
}
