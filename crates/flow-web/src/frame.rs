use crate::{params, start_ambient_if_ready, stopped, AppState, SharedApp};
use flow_core::Surface;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub app: SharedApp,
}

impl FrameContext {
    pub fn new(app: SharedApp) -> Self {
        Self { app }
    }

    pub fn frame(&mut self) {
        let snapshot = params().snapshot();
        let mut guard = self.app.borrow_mut();
        let state: &mut AppState = &mut guard;

        // Backing store follows the CSS size; rebuild the grid when it moved.
        let size = state.surface.size();
        if size != state.sketch.bounds() {
            state.sketch.resize(size.x, size.y);
            state.surface.clear();
        }

        if state.gate.observe(snapshot.audio_enabled) {
            match state.engine.ensure_initialized() {
                Ok(true) => start_ambient_if_ready(&self.app, state),
                Ok(false) => {}
                Err(e) => log::warn!("[audio] enable failed, waiting for a gesture: {e}"),
            }
        }

        let AppState {
            sketch,
            surface,
            noise,
            rng,
            ..
        } = state;
        sketch.tick(&snapshot, surface, &*noise, rng);
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if stopped() {
            return;
        }
        frame_ctx_tick.borrow_mut().frame();
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
