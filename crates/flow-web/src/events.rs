use crate::{dom, params, start_ambient_if_ready, stopped, AppState, SharedApp};
use flow_core::input::pointer_press;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn wire_canvas_resize(canvas: &web::HtmlCanvasElement) {
    let canvas_resize = canvas.clone();
    let resize_closure = Closure::wrap(Box::new(move || {
        dom::sync_canvas_backing_size(&canvas_resize);
    }) as Box<dyn FnMut()>);
    if let Some(window) = web::window() {
        _ = window
            .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref());
    }
    resize_closure.forget();
}

/// Pointer presses start audio (a valid user gesture), then play a note and
/// puff smoke where the press landed.
pub fn wire_pointerdown(canvas: &web::HtmlCanvasElement, app: SharedApp) {
    let canvas_press = canvas.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        if stopped() {
            return;
        }
        let pos = dom::pointer_canvas_px(&ev, &canvas_press);
        let snapshot = params().snapshot();
        let Ok(mut guard) = app.try_borrow_mut() else {
            return;
        };
        let state: &mut AppState = &mut guard;
        state.engine.backend().resume();
        let AppState {
            sketch,
            engine,
            rng,
            ..
        } = &mut *state;
        let outcome = pointer_press(sketch, engine, &snapshot, pos, rng);
        if outcome.ready {
            start_ambient_if_ready(&app, state);
        }
    }) as Box<dyn FnMut(_)>);
    _ = canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Keyboard stand-in for the slider UI: `1`-`5` pick a control, arrows nudge
/// it, `m` toggles audio.
pub fn wire_global_keydown(app: SharedApp) {
    let closure = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        if stopped() {
            return;
        }
        let Ok(mut guard) = app.try_borrow_mut() else {
            return;
        };
        let key = ev.key();
        match key.as_str() {
            "1" | "2" | "3" | "4" | "5" => {
                if let Ok(slot) = key.parse::<usize>() {
                    guard.cursor.select_slot(slot);
                }
            }
            "ArrowUp" => {
                guard.cursor.nudge(params(), 1.0);
                ev.prevent_default();
            }
            "ArrowDown" => {
                guard.cursor.nudge(params(), -1.0);
                ev.prevent_default();
            }
            "m" | "M" => {
                let on = params().toggle_audio();
                log::info!("[keys] audio {}", if on { "on" } else { "off" });
                if on {
                    // Key presses are user gestures; browsers only start audio inside one.
                    let state: &mut AppState = &mut guard;
                    state.engine.backend().resume();
                    if let Ok(true) = state.engine.ensure_initialized() {
                        start_ambient_if_ready(&app, state);
                    }
                }
            }
            _ => {}
        }
    }) as Box<dyn FnMut(_)>);
    if let Some(window) = web::window() {
        _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}
