use crate::{params, SharedApp};
use flow_core::{CancelToken, NoteScheduler};
use std::time::Duration;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// Resolve after `delay` via `setTimeout`.
async fn sleep(delay: Duration) {
    let ms = delay.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(w) = web::window() {
            _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    _ = JsFuture::from(promise).await;
}

/// Drive the ambient loop until `token` is cancelled. Each iteration reads a
/// fresh parameter snapshot, so slider moves apply to the next note.
pub fn spawn(app: SharedApp, token: CancelToken) {
    spawn_local(async move {
        sleep(NoteScheduler::first_delay()).await;
        while !token.is_cancelled() {
            let delay = {
                let snapshot = params().snapshot();
                let mut guard = app.borrow_mut();
                let state = &mut *guard;
                state.engine.scheduler_step(&snapshot, &mut state.rng).delay
            };
            sleep(delay).await;
        }
        log::info!("[audio] ambient loop stopped");
    });
}
