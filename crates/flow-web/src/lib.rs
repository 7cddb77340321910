#![cfg(target_arch = "wasm32")]
use flow_core::{AudioEngine, AudioGate, ControlParams, Param, ParamCursor, PerlinNoise, SharedParams, Sketch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod ambient;
mod audio;
mod canvas;
mod dom;
mod events;
mod frame;

use audio::WebAudio;
use canvas::CanvasSurface;

/// Everything the frame loop, the input handlers and the ambient loop share.
pub(crate) struct AppState {
    pub sketch: Sketch,
    pub engine: AudioEngine<WebAudio>,
    pub surface: CanvasSurface,
    pub noise: PerlinNoise,
    pub rng: StdRng,
    pub gate: AudioGate,
    pub cursor: ParamCursor,
}

pub(crate) type SharedApp = Rc<RefCell<AppState>>;

static STARTED: AtomicBool = AtomicBool::new(false);
static STOPPED: AtomicBool = AtomicBool::new(false);
static PARAMS: OnceLock<SharedParams> = OnceLock::new();

thread_local! {
    static APP: RefCell<Option<SharedApp>> = const { RefCell::new(None) };
}

pub(crate) fn params() -> &'static SharedParams {
    PARAMS.get_or_init(SharedParams::default)
}

pub(crate) fn stopped() -> bool {
    STOPPED.load(Ordering::SeqCst)
}

/// Start the ambient loop if the engine just became ready and no loop runs yet.
pub(crate) fn start_ambient_if_ready(app: &SharedApp, state: &mut AppState) {
    if let Some(token) = state.engine.start_loop() {
        ambient::spawn(app.clone(), token);
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("flow-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    if STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id("app-canvas")
        .ok_or_else(|| anyhow::anyhow!("missing #app-canvas"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    // Maintain canvas internal pixel size to match CSS size * devicePixelRatio
    dom::sync_canvas_backing_size(&canvas);
    events::wire_canvas_resize(&canvas);

    let surface = CanvasSurface::new(canvas.clone())?;
    let mut rng = StdRng::from_entropy();
    let initial = params().snapshot();
    let sketch = Sketch::new(
        canvas.width() as f32,
        canvas.height() as f32,
        &initial,
        &mut rng,
    );
    let noise = PerlinNoise::new(rng.gen());

    let app: SharedApp = Rc::new(RefCell::new(AppState {
        sketch,
        engine: AudioEngine::new(WebAudio::new()),
        surface,
        noise,
        rng,
        gate: AudioGate::new(),
        cursor: ParamCursor::default(),
    }));
    APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));

    events::wire_pointerdown(&canvas, app.clone());
    events::wire_global_keydown(app.clone());

    frame::start_loop(Rc::new(RefCell::new(frame::FrameContext::new(app))));
    Ok(())
}

/// Set one control by its UI name (`complexity`, `flow`, `colorShift`,
/// `density`, `growth`). Returns false for unknown names.
#[wasm_bindgen]
pub fn set_param(name: &str, value: f32) -> bool {
    match Param::from_name(name) {
        Some(param) => {
            params().set(param, value);
            true
        }
        None => {
            log::warn!("[params] unknown control {name:?}");
            false
        }
    }
}

#[wasm_bindgen]
pub fn set_audio_enabled(enabled: bool) {
    params().set_audio_enabled(enabled);
}

/// Current control values as a plain JS object, for UIs that mirror them.
#[wasm_bindgen]
pub fn get_params() -> JsValue {
    let p = params().snapshot();
    let obj = js_sys::Object::new();
    for param in Param::ALL {
        _ = js_sys::Reflect::set(&obj, &param.label().into(), &p.get(param).into());
    }
    _ = js_sys::Reflect::set(&obj, &"audioEnabled".into(), &p.audio_enabled.into());
    obj.into()
}

/// Restore the initial control values.
#[wasm_bindgen]
pub fn reset_params() {
    let defaults = ControlParams::default();
    for param in Param::ALL {
        params().set(param, defaults.get(param));
    }
    params().set_audio_enabled(defaults.audio_enabled);
}

/// Stop drawing and the ambient loop for good, and release every audio resource.
#[wasm_bindgen]
pub fn shutdown() {
    STOPPED.store(true, Ordering::SeqCst);
    APP.with(|slot| {
        if let Some(app) = slot.borrow_mut().take() {
            app.borrow_mut().engine.close();
        }
    });
    log::info!("flow-web stopped");
}
