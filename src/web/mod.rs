#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    window, Document, HtmlButtonElement, HtmlCanvasElement, HtmlElement, MouseEvent, Response,
    Window,
};

use crate::device::{ImmersiveDevice, PresentError};
use crate::presentation::{PresentationAction, PresentationMode, ScreenInfo};
use crate::render::Renderer;
use crate::scene::{default_lighting, Scene};
use crate::viewer::{ViewerConfig, ViewerController};

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Browser shell of the viewer.
///
/// `attach` mirrors the original element's connectedCallback: the device
/// probe resolves first, and only then are the DOM surface, the listeners
/// and the render loop created. Dropping the returned element detaches
/// every listener.
#[wasm_bindgen]
pub struct ViewerElement {
    state: Rc<ElementState>,
    _listeners: Vec<EventListener>,
    _raf: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

#[wasm_bindgen]
impl ViewerElement {
    /// Mounts the viewer into the element with the given id, reading the
    /// `src`, `width` and `height` attributes from it.
    pub async fn attach(host_id: String) -> Result<ViewerElement, JsValue> {
        Self::build(host_id).await.map_err(to_js)
    }

    /// Current text of the control button, exposed for host-side checks.
    pub fn button_label(&self) -> String {
        self.state.controller.button_label().to_string()
    }
}

impl ViewerElement {
    async fn build(host_id: String) -> Result<ViewerElement> {
        let win = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = win
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;
        let host = document
            .get_element_by_id(&host_id)
            .ok_or_else(|| anyhow!("host element #{host_id} not found"))?;

        let config = ViewerConfig::from_attributes(
            host.get_attribute("src").as_deref(),
            host.get_attribute("width").as_deref(),
            host.get_attribute("height").as_deref(),
        );

        let container = document
            .create_element("div")
            .map_err(js_err("failed to create container"))?;
        host.append_child(&container)
            .map_err(js_err("failed to append container"))?;

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_err("failed to create canvas"))?
            .dyn_into()
            .map_err(|_| anyhow!("canvas element has the wrong type"))?;
        canvas.set_width(config.width);
        canvas.set_height(config.height);
        container
            .append_child(&canvas)
            .map_err(js_err("failed to append canvas"))?;

        // Everything below waits for the probe; no listener exists and no
        // frame is rendered before device availability is known.
        let device = probe_immersive_device(&win, &canvas).await;
        let mode = PresentationMode::from_probe(device.is_some());
        let controller = ViewerController::new(config.clone(), mode);

        let button = create_control_button(&document, controller.button_label())?;
        container
            .append_child(&button)
            .map_err(js_err("failed to append button"))?;

        let renderer = Renderer::new(canvas.clone())?;
        let state = Rc::new(ElementState {
            controller,
            renderer: RefCell::new(renderer),
            device,
            button,
            canvas,
            screen: BrowserScreen { window: win.clone() },
            document: document.clone(),
        });

        if !config.src.is_empty() {
            let loading = Rc::clone(&state);
            let src = config.src.clone();
            spawn_local(async move {
                match fetch_scene(&src).await {
                    Ok(scene) => loading.controller.scene_ready(scene),
                    Err(err) => loading.controller.scene_failed(format!("{err:#}")),
                }
            });
        } else {
            state.controller.scene_failed("src attribute is empty");
        }

        let listeners = wire_listeners(&state, &win, &document);
        let raf = start_render_loop(Rc::clone(&state))?;

        Ok(ViewerElement {
            state,
            _listeners: listeners,
            _raf: raf,
        })
    }
}

struct ElementState {
    controller: ViewerController,
    renderer: RefCell<Renderer>,
    device: Option<Box<dyn ImmersiveDevice>>,
    button: HtmlButtonElement,
    canvas: HtmlCanvasElement,
    screen: BrowserScreen,
    document: Document,
}

impl ElementState {
    fn render_frame(&self) {
        self.controller.tick();
        let mut renderer = self.renderer.borrow_mut();
        let viewport = (self.canvas.width(), self.canvas.height());
        let params = self.controller.camera_params(viewport);
        renderer.update_globals(&params, &default_lighting());
        if let Err(err) = renderer.render(&self.controller.scene_objects()) {
            log::error!("render failed: {err:?}");
        }
    }

    fn refresh_button(&self) {
        self.button
            .set_text_content(Some(self.controller.button_label()));
    }

    /// The click only dispatches the toggle; labels and flags move when the
    /// matching change notification fires.
    fn handle_click(&self) {
        match self.controller.click_action() {
            PresentationAction::RequestPresent => {
                if let Some(device) = &self.device {
                    if let Err(err) = device.request_present() {
                        log::warn!("presentation request failed: {err}");
                    }
                }
            }
            PresentationAction::ExitPresent => {
                if let Some(device) = &self.device {
                    if let Err(err) = device.exit_present() {
                        log::warn!("presentation exit failed: {err}");
                    }
                }
            }
            PresentationAction::EnterFullscreen => {
                if let Err(err) = self.canvas.request_fullscreen() {
                    log::warn!("fullscreen request failed: {err:?}");
                }
            }
            PresentationAction::ExitFullscreen => self.document.exit_fullscreen(),
        }
    }

    fn handle_present_change(&self) {
        let Some(device) = &self.device else {
            return;
        };
        let presenting = device.is_presenting();
        self.controller.presentation_changed(presenting, &self.screen);
        self.renderer.borrow_mut().set_device_presenting(presenting);
        self.refresh_button();
    }

    fn handle_fullscreen_change(&self) {
        let presenting = self.document.fullscreen_element().is_some();
        if let Some(change) = self.controller.presentation_changed(presenting, &self.screen) {
            self.renderer.borrow_mut().resize(change.size);
            if change.redraw {
                // Eager redraw so no stale frame shows across the resize.
                self.render_frame();
            }
        }
        self.refresh_button();
    }
}

fn wire_listeners(
    state: &Rc<ElementState>,
    win: &Window,
    document: &Document,
) -> Vec<EventListener> {
    let canvas = state.canvas.clone();
    let button = state.button.clone();
    let mut listeners = Vec::new();

    let pressed = Rc::clone(state);
    listeners.push(EventListener::new(&canvas, "mousedown", move |event| {
        let Some(event) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let width = pressed.canvas.width() as f32;
        pressed
            .controller
            .pointer_down(event.client_x() as f32, width);
    }));

    let released = Rc::clone(state);
    listeners.push(EventListener::new(&canvas, "mouseup", move |_event| {
        released.controller.pointer_up();
    }));

    let hovered = button.clone();
    listeners.push(EventListener::new(&button, "mouseenter", move |_event| {
        set_opacity(&hovered, "1.0");
    }));

    let rested = button.clone();
    listeners.push(EventListener::new(&button, "mouseleave", move |_event| {
        set_opacity(&rested, "0.5");
    }));

    let clicked = Rc::clone(state);
    listeners.push(EventListener::new(&button, "click", move |_event| {
        clicked.handle_click();
    }));

    match state.controller.mode() {
        PresentationMode::Immersive => {
            let changed = Rc::clone(state);
            listeners.push(EventListener::new(
                win,
                "vrdisplaypresentchange",
                move |_event| changed.handle_present_change(),
            ));
        }
        PresentationMode::Fullscreen => {
            let changed = Rc::clone(state);
            listeners.push(EventListener::new(
                document,
                "fullscreenchange",
                move |_event| changed.handle_fullscreen_change(),
            ));
        }
    }

    listeners
}

fn create_control_button(document: &Document, label: &str) -> Result<HtmlButtonElement> {
    let button: HtmlButtonElement = document
        .create_element("button")
        .map_err(js_err("failed to create button"))?
        .dyn_into()
        .map_err(|_| anyhow!("button element has the wrong type"))?;
    button.set_text_content(Some(label));

    let style = button.style();
    for (property, value) in [
        ("cursor", "pointer"),
        ("left", "30px"),
        ("width", "150px"),
        ("position", "absolute"),
        ("top", "30px"),
        ("padding", "12px 6px"),
        ("border", "1px solid #fff"),
        ("border-radius", "4px"),
        ("background", "rgba(0,0,0,0.1)"),
        ("color", "#fff"),
        ("font", "normal 13px sans-serif"),
        ("text-align", "center"),
        ("opacity", "0.5"),
        ("outline", "none"),
        ("z-index", "999"),
    ] {
        style
            .set_property(property, value)
            .map_err(js_err("failed to style button"))?;
    }
    Ok(button)
}

fn set_opacity(button: &HtmlButtonElement, value: &str) {
    let element: &HtmlElement = button.as_ref();
    let _ = element.style().set_property("opacity", value);
}

/// Feature-detects the display enumeration API before invoking it; a host
/// without the capability resolves to "no device", which is not an error.
async fn probe_immersive_device(
    win: &Window,
    canvas: &HtmlCanvasElement,
) -> Option<Box<dyn ImmersiveDevice>> {
    let navigator: JsValue = win.navigator().into();
    if !Reflect::has(&navigator, &"getVRDisplays".into()).unwrap_or(false) {
        return None;
    }
    let method: Function = Reflect::get(&navigator, &"getVRDisplays".into())
        .ok()?
        .dyn_into()
        .ok()?;
    let promise: Promise = method.call0(&navigator).ok()?.dyn_into().ok()?;
    let devices = JsFuture::from(promise).await.ok()?;
    let devices = Array::from(&devices);
    if devices.length() == 0 {
        return None;
    }
    let raw = devices.get(0);
    let name = Reflect::get(&raw, &"displayName".into())
        .ok()
        .and_then(|value| value.as_string())
        .unwrap_or_else(|| "Immersive Display".to_string());
    Some(Box::new(WebVrDisplay {
        raw,
        name,
        canvas: canvas.clone(),
    }))
}

/// Handle over a display object returned by the browser enumeration.
struct WebVrDisplay {
    raw: JsValue,
    name: String,
    canvas: HtmlCanvasElement,
}

impl WebVrDisplay {
    fn method(&self, name: &str) -> Result<Function, PresentError> {
        Reflect::get(&self.raw, &name.into())
            .map_err(|_| PresentError::Disconnected)?
            .dyn_into()
            .map_err(|_| PresentError::Disconnected)
    }
}

impl ImmersiveDevice for WebVrDisplay {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn is_presenting(&self) -> bool {
        Reflect::get(&self.raw, &"isPresenting".into())
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn request_present(&self) -> Result<(), PresentError> {
        let layer = Object::new();
        Reflect::set(&layer, &"source".into(), self.canvas.as_ref())
            .map_err(|err| PresentError::Rejected(format!("{err:?}")))?;
        let layers = Array::of1(&layer);
        // The returned promise is dropped: the present-change notification
        // is the source of truth, not the request outcome.
        self.method("requestPresent")?
            .call1(&self.raw, &layers)
            .map_err(|err| PresentError::Rejected(format!("{err:?}")))?;
        Ok(())
    }

    fn exit_present(&self) -> Result<(), PresentError> {
        self.method("exitPresent")?
            .call0(&self.raw)
            .map_err(|err| PresentError::Rejected(format!("{err:?}")))?;
        Ok(())
    }
}

struct BrowserScreen {
    window: Window,
}

impl ScreenInfo for BrowserScreen {
    fn screen_size(&self) -> (u32, u32) {
        self.window
            .screen()
            .ok()
            .and_then(|screen| {
                let width = screen.width().ok()?.max(0) as u32;
                let height = screen.height().ok()?.max(0) as u32;
                Some((width, height))
            })
            .unwrap_or((0, 0))
    }
}

async fn fetch_scene(src: &str) -> Result<Scene> {
    let win = window().ok_or_else(|| anyhow!("window not available"))?;
    let response = JsFuture::from(win.fetch_with_str(src))
        .await
        .map_err(|err| anyhow!("fetch of {src} failed: {err:?}"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| anyhow!("fetch did not return a response"))?;
    if !response.ok() {
        return Err(anyhow!("fetch of {src} failed: HTTP {}", response.status()));
    }
    let text = JsFuture::from(
        response
            .text()
            .map_err(|err| anyhow!("failed to read response body: {err:?}"))?,
    )
    .await
    .map_err(|err| anyhow!("failed to read response body: {err:?}"))?;
    let json = text
        .as_string()
        .ok_or_else(|| anyhow!("response body is not text"))?;
    Ok(Scene::from_gltf_json(&json)?)
}

fn start_render_loop(
    state: Rc<ElementState>,
) -> Result<Rc<RefCell<Option<Closure<dyn FnMut()>>>>> {
    let handle: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let again = Rc::clone(&handle);

    *handle.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        state.render_frame();
        if let Some(closure) = again.borrow().as_ref() {
            if let Err(err) = request_frame(closure) {
                log::error!("requestAnimationFrame failed: {err:?}");
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(closure) = handle.borrow().as_ref() {
        request_frame(closure).map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    }
    Ok(handle)
}

fn request_frame(closure: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("window not available"))?
        .request_animation_frame(closure.as_ref().unchecked_ref())
}

fn js_err(context: &'static str) -> impl Fn(JsValue) -> anyhow::Error {
    move |err| anyhow!("{context}: {err:?}")
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:?}"))
}
