use anyhow::{anyhow, Result};
use glam::Mat4;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::scene::SceneObject;

use super::common::{CameraParams, SceneLighting};

/// Minimal renderer backed by a 2D canvas for WebAssembly builds.
///
/// Node positions are projected through the camera matrix into screen-space
/// markers, which is enough to see the look/move state machine working
/// without a WebGL path.
pub struct Renderer {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: (u32, u32),
    view_proj: Mat4,
    device_presenting: bool,
}

impl Renderer {
    /// Creates a renderer that draws into the provided HTML canvas element.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| anyhow!("failed to query canvas context: {err:?}"))?
            .ok_or_else(|| anyhow!("canvas does not support 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("failed to cast canvas context"))?;

        let size = (canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            context,
            size,
            view_proj: Mat4::IDENTITY,
            device_presenting: false,
        })
    }

    /// Updates the canvas dimensions, e.g. across a fullscreen transition.
    pub fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 == 0 || new_size.1 == 0 {
            return;
        }
        self.size = new_size;
        self.canvas.set_width(new_size.0);
        self.canvas.set_height(new_size.1);
    }

    /// Caches the camera for the next draw. Lighting is ignored by the 2D
    /// path but the API stays aligned with the native renderer.
    pub fn update_globals(&mut self, camera: &CameraParams, _lighting: &SceneLighting) {
        self.view_proj = camera.view_proj;
    }

    /// Mirrors the device-aware rendering switch driven by present-change
    /// notifications.
    pub fn set_device_presenting(&mut self, presenting: bool) {
        self.device_presenting = presenting;
    }

    /// Draws markers for the current scene snapshot.
    pub fn render(&mut self, objects: &[SceneObject]) -> Result<(), wasm_bindgen::JsValue> {
        let width = self.size.0 as f64;
        let height = self.size.1 as f64;

        self.context.set_fill_style(&"#06060a".into());
        self.context.fill_rect(0.0, 0.0, width, height);

        for (index, object) in objects.iter().enumerate() {
            let clip = self.view_proj * object.translation().extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc_x = (clip.x / clip.w) as f64;
            let ndc_y = (clip.y / clip.w) as f64;
            if ndc_x.abs() > 1.2 || ndc_y.abs() > 1.2 {
                continue;
            }
            let x = (ndc_x * 0.5 + 0.5) * width;
            let y = (0.5 - ndc_y * 0.5) * height;
            let radius = (400.0 / clip.w as f64).clamp(2.0, 24.0);

            let hue = (index as f64 * 47.0) % 360.0;
            let color = if object.is_mesh_instance() {
                format!("hsl({hue}, 60%, 55%)")
            } else {
                format!("hsl({hue}, 20%, 35%)")
            };
            self.context.set_fill_style(&color.as_str().into());
            self.context
                .fill_rect(x - radius / 2.0, y - radius / 2.0, radius, radius);
        }

        self.context.set_fill_style(&"white".into());
        let summary = format!(
            "Objects: {}  Meshes: {}{}",
            objects.len(),
            objects.iter().filter(|o| o.is_mesh_instance()).count(),
            if self.device_presenting { "  [VR]" } else { "" },
        );
        let _ = self.context.fill_text(&summary, 10.0, 24.0);

        Ok(())
    }
}
