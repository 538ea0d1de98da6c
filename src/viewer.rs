use glam::Vec3;
use log::error;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::camera::{camera_params, CameraPose};
use crate::device::{DeviceProbe, ImmersiveDevice};
use crate::input::InputState;
use crate::presentation::{
    PresentationAction, PresentationMode, PresentationState, ScreenInfo, ViewportChange,
};
use crate::render::CameraParams;
use crate::scene::{Scene, SceneObject};

/// Height the camera spawns at, matching the original viewer.
const START_POSITION: Vec3 = Vec3::new(0.0, 150.0, 0.0);

/// Host attributes read once when the viewer is created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

impl ViewerConfig {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }

    /// Builds the config from raw attribute strings with the original
    /// element's semantics: a missing attribute is the empty string or zero,
    /// and dimensions take the leading integer of the value (`"800px"` is
    /// 800, garbage is 0).
    pub fn from_attributes(
        src: Option<&str>,
        width: Option<&str>,
        height: Option<&str>,
    ) -> Self {
        Self {
            src: src.unwrap_or_default().to_string(),
            width: parse_dimension(width),
            height: parse_dimension(height),
        }
    }

    /// Configured viewport dimensions, restored when leaving fullscreen.
    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn parse_dimension(value: Option<&str>) -> u32 {
    let Some(value) = value else {
        return 0;
    };
    let digits: String = value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Where scene loading currently stands. Failures are recorded, not
/// swallowed: the viewer keeps running with an empty scene but the status
/// stays observable to the host.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SceneStatus {
    #[default]
    Loading,
    Ready(Scene),
    Failed(String),
}

/// Owns the camera pose, the motion intents, the presentation state and the
/// scene snapshot for one viewer instance.
///
/// All mutation goes through `&self`; the host event loop serializes every
/// call, the locks only make the sharing explicit.
pub struct ViewerController {
    config: ViewerConfig,
    camera: RwLock<CameraPose>,
    input: InputState,
    presentation: RwLock<PresentationState>,
    scene: RwLock<SceneStatus>,
}

impl ViewerController {
    /// Creates a controller with the presentation mode already decided.
    pub fn new(config: ViewerConfig, mode: PresentationMode) -> Self {
        Self {
            config,
            camera: RwLock::new(CameraPose::new(START_POSITION, 0.0)),
            input: InputState::new(),
            presentation: RwLock::new(PresentationState::new(mode)),
            scene: RwLock::new(SceneStatus::Loading),
        }
    }

    /// Runs the device probe and builds the controller in the mode it
    /// selects. The returned handle, when present, is the device the shell
    /// drives on button clicks.
    pub fn from_probe(
        config: ViewerConfig,
        probe: &dyn DeviceProbe,
    ) -> (Self, Option<Box<dyn ImmersiveDevice>>) {
        let device = probe.probe();
        let mode = PresentationMode::from_probe(device.is_some());
        (Self::new(config, mode), device)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn mode(&self) -> PresentationMode {
        self.presentation.read().mode()
    }

    pub fn is_presenting(&self) -> bool {
        self.presentation.read().is_presenting()
    }

    /// Maps a pointer press at `x` to a motion intent, measured against the
    /// current viewport width.
    pub fn pointer_down(&self, x: f32, viewport_width: f32) {
        self.input.press_at(x, viewport_width);
    }

    /// Any pointer release clears every motion intent.
    pub fn pointer_up(&self) {
        self.input.release();
    }

    /// Advances the camera by one render tick and returns the new pose.
    pub fn tick(&self) -> CameraPose {
        let intent = self.input.snapshot();
        let mut camera = self.camera.write();
        camera.advance(intent);
        *camera
    }

    pub fn camera_pose(&self) -> CameraPose {
        *self.camera.read()
    }

    /// Camera uniforms for the given viewport dimensions.
    pub fn camera_params(&self, viewport: (u32, u32)) -> CameraParams {
        camera_params(&self.camera.read(), viewport)
    }

    /// Current text for the control button.
    pub fn button_label(&self) -> &'static str {
        self.presentation.read().label()
    }

    /// What a click on the control button should do right now. The caller
    /// performs the action; the presenting flag only moves when the host
    /// change notification arrives.
    pub fn click_action(&self) -> PresentationAction {
        self.presentation.read().click_action()
    }

    /// Applies a presentation change notification from the host.
    ///
    /// In fullscreen mode the returned directive carries the viewport to
    /// switch to (physical screen entering, configured size leaving) and
    /// demands an immediate redraw so no stale frame shows across the
    /// resize. Immersive transitions need no resize.
    pub fn presentation_changed(
        &self,
        presenting: bool,
        screen: &dyn ScreenInfo,
    ) -> Option<ViewportChange> {
        let mut state = self.presentation.write();
        let changed = state.apply_change(presenting);
        if state.mode() != PresentationMode::Fullscreen || !changed {
            return None;
        }
        let size = if presenting {
            screen.screen_size()
        } else {
            self.config.viewport()
        };
        Some(ViewportChange { size, redraw: true })
    }

    pub fn scene_ready(&self, scene: Scene) {
        *self.scene.write() = SceneStatus::Ready(scene);
    }

    /// Records a scene load failure. The viewer stays alive with an empty
    /// scene; the failure is logged and kept observable via
    /// [`ViewerController::scene_status`].
    pub fn scene_failed(&self, message: impl Into<String>) {
        let message = message.into();
        error!("scene load failed: {message}");
        *self.scene.write() = SceneStatus::Failed(message);
    }

    pub fn scene_status(&self) -> SceneStatus {
        self.scene.read().clone()
    }

    /// Snapshot of the scene objects, empty until a scene is ready.
    pub fn scene_objects(&self) -> Vec<SceneObject> {
        match &*self.scene.read() {
            SceneStatus::Ready(scene) => scene.objects.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FORWARD_STEP;
    use crate::device::{MockProbe, NoImmersiveSupport};
    use crate::presentation::StaticScreen;

    fn fullscreen_controller() -> ViewerController {
        let config = ViewerConfig::new("scene.gltf", 800, 600);
        let (controller, device) = ViewerController::from_probe(config, &NoImmersiveSupport);
        assert!(device.is_none());
        controller
    }

    #[test]
    fn attribute_parsing_follows_the_original_defaults() {
        let config = ViewerConfig::from_attributes(None, None, None);
        assert_eq!(config, ViewerConfig::new("", 0, 0));

        let config =
            ViewerConfig::from_attributes(Some("scene.gltf"), Some("800px"), Some("garbage"));
        assert_eq!(config.src, "scene.gltf");
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 0);
    }

    #[test]
    fn probe_without_device_selects_fullscreen_and_label() {
        let controller = fullscreen_controller();
        assert_eq!(controller.mode(), PresentationMode::Fullscreen);
        assert_eq!(controller.button_label(), "FULLSCREEN");
        assert_eq!(
            controller.click_action(),
            PresentationAction::EnterFullscreen
        );
    }

    #[test]
    fn probe_with_device_selects_immersive_and_tracks_changes() {
        let probe = MockProbe::new();
        let config = ViewerConfig::new("scene.gltf", 800, 600);
        let (controller, device) = ViewerController::from_probe(config, &probe);
        let device = device.unwrap();
        assert_eq!(controller.mode(), PresentationMode::Immersive);
        assert_eq!(controller.button_label(), "ENTER VR");

        device.request_present().unwrap();
        let screen = StaticScreen::new(1920, 1080);
        // Immersive transitions never resize the viewport.
        assert!(controller
            .presentation_changed(device.is_presenting(), &screen)
            .is_none());
        assert_eq!(controller.button_label(), "EXIT VR");
    }

    #[test]
    fn pointer_press_drives_the_next_tick() {
        let controller = fullscreen_controller();
        let before = controller.camera_pose();
        controller.pointer_down(400.0, 800.0);
        let after = controller.tick();
        assert_eq!(
            after.position,
            before.position + before.forward() * FORWARD_STEP
        );

        controller.pointer_up();
        let settled = controller.tick();
        assert_eq!(settled, after);
    }

    #[test]
    fn fullscreen_change_resizes_and_restores() {
        let controller = fullscreen_controller();
        let screen = StaticScreen::new(2560, 1440);

        let enter = controller.presentation_changed(true, &screen).unwrap();
        assert_eq!(enter.size, (2560, 1440));
        assert!(enter.redraw);
        assert_eq!(controller.button_label(), "EXIT FULLSCREEN");

        let leave = controller.presentation_changed(false, &screen).unwrap();
        assert_eq!(leave.size, (800, 600));
        assert!(leave.redraw);
        assert_eq!(controller.button_label(), "FULLSCREEN");
    }

    #[test]
    fn repeated_fullscreen_notifications_are_ignored() {
        let controller = fullscreen_controller();
        let screen = StaticScreen::new(2560, 1440);
        assert!(controller.presentation_changed(true, &screen).is_some());
        assert!(controller.presentation_changed(true, &screen).is_none());
    }

    #[test]
    fn scene_failures_stay_observable() {
        let controller = fullscreen_controller();
        controller.scene_failed("404 not found");
        assert!(matches!(
            controller.scene_status(),
            SceneStatus::Failed(message) if message.contains("404")
        ));
        assert!(controller.scene_objects().is_empty());
    }
}
