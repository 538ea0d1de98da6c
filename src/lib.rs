//! Core systems of a 360° glTF scene viewer, rewritten in Rust.
//!
//! The crate exposes the viewer's interaction machinery — camera motion,
//! pointer-to-intent mapping, the device probe seam and the two-mode
//! presentation toggle — as plain testable types. Asset decoding, GPU mesh
//! extraction and device protocol handling are intentionally kept outside
//! of the crate so that the code remains easy to embed and to exercise
//! headless.

pub mod app;
pub mod camera;
pub mod device;
pub mod input;
pub mod presentation;
pub mod render;
pub mod scene;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::{camera_params, CameraPose};
pub use device::{
    DeviceProbe, ImmersiveDevice, MockHeadset, MockProbe, NoImmersiveSupport, PresentError,
};
pub use input::{InputCommand, InputState, MotionIntent};
pub use presentation::{
    PresentationAction, PresentationMode, PresentationState, ScreenInfo, StaticScreen,
    ViewportChange,
};
pub use render::{CameraParams, Renderer, SceneLighting};
pub use scene::{default_lighting, Scene, SceneError, SceneObject};
pub use viewer::{SceneStatus, ViewerConfig, ViewerController};
