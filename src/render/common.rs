use glam::{Mat4, Vec3};

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Fixed scene lighting: an ambient term plus one directional light.
///
/// `sun_direction` points from the surface toward the light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLighting {
    pub ambient: Vec3,
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
}
