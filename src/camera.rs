use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::MotionIntent;
use crate::render::CameraParams;

/// World units travelled per tick while the forward intent is held.
pub const FORWARD_STEP: f32 = 3.0;

/// Radians of yaw applied per tick while a rotation intent is held.
pub const YAW_STEP: f32 = 0.01;

/// Vertical field of view of the viewer camera, in degrees.
pub const FOV_DEGREES: f32 = 60.0;

/// Near clip plane distance.
pub const NEAR_PLANE: f32 = 0.01;

/// Far clip plane distance.
pub const FAR_PLANE: f32 = 10_000.0;

/// Camera pose owned by the viewer: a world position plus a yaw angle
/// about the vertical axis. Pitch and roll are never applied; the viewer
/// only looks and moves within the horizontal plane of its spawn height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    /// Yaw in radians. Zero faces down -Z; positive values turn left.
    pub yaw: f32,
}

impl CameraPose {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    /// Unit vector the camera currently faces along.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Advances the pose by one render tick.
    ///
    /// Movement is applied before rotation, so a combined move+turn tick
    /// travels along the direction faced at the start of the tick. With an
    /// idle intent the pose is returned untouched.
    pub fn advance(&mut self, intent: MotionIntent) {
        if intent.moving_forward {
            self.position += self.forward() * FORWARD_STEP;
        }
        if intent.rotating_left {
            self.yaw += YAW_STEP;
        }
        if intent.rotating_right {
            self.yaw -= YAW_STEP;
        }
    }

    /// View matrix looking along [`CameraPose::forward`] with +Y up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }
}

/// Builds the renderer camera uniforms for the given viewport dimensions.
pub fn camera_params(pose: &CameraPose, viewport: (u32, u32)) -> CameraParams {
    let aspect = if viewport.1 == 0 {
        1.0
    } else {
        viewport.0 as f32 / viewport.1 as f32
    };
    let projection = Mat4::perspective_rh_gl(
        FOV_DEGREES.to_radians(),
        aspect.max(0.01),
        NEAR_PLANE,
        FAR_PLANE,
    );
    CameraParams {
        view_proj: projection * pose.view_matrix(),
        position: pose.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(forward: bool, left: bool, right: bool) -> MotionIntent {
        MotionIntent {
            moving_forward: forward,
            rotating_left: left,
            rotating_right: right,
        }
    }

    #[test]
    fn idle_intent_leaves_pose_unchanged() {
        let start = CameraPose::new(Vec3::new(4.0, 150.0, -2.0), 0.7);
        let mut pose = start;
        pose.advance(MotionIntent::default());
        assert_eq!(pose, start);
    }

    #[test]
    fn forward_moves_exactly_one_step_along_facing() {
        let mut pose = CameraPose::new(Vec3::new(1.0, 150.0, 1.0), 0.3);
        let expected = pose.position + pose.forward() * FORWARD_STEP;
        pose.advance(intent(true, false, false));
        assert_eq!(pose.position, expected);
        assert_eq!(pose.yaw, 0.3);
    }

    #[test]
    fn rotation_steps_are_exact_and_opposite() {
        let mut pose = CameraPose::default();
        pose.advance(intent(false, true, false));
        assert_eq!(pose.yaw, YAW_STEP);
        pose.advance(intent(false, false, true));
        assert_eq!(pose.yaw, 0.0);
    }

    #[test]
    fn combined_intent_moves_before_turning() {
        let mut pose = CameraPose::default();
        pose.advance(intent(true, true, false));
        // Travelled along yaw 0 (-Z), then turned.
        assert_eq!(pose.position, Vec3::new(0.0, 0.0, -FORWARD_STEP));
        assert_eq!(pose.yaw, YAW_STEP);
    }

    #[test]
    fn yaw_zero_faces_negative_z() {
        let pose = CameraPose::default();
        assert!((pose.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn zero_height_viewport_does_not_divide_by_zero() {
        let params = camera_params(&CameraPose::default(), (800, 0));
        assert!(params.view_proj.is_finite());
    }
}
