use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Horizontal fraction below which a press means "rotate left".
pub const ROTATE_LEFT_BAND: f32 = 0.2;

/// Horizontal fraction above which a press means "rotate right".
pub const ROTATE_RIGHT_BAND: f32 = 0.8;

/// The three motion flags read once per render tick.
///
/// The band mapping sets exactly one flag per press, so left and right can
/// never both become true through input. The combination is tolerated if
/// constructed directly; the two yaw steps cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionIntent {
    pub moving_forward: bool,
    pub rotating_left: bool,
    pub rotating_right: bool,
}

impl MotionIntent {
    pub fn is_idle(&self) -> bool {
        !self.moving_forward && !self.rotating_left && !self.rotating_right
    }

    /// Applies one input command to the flag set.
    pub fn apply(&mut self, command: InputCommand) {
        match command {
            InputCommand::Press { fraction } => {
                if fraction < ROTATE_LEFT_BAND {
                    self.rotating_left = true;
                } else if fraction > ROTATE_RIGHT_BAND {
                    self.rotating_right = true;
                } else {
                    self.moving_forward = true;
                }
            }
            InputCommand::Release => *self = Self::default(),
        }
    }
}

/// Discrete form of a raw pointer event.
///
/// `Press` carries the pointer's horizontal position as a fraction of the
/// viewport width. `Release` clears every flag unconditionally, which keeps
/// the machine consistent even when the matching press was lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    Press { fraction: f32 },
    Release,
}

impl InputCommand {
    /// Builds a press command from a pointer x coordinate and the current
    /// viewport width. A degenerate width maps to the forward band.
    pub fn press(x: f32, viewport_width: f32) -> Self {
        let fraction = if viewport_width > 0.0 {
            x / viewport_width
        } else {
            0.5
        };
        Self::Press { fraction }
    }
}

/// Shared intent snapshot updated by event listeners and read by the tick.
#[derive(Debug, Default)]
pub struct InputState {
    intent: RwLock<MotionIntent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, command: InputCommand) {
        self.intent.write().apply(command);
    }

    pub fn press_at(&self, x: f32, viewport_width: f32) {
        self.apply(InputCommand::press(x, viewport_width));
    }

    pub fn release(&self) {
        self.apply(InputCommand::Release);
    }

    pub fn snapshot(&self) -> MotionIntent {
        *self.intent.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(fraction: f32) -> MotionIntent {
        let mut intent = MotionIntent::default();
        intent.apply(InputCommand::Press { fraction });
        intent
    }

    #[test]
    fn left_band_sets_only_rotate_left() {
        for fraction in [0.0, 0.1, 0.19999] {
            let intent = pressed(fraction);
            assert!(intent.rotating_left, "fraction {fraction}");
            assert!(!intent.rotating_right);
            assert!(!intent.moving_forward);
        }
    }

    #[test]
    fn right_band_sets_only_rotate_right() {
        for fraction in [0.80001, 0.9, 1.0] {
            let intent = pressed(fraction);
            assert!(intent.rotating_right, "fraction {fraction}");
            assert!(!intent.rotating_left);
            assert!(!intent.moving_forward);
        }
    }

    #[test]
    fn centre_band_sets_only_forward() {
        for fraction in [0.2, 0.5, 0.8] {
            let intent = pressed(fraction);
            assert!(intent.moving_forward, "fraction {fraction}");
            assert!(!intent.rotating_left);
            assert!(!intent.rotating_right);
        }
    }

    #[test]
    fn release_clears_all_flags_from_any_state() {
        let mut intent = MotionIntent {
            moving_forward: true,
            rotating_left: true,
            rotating_right: true,
        };
        intent.apply(InputCommand::Release);
        assert!(intent.is_idle());
    }

    #[test]
    fn press_command_divides_by_viewport_width() {
        assert_eq!(
            InputCommand::press(100.0, 800.0),
            InputCommand::Press { fraction: 0.125 }
        );
        // Degenerate width falls back to the forward band.
        assert_eq!(
            InputCommand::press(100.0, 0.0),
            InputCommand::Press { fraction: 0.5 }
        );
    }

    #[test]
    fn shared_state_tracks_press_and_release() {
        let state = InputState::new();
        state.press_at(50.0, 800.0);
        assert!(state.snapshot().rotating_left);
        state.release();
        assert!(state.snapshot().is_idle());
    }
}
