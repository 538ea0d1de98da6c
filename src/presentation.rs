use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Exclusive presentation strategy, fixed for the life of a viewer.
///
/// Chosen exactly once from the device probe result; there is no runtime
/// switching between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationMode {
    Immersive,
    Fullscreen,
}

impl PresentationMode {
    /// Mode selection is a pure function of whether the probe found a device.
    pub fn from_probe(found_device: bool) -> Self {
        if found_device {
            Self::Immersive
        } else {
            Self::Fullscreen
        }
    }
}

/// What a click on the control button should do, given the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationAction {
    RequestPresent,
    ExitPresent,
    EnterFullscreen,
    ExitFullscreen,
}

/// Mode plus the "currently presenting" flag.
///
/// The click handler only dispatches the action for the current state; the
/// flag itself moves on host change notifications (present-change or
/// fullscreen-change), so a device-initiated exit cannot desynchronize the
/// button label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationState {
    mode: PresentationMode,
    presenting: bool,
}

impl PresentationState {
    pub fn new(mode: PresentationMode) -> Self {
        Self {
            mode,
            presenting: false,
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn is_presenting(&self) -> bool {
        self.presenting
    }

    /// Text for the control button.
    pub fn label(&self) -> &'static str {
        match (self.mode, self.presenting) {
            (PresentationMode::Immersive, false) => "ENTER VR",
            (PresentationMode::Immersive, true) => "EXIT VR",
            (PresentationMode::Fullscreen, false) => "FULLSCREEN",
            (PresentationMode::Fullscreen, true) => "EXIT FULLSCREEN",
        }
    }

    /// The toggle a click should perform right now.
    pub fn click_action(&self) -> PresentationAction {
        match (self.mode, self.presenting) {
            (PresentationMode::Immersive, false) => PresentationAction::RequestPresent,
            (PresentationMode::Immersive, true) => PresentationAction::ExitPresent,
            (PresentationMode::Fullscreen, false) => PresentationAction::EnterFullscreen,
            (PresentationMode::Fullscreen, true) => PresentationAction::ExitFullscreen,
        }
    }

    /// Applies a host change notification. Returns true when the flag
    /// actually transitioned.
    pub fn apply_change(&mut self, presenting: bool) -> bool {
        let changed = self.presenting != presenting;
        self.presenting = presenting;
        changed
    }
}

/// Viewport adjustment demanded by a presentation transition.
///
/// `redraw` asks the shell to render immediately, outside the normal tick,
/// so no stale frame is visible across the resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportChange {
    pub size: (u32, u32),
    pub redraw: bool,
}

/// Physical screen dimensions, injected so fullscreen sizing is testable
/// away from any real display.
pub trait ScreenInfo {
    fn screen_size(&self) -> (u32, u32);
}

/// Screen that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct StaticScreen {
    pub width: u32,
    pub height: u32,
}

impl StaticScreen {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ScreenInfo for StaticScreen {
    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<T> ScreenInfo for Arc<T>
where
    T: ScreenInfo + ?Sized,
{
    fn screen_size(&self) -> (u32, u32) {
        (**self).screen_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_result_selects_the_mode() {
        assert_eq!(
            PresentationMode::from_probe(false),
            PresentationMode::Fullscreen
        );
        assert_eq!(
            PresentationMode::from_probe(true),
            PresentationMode::Immersive
        );
    }

    #[test]
    fn immersive_labels_follow_change_notifications() {
        let mut state = PresentationState::new(PresentationMode::Immersive);
        assert_eq!(state.label(), "ENTER VR");
        assert!(state.apply_change(true));
        assert_eq!(state.label(), "EXIT VR");
        // Device-initiated exit, e.g. the user takes the headset off.
        assert!(state.apply_change(false));
        assert_eq!(state.label(), "ENTER VR");
    }

    #[test]
    fn fullscreen_labels_follow_change_notifications() {
        let mut state = PresentationState::new(PresentationMode::Fullscreen);
        assert_eq!(state.label(), "FULLSCREEN");
        state.apply_change(true);
        assert_eq!(state.label(), "EXIT FULLSCREEN");
    }

    #[test]
    fn click_actions_toggle_per_mode() {
        let mut state = PresentationState::new(PresentationMode::Immersive);
        assert_eq!(state.click_action(), PresentationAction::RequestPresent);
        state.apply_change(true);
        assert_eq!(state.click_action(), PresentationAction::ExitPresent);

        let mut state = PresentationState::new(PresentationMode::Fullscreen);
        assert_eq!(state.click_action(), PresentationAction::EnterFullscreen);
        state.apply_change(true);
        assert_eq!(state.click_action(), PresentationAction::ExitFullscreen);
    }

    #[test]
    fn repeated_notifications_report_no_transition() {
        let mut state = PresentationState::new(PresentationMode::Fullscreen);
        assert!(state.apply_change(true));
        assert!(!state.apply_change(true));
    }

    #[test]
    fn static_screen_reports_fixed_size() {
        assert_eq!(StaticScreen::new(2560, 1440).screen_size(), (2560, 1440));
    }
}
