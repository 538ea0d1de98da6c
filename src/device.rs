use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Error returned when a device refuses to start or stop presenting.
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("device rejected the presentation request: {0}")]
    Rejected(String),
    #[error("device is no longer connected")]
    Disconnected,
}

/// Handle to an enumerated head-mounted display.
///
/// The trait deliberately covers only the presentation surface the viewer
/// drives; pose streaming, eye parameters and frame submission belong to the
/// host rendering path. Handles are not required to be thread-safe: the host
/// event loop serializes every access, and browser handles wrap JS objects
/// that cannot leave their thread.
pub trait ImmersiveDevice {
    /// Human readable device name, for logs and summaries.
    fn display_name(&self) -> &str;

    /// Whether the device is currently presenting. Change notifications,
    /// not the return value of a request, are the source of truth the
    /// viewer acts on.
    fn is_presenting(&self) -> bool;

    fn request_present(&self) -> Result<(), PresentError>;

    fn exit_present(&self) -> Result<(), PresentError>;
}

/// One-shot query for an immersive display.
///
/// Absence of the capability and an empty enumeration are the same
/// non-error outcome, so `probe` returns an `Option` rather than a
/// `Result`. The viewer defers the rest of its initialization until the
/// probe has resolved.
pub trait DeviceProbe {
    fn probe(&self) -> Option<Box<dyn ImmersiveDevice>>;
}

/// Probe for hosts without any immersive display capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImmersiveSupport;

impl DeviceProbe for NoImmersiveSupport {
    fn probe(&self) -> Option<Box<dyn ImmersiveDevice>> {
        None
    }
}

/// In-process stand-in for a headset.
///
/// Presentation state is shared through the handle clones, so a shell can
/// keep one reference for change polling while the viewer drives another.
#[derive(Debug, Clone, Default)]
pub struct MockHeadset {
    presenting: Arc<RwLock<bool>>,
}

impl MockHeadset {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImmersiveDevice for MockHeadset {
    fn display_name(&self) -> &str {
        "Mock Headset"
    }

    fn is_presenting(&self) -> bool {
        *self.presenting.read()
    }

    fn request_present(&self) -> Result<(), PresentError> {
        *self.presenting.write() = true;
        Ok(())
    }

    fn exit_present(&self) -> Result<(), PresentError> {
        *self.presenting.write() = false;
        Ok(())
    }
}

/// Probe that always enumerates a [`MockHeadset`].
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    headset: MockHeadset,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared headset the probe hands out.
    pub fn headset(&self) -> MockHeadset {
        self.headset.clone()
    }
}

impl DeviceProbe for MockProbe {
    fn probe(&self) -> Option<Box<dyn ImmersiveDevice>> {
        Some(Box::new(self.headset.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_capability_is_not_an_error() {
        assert!(NoImmersiveSupport.probe().is_none());
    }

    #[test]
    fn mock_probe_enumerates_a_device() {
        let probe = MockProbe::new();
        let device = probe.probe().unwrap();
        assert_eq!(device.display_name(), "Mock Headset");
        assert!(!device.is_presenting());
    }

    #[test]
    fn present_state_is_shared_across_handles() {
        let probe = MockProbe::new();
        let device = probe.probe().unwrap();
        let observer = probe.headset();
        device.request_present().unwrap();
        assert!(observer.is_presenting());
        device.exit_present().unwrap();
        assert!(!observer.is_presenting());
    }
}
