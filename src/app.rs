use crate::presentation::PresentationMode;
use crate::scene::Scene;
use crate::viewer::ViewerConfig;

/// Window dimensions used when the configured attributes are unset. The
/// original element tolerated a zero-sized viewport; a native window cannot.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

/// Window size for the native shell: the configured viewport, or the
/// default when either dimension is missing.
pub fn initial_window_size(config: &ViewerConfig) -> (u32, u32) {
    if config.width == 0 || config.height == 0 {
        DEFAULT_WINDOW_SIZE
    } else {
        (config.width, config.height)
    }
}

/// Human readable presentation mode for logs and summaries.
pub fn mode_summary(mode: PresentationMode, device_name: Option<&str>) -> String {
    match mode {
        PresentationMode::Fullscreen => "fullscreen".to_string(),
        PresentationMode::Immersive => {
            format!("immersive ({})", device_name.unwrap_or("unknown device"))
        }
    }
}

pub fn print_scene_summary(scene: &Scene) {
    println!(
        "Loaded scene with {} objects ({} mesh instances)",
        scene.objects.len(),
        scene.mesh_instances()
    );
    for object in &scene.objects {
        let kind = if object.is_mesh_instance() {
            "mesh"
        } else {
            "group"
        };
        println!(" - {} ({kind})", object.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_dimensions_fall_back_to_the_default_window() {
        assert_eq!(
            initial_window_size(&ViewerConfig::new("a.gltf", 0, 0)),
            DEFAULT_WINDOW_SIZE
        );
        assert_eq!(
            initial_window_size(&ViewerConfig::new("a.gltf", 800, 600)),
            (800, 600)
        );
    }

    #[test]
    fn mode_summary_names_the_device() {
        assert_eq!(
            mode_summary(PresentationMode::Fullscreen, None),
            "fullscreen"
        );
        assert_eq!(
            mode_summary(PresentationMode::Immersive, Some("Mock Headset")),
            "immersive (Mock Headset)"
        );
    }
}
