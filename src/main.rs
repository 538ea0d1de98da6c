#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = shell::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod shell {
    use std::any::Any;
    use std::env;
    use std::fmt;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;

    use anyhow::{anyhow, Context, Result};
    use log::{info, warn};
    use pollster::block_on;
    use winit::dpi::LogicalSize;
    use winit::event::{
        ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
    };
    use winit::event_loop::{ControlFlow, EventLoop};
    use winit::platform::run_return::EventLoopExtRunReturn;
    use winit::window::{Fullscreen, Window, WindowBuilder};

    use viewer360::app::{initial_window_size, mode_summary, print_scene_summary};
    use viewer360::{
        default_lighting, DeviceProbe, ImmersiveDevice, MockProbe, NoImmersiveSupport,
        PresentationAction, PresentationMode, Renderer, Scene, SceneStatus, ScreenInfo,
        ViewerConfig, ViewerController,
    };

    pub fn run() -> Result<()> {
        let options = CliOptions::parse()?;
        let config = ViewerConfig::new(options.path.clone(), options.width, options.height);

        let probe: Box<dyn DeviceProbe> = if options.mock_vr {
            Box::new(MockProbe::new())
        } else {
            Box::new(NoImmersiveSupport)
        };
        let (controller, device) = ViewerController::from_probe(config, probe.as_ref());

        match Scene::from_file(&options.path) {
            Ok(scene) => controller.scene_ready(scene),
            Err(err) => controller.scene_failed(format!("{err:#}")),
        }

        if options.summary_only {
            run_summary(&controller, device.as_deref())
        } else {
            match run_interactive(&controller, device.as_deref()) {
                Ok(()) => Ok(()),
                Err(err) => {
                    if err.downcast_ref::<WindowInitError>().is_some() {
                        eprintln!(
                            "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                        );
                        run_summary(&controller, device.as_deref())
                    } else {
                        Err(err)
                    }
                }
            }
        }
    }

    fn run_summary(
        controller: &ViewerController,
        device: Option<&dyn ImmersiveDevice>,
    ) -> Result<()> {
        match controller.scene_status() {
            SceneStatus::Ready(scene) => print_scene_summary(&scene),
            SceneStatus::Failed(message) => println!("Scene failed to load: {message}"),
            SceneStatus::Loading => println!("Scene not loaded"),
        }
        println!(
            "Presentation mode: {}",
            mode_summary(controller.mode(), device.map(|d| d.display_name()))
        );
        println!("Control label: {}", controller.button_label());
        Ok(())
    }

    fn run_interactive(
        controller: &ViewerController,
        device: Option<&dyn ImmersiveDevice>,
    ) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let event_loop =
            event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;

        let (width, height) = initial_window_size(controller.config());
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("360 Viewer")
                .with_inner_size(LogicalSize::new(width as f64, height as f64))
                .build(&event_loop)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let renderer = block_on(Renderer::new(Arc::clone(&window)))?;
        info!(
            "presentation mode: {}",
            mode_summary(controller.mode(), device.map(|d| d.display_name()))
        );

        let mut app = AppShell {
            renderer,
            controller,
            device,
            screen: MonitorScreen {
                window: Arc::clone(&window),
            },
            cursor_x: 0.0,
            last_error: None,
        };

        let mut event_loop = event_loop;
        event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;
            if let Err(err) = app.process_event(&event, control_flow) {
                app.last_error = Some(err);
                control_flow.set_exit();
            }
        });

        if let Some(err) = app.last_error {
            return Err(err);
        }
        Ok(())
    }

    struct AppShell<'a> {
        renderer: Renderer,
        controller: &'a ViewerController,
        device: Option<&'a dyn ImmersiveDevice>,
        screen: MonitorScreen,
        cursor_x: f32,
        last_error: Option<anyhow::Error>,
    }

    impl AppShell<'_> {
        fn process_event(
            &mut self,
            event: &Event<()>,
            control_flow: &mut ControlFlow,
        ) -> Result<()> {
            match event {
                Event::WindowEvent { event, window_id }
                    if *window_id == self.renderer.window_id() =>
                {
                    match event {
                        WindowEvent::CloseRequested => {
                            control_flow.set_exit();
                        }
                        WindowEvent::Resized(size) => {
                            self.renderer.resize(*size);
                            self.observe_fullscreen_state();
                        }
                        WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                            self.renderer.resize(**new_inner_size);
                        }
                        WindowEvent::KeyboardInput { input, .. } => {
                            self.handle_keyboard(input);
                        }
                        WindowEvent::MouseInput { state, button, .. } => {
                            self.handle_mouse_button(*state, *button);
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            self.cursor_x = position.x as f32;
                        }
                        _ => {}
                    }
                }
                Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                    self.draw_frame()?;
                }
                Event::MainEventsCleared => {
                    self.observe_device_state();
                    self.renderer.window().request_redraw();
                }
                _ => {}
            }
            Ok(())
        }

        fn draw_frame(&mut self) -> Result<()> {
            self.controller.tick();
            let params = self.controller.camera_params(self.renderer.size());
            self.renderer.update_globals(&params, &default_lighting());
            let objects = self.controller.scene_objects();
            if let Err(err) = self.renderer.render(&objects) {
                match err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        let size = self.renderer.window().inner_size();
                        self.renderer.resize(size);
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        return Err(anyhow!("GPU is out of memory"));
                    }
                    wgpu::SurfaceError::Timeout => {
                        info!("Surface timeout; retrying next frame");
                    }
                }
            }
            Ok(())
        }

        /// Left button stands in for the pointer; press position maps to a
        /// motion intent, release clears them all.
        fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
            if button != MouseButton::Left {
                return;
            }
            match state {
                ElementState::Pressed => {
                    let width = self.renderer.size().0 as f32;
                    self.controller.pointer_down(self.cursor_x, width);
                }
                ElementState::Released => self.controller.pointer_up(),
            }
        }

        /// Enter or F stands in for the overlay button of the browser shell.
        fn handle_keyboard(&mut self, input: &KeyboardInput) {
            if input.state != ElementState::Pressed {
                return;
            }
            match input.virtual_keycode {
                Some(VirtualKeyCode::Return) | Some(VirtualKeyCode::F) => {
                    self.toggle_presentation();
                }
                _ => {}
            }
        }

        fn toggle_presentation(&mut self) {
            match self.controller.click_action() {
                PresentationAction::EnterFullscreen => {
                    self.renderer
                        .window()
                        .set_fullscreen(Some(Fullscreen::Borderless(None)));
                }
                PresentationAction::ExitFullscreen => {
                    self.renderer.window().set_fullscreen(None);
                }
                PresentationAction::RequestPresent => {
                    if let Some(device) = self.device {
                        if let Err(err) = device.request_present() {
                            warn!("presentation request failed: {err}");
                        }
                    }
                }
                PresentationAction::ExitPresent => {
                    if let Some(device) = self.device {
                        if let Err(err) = device.exit_present() {
                            warn!("presentation exit failed: {err}");
                        }
                    }
                }
            }
        }

        /// The native analog of the fullscreen-change notification: observe
        /// the window state whenever the size moves.
        fn observe_fullscreen_state(&mut self) {
            if self.controller.mode() != PresentationMode::Fullscreen {
                return;
            }
            let presenting = self.renderer.window().fullscreen().is_some();
            if let Some(change) = self
                .controller
                .presentation_changed(presenting, &self.screen)
            {
                info!(
                    "presentation change: {} ({}x{})",
                    self.controller.button_label(),
                    change.size.0,
                    change.size.1
                );
                if change.redraw {
                    self.renderer.window().request_redraw();
                }
            }
        }

        /// The native analog of the present-change notification for the
        /// mock headset: poll the device and let the controller observe
        /// transitions.
        fn observe_device_state(&mut self) {
            let Some(device) = self.device else {
                return;
            };
            let presenting = device.is_presenting();
            if presenting != self.controller.is_presenting() {
                self.controller
                    .presentation_changed(presenting, &self.screen);
                info!("presentation change: {}", self.controller.button_label());
            }
        }
    }

    /// Physical screen dimensions from the window's current monitor.
    struct MonitorScreen {
        window: Arc<Window>,
    }

    impl ScreenInfo for MonitorScreen {
        fn screen_size(&self) -> (u32, u32) {
            self.window
                .current_monitor()
                .map(|monitor| {
                    let size = monitor.size();
                    (size.width, size.height)
                })
                .unwrap_or(viewer360::app::DEFAULT_WINDOW_SIZE)
        }
    }

    #[derive(Debug)]
    struct WindowInitError {
        message: String,
    }

    impl WindowInitError {
        fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {}", panic_message(panic)),
            }
        }

        fn from_error(stage: &str, err: impl fmt::Display) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {err}"),
            }
        }
    }

    impl fmt::Display for WindowInitError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl std::error::Error for WindowInitError {}

    fn panic_message(panic: Box<dyn Any + Send>) -> String {
        match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        }
    }

    struct CliOptions {
        path: String,
        width: u32,
        height: u32,
        mock_vr: bool,
        summary_only: bool,
    }

    impl CliOptions {
        fn parse() -> Result<Self> {
            let mut args = env::args().skip(1);
            let Some(path) = args.next() else {
                return Err(anyhow!(
                    "Usage: viewer360 <scene.gltf> [--width N] [--height N] [--mock-vr] [--summary-only]"
                ));
            };
            let mut width = 0;
            let mut height = 0;
            let mut mock_vr = false;
            let mut summary_only = false;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--width" => width = parse_dimension_arg(&mut args, "--width")?,
                    "--height" => height = parse_dimension_arg(&mut args, "--height")?,
                    "--mock-vr" => mock_vr = true,
                    "--summary-only" => summary_only = true,
                    other => {
                        return Err(anyhow!(
                            "Unknown argument: {other}. Expected --width, --height, --mock-vr or --summary-only"
                        ));
                    }
                }
            }
            Ok(Self {
                path,
                width,
                height,
                mock_vr,
                summary_only,
            })
        }
    }

    fn parse_dimension_arg(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<u32> {
        let value = args
            .next()
            .ok_or_else(|| anyhow!("{flag} expects a value"))?;
        value
            .parse::<u32>()
            .with_context(|| format!("{flag} expects an integer, got {value}"))
    }
}
