//! Lissajous - audio-driven curve visualizer
//!
//! Plays an audio file (or a synthesized interval) and draws each frequency
//! band's stereo image as a Lissajous figure, flat or in 3D.

mod cli;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use cli::Args;
use lissajous::audio::{
    wav, AudioOutput, AudioSource, LoadTicket, PlaybackEngine, SharedVoice, SymphoniaDecoder,
    SystemClock, ToneConfig,
};
use lissajous::camera::{CameraController, CameraKey, DragButton, OrbitCamera};
use lissajous::error::DecodeError;
use lissajous::params::{CameraConfig, RenderConfig};
use lissajous::rendering::SceneRenderer;
use lissajous::visualizer::Visualizer;

/// Seconds jumped by the seek keys
const SEEK_STEP_S: f64 = 5.0;

/// Sample rate used when no output device is available
const FALLBACK_RATE_HZ: u32 = 44_100;

type LoadResult = (LoadTicket, Result<AudioSource, DecodeError>);

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    renderer: Option<SceneRenderer>,
    render_config: RenderConfig,

    // Audio
    engine: PlaybackEngine,
    output: Option<AudioOutput>,
    loads: Receiver<LoadResult>,

    // Scene
    visualizer: Visualizer,
    camera: OrbitCamera,
    controller: CameraController,

    /// Transport position already rendered when running without a device
    silent_pumped_s: f64,
}

impl App {
    fn new(args: &Args) -> Result<(Self, Sender<LoadResult>), String> {
        let voice: SharedVoice = Arc::new(Mutex::new(None));
        let output = match AudioOutput::open(Arc::clone(&voice)) {
            Ok(output) => Some(output),
            Err(e) => {
                log::error!("{}; continuing without sound", e);
                None
            }
        };
        let rate = output
            .as_ref()
            .map_or(FALLBACK_RATE_HZ, AudioOutput::sample_rate);

        let engine = PlaybackEngine::with_voice(
            args.analysis_config(),
            Box::new(SystemClock::new()),
            Arc::new(SymphoniaDecoder),
            rate,
            voice,
        )
        .map_err(|e| e.to_string())?;

        let (load_tx, loads) = mpsc::channel();
        let visualizer = Visualizer::new(&engine, args.band_set(), args.curve_transform());

        let app = Self {
            window: None,
            renderer: None,
            render_config: args.render_config(),
            engine,
            output,
            loads,
            visualizer,
            camera: OrbitCamera::new(CameraConfig::default()),
            controller: CameraController::new(),
            silent_pumped_s: 0.0,
        };
        Ok((app, load_tx))
    }

    /// Decode on a worker thread; the result is committed on the event loop
    fn load_file(&mut self, path: &std::path::Path, tx: Sender<LoadResult>) -> Result<(), String> {
        let bytes =
            std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let ticket = self.engine.begin_load();
        let decoder = self.engine.decoder();
        log::info!("Decoding {}...", name);
        thread::spawn(move || {
            let result = decoder.decode(bytes, &name);
            // Receiver gone means the app is shutting down
            let _ = tx.send((ticket, result));
        });
        Ok(())
    }

    fn poll_loads(&mut self) {
        while let Ok((ticket, result)) = self.loads.try_recv() {
            match self.engine.commit_load(ticket, result) {
                Ok(Some(_)) => self.play(),
                Ok(None) => {}
                Err(e) => log::error!("Load failed: {}", e),
            }
        }
    }

    fn play(&mut self) {
        self.silent_pumped_s = self.engine.elapsed();
        if let Err(e) = self.engine.play() {
            log::warn!("Cannot play: {}", e);
        }
    }

    fn toggle_play(&mut self) {
        if self.engine.is_playing() {
            self.engine.pause();
        } else {
            self.play();
        }
    }

    fn seek_by(&mut self, delta_s: f64) {
        let target = self.engine.elapsed() + delta_s;
        if let Err(e) = self.engine.seek(target) {
            log::warn!("Seek failed: {}", e);
        }
        self.silent_pumped_s = self.engine.elapsed();
    }

    /// Without a device nothing pulls audio, so feed the taps at clock pace
    fn pump_silent_output(&mut self) {
        if self.output.is_some() || !self.engine.is_playing() {
            return;
        }
        let now = self.engine.elapsed();
        let frames = ((now - self.silent_pumped_s) * FALLBACK_RATE_HZ as f64) as usize;
        if frames > 0 {
            let mut scratch = vec![0.0; frames * 2];
            self.engine.render_offline(&mut scratch, 2);
            self.silent_pumped_s += frames as f64 / FALLBACK_RATE_HZ as f64;
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let camera_key = match code {
            KeyCode::Escape => {
                event_loop.exit();
                return;
            }
            KeyCode::Space => {
                self.toggle_play();
                return;
            }
            KeyCode::Home => {
                self.engine.stop();
                return;
            }
            KeyCode::Comma => {
                self.seek_by(-SEEK_STEP_S);
                return;
            }
            KeyCode::Period => {
                self.seek_by(SEEK_STEP_S);
                return;
            }
            KeyCode::ArrowLeft => CameraKey::RotateLeft,
            KeyCode::ArrowRight => CameraKey::RotateRight,
            KeyCode::ArrowUp => CameraKey::RotateUp,
            KeyCode::ArrowDown => CameraKey::RotateDown,
            KeyCode::KeyW => CameraKey::MoveForward,
            KeyCode::KeyS => CameraKey::MoveBack,
            KeyCode::KeyA => CameraKey::MoveLeft,
            KeyCode::KeyD => CameraKey::MoveRight,
            KeyCode::KeyQ => CameraKey::ZoomIn,
            KeyCode::KeyE => CameraKey::ZoomOut,
            KeyCode::KeyR => CameraKey::Reset,
            _ => return,
        };
        self.controller.key(&mut self.camera, camera_key);
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Lissajous")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize rendering system
        let renderer = match pollster::block_on(SceneRenderer::new(
            Arc::clone(&window),
            self.render_config.clone(),
        )) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        log::info!("Space: play/pause  Home: stop  ,/.: seek  Esc: quit");
        if self.render_config.enable_3d {
            log::info!("Drag: orbit  Shift/right drag: pan  Wheel/Q/E: zoom  R: reset");
        }

        self.window = Some(window);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat,
                        ..
                    },
                ..
            } => {
                // Transport keys ignore auto-repeat; camera keys use it
                if !(repeat && matches!(code, KeyCode::Space | KeyCode::Home)) {
                    self.handle_key(event_loop, code);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.controller.set_shift(modifiers.state().shift_key());
            }
            WindowEvent::MouseInput { state, button, .. } => match (state, button) {
                (ElementState::Pressed, MouseButton::Left) => {
                    self.controller.button_pressed(DragButton::Primary)
                }
                (ElementState::Pressed, MouseButton::Right) => {
                    self.controller.button_pressed(DragButton::Secondary)
                }
                (ElementState::Released, MouseButton::Left | MouseButton::Right) => {
                    self.controller.button_released()
                }
                _ => {}
            },
            WindowEvent::CursorMoved { position, .. } => {
                if self.render_config.enable_3d {
                    self.controller
                        .cursor_moved(&mut self.camera, position.x, position.y);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                if self.render_config.enable_3d {
                    self.controller.wheel(&mut self.camera, amount);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    /// Render a single frame
    fn render_frame(&mut self) {
        self.poll_loads();
        self.engine.tick();
        self.pump_silent_output();

        let Some(window) = &self.window else {
            return;
        };
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let curves = self.visualizer.build_frame(&self.engine);
        let size = window.inner_size();

        if let Err(e) = renderer.render((size.width, size.height), &curves, &self.camera) {
            log::warn!("Render error: {}", e);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let preset = args.parse_preset()?;

    if let (Some(path), Some(preset)) = (&args.export_wav, preset) {
        let source = preset
            .render(&ToneConfig::default())
            .map_err(|e| e.to_string())?;
        wav::write_wav(path, &source).map_err(|e| e.to_string())?;
        return Ok(());
    }

    let (mut app, load_tx) = App::new(args)?;

    if let Some(preset) = preset {
        log::info!("Demo tone: {}", preset.name());
        let source = preset
            .render(&ToneConfig::default())
            .map_err(|e| e.to_string())?;
        app.engine.load_source(source).map_err(|e| e.to_string())?;
        app.play();
    } else if let Some(path) = &args.file {
        app.load_file(path, load_tx)?;
    } else {
        log::warn!("No file or preset given; pass a FILE or --preset <id>");
    }

    let event_loop = EventLoop::new().map_err(|e| e.to_string())?;
    event_loop.run_app(&mut app).map_err(|e| e.to_string())
}
