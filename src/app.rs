//! Interactive window shell.
//!
//! Owns the engine, the renderer, the frame clock and the input state,
//! and wires them together once per redraw:
//!
//! 1. run the commands for keys pressed since the last frame
//! 2. update the drag target from the held inputs
//! 3. step the engine (unless paused)
//! 4. upload and draw the frame (unless it was not drawable)

use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::commands::{drag_target, Command, Outcome};
use crate::config::{Canvas, Settings};
use crate::engine::Engine;
use crate::error::AppError;
use crate::gpu::Renderer;
use crate::input::{Input, KeyCode};
use crate::textures::TextureConfig;
use crate::time::Time;
use crate::visuals::RenderConfig;

const TITLE: &str = "dustfield";

/// Open a window and run until it is closed.
///
/// The particle field is created before the window opens, so a rejected
/// particle count fails here rather than after the GPU is up.
pub fn run(settings: Settings, canvas: Canvas, image: Option<TextureConfig>) -> Result<(), AppError> {
    let mut engine = Engine::with_spawner(
        settings.sim.clone(),
        canvas,
        settings.layout,
        crate::spawn::SpawnContext::new(),
    )?;
    engine.resize(settings.particles)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine, settings.render, image);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    engine: Engine,
    render: RenderConfig,
    image: TextureConfig,
    time: Time,
    input: Input,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    /// Set when the loop had to stop on a failure.
    error: Option<AppError>,
}

impl App {
    fn new(engine: Engine, mut render: RenderConfig, image: Option<TextureConfig>) -> Self {
        let image = match image {
            Some(image) => image,
            None => {
                if render.read_from_texture {
                    log::warn!("colouring from an image was requested but no image was given");
                    render.read_from_texture = false;
                }
                TextureConfig::default()
            }
        };
        let canvas = engine.canvas();
        let window_size = (canvas.width as u32, canvas.height as u32);
        Self {
            input: Input::new(window_size, canvas.size()),
            engine,
            render,
            image,
            time: Time::new(),
            window: None,
            renderer: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    /// Follow a window resize. Particles keep their positions.
    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height);
        }
        let canvas = Canvas::new(size.width as f32, size.height as f32);
        self.engine.set_canvas(canvas);
        self.input.set_sizes((size.width, size.height), canvas.size());
        log::debug!("canvas resized to {}x{}", size.width, size.height);
    }

    /// Run the commands queued since the last frame. Returns `false` when
    /// the session should end.
    fn run_commands(&mut self) -> bool {
        let pointer: Vec2 = self.input.pointer();
        for &press in self.input.pressed() {
            if press.key == KeyCode::Escape {
                return false;
            }
            let Some(command) = Command::from_press(press) else {
                continue;
            };
            match command.execute(&mut self.engine, pointer) {
                Outcome::TogglePause => {
                    let paused = self.time.toggle_pause();
                    log::info!("{}", if paused { "paused" } else { "resumed" });
                }
                Outcome::Rejected => log::debug!("{:?} rejected", command),
                Outcome::Done => {}
            }
        }
        self.input.begin_frame();
        true
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.run_commands() {
            event_loop.exit();
            return;
        }

        let center = self.engine.canvas().center();
        self.engine.set_drag_target(drag_target(&self.input, center));

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let draw = match self.time.tick() {
            Some(dt) => {
                let frame = self.engine.step(dt);
                let drawable = frame.report.drawable();
                if drawable {
                    renderer.upload(frame.output);
                }
                drawable
            }
            None => false,
        };

        let coefficients = self.render.color_coefficients(self.time.wall_millis());
        match renderer.render(&self.render, coefficients, draw) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let canvas = self.engine.canvas();
        let window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(canvas.width as u32, canvas.height as u32));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        let renderer = match pollster::block_on(Renderer::new(window.clone(), &self.render, &self.image)) {
            Ok(renderer) => renderer,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let (width, height) = renderer.size();
        self.renderer = Some(renderer);
        self.window = Some(window.clone());

        // the window manager may not honour the requested size
        if (width, height) != (canvas.width as u32, canvas.height as u32) {
            self.resize(PhysicalSize::new(width, height));
            let config = self.engine.config();
            let (radius, center) = (config.spawn_radius, self.engine.canvas().center());
            self.engine.respawn_filled(center, radius);
        }

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
