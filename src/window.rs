//! Interactive window host.
//!
//! Opens a window the size of the scene's canvas, feeds cursor movement to
//! the pointer and runs one simulation frame per redraw, requesting the next
//! redraw straight away so frames follow the display refresh.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::RunError;
use crate::gpu::GpuRenderer;
use crate::simulation::Simulation;
use crate::time::FrameClock;
use crate::visuals::CanvasSize;

/// Run `simulation` in a window until it is closed.
pub fn run(simulation: Simulation) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(simulation);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    simulation: Simulation,
    window: Option<Arc<Window>>,
    renderer: Option<GpuRenderer>,
    clock: FrameClock,
    canvas: CanvasSize,
    error: Option<RunError>,
}

impl App {
    fn new(simulation: Simulation) -> Self {
        let canvas = simulation.canvas_size();
        Self {
            simulation,
            window: None,
            renderer: None,
            clock: FrameClock::new(),
            canvas,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.simulation.detach();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        self.simulation.frame(renderer);
        match renderer.present() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                self.simulation.detach();
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if let Some(fps) = self.clock.tick() {
            log::debug!(
                "{:.1} fps, {} particles, frame {}",
                fps,
                self.simulation.field().len(),
                self.simulation.frame_count()
            );
        }

        // A rebuild may have changed the canvas
        let canvas = self.simulation.canvas_size();
        if canvas != self.canvas {
            self.canvas = canvas;
            if let Some(window) = &self.window {
                let _ = window.request_inner_size(window_size(canvas));
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn window_size(canvas: CanvasSize) -> PhysicalSize<u32> {
    PhysicalSize::new(canvas.width.max(1), canvas.height.max(1))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("glyphdust")
            .with_inner_size(window_size(self.canvas))
            .with_resizable(false)
            .with_transparent(self.simulation.background().a < u8::MAX);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        log::debug!("Window opened at {}x{}", self.canvas.width, self.canvas.height);

        match pollster::block_on(GpuRenderer::new(window.clone(), self.canvas)) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => return self.fail(event_loop, e.into()),
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.simulation.detach();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::CursorMoved { .. } => {
                self.simulation.pointer_mut().handle_event(&event);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
