use std::iter;
use std::sync::Arc;
use std::time::Instant;

use winit::event::{ElementState, MouseButton};
use winit::{
    event_loop::ActiveEventLoop,
    keyboard::KeyCode,
    window::{Fullscreen, Window},
};

use crate::gui::Gui;
use crate::sim::{FluidCanvas, SimConfig};
use crate::wgpu_init::wgpu_init;

/// Host shell: owns the surface and render loop and drives the fluid canvas.
/// If the simulation failed to initialize the shell keeps presenting blank
/// frames — decorative infrastructure must never take the host down.
pub struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub is_surface_configured: bool,
    pub window: Arc<Window>,

    gui: Gui,
    canvas: Option<FluidCanvas>,
    last_frame: Instant,
}

impl State {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<State> {
        let (surface, device, queue, config) = wgpu_init(window.clone()).await?;

        let gui = Gui::new(&window, &device, config.format);

        let canvas = match FluidCanvas::new(&device, config.format, SimConfig::default()) {
            Ok(canvas) => Some(canvas),
            Err(err) => {
                log::error!("fluid simulation disabled: {err:#}");
                None
            }
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            is_surface_configured: false,
            window,
            gui,
            canvas,
            last_frame: Instant::now(),
        })
    }

    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        let window = self.window.clone();
        self.gui.handle_event(&window, event)
    }

    pub fn handle_pointer_moved(&mut self, x: f64, y: f64) {
        let (w, h) = (self.config.width.max(1), self.config.height.max(1));
        if let Some(canvas) = &mut self.canvas {
            canvas.pointer_move(x as f32 / w as f32, y as f32 / h as f32);
        }
    }

    pub fn handle_pointer_button(
        &mut self,
        state: ElementState,
        button: MouseButton,
        cursor: [f64; 2],
    ) {
        if button != MouseButton::Left {
            return;
        }
        let (w, h) = (self.config.width.max(1), self.config.height.max(1));
        if let Some(canvas) = &mut self.canvas {
            match state {
                ElementState::Pressed => canvas
                    .pointer_down(cursor[0] as f32 / w as f32, cursor[1] as f32 / h as f32),
                ElementState::Released => canvas.pointer_up(),
            }
        }
    }

    /// Surface resize. Only surface-resolution resources change; simulation
    /// grids and config values are untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::F11 => match self.window.fullscreen() {
                Some(_) => self.window.set_fullscreen(None),
                None => self
                    .window
                    .set_fullscreen(Some(Fullscreen::Borderless(None))),
            },
            KeyCode::Delete => {
                if let Some(canvas) = &mut self.canvas {
                    canvas.request_clear();
                }
            }
            _ => {}
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.window.request_redraw();
        if !self.is_surface_configured {
            return Ok(());
        }

        let delta = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if let Some(canvas) = &mut self.canvas {
            canvas.step(&self.device, &self.queue, &mut encoder, delta);
            canvas.render(&self.device, &self.queue, &mut encoder, &view);
        } else {
            // Degraded mode: present a blank frame.
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blank Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let window = self.window.clone();
        self.gui.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &window,
            &view,
            screen_descriptor,
            self.canvas.as_mut().map(|c| c.config_mut()),
        );

        self.queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
