use egui::Context;
use egui_wgpu::{Renderer, RendererOptions};
use egui_winit::State as EguiWinitState;
use wgpu::{Device, Queue, TextureFormat};
use winit::{event::WindowEvent, window::Window};

use crate::sim::{ColorMode, SimConfig};

/// Settings panel. All mutation of the simulation config goes through the
/// validating setters, so a dragged-out-of-range slider can never feed the
/// shaders garbage.
pub struct Gui {
    pub context: Context,
    state: EguiWinitState,
    renderer: Renderer,
}

impl Gui {
    pub fn new(window: &Window, device: &Device, output_format: TextureFormat) -> Self {
        let context = Context::default();
        let id = context.viewport_id();
        let state = EguiWinitState::new(context.clone(), id, window, None, None, None);
        let renderer = Renderer::new(device, output_format, RendererOptions::default());

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
        config: Option<&mut SimConfig>,
    ) {
        let raw_input = self.state.take_egui_input(window);
        self.context.begin_pass(raw_input);

        egui::Window::new("Fluid")
            .resizable(true)
            .default_width(220.0)
            .show(&self.context, |ui| match config {
                Some(cfg) => Self::settings_ui(ui, cfg),
                None => {
                    ui.label("GPU unavailable — simulation disabled");
                }
            });

        let output = self.context.end_pass();
        let primitives = self
            .context
            .tessellate(output.shapes, output.pixels_per_point);

        for (id, image_delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &primitives, &screen_descriptor);

        let mut render_pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        self.renderer
            .render(&mut render_pass, &primitives, &screen_descriptor);
        drop(render_pass);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn settings_ui(ui: &mut egui::Ui, cfg: &mut SimConfig) {
        ui.label("Dissipation");
        let mut velocity = cfg.velocity_dissipation();
        let mut dye = cfg.dye_dissipation();
        let mut changed = ui
            .add(egui::Slider::new(&mut velocity, 0.9..=1.0).text("Velocity"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut dye, 0.9..=1.0).text("Dye"))
            .changed();
        if changed {
            cfg.set_dissipation(velocity, dye);
        }

        ui.separator();
        let mut iterations = cfg.pressure_iterations();
        if ui
            .add(egui::Slider::new(&mut iterations, 1..=60).text("Pressure iterations"))
            .changed()
        {
            cfg.set_iterations(iterations);
        }

        let mut radius = cfg.splat_radius();
        if ui
            .add(
                egui::Slider::new(&mut radius, 0.001..=0.1)
                    .logarithmic(true)
                    .text("Splat radius"),
            )
            .changed()
        {
            cfg.set_splat_radius(radius);
        }

        let mut force = cfg.splat_force();
        if ui
            .add(egui::Slider::new(&mut force, 1.0..=50.0).text("Splat force"))
            .changed()
        {
            cfg.set_splat_force(force);
        }

        let mut brightness = cfg.brightness();
        if ui
            .add(egui::Slider::new(&mut brightness, 0.0..=4.0).text("Brightness"))
            .changed()
        {
            cfg.set_brightness(brightness);
        }

        ui.separator();
        let mut mode = cfg.color_mode();
        egui::ComboBox::from_label("Color mode")
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for candidate in ColorMode::ALL {
                    ui.selectable_value(&mut mode, candidate, candidate.label());
                }
            });
        if mode != cfg.color_mode() {
            cfg.set_color_mode(mode);
        }

        ui.separator();
        let mut sim_res = cfg.sim_resolution();
        if ui
            .add(egui::Slider::new(&mut sim_res, 64..=512).text("Solver grid"))
            .changed()
        {
            cfg.set_sim_resolution(sim_res);
        }
        let mut dye_res = cfg.dye_resolution();
        if ui
            .add(egui::Slider::new(&mut dye_res, 64..=1024).text("Dye grid"))
            .changed()
        {
            cfg.set_dye_resolution(dye_res);
        }
    }
}
