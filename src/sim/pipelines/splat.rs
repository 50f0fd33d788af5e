use wgpu::util::DeviceExt;

use super::{checked_init, compute_pipeline, storage_entry, texture_entry, uniform_entry, workgroups};
use crate::sim::pointer::Splat;
use crate::sim::texture::DoubleBuffer;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SplatUniforms {
    pub point: [f32; 2],
    pub delta: [f32; 2],
    pub color: [f32; 4],
    pub radius: f32,
    pub _pad: [f32; 3],
}

/// Stamps a Gaussian impulse into the velocity field and a matching dye
/// stamp into the dye field.
pub struct SplatPipeline {
    velocity_pipeline: wgpu::ComputePipeline,
    velocity_layout: wgpu::BindGroupLayout,
    dye_pipeline: wgpu::ComputePipeline,
    dye_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl SplatPipeline {
    pub fn new(device: &wgpu::Device) -> anyhow::Result<Self> {
        checked_init(device, "splat pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Splat Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/splat.wgsl").into()),
            });

            let velocity_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Splat Velocity Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1, false),
                        storage_entry(2, wgpu::TextureFormat::Rg32Float),
                    ],
                });
            let dye_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Splat Dye Layout"),
                entries: &[
                    uniform_entry(0),
                    texture_entry(1, false),
                    storage_entry(3, wgpu::TextureFormat::Rgba32Float),
                ],
            });

            let velocity_pipeline = compute_pipeline(
                device,
                "Splat Velocity Pipeline",
                &shader,
                &velocity_layout,
                "splat_velocity",
            );
            let dye_pipeline =
                compute_pipeline(device, "Splat Dye Pipeline", &shader, &dye_layout, "splat_dye");

            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Splat Uniforms"),
                contents: bytemuck::cast_slice(&[SplatUniforms {
                    point: [0.0, 0.0],
                    delta: [0.0, 0.0],
                    color: [0.0, 0.0, 0.0, 1.0],
                    radius: 0.01,
                    _pad: [0.0; 3],
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            Self {
                velocity_pipeline,
                velocity_layout,
                dye_pipeline,
                dye_layout,
                uniform_buffer,
            }
        })
    }

    /// Uploads the impulse parameters once; both dispatches in the same frame
    /// read the same uniforms.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, splat: &Splat, radius: f32) {
        let data = SplatUniforms {
            point: splat.position,
            delta: splat.delta,
            color: [splat.color[0], splat.color[1], splat.color[2], 1.0],
            radius,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[data]));
    }

    pub fn dispatch_velocity(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &DoubleBuffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Splat Velocity Group"),
            layout: &self.velocity_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&velocity.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&velocity.write().view),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Splat Velocity Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.velocity_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y) = workgroups(velocity.width(), velocity.height());
        pass.dispatch_workgroups(x, y, 1);
    }

    pub fn dispatch_dye(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        dye: &DoubleBuffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Splat Dye Group"),
            layout: &self.dye_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&dye.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&dye.write().view),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Splat Dye Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.dye_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y) = workgroups(dye.width(), dye.height());
        pass.dispatch_workgroups(x, y, 1);
    }
}
