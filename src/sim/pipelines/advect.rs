use wgpu::util::DeviceExt;

use super::{
    checked_init, compute_pipeline, sampler_entry, storage_entry, texture_entry, uniform_entry,
    workgroups,
};
use crate::sim::texture::{DoubleBuffer, FieldTexture};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AdvectUniforms {
    pub sim_texel: [f32; 2],
    pub dt: f32,
    pub dissipation: f32,
}

/// Semi-Lagrangian transport for velocity (self-advection) and for the dye
/// field. Separate uniform buffers so both dispatches can carry different
/// dissipation factors within one encoder.
pub struct AdvectPipeline {
    velocity_pipeline: wgpu::ComputePipeline,
    velocity_layout: wgpu::BindGroupLayout,
    velocity_uniforms: wgpu::Buffer,
    field_pipeline: wgpu::ComputePipeline,
    field_layout: wgpu::BindGroupLayout,
    field_uniforms: wgpu::Buffer,
}

impl AdvectPipeline {
    pub fn new(device: &wgpu::Device) -> anyhow::Result<Self> {
        checked_init(device, "advection pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Advect Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/advect.wgsl").into()),
            });

            let velocity_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Advect Velocity Layout"),
                    entries: &[
                        uniform_entry(0),
                        texture_entry(1, true),
                        storage_entry(3, wgpu::TextureFormat::Rg32Float),
                        sampler_entry(5),
                    ],
                });
            let field_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Advect Field Layout"),
                entries: &[
                    uniform_entry(0),
                    texture_entry(1, true),
                    texture_entry(2, true),
                    storage_entry(4, wgpu::TextureFormat::Rgba32Float),
                    sampler_entry(5),
                ],
            });

            let velocity_pipeline = compute_pipeline(
                device,
                "Advect Velocity Pipeline",
                &shader,
                &velocity_layout,
                "advect_velocity",
            );
            let field_pipeline = compute_pipeline(
                device,
                "Advect Field Pipeline",
                &shader,
                &field_layout,
                "advect_field",
            );

            let make_uniforms = |label: &str| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(&[AdvectUniforms {
                        sim_texel: [0.0, 0.0],
                        dt: 0.0,
                        dissipation: 1.0,
                    }]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            };
            let velocity_uniforms = make_uniforms("Advect Velocity Uniforms");
            let field_uniforms = make_uniforms("Advect Field Uniforms");

            Self {
                velocity_pipeline,
                velocity_layout,
                velocity_uniforms,
                field_pipeline,
                field_layout,
                field_uniforms,
            }
        })
    }

    pub fn dispatch_velocity(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &DoubleBuffer,
        dt: f32,
        dissipation: f32,
    ) {
        let uniforms = AdvectUniforms {
            sim_texel: velocity.texel_size(),
            dt,
            dissipation,
        };
        queue.write_buffer(&self.velocity_uniforms, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Advect Velocity Group"),
            layout: &self.velocity_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.velocity_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&velocity.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&velocity.write().view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&velocity.read().sampler),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Advect Velocity Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.velocity_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y) = workgroups(velocity.width(), velocity.height());
        pass.dispatch_workgroups(x, y, 1);
    }

    pub fn dispatch_field(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &FieldTexture,
        field: &DoubleBuffer,
        dt: f32,
        dissipation: f32,
    ) {
        let uniforms = AdvectUniforms {
            sim_texel: velocity.texel_size(),
            dt,
            dissipation,
        };
        queue.write_buffer(&self.field_uniforms, 0, bytemuck::cast_slice(&[uniforms]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Advect Field Group"),
            layout: &self.field_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.field_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&velocity.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&field.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&field.write().view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&field.read().sampler),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Advect Field Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.field_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        let (x, y) = workgroups(field.width(), field.height());
        pass.dispatch_workgroups(x, y, 1);
    }
}
