use super::{checked_init, compute_pipeline, storage_entry, texture_entry, workgroups};
use crate::sim::texture::{DoubleBuffer, FieldTexture};

/// Pressure projection stages: divergence, per-frame pressure clear, Jacobi
/// relaxation, and gradient subtraction. All four entry points live in one
/// shader module, each with its own bind group layout.
pub struct ProjectPipeline {
    divergence_pipeline: wgpu::ComputePipeline,
    divergence_layout: wgpu::BindGroupLayout,
    clear_pipeline: wgpu::ComputePipeline,
    clear_layout: wgpu::BindGroupLayout,
    jacobi_pipeline: wgpu::ComputePipeline,
    jacobi_layout: wgpu::BindGroupLayout,
    subtract_pipeline: wgpu::ComputePipeline,
    subtract_layout: wgpu::BindGroupLayout,
}

impl ProjectPipeline {
    pub fn new(device: &wgpu::Device) -> anyhow::Result<Self> {
        checked_init(device, "projection pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Project Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/project.wgsl").into()),
            });

            let divergence_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Divergence Layout"),
                    entries: &[
                        texture_entry(1, false),
                        storage_entry(3, wgpu::TextureFormat::R32Float),
                    ],
                });
            let clear_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Pressure Clear Layout"),
                entries: &[storage_entry(3, wgpu::TextureFormat::R32Float)],
            });
            let jacobi_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Jacobi Layout"),
                entries: &[
                    texture_entry(1, false),
                    texture_entry(2, false),
                    storage_entry(3, wgpu::TextureFormat::R32Float),
                ],
            });
            let subtract_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Subtract Gradient Layout"),
                    entries: &[
                        texture_entry(1, false),
                        texture_entry(2, false),
                        storage_entry(4, wgpu::TextureFormat::Rg32Float),
                    ],
                });

            let divergence_pipeline = compute_pipeline(
                device,
                "Divergence Pipeline",
                &shader,
                &divergence_layout,
                "divergence",
            );
            let clear_pipeline = compute_pipeline(
                device,
                "Pressure Clear Pipeline",
                &shader,
                &clear_layout,
                "clear_pressure",
            );
            let jacobi_pipeline =
                compute_pipeline(device, "Jacobi Pipeline", &shader, &jacobi_layout, "jacobi");
            let subtract_pipeline = compute_pipeline(
                device,
                "Subtract Gradient Pipeline",
                &shader,
                &subtract_layout,
                "subtract_gradient",
            );

            Self {
                divergence_pipeline,
                divergence_layout,
                clear_pipeline,
                clear_layout,
                jacobi_pipeline,
                jacobi_layout,
                subtract_pipeline,
                subtract_layout,
            }
        })
    }

    pub fn dispatch_divergence(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        velocity: &FieldTexture,
        divergence: &FieldTexture,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Divergence Group"),
            layout: &self.divergence_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&velocity.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&divergence.view),
                },
            ],
        });
        self.run(
            encoder,
            "Divergence Pass",
            &self.divergence_pipeline,
            &bind_group,
            divergence,
        );
    }

    pub fn dispatch_clear(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pressure: &FieldTexture,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pressure Clear Group"),
            layout: &self.clear_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&pressure.view),
            }],
        });
        self.run(
            encoder,
            "Pressure Clear Pass",
            &self.clear_pipeline,
            &bind_group,
            pressure,
        );
    }

    pub fn dispatch_jacobi(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pressure: &DoubleBuffer,
        divergence: &FieldTexture,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Jacobi Group"),
            layout: &self.jacobi_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&pressure.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&divergence.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&pressure.write().view),
                },
            ],
        });
        self.run(
            encoder,
            "Jacobi Pass",
            &self.jacobi_pipeline,
            &bind_group,
            divergence,
        );
    }

    pub fn dispatch_subtract(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pressure: &FieldTexture,
        velocity: &DoubleBuffer,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Subtract Gradient Group"),
            layout: &self.subtract_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&pressure.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&velocity.read().view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&velocity.write().view),
                },
            ],
        });
        self.run(
            encoder,
            "Subtract Gradient Pass",
            &self.subtract_pipeline,
            &bind_group,
            velocity.read(),
        );
    }

    fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        extent_of: &FieldTexture,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        let (x, y) = workgroups(extent_of.width, extent_of.height);
        pass.dispatch_workgroups(x, y, 1);
    }
}
