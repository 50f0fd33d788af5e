pub struct FieldTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl FieldTexture {
    /// Allocates a zero-initialized field texture with a clamp-to-edge
    /// bilinear sampler. Zero dimensions are a programmer error.
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: Option<&str>,
    ) -> Self {
        assert!(width > 0 && height > 0, "field texture must be non-empty");

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            format,
        }
    }

    /// Normalized size of one texel.
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    /// Re-zeroes the texture contents without reallocating.
    pub fn clear(&self, queue: &wgpu::Queue) {
        let bytes_per_pixel = self.format.block_copy_size(None).unwrap_or(4);
        let zeros = vec![0u8; (self.width * self.height * bytes_per_pixel) as usize];
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &zeros,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * bytes_per_pixel),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// A read/write pair of field textures. Every pass samples `read` and writes
/// `write`; `swap` flips which is which without moving any data.
pub struct DoubleBuffer {
    buffers: [FieldTexture; 2],
    index: usize,
}

impl DoubleBuffer {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        Self {
            buffers: [
                FieldTexture::new(device, width, height, format, Some(&format!("{label} A"))),
                FieldTexture::new(device, width, height, format, Some(&format!("{label} B"))),
            ],
            index: 0,
        }
    }

    pub fn read(&self) -> &FieldTexture {
        &self.buffers[self.index]
    }

    pub fn write(&self) -> &FieldTexture {
        &self.buffers[1 - self.index]
    }

    pub fn swap(&mut self) {
        self.index = 1 - self.index;
    }

    pub fn width(&self) -> u32 {
        self.buffers[0].width
    }

    pub fn height(&self) -> u32 {
        self.buffers[0].height
    }

    pub fn texel_size(&self) -> [f32; 2] {
        self.buffers[0].texel_size()
    }

    /// Reallocates both halves at a new size. Prior contents are lost; the
    /// field visually reconverges within a few frames.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32, label: &str) {
        self.buffers = [
            FieldTexture::new(
                device,
                width,
                height,
                self.buffers[0].format,
                Some(&format!("{label} A")),
            ),
            FieldTexture::new(
                device,
                width,
                height,
                self.buffers[0].format,
                Some(&format!("{label} B")),
            ),
        ];
        self.index = 0;
    }

    pub fn clear(&self, queue: &wgpu::Queue) {
        self.buffers[0].clear(queue);
        self.buffers[1].clear(queue);
    }
}
