use crate::error::RenderError;

/// Channel order of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba,
    Bgra,
}

/// Storage type of each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit normalized channels.
    UnsignedByte,
    /// 16-bit float channels, used for HDR-ish intermediate results (lens blur brightness).
    HalfFloat,
}

/// Everything that decides whether two textures are interchangeable as ping-pong partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSpec {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub sample_type: SampleType,
}

impl TextureSpec {
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba,
            sample_type: SampleType::UnsignedByte,
        }
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn wgpu_format(&self) -> Result<wgpu::TextureFormat, RenderError> {
        match (self.format, self.sample_type) {
            (PixelFormat::Rgba, SampleType::UnsignedByte) => Ok(wgpu::TextureFormat::Rgba8Unorm),
            (PixelFormat::Rgba, SampleType::HalfFloat) => Ok(wgpu::TextureFormat::Rgba16Float),
            (PixelFormat::Bgra, SampleType::UnsignedByte) => Ok(wgpu::TextureFormat::Bgra8Unorm),
            (PixelFormat::Bgra, SampleType::HalfFloat) => Err(RenderError::UnsupportedFormat(
                "bgra with half-float samples".into(),
            )),
        }
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width.max(1),
            height: self.height.max(1),
            depth_or_array_layers: 1,
        }
    }
}

/// Whether a texture holding `current` must be reallocated to satisfy `requested`.
pub(crate) fn needs_reallocation(current: &TextureSpec, requested: &TextureSpec) -> bool {
    current != requested
}

/// Records a single cleared render pass into `view` with the viewport covering
/// `size`, then submits it.
pub(crate) fn render_to_view<F>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
    size: (u32, u32),
    label: &str,
    draw: F,
) where
    F: FnOnce(&mut wgpu::RenderPass<'_>),
{
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some(label),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_viewport(0.0, 0.0, size.0 as f32, size.1 as f32, 0.0, 1.0);
        draw(&mut pass);
    }
    queue.submit(std::iter::once(encoder.finish()));
}

/// One GPU image buffer together with the spec it was allocated with.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    spec: TextureSpec,
}

impl Texture {
    /// Allocates an uninitialized texture usable as both sampling input and render target.
    pub fn allocate(
        device: &wgpu::Device,
        spec: TextureSpec,
        label: &str,
    ) -> Result<Self, RenderError> {
        let texture = Self::create_gpu_texture(device, &spec, label)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            spec,
        })
    }

    /// Creates an RGBA8 texture holding the contents of `image`.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
    ) -> Result<Self, RenderError> {
        let mut texture = Self::allocate(
            device,
            TextureSpec::rgba8(image.width(), image.height()),
            "image_texture",
        )?;
        texture.load_contents_of(device, queue, image)?;
        Ok(texture)
    }

    fn create_gpu_texture(
        device: &wgpu::Device,
        spec: &TextureSpec,
        label: &str,
    ) -> Result<wgpu::Texture, RenderError> {
        Ok(device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: spec.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.wgpu_format()?,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }))
    }

    fn reallocate(&mut self, device: &wgpu::Device, spec: TextureSpec) -> Result<(), RenderError> {
        tracing::debug!(
            "reallocating texture {}x{} {:?}/{:?} -> {}x{} {:?}/{:?}",
            self.spec.width,
            self.spec.height,
            self.spec.format,
            self.spec.sample_type,
            spec.width,
            spec.height,
            spec.format,
            spec.sample_type
        );
        self.texture = Self::create_gpu_texture(device, &spec, "reallocated_texture")?;
        self.view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.spec = spec;
        Ok(())
    }

    /// Uploads `image`, adopting its dimensions. The format becomes RGBA8.
    pub fn load_contents_of(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
    ) -> Result<(), RenderError> {
        self.init_from_bytes(device, queue, image.width(), image.height(), image.as_raw())
    }

    /// Replaces the contents with tightly packed RGBA8 rows, top row first.
    pub fn init_from_bytes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let expected_len = (width as usize) * (height as usize) * 4;
        if data.len() != expected_len {
            return Err(RenderError::InvalidTextureData(format!(
                "expected {expected_len} bytes for {width}x{height} rgba8, got {}",
                data.len()
            )));
        }

        self.ensure_format(device, &TextureSpec::rgba8(width, height))?;
        if width == 0 || height == 0 {
            return Ok(());
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            self.spec.extent(),
        );
        Ok(())
    }

    /// Reallocates only when the spec differs. Returns whether a new buffer was created.
    pub fn ensure_format(
        &mut self,
        device: &wgpu::Device,
        requested: &TextureSpec,
    ) -> Result<bool, RenderError> {
        if !needs_reallocation(&self.spec, requested) {
            return Ok(false);
        }
        self.reallocate(device, *requested)?;
        Ok(true)
    }

    /// Checks the texture can act as a color attachment before a pass targets it.
    pub(crate) fn validate_render_target(&self) -> Result<(), RenderError> {
        if !self
            .texture
            .usage()
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        {
            return Err(RenderError::IncompleteFramebuffer(
                "texture was not created with RENDER_ATTACHMENT usage".into(),
            ));
        }
        if self.spec.width == 0 || self.spec.height == 0 {
            return Err(RenderError::IncompleteFramebuffer(format!(
                "zero-sized attachment {}x{}",
                self.spec.width, self.spec.height
            )));
        }
        Ok(())
    }

    /// Binds this texture as the color target of a fresh render pass, sets the
    /// viewport to its size, lets `draw` record commands, then submits.
    pub fn render_to<F>(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        draw: F,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&mut wgpu::RenderPass<'_>),
    {
        self.validate_render_target()?;
        render_to_view(
            device,
            queue,
            &self.view,
            (self.spec.width, self.spec.height),
            label,
            draw,
        );
        Ok(())
    }

    pub fn spec(&self) -> TextureSpec {
        self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width
    }

    pub fn height(&self) -> u32 {
        self.spec.height
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn gpu_texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_format_decision_is_idempotent() {
        let current = TextureSpec::rgba8(64, 32);
        let requested = TextureSpec::rgba8(64, 32);
        assert!(!needs_reallocation(&current, &requested));

        let resized = current.with_size(128, 32);
        assert!(needs_reallocation(&current, &resized));
        assert!(!needs_reallocation(&resized, &resized));
    }

    #[test]
    fn sample_type_change_forces_reallocation() {
        let current = TextureSpec::rgba8(16, 16);
        let float = TextureSpec {
            sample_type: SampleType::HalfFloat,
            ..current
        };
        assert!(needs_reallocation(&current, &float));
    }

    #[test]
    fn bgra_half_float_is_rejected() {
        let spec = TextureSpec {
            width: 4,
            height: 4,
            format: PixelFormat::Bgra,
            sample_type: SampleType::HalfFloat,
        };
        assert!(matches!(
            spec.wgpu_format(),
            Err(RenderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn wgpu_formats_follow_sample_type() {
        assert_eq!(
            TextureSpec::rgba8(1, 1).wgpu_format().unwrap(),
            wgpu::TextureFormat::Rgba8Unorm
        );
        let float = TextureSpec {
            sample_type: SampleType::HalfFloat,
            ..TextureSpec::rgba8(1, 1)
        };
        assert_eq!(
            float.wgpu_format().unwrap(),
            wgpu::TextureFormat::Rgba16Float
        );
    }
}
