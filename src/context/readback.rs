use super::passes::PassTarget;
use super::*;
use crate::shader::library::ShaderId;

/// Returns `(unpadded, padded)` bytes per row for a texture-to-buffer copy.
fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (
        unpadded_bytes_per_row,
        unpadded_bytes_per_row.div_ceil(align) * align,
    )
}

fn copy_padded_readback_rows(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    let output_size = (unpadded_bytes_per_row * height) as usize;
    output.resize(output_size, 0);

    if padded_bytes_per_row == unpadded_bytes_per_row {
        output.copy_from_slice(&data[..output_size]);
        return;
    }

    for row in 0..height {
        let padded_offset = (row * padded_bytes_per_row) as usize;
        let unpadded_offset = (row * unpadded_bytes_per_row) as usize;
        let row_data = &data[padded_offset..padded_offset + unpadded_bytes_per_row as usize];
        output[unpadded_offset..unpadded_offset + unpadded_bytes_per_row as usize]
            .copy_from_slice(row_data);
    }
}

fn map_readback_buffer_into(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    mapped_bytes: &mut Vec<u8>,
) -> Result<(), RenderError> {
    mapped_bytes.clear();

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            tracing::warn!("failed to send map_async result from callback");
        }
    });

    device
        .poll(wgpu::PollType::Wait)
        .map_err(|error| RenderError::Readback(error.to_string()))?;

    let map_result = receiver.recv().map_err(|error| {
        tracing::warn!("failed to receive mapped buffer result: {error}");
        RenderError::Readback(error.to_string())
    })?;
    if let Err(error) = map_result {
        tracing::warn!("failed to map readback buffer: {error:?}");
        return Err(RenderError::Readback(error.to_string()));
    }

    let mapped_range = buffer_slice.get_mapped_range();
    mapped_bytes.extend_from_slice(&mapped_range);
    drop(mapped_range);
    buffer.unmap();
    Ok(())
}

impl<'a> RenderContext<'a> {
    /// Copies the current texture into a standalone RGBA8 texture.
    pub fn contents(&mut self) -> Result<Texture, RenderError> {
        let (width, height) = self.size;
        let copy = Texture::allocate(
            &self.device,
            TextureSpec::rgba8(width, height),
            "contents_texture",
        )?;
        let current = self.handle(TextureRole::Current)?;
        self.units.insert(0, current);
        self.render_into(
            ShaderId::Passthrough,
            &[],
            &[],
            None,
            PassTarget::Detached(&copy),
        )?;
        Ok(copy)
    }

    /// Reads the current texture back as tightly packed RGBA8 rows, top row first.
    pub fn pixels(&mut self) -> Result<Vec<u8>, RenderError> {
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let contents = self.contents()?;
        let (unpadded_bytes_per_row, padded_bytes_per_row) = padded_bytes_per_row(width, 4);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_copy_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: contents.gpu_texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut readback_bytes = std::mem::take(&mut self.readback_bytes);
        let mapped = map_readback_buffer_into(&self.device, &buffer, &mut readback_bytes);
        let mut pixels = Vec::new();
        if mapped.is_ok() {
            copy_padded_readback_rows(
                &readback_bytes,
                height,
                unpadded_bytes_per_row,
                padded_bytes_per_row,
                &mut pixels,
            );
        }
        self.readback_bytes = readback_bytes;
        mapped.map(|_| pixels)
    }

    /// Reads the current texture back into an `image::RgbaImage`.
    pub fn to_image(&mut self) -> Result<image::RgbaImage, RenderError> {
        let (width, height) = self.size;
        let pixels = self.pixels()?;
        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::Readback("read-back length does not match size".into()))
    }
}
