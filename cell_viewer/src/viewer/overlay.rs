//! Window-sized texture that carries the CPU-drawn panels to the GPU.

use std::borrow::Cow;

use anyhow::{Result, ensure};
use winit::dpi::PhysicalSize;

use crate::canvas::Canvas;

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl TextureUpload<'_> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows to the copy alignment `write_texture` requires. Already
/// aligned buffers are borrowed as-is.
pub fn prepare_rgba_upload(width: u32, height: u32, data: &[u8]) -> Result<TextureUpload<'_>> {
    ensure!(width > 0 && height > 0, "overlay has no dimensions");
    let row_bytes = 4 * width as usize;
    let rows = height as usize;
    ensure!(
        data.len() >= row_bytes * rows,
        "overlay buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * rows
    );

    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    if row_bytes % alignment == 0 {
        return Ok(TextureUpload {
            data: Cow::Borrowed(&data[..row_bytes * rows]),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * rows];
    for (src, dst) in data
        .chunks_exact(row_bytes)
        .take(rows)
        .zip(buffer.chunks_exact_mut(padded_row_bytes))
    {
        dst[..row_bytes].copy_from_slice(src);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

pub(super) struct OverlayTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: PhysicalSize<u32>,
}

impl OverlayTexture {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: PhysicalSize<u32>,
    ) -> Self {
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("panel-overlay-texture"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panel-overlay-bind-group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            texture,
            bind_group,
            size,
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Copy `canvas` into the texture. A canvas of a different size than the
    /// texture is skipped; the caller rebuilds both on resize.
    pub fn upload(&self, queue: &wgpu::Queue, canvas: &Canvas) {
        if canvas.width() != self.size.width || canvas.height() != self.size.height {
            log::debug!(
                "skipping overlay upload: canvas {}x{} vs texture {}x{}",
                canvas.width(),
                canvas.height(),
                self.size.width,
                self.size.height
            );
            return;
        }
        let upload = match prepare_rgba_upload(canvas.width(), canvas.height(), canvas.pixels()) {
            Ok(upload) => upload,
            Err(err) => {
                log::warn!("overlay upload failed: {err:#}");
                return;
            }
        };
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(self.size.height),
            },
            extent(self.size),
        );
    }
}

fn extent(size: PhysicalSize<u32>) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_rows_are_borrowed() -> Result<()> {
        let width = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT / 4;
        let data = vec![7u8; (width * 4 * 2) as usize];
        let upload = prepare_rgba_upload(width, 2, &data)?;
        assert!(matches!(upload.data, Cow::Borrowed(_)));
        assert_eq!(upload.bytes_per_row(), width * 4);
        Ok(())
    }

    #[test]
    fn unaligned_rows_are_padded() -> Result<()> {
        let data: Vec<u8> = (0..3 * 4 * 2).map(|value| value as u8).collect();
        let upload = prepare_rgba_upload(3, 2, &data)?;
        let stride = upload.bytes_per_row() as usize;
        assert_eq!(stride % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize, 0);
        assert_eq!(&upload.pixels()[..12], &data[..12]);
        assert_eq!(&upload.pixels()[stride..stride + 12], &data[12..24]);
        Ok(())
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(prepare_rgba_upload(4, 4, &[0; 8]).is_err());
        assert!(prepare_rgba_upload(0, 4, &[]).is_err());
    }
}
