//! CPU RGBA canvas the panels are drawn into. The windowed viewer uploads it
//! as an overlay texture; headless runs write it straight to PNG.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use cell_model::Rgb;
use cell_model::charts::Rect;
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};

pub fn rgba(color: Rgb, alpha: f32) -> [u8; 4] {
    let [r, g, b] = color.to_u8();
    [r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8]
}

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Source-over blend of a translucent rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, 255);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: [u8; 4]) {
        let t = thickness.max(1.0).min(rect.width * 0.5).min(rect.height * 0.5);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - t, rect.width, t), color);
        self.fill_rect(Rect::new(rect.x, rect.y + t, t, rect.height - t * 2.0), color);
        self.fill_rect(
            Rect::new(rect.right() - t, rect.y + t, t, rect.height - t * 2.0),
            color,
        );
    }

    /// Blend a coverage mask (one byte per pixel, row-major) tinted with
    /// `color` at integer position `(left, top)`.
    pub fn blend_coverage(
        &mut self,
        left: i32,
        top: i32,
        width: usize,
        height: usize,
        coverage: &[u8],
        color: [u8; 4],
    ) {
        for gy in 0..height {
            let y = top + gy as i32;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            for gx in 0..width {
                let x = left + gx as i32;
                if x < 0 || x >= self.width as i32 {
                    continue;
                }
                let alpha = coverage.get(gy * width + gx).copied().unwrap_or(0);
                if alpha == 0 {
                    continue;
                }
                self.blend(x as u32, y as u32, color, alpha);
            }
        }
    }

    pub fn write_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let encoder = PngEncoder::new(file);
        encoder
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgba8)
            .with_context(|| format!("writing PNG to {}", path.display()))?;
        Ok(())
    }

    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.round().max(0.0) as u32;
        let y0 = rect.y.round().max(0.0) as u32;
        let x1 = (rect.right().round().max(0.0) as u32).min(self.width);
        let y1 = (rect.bottom().round().max(0.0) as u32).min(self.height);
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn blend(&mut self, x: u32, y: u32, color: [u8; 4], coverage: u8) {
        let idx = ((y * self.width + x) * 4) as usize;
        let src_a = color[3] as u32 * coverage as u32 / 255;
        if src_a == 0 {
            return;
        }
        let dst = &mut self.pixels[idx..idx + 4];
        let dst_a = dst[3] as u32;
        let out_a = src_a + dst_a * (255 - src_a) / 255;
        if out_a == 0 {
            return;
        }
        for channel in 0..3 {
            let src = color[channel] as u32 * src_a;
            let below = dst[channel] as u32 * dst_a * (255 - src_a) / 255;
            dst[channel] = ((src + below) / out_a).min(255) as u8;
        }
        dst[3] = out_a.min(255) as u8;
    }
}
