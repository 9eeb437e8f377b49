use crate::Vec2;

use super::sprite::{SourceRect, SpriteImage};
use super::surface::{Rect, Rgba, Surface};
use super::transform::Affine2;

/// CPU RGBA8 rasterizer. Shapes are filled by mapping each covered device pixel centre back
/// into local space, so arbitrary rotation and scale from the transform stack work.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    frame: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; frame_len(width, height)],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.frame.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.frame
    }

    fn rasterize<F>(&mut self, transform: &Affine2, local: Rect, alpha: f32, mut shade: F)
    where
        F: FnMut(Vec2) -> Option<Rgba>,
    {
        if local.width <= 0.0 || local.height <= 0.0 || alpha <= 0.0 {
            return;
        }
        let Some(inverse) = transform.inverse() else {
            return;
        };
        let (min, max) = local.transformed_bounds(transform);
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return;
        }

        let x0 = min.x.floor().max(0.0) as i32;
        let y0 = min.y.floor().max(0.0) as i32;
        let x1 = max.x.ceil().min(self.width as f32) as i32;
        let y1 = max.y.ceil().min(self.height as f32) as i32;
        let width = self.width as usize;

        for py in y0..y1 {
            for px in x0..x1 {
                let p = inverse.apply(Vec2::new(px as f32 + 0.5, py as f32 + 0.5));
                if p.x < local.x || p.x >= local.right() || p.y < local.y || p.y >= local.bottom() {
                    continue;
                }
                if let Some(color) = shade(p) {
                    blend_pixel_clipped(&mut self.frame, width, px, py, color, alpha);
                }
            }
        }
    }
}

impl Surface for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.frame.resize(frame_len(width, height), 0);
    }

    fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, transform: &Affine2, rect: Rect, color: Rgba, alpha: f32) {
        self.rasterize(transform, rect, alpha, |_| Some(color));
    }

    fn fill_ellipse(&mut self, transform: &Affine2, bounds: Rect, color: Rgba, alpha: f32) {
        let rx = bounds.width * 0.5;
        let ry = bounds.height * 0.5;
        let center = Vec2::new(bounds.x + rx, bounds.y + ry);
        self.rasterize(transform, bounds, alpha, |p| {
            let nx = (p.x - center.x) / rx;
            let ny = (p.y - center.y) / ry;
            (nx * nx + ny * ny <= 1.0).then_some(color)
        });
    }

    fn draw_image(
        &mut self,
        transform: &Affine2,
        image: &SpriteImage,
        source: SourceRect,
        dest: Rect,
        alpha: f32,
    ) {
        let Some(source) = clamp_source(image, source) else {
            return;
        };
        self.rasterize(transform, dest, alpha, |p| {
            let u = (p.x - dest.x) / dest.width;
            let v = (p.y - dest.y) / dest.height;
            let sx = source.x + ((u * source.width as f32) as u32).min(source.width - 1);
            let sy = source.y + ((v * source.height as f32) as u32).min(source.height - 1);
            let texel = image.pixel(sx, sy);
            (texel[3] != 0).then_some(texel)
        });
    }

    fn rgba_frame(&self) -> Option<&[u8]> {
        Some(&self.frame)
    }
}

fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn clamp_source(image: &SpriteImage, source: SourceRect) -> Option<SourceRect> {
    if source.x >= image.width() || source.y >= image.height() {
        return None;
    }
    let width = source.width.min(image.width() - source.x);
    let height = source.height.min(image.height() - source.y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(SourceRect {
        x: source.x,
        y: source.y,
        width,
        height,
    })
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba, alpha: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };

    let a = (color[3] as f32 / 255.0) * alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    if a >= 1.0 {
        dst.copy_from_slice(&color);
        return;
    }
    let inv = 1.0 - a;
    for channel in 0..3 {
        dst[channel] = (color[channel] as f32 * a + dst[channel] as f32 * inv).round() as u8;
    }
    dst[3] = (255.0 * a + dst[3] as f32 * inv).round().min(255.0) as u8;
}
