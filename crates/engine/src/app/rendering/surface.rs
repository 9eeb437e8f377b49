use std::cell::RefCell;
use std::rc::Rc;

use crate::Vec2;

use super::font::{layout_text, text_width};
use super::sprite::{SourceRect, SpriteImage};
use super::transform::Affine2;

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];

/// Axis-aligned rectangle in the local space of the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.x, self.bottom()),
        ]
    }

    /// Device-space bounding box of this rectangle under `transform`.
    pub fn transformed_bounds(&self, transform: &Affine2) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in self.corners() {
            let point = transform.apply(corner);
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        (min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Glyph height in world units.
    pub size: f32,
    pub color: Rgba,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 0.5,
            color: WHITE,
            align: TextAlign::Left,
            baseline: TextBaseline::Top,
        }
    }
}

/// Pixel target the render context draws into. Every call carries the full transform
/// and the effective alpha; implementations keep no transform state of their own.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, transform: &Affine2, rect: Rect, color: Rgba, alpha: f32);
    fn fill_ellipse(&mut self, transform: &Affine2, bounds: Rect, color: Rgba, alpha: f32);
    fn draw_image(
        &mut self,
        transform: &Affine2,
        image: &SpriteImage,
        source: SourceRect,
        dest: Rect,
        alpha: f32,
    );

    fn draw_text(
        &mut self,
        transform: &Affine2,
        text: &str,
        origin: Vec2,
        style: &TextStyle,
        alpha: f32,
    ) {
        for cell in layout_text(text, origin, style) {
            self.fill_rect(transform, cell, style.color, alpha);
        }
    }

    /// Finished RGBA8 frame, for surfaces backed by memory.
    fn rgba_frame(&self) -> Option<&[u8]> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Clear(Rgba),
    Rect(Rgba),
    Ellipse(Rgba),
    Image { width: u32, height: u32, source: SourceRect },
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub kind: DrawKind,
    pub transform: Affine2,
    pub local: Rect,
    pub device_min: Vec2,
    pub device_max: Vec2,
    pub alpha: f32,
}

/// Shared view of the commands a [`RecordingSurface`] has captured since its last clear.
#[derive(Debug, Clone, Default)]
pub struct DrawLog {
    commands: Rc<RefCell<Vec<DrawCommand>>>,
}

impl DrawLog {
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    pub fn take(&self) -> Vec<DrawCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    log: DrawLog,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: DrawLog::default(),
        }
    }

    pub fn log(&self) -> DrawLog {
        self.log.clone()
    }

    fn record(&mut self, kind: DrawKind, transform: &Affine2, local: Rect, alpha: f32) {
        let (device_min, device_max) = local.transformed_bounds(transform);
        self.log.commands.borrow_mut().push(DrawCommand {
            kind,
            transform: *transform,
            local,
            device_min,
            device_max,
            alpha,
        });
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, color: Rgba) {
        self.log.commands.borrow_mut().clear();
        let full = Rect::new(0.0, 0.0, self.width as f32, self.height as f32);
        self.record(DrawKind::Clear(color), &Affine2::IDENTITY, full, 1.0);
    }

    fn fill_rect(&mut self, transform: &Affine2, rect: Rect, color: Rgba, alpha: f32) {
        self.record(DrawKind::Rect(color), transform, rect, alpha);
    }

    fn fill_ellipse(&mut self, transform: &Affine2, bounds: Rect, color: Rgba, alpha: f32) {
        self.record(DrawKind::Ellipse(color), transform, bounds, alpha);
    }

    fn draw_image(
        &mut self,
        transform: &Affine2,
        image: &SpriteImage,
        source: SourceRect,
        dest: Rect,
        alpha: f32,
    ) {
        let kind = DrawKind::Image {
            width: image.width(),
            height: image.height(),
            source,
        };
        self.record(kind, transform, dest, alpha);
    }

    fn draw_text(
        &mut self,
        transform: &Affine2,
        text: &str,
        origin: Vec2,
        style: &TextStyle,
        alpha: f32,
    ) {
        let width = text_width(text, style.size);
        let local = Rect::new(origin.x, origin.y, width, style.size);
        self.record(DrawKind::Text(text.to_string()), transform, local, alpha);
    }
}
