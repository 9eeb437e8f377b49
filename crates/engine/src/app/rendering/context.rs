use thiserror::Error;

use crate::app::Camera2D;
use crate::Vec2;

use super::sprite::{Flipbook, SourceRect, SpriteHandle, SpriteRegion};
use super::surface::{Rect, Rgba, Surface, TextStyle};
use super::transform::{
    camera_affine, screen_to_world, snapped_pixels_per_world, visible_tile_rect, world_to_screen,
    Affine2, TileRect, Transform, Viewport,
};

pub const DEFAULT_TILE_SIZE: f32 = 64.0;
pub const DEFAULT_STROKE_WIDTH: f32 = 0.02;
const DEFAULT_CLEAR_COLOR: Rgba = [0, 0, 0, 255];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderContextError {
    #[error("drawing surface has zero size ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("tile size must be a positive finite pixel count, got {0}")]
    InvalidTileSize(f32),
}

#[derive(Debug, Clone, Copy)]
struct SavedState {
    transform: Affine2,
    alpha: f32,
}

/// Owns the drawing surface and camera, and maps world-space draw calls onto the surface.
///
/// Frame lifecycle: `begin_frame` -> draw calls (optionally nested in
/// `push_transform`/`pop_transform`) -> `end_frame`.
pub struct RenderContext {
    surface: Box<dyn Surface>,
    camera: Camera2D,
    tile_size: f32,
    time: f32,
    clear_color: Rgba,
    current: Affine2,
    alpha: f32,
    stack: Vec<SavedState>,
}

impl RenderContext {
    pub fn new(
        surface: Box<dyn Surface>,
        camera: Camera2D,
        tile_size: f32,
    ) -> Result<Self, RenderContextError> {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Err(RenderContextError::EmptySurface { width, height });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(RenderContextError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            surface,
            camera,
            tile_size,
            time: 0.0,
            clear_color: DEFAULT_CLEAR_COLOR,
            current: Affine2::IDENTITY,
            alpha: 1.0,
            stack: Vec::new(),
        })
    }

    pub fn with_clear_color(mut self, clear_color: Rgba) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn viewport(&self) -> Viewport {
        let (width, height) = self.surface.size();
        Viewport { width, height }
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }

    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface.resize(width, height);
    }

    /// Whole-pixel scale the current frame is drawn with.
    pub fn pixel_scale(&self) -> f32 {
        snapped_pixels_per_world(&self.camera, self.tile_size)
    }

    pub fn transform_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current_transform(&self) -> Affine2 {
        self.current
    }

    pub fn begin_frame(&mut self, dt: f32) {
        if dt.is_finite() {
            self.time += dt;
        }
        self.current = Affine2::IDENTITY;
        self.alpha = 1.0;
        self.surface.clear(self.clear_color);
        self.stack.clear();
        self.current = camera_affine(&self.camera, self.viewport(), self.tile_size);
    }

    pub fn end_frame(&mut self) {
        self.current = Affine2::IDENTITY;
        self.alpha = 1.0;
        self.stack.clear();
    }

    pub fn push_transform(&mut self, transform: Transform) {
        self.stack.push(SavedState {
            transform: self.current,
            alpha: self.alpha,
        });
        self.current = self.current.then(transform.to_affine());
    }

    /// No-op when nothing was pushed.
    pub fn pop_transform(&mut self) {
        if let Some(saved) = self.stack.pop() {
            self.current = saved.transform;
            self.alpha = saved.alpha;
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    pub fn reset_alpha(&mut self) {
        self.alpha = 1.0;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        screen_to_world(
            Vec2::new(screen_x, screen_y),
            &self.camera,
            self.viewport(),
            self.tile_size,
        )
    }

    pub fn world_to_screen(&self, world_x: f32, world_y: f32) -> Vec2 {
        world_to_screen(
            Vec2::new(world_x, world_y),
            &self.camera,
            self.viewport(),
            self.tile_size,
        )
    }

    pub fn visible_bounds(&self) -> TileRect {
        visible_tile_rect(&self.camera, self.viewport(), self.tile_size)
    }

    /// Silently skipped until the sprite is ready.
    pub fn draw_image(&mut self, sprite: &SpriteHandle, x: f32, y: f32, width: f32, height: f32) {
        let Some(image) = sprite.image() else {
            return;
        };
        let source = image.full_rect();
        self.surface.draw_image(
            &self.current,
            image,
            source,
            Rect::new(x, y, width, height),
            self.alpha,
        );
    }

    pub fn draw_image_region(
        &mut self,
        sprite: &SpriteHandle,
        source: SourceRect,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        let Some(image) = sprite.image() else {
            return;
        };
        self.surface.draw_image(
            &self.current,
            image,
            source,
            Rect::new(x, y, width, height),
            self.alpha,
        );
    }

    pub fn draw_region(&mut self, region: &SpriteRegion, x: f32, y: f32, width: f32, height: f32) {
        match region.source {
            Some(source) => self.draw_image_region(&region.sprite, source, x, y, width, height),
            None => self.draw_image(&region.sprite, x, y, width, height),
        }
    }

    pub fn draw_flipbook(&mut self, flipbook: &Flipbook, x: f32, y: f32, width: f32, height: f32) {
        let Some(source) = flipbook.frame_source(self.time) else {
            return;
        };
        self.draw_image_region(flipbook.sprite(), source, x, y, width, height);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.surface.fill_rect(
            &self.current,
            Rect::new(x, y, width, height),
            color,
            self.alpha,
        );
    }

    /// Outline drawn inside the rectangle.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
        line_width: f32,
    ) {
        let line = line_width.max(0.0).min(width * 0.5).min(height * 0.5);
        if line <= 0.0 {
            return;
        }
        self.fill_rect(x, y, width, line, color);
        self.fill_rect(x, y + height - line, width, line, color);
        self.fill_rect(x, y + line, line, height - line * 2.0, color);
        self.fill_rect(x + width - line, y + line, line, height - line * 2.0, color);
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba) {
        self.surface.fill_ellipse(
            &self.current,
            Rect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0),
            color,
            self.alpha,
        );
    }

    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.surface
            .draw_text(&self.current, text, Vec2::new(x, y), &style, self.alpha);
    }

    /// Draws in raw screen pixels, ignoring camera and transform stack.
    pub fn draw_screen_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.surface
            .draw_text(&Affine2::IDENTITY, text, Vec2::new(x, y), &style, self.alpha);
    }

    pub fn fill_screen_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.surface.fill_rect(
            &Affine2::IDENTITY,
            Rect::new(x, y, width, height),
            color,
            self.alpha,
        );
    }
}
