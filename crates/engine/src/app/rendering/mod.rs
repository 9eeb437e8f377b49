mod canvas;
mod context;
mod font;
mod renderer;
mod sprite;
mod surface;
mod transform;

pub use canvas::Canvas;
pub use context::{RenderContext, RenderContextError, DEFAULT_STROKE_WIDTH, DEFAULT_TILE_SIZE};
pub use renderer::Renderer;
pub use sprite::{Flipbook, ParticleSource, SourceRect, SpriteHandle, SpriteImage, SpriteRegion};
pub use surface::{
    DrawCommand, DrawKind, DrawLog, Rect, RecordingSurface, Rgba, Surface, TextAlign,
    TextBaseline, TextStyle, BLACK, WHITE,
};
pub use transform::{
    camera_affine, camera_pixels_per_world, screen_to_world, snapped_pixels_per_world,
    visible_tile_rect, world_to_screen, Affine2, TileRect, Transform, Viewport,
};
