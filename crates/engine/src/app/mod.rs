mod assets;
mod camera;
mod frame_driver;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use assets::{load_sprite_image, AssetError, SpriteLoader};
pub use camera::{
    Camera2D, CameraBounds, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_STEP_IN, CAMERA_ZOOM_STEP_OUT,
};
pub use frame_driver::{FrameDriver, DEFAULT_MAX_FRAME_DELTA};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    camera_affine, camera_pixels_per_world, screen_to_world, snapped_pixels_per_world,
    visible_tile_rect, world_to_screen, Affine2, Canvas, DrawCommand, DrawKind, DrawLog, Flipbook,
    ParticleSource, Rect, RecordingSurface, RenderContext, RenderContextError, Renderer, Rgba,
    SourceRect, SpriteHandle, SpriteImage, SpriteRegion, Surface, TextAlign, TextBaseline,
    TextStyle, TileRect, Transform, Viewport, BLACK, DEFAULT_STROKE_WIDTH, DEFAULT_TILE_SIZE,
    WHITE,
};
pub use scene::{Scene, SceneCommand};
