use crate::app::Camera2D;
use crate::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// Local transform pushed around nested draw calls. Rotation and scale pivot around
/// `center`; `translation` is applied outside the pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec2,
    pub rotation_radians: f32,
    pub scale: Vec2,
    pub center: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            rotation_radians: 0.0,
            scale: Vec2::ONE,
            center: Vec2::ZERO,
        }
    }
}

impl Transform {
    pub fn translate(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation_radians = radians;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec2::splat(scale))
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// translate(t) -> translate(c) -> rotate(r) -> scale(s) -> translate(-c)
    pub fn to_affine(&self) -> Affine2 {
        Affine2::translation(self.translation)
            .then(Affine2::translation(self.center))
            .then(Affine2::rotation(self.rotation_radians))
            .then(Affine2::scale(self.scale))
            .then(Affine2::translation(-self.center))
    }
}

/// Row-major 2x3 affine matrix: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2 {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(offset: Vec2) -> Self {
        Self {
            e: offset.x,
            f: offset.y,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn scale(scale: Vec2) -> Self {
        Self {
            a: scale.x,
            d: scale.y,
            ..Self::IDENTITY
        }
    }

    /// `self * local`: `local` is applied to points first.
    pub fn then(&self, local: Affine2) -> Affine2 {
        Affine2 {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn apply(&self, point: Vec2) -> Vec2 {
        Vec2 {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }

    pub fn inverse(&self) -> Option<Affine2> {
        let det = self.a * self.d - self.b * self.c;
        if !det.is_finite() || det.abs() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        let inv = det.recip();
        Some(Affine2 {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Inclusive integer tile rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileRect {
    pub fn contains_tile(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Closed-interval overlap test against a world-space box.
    pub fn intersects_box(&self, min: Vec2, max: Vec2) -> bool {
        max.x >= self.min_x as f32
            && min.x <= self.max_x as f32
            && max.y >= self.min_y as f32
            && min.y <= self.max_y as f32
    }
}

pub fn camera_pixels_per_world(camera: &Camera2D, tile_size: f32) -> f32 {
    let pixels_per_world = tile_size * camera.zoom();
    if pixels_per_world.is_finite() && pixels_per_world > f32::EPSILON {
        pixels_per_world
    } else {
        tile_size.max(1.0)
    }
}

/// Whole-pixel scale used for drawing so adjacent tile edges land on the same pixel.
pub fn snapped_pixels_per_world(camera: &Camera2D, tile_size: f32) -> f32 {
    camera_pixels_per_world(camera, tile_size).round().max(1.0)
}

/// Camera transform applied at the start of every frame. Both scale and offset are
/// rounded to whole pixels.
pub fn camera_affine(camera: &Camera2D, viewport: Viewport, tile_size: f32) -> Affine2 {
    let scale = snapped_pixels_per_world(camera, tile_size);
    let center = viewport.center();
    let offset = Vec2::new(
        (center.x - camera.position().x * scale).round(),
        (center.y - camera.position().y * scale).round(),
    );
    Affine2::translation(offset).then(Affine2::scale(Vec2::splat(scale)))
}

pub fn screen_to_world(
    screen: Vec2,
    camera: &Camera2D,
    viewport: Viewport,
    tile_size: f32,
) -> Vec2 {
    let pixels_per_world = camera_pixels_per_world(camera, tile_size);
    (screen - viewport.center()) * pixels_per_world.recip() + camera.position()
}

pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport, tile_size: f32) -> Vec2 {
    let pixels_per_world = camera_pixels_per_world(camera, tile_size);
    (world - camera.position()) * pixels_per_world + viewport.center()
}

pub fn visible_tile_rect(camera: &Camera2D, viewport: Viewport, tile_size: f32) -> TileRect {
    let top_left = screen_to_world(Vec2::ZERO, camera, viewport, tile_size);
    let bottom_right = screen_to_world(
        Vec2::new(viewport.width as f32, viewport.height as f32),
        camera,
        viewport,
        tile_size,
    );
    TileRect {
        min_x: top_left.x.floor() as i32,
        min_y: top_left.y.floor() as i32,
        max_x: bottom_right.x.ceil() as i32,
        max_y: bottom_right.y.ceil() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq_vec2(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 0.001 && (a.y - b.y).abs() < 0.001
    }

    fn viewport() -> Viewport {
        Viewport {
            width: 1280,
            height: 720,
        }
    }

    #[test]
    fn viewport_center_maps_to_camera_position() {
        let camera = Camera2D::new(Vec2::new(8.0, 8.0), 1.0);
        let world = screen_to_world(Vec2::new(640.0, 360.0), &camera, viewport(), 128.0);
        assert!(approx_eq_vec2(world, Vec2::new(8.0, 8.0)));
    }

    #[test]
    fn screen_world_round_trip_recovers_point() {
        let mut camera = Camera2D::new(Vec2::new(-3.25, 17.5), 1.0);
        for zoom in [0.25, 0.7, 1.0, 1.33, 4.0] {
            camera.set_zoom(zoom);
            for point in [
                Vec2::new(0.0, 0.0),
                Vec2::new(1279.0, 719.0),
                Vec2::new(333.3, 12.7),
                Vec2::new(-50.0, 900.0),
            ] {
                let world = screen_to_world(point, &camera, viewport(), 64.0);
                let back = world_to_screen(world, &camera, viewport(), 64.0);
                assert!(approx_eq_vec2(point, back), "zoom={zoom} point={point:?}");
            }
        }
    }

    #[test]
    fn world_y_grows_downward_on_screen() {
        let camera = Camera2D::default();
        let below = world_to_screen(Vec2::new(0.0, 1.0), &camera, viewport(), 10.0);
        assert!(below.y > viewport().center().y);
    }

    #[test]
    fn camera_affine_uses_whole_pixel_scale_and_offset() {
        let camera = Camera2D::new(Vec2::new(0.37, 0.91), 1.013);
        let affine = camera_affine(&camera, viewport(), 64.0);

        assert_eq!(affine.a, 65.0);
        assert_eq!(affine.d, 65.0);
        assert_eq!(affine.e, affine.e.round());
        assert_eq!(affine.f, affine.f.round());
    }

    #[test]
    fn visible_rect_brackets_viewport_corners() {
        let camera = Camera2D::new(Vec2::new(8.0, 8.0), 1.0);
        let rect = visible_tile_rect(&camera, viewport(), 128.0);

        assert_eq!(rect.min_x, 3);
        assert_eq!(rect.max_x, 13);
        assert_eq!(rect.min_y, 5);
        assert_eq!(rect.max_y, 11);
    }

    #[test]
    fn transform_pivots_rotation_around_center() {
        let transform = Transform::translate(Vec2::new(10.0, 0.0))
            .with_rotation(std::f32::consts::PI)
            .with_center(Vec2::new(0.5, 0.5));
        let affine = transform.to_affine();

        assert!(approx_eq_vec2(
            affine.apply(Vec2::new(0.5, 0.5)),
            Vec2::new(10.5, 0.5)
        ));
        assert!(approx_eq_vec2(
            affine.apply(Vec2::new(0.0, 0.0)),
            Vec2::new(11.0, 1.0)
        ));
    }

    #[test]
    fn inverse_undoes_transform() {
        let affine = Transform::translate(Vec2::new(3.0, -2.0))
            .with_rotation(0.7)
            .with_scale(Vec2::new(2.0, 0.5))
            .to_affine();
        let inverse = affine.inverse().expect("invertible");
        let point = Vec2::new(4.2, -1.1);
        assert!(approx_eq_vec2(inverse.apply(affine.apply(point)), point));
    }

    #[test]
    fn zero_scale_has_no_inverse() {
        let affine = Affine2::scale(Vec2::new(0.0, 1.0));
        assert!(affine.inverse().is_none());
    }
}
