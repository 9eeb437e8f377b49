use crate::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_STEP_IN: f32 = 1.1;
pub const CAMERA_ZOOM_STEP_OUT: f32 = 0.9;

/// Optional clamp rectangle and zoom range. Absent members are not clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraBounds {
    pub min: Option<Vec2>,
    pub max: Option<Vec2>,
    pub min_zoom: Option<f32>,
    pub max_zoom: Option<f32>,
}

impl CameraBounds {
    pub fn zoom_only(min_zoom: f32, max_zoom: f32) -> Self {
        Self {
            min_zoom: Some(min_zoom),
            max_zoom: Some(max_zoom),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    position: Vec2,
    zoom: f32,
    bounds: Option<CameraBounds>,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
            bounds: None,
        }
    }
}

impl Camera2D {
    pub fn new(position: Vec2, zoom: f32) -> Self {
        let mut camera = Self::default();
        camera.set_zoom(zoom);
        camera.set_position(position);
        camera
    }

    pub fn with_bounds(mut self, bounds: CameraBounds) -> Self {
        self.set_bounds(Some(bounds));
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn bounds(&self) -> Option<CameraBounds> {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Option<CameraBounds>) {
        self.bounds = bounds;
        self.clamp();
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.clamp();
    }

    /// Non-finite or non-positive requests are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if !zoom.is_finite() || zoom <= 0.0 {
            return;
        }
        self.zoom = zoom;
        self.clamp();
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    /// Positive steps zoom in, negative steps zoom out.
    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let factor = if steps > 0 {
            CAMERA_ZOOM_STEP_IN
        } else {
            CAMERA_ZOOM_STEP_OUT
        };
        self.zoom_by(factor.powi(steps.abs()));
    }

    /// Eases toward `target`, covering `speed * dt` of the remaining distance per call.
    pub fn follow(&mut self, target: Vec2, speed: f32, dt: f32) {
        let t = (speed * dt).clamp(0.0, 1.0);
        self.set_position(self.position.lerp(target, t));
    }

    fn clamp(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        if let Some(min) = bounds.min {
            self.position.x = self.position.x.max(min.x);
            self.position.y = self.position.y.max(min.y);
        }
        if let Some(max) = bounds.max {
            self.position.x = self.position.x.min(max.x);
            self.position.y = self.position.y.min(max.y);
        }
        if let Some(min_zoom) = bounds.min_zoom {
            self.zoom = self.zoom.max(min_zoom);
        }
        if let Some(max_zoom) = bounds.max_zoom {
            self.zoom = self.zoom.min(max_zoom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_camera_moves_freely() {
        let mut camera = Camera2D::default();
        camera.move_by(Vec2::new(-500.0, 250.0));
        assert_eq!(camera.position(), Vec2::new(-500.0, 250.0));
    }

    #[test]
    fn every_mutation_is_clamped_to_bounds() {
        let mut camera = Camera2D::default().with_bounds(CameraBounds {
            min: Some(Vec2::new(-10.0, -5.0)),
            max: Some(Vec2::new(10.0, 5.0)),
            min_zoom: Some(0.5),
            max_zoom: Some(2.0),
        });

        camera.set_position(Vec2::new(20.0, -20.0));
        assert_eq!(camera.position(), Vec2::new(10.0, -5.0));

        camera.move_by(Vec2::new(-100.0, 3.0));
        assert_eq!(camera.position(), Vec2::new(-10.0, -2.0));

        camera.set_zoom(8.0);
        assert_eq!(camera.zoom(), 2.0);

        camera.zoom_by(0.01);
        assert_eq!(camera.zoom(), 0.5);
    }

    #[test]
    fn absent_sub_bounds_are_not_clamped() {
        let mut camera = Camera2D::default().with_bounds(CameraBounds::zoom_only(0.25, 4.0));
        camera.set_position(Vec2::new(1.0e6, -1.0e6));
        camera.set_zoom(10.0);

        assert_eq!(camera.position(), Vec2::new(1.0e6, -1.0e6));
        assert_eq!(camera.zoom(), 4.0);
    }

    #[test]
    fn invalid_zoom_is_ignored() {
        let mut camera = Camera2D::new(Vec2::ZERO, 1.5);
        camera.set_zoom(f32::NAN);
        camera.set_zoom(0.0);
        camera.set_zoom(-2.0);
        assert_eq!(camera.zoom(), 1.5);
    }

    #[test]
    fn zoom_steps_multiply_zoom() {
        let mut camera = Camera2D::default();
        camera.apply_zoom_steps(1);
        assert!((camera.zoom() - 1.1).abs() < 0.0001);
        camera.apply_zoom_steps(-1);
        assert!((camera.zoom() - 0.99).abs() < 0.0001);
    }

    #[test]
    fn follow_eases_toward_target_without_overshoot() {
        let mut camera = Camera2D::default();
        camera.follow(Vec2::new(10.0, 0.0), 2.0, 0.1);
        assert!((camera.position().x - 2.0).abs() < 0.0001);

        camera.follow(Vec2::new(10.0, 0.0), 2.0, 5.0);
        assert_eq!(camera.position(), Vec2::new(10.0, 0.0));
    }
}
