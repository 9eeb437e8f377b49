use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use super::Viewport;

/// Presents finished RGBA frames to the window through `pixels`.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    warned_size_mismatch: bool,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            warned_size_mismatch: false,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        self.warned_size_mismatch = false;
        Ok(())
    }

    /// Copies `rgba` into the pixel buffer and presents it. A frame whose length does not
    /// match the current buffer is skipped.
    pub fn present(&mut self, rgba: &[u8]) -> Result<(), Error> {
        let frame = self.pixels.frame_mut();
        if frame.len() != rgba.len() {
            if !self.warned_size_mismatch {
                warn!(
                    expected = frame.len(),
                    actual = rgba.len(),
                    "renderer_frame_size_mismatch"
                );
                self.warned_size_mismatch = true;
            }
            return Ok(());
        }
        frame.copy_from_slice(rgba);
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface_texture = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface_texture)
    }
}
