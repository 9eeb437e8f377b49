use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::sprite_keys::{validate_sprite_key, SpriteKeyError};

/// Decoded RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct SpriteImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl fmt::Debug for SpriteImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl SpriteImage {
    /// Returns `None` when the buffer does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Option<Self> {
        let count = (width as usize).checked_mul(height as usize)?;
        Self::from_rgba(width, height, color.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * 4;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }

    pub fn full_rect(&self) -> SourceRect {
        SourceRect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }
}

struct SpriteSlot {
    key: String,
    image: OnceLock<SpriteImage>,
}

/// Shared handle to a sprite that may still be loading. Readiness flips from false to
/// true at most once; drawing code polls it every frame.
#[derive(Clone)]
pub struct SpriteHandle {
    slot: Arc<SpriteSlot>,
}

impl fmt::Debug for SpriteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteHandle")
            .field("key", &self.slot.key)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl SpriteHandle {
    pub fn new(key: &str) -> Result<Self, SpriteKeyError> {
        validate_sprite_key(key)?;
        Ok(Self {
            slot: Arc::new(SpriteSlot {
                key: key.to_string(),
                image: OnceLock::new(),
            }),
        })
    }

    pub fn with_image(key: &str, image: SpriteImage) -> Result<Self, SpriteKeyError> {
        let handle = Self::new(key)?;
        handle.fulfill(image);
        Ok(handle)
    }

    pub fn key(&self) -> &str {
        &self.slot.key
    }

    pub fn is_ready(&self) -> bool {
        self.slot.image.get().is_some()
    }

    pub fn image(&self) -> Option<&SpriteImage> {
        self.slot.image.get()
    }

    /// Returns false if the handle was already fulfilled.
    pub fn fulfill(&self, image: SpriteImage) -> bool {
        self.slot.image.set(image).is_ok()
    }

    pub fn ptr_eq(&self, other: &SpriteHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

/// Pixel-space rectangle inside a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A sprite plus an optional sub-rectangle; `None` means the whole image.
#[derive(Debug, Clone)]
pub struct SpriteRegion {
    pub sprite: SpriteHandle,
    pub source: Option<SourceRect>,
}

impl SpriteRegion {
    pub fn whole(sprite: SpriteHandle) -> Self {
        Self {
            sprite,
            source: None,
        }
    }

    pub fn resolved_source(&self) -> Option<SourceRect> {
        let image = self.sprite.image()?;
        Some(self.source.unwrap_or_else(|| image.full_rect()))
    }
}

/// Region of a sprite that particle effects sample their chunks from.
pub type ParticleSource = SpriteRegion;

/// Horizontal strip of equally sized frames cycled over time.
#[derive(Debug, Clone)]
pub struct Flipbook {
    sprite: SpriteHandle,
    frame_count: u32,
    interval: f32,
}

impl Flipbook {
    pub fn new(sprite: SpriteHandle, frame_count: u32, interval: f32) -> Self {
        Self {
            sprite,
            frame_count: frame_count.max(1),
            interval,
        }
    }

    pub fn sprite(&self) -> &SpriteHandle {
        &self.sprite
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn is_ready(&self) -> bool {
        self.sprite.is_ready()
    }

    /// `floor(time / interval) mod frame_count`, always non-negative.
    pub fn frame_at(&self, time: f32) -> u32 {
        if self.interval.is_nan() || self.interval <= 0.0 || !time.is_finite() {
            return 0;
        }
        let count = i64::from(self.frame_count);
        let step = (time / self.interval).floor() as i64;
        step.rem_euclid(count) as u32
    }

    pub fn frame_width(&self) -> Option<u32> {
        self.sprite
            .image()
            .map(|image| image.width() / self.frame_count)
    }

    pub fn frame_source(&self, time: f32) -> Option<SourceRect> {
        let image = self.sprite.image()?;
        let frame_width = image.width() / self.frame_count;
        if frame_width == 0 {
            return None;
        }
        Some(SourceRect {
            x: self.frame_at(time) * frame_width,
            y: 0,
            width: frame_width,
            height: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(frames: u32) -> SpriteHandle {
        let image = SpriteImage::solid(16 * frames, 16, [255, 255, 255, 255]).expect("image");
        SpriteHandle::with_image("tiles/water", image).expect("handle")
    }

    #[test]
    fn handle_becomes_ready_once() {
        let handle = SpriteHandle::new("tiles/sand").expect("handle");
        assert!(!handle.is_ready());

        let image = SpriteImage::solid(2, 2, [1, 2, 3, 255]).expect("image");
        assert!(handle.fulfill(image.clone()));
        assert!(handle.is_ready());
        assert!(!handle.fulfill(image));
    }

    #[test]
    fn clones_share_readiness() {
        let handle = SpriteHandle::new("tiles/grass").expect("handle");
        let clone = handle.clone();
        clone.fulfill(SpriteImage::solid(1, 1, [0, 0, 0, 255]).expect("image"));
        assert!(handle.is_ready());
        assert!(handle.ptr_eq(&clone));
    }

    #[test]
    fn invalid_key_is_rejected() {
        assert!(SpriteHandle::new("../secret").is_err());
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(SpriteImage::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(SpriteImage::from_rgba(0, 2, Vec::new()).is_none());
    }

    #[test]
    fn flipbook_frame_cycles_with_time() {
        let flipbook = Flipbook::new(strip(3), 3, 0.2);
        assert_eq!(flipbook.frame_at(0.0), 0);
        assert_eq!(flipbook.frame_at(0.25), 1);
        assert_eq!(flipbook.frame_at(0.45), 2);
        assert_eq!(flipbook.frame_at(0.65), 0);
    }

    #[test]
    fn flipbook_frame_is_non_negative_for_negative_time() {
        let flipbook = Flipbook::new(strip(3), 3, 0.2);
        assert_eq!(flipbook.frame_at(-0.1), 2);
        assert_eq!(flipbook.frame_at(-0.5), 0);
    }

    #[test]
    fn flipbook_source_steps_across_strip() {
        let flipbook = Flipbook::new(strip(2), 2, 0.75);
        assert_eq!(flipbook.frame_width(), Some(16));
        let source = flipbook.frame_source(1.0).expect("source");
        assert_eq!(source.x, 16);
        assert_eq!(source.width, 16);
    }

    #[test]
    fn unloaded_flipbook_has_no_source() {
        let sprite = SpriteHandle::new("tiles/water").expect("handle");
        let flipbook = Flipbook::new(sprite, 3, 0.2);
        assert!(!flipbook.is_ready());
        assert!(flipbook.frame_source(0.0).is_none());
    }
}
