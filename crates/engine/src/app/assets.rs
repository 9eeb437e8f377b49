use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use super::rendering::{Flipbook, SpriteHandle, SpriteImage};
use crate::sprite_keys::{sprite_path, SpriteKeyError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid sprite key: {0}")]
    InvalidKey(#[from] SpriteKeyError),
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} decoded to an empty image", path.display())]
    Empty { path: PathBuf },
    #[error("failed to start sprite loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Reads and decodes one PNG into RGBA8.
pub fn load_sprite_image(path: &Path) -> Result<SpriteImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    SpriteImage::from_rgba(image.width(), image.height(), image.into_raw()).ok_or_else(|| {
        AssetError::Empty {
            path: path.to_path_buf(),
        }
    })
}

/// Hands out sprite handles immediately and fills them from disk on background threads.
///
/// A key is loaded at most once. Failures are reported through [`SpriteLoader::poll_failures`]
/// on the caller's thread; the affected handle simply never becomes ready.
pub struct SpriteLoader {
    sprite_root: PathBuf,
    handles: HashMap<String, SpriteHandle>,
    failure_tx: Sender<(String, AssetError)>,
    failure_rx: Receiver<(String, AssetError)>,
    warned_keys: HashSet<String>,
}

impl SpriteLoader {
    pub fn new(sprite_root: impl Into<PathBuf>) -> Self {
        let (failure_tx, failure_rx) = channel();
        Self {
            sprite_root: sprite_root.into(),
            handles: HashMap::new(),
            failure_tx,
            failure_rx,
            warned_keys: HashSet::new(),
        }
    }

    pub fn sprite_root(&self) -> &Path {
        &self.sprite_root
    }

    pub fn requested_count(&self) -> usize {
        self.handles.len()
    }

    pub fn request(&mut self, key: &str) -> Result<SpriteHandle, AssetError> {
        if let Some(handle) = self.handles.get(key) {
            return Ok(handle.clone());
        }

        let path = sprite_path(&self.sprite_root, key)?;
        let handle = SpriteHandle::new(key)?;
        self.handles.insert(key.to_string(), handle.clone());

        let worker_handle = handle.clone();
        let worker_tx = self.failure_tx.clone();
        let worker_key = key.to_string();
        let spawned = thread::Builder::new()
            .name("sprite-loader".to_string())
            .spawn(move || match load_sprite_image(&path) {
                Ok(image) => {
                    worker_handle.fulfill(image);
                }
                Err(error) => {
                    let _ = worker_tx.send((worker_key, error));
                }
            });
        if let Err(error) = spawned {
            let _ = self.failure_tx.send((key.to_string(), AssetError::Spawn(error)));
        }

        debug!(key, "sprite_requested");
        Ok(handle)
    }

    pub fn flipbook(
        &mut self,
        key: &str,
        frame_count: u32,
        interval: f32,
    ) -> Result<Flipbook, AssetError> {
        Ok(Flipbook::new(self.request(key)?, frame_count, interval))
    }

    /// Logs each failed key once. Returns how many new failures were reported.
    pub fn poll_failures(&mut self) -> usize {
        let mut reported = 0;
        while let Ok((key, error)) = self.failure_rx.try_recv() {
            if !self.warned_keys.insert(key.clone()) {
                continue;
            }
            warn!(key = %key, error = %error, "sprite_load_failed");
            reported += 1;
        }
        reported
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn write_png(root: &Path, key: &str, width: u32, height: u32) {
        let path = sprite_path(root, key).expect("path");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("save png");
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_png(temp.path(), "tiles/sand", 3, 2);

        let image = load_sprite_image(&temp.path().join("tiles").join("sand.png")).expect("image");
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixel(2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = load_sprite_image(&temp.path().join("nope.png")).expect_err("missing");
        assert!(matches!(error, AssetError::Open { .. }));
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").expect("write");
        let error = load_sprite_image(&path).expect_err("broken");
        assert!(matches!(error, AssetError::Decode { .. }));
    }

    #[test]
    fn request_fills_handle_in_background_and_caches_it() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_png(temp.path(), "trees/palm", 8, 4);
        let mut loader = SpriteLoader::new(temp.path());

        let handle = loader.request("trees/palm").expect("handle");
        let again = loader.request("trees/palm").expect("handle");
        assert!(handle.ptr_eq(&again));
        assert_eq!(loader.requested_count(), 1);

        assert!(wait_until(|| handle.is_ready()));
        assert_eq!(handle.image().map(SpriteImage::width), Some(8));
        assert_eq!(loader.poll_failures(), 0);
    }

    #[test]
    fn failed_load_is_reported_once_and_never_ready() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut loader = SpriteLoader::new(temp.path());
        let handle = loader.request("tiles/missing").expect("handle");
        loader.request("tiles/missing").expect("handle");

        let mut reported = 0;
        assert!(wait_until(|| {
            reported += loader.poll_failures();
            reported > 0
        }));
        assert_eq!(reported, 1);
        assert_eq!(loader.poll_failures(), 0);
        assert!(!handle.is_ready());
    }

    #[test]
    fn invalid_key_is_rejected_up_front() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut loader = SpriteLoader::new(temp.path());
        assert!(matches!(
            loader.request("../secrets"),
            Err(AssetError::InvalidKey(SpriteKeyError::ParentTraversal))
        ));
        assert_eq!(loader.requested_count(), 0);
    }

    #[test]
    fn flipbook_wraps_requested_sprite() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_png(temp.path(), "plants/bush", 32, 16);
        let mut loader = SpriteLoader::new(temp.path());
        let flipbook = loader.flipbook("plants/bush", 2, 0.5).expect("flipbook");
        assert_eq!(flipbook.frame_count(), 2);
        assert!(wait_until(|| flipbook.is_ready()));
        assert_eq!(flipbook.frame_width(), Some(16));
    }
}
