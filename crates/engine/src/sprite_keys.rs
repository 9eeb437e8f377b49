use std::path::{Path, PathBuf};

use thiserror::Error;

const MAX_SPRITE_KEY_LEN: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is longer than {max} characters")]
    TooLong { max: usize },
    #[error("sprite key must not start or end with '/'")]
    EdgeSlash,
    #[error("sprite key must not contain empty path segments")]
    EmptySegment,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are lowercase slash-separated paths relative to `assets/sprites`, without extension.
pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong {
            max: MAX_SPRITE_KEY_LEN,
        });
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(SpriteKeyError::EdgeSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if key.split('/').any(str::is_empty) {
        return Err(SpriteKeyError::EmptySegment);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        return Err(SpriteKeyError::InvalidCharacter { character });
    }
    Ok(())
}

pub(crate) fn sprite_path(sprite_root: &Path, key: &str) -> Result<PathBuf, SpriteKeyError> {
    validate_sprite_key(key)?;
    let mut path = sprite_root.to_path_buf();
    for segment in key.split('/') {
        path.push(segment);
    }
    path.set_extension("png");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_asset_style_keys() {
        for key in ["tiles/water", "ui/spike", "trees/palm-tree_2"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_malformed_keys() {
        let cases = [
            ("", SpriteKeyError::Empty),
            ("/tiles", SpriteKeyError::EdgeSlash),
            ("tiles/", SpriteKeyError::EdgeSlash),
            ("tiles//sand", SpriteKeyError::EmptySegment),
            ("tiles/../x", SpriteKeyError::ParentTraversal),
            ("Tiles", SpriteKeyError::InvalidCharacter { character: 'T' }),
            ("a.png", SpriteKeyError::InvalidCharacter { character: '.' }),
            (r"a\b", SpriteKeyError::InvalidCharacter { character: '\\' }),
        ];
        for (key, expected) in cases {
            assert_eq!(validate_sprite_key(key), Err(expected), "key={key}");
        }
    }

    #[test]
    fn overlong_key_is_rejected() {
        let key = "a".repeat(MAX_SPRITE_KEY_LEN + 1);
        assert!(matches!(
            validate_sprite_key(&key),
            Err(SpriteKeyError::TooLong { .. })
        ));
    }

    #[test]
    fn sprite_path_appends_png_extension() {
        let path = sprite_path(Path::new("/assets/sprites"), "tiles/water").expect("path");
        assert_eq!(path, Path::new("/assets/sprites/tiles/water.png"));
    }
}
