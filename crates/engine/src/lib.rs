use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod effects;
mod math;
mod sprite_keys;
pub mod world;
pub mod worldgen;

pub use app::{
    run_app, run_app_with_metrics, AppError, Camera2D, CameraBounds, Flipbook, FrameDriver,
    InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot, MetricsHandle, ParticleSource,
    RenderContext, Rgba, Scene, SceneCommand, SpriteHandle, SpriteLoader, SpriteRegion, TextAlign,
    TextBaseline, TextStyle, Transform, SLOW_FRAME_ENV_VAR,
};
pub use math::Vec2;
pub use sprite_keys::SpriteKeyError;
pub use world::{Entity, EntityContext, EntityId, Tile, TileCoord, World};
pub use worldgen::{ContentSpawner, Generator, GeneratorConfig, SpawnKind, Terrain};

pub const ROOT_ENV_VAR: &str = "CASTAWAY_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub sprite_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        let sprite_dir = assets_dir.join("sprites");
        Self {
            root,
            assets_dir,
            sprite_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {}", .0.display())]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {}\n\
A valid root must contain Cargo.toml and either crates/ or assets/.",
        path.display()
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect project root by walking upward from {}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example: export {env_var}=\"/path/to/castaway\"",
        start_dir.display()
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Finds the project root from `CASTAWAY_ROOT`, or by walking up from the executable.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let exe_dir = || -> Result<PathBuf, StartupError> {
        let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))
    };
    let root = resolve_root(env::var(ROOT_ENV_VAR), exe_dir)?;
    Ok(AppPaths::from_root(root))
}

fn resolve_root<F>(env_value: Result<String, env::VarError>, exe_dir: F) -> Result<PathBuf, StartupError>
where
    F: FnOnce() -> Result<PathBuf, StartupError>,
{
    match env_value {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let start_dir = exe_dir()?;
            start_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&start_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_dir() -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        fs::create_dir_all(temp.path().join("assets").join("sprites")).expect("assets");
        temp
    }

    fn unused_exe_dir() -> Result<PathBuf, StartupError> {
        panic!("exe dir should not be consulted")
    }

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("crates")).expect("crates");
        assert!(!is_repo_marker(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "").expect("cargo toml");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn env_root_wins_when_valid() {
        let project = project_dir();
        let value = project.path().to_string_lossy().into_owned();
        let root = resolve_root(Ok(value), unused_exe_dir).expect("root");
        assert_eq!(root, normalize_path(project.path()));

        let paths = AppPaths::from_root(root.clone());
        assert_eq!(paths.sprite_dir, root.join("assets").join("sprites"));
    }

    #[test]
    fn invalid_env_root_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let value = temp.path().to_string_lossy().into_owned();
        assert!(matches!(
            resolve_root(Ok(value), unused_exe_dir),
            Err(StartupError::InvalidEnvRoot { .. })
        ));
    }

    #[test]
    fn walks_up_from_executable_dir() {
        let project = project_dir();
        let nested = project.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested");
        let root = resolve_root(Err(env::VarError::NotPresent), || Ok(nested.clone())).expect("root");
        assert_eq!(root, normalize_path(project.path()));
    }

    #[test]
    fn missing_root_reports_start_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let start = temp.path().to_path_buf();
        let error = resolve_root(Err(env::VarError::NotPresent), || Ok(start.clone()))
            .expect_err("no root");
        assert!(matches!(error, StartupError::RootNotFound { env_var, .. } if env_var == ROOT_ENV_VAR));
    }
}
