use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use castaway_engine::app::AssetError;
use castaway_engine::{
    resolve_app_paths, GeneratorConfig, LoopConfig, MetricsHandle, Scene, StartupError,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::IslandScene;

const SEED_ENV_VAR: &str = "CASTAWAY_SEED";
const WORLDGEN_ENV_VAR: &str = "CASTAWAY_WORLDGEN";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) metrics: MetricsHandle,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to request island sprites: {0}")]
    Assets(#[from] AssetError),
}

#[derive(Debug, Error)]
pub(crate) enum WorldgenConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid worldgen config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Castaway Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "project_root_resolved");

    let seed = resolve_seed(std::env::var(SEED_ENV_VAR).ok().as_deref());
    info!(seed, "world_seeded");

    let generator = match std::env::var_os(WORLDGEN_ENV_VAR) {
        Some(path) => load_generator_config(Path::new(&path)).unwrap_or_else(|error| {
            warn!(error = %error, "worldgen_config_rejected");
            GeneratorConfig::default()
        }),
        None => GeneratorConfig::default(),
    };

    let metrics = MetricsHandle::default();
    let scene = IslandScene::new(seed, generator, paths.sprite_dir, metrics.clone())?;

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(scene),
        metrics,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_seed(raw: &str) -> Result<u64, ParseIntError> {
    raw.trim().parse::<u64>()
}

/// Uses the configured seed when it parses, otherwise draws a fresh one.
fn resolve_seed(raw: Option<&str>) -> u64 {
    match raw.map(parse_seed) {
        Some(Ok(seed)) => seed,
        Some(Err(error)) => {
            warn!(error = %error, var = SEED_ENV_VAR, "seed_rejected");
            rand::random()
        }
        None => rand::random(),
    }
}

fn parse_generator_config(
    json: &str,
) -> Result<GeneratorConfig, serde_path_to_error::Error<serde_json::Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer)
}

fn load_generator_config(path: &Path) -> Result<GeneratorConfig, WorldgenConfigError> {
    let json = fs::read_to_string(path).map_err(|source| WorldgenConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_generator_config(&json).map_err(|source| WorldgenConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "worldgen_config_loaded");
    Ok(config)
}
