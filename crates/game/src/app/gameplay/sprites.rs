use castaway_engine::app::AssetError;
use castaway_engine::worldgen::{TerrainPalette, TerrainStyle};
use castaway_engine::{Flipbook, SpriteHandle, SpriteLoader};

const WATER_FRAMES: u32 = 3;
const WATER_FRAME_INTERVAL: f32 = 0.2;
const SWAY_FRAMES: u32 = 2;
const SWAY_FRAME_INTERVAL: f32 = 0.75;

/// Every sprite the island content draws, requested once when the scene is built.
#[derive(Debug, Clone)]
pub(crate) struct IslandSprites {
    pub(crate) player: SpriteHandle,
    pub(crate) palm_tree: Flipbook,
    pub(crate) mango_tree: Flipbook,
    pub(crate) bush: Flipbook,
    pub(crate) tallgrass: SpriteHandle,
    pub(crate) tallgrass_short: SpriteHandle,
    pub(crate) rock: SpriteHandle,
    pub(crate) stick: SpriteHandle,
    pub(crate) coconut: SpriteHandle,
    pub(crate) mango: SpriteHandle,
    pub(crate) crab: SpriteHandle,
    pub(crate) shipwreck: SpriteHandle,
    pub(crate) jet_wreck: SpriteHandle,
    pub(crate) suitcase: SpriteHandle,
}

impl IslandSprites {
    pub(crate) fn request(loader: &mut SpriteLoader) -> Result<Self, AssetError> {
        Ok(Self {
            player: loader.request("characters/castaway")?,
            palm_tree: loader.flipbook("trees/palm", SWAY_FRAMES, SWAY_FRAME_INTERVAL)?,
            mango_tree: loader.flipbook("trees/mango", SWAY_FRAMES, SWAY_FRAME_INTERVAL)?,
            bush: loader.flipbook("plants/bush", SWAY_FRAMES, SWAY_FRAME_INTERVAL)?,
            tallgrass: loader.request("plants/tallgrass")?,
            tallgrass_short: loader.request("plants/tallgrass_short")?,
            rock: loader.request("items/rock")?,
            stick: loader.request("items/stick")?,
            coconut: loader.request("items/coconut")?,
            mango: loader.request("items/mango")?,
            crab: loader.request("creatures/crab")?,
            shipwreck: loader.request("structures/shipwreck")?,
            jet_wreck: loader.request("structures/jet_wreck")?,
            suitcase: loader.request("structures/suitcase")?,
        })
    }
}

#[cfg(test)]
impl IslandSprites {
    /// Handles pointing at a directory with no sprites; none of them ever become ready.
    pub(crate) fn placeholder() -> Self {
        let mut loader = SpriteLoader::new(std::env::temp_dir().join("castaway-no-sprites"));
        Self::request(&mut loader).expect("static sprite keys are valid")
    }
}

/// Terrain look for the island. Ground is the only solid terrain.
pub(crate) fn island_palette(loader: &mut SpriteLoader) -> Result<TerrainPalette, AssetError> {
    let defaults = TerrainPalette::default();
    Ok(TerrainPalette {
        water: TerrainStyle::plain(defaults.water.color).with_sprite(loader.flipbook(
            "tiles/water",
            WATER_FRAMES,
            WATER_FRAME_INTERVAL,
        )?),
        sand: TerrainStyle::plain(defaults.sand.color).with_sprite(loader.flipbook(
            "tiles/sand",
            1,
            1.0,
        )?),
        grass: TerrainStyle::plain(defaults.grass.color).with_sprite(loader.flipbook(
            "tiles/grass",
            1,
            1.0,
        )?),
        ground: TerrainStyle {
            solid: true,
            ..TerrainStyle::plain(defaults.ground.color)
        },
        beach: Some(loader.request("tiles/beach")?),
    })
}
