use std::rc::Rc;

use serde::Deserialize;

use crate::app::{Flipbook, RenderContext, Rgba, SpriteHandle};
use crate::world::{Direction, Neighbors, Tile};

const SHORE_BAND: f32 = 0.15;
const SHORE_ALPHA: u8 = 150;

/// Terrain bands ordered from wettest to driest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terrain {
    Water,
    Sand,
    Grass,
    Ground,
}

impl Terrain {
    pub const ALL: [Terrain; 4] = [Terrain::Water, Terrain::Sand, Terrain::Grass, Terrain::Ground];

    /// Every dryness, NaN included, lands in exactly one band.
    pub fn classify(dryness: f32, bands: &BandThresholds) -> Terrain {
        if dryness < bands.water_max {
            Terrain::Water
        } else if dryness < bands.sand_max {
            Terrain::Sand
        } else if dryness < bands.grass_max {
            Terrain::Grass
        } else {
            Terrain::Ground
        }
    }

    pub fn is_wetter_than(self, other: Terrain) -> bool {
        self < other
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Water => "water",
            Terrain::Sand => "sand",
            Terrain::Grass => "grass",
            Terrain::Ground => "ground",
        }
    }
}

/// Upper (exclusive) dryness bound of each band; ground takes everything above grass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    pub water_max: f32,
    pub sand_max: f32,
    pub grass_max: f32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            water_max: 0.2,
            sand_max: 0.8,
            grass_max: 1.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerrainStyle {
    /// Fill used until the sprite is ready, or always when there is none.
    pub color: Rgba,
    pub sprite: Option<Flipbook>,
    pub solid: bool,
}

impl TerrainStyle {
    pub fn plain(color: Rgba) -> Self {
        Self {
            color,
            sprite: None,
            solid: false,
        }
    }

    pub fn with_sprite(mut self, sprite: Flipbook) -> Self {
        self.sprite = Some(sprite);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TerrainPalette {
    pub water: TerrainStyle,
    pub sand: TerrainStyle,
    pub grass: TerrainStyle,
    pub ground: TerrainStyle,
    /// Sand drawn with water directly to the south.
    pub beach: Option<SpriteHandle>,
}

impl Default for TerrainPalette {
    fn default() -> Self {
        Self {
            water: TerrainStyle::plain([52, 120, 196, 255]),
            sand: TerrainStyle::plain([222, 200, 140, 255]),
            grass: TerrainStyle::plain([96, 160, 72, 255]),
            ground: TerrainStyle::plain([136, 136, 136, 255]),
            beach: None,
        }
    }
}

impl TerrainPalette {
    pub fn style(&self, terrain: Terrain) -> &TerrainStyle {
        match terrain {
            Terrain::Water => &self.water,
            Terrain::Sand => &self.sand,
            Terrain::Grass => &self.grass,
            Terrain::Ground => &self.ground,
        }
    }
}

/// Wetter neighbours that bleed into a tile: every cardinal, plus each diagonal whose two
/// flanking cardinals share the tile's own terrain (an inner corner).
pub fn shoreline_overlays(terrain: Terrain, neighbors: &Neighbors<'_>) -> Vec<(Direction, Terrain)> {
    let mut overlays = Vec::new();
    for direction in Direction::CARDINALS {
        if let Some(other) = neighbors.terrain(direction) {
            if other.is_wetter_than(terrain) {
                overlays.push((direction, other));
            }
        }
    }
    for direction in Direction::DIAGONALS {
        let Some(other) = neighbors.terrain(direction) else {
            continue;
        };
        let Some((a, b)) = direction.flanking_cardinals() else {
            continue;
        };
        if other.is_wetter_than(terrain)
            && neighbors.terrain(a) == Some(terrain)
            && neighbors.terrain(b) == Some(terrain)
        {
            overlays.push((direction, other));
        }
    }
    overlays
}

/// Tile-local rectangle `(x, y, w, h)` covered by the overlay toward `direction`.
fn overlay_rect(direction: Direction) -> (f32, f32, f32, f32) {
    let far = 1.0 - SHORE_BAND;
    match direction {
        Direction::North => (0.0, 0.0, 1.0, SHORE_BAND),
        Direction::East => (far, 0.0, SHORE_BAND, 1.0),
        Direction::South => (0.0, far, 1.0, SHORE_BAND),
        Direction::West => (0.0, 0.0, SHORE_BAND, 1.0),
        Direction::NorthWest => (0.0, 0.0, SHORE_BAND, SHORE_BAND),
        Direction::NorthEast => (far, 0.0, SHORE_BAND, SHORE_BAND),
        Direction::SouthEast => (far, far, SHORE_BAND, SHORE_BAND),
        Direction::SouthWest => (0.0, far, SHORE_BAND, SHORE_BAND),
    }
}

pub struct TerrainTile {
    terrain: Terrain,
    palette: Rc<TerrainPalette>,
}

impl TerrainTile {
    pub fn new(terrain: Terrain, palette: Rc<TerrainPalette>) -> Self {
        Self { terrain, palette }
    }

    pub fn kind(&self) -> Terrain {
        self.terrain
    }

    fn draw_base(&self, ctx: &mut RenderContext, neighbors: &Neighbors<'_>) -> bool {
        if self.terrain == Terrain::Sand && neighbors.terrain(Direction::South) == Some(Terrain::Water) {
            if let Some(beach) = self.palette.beach.as_ref().filter(|beach| beach.is_ready()) {
                ctx.draw_image(beach, 0.0, 0.0, 1.0, 1.0);
                return true;
            }
        }

        let style = self.palette.style(self.terrain);
        match style.sprite.as_ref().filter(|sprite| sprite.is_ready()) {
            Some(sprite) => ctx.draw_flipbook(sprite, 0.0, 0.0, 1.0, 1.0),
            None => ctx.fill_rect(0.0, 0.0, 1.0, 1.0, style.color),
        }
        false
    }
}

impl Tile for TerrainTile {
    fn is_solid(&self) -> bool {
        self.palette.style(self.terrain).solid
    }

    fn terrain(&self) -> Option<Terrain> {
        Some(self.terrain)
    }

    fn draw(&self, ctx: &mut RenderContext, neighbors: &Neighbors<'_>) {
        let beach_drawn = self.draw_base(ctx, neighbors);
        for (direction, other) in shoreline_overlays(self.terrain, neighbors) {
            if beach_drawn && direction == Direction::South {
                continue;
            }
            let [r, g, b, _] = self.palette.style(other).color;
            let (x, y, width, height) = overlay_rect(direction);
            ctx.fill_rect(x, y, width, height, [r, g, b, SHORE_ALPHA]);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::world::TileCoord;

    fn tiles(layout: &[(i32, i32, Terrain)]) -> HashMap<TileCoord, TerrainTile> {
        let palette = Rc::new(TerrainPalette::default());
        layout
            .iter()
            .map(|(x, y, terrain)| {
                (TileCoord::new(*x, *y), TerrainTile::new(*terrain, Rc::clone(&palette)))
            })
            .collect()
    }

    fn overlays_at(map: &HashMap<TileCoord, TerrainTile>, x: i32, y: i32) -> Vec<(Direction, Terrain)> {
        let center = map.get(&TileCoord::new(x, y)).expect("center");
        let neighbors = Neighbors::from_lookup(TileCoord::new(x, y), |coord| {
            map.get(&coord).map(|tile| tile as &dyn Tile)
        });
        shoreline_overlays(center.kind(), &neighbors)
    }

    #[test]
    fn classify_uses_exclusive_upper_bounds() {
        let bands = BandThresholds::default();
        assert_eq!(Terrain::classify(-3.0, &bands), Terrain::Water);
        assert_eq!(Terrain::classify(0.19, &bands), Terrain::Water);
        assert_eq!(Terrain::classify(0.2, &bands), Terrain::Sand);
        assert_eq!(Terrain::classify(0.8, &bands), Terrain::Grass);
        assert_eq!(Terrain::classify(1.2, &bands), Terrain::Ground);
        assert_eq!(Terrain::classify(f32::INFINITY, &bands), Terrain::Ground);
        assert_eq!(Terrain::classify(f32::NAN, &bands), Terrain::Ground);
    }

    #[test]
    fn bands_are_monotonic_in_dryness() {
        let bands = BandThresholds::default();
        let mut previous = Terrain::Water;
        for step in -100..300 {
            let terrain = Terrain::classify(step as f32 * 0.01, &bands);
            assert!(terrain >= previous);
            previous = terrain;
        }
        assert_eq!(previous, Terrain::Ground);
    }

    #[test]
    fn cardinal_edges_only_toward_wetter_terrain() {
        let map = tiles(&[
            (0, 0, Terrain::Sand),
            (0, -1, Terrain::Water),
            (1, 0, Terrain::Grass),
            (0, 1, Terrain::Sand),
            (-1, 0, Terrain::Water),
        ]);
        assert_eq!(
            overlays_at(&map, 0, 0),
            vec![(Direction::North, Terrain::Water), (Direction::West, Terrain::Water)]
        );
    }

    #[test]
    fn inner_corner_needs_matching_flanks() {
        let map = tiles(&[
            (0, 0, Terrain::Grass),
            (0, -1, Terrain::Grass),
            (1, 0, Terrain::Grass),
            (1, -1, Terrain::Sand),
            (-1, 0, Terrain::Sand),
            (-1, -1, Terrain::Water),
        ]);
        assert_eq!(
            overlays_at(&map, 0, 0),
            vec![(Direction::West, Terrain::Sand), (Direction::NorthEast, Terrain::Sand)]
        );
    }
}
