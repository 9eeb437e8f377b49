mod noise_field;
mod terrain;

use std::collections::HashSet;
use std::f32::consts::TAU;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::world::{EntityId, TileCoord, World};
use crate::Vec2;

pub use noise_field::NoiseField;
pub use terrain::{
    shoreline_overlays, BandThresholds, Terrain, TerrainPalette, TerrainStyle, TerrainTile,
};

/// Bernoulli spawn rule gated on an open dryness interval.
///
/// With a `latitude_scale` the chance becomes `chance * (-y / latitude_scale)`, so it grows
/// northward and is zero or negative south of the origin row; `floor` then lifts it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpawnRule {
    pub chance: f32,
    pub min_dryness: f32,
    #[serde(default = "unbounded")]
    pub max_dryness: f32,
    #[serde(default)]
    pub latitude_scale: Option<f32>,
    #[serde(default)]
    pub floor: f32,
}

fn unbounded() -> f32 {
    f32::INFINITY
}

impl SpawnRule {
    pub fn new(chance: f32, min_dryness: f32, max_dryness: f32) -> Self {
        Self {
            chance,
            min_dryness,
            max_dryness,
            latitude_scale: None,
            floor: 0.0,
        }
    }

    pub fn scaled_by_latitude(mut self, scale: f32) -> Self {
        self.latitude_scale = Some(scale);
        self
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    pub fn admits(&self, dryness: f32) -> bool {
        dryness > self.min_dryness && dryness < self.max_dryness
    }

    pub fn probability(&self, y: i32) -> f32 {
        let scaled = match self.latitude_scale {
            Some(scale) if scale != 0.0 => self.chance * (-(y as f32) / scale),
            _ => self.chance,
        };
        scaled.max(self.floor)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub noise_offset: f64,
    pub noise_frequency: f64,
    /// Rows south of this latitude (larger y) are dampened toward zero dryness; rows north
    /// of it get drier.
    pub falloff_latitude: f32,
    pub falloff_slope: f32,
    pub bands: BandThresholds,

    pub hostile_latitude: i32,
    pub hostile_min_dryness: f32,
    pub hostile_chance: f32,

    pub wreck_chance: f32,
    pub wreck_exclusion_radius: f32,

    pub item: SpawnRule,
    pub rock_share: f32,
    pub palm_tree: SpawnRule,
    pub palm_fruit_chance: f32,
    pub mango_tree: SpawnRule,
    pub mango_fruit_chance: f32,
    pub bush: SpawnRule,
    pub tallgrass: SpawnRule,
    pub tallgrass_tall_chance: f32,
    pub decoration_offset_min: f32,
    pub decoration_offset_max: f32,

    pub landmark_chance: f32,
    pub landmark_min_dryness: f32,
    pub landmark_exclusion_radius: f32,
    pub landmark_search_radius: i32,
    pub landmark_half_extent: i32,
    pub satellite_count_min: u32,
    pub satellite_count_max: u32,
    pub satellite_radius_min: f32,
    pub satellite_radius_max: f32,

    pub surroundings_radius: i32,
    pub regeneration_distance: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            noise_offset: 10.0,
            noise_frequency: 0.1,
            falloff_latitude: -50.0,
            falloff_slope: 0.01,
            bands: BandThresholds::default(),

            hostile_latitude: -20,
            hostile_min_dryness: 0.2,
            hostile_chance: 0.005,

            wreck_chance: 0.01,
            wreck_exclusion_radius: 10.0,

            item: SpawnRule::new(0.01, 0.2, f32::INFINITY),
            rock_share: 0.3,
            palm_tree: SpawnRule::new(0.05, 0.3, 1.2).scaled_by_latitude(100.0),
            palm_fruit_chance: 0.2,
            mango_tree: SpawnRule::new(0.03, 0.6, 1.2).scaled_by_latitude(100.0),
            mango_fruit_chance: 0.3,
            bush: SpawnRule::new(0.04, 0.2, 1.2).scaled_by_latitude(50.0),
            tallgrass: SpawnRule::new(0.05, 0.8, 1.2)
                .scaled_by_latitude(50.0)
                .with_floor(0.5),
            tallgrass_tall_chance: 0.2,
            decoration_offset_min: 0.1,
            decoration_offset_max: 0.5,

            landmark_chance: 0.005,
            landmark_min_dryness: 0.8,
            landmark_exclusion_radius: 40.0,
            landmark_search_radius: 10,
            landmark_half_extent: 4,
            satellite_count_min: 3,
            satellite_count_max: 5,
            satellite_radius_min: 3.0,
            satellite_radius_max: 6.0,

            surroundings_radius: 12,
            regeneration_distance: 6.0,
        }
    }
}

/// Content the generator decided to place; the spawner turns it into an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnKind {
    Hostile,
    Wreck,
    Rock,
    Stick,
    PalmTree { fruit: bool },
    MangoTree { fruit: bool },
    Bush,
    Tallgrass { tall: bool },
    Landmark,
    LandmarkSatellite,
}

pub trait ContentSpawner {
    fn spawn(&mut self, world: &mut World, kind: SpawnKind, position: Vec2) -> Option<EntityId>;
}

/// Derives terrain and spawns content per tile coordinate.
///
/// Owns every piece of generation state: the noise field, the spawn RNG, tiles reserved by
/// landmark footprints and the positions of large structures (seeded with the origin).
pub struct Generator<S> {
    config: GeneratorConfig,
    noise: NoiseField,
    rng: StdRng,
    palette: Rc<TerrainPalette>,
    spawner: S,
    reserved: HashSet<TileCoord>,
    large_structures: Vec<Vec2>,
    last_focus: Option<Vec2>,
}

impl<S: ContentSpawner> Generator<S> {
    pub fn new(seed: u64, config: GeneratorConfig, palette: Rc<TerrainPalette>, spawner: S) -> Self {
        Self {
            config,
            noise: NoiseField::new(seed),
            rng: StdRng::seed_from_u64(seed),
            palette,
            spawner,
            reserved: HashSet::new(),
            large_structures: vec![Vec2::ZERO],
            last_focus: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.noise.seed()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn palette(&self) -> &Rc<TerrainPalette> {
        &self.palette
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn spawner_mut(&mut self) -> &mut S {
        &mut self.spawner
    }

    pub fn large_structures(&self) -> &[Vec2] {
        &self.large_structures
    }

    pub fn is_reserved(&self, x: i32, y: i32) -> bool {
        self.reserved.contains(&TileCoord::new(x, y))
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    pub fn dryness(&self, x: i32, y: i32) -> f32 {
        let config = &self.config;
        let sample_x = (f64::from(x) - config.noise_offset) * config.noise_frequency;
        let sample_y = f64::from(y) * config.noise_frequency;
        let base = self.noise.sample(sample_x, sample_y) / 2.0 + 0.5;

        let y = y as f32;
        if y > config.falloff_latitude {
            (base * (1.0 - (y - config.falloff_latitude) * config.falloff_slope)).max(0.0)
        } else {
            base + (config.falloff_latitude - y) * config.falloff_slope
        }
    }

    pub fn terrain_at(&self, x: i32, y: i32) -> Terrain {
        Terrain::classify(self.dryness(x, y), &self.config.bands)
    }

    /// Builds the terrain tile for `(x, y)` and adds whatever content the spawn layers roll
    /// for it. The caller stores the returned tile.
    pub fn generate_tile(&mut self, world: &mut World, x: i32, y: i32) -> TerrainTile {
        let dryness = self.dryness(x, y);

        if !self.reserved.remove(&TileCoord::new(x, y)) {
            self.spawn_hostile(world, x, y, dryness);
            if x != 0 && y > 0 && self.roll(self.config.wreck_chance) {
                self.try_wreck(world, x, y, dryness);
            }
            self.spawn_resource(world, x, y, dryness);
        }

        if dryness > self.config.landmark_min_dryness && self.roll(self.config.landmark_chance) {
            self.try_landmark(world, x, y);
        }

        TerrainTile::new(
            Terrain::classify(dryness, &self.config.bands),
            Rc::clone(&self.palette),
        )
    }

    /// Generates every missing tile in the square of `radius` around `center`.
    pub fn generate_surroundings(&mut self, world: &mut World, center: Vec2, radius: i32) -> usize {
        let center_tile = TileCoord::containing(center);
        let radius = radius.max(0);
        let mut generated = 0;
        for y in center_tile.y.saturating_sub(radius)..=center_tile.y.saturating_add(radius) {
            for x in center_tile.x.saturating_sub(radius)..=center_tile.x.saturating_add(radius) {
                if world.has_tile(x, y) {
                    continue;
                }
                let tile = self.generate_tile(world, x, y);
                world.set_tile(x, y, Some(Box::new(tile)));
                generated += 1;
            }
        }
        self.last_focus = Some(center);
        if generated > 0 {
            debug!(
                x = center_tile.x,
                y = center_tile.y,
                generated,
                entities = world.entity_count(),
                "surroundings_generated"
            );
        }
        generated
    }

    /// Regenerates around `focus` once it is farther than the regeneration distance from
    /// the last generation point. Returns whether generation ran.
    pub fn track_focus(&mut self, world: &mut World, focus: Vec2) -> bool {
        let due = self
            .last_focus
            .map_or(true, |last| last.distance_to(focus) > self.config.regeneration_distance);
        if due {
            let radius = self.config.surroundings_radius;
            self.generate_surroundings(world, focus, radius);
        }
        due
    }

    fn roll(&mut self, chance: f32) -> bool {
        self.rng.gen::<f32>() < chance
    }

    fn spawn(&mut self, world: &mut World, kind: SpawnKind, position: Vec2) {
        self.spawner.spawn(world, kind, position);
    }

    fn spawn_hostile(&mut self, world: &mut World, x: i32, y: i32, dryness: f32) {
        if y < self.config.hostile_latitude
            && dryness > self.config.hostile_min_dryness
            && self.roll(self.config.hostile_chance)
        {
            self.spawn(world, SpawnKind::Hostile, TileCoord::new(x, y).center());
        }
    }

    fn try_wreck(&mut self, world: &mut World, x: i32, y: i32, dryness: f32) {
        let east = x.saturating_add(1);
        let south = y.saturating_add(1);
        let samples = [
            dryness,
            self.dryness(east, y),
            self.dryness(x, south),
            self.dryness(east, south),
        ];
        let bands = self.config.bands;
        let has_water = samples.iter().any(|d| *d < bands.water_max);
        let has_sand = samples
            .iter()
            .any(|d| *d >= bands.water_max && *d < bands.sand_max);
        let origin = TileCoord::new(x, y).origin();
        if !has_water || !has_sand || self.near_large_structure(origin, self.config.wreck_exclusion_radius) {
            return;
        }

        let position = TileCoord::new(east, south).origin();
        self.spawn(world, SpawnKind::Wreck, position);
        self.large_structures.push(position);
        debug!(x = position.x, y = position.y, "wreck_spawned");
    }

    /// First matching rule wins; each rule rolls only if every earlier one declined.
    fn spawn_resource(&mut self, world: &mut World, x: i32, y: i32, dryness: f32) {
        let config = self.config.clone();
        let center = TileCoord::new(x, y).center();

        if self.passes(&config.item, dryness, y) {
            let kind = if self.roll(config.rock_share) {
                SpawnKind::Rock
            } else {
                SpawnKind::Stick
            };
            self.spawn(world, kind, center);
        } else if self.passes(&config.palm_tree, dryness, y) {
            let fruit = self.roll(config.palm_fruit_chance);
            self.spawn(world, SpawnKind::PalmTree { fruit }, center);
        } else if self.passes(&config.mango_tree, dryness, y) {
            let fruit = self.roll(config.mango_fruit_chance);
            self.spawn(world, SpawnKind::MangoTree { fruit }, center);
        } else if self.passes(&config.bush, dryness, y) {
            let position = center + self.decoration_offset();
            self.spawn(world, SpawnKind::Bush, position);
        } else if self.passes(&config.tallgrass, dryness, y) {
            let position = center + self.decoration_offset();
            let tall = self.roll(config.tallgrass_tall_chance);
            self.spawn(world, SpawnKind::Tallgrass { tall }, position);
        }
    }

    fn passes(&mut self, rule: &SpawnRule, dryness: f32, y: i32) -> bool {
        rule.admits(dryness) && self.roll(rule.probability(y))
    }

    fn decoration_offset(&mut self) -> Vec2 {
        let angle = self.rng.gen_range(0.0..TAU);
        let radius = self.random_between(
            self.config.decoration_offset_min,
            self.config.decoration_offset_max,
        );
        Vec2::from_angle(angle, radius)
    }

    fn random_between(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    fn near_large_structure(&self, point: Vec2, radius: f32) -> bool {
        self.large_structures
            .iter()
            .any(|structure| structure.distance_to(point) < radius)
    }

    fn try_landmark(&mut self, world: &mut World, x: i32, y: i32) {
        let origin = TileCoord::new(x, y).origin();
        if self.near_large_structure(origin, self.config.landmark_exclusion_radius) {
            return;
        }
        let current = TileCoord::new(x, y);
        let Some(site) = self.find_landmark_site(world, current) else {
            debug!(x, y, "landmark_site_not_found");
            return;
        };

        let half = self.config.landmark_half_extent.max(0);
        for oy in -half..=half {
            for ox in -half..=half {
                self.reserved.insert(TileCoord::new(
                    site.x.saturating_add(ox),
                    site.y.saturating_add(oy),
                ));
            }
        }

        let position = site.center();
        self.spawn(world, SpawnKind::Landmark, position);
        self.large_structures.push(position);

        let min_count = self.config.satellite_count_min;
        let max_count = self.config.satellite_count_max.max(min_count);
        let count = self.rng.gen_range(min_count..=max_count);
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let radius = self.random_between(
                self.config.satellite_radius_min,
                self.config.satellite_radius_max,
            );
            let satellite = position + Vec2::from_angle(angle, radius);
            self.spawn(world, SpawnKind::LandmarkSatellite, satellite);
            self.large_structures.push(satellite);
        }
        info!(
            x = position.x,
            y = position.y,
            satellites = count,
            "landmark_spawned"
        );
    }

    /// Searches square rings of growing radius around `current` for a footprint that is
    /// neither generated, reserved, nor overlapping the tile being generated.
    fn find_landmark_site(&self, world: &World, current: TileCoord) -> Option<TileCoord> {
        let search = self.config.landmark_search_radius.max(0);
        for ring in 0..=search {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    let candidate =
                        TileCoord::new(current.x.saturating_add(dx), current.y.saturating_add(dy));
                    if self.footprint_is_free(world, candidate, current) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    fn footprint_is_free(&self, world: &World, center: TileCoord, current: TileCoord) -> bool {
        let half = self.config.landmark_half_extent.max(0);
        for oy in -half..=half {
            for ox in -half..=half {
                let tile = TileCoord::new(center.x.saturating_add(ox), center.y.saturating_add(oy));
                if tile == current || world.has_tile(tile.x, tile.y) || self.reserved.contains(&tile) {
                    return false;
                }
            }
        }
        true
    }
}
