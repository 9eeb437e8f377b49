mod entity;
mod tile;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::app::{ParticleSource, RenderContext, Transform};
use crate::Vec2;

pub use entity::{
    entity_bounds, Entity, EntityContext, EntityId, EntityIdAllocator, WorldCommands,
};
pub use tile::{Direction, Neighbors, Tile, TileCoord};

use entity::PendingSpawn;

pub(crate) type TileMap = HashMap<TileCoord, Box<dyn Tile>>;

/// Paint-order key: layer first, then the y of the anchor point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SortKey {
    layer: i32,
    y: f32,
}

impl SortKey {
    fn of(entity: &dyn Entity) -> Self {
        Self {
            layer: entity.layer(),
            y: entity.position().y,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.layer
            .cmp(&other.layer)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

pub(crate) struct Slot {
    id: EntityId,
    key: SortKey,
    entity: Box<dyn Entity>,
}

/// Index of `id` in `slots`, which must be sorted by stored key.
pub(crate) fn find_slot(slots: &[Slot], key: SortKey, id: EntityId) -> Option<usize> {
    let start = slots.partition_point(|slot| slot.key < key);
    slots[start..]
        .iter()
        .take_while(|slot| slot.key == key)
        .position(|slot| slot.id == id)
        .map(|offset| start + offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Entity(EntityId),
    Tile(TileCoord),
}

#[derive(Debug, Clone)]
pub struct ClickOutcome {
    pub target: ClickTarget,
    pub particle_source: Option<ParticleSource>,
}

/// Sparse tile grid plus the entity sequence kept sorted by `(layer, position.y)`.
///
/// Entities flagged dynamic at insertion are re-keyed after every [`World::update`];
/// static entities keep their slot until removed. Mutations requested from inside an
/// entity callback are deferred and applied when the pass finishes: despawns first,
/// then the dynamic re-sort, then spawns.
#[derive(Default)]
pub struct World {
    tiles: TileMap,
    slots: Vec<Slot>,
    keys: HashMap<EntityId, SortKey>,
    dynamic: BTreeSet<EntityId>,
    allocator: EntityIdAllocator,
    pending_spawns: Vec<PendingSpawn>,
    pending_despawns: Vec<EntityId>,
    resort_buffer: Vec<EntityId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or clears a tile, returning the previous occupant.
    pub fn set_tile(
        &mut self,
        x: i32,
        y: i32,
        tile: Option<Box<dyn Tile>>,
    ) -> Option<Box<dyn Tile>> {
        let coord = TileCoord::new(x, y);
        match tile {
            Some(tile) => self.tiles.insert(coord, tile),
            None => self.tiles.remove(&coord),
        }
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&dyn Tile> {
        self.tiles
            .get(&TileCoord::new(x, y))
            .map(|tile| tile.as_ref())
    }

    pub fn tile_at(&self, position: Vec2) -> Option<&dyn Tile> {
        let coord = TileCoord::containing(position);
        self.tile(coord.x, coord.y)
    }

    pub fn has_tile(&self, x: i32, y: i32) -> bool {
        self.tiles.contains_key(&TileCoord::new(x, y))
    }

    pub fn is_solid_at(&self, position: Vec2) -> bool {
        self.tile_at(position).is_some_and(|tile| tile.is_solid())
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn neighbors(&self, x: i32, y: i32) -> Neighbors<'_> {
        Neighbors::from_lookup(TileCoord::new(x, y), |coord| {
            self.tiles.get(&coord).map(|tile| tile.as_ref())
        })
    }

    /// Tiles in unspecified order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, &dyn Tile)> + '_ {
        self.tiles
            .iter()
            .map(|(coord, tile)| (*coord, tile.as_ref()))
    }

    pub fn add_entity(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = self.allocator.allocate();
        self.insert_entity(id, entity);
        id
    }

    /// No-op returning `None` when `id` is not in the world.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let key = self.keys.get(&id).copied()?;
        let index = find_slot(&self.slots, key, id)?;
        self.keys.remove(&id);
        self.dynamic.remove(&id);
        Some(self.slots.remove(index).entity)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        let index = self.slot_index(id)?;
        Some(self.slots[index].entity.as_ref())
    }

    pub fn entity_position(&self, id: EntityId) -> Option<Vec2> {
        self.entity(id).map(|entity| entity.position())
    }

    /// Mutates an entity from outside the update pass and restores its sorted slot.
    pub fn modify_entity<R>(
        &mut self,
        id: EntityId,
        modify: impl FnOnce(&mut dyn Entity) -> R,
    ) -> Option<R> {
        let index = self.slot_index(id)?;
        let result = modify(self.slots[index].entity.as_mut());
        self.rekey(id);
        Some(result)
    }

    pub fn entity_count(&self) -> usize {
        self.slots.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic.len()
    }

    /// Entities in paint order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.slots
            .iter()
            .map(|slot| (slot.id, slot.entity.as_ref()))
    }

    pub fn update(&mut self, dt: f32) {
        for tile in self.tiles.values_mut() {
            tile.update(dt);
        }

        for index in 0..self.slots.len() {
            let (before, rest) = self.slots.split_at_mut(index);
            let Some((slot, after)) = rest.split_first_mut() else {
                break;
            };
            let commands = WorldCommands::new(
                &mut self.allocator,
                &mut self.pending_spawns,
                &mut self.pending_despawns,
            );
            let mut ctx = EntityContext::new(slot.id, &self.tiles, &self.keys, before, after, commands);
            slot.entity.update(dt, &mut ctx);
        }

        self.apply_despawns();
        self.resort_dynamic();
        self.apply_spawns();
    }

    /// Frontmost clickable entity whose footprint contains `world_pos`: higher layer wins,
    /// then higher y, then the later one in paint order.
    pub fn clickable_entity_at(&self, world_pos: Vec2) -> Option<EntityId> {
        let mut best: Option<(SortKey, EntityId)> = None;
        for slot in &self.slots {
            let entity = slot.entity.as_ref();
            if !entity.is_clickable() {
                continue;
            }
            let (min, max) = entity_bounds(entity);
            if world_pos.x < min.x || world_pos.x > max.x || world_pos.y < min.y || world_pos.y > max.y
            {
                continue;
            }
            let key = SortKey::of(entity);
            if best.map_or(true, |(best_key, _)| key >= best_key) {
                best = Some((key, slot.id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Routes a click to the frontmost clickable entity, or to the tile under the point.
    pub fn click(&mut self, world_pos: Vec2) -> Option<ClickOutcome> {
        if let Some(id) = self.clickable_entity_at(world_pos) {
            let index = self.slot_index(id)?;
            let (before, rest) = self.slots.split_at_mut(index);
            let (slot, after) = rest.split_first_mut()?;
            let commands = WorldCommands::new(
                &mut self.allocator,
                &mut self.pending_spawns,
                &mut self.pending_despawns,
            );
            let mut ctx = EntityContext::new(id, &self.tiles, &self.keys, before, after, commands);
            slot.entity.on_click(world_pos, &mut ctx);
            let particle_source = slot.entity.particle_source();
            self.rekey(id);
            self.apply_pending();
            return Some(ClickOutcome {
                target: ClickTarget::Entity(id),
                particle_source,
            });
        }

        let coord = TileCoord::containing(world_pos);
        let tile = self.tiles.get_mut(&coord)?;
        let mut commands = WorldCommands::new(
            &mut self.allocator,
            &mut self.pending_spawns,
            &mut self.pending_despawns,
        );
        tile.on_click(world_pos, &mut commands);
        let particle_source = tile.particle_source();
        self.apply_pending();
        Some(ClickOutcome {
            target: ClickTarget::Tile(coord),
            particle_source,
        })
    }

    /// Draws the tiles inside the visible rectangle, then every entity whose footprint
    /// overlaps it, in paint order.
    pub fn draw(&self, ctx: &mut RenderContext) {
        let visible = ctx.visible_bounds();
        let columns = i64::from(visible.max_x) - i64::from(visible.min_x) + 1;
        let rows = i64::from(visible.max_y) - i64::from(visible.min_y) + 1;
        let area = columns.max(0).saturating_mul(rows.max(0));

        if area <= self.tiles.len() as i64 {
            for y in visible.min_y..=visible.max_y {
                for x in visible.min_x..=visible.max_x {
                    let coord = TileCoord::new(x, y);
                    if let Some(tile) = self.tiles.get(&coord) {
                        self.draw_tile(ctx, coord, tile.as_ref());
                    }
                }
            }
        } else {
            for (coord, tile) in &self.tiles {
                if visible.contains_tile(coord.x, coord.y) {
                    self.draw_tile(ctx, *coord, tile.as_ref());
                }
            }
        }

        for slot in &self.slots {
            let (min, max) = entity_bounds(slot.entity.as_ref());
            if visible.intersects_box(min, max) {
                slot.entity.draw(ctx);
            }
        }
    }

    fn draw_tile(&self, ctx: &mut RenderContext, coord: TileCoord, tile: &dyn Tile) {
        ctx.push_transform(Transform::translate(coord.origin()));
        tile.draw(ctx, &self.neighbors(coord.x, coord.y));
        ctx.pop_transform();
    }

    fn slot_index(&self, id: EntityId) -> Option<usize> {
        let key = self.keys.get(&id).copied()?;
        find_slot(&self.slots, key, id)
    }

    fn insert_entity(&mut self, id: EntityId, entity: Box<dyn Entity>) {
        let key = SortKey::of(entity.as_ref());
        if entity.is_dynamic() {
            self.dynamic.insert(id);
        }
        self.keys.insert(id, key);
        let index = self.slots.partition_point(|slot| slot.key <= key);
        self.slots.insert(index, Slot { id, key, entity });
    }

    fn rekey(&mut self, id: EntityId) {
        let Some(index) = self.slot_index(id) else {
            return;
        };
        let key = SortKey::of(self.slots[index].entity.as_ref());
        if key == self.slots[index].key {
            return;
        }
        let mut slot = self.slots.remove(index);
        slot.key = key;
        self.keys.insert(id, key);
        let index = self.slots.partition_point(|other| other.key <= key);
        self.slots.insert(index, slot);
    }

    fn resort_dynamic(&mut self) {
        let mut ids = std::mem::take(&mut self.resort_buffer);
        ids.clear();
        ids.extend(self.dynamic.iter().copied());
        for id in &ids {
            self.rekey(*id);
        }
        self.resort_buffer = ids;
    }

    fn apply_despawns(&mut self) {
        if self.pending_despawns.is_empty() {
            return;
        }
        let mut despawns = std::mem::take(&mut self.pending_despawns);
        despawns.sort();
        despawns.dedup();
        self.pending_spawns
            .retain(|(id, _)| despawns.binary_search(id).is_err());
        for id in &despawns {
            self.remove_entity(*id);
        }
        despawns.clear();
        self.pending_despawns = despawns;
    }

    fn apply_spawns(&mut self) {
        if self.pending_spawns.is_empty() {
            return;
        }
        let spawns = std::mem::take(&mut self.pending_spawns);
        for (id, entity) in spawns {
            self.insert_entity(id, entity);
        }
    }

    fn apply_pending(&mut self) {
        self.apply_despawns();
        self.apply_spawns();
    }

    #[cfg(test)]
    fn is_sorted_by_current_keys(&self) -> bool {
        self.slots.windows(2).all(|pair| {
            SortKey::of(pair[0].entity.as_ref()) <= SortKey::of(pair[1].entity.as_ref())
        })
    }
}
