use std::collections::HashMap;

use crate::app::{ParticleSource, RenderContext};
use crate::Vec2;

use super::tile::{Tile, TileCoord};
use super::{find_slot, Slot, SortKey, TileMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Free-positioned world object. `position` is the anchor point: horizontally centred on
/// the footprint and at its bottom edge.
pub trait Entity {
    fn position(&self) -> Vec2;

    fn layer(&self) -> i32 {
        0
    }

    /// Dynamic entities are re-sorted after every world update.
    fn is_dynamic(&self) -> bool {
        false
    }

    fn size(&self) -> Vec2 {
        Vec2::ONE
    }

    fn is_clickable(&self) -> bool {
        false
    }

    fn update(&mut self, _dt: f32, _ctx: &mut EntityContext<'_>) {}

    /// Draws in world coordinates; the entity position is not pre-applied.
    fn draw(&self, ctx: &mut RenderContext);

    fn on_click(&mut self, _world_pos: Vec2, _ctx: &mut EntityContext<'_>) {}

    fn particle_source(&self) -> Option<ParticleSource> {
        None
    }

    fn debug_name(&self) -> &'static str {
        "entity"
    }
}

/// World-space footprint `(min, max)` of an entity.
pub fn entity_bounds(entity: &dyn Entity) -> (Vec2, Vec2) {
    let position = entity.position();
    let size = entity.size();
    (
        Vec2::new(position.x - size.x * 0.5, position.y - size.y),
        Vec2::new(position.x + size.x * 0.5, position.y),
    )
}

pub(crate) type PendingSpawn = (EntityId, Box<dyn Entity>);

/// Deferred world mutations. Spawns get their id immediately; both lists are applied
/// by the world once the current pass is over.
pub struct WorldCommands<'a> {
    allocator: &'a mut EntityIdAllocator,
    spawns: &'a mut Vec<PendingSpawn>,
    despawns: &'a mut Vec<EntityId>,
}

impl<'a> WorldCommands<'a> {
    pub(crate) fn new(
        allocator: &'a mut EntityIdAllocator,
        spawns: &'a mut Vec<PendingSpawn>,
        despawns: &'a mut Vec<EntityId>,
    ) -> Self {
        Self {
            allocator,
            spawns,
            despawns,
        }
    }

    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = self.allocator.allocate();
        self.spawns.push((id, entity));
        id
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.despawns.push(id);
    }
}

/// What an entity can see and do while it is being updated or clicked. The entity
/// itself is mutably borrowed, so it is not visible through its own context.
pub struct EntityContext<'a> {
    id: EntityId,
    tiles: &'a TileMap,
    keys: &'a HashMap<EntityId, SortKey>,
    before: &'a [Slot],
    after: &'a [Slot],
    commands: WorldCommands<'a>,
}

impl<'a> EntityContext<'a> {
    pub(crate) fn new(
        id: EntityId,
        tiles: &'a TileMap,
        keys: &'a HashMap<EntityId, SortKey>,
        before: &'a [Slot],
        after: &'a [Slot],
        commands: WorldCommands<'a>,
    ) -> Self {
        Self {
            id,
            tiles,
            keys,
            before,
            after,
            commands,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&dyn Tile> {
        self.tiles.get(&TileCoord::new(x, y)).map(|tile| tile.as_ref())
    }

    pub fn tile_at(&self, position: Vec2) -> Option<&dyn Tile> {
        let coord = TileCoord::containing(position);
        self.tile(coord.x, coord.y)
    }

    pub fn is_solid_at(&self, position: Vec2) -> bool {
        self.tile_at(position).is_some_and(|tile| tile.is_solid())
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        let key = *self.keys.get(&id)?;
        for slots in [self.before, self.after] {
            if let Some(index) = find_slot(slots, key, id) {
                return Some(slots[index].entity.as_ref());
            }
        }
        None
    }

    pub fn entity_position(&self, id: EntityId) -> Option<Vec2> {
        self.entity(id).map(|entity| entity.position())
    }

    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> EntityId {
        self.commands.spawn(entity)
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.commands.despawn(id);
    }

    pub fn despawn_self(&mut self) {
        let id = self.id;
        self.commands.despawn(id);
    }

    pub fn commands(&mut self) -> &mut WorldCommands<'a> {
        &mut self.commands
    }
}
