use std::rc::Rc;

use castaway_engine::{ContentSpawner, Entity, EntityId, SpawnKind, Vec2, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use super::crab::Crab;
use super::flora::{Bush, FruitTree, FruitTreeKind, Tallgrass};
use super::items::{Item, ItemKind};
use super::props::{Prop, PropKind};
use super::sprites::IslandSprites;

/// Turns generator decisions into island entities. Entities that react to the player are
/// handed its id, so the player must be registered before the first generation pass.
pub(crate) struct IslandSpawner {
    sprites: Rc<IslandSprites>,
    player: Option<EntityId>,
    rng: StdRng,
    spawned: usize,
}

impl IslandSpawner {
    pub(crate) fn new(sprites: Rc<IslandSprites>, seed: u64) -> Self {
        Self {
            sprites,
            player: None,
            rng: StdRng::seed_from_u64(seed),
            spawned: 0,
        }
    }

    pub(crate) fn set_player(&mut self, player: EntityId) {
        self.player = Some(player);
    }

    pub(crate) fn spawned_count(&self) -> usize {
        self.spawned
    }

    fn build(&mut self, kind: SpawnKind, position: Vec2) -> Box<dyn Entity> {
        let sprites = Rc::clone(&self.sprites);
        let player = self.player;
        match kind {
            SpawnKind::Hostile => Box::new(Crab::new(
                position,
                player,
                sprites.crab.clone(),
                self.rng.gen(),
            )),
            SpawnKind::Wreck => Box::new(Prop::new(
                PropKind::Shipwreck,
                position,
                sprites.shipwreck.clone(),
            )),
            SpawnKind::Rock | SpawnKind::Stick => {
                let item = if kind == SpawnKind::Rock {
                    ItemKind::Rock
                } else {
                    ItemKind::Stick
                };
                Box::new(Item::resting(item, item.sprite(&sprites), position, player))
            }
            SpawnKind::PalmTree { fruit } => Box::new(FruitTree::new(
                FruitTreeKind::Palm,
                position,
                sprites.palm_tree.clone(),
                sprites.coconut.clone(),
                fruit,
                player,
                self.rng.gen(),
            )),
            SpawnKind::MangoTree { fruit } => Box::new(FruitTree::new(
                FruitTreeKind::Mango,
                position,
                sprites.mango_tree.clone(),
                sprites.mango.clone(),
                fruit,
                player,
                self.rng.gen(),
            )),
            SpawnKind::Bush => Box::new(Bush::new(position, sprites.bush.clone())),
            SpawnKind::Tallgrass { tall } => {
                let sprite = if tall {
                    sprites.tallgrass.clone()
                } else {
                    sprites.tallgrass_short.clone()
                };
                Box::new(Tallgrass::new(position, sprite))
            }
            SpawnKind::Landmark => Box::new(Prop::new(
                PropKind::JetWreck,
                position,
                sprites.jet_wreck.clone(),
            )),
            SpawnKind::LandmarkSatellite => Box::new(Prop::new(
                PropKind::Suitcase,
                position,
                sprites.suitcase.clone(),
            )),
        }
    }
}

impl ContentSpawner for IslandSpawner {
    fn spawn(&mut self, world: &mut World, kind: SpawnKind, position: Vec2) -> Option<EntityId> {
        let entity = self.build(kind, position);
        let id = world.add_entity(entity);
        self.spawned += 1;
        trace!(kind = ?kind, x = position.x, y = position.y, "content_spawned");
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use castaway_engine::RenderContext;

    use super::*;

    fn spawner() -> IslandSpawner {
        IslandSpawner::new(Rc::new(IslandSprites::placeholder()), 11)
    }

    #[test]
    fn every_kind_becomes_the_matching_entity() {
        let cases = [
            (SpawnKind::Hostile, "crab"),
            (SpawnKind::Wreck, "shipwreck"),
            (SpawnKind::Rock, "item"),
            (SpawnKind::Stick, "item"),
            (SpawnKind::PalmTree { fruit: true }, "palm_tree"),
            (SpawnKind::MangoTree { fruit: false }, "mango_tree"),
            (SpawnKind::Bush, "bush"),
            (SpawnKind::Tallgrass { tall: true }, "tallgrass"),
            (SpawnKind::Landmark, "jet_wreck"),
            (SpawnKind::LandmarkSatellite, "suitcase"),
        ];
        let mut spawner = spawner();
        let mut world = World::new();

        for (kind, expected) in cases {
            let position = Vec2::new(4.0, -2.0);
            let id = spawner.spawn(&mut world, kind, position).expect("spawned");
            let entity = world.entity(id).expect("entity in world");
            assert_eq!(entity.debug_name(), expected, "kind={kind:?}");
            assert_eq!(entity.position(), position);
        }
        assert_eq!(spawner.spawned_count(), cases.len());
        assert_eq!(world.entity_count(), cases.len());
    }

    #[test]
    fn fruit_trees_know_the_registered_player() {
        struct Standing;

        impl Entity for Standing {
            fn position(&self) -> Vec2 {
                Vec2::new(1.0, 0.0)
            }

            fn draw(&self, _ctx: &mut RenderContext) {}
        }

        let mut spawner = spawner();
        let mut world = World::new();
        let player = world.add_entity(Box::new(Standing));
        spawner.set_player(player);
        let tree = spawner
            .spawn(&mut world, SpawnKind::PalmTree { fruit: true }, Vec2::ZERO)
            .expect("tree");

        world.update(0.016);
        assert!(world.entity(tree).expect("tree").is_clickable());
    }
}
