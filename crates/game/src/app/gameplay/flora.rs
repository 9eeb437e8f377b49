use castaway_engine::effects::{spawn_hint, HintHandle};
use castaway_engine::{
    Entity, EntityContext, EntityId, Flipbook, ParticleSource, RenderContext, SpriteHandle,
    SpriteRegion, Vec2,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::items::{Item, ItemKind};
use super::{draw_shadow, play_sound, CONTENT_LAYER};

const SHAKE_RANGE_SQ: f32 = 16.0;
const DROP_COUNT_MIN: u32 = 1;
const DROP_COUNT_MAX: u32 = 3;
const DROP_RADIUS_MIN: f32 = 0.3;
const DROP_RADIUS_MAX: f32 = 0.8;
const HIGHLIGHT_COLOR: [u8; 4] = [255, 255, 255, 200];
const HIGHLIGHT_LINE: f32 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FruitTreeKind {
    Palm,
    Mango,
}

impl FruitTreeKind {
    fn name(self) -> &'static str {
        match self {
            FruitTreeKind::Palm => "palm_tree",
            FruitTreeKind::Mango => "mango_tree",
        }
    }

    fn fruit(self) -> ItemKind {
        match self {
            FruitTreeKind::Palm => ItemKind::Coconut,
            FruitTreeKind::Mango => ItemKind::Mango,
        }
    }

    fn size(self) -> Vec2 {
        match self {
            FruitTreeKind::Palm => Vec2::new(1.0, 3.0),
            FruitTreeKind::Mango => Vec2::new(2.0, 2.5),
        }
    }
}

/// Tree that can be shaken once for fruit while the player stands close by.
pub(crate) struct FruitTree {
    kind: FruitTreeKind,
    position: Vec2,
    flipbook: Flipbook,
    fruit_sprite: SpriteHandle,
    has_fruit: bool,
    player: Option<EntityId>,
    highlighted: bool,
    label: Option<HintHandle>,
    rng: StdRng,
}

impl FruitTree {
    pub(crate) fn new(
        kind: FruitTreeKind,
        position: Vec2,
        flipbook: Flipbook,
        fruit_sprite: SpriteHandle,
        has_fruit: bool,
        player: Option<EntityId>,
        seed: u64,
    ) -> Self {
        Self {
            kind,
            position,
            flipbook,
            fruit_sprite,
            has_fruit,
            player,
            highlighted: false,
            label: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn set_highlighted(&mut self, highlighted: bool, ctx: &mut EntityContext<'_>) {
        if highlighted == self.highlighted {
            return;
        }
        self.highlighted = highlighted;
        if highlighted {
            let id = ctx.id();
            let offset = Vec2::new(0.0, -self.kind.size().y + 1.5);
            self.label = Some(spawn_hint(
                ctx.commands(),
                id,
                self.position,
                vec!["Shake".to_string()],
                offset,
            ));
        } else if let Some(label) = self.label.take() {
            label.destroy();
        }
    }

    fn drop_fruit(&mut self, ctx: &mut EntityContext<'_>) -> u32 {
        let count = self.rng.gen_range(DROP_COUNT_MIN..=DROP_COUNT_MAX);
        let fruit = self.kind.fruit();
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let radius = self.rng.gen_range(DROP_RADIUS_MIN..DROP_RADIUS_MAX);
            let landing = self.position + Vec2::from_angle(angle, radius);
            ctx.spawn(Box::new(Item::dropped(
                fruit,
                self.fruit_sprite.clone(),
                self.position,
                landing,
                self.player,
            )));
        }
        count
    }

    fn draw_fruit(&self, ctx: &mut RenderContext) {
        let size = self.kind.size();
        let crown = self.position.y - size.y * 0.72;
        for (dx, dy) in [(-0.28, 0.0), (0.04, 0.1), (0.22, -0.06)] {
            ctx.draw_image(
                &self.fruit_sprite,
                self.position.x + dx - 0.15,
                crown + dy,
                0.3,
                0.3,
            );
        }
    }
}

impl Entity for FruitTree {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn size(&self) -> Vec2 {
        self.kind.size()
    }

    fn is_clickable(&self) -> bool {
        self.highlighted
    }

    fn update(&mut self, _dt: f32, ctx: &mut EntityContext<'_>) {
        let in_reach = self
            .player
            .and_then(|id| ctx.entity_position(id))
            .is_some_and(|player| self.position.distance_squared_to(player) < SHAKE_RANGE_SQ);
        self.set_highlighted(self.has_fruit && in_reach, ctx);
    }

    fn draw(&self, ctx: &mut RenderContext) {
        let size = self.kind.size();
        let left = self.position.x - size.x * 0.5;
        let top = self.position.y - size.y;
        draw_shadow(ctx, self.position, size.x * 0.6, 0.2);
        ctx.draw_flipbook(&self.flipbook, left, top, size.x, size.y);
        if self.has_fruit {
            self.draw_fruit(ctx);
        }
        if self.highlighted {
            ctx.stroke_rect(left, top, size.x, size.y, HIGHLIGHT_COLOR, HIGHLIGHT_LINE);
        }
    }

    fn on_click(&mut self, _world_pos: Vec2, ctx: &mut EntityContext<'_>) {
        if !self.has_fruit {
            return;
        }
        let dropped = self.drop_fruit(ctx);
        self.has_fruit = false;
        self.set_highlighted(false, ctx);
        play_sound("tree_shake", self.position);
        info!(tree = self.kind.name(), dropped, "fruit_dropped");
    }

    fn particle_source(&self) -> Option<ParticleSource> {
        Some(SpriteRegion::whole(self.fruit_sprite.clone()))
    }

    fn debug_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Swaying shrub.
pub(crate) struct Bush {
    position: Vec2,
    flipbook: Flipbook,
}

impl Bush {
    pub(crate) fn new(position: Vec2, flipbook: Flipbook) -> Self {
        Self { position, flipbook }
    }
}

impl Entity for Bush {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn draw(&self, ctx: &mut RenderContext) {
        draw_shadow(ctx, self.position, 0.4, 0.12);
        ctx.draw_flipbook(
            &self.flipbook,
            self.position.x - 0.5,
            self.position.y - 1.0,
            1.0,
            1.0,
        );
    }

    fn debug_name(&self) -> &'static str {
        "bush"
    }
}

pub(crate) struct Tallgrass {
    position: Vec2,
    sprite: SpriteHandle,
}

impl Tallgrass {
    pub(crate) fn new(position: Vec2, sprite: SpriteHandle) -> Self {
        Self { position, sprite }
    }
}

impl Entity for Tallgrass {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn draw(&self, ctx: &mut RenderContext) {
        ctx.draw_image(
            &self.sprite,
            self.position.x - 0.5,
            self.position.y - 1.0,
            1.0,
            1.0,
        );
    }

    fn debug_name(&self) -> &'static str {
        "tallgrass"
    }
}

#[cfg(test)]
mod tests {
    use castaway_engine::world::ClickTarget;
    use castaway_engine::World;

    use super::*;

    struct Marker {
        position: Vec2,
    }

    impl Entity for Marker {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn draw(&self, _ctx: &mut RenderContext) {}
    }

    fn palm(position: Vec2, has_fruit: bool, player: Option<EntityId>) -> FruitTree {
        let sprite = SpriteHandle::new("trees/palm").expect("sprite key");
        FruitTree::new(
            FruitTreeKind::Palm,
            position,
            Flipbook::new(sprite, 2, 0.75),
            SpriteHandle::new("items/coconut").expect("sprite key"),
            has_fruit,
            player,
            7,
        )
    }

    fn coconuts(world: &World) -> usize {
        world
            .entities()
            .filter(|(_, entity)| entity.debug_name() == "item")
            .count()
    }

    #[test]
    fn tree_is_clickable_only_with_fruit_and_player_in_reach() {
        let mut world = World::new();
        let player = world.add_entity(Box::new(Marker {
            position: Vec2::new(3.0, 0.0),
        }));
        let loaded = world.add_entity(Box::new(palm(Vec2::ZERO, true, Some(player))));
        let bare = world.add_entity(Box::new(palm(Vec2::new(1.0, 0.0), false, Some(player))));
        let far = world.add_entity(Box::new(palm(Vec2::new(20.0, 0.0), true, Some(player))));

        world.update(0.016);

        assert!(world.entity(loaded).expect("loaded").is_clickable());
        assert!(!world.entity(bare).expect("bare").is_clickable());
        assert!(!world.entity(far).expect("far").is_clickable());
    }

    #[test]
    fn shaking_drops_fruit_once() {
        let mut world = World::new();
        let player = world.add_entity(Box::new(Marker {
            position: Vec2::new(2.0, 0.0),
        }));
        let tree = world.add_entity(Box::new(palm(Vec2::ZERO, true, Some(player))));
        world.update(0.016);

        let outcome = world.click(Vec2::new(0.0, -1.5)).expect("click outcome");
        assert_eq!(outcome.target, ClickTarget::Entity(tree));
        assert!(outcome.particle_source.is_some());

        let dropped = coconuts(&world);
        assert!((1..=3).contains(&dropped), "dropped={dropped}");
        assert!(!world.entity(tree).expect("tree").is_clickable());

        world.update(0.5);
        for (_, entity) in world.entities().filter(|(_, entity)| entity.debug_name() == "item") {
            let distance = entity.position().length();
            assert!((0.3..=0.8).contains(&distance), "distance={distance}");
        }
        assert!(world.click(Vec2::new(0.0, -1.5)).is_none());
        assert_eq!(coconuts(&world), dropped);
    }
}
