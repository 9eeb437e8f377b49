use castaway_engine::effects::{spawn_hint, HintHandle};
use castaway_engine::{Entity, EntityContext, EntityId, RenderContext, SpriteHandle, Vec2};
use tracing::info;

use super::sprites::IslandSprites;
use super::{draw_shadow, play_sound, CONTENT_LAYER};

const ITEM_SIZE: f32 = 0.5;
const ARC_DURATION: f32 = 0.4;
const ARC_PEAK: f32 = 0.8;
const PICKUP_DURATION: f32 = 0.3;
const PICKUP_RANGE_SQ: f32 = 1.0;
const HIGHLIGHT_RANGE_SQ: f32 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Rock,
    Stick,
    Coconut,
    Mango,
}

impl ItemKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ItemKind::Rock => "Rock",
            ItemKind::Stick => "Stick",
            ItemKind::Coconut => "Coconut",
            ItemKind::Mango => "Mango",
        }
    }

    pub(crate) fn sprite(self, sprites: &IslandSprites) -> SpriteHandle {
        match self {
            ItemKind::Rock => sprites.rock.clone(),
            ItemKind::Stick => sprites.stick.clone(),
            ItemKind::Coconut => sprites.coconut.clone(),
            ItemKind::Mango => sprites.mango.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ItemPhase {
    Flying { from: Vec2, to: Vec2, elapsed: f32 },
    Resting,
    PickingUp { from: Vec2, elapsed: f32 },
}

/// Loose item on the ground. Dropped items fly in an arc before they can be collected;
/// resting items are collected when the player walks over them.
pub(crate) struct Item {
    kind: ItemKind,
    sprite: SpriteHandle,
    position: Vec2,
    phase: ItemPhase,
    player: Option<EntityId>,
    label: Option<HintHandle>,
}

impl Item {
    pub(crate) fn resting(
        kind: ItemKind,
        sprite: SpriteHandle,
        position: Vec2,
        player: Option<EntityId>,
    ) -> Self {
        Self {
            kind,
            sprite,
            position,
            phase: ItemPhase::Resting,
            player,
            label: None,
        }
    }

    pub(crate) fn dropped(
        kind: ItemKind,
        sprite: SpriteHandle,
        from: Vec2,
        to: Vec2,
        player: Option<EntityId>,
    ) -> Self {
        Self {
            phase: ItemPhase::Flying {
                from,
                to,
                elapsed: 0.0,
            },
            ..Self::resting(kind, sprite, from, player)
        }
    }

    /// Height above the ground along the drop arc.
    fn lift(&self) -> f32 {
        match self.phase {
            ItemPhase::Flying { elapsed, .. } => {
                let t = (elapsed / ARC_DURATION).min(1.0);
                4.0 * ARC_PEAK * t * (1.0 - t)
            }
            _ => 0.0,
        }
    }

    fn alpha(&self) -> f32 {
        match self.phase {
            ItemPhase::PickingUp { elapsed, .. } => 1.0 - (elapsed / PICKUP_DURATION).min(1.0),
            _ => 1.0,
        }
    }

    fn drop_label(&mut self) {
        if let Some(label) = self.label.take() {
            label.destroy();
        }
    }

    fn rest(&mut self, ctx: &mut EntityContext<'_>) {
        let Some(player_position) = self.player.and_then(|id| ctx.entity_position(id)) else {
            self.drop_label();
            return;
        };
        let distance_sq = self.position.distance_squared_to(player_position);

        if distance_sq < PICKUP_RANGE_SQ {
            self.drop_label();
            self.phase = ItemPhase::PickingUp {
                from: self.position,
                elapsed: 0.0,
            };
            play_sound("pickup", self.position);
            info!(item = self.kind.name(), "item_picked_up");
        } else if distance_sq < HIGHLIGHT_RANGE_SQ {
            if self.label.is_none() {
                let id = ctx.id();
                self.label = Some(spawn_hint(
                    ctx.commands(),
                    id,
                    self.position,
                    vec![self.kind.name().to_string()],
                    Vec2::ZERO,
                ));
            }
        } else {
            self.drop_label();
        }
    }
}

impl Entity for Item {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn size(&self) -> Vec2 {
        Vec2::new(ITEM_SIZE, ITEM_SIZE + self.lift())
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        match self.phase {
            ItemPhase::Flying { from, to, elapsed } => {
                let elapsed = elapsed + dt;
                let t = (elapsed / ARC_DURATION).min(1.0);
                self.position = from.lerp(to, t);
                self.phase = if t >= 1.0 {
                    ItemPhase::Resting
                } else {
                    ItemPhase::Flying { from, to, elapsed }
                };
            }
            ItemPhase::Resting => self.rest(ctx),
            ItemPhase::PickingUp { from, elapsed } => {
                let elapsed = elapsed + dt;
                let t = (elapsed / PICKUP_DURATION).min(1.0);
                let target = self
                    .player
                    .and_then(|id| ctx.entity_position(id))
                    .unwrap_or(from);
                self.position = from.lerp(target, t);
                self.phase = ItemPhase::PickingUp { from, elapsed };
                if t >= 1.0 {
                    ctx.despawn_self();
                }
            }
        }
    }

    fn draw(&self, ctx: &mut RenderContext) {
        let alpha = self.alpha();
        ctx.set_alpha(alpha);
        draw_shadow(ctx, self.position, 0.25, 0.08);
        ctx.draw_image(
            &self.sprite,
            self.position.x - ITEM_SIZE * 0.5,
            self.position.y - ITEM_SIZE - self.lift(),
            ITEM_SIZE,
            ITEM_SIZE,
        );
        ctx.reset_alpha();
    }

    fn debug_name(&self) -> &'static str {
        "item"
    }
}
