use castaway_engine::{Entity, RenderContext, SpriteHandle, Vec2};

use super::{draw_shadow, CONTENT_LAYER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropKind {
    Shipwreck,
    /// Landmark centrepiece; its footprint is reserved by the generator.
    JetWreck,
    Suitcase,
}

impl PropKind {
    fn size(self) -> Vec2 {
        match self {
            PropKind::Shipwreck => Vec2::new(3.0, 2.0),
            PropKind::JetWreck => Vec2::new(8.0, 4.0),
            PropKind::Suitcase => Vec2::new(0.6, 0.5),
        }
    }

    fn name(self) -> &'static str {
        match self {
            PropKind::Shipwreck => "shipwreck",
            PropKind::JetWreck => "jet_wreck",
            PropKind::Suitcase => "suitcase",
        }
    }
}

/// Static wreckage washed up on the island.
pub(crate) struct Prop {
    kind: PropKind,
    position: Vec2,
    sprite: SpriteHandle,
}

impl Prop {
    pub(crate) fn new(kind: PropKind, position: Vec2, sprite: SpriteHandle) -> Self {
        Self {
            kind,
            position,
            sprite,
        }
    }
}

impl Entity for Prop {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn size(&self) -> Vec2 {
        self.kind.size()
    }

    fn draw(&self, ctx: &mut RenderContext) {
        let size = self.kind.size();
        draw_shadow(ctx, self.position, size.x * 0.45, size.y * 0.08);
        ctx.draw_image(
            &self.sprite,
            self.position.x - size.x * 0.5,
            self.position.y - size.y,
            size.x,
            size.y,
        );
    }

    fn debug_name(&self) -> &'static str {
        self.kind.name()
    }
}
