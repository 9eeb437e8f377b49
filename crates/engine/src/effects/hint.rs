use std::cell::Cell;
use std::rc::Rc;

use crate::app::{RenderContext, TextAlign, TextBaseline, TextStyle, Transform, WHITE};
use crate::world::{Entity, EntityContext, EntityId, World, WorldCommands};
use crate::Vec2;

pub const HINT_LAYER: i32 = 100;

const POPUP_DURATION: f32 = 0.2;
const DEPOP_DURATION: f32 = 0.15;
const LINE_HEIGHT: f32 = 0.22;
const TEXT_SIZE: f32 = 0.15;
const CHAR_WIDTH: f32 = 0.08;
const LIFT: f32 = 2.0;
const SPIKE_HEIGHT: f32 = 0.13;
const BOB_AMPLITUDE: f32 = 0.04;
const PANEL_COLOR: [u8; 4] = [0, 0, 0, 191];

#[derive(Debug, Default)]
struct HintControl {
    destroy: Cell<bool>,
    destroy_after: Cell<Option<f32>>,
    alive: Cell<bool>,
}

/// Remote control for a floating hint. Dropping the handle leaves the hint in place.
#[derive(Debug, Clone)]
pub struct HintHandle {
    id: EntityId,
    control: Rc<HintControl>,
}

impl HintHandle {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Starts the collapse animation; the hint despawns when it finishes.
    pub fn destroy(&self) {
        self.control.destroy.set(true);
    }

    /// Collapses the hint once it has been shown for `seconds`.
    pub fn destroy_after(&self, seconds: f32) {
        self.control.destroy_after.set(Some(seconds));
    }

    /// False once the hint entity has been dropped by the world.
    pub fn is_alive(&self) -> bool {
        self.control.alive.get()
    }
}

/// Floating label following a host entity. The host is held by id and checked every
/// update; the hint removes itself as soon as the host is gone.
pub struct HintEntity {
    host: EntityId,
    lines: Vec<String>,
    offset: Vec2,
    position: Vec2,
    anim_time: f32,
    total_time: f32,
    destroying: bool,
    control: Rc<HintControl>,
}

impl HintEntity {
    fn new(host: EntityId, host_position: Vec2, lines: Vec<String>, offset: Vec2) -> (Self, Rc<HintControl>) {
        let control = Rc::new(HintControl::default());
        control.alive.set(true);
        let hint = Self {
            host,
            lines,
            offset,
            position: host_position + offset,
            anim_time: 0.0,
            total_time: 0.0,
            destroying: false,
            control: Rc::clone(&control),
        };
        (hint, control)
    }

    fn start_destroy(&mut self) {
        if !self.destroying {
            self.destroying = true;
            self.anim_time = 0.0;
        }
    }

    /// `(scale_y, alpha)` for the current animation phase.
    fn reveal(&self) -> (f32, f32) {
        if self.destroying {
            let t = (self.anim_time / DEPOP_DURATION).min(1.0);
            let ease = t * t * t;
            (1.0 - ease, 1.0 - ease)
        } else if self.anim_time < POPUP_DURATION {
            let t = self.anim_time / POPUP_DURATION;
            let ease = 1.0 - (1.0 - t).powi(3);
            (ease, ease)
        } else {
            (1.0, 1.0)
        }
    }

    fn panel_size(&self) -> (f32, f32) {
        let line_count = self.lines.len().max(1) as f32;
        let longest = self
            .lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let height = 0.3 + (line_count - 1.0) * LINE_HEIGHT;
        let width = (longest as f32 * CHAR_WIDTH).max(1.0);
        (width, height)
    }
}

impl Drop for HintEntity {
    fn drop(&mut self) {
        self.control.alive.set(false);
    }
}

impl Entity for HintEntity {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        HINT_LAYER
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    /// Covers the panel floating `LIFT` above the anchor, including the bob.
    fn size(&self) -> Vec2 {
        let (width, height) = self.panel_size();
        Vec2::new(width, LIFT + height + BOB_AMPLITUDE)
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        self.anim_time += dt;
        self.total_time += dt;

        let Some(host_position) = ctx.entity_position(self.host) else {
            ctx.despawn_self();
            return;
        };
        self.position = host_position + self.offset;

        if self.control.destroy.get() {
            self.start_destroy();
        }
        if self.destroying && self.anim_time >= DEPOP_DURATION {
            ctx.despawn_self();
            return;
        }
        if let Some(after) = self.control.destroy_after.get() {
            if !self.destroying && self.total_time >= after {
                self.start_destroy();
            }
        }
    }

    fn draw(&self, ctx: &mut RenderContext) {
        let (scale_y, alpha) = self.reveal();
        if alpha <= 0.0 {
            return;
        }

        let bob = (self.total_time * 2.5).sin() * BOB_AMPLITUDE;
        let (width, height) = self.panel_size();
        let x = self.position.x;
        let base_y = self.position.y - LIFT;
        let spike_y = base_y + bob;
        let panel_y = base_y - height + bob;

        ctx.set_alpha(alpha);
        ctx.push_transform(
            Transform::default()
                .with_scale(Vec2::new(1.0, scale_y))
                .with_center(Vec2::new(x, base_y + SPIKE_HEIGHT)),
        );
        ctx.fill_rect(x - 0.125, spike_y, 0.25, SPIKE_HEIGHT * 0.5, PANEL_COLOR);
        ctx.fill_rect(x - 0.06, spike_y + SPIKE_HEIGHT * 0.5, 0.12, SPIKE_HEIGHT * 0.5, PANEL_COLOR);
        ctx.fill_rect(x - width * 0.5, panel_y, width, height, PANEL_COLOR);
        let style = TextStyle {
            size: TEXT_SIZE,
            color: WHITE,
            align: TextAlign::Center,
            baseline: TextBaseline::Middle,
        };
        for (index, line) in self.lines.iter().enumerate() {
            let line_y = panel_y + 0.15 + index as f32 * LINE_HEIGHT;
            ctx.draw_text(line, x, line_y, style);
        }
        ctx.pop_transform();
        ctx.reset_alpha();
    }

    fn debug_name(&self) -> &'static str {
        "hint"
    }
}

/// Adds a hint above `host` right away.
pub fn attach_hint(world: &mut World, host: EntityId, lines: Vec<String>, offset: Vec2) -> HintHandle {
    let host_position = world.entity_position(host).unwrap_or_default();
    let (hint, control) = HintEntity::new(host, host_position, lines, offset);
    let id = world.add_entity(Box::new(hint));
    HintHandle { id, control }
}

/// Queues a hint from inside an update or click callback, where the host may be the
/// entity currently running and so must pass its own position.
pub fn spawn_hint(
    commands: &mut WorldCommands<'_>,
    host: EntityId,
    host_position: Vec2,
    lines: Vec<String>,
    offset: Vec2,
) -> HintHandle {
    let (hint, control) = HintEntity::new(host, host_position, lines, offset);
    let id = commands.spawn(Box::new(hint));
    HintHandle { id, control }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Camera2D, DrawKind, RecordingSurface};

    struct Post {
        position: Vec2,
    }

    impl Entity for Post {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn draw(&self, _ctx: &mut RenderContext) {}
    }

    fn world_with_host() -> (World, EntityId) {
        let mut world = World::new();
        let host = world.add_entity(Box::new(Post {
            position: Vec2::new(3.0, 4.0),
        }));
        (world, host)
    }

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn hint_follows_host_with_offset() {
        let (mut world, host) = world_with_host();
        let handle = attach_hint(&mut world, host, lines(&["Pick up"]), Vec2::new(0.0, -0.5));
        let hint = world.entity(handle.id()).expect("hint");
        assert_eq!(hint.layer(), HINT_LAYER);
        assert!(hint.is_dynamic());

        world.update(0.016);
        let position = world.entity_position(handle.id()).expect("hint");
        assert!((position.x - 3.0).abs() < 0.0001);
        assert!((position.y - 3.5).abs() < 0.0001);
        assert_eq!(world.entities().last().map(|(id, _)| id), Some(handle.id()));
    }

    #[test]
    fn hint_dies_with_host() {
        let (mut world, host) = world_with_host();
        let handle = attach_hint(&mut world, host, lines(&["Hello"]), Vec2::ZERO);
        world.remove_entity(host);
        world.update(0.016);
        assert!(!world.contains_entity(handle.id()));
        assert!(!handle.is_alive());
    }

    #[test]
    fn destroy_collapses_then_despawns() {
        let (mut world, host) = world_with_host();
        let handle = attach_hint(&mut world, host, lines(&["Bye"]), Vec2::ZERO);
        world.update(0.5);
        handle.destroy();

        world.update(0.1);
        assert!(world.contains_entity(handle.id()));
        world.update(0.2);
        assert!(!world.contains_entity(handle.id()));
        assert!(!handle.is_alive());
    }

    #[test]
    fn destroy_after_waits_for_total_time() {
        let (mut world, host) = world_with_host();
        let handle = attach_hint(&mut world, host, lines(&["Soon"]), Vec2::ZERO);
        handle.destroy_after(0.5);

        world.update(0.25);
        world.update(0.25);
        assert!(handle.is_alive());
        world.update(0.25);
        assert!(!handle.is_alive());
    }

    #[test]
    fn popup_eases_in_and_sizes_panel_to_text() {
        let (mut world, host) = world_with_host();
        let handle = attach_hint(
            &mut world,
            host,
            lines(&["Use W, A, S, D to move", "Click to gather"]),
            Vec2::ZERO,
        );

        let surface = RecordingSurface::new(1280, 720);
        let log = surface.log();
        let mut ctx =
            RenderContext::new(Box::new(surface), Camera2D::new(Vec2::new(3.0, 3.0), 1.0), 64.0)
                .expect("context");

        ctx.begin_frame(0.0);
        world.draw(&mut ctx);
        assert!(log
            .commands()
            .iter()
            .all(|command| matches!(command.kind, DrawKind::Clear(_))));

        world.update(0.3);
        ctx.begin_frame(0.016);
        world.draw(&mut ctx);
        let commands = log.commands();
        let texts = commands
            .iter()
            .filter(|command| matches!(command.kind, DrawKind::Text(_)))
            .count();
        assert_eq!(texts, 2);
        let panel = commands
            .iter()
            .filter(|command| matches!(command.kind, DrawKind::Rect(_)))
            .map(|command| command.local)
            .fold(None::<crate::app::Rect>, |widest, rect| match widest {
                Some(widest) if widest.width >= rect.width => Some(widest),
                _ => Some(rect),
            })
            .expect("panel");
        assert!((panel.width - 22.0 * CHAR_WIDTH).abs() < 0.0001);
        assert!((panel.height - (0.3 + LINE_HEIGHT)).abs() < 0.0001);
        assert!(handle.is_alive());
    }

    #[test]
    fn panel_above_the_view_edge_is_drawn_for_an_offscreen_anchor() {
        let mut world = World::new();
        let host = world.add_entity(Box::new(Post {
            position: Vec2::new(3.0, 10.5),
        }));
        attach_hint(&mut world, host, lines(&["Use W, A, S, D to move"]), Vec2::ZERO);
        world.update(0.3);

        let surface = RecordingSurface::new(1280, 720);
        let log = surface.log();
        let mut ctx =
            RenderContext::new(Box::new(surface), Camera2D::new(Vec2::new(3.0, 3.0), 1.0), 64.0)
                .expect("context");
        ctx.begin_frame(0.016);
        assert!(ctx.visible_bounds().max_y < 10);
        world.draw(&mut ctx);

        let texts = log
            .commands()
            .iter()
            .filter(|command| matches!(command.kind, DrawKind::Text(_)))
            .count();
        assert_eq!(texts, 1);
    }
}
