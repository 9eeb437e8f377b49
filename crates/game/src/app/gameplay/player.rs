use std::cell::Cell;
use std::rc::Rc;

use castaway_engine::effects::{spawn_hint, HintHandle};
use castaway_engine::{Entity, EntityContext, RenderContext, SpriteHandle, Terrain, Vec2};
use tracing::debug;

use super::{draw_shadow, play_sound, CONTENT_LAYER};

const ACCELERATION: f32 = 0.1;
/// Velocity kept per 1/60 s.
const DRAG: f32 = 0.8;
const SPEED_SCALE: f32 = 12.0;
const WATER_SPEED_FACTOR: f32 = 0.5;
const LOOKAHEAD: f32 = 20.0;
const MIN_STEP_SQ: f32 = 1.0e-8;
const FOOTSTEP_DISTANCE: f32 = 0.6;
const MOVE_HINT_DELAY: f32 = 2.0;
const MOVE_HINT_DURATION: f32 = 3.0;
const MOVE_HINT_TEXT: &str = "Use W, A, S, D to move";

/// Movement intent written by the scene each frame and read by the player's update.
#[derive(Debug, Default)]
pub(crate) struct PlayerControls {
    axis: Cell<Vec2>,
}

impl PlayerControls {
    pub(crate) fn set_axis(&self, axis: Vec2) {
        self.axis.set(axis);
    }

    fn axis(&self) -> Vec2 {
        self.axis.get()
    }
}

pub(crate) struct Player {
    position: Vec2,
    velocity: Vec2,
    controls: Rc<PlayerControls>,
    sprite: SpriteHandle,
    idle_time: f32,
    has_moved: bool,
    move_hint: Option<HintHandle>,
    footstep_distance: f32,
}

impl Player {
    pub(crate) fn new(position: Vec2, controls: Rc<PlayerControls>, sprite: SpriteHandle) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            controls,
            sprite,
            idle_time: 0.0,
            has_moved: false,
            move_hint: None,
            footstep_distance: 0.0,
        }
    }

    fn accelerate(&mut self, dt: f32) {
        let axis = self.controls.axis();
        let acceleration = if axis.length_squared() > 0.0 {
            axis.normalized().scale(ACCELERATION)
        } else {
            Vec2::ZERO
        };
        let drag = DRAG.powf(dt * 60.0);
        self.velocity = (self.velocity + acceleration.scale(dt * 60.0)).scale(drag);
    }

    fn show_move_hint(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        if self.has_moved || self.move_hint.is_some() {
            return;
        }
        self.idle_time += dt;
        if self.idle_time < MOVE_HINT_DELAY {
            return;
        }
        let id = ctx.id();
        let hint = spawn_hint(
            ctx.commands(),
            id,
            self.position,
            vec![MOVE_HINT_TEXT.to_string()],
            Vec2::new(0.0, 0.5),
        );
        hint.destroy_after(MOVE_HINT_DURATION);
        self.move_hint = Some(hint);
    }
}

impl Entity for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn layer(&self) -> i32 {
        CONTENT_LAYER
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        self.accelerate(dt);

        let terrain = ctx.tile_at(self.position).and_then(|tile| tile.terrain());
        let in_water = terrain == Some(Terrain::Water);
        let speed = if in_water {
            SPEED_SCALE * WATER_SPEED_FACTOR
        } else {
            SPEED_SCALE
        };
        let step = self.velocity.scale(dt * speed);

        if step.length_squared() > MIN_STEP_SQ {
            let ahead = self.position + step.normalized().scale(dt * LOOKAHEAD);
            if ctx.is_solid_at(ahead) {
                self.velocity = Vec2::ZERO;
            } else {
                self.position += step;
                self.footstep_distance += step.length();
                if !self.has_moved {
                    self.has_moved = true;
                    if let Some(hint) = self.move_hint.take() {
                        hint.destroy();
                    }
                    debug!("player_started_moving");
                }
            }
        }

        if self.footstep_distance >= FOOTSTEP_DISTANCE {
            self.footstep_distance = 0.0;
            let cue = if in_water { "splash" } else { "footstep" };
            play_sound(cue, self.position);
        }

        self.show_move_hint(dt, ctx);
    }

    fn draw(&self, ctx: &mut RenderContext) {
        draw_shadow(ctx, self.position, 0.3, 0.1);
        ctx.draw_image(
            &self.sprite,
            self.position.x - 0.5,
            self.position.y - 1.0,
            1.0,
            1.0,
        );
    }

    fn debug_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use castaway_engine::effects::HINT_LAYER;
    use castaway_engine::worldgen::{TerrainPalette, TerrainStyle, TerrainTile};
    use castaway_engine::{EntityId, SpriteHandle, World};

    use super::*;

    fn palette() -> Rc<TerrainPalette> {
        Rc::new(TerrainPalette {
            ground: TerrainStyle {
                solid: true,
                ..TerrainStyle::plain([136, 136, 136, 255])
            },
            ..TerrainPalette::default()
        })
    }

    fn island(width: i32, terrain_at: impl Fn(i32) -> Terrain) -> World {
        let palette = palette();
        let mut world = World::new();
        for y in -2..=2 {
            for x in -2..width {
                let tile = TerrainTile::new(terrain_at(x), Rc::clone(&palette));
                world.set_tile(x, y, Some(Box::new(tile)));
            }
        }
        world
    }

    fn spawn_player(world: &mut World) -> (EntityId, Rc<PlayerControls>) {
        let controls = Rc::new(PlayerControls::default());
        let sprite = SpriteHandle::new("characters/castaway").expect("sprite key");
        let id = world.add_entity(Box::new(Player::new(
            Vec2::new(0.5, 0.5),
            Rc::clone(&controls),
            sprite,
        )));
        (id, controls)
    }

    fn run(world: &mut World, seconds: f32) {
        let steps = (seconds * 60.0).round() as usize;
        for _ in 0..steps {
            world.update(1.0 / 60.0);
        }
    }

    fn hint_count(world: &World) -> usize {
        world
            .entities()
            .filter(|(_, entity)| entity.layer() == HINT_LAYER)
            .count()
    }

    #[test]
    fn held_axis_moves_player_and_releasing_coasts_to_a_stop() {
        let mut world = island(40, |_| Terrain::Sand);
        let (id, controls) = spawn_player(&mut world);

        controls.set_axis(Vec2::new(1.0, 0.0));
        run(&mut world, 1.0);
        let moved = world.entity_position(id).expect("player").x;
        assert!(moved > 3.0, "moved={moved}");

        controls.set_axis(Vec2::ZERO);
        run(&mut world, 1.0);
        let settled = world.entity_position(id).expect("player").x;
        run(&mut world, 0.5);
        let later = world.entity_position(id).expect("player").x;
        assert!((later - settled).abs() < 1.0e-3);
    }

    #[test]
    fn water_halves_travel_speed() {
        let mut sand = island(40, |_| Terrain::Sand);
        let (sand_id, sand_controls) = spawn_player(&mut sand);
        let mut water = island(40, |_| Terrain::Water);
        let (water_id, water_controls) = spawn_player(&mut water);

        sand_controls.set_axis(Vec2::new(1.0, 0.0));
        water_controls.set_axis(Vec2::new(1.0, 0.0));
        run(&mut sand, 1.0);
        run(&mut water, 1.0);

        let on_sand = sand.entity_position(sand_id).expect("player").x - 0.5;
        let in_water = water.entity_position(water_id).expect("player").x - 0.5;
        assert!((in_water / on_sand - 0.5).abs() < 1.0e-3);
    }

    #[test]
    fn solid_ground_blocks_movement() {
        let mut world = island(10, |x| if x >= 2 { Terrain::Ground } else { Terrain::Sand });
        let (id, controls) = spawn_player(&mut world);

        controls.set_axis(Vec2::new(1.0, 0.0));
        run(&mut world, 2.0);

        let x = world.entity_position(id).expect("player").x;
        assert!(x < 2.0, "x={x}");
    }

    #[test]
    fn idle_player_gets_a_move_hint_that_expires() {
        let mut world = island(4, |_| Terrain::Sand);
        spawn_player(&mut world);

        run(&mut world, 1.5);
        assert_eq!(hint_count(&world), 0);
        run(&mut world, 1.0);
        assert_eq!(hint_count(&world), 1);
        run(&mut world, 4.0);
        assert_eq!(hint_count(&world), 0);
    }

    #[test]
    fn moving_before_the_delay_suppresses_the_hint() {
        let mut world = island(40, |_| Terrain::Sand);
        let (_, controls) = spawn_player(&mut world);

        controls.set_axis(Vec2::new(0.0, 1.0));
        run(&mut world, 0.5);
        controls.set_axis(Vec2::ZERO);
        run(&mut world, 3.0);
        assert_eq!(hint_count(&world), 0);
    }
}
