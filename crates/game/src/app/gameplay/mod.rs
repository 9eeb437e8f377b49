mod crab;
mod flora;
mod items;
mod player;
mod props;
mod spawner;
mod sprites;

use std::path::PathBuf;
use std::rc::Rc;

use castaway_engine::app::AssetError;
use castaway_engine::effects::{ParticleEffectOptions, ParticleLook, ParticleSystem};
use castaway_engine::{
    Camera2D, CameraBounds, EntityId, Generator, GeneratorConfig, InputSnapshot, MetricsHandle,
    RenderContext, Rgba, Scene, SceneCommand, SpriteLoader, TextStyle, Vec2, World,
};
use tracing::{debug, info};

use player::{Player, PlayerControls};
use spawner::IslandSpawner;
use sprites::{island_palette, IslandSprites};

pub(crate) const CONTENT_LAYER: i32 = 1;

const SHADOW_COLOR: Rgba = [0, 0, 0, 76];
const SPAWN_POINT: Vec2 = Vec2::new(8.0, 8.0);
const CAMERA_FOLLOW_SPEED: f32 = 2.0;
const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 4.0;
const FPS_SMOOTHING: f32 = 0.05;
const SOURCE_PARTICLES: usize = 12;
const CLICK_PARTICLES: usize = 20;
const CLICK_PARTICLE_COLOR: Rgba = [255, 255, 255, 255];
const HUD_TEXT_SIZE: f32 = 15.0;
const HUD_MARGIN: f32 = 8.0;
const HUD_PADDING: f32 = 6.0;
const HUD_BACKGROUND: Rgba = [0, 0, 0, 140];
const SPAWNER_SEED_SALT: u64 = 0x5eed_c0de;

pub(crate) fn draw_shadow(ctx: &mut RenderContext, position: Vec2, rx: f32, ry: f32) {
    ctx.fill_ellipse(position.x, position.y, rx, ry, SHADOW_COLOR);
}

/// Audio is fire-and-forget; the cue is only recorded.
pub(crate) fn play_sound(cue: &'static str, position: Vec2) {
    debug!(cue, x = position.x, y = position.y, "sound_triggered");
}

/// The island: an endless generated world around a single player.
pub(crate) struct IslandScene {
    world: World,
    generator: Generator<IslandSpawner>,
    particles: ParticleSystem,
    loader: SpriteLoader,
    sprites: Rc<IslandSprites>,
    controls: Rc<PlayerControls>,
    player: Option<EntityId>,
    metrics: MetricsHandle,
    smoothed_fps: f32,
}

impl IslandScene {
    pub(crate) fn new(
        seed: u64,
        config: GeneratorConfig,
        sprite_root: PathBuf,
        metrics: MetricsHandle,
    ) -> Result<Self, AssetError> {
        let mut loader = SpriteLoader::new(sprite_root);
        let sprites = Rc::new(IslandSprites::request(&mut loader)?);
        let palette = Rc::new(island_palette(&mut loader)?);
        let spawner = IslandSpawner::new(Rc::clone(&sprites), seed ^ SPAWNER_SEED_SALT);

        Ok(Self {
            world: World::new(),
            generator: Generator::new(seed, config, palette, spawner),
            particles: ParticleSystem::new(seed.wrapping_add(1)),
            loader,
            sprites,
            controls: Rc::new(PlayerControls::default()),
            player: None,
            metrics,
            smoothed_fps: 0.0,
        })
    }

    fn spawn_player(&mut self) -> EntityId {
        let player = Player::new(
            SPAWN_POINT,
            Rc::clone(&self.controls),
            self.sprites.player.clone(),
        );
        let id = self.world.add_entity(Box::new(player));
        self.generator.spawner_mut().set_player(id);
        self.player = Some(id);
        id
    }

    fn player_position(&self) -> Vec2 {
        self.player
            .and_then(|id| self.world.entity_position(id))
            .unwrap_or(SPAWN_POINT)
    }

    fn handle_click(&mut self, cursor: Vec2, ctx: &RenderContext) {
        let world_pos = ctx.screen_to_world(cursor.x, cursor.y);
        let outcome = self.world.click(world_pos);
        let emitted = outcome
            .as_ref()
            .and_then(|outcome| outcome.particle_source.as_ref())
            .map_or(0, |source| {
                self.particles
                    .burst_from(source, SOURCE_PARTICLES, world_pos)
            });
        if emitted == 0 {
            let mut options = ParticleEffectOptions::new(
                ParticleLook::Color(CLICK_PARTICLE_COLOR),
                CLICK_PARTICLES,
                world_pos,
            );
            options.size = 0.2;
            options.lifetime = 0.8;
            options.speed = 3.0;
            self.particles.spawn(&options);
        }
        debug!(
            x = world_pos.x,
            y = world_pos.y,
            target = ?outcome.map(|outcome| outcome.target),
            "click_handled"
        );
    }

    fn track_fps(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let fps = 1.0 / dt;
        self.smoothed_fps = if self.smoothed_fps <= 0.0 {
            fps
        } else {
            self.smoothed_fps + (fps - self.smoothed_fps) * FPS_SMOOTHING
        };
    }

    fn hud_line(&self, camera: &Camera2D) -> String {
        let position = camera.position();
        format!(
            "Camera: ({:.1}, {:.1})  Zoom: {:.2}  FPS: {:.0}",
            position.x,
            position.y,
            camera.zoom(),
            self.smoothed_fps
        )
    }

    fn draw_hud(&self, ctx: &mut RenderContext) {
        let line = self.hud_line(ctx.camera());
        let width = line.chars().count() as f32 * HUD_TEXT_SIZE * 0.8 + HUD_PADDING * 2.0;
        ctx.fill_screen_rect(
            HUD_MARGIN,
            HUD_MARGIN,
            width,
            HUD_TEXT_SIZE + HUD_PADDING * 2.0,
            HUD_BACKGROUND,
        );
        ctx.draw_screen_text(
            &line,
            HUD_MARGIN + HUD_PADDING,
            HUD_MARGIN + HUD_PADDING,
            TextStyle {
                size: HUD_TEXT_SIZE,
                ..TextStyle::default()
            },
        );
    }
}

impl Scene for IslandScene {
    fn load(&mut self, ctx: &mut RenderContext) {
        let camera = ctx.camera_mut();
        camera.set_bounds(Some(CameraBounds::zoom_only(MIN_ZOOM, MAX_ZOOM)));
        camera.set_position(SPAWN_POINT);

        self.spawn_player();
        let radius = self.generator.config().surroundings_radius;
        let tiles = self
            .generator
            .generate_surroundings(&mut self.world, SPAWN_POINT, radius);
        info!(
            seed = self.generator.seed(),
            tiles,
            spawned = self.generator.spawner().spawned_count(),
            "island_loaded"
        );
    }

    fn update(&mut self, dt: f32, input: &InputSnapshot, ctx: &mut RenderContext) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }

        let zoom_steps = input.zoom_delta_steps();
        if zoom_steps != 0 {
            ctx.camera_mut().apply_zoom_steps(zoom_steps);
        }
        self.controls.set_axis(input.movement_axis());
        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                self.handle_click(cursor, ctx);
            }
        }

        self.world.update(dt);
        self.particles.update(dt);

        let focus = self.player_position();
        self.generator.track_focus(&mut self.world, focus);
        ctx.camera_mut().follow(focus, CAMERA_FOLLOW_SPEED, dt);

        self.track_fps(dt);
        self.loader.poll_failures();
        SceneCommand::None
    }

    fn render(&mut self, ctx: &mut RenderContext) {
        self.world.draw(ctx);
        self.particles.draw(ctx);
        self.draw_hud(ctx);
    }

    fn unload(&mut self) {
        self.particles.clear();
        info!(
            entities = self.world.entity_count(),
            tiles = self.world.tile_count(),
            "island_unloaded"
        );
    }

    fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    fn debug_title(&self) -> Option<String> {
        let snapshot = self.metrics.snapshot();
        if snapshot.fps <= 0.0 {
            return None;
        }
        Some(format!(
            "Castaway | {:.0} fps | {:.1} ms | {} entities",
            snapshot.fps, snapshot.frame_time_ms, snapshot.entity_count
        ))
    }
}
