use castaway_engine::{
    Entity, EntityContext, EntityId, ParticleSource, RenderContext, SpriteHandle, SpriteRegion,
    Vec2,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{draw_shadow, play_sound, CONTENT_LAYER};

const AGGRO_RANGE: f32 = 5.0;
const DORMANT_RANGE: f32 = 16.0;
const WANDER_SPEED: f32 = 1.5;
const CHARGE_SPEED: f32 = 3.0;
const WANDER_RADIUS: f32 = 10.0;
const ARRIVAL_DISTANCE: f32 = 0.05;
const PAUSE_MIN: f32 = 0.5;
const PAUSE_MAX: f32 = 2.0;
const IMPACT_RANGE_SQ: f32 = 0.25;
const IMPACT_COOLDOWN: f32 = 1.0;
const MAX_HEALTH: f32 = 50.0;
const CLICK_DAMAGE: f32 = 10.0;
const HURT_FLASH: f32 = 0.15;
const CRAB_SIZE: Vec2 = Vec2::new(0.8, 0.6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrabMode {
    /// Player out of sight; the crab does not think at all.
    Dormant,
    Wander,
    Charge,
}

impl CrabMode {
    fn name(self) -> &'static str {
        match self {
            CrabMode::Dormant => "dormant",
            CrabMode::Wander => "wander",
            CrabMode::Charge => "charge",
        }
    }
}

/// Beach crab. Wanders around its home tile, charges the player when close and retreats
/// for a moment after each bite.
pub(crate) struct Crab {
    home: Vec2,
    position: Vec2,
    mode: CrabMode,
    target: Option<Vec2>,
    pause: f32,
    cooldown: f32,
    health: f32,
    hurt_flash: f32,
    player: Option<EntityId>,
    sprite: SpriteHandle,
    rng: StdRng,
}

impl Crab {
    pub(crate) fn new(position: Vec2, player: Option<EntityId>, sprite: SpriteHandle, seed: u64) -> Self {
        Self {
            home: position,
            position,
            mode: CrabMode::Dormant,
            target: None,
            pause: 0.0,
            cooldown: 0.0,
            health: MAX_HEALTH,
            hurt_flash: 0.0,
            player,
            sprite,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn next_mode(&self, player: Option<Vec2>) -> CrabMode {
        let Some(player) = player else {
            return CrabMode::Dormant;
        };
        let distance = self.position.distance_to(player);
        if distance > DORMANT_RANGE {
            CrabMode::Dormant
        } else if distance < AGGRO_RANGE && self.cooldown <= 0.0 {
            CrabMode::Charge
        } else {
            CrabMode::Wander
        }
    }

    /// Moves toward `target`; returns true once it is reached. Solid tiles stop the step
    /// and drop the current wander target.
    fn step_toward(&mut self, target: Vec2, speed: f32, dt: f32, ctx: &EntityContext<'_>) -> bool {
        let offset = target - self.position;
        let distance = offset.length();
        if distance <= ARRIVAL_DISTANCE {
            return true;
        }
        let step = offset.normalized().scale((speed * dt).min(distance));
        let next = self.position + step;
        if ctx.is_solid_at(next) {
            self.target = None;
            return false;
        }
        self.position = next;
        distance - step.length() <= ARRIVAL_DISTANCE
    }

    fn wander(&mut self, dt: f32, ctx: &EntityContext<'_>) {
        if self.pause > 0.0 {
            self.pause -= dt;
            return;
        }
        let target = match self.target {
            Some(target) => target,
            None => {
                let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                let radius = self.rng.gen_range(0.0..WANDER_RADIUS);
                let target = self.home + Vec2::from_angle(angle, radius);
                self.target = Some(target);
                target
            }
        };
        if self.step_toward(target, WANDER_SPEED, dt, ctx) {
            self.target = None;
            self.pause = self.rng.gen_range(PAUSE_MIN..PAUSE_MAX);
        }
    }

    fn charge(&mut self, player: Vec2, dt: f32, ctx: &EntityContext<'_>) {
        self.step_toward(player, CHARGE_SPEED, dt, ctx);
        if self.position.distance_squared_to(player) < IMPACT_RANGE_SQ {
            self.cooldown = IMPACT_COOLDOWN;
            self.target = None;
            play_sound("crab_bite", self.position);
            info!(x = self.position.x, y = self.position.y, "player_bitten");
        }
    }

    fn draw_health_bar(&self, ctx: &mut RenderContext) {
        if self.health >= MAX_HEALTH {
            return;
        }
        let width = CRAB_SIZE.x;
        let left = self.position.x - width * 0.5;
        let top = self.position.y - CRAB_SIZE.y - 0.2;
        let ratio = (self.health / MAX_HEALTH).clamp(0.0, 1.0);
        ctx.fill_rect(left, top, width, 0.08, [40, 16, 16, 200]);
        ctx.fill_rect(left, top, width * ratio, 0.08, [220, 48, 48, 255]);
    }
}

impl Entity for Crab {
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
        CRAB_SIZE
    }

    fn is_clickable(&self) -> bool {
        true
    }

    fn update(&mut self, dt: f32, ctx: &mut EntityContext<'_>) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.hurt_flash = (self.hurt_flash - dt).max(0.0);

        let player = self.player.and_then(|id| ctx.entity_position(id));
        let mode = self.next_mode(player);
        if mode != self.mode {
            debug!(from = self.mode.name(), to = mode.name(), "crab_mode_changed");
            self.mode = mode;
        }

        match (self.mode, player) {
            (CrabMode::Charge, Some(player)) => self.charge(player, dt, ctx),
            (CrabMode::Wander, _) => self.wander(dt, ctx),
            _ => {}
        }
    }

    fn draw(&self, ctx: &mut RenderContext) {
        draw_shadow(ctx, self.position, 0.35, 0.1);
        if self.hurt_flash > 0.0 {
            ctx.set_alpha(0.5);
        }
        ctx.draw_image(
            &self.sprite,
            self.position.x - CRAB_SIZE.x * 0.5,
            self.position.y - CRAB_SIZE.y,
            CRAB_SIZE.x,
            CRAB_SIZE.y,
        );
        ctx.reset_alpha();
        self.draw_health_bar(ctx);
    }

    fn on_click(&mut self, _world_pos: Vec2, ctx: &mut EntityContext<'_>) {
        self.health -= CLICK_DAMAGE;
        self.hurt_flash = HURT_FLASH;
        play_sound("crab_hit", self.position);
        if self.health <= 0.0 {
            info!(x = self.position.x, y = self.position.y, "crab_defeated");
            ctx.despawn_self();
        }
    }

    fn particle_source(&self) -> Option<ParticleSource> {
        Some(SpriteRegion::whole(self.sprite.clone()))
    }

    fn debug_name(&self) -> &'static str {
        "crab"
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use castaway_engine::World;

    use super::*;

    struct Target {
        position: Rc<Cell<Vec2>>,
    }

    impl Entity for Target {
        fn position(&self) -> Vec2 {
            self.position.get()
        }

        fn draw(&self, _ctx: &mut RenderContext) {}
    }

    fn crab_sprite() -> SpriteHandle {
        SpriteHandle::new("creatures/crab").expect("sprite key")
    }

    fn setup(player_at: Vec2) -> (World, EntityId, Rc<Cell<Vec2>>) {
        let mut world = World::new();
        let position = Rc::new(Cell::new(player_at));
        let player = world.add_entity(Box::new(Target {
            position: Rc::clone(&position),
        }));
        let crab = world.add_entity(Box::new(Crab::new(Vec2::ZERO, Some(player), crab_sprite(), 3)));
        (world, crab, position)
    }

    #[test]
    fn distant_player_leaves_crab_dormant_and_still() {
        let (mut world, crab, _) = setup(Vec2::new(30.0, 0.0));
        for _ in 0..60 {
            world.update(1.0 / 60.0);
        }
        assert_eq!(world.entity_position(crab), Some(Vec2::ZERO));
    }

    #[test]
    fn crab_charges_a_close_player() {
        let (mut world, crab, _) = setup(Vec2::new(4.0, 0.0));
        world.update(0.5);
        let position = world.entity_position(crab).expect("crab");
        assert!((position.x - 1.5).abs() < 1.0e-4, "x={}", position.x);
        assert!(position.y.abs() < 1.0e-4);
    }

    #[test]
    fn bite_sends_crab_back_to_wandering_pace() {
        let (mut world, crab, player) = setup(Vec2::new(0.3, 0.0));
        world.update(0.1);
        assert!(world.entity_position(crab).expect("crab").distance_to(Vec2::new(0.3, 0.0)) < 1.0e-4);

        player.set(Vec2::new(2.0, 0.0));
        let dt = 1.0 / 30.0;
        let mut previous = world.entity_position(crab).expect("crab");
        for _ in 0..10 {
            world.update(dt);
            let current = world.entity_position(crab).expect("crab");
            assert!(current.distance_to(previous) <= WANDER_SPEED * dt + 1.0e-4);
            previous = current;
        }
    }

    #[test]
    fn wandering_crab_stays_within_range_of_home() {
        let (mut world, crab, _) = setup(Vec2::new(12.0, 0.0));
        for _ in 0..600 {
            world.update(1.0 / 30.0);
            let position = world.entity_position(crab).expect("crab");
            assert!(position.length() <= WANDER_RADIUS + 0.01);
        }
    }

    #[test]
    fn five_clicks_defeat_a_crab() {
        let (mut world, crab, _) = setup(Vec2::new(30.0, 0.0));
        for hit in 1..=5 {
            let outcome = world.click(Vec2::new(0.0, -0.3)).expect("outcome");
            assert!(outcome.particle_source.is_some());
            assert_eq!(world.contains_entity(crab), hit < 5);
        }
    }

    #[test]
    fn mode_follows_distance() {
        let mut crab = Crab::new(Vec2::ZERO, None, crab_sprite(), 1);
        assert_eq!(crab.next_mode(None), CrabMode::Dormant);
        assert_eq!(crab.next_mode(Some(Vec2::new(3.0, 0.0))), CrabMode::Charge);
        assert_eq!(crab.next_mode(Some(Vec2::new(8.0, 0.0))), CrabMode::Wander);
        assert_eq!(crab.next_mode(Some(Vec2::new(17.0, 0.0))), CrabMode::Dormant);
        crab.cooldown = 0.5;
        assert_eq!(crab.next_mode(Some(Vec2::new(3.0, 0.0))), CrabMode::Wander);
        assert_eq!(crab.mode, CrabMode::Dormant);
        assert_eq!(crab.health, MAX_HEALTH);
    }
}
