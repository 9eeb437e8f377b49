use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::app::{ParticleSource, RenderContext, Rgba, SourceRect, SpriteRegion, Transform};
use crate::Vec2;

pub const DEFAULT_CHUNK_SIZE: u32 = 16;

/// Random square sub-regions of `source`, at most `chunk_size` pixels on a side. Empty when
/// the source sprite is not loaded yet.
pub fn extract_texture_chunks<R: Rng + ?Sized>(
    source: &ParticleSource,
    count: usize,
    chunk_size: u32,
    rng: &mut R,
) -> Vec<SpriteRegion> {
    let Some(area) = source.resolved_source() else {
        return Vec::new();
    };
    let size = chunk_size.min(area.width).min(area.height);
    if size == 0 {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let x_span = area.width.saturating_sub(chunk_size).max(1);
            let y_span = area.height.saturating_sub(chunk_size).max(1);
            SpriteRegion {
                sprite: source.sprite.clone(),
                source: Some(SourceRect {
                    x: area.x + rng.gen_range(0..x_span),
                    y: area.y + rng.gen_range(0..y_span),
                    width: size,
                    height: size,
                }),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum ParticleLook {
    /// Each particle picks one region at random.
    Sprites(Vec<SpriteRegion>),
    Color(Rgba),
}

#[derive(Debug, Clone)]
pub struct ParticleEffectOptions {
    pub look: ParticleLook,
    pub count: usize,
    pub position: Vec2,
    /// Edge length in world units.
    pub size: f32,
    /// Seconds until every particle has faded out.
    pub lifetime: f32,
    /// Outward speed in world units per second.
    pub speed: f32,
}

impl ParticleEffectOptions {
    pub fn new(look: ParticleLook, count: usize, position: Vec2) -> Self {
        Self {
            look,
            count,
            position,
            size: 0.25,
            lifetime: 1.0,
            speed: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
enum ParticleSkin {
    Sprite(SpriteRegion),
    Color(Rgba),
}

#[derive(Debug, Clone)]
struct Particle {
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    rotation_speed: f32,
    alpha: f32,
    age: f32,
    skin: ParticleSkin,
}

/// One-shot burst: particles fly outward with random spin and fade linearly with age.
#[derive(Debug, Clone)]
pub struct ParticleEffect {
    particles: Vec<Particle>,
    size: f32,
    lifetime: f32,
    finished: bool,
}

impl ParticleEffect {
    pub fn new<R: Rng + ?Sized>(options: &ParticleEffectOptions, rng: &mut R) -> Self {
        let mut particles = Vec::with_capacity(options.count);
        for _ in 0..options.count {
            let skin = match &options.look {
                ParticleLook::Sprites(sprites) if sprites.is_empty() => break,
                ParticleLook::Sprites(sprites) => {
                    ParticleSkin::Sprite(sprites[rng.gen_range(0..sprites.len())].clone())
                }
                ParticleLook::Color(color) => ParticleSkin::Color(*color),
            };
            let angle = rng.gen_range(0.0..TAU);
            let speed = options.speed * (0.5 + rng.gen::<f32>() * 0.5);
            particles.push(Particle {
                position: options.position,
                velocity: Vec2::from_angle(angle, speed),
                rotation: rng.gen_range(0.0..TAU),
                rotation_speed: (rng.gen::<f32>() - 0.5) * 6.0,
                alpha: 1.0,
                age: 0.0,
                skin,
            });
        }

        Self {
            finished: particles.is_empty(),
            particles,
            size: options.size,
            lifetime: options.lifetime,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn update(&mut self, dt: f32) {
        if self.finished {
            return;
        }
        let mut all_dead = true;
        for particle in &mut self.particles {
            particle.age += dt;
            if particle.age >= self.lifetime {
                particle.alpha = 0.0;
                continue;
            }
            all_dead = false;
            particle.position += particle.velocity * dt;
            particle.rotation += particle.rotation_speed * dt;
            particle.alpha = 1.0 - particle.age / self.lifetime;
        }
        self.finished = all_dead;
    }

    pub fn draw(&self, ctx: &mut RenderContext) {
        if self.finished {
            return;
        }
        let half = self.size * 0.5;
        for particle in &self.particles {
            if particle.alpha <= 0.0 {
                continue;
            }
            ctx.set_alpha(particle.alpha);
            ctx.push_transform(
                Transform::translate(particle.position)
                    .with_rotation(particle.rotation)
                    .with_center(Vec2::splat(half)),
            );
            match &particle.skin {
                ParticleSkin::Sprite(region) => {
                    ctx.draw_region(region, 0.0, 0.0, self.size, self.size)
                }
                ParticleSkin::Color(color) => ctx.fill_rect(0.0, 0.0, self.size, self.size, *color),
            }
            ctx.pop_transform();
        }
        ctx.reset_alpha();
    }
}

/// Owns live effects and drops them once they finish.
#[derive(Debug)]
pub struct ParticleSystem {
    effects: Vec<ParticleEffect>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            effects: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the number of particles emitted.
    pub fn spawn(&mut self, options: &ParticleEffectOptions) -> usize {
        let effect = ParticleEffect::new(options, &mut self.rng);
        let emitted = effect.particle_count();
        if !effect.is_finished() {
            self.effects.push(effect);
        }
        emitted
    }

    /// Bursts chunks cut from `source`; nothing happens while its sprite is loading.
    pub fn burst_from(&mut self, source: &ParticleSource, count: usize, position: Vec2) -> usize {
        let chunks = extract_texture_chunks(source, count, DEFAULT_CHUNK_SIZE, &mut self.rng);
        if chunks.is_empty() {
            return 0;
        }
        self.spawn(&ParticleEffectOptions::new(
            ParticleLook::Sprites(chunks),
            count,
            position,
        ))
    }

    pub fn update(&mut self, dt: f32) {
        for effect in &mut self.effects {
            effect.update(dt);
        }
        self.effects.retain(|effect| !effect.is_finished());
    }

    pub fn draw(&self, ctx: &mut RenderContext) {
        for effect in &self.effects {
            effect.draw(ctx);
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn particle_count(&self) -> usize {
        self.effects.iter().map(ParticleEffect::particle_count).sum()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Camera2D, DrawKind, RecordingSurface, SpriteHandle, SpriteImage};

    fn sprite(width: u32, height: u32) -> SpriteHandle {
        let image = SpriteImage::solid(width, height, [200, 100, 50, 255]).expect("image");
        SpriteHandle::with_image("test/particles", image).expect("handle")
    }

    fn region(sprite: SpriteHandle, x: u32, y: u32, width: u32, height: u32) -> SpriteRegion {
        SpriteRegion {
            sprite,
            source: Some(SourceRect {
                x,
                y,
                width,
                height,
            }),
        }
    }

    fn options(count: usize) -> ParticleEffectOptions {
        ParticleEffectOptions::new(ParticleLook::Color([255, 0, 0, 255]), count, Vec2::new(2.0, 3.0))
    }

    #[test]
    fn chunks_stay_inside_source_region() {
        let mut rng = StdRng::seed_from_u64(1);
        let source = region(sprite(64, 64), 16, 8, 32, 40);
        let chunks = extract_texture_chunks(&source, 50, 16, &mut rng);
        assert_eq!(chunks.len(), 50);
        for chunk in chunks {
            let rect = chunk.source.expect("source");
            assert_eq!((rect.width, rect.height), (16, 16));
            assert!(rect.x >= 16 && rect.x + rect.width <= 16 + 32);
            assert!(rect.y >= 8 && rect.y + rect.height <= 8 + 40);
        }
    }

    #[test]
    fn small_regions_shrink_chunks() {
        let mut rng = StdRng::seed_from_u64(2);
        let source = region(sprite(32, 32), 4, 4, 8, 12);
        let chunks = extract_texture_chunks(&source, 3, 16, &mut rng);
        for chunk in chunks {
            let rect = chunk.source.expect("source");
            assert_eq!((rect.x, rect.y, rect.width, rect.height), (4, 4, 8, 8));
        }
    }

    #[test]
    fn unloaded_source_yields_no_chunks() {
        let mut rng = StdRng::seed_from_u64(3);
        let source = SpriteRegion::whole(SpriteHandle::new("test/pending").expect("handle"));
        assert!(extract_texture_chunks(&source, 5, 16, &mut rng).is_empty());

        let mut system = ParticleSystem::new(3);
        assert_eq!(system.burst_from(&source, 5, Vec2::ZERO), 0);
        assert_eq!(system.effect_count(), 0);
    }

    #[test]
    fn particles_fly_outward_within_speed_range() {
        let mut rng = StdRng::seed_from_u64(4);
        let origin = Vec2::new(2.0, 3.0);
        let mut effect = ParticleEffect::new(&options(40), &mut rng);
        effect.update(0.1);
        for particle in &effect.particles {
            let travelled = particle.position.distance_to(origin);
            assert!((0.1 - 0.0001..=0.2 + 0.0001).contains(&travelled), "travelled={travelled}");
            assert!(particle.rotation_speed.abs() <= 3.0);
            assert!((particle.alpha - 0.9).abs() < 0.0001);
        }
    }

    #[test]
    fn system_drops_finished_effects() {
        let mut system = ParticleSystem::new(5);
        assert_eq!(system.spawn(&options(8)), 8);
        assert_eq!(system.spawn(&options(4)), 4);
        assert_eq!(system.particle_count(), 12);

        system.update(0.5);
        assert_eq!(system.effect_count(), 2);
        system.update(0.6);
        assert_eq!(system.effect_count(), 0);
    }

    #[test]
    fn empty_sprite_list_emits_nothing() {
        let mut system = ParticleSystem::new(6);
        let options = ParticleEffectOptions::new(ParticleLook::Sprites(Vec::new()), 10, Vec2::ZERO);
        assert_eq!(system.spawn(&options), 0);
        assert_eq!(system.effect_count(), 0);
    }

    #[test]
    fn draw_fades_particles_and_restores_alpha() {
        let surface = RecordingSurface::new(640, 480);
        let log = surface.log();
        let mut ctx =
            RenderContext::new(Box::new(surface), Camera2D::default(), 64.0).expect("context");
        let mut system = ParticleSystem::new(7);
        system.spawn(&options(3));
        system.update(0.25);

        ctx.begin_frame(0.016);
        system.draw(&mut ctx);

        let rects: Vec<_> = log
            .commands()
            .into_iter()
            .filter(|command| matches!(command.kind, DrawKind::Rect(_)))
            .collect();
        assert_eq!(rects.len(), 3);
        assert!(rects.iter().all(|command| (command.alpha - 0.75).abs() < 0.0001));
        assert_eq!(ctx.alpha(), 1.0);
        assert_eq!(ctx.transform_depth(), 0);
    }
}
