mod hint;
mod particles;

pub use hint::{attach_hint, spawn_hint, HintEntity, HintHandle, HINT_LAYER};
pub use particles::{
    extract_texture_chunks, ParticleEffect, ParticleEffectOptions, ParticleLook, ParticleSystem,
    DEFAULT_CHUNK_SIZE,
};
