use noise::{NoiseFn, Perlin};

/// Seeded 2D gradient noise. Values lie roughly in `[-1, 1]` and are a pure function of
/// the seed and the sample point.
#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    perlin: Perlin,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let folded = (seed ^ (seed >> 32)) as u32;
        Self {
            seed,
            perlin: Perlin::new(folded),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sample(&self, x: f64, y: f64) -> f32 {
        self.perlin.get([x, y]) as f32
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}
