#![allow(dead_code)]

use geo::Point;
use geocluster::PointFeature;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic xorshift generator so test point sets are reproducible.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_f64(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

/// `n` points scattered over the world plus a few dense city-like clumps.
pub fn sample_points(n: usize, seed: u64) -> Vec<PointFeature<usize>> {
    let mut rng = Rng::new(seed);
    let hubs = [(-74.0, 40.7), (2.35, 48.85), (139.7, 35.7), (-0.12, 51.5)];

    (0..n)
        .map(|i| {
            let position = if i % 3 == 0 {
                Point::new(rng.range(-180.0, 180.0), rng.range(-85.0, 85.0))
            } else {
                let (lng, lat) = hubs[i % hubs.len()];
                Point::new(lng + rng.range(-0.5, 0.5), lat + rng.range(-0.5, 0.5))
            };
            PointFeature::new(position, i)
        })
        .collect()
}
