// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! White, pink and brown noise sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Noise spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    /// Flat spectrum
    White,
    /// 1/f spectrum
    Pink,
    /// 1/f^2 spectrum
    Brown,
}

/// Seeded noise generator holding the pink and brown filter memory
#[derive(Debug, Clone)]
pub struct Noise {
    rng: StdRng,
    pink: [f64; 7],
    brown: f64,
}

impl Noise {
    /// Create a generator with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            pink: [0.0; 7],
            brown: 0.0,
        }
    }

    /// Restart the sequence from a new seed
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.pink = [0.0; 7];
        self.brown = 0.0;
    }

    /// Uniform white sample in [-1, 1)
    #[inline]
    pub fn white(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// Next sample of the given colour, roughly in [-1, 1]
    pub fn sample(&mut self, color: NoiseColor) -> f64 {
        let white = self.white();
        match color {
            NoiseColor::White => white,
            NoiseColor::Pink => {
                // Paul Kellet's refined pink filter
                let b = &mut self.pink;
                b[0] = 0.99886 * b[0] + white * 0.0555179;
                b[1] = 0.99332 * b[1] + white * 0.0750759;
                b[2] = 0.96900 * b[2] + white * 0.1538520;
                b[3] = 0.86650 * b[3] + white * 0.3104856;
                b[4] = 0.55000 * b[4] + white * 0.5329522;
                b[5] = -0.7616 * b[5] - white * 0.0168980;
                let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
                b[6] = white * 0.115926;
                (pink * 0.11).clamp(-1.0, 1.0)
            }
            NoiseColor::Brown => {
                self.brown = (self.brown + white * 0.02) / 1.02;
                (self.brown * 3.5).clamp(-1.0, 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_seeded() {
        let mut a = Noise::new(7);
        let mut b = Noise::new(7);
        for color in [NoiseColor::White, NoiseColor::Pink, NoiseColor::Brown] {
            for _ in 0..100 {
                assert_eq!(a.sample(color), b.sample(color));
            }
        }
    }

    #[test]
    fn test_noise_bounded() {
        let mut noise = Noise::new(1);
        for color in [NoiseColor::White, NoiseColor::Pink, NoiseColor::Brown] {
            for _ in 0..10_000 {
                let x = noise.sample(color);
                assert!((-1.0..=1.0).contains(&x));
            }
        }
    }

    #[test]
    fn test_brown_is_smoother_than_white() {
        let mut noise = Noise::new(3);
        let diff = |noise: &mut Noise, color| {
            let mut prev = noise.sample(color);
            let mut total = 0.0;
            for _ in 0..5000 {
                let x = noise.sample(color);
                total += (x - prev).abs();
                prev = x;
            }
            total
        };
        let white = diff(&mut noise, NoiseColor::White);
        let brown = diff(&mut noise, NoiseColor::Brown);
        assert!(brown < white * 0.5);
    }
}
