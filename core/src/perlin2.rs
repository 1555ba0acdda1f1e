use crate::NoiseGenerator;

// 2D Perlin Noise generator with support for multiple octaves
#[derive(Clone)]
pub struct Perlin2D {
    frequency: f64,   // Controls the "zoom level" of the noise pattern
    persistence: f64, // Controls amplitude scaling per octave
    octaves: usize,   // number of octaves to sum
    perm: [u8; 512],  // permutation table (256 duplicated)
}

impl Perlin2D {
    pub fn new(seed: u64, frequency: f64, persistence: f64, octaves: usize) -> Self {
        // build a pseudorandom permutation table of size 256, duplicated into 512
        let mut p: Vec<u8> = (0..256).map(|i| i as u8).collect();
        // xorshift RNG for shuffling
        let mut x = seed ^ 0xDEADBEEFCAFEBABE_u64;
        let mut rng = || {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x & 0xFF) as u8
        };
        // Fisher–Yates shuffle p[0..256]
        for i in (1..256).rev() {
            let j = (rng() as usize) % (i + 1);
            p.swap(i, j);
        }
        // Duplicated so corner lookups never need a modulo
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        Self {
            frequency,
            persistence,
            octaves,
            perm,
        }
    }

    // Fade function as defined by Ken Perlin: 6t^5 − 15t^4 + 10t^3
    // First and second derivatives are zero at t=0 and t=1
    #[inline]
    fn fade(t: f64) -> f64 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + t * (b - a)
    }

    // Gradient function for 2D: based on the hashed value, choose a gradient direction
    #[inline]
    fn grad(hash: u8, x: f64, y: f64) -> f64 {
        let h = (hash & 0xF) as usize;
        let u = if h < 8 { x } else { y };
        let v = if h < 8 { y } else { x };
        let sign_u = if (h & 1) == 0 { u } else { -u };
        let sign_v = if (h & 2) == 0 { v } else { -v };
        sign_u + sign_v
    }

    // Raw single‐octave Perlin noise at (x, y)
    // Returns in range ≈ [−√2, √2]
    fn noise(&self, x: f64, y: f64) -> f64 {
        // Unit square that contains the point
        let xi = (x.floor() as i32 & 255) as usize;
        let yi = (y.floor() as i32 & 255) as usize;
        // Position within the square
        let xf = x - x.floor();
        let yf = y - y.floor();
        let u = Self::fade(xf);
        let v = Self::fade(yf);

        // Hash the four corners
        let a = self.perm[xi] as usize;
        let b = self.perm[xi + 1] as usize;
        let aa = self.perm[a + yi];
        let ab = self.perm[a + yi + 1];
        let ba = self.perm[b + yi];
        let bb = self.perm[b + yi + 1];

        let x1 = Self::lerp(Self::grad(aa, xf, yf), Self::grad(ba, xf - 1.0, yf), u);
        let x2 = Self::lerp(
            Self::grad(ab, xf, yf - 1.0),
            Self::grad(bb, xf - 1.0, yf - 1.0),
            u,
        );
        Self::lerp(x1, x2, v)
    }
}

impl NoiseGenerator for Perlin2D {
    // Multi-octave Perlin noise at (x, y) (Fractal Brownian Motion)
    // The result is roughly in [−1.0, +1.0] after normalization
    fn get2(&self, x: f64, y: f64) -> f64 {
        let mut amplitude = 1.0;
        let mut freq = self.frequency;
        let mut total = 0.0;
        let mut max_amp = 0.0;

        for _ in 0..self.octaves {
            total += self.noise(x * freq, y * freq) * amplitude;
            max_amp += amplitude;
            amplitude *= self.persistence;
            freq *= 2.0;
        }

        if max_amp == 0.0 {
            return 0.0;
        }
        total / max_amp
    }
}
