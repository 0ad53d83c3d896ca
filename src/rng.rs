//! Small deterministic random source
//!
//! Every station and protocol machine owns its own generator, so runs are
//! reproducible from the seeds handed out at construction.

/// xorshift32 PRNG
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Seed the generator; a zero seed is replaced since xorshift sticks at zero
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Next raw value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `0..n` (0 when `n` is 0)
    pub fn below(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }

    /// Uniform in `lo..=hi`
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            lo
        } else {
            lo + self.below(hi - lo + 1)
        }
    }

    /// Uniform in `-spread..=spread`
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn spread(&mut self, spread: i32) -> i32 {
        let spread = spread.abs();
        self.below(spread as u32 * 2 + 1) as i32 - spread
    }

    /// Uniform in `[0, 1)`
    #[allow(clippy::cast_precision_loss)]
    pub fn unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// True with the given percent probability
    pub fn chance(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }

    /// Derive an independent seed for a child component
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u32() ^ 0xA5A5_5A5A)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn zero_seed_moves() {
        let mut r = Rng::new(0);
        assert_ne!(r.next_u32(), 0);
    }

    #[test]
    fn bounds() {
        let mut r = Rng::new(7);
        for _ in 0..1000 {
            assert!(r.below(10) < 10);
            let v = r.between(3, 8);
            assert!((3..=8).contains(&v));
            let s = r.spread(250);
            assert!((-250..=250).contains(&s));
            let u = r.unit();
            assert!((0.0..1.0).contains(&u));
        }
        assert_eq!(r.below(0), 0);
    }
}
