/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform sample between two bounds. The bounds may come in either order.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// `floor(range(lo, hi))`, so `int_range(2, 4)` yields 2 or 3.
    fn int_range(&mut self, lo: u32, hi: u32) -> u32 {
        self.range(lo as f64, hi as f64).floor() as u32
    }

    fn pick<T: Copy>(&mut self, choices: &[T]) -> T
    where
        Self: Sized,
    {
        let idx = (self.next_f64() * choices.len() as f64) as usize;
        choices[idx.min(choices.len() - 1)]
    }
}

/// The browser's `Math.random`.
#[derive(Default, Clone, Copy)]
pub struct MathRandom;

impl RandomSource for MathRandom {
    fn next_f64(&mut self) -> f64 {
        js_sys::Math::random()
    }
}

const MODULUS: u64 = 1 << 31;

/// Deterministic linear congruential generator.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        SeededRandom { state: seed as u64 }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.state = (self.state.wrapping_mul(1103515245).wrapping_add(12345)) % MODULUS;
        self.state as f64 / MODULUS as f64
    }
}
