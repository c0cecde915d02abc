//! Sparse random projection matrices that take a 384-d embedding down to
//! 32 dims per slot (Johnson-Lindenstrauss). One matrix per slot, built
//! once from a fixed seed and reused for every encode.
//!
//! The reference implementation drives this from `numpy`'s seeded
//! Mersenne Twister; reproducing its exact bit stream isn't meaningful in
//! Rust, so this uses a small deterministic SplitMix64 generator instead.
//! Same seed always yields the same matrix within one build of this
//! crate, which is the only property the encoding pipeline actually
//! depends on.

use gateway_core::{Slice, SLOT_DIM};
use once_cell::sync::Lazy;

pub const EMBEDDING_DIM: usize = 384;
const SPARSITY: f32 = 0.66;

pub const ACTION_SEED: u64 = 42;
pub const RESOURCE_SEED: u64 = 43;
pub const DATA_SEED: u64 = 44;
pub const RISK_SEED: u64 = 45;

pub fn seed_for(slice: Slice) -> u64 {
    match slice {
        Slice::Action => ACTION_SEED,
        Slice::Resource => RESOURCE_SEED,
        Slice::Data => DATA_SEED,
        Slice::Risk => RISK_SEED,
    }
}

/// A fixed-shape `(SLOT_DIM, EMBEDDING_DIM)` sparse matrix, stored dense
/// and row-major since the shape is small and constant.
pub struct ProjectionMatrix {
    rows: [[f32; EMBEDDING_DIM]; SLOT_DIM],
}

impl ProjectionMatrix {
    pub fn apply(&self, input: &[f32; EMBEDDING_DIM]) -> [f32; SLOT_DIM] {
        let mut out = [0.0f32; SLOT_DIM];
        for (row, slot) in self.rows.iter().zip(out.iter_mut()) {
            let mut acc = 0.0f32;
            for (w, x) in row.iter().zip(input.iter()) {
                acc += w * x;
            }
            *slot = acc;
        }
        out
    }
}

/// SplitMix64: minimal, dependency-free, deterministic per seed.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// Uniform f64 in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

fn build_matrix(seed: u64) -> ProjectionMatrix {
    let s = 1.0 / (1.0 - SPARSITY);
    let sqrt_s = (s as f32).sqrt();
    let prob_pos = 1.0 / (2.0 * s);
    let prob_zero = 1.0 - 1.0 / s;

    let mut rng = SplitMix64::new(seed);
    let mut rows = [[0.0f32; EMBEDDING_DIM]; SLOT_DIM];
    for row in rows.iter_mut() {
        for cell in row.iter_mut() {
            let draw = rng.next_f64();
            *cell = if draw < prob_pos {
                sqrt_s
            } else if draw < prob_pos + prob_zero {
                0.0
            } else {
                -sqrt_s
            };
        }
    }
    ProjectionMatrix { rows }
}

static ACTION_MATRIX: Lazy<ProjectionMatrix> = Lazy::new(|| build_matrix(ACTION_SEED));
static RESOURCE_MATRIX: Lazy<ProjectionMatrix> = Lazy::new(|| build_matrix(RESOURCE_SEED));
static DATA_MATRIX: Lazy<ProjectionMatrix> = Lazy::new(|| build_matrix(DATA_SEED));
static RISK_MATRIX: Lazy<ProjectionMatrix> = Lazy::new(|| build_matrix(RISK_SEED));

pub fn matrix_for(slice: Slice) -> &'static ProjectionMatrix {
    match slice {
        Slice::Action => &ACTION_MATRIX,
        Slice::Resource => &RESOURCE_MATRIX,
        Slice::Data => &DATA_MATRIX,
        Slice::Risk => &RISK_MATRIX,
    }
}
