//! Synthetic workload generation
//!
//! Two presets burn CPU in proportion to a buffer size. The light preset
//! aggregates over a buffer built once and shared read-only between workers;
//! the heavy preset rebuilds a larger random buffer on every call and runs a
//! full fold plus a partial sort over it.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use crate::config::DEFAULT_HEAVY_SCALE_FACTOR;

/// Number of leading elements the heavy preset sorts
const PARTIAL_SORT_LEN: usize = 1000;

/// Workload intensity preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    /// Read-only aggregation over a pre-built buffer
    Light,
    /// Fresh random buffer, full fold and partial sort on every call
    Heavy,
}

/// Result of one workload computation
#[derive(Debug, Clone, Copy)]
pub struct WorkUnit {
    /// Value derived from the buffer, only kept so the work can't be elided
    pub cost: u64,
    /// Time spent computing it
    pub elapsed: Duration,
}

/// Light preset over a shared, pre-built buffer
#[derive(Debug, Clone)]
pub struct LightWorkload {
    buffer: Arc<[u32]>,
}

impl LightWorkload {
    /// Build the shared buffer once: element `i` holds `i % 100`
    pub fn new(buffer_size: usize) -> Self {
        let buffer: Arc<[u32]> = (0..buffer_size).map(|i| (i % 100) as u32).collect();
        Self { buffer }
    }

    /// Number of elements in the shared buffer
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the shared buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Aggregate over the buffer
    pub fn run(&self) -> WorkUnit {
        let start = Instant::now();
        let total: u64 = black_box(&self.buffer[..])
            .iter()
            .map(|&v| v as u64)
            .sum();
        WorkUnit {
            cost: black_box(total % 1000),
            elapsed: start.elapsed(),
        }
    }
}

/// Heavy preset, one private RNG per worker
#[derive(Debug, Clone)]
pub struct HeavyWorkload {
    len: usize,
    rng: SmallRng,
}

impl HeavyWorkload {
    /// Create a heavy workload producing buffers of `len` elements
    pub fn new(len: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self { len, rng }
    }

    /// Element count of each generated buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether generated buffers are empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Build a fresh buffer and run both transforms over it
    pub fn run(&mut self) -> WorkUnit {
        let start = Instant::now();
        let rng = &mut self.rng;
        let buffer: Vec<u32> = (0..self.len).map(|_| rng.gen_range(1..=1000)).collect();

        let squares: u64 = buffer.iter().map(|&x| (x as u64) * (x as u64)).sum();
        let roots: f64 = buffer.iter().map(|&x| (x as f64).sqrt()).sum();
        let fold = squares.wrapping_add(roots as u64);

        let mut head = buffer[..buffer.len().min(PARTIAL_SORT_LEN)].to_vec();
        head.sort_unstable();
        let head_sum: u64 = head.iter().map(|&x| x as u64).sum();

        WorkUnit {
            cost: black_box(head_sum.wrapping_mul(fold)),
            elapsed: start.elapsed(),
        }
    }
}

/// Run one workload call of the given intensity for a nominal `buffer_size`.
///
/// The heavy preset scales the size by [`DEFAULT_HEAVY_SCALE_FACTOR`]. Builds
/// the workload from scratch, so the light preset pays for its buffer here;
/// execution modes keep a [`LightWorkload`] around instead.
pub fn compute(buffer_size: usize, intensity: Intensity) -> WorkUnit {
    match intensity {
        Intensity::Light => LightWorkload::new(buffer_size).run(),
        Intensity::Heavy => {
            HeavyWorkload::new(buffer_size.saturating_mul(DEFAULT_HEAVY_SCALE_FACTOR), None).run()
        }
    }
}
