//! Reservoir sampling and sample statistics for histograms and timers.

use rand::Rng;
use std::sync::Mutex;

/// Reservoir size used by [`UniformSample::default`].
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Immutable view of a sample: the total number of recorded values and the
/// values currently held in the reservoir, sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSnapshot {
    count: i64,
    values: Vec<i64>,
}

impl SampleSnapshot {
    /// `count` is the number of values ever recorded, which may exceed
    /// `values.len()` once the reservoir is full.
    pub fn new(count: i64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self { count, values }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or(0)
    }

    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn sum(&self) -> i64 {
        self.values.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().map(|v| *v as f64).sum::<f64>() / self.values.len() as f64
    }

    /// Population variance of the values in the reservoir.
    pub fn variance(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.values
            .iter()
            .map(|v| {
                let d = *v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.values.len() as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Value at quantile `q` (in `[0, 1]`), linearly interpolated between the
    /// two closest ranks.  The rank of `q` is `q * (n + 1)`, so quantiles
    /// close to the ends clamp to the smallest and largest value.
    pub fn percentile(&self, q: f64) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        let pos = q * (n as f64 + 1.0);
        if pos < 1.0 {
            self.values[0] as f64
        } else if pos >= n as f64 {
            self.values[n - 1] as f64
        } else {
            let lower = self.values[pos as usize - 1] as f64;
            let upper = self.values[pos as usize] as f64;
            lower + (pos - pos.floor()) * (upper - lower)
        }
    }

    pub fn percentiles(&self, qs: &[f64]) -> Vec<f64> {
        qs.iter().map(|q| self.percentile(*q)).collect()
    }
}

struct Reservoir {
    count: i64,
    values: Vec<i64>,
}

/// A uniform random sample of a stream of values (Vitter's algorithm R).
///
/// Every value recorded so far has the same probability of being in the
/// reservoir.
pub struct UniformSample {
    size: usize,
    reservoir: Mutex<Reservoir>,
}

impl Default for UniformSample {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVOIR_SIZE)
    }
}

impl UniformSample {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            reservoir: Mutex::new(Reservoir {
                count: 0,
                values: Vec::with_capacity(size),
            }),
        }
    }

    pub fn update(&self, value: i64) {
        let mut reservoir = self.reservoir.lock().unwrap();
        reservoir.count += 1;
        if reservoir.values.len() < self.size {
            reservoir.values.push(value);
        } else {
            let r = rand::thread_rng().gen_range(0..reservoir.count);
            if (r as usize) < self.size {
                reservoir.values[r as usize] = value;
            }
        }
    }

    pub fn clear(&self) {
        let mut reservoir = self.reservoir.lock().unwrap();
        reservoir.count = 0;
        reservoir.values.clear();
    }

    pub fn snapshot(&self) -> SampleSnapshot {
        let reservoir = self.reservoir.lock().unwrap();
        SampleSnapshot::new(reservoir.count, reservoir.values.clone())
    }
}
