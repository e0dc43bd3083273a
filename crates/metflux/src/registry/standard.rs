//! Thread-safe implementations of the built-in metric kinds.

use super::sample::UniformSample;
use super::{
    Counter, Gauge, GaugeF64, Histogram, Meter, RateSnapshot, SampleSnapshot, Timer,
    TimerSnapshot,
};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct StandardCounter {
    count: AtomicI64,
}

impl StandardCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Counter for StandardCounter {
    fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct StandardGauge {
    value: AtomicI64,
}

impl StandardGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Gauge for StandardGauge {
    fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Stores the bit pattern of an `f64`.
#[derive(Debug)]
pub struct StandardGaugeF64 {
    bits: AtomicU64,
}

impl Default for StandardGaugeF64 {
    fn default() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }
}

impl StandardGaugeF64 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl GaugeF64 for StandardGaugeF64 {
    fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[derive(Default)]
pub struct StandardHistogram {
    sample: UniformSample,
}

impl StandardHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(sample: UniformSample) -> Self {
        Self { sample }
    }

    pub fn update(&self, value: i64) {
        self.sample.update(value)
    }

    pub fn clear(&self) {
        self.sample.clear()
    }
}

impl Histogram for StandardHistogram {
    fn snapshot(&self) -> SampleSnapshot {
        self.sample.snapshot()
    }
}

/// Moving averages are advanced in steps of this length.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average of a per-second rate.
#[derive(Debug, Clone, Copy)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// Average over `minutes` minutes, assuming a tick every
    /// [`TICK_INTERVAL`].
    fn new(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    fn tick(&mut self, uncounted: i64) {
        let instant_rate = uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Equivalent to `n` ticks without any events.
    fn decay(&mut self, n: u32) {
        if n > 0 && self.initialized {
            self.rate *= (1.0 - self.alpha).powi(n.min(i32::MAX as u32) as i32);
        }
    }
}

struct MeterState {
    count: i64,
    uncounted: i64,
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    last_tick: Instant,
}

impl MeterState {
    /// Advance the moving averages over every full tick that has elapsed
    /// since the last one.
    fn catch_up(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        if ticks == 0 {
            return;
        }
        for ewma in [&mut self.m1, &mut self.m5, &mut self.m15] {
            ewma.tick(self.uncounted);
            ewma.decay(ticks - 1);
        }
        self.uncounted = 0;
        self.last_tick += TICK_INTERVAL * ticks;
    }
}

/// Counts events and tracks their 1, 5 and 15 minute moving rates.
///
/// The moving averages are advanced lazily, whenever the meter is marked or
/// read, so a meter needs no background thread.
pub struct StandardMeter {
    start: Instant,
    state: Mutex<MeterState>,
}

impl Default for StandardMeter {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl StandardMeter {
    pub fn new() -> Self {
        Self::default()
    }

    fn starting_at(start: Instant) -> Self {
        Self {
            start,
            state: Mutex::new(MeterState {
                count: 0,
                uncounted: 0,
                m1: Ewma::new(1.0),
                m5: Ewma::new(5.0),
                m15: Ewma::new(15.0),
                last_tick: start,
            }),
        }
    }

    pub fn mark(&self, n: i64) {
        self.mark_at(n, Instant::now())
    }

    fn mark_at(&self, n: i64, now: Instant) {
        let mut state = self.state.lock().unwrap();
        state.catch_up(now);
        state.count += n;
        state.uncounted += n;
    }

    fn snapshot_at(&self, now: Instant) -> RateSnapshot {
        let mut state = self.state.lock().unwrap();
        state.catch_up(now);
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        RateSnapshot {
            count: state.count,
            rate1: state.m1.rate,
            rate5: state.m5.rate,
            rate15: state.m15.rate,
            rate_mean: if elapsed > 0.0 {
                state.count as f64 / elapsed
            } else {
                0.0
            },
        }
    }
}

impl Meter for StandardMeter {
    fn snapshot(&self) -> RateSnapshot {
        self.snapshot_at(Instant::now())
    }
}

/// Records durations in a histogram (as nanoseconds) and meters how often
/// they are recorded.
#[derive(Default)]
pub struct StandardTimer {
    histogram: StandardHistogram,
    meter: StandardMeter,
}

impl StandardTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, duration: Duration) {
        self.histogram
            .update(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX));
        self.meter.mark(1);
    }

    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed())
    }

    /// Run `f` and record how long it took.
    pub fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.update_since(start);
        result
    }
}

impl Timer for StandardTimer {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            samples: self.histogram.snapshot(),
            rates: self.meter.snapshot(),
        }
    }
}
