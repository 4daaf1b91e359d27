//! Distribution toolbox for the stick model.
//!
//! Every distribution carries the name of the variable it governs so a
//! construction failure can be traced back to the model node, samples with a
//! caller-supplied RNG, and evaluates its own log-density analytically.
//! Values outside a support score `-inf` rather than erroring: that is how a
//! random-walk proposal that leaves a prior's support gets rejected.

use rand::distr::Uniform as UniformSampler;
use rand::Rng;
use rand_distr::{Distribution, Normal as NormalSampler};

use crate::error::{ModelError, Result};

const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Gaussian with mean and standard deviation.
#[derive(Clone, Copy, Debug)]
pub struct Normal {
    name: &'static str,
    mean: f64,
    std: f64,
    sampler: NormalSampler<f64>,
}

impl Normal {
    pub fn new(name: &'static str, mean: f64, std: f64) -> Result<Self> {
        if !std.is_finite() || std <= 0.0 {
            return Err(ModelError::InvalidScale { what: name, value: std });
        }
        let sampler = NormalSampler::new(mean, std)
            .map_err(|_| ModelError::InvalidScale { what: name, value: std })?;
        Ok(Self {
            name,
            mean,
            std,
            sampler,
        })
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.sampler.sample(rng)
    }

    pub fn log_density(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        -0.5 * z * z - self.std.ln() - 0.5 * LN_2PI
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Continuous uniform over the half-open interval `[low, high)`.
#[derive(Clone, Copy, Debug)]
pub struct Uniform {
    name: &'static str,
    low: f64,
    high: f64,
    sampler: UniformSampler<f64>,
}

impl Uniform {
    pub fn new(name: &'static str, low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || high <= low {
            return Err(ModelError::EmptySupport {
                what: name,
                low,
                high,
            });
        }
        let sampler = UniformSampler::new(low, high).map_err(|_| ModelError::EmptySupport {
            what: name,
            low,
            high,
        })?;
        Ok(Self {
            name,
            low,
            high,
            sampler,
        })
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.sampler.sample(rng)
    }

    pub fn log_density(&self, x: f64) -> f64 {
        if x >= self.low && x < self.high {
            -(self.high - self.low).ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Uniform over the integers `{low, ..., high - 1}`.
#[derive(Clone, Copy, Debug)]
pub struct DiscreteUniform {
    name: &'static str,
    low: i64,
    high: i64,
    sampler: UniformSampler<i64>,
}

impl DiscreteUniform {
    pub fn new(name: &'static str, low: i64, high: i64) -> Result<Self> {
        if high <= low {
            return Err(ModelError::EmptySupport {
                what: name,
                low: low as f64,
                high: high as f64,
            });
        }
        let sampler = UniformSampler::new(low, high).map_err(|_| ModelError::EmptySupport {
            what: name,
            low: low as f64,
            high: high as f64,
        })?;
        Ok(Self {
            name,
            low,
            high,
            sampler,
        })
    }

    pub fn sample(&self, rng: &mut impl Rng) -> i64 {
        self.sampler.sample(rng)
    }

    pub fn log_pmf(&self, k: i64) -> f64 {
        if k >= self.low && k < self.high {
            -((self.high - self.low) as f64).ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Geometric waiting time anchored at `start`, truncated and renormalized to
/// the support `{start + 1, ..., end - 1}`.
///
/// The untruncated pmf over trials `j = k - start` is `(1-p)^(j-1) p`;
/// truncation divides by the mass of the first `end - 1 - start` trials, so
/// a draw can never reach `end`. Sampling inverts the truncated CDF.
#[derive(Clone, Copy, Debug)]
pub struct BoundedGeometric {
    name: &'static str,
    start: usize,
    end: usize,
    p: f64,
}

impl BoundedGeometric {
    pub fn new(name: &'static str, start: usize, end: usize, p: f64) -> Result<Self> {
        if !p.is_finite() || p <= 0.0 || p >= 1.0 {
            return Err(ModelError::InvalidProbability {
                what: name,
                value: p,
            });
        }
        if end < start + 2 {
            return Err(ModelError::EmptySupport {
                what: name,
                low: (start + 1) as f64,
                high: end as f64,
            });
        }
        Ok(Self {
            name,
            start,
            end,
            p,
        })
    }

    fn trials(&self) -> usize {
        self.end - 1 - self.start
    }

    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        let m = self.trials();
        let q = 1.0 - self.p;
        let total = 1.0 - q.powf(m as f64);
        let u: f64 = rng.random();
        let j = ((1.0 - u * total).ln() / q.ln()).ceil() as i64;
        self.start + j.clamp(1, m as i64) as usize
    }

    pub fn log_pmf(&self, k: usize) -> f64 {
        if k <= self.start || k >= self.end {
            return f64::NEG_INFINITY;
        }
        let q = 1.0 - self.p;
        let total = 1.0 - q.powf(self.trials() as f64);
        let j = (k - self.start) as f64;
        (j - 1.0) * q.ln() + self.p.ln() - total.ln()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
