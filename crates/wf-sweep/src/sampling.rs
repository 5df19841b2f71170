//! Sampling rules and sample grids.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How one field's values are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sampling {
    /// `num_samples` evenly spaced values from `lower` to `upper`, both
    /// included. A single sample is `lower`; descending ranges are allowed.
    Linear {
        lower: f64,
        upper: f64,
        num_samples: usize,
    },
    /// Explicit values, used in order.
    List { values: Vec<f64> },
    /// Independent draws from `[lower, upper)`.
    Uniform {
        lower: f64,
        upper: f64,
        num_samples: usize,
    },
    /// Independent draws from a normal distribution.
    Normal {
        mean: f64,
        std_dev: f64,
        num_samples: usize,
    },
    /// One draw in each of `num_samples` equal-width strata of
    /// `[lower, upper)`, in shuffled order. Paired with other Latin
    /// hypercube fields this gives a Latin hypercube design.
    LatinHypercube {
        lower: f64,
        upper: f64,
        num_samples: usize,
    },
}

impl Sampling {
    pub fn linear(lower: f64, upper: f64, num_samples: usize) -> Self {
        Self::Linear {
            lower,
            upper,
            num_samples,
        }
    }

    pub fn list(values: Vec<f64>) -> Self {
        Self::List { values }
    }

    pub fn uniform(lower: f64, upper: f64, num_samples: usize) -> Self {
        Self::Uniform {
            lower,
            upper,
            num_samples,
        }
    }

    pub fn normal(mean: f64, std_dev: f64, num_samples: usize) -> Self {
        Self::Normal {
            mean,
            std_dev,
            num_samples,
        }
    }

    pub fn latin_hypercube(lower: f64, upper: f64, num_samples: usize) -> Self {
        Self::LatinHypercube {
            lower,
            upper,
            num_samples,
        }
    }

    /// Whether values come from the sweep's random number generator.
    pub fn is_random(&self) -> bool {
        matches!(
            self,
            Self::Uniform { .. } | Self::Normal { .. } | Self::LatinHypercube { .. }
        )
    }

    /// Reason the rule cannot produce samples, if any.
    pub fn problem(&self) -> Option<String> {
        match self {
            Self::Linear {
                lower,
                upper,
                num_samples,
            } => {
                if *num_samples == 0 {
                    Some("linear sampling needs at least one sample".to_string())
                } else if !lower.is_finite() || !upper.is_finite() {
                    Some(format!("bounds must be finite, got [{lower}, {upper}]"))
                } else {
                    None
                }
            }
            Self::List { values } => {
                if values.is_empty() {
                    Some("value list is empty".to_string())
                } else if values.iter().any(|v| !v.is_finite()) {
                    Some("value list contains a non-finite value".to_string())
                } else {
                    None
                }
            }
            Self::Uniform {
                lower,
                upper,
                num_samples,
            }
            | Self::LatinHypercube {
                lower,
                upper,
                num_samples,
            } => {
                if *num_samples == 0 {
                    Some("random sampling needs at least one sample".to_string())
                } else if !lower.is_finite() || !upper.is_finite() {
                    Some(format!("bounds must be finite, got [{lower}, {upper}]"))
                } else if lower > upper {
                    Some(format!("lower bound {lower} is above upper bound {upper}"))
                } else {
                    None
                }
            }
            Self::Normal {
                mean,
                std_dev,
                num_samples,
            } => {
                if *num_samples == 0 {
                    Some("random sampling needs at least one sample".to_string())
                } else if !mean.is_finite() {
                    Some(format!("mean must be finite, got {mean}"))
                } else if !std_dev.is_finite() || *std_dev < 0.0 {
                    Some(format!(
                        "standard deviation must be finite and non-negative, got {std_dev}"
                    ))
                } else {
                    None
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List { values } => values.len(),
            Self::Linear { num_samples, .. }
            | Self::Uniform { num_samples, .. }
            | Self::Normal { num_samples, .. }
            | Self::LatinHypercube { num_samples, .. } => *num_samples,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The field's values, in sample order. Deterministic rules ignore `rng`.
    pub fn values(&self, rng: &mut StdRng) -> Result<Vec<f64>, String> {
        Ok(match self {
            Self::Linear {
                lower,
                upper,
                num_samples,
            } => generate_linear(*lower, *upper, *num_samples),
            Self::List { values } => values.clone(),
            Self::Uniform {
                lower,
                upper,
                num_samples,
            } => (0..*num_samples)
                .map(|_| lower + (upper - lower) * rng.random::<f64>())
                .collect(),
            Self::Normal {
                mean,
                std_dev,
                num_samples,
            } => {
                let dist = Normal::new(*mean, *std_dev).map_err(|e| e.to_string())?;
                (0..*num_samples).map(|_| dist.sample(rng)).collect()
            }
            Self::LatinHypercube {
                lower,
                upper,
                num_samples,
            } => generate_latin_hypercube(*lower, *upper, *num_samples, rng),
        })
    }
}

fn generate_linear(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![lower];
    }

    let delta = (upper - lower) / (n - 1) as f64;
    let mut points: Vec<f64> = (0..n).map(|i| lower + i as f64 * delta).collect();
    // exact endpoint
    points[n - 1] = upper;
    points
}

fn generate_latin_hypercube(lower: f64, upper: f64, n: usize, rng: &mut StdRng) -> Vec<f64> {
    let width = (upper - lower) / n as f64;
    let mut points: Vec<f64> = (0..n)
        .map(|i| lower + (i as f64 + rng.random::<f64>()) * width)
        .collect();
    points.shuffle(rng);
    points
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear {
                lower,
                upper,
                num_samples,
            } => write!(f, "linear [{lower}, {upper}] x {num_samples}"),
            Self::List { values } => write!(f, "list of {}", values.len()),
            Self::Uniform {
                lower,
                upper,
                num_samples,
            } => write!(f, "uniform [{lower}, {upper}) x {num_samples}"),
            Self::Normal {
                mean,
                std_dev,
                num_samples,
            } => write!(f, "normal({mean}, {std_dev}) x {num_samples}"),
            Self::LatinHypercube {
                lower,
                upper,
                num_samples,
            } => write!(f, "latin hypercube [{lower}, {upper}) x {num_samples}"),
        }
    }
}

/// How several fields combine into samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// Every combination; the first field varies slowest.
    #[default]
    Cartesian,
    /// Fields co-vary; all must have the same number of values.
    Paired,
}

/// The ordered set of sample points of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    mode: SampleMode,
    axes: Vec<Vec<f64>>,
}

impl Grid {
    /// Axes must be non-empty, and of equal length in paired mode.
    pub(crate) fn new(mode: SampleMode, axes: Vec<Vec<f64>>) -> Self {
        Self { mode, axes }
    }

    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        match self.mode {
            SampleMode::Cartesian => self.axes.iter().map(Vec::len).product(),
            SampleMode::Paired => self.axes.first().map_or(0, Vec::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extent of each grid dimension; paired grids are one-dimensional.
    pub fn shape(&self) -> Vec<usize> {
        match self.mode {
            SampleMode::Cartesian => self.axes.iter().map(Vec::len).collect(),
            SampleMode::Paired => vec![self.len()],
        }
    }

    /// Coordinates along dimension `dim`, used for interpolation.
    pub fn coordinates(&self, dim: usize) -> Vec<f64> {
        match self.mode {
            SampleMode::Cartesian => self.axes[dim].clone(),
            SampleMode::Paired => (0..self.len()).map(|i| i as f64).collect(),
        }
    }

    /// Grid position of sample `index`.
    pub fn position(&self, index: usize) -> Vec<usize> {
        let shape = self.shape();
        let mut pos = vec![0; shape.len()];
        let mut rest = index;
        for d in (0..shape.len()).rev() {
            pos[d] = rest % shape[d];
            rest /= shape[d];
        }
        pos
    }

    /// Sample index at grid position `pos`.
    pub fn index(&self, pos: &[usize]) -> usize {
        self.shape()
            .iter()
            .zip(pos)
            .fold(0, |acc, (&extent, &p)| acc * extent + p)
    }

    /// Field values of sample `index`, in field order.
    pub fn sample(&self, index: usize) -> Vec<f64> {
        match self.mode {
            SampleMode::Cartesian => self
                .position(index)
                .iter()
                .zip(&self.axes)
                .map(|(&p, axis)| axis[p])
                .collect(),
            SampleMode::Paired => self.axes.iter().map(|axis| axis[index]).collect(),
        }
    }

    pub fn samples(&self) -> Vec<Vec<f64>> {
        (0..self.len()).map(|i| self.sample(i)).collect()
    }
}
