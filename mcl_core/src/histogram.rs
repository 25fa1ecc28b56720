// mcl_core/src/histogram.rs

//! One-dimensional discrete (histogram) localization on a cyclic strip of
//! cells. Shares the sense-weigh-normalize idea with the particle filter at a
//! scale small enough to check by hand.

use crate::error::{FilterError, Result};

/// Measurement and motion uncertainty of a histogram filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramParams {
    /// Weight applied to cells whose label matches the measurement.
    pub p_hit: f64,
    /// Weight applied to cells whose label does not match.
    pub p_miss: f64,
    pub p_exact: f64,
    pub p_overshoot: f64,
    pub p_undershoot: f64,
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self {
            p_hit: 0.6,
            p_miss: 0.2,
            p_exact: 0.8,
            p_overshoot: 0.1,
            p_undershoot: 0.1,
        }
    }
}

/// A cyclic world of labelled cells.
#[derive(Debug, Clone)]
pub struct HistogramFilter<T> {
    world: Vec<T>,
    params: HistogramParams,
}

impl<T: PartialEq> HistogramFilter<T> {
    pub fn new(world: Vec<T>, params: HistogramParams) -> Result<Self> {
        if world.is_empty() {
            return Err(FilterError::InvalidConfig(
                "a histogram world needs at least one cell".into(),
            ));
        }
        Ok(Self { world, params })
    }

    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// The uniform prior over all cells.
    pub fn uniform(&self) -> Vec<f64> {
        vec![1.0 / self.len() as f64; self.len()]
    }

    /// Posterior after observing `measurement`, normalized to sum to 1.
    pub fn sense(&self, prior: &[f64], measurement: &T) -> Result<Vec<f64>> {
        self.check_len(prior)?;
        let q: Vec<f64> = prior
            .iter()
            .zip(&self.world)
            .map(|(p, cell)| {
                p * if cell == measurement {
                    self.params.p_hit
                } else {
                    self.params.p_miss
                }
            })
            .collect();
        let total: f64 = q.iter().sum();
        if !(total > 0.0) {
            return Err(FilterError::InvalidConfig(
                "measurement leaves no probability mass".into(),
            ));
        }
        Ok(q.into_iter().map(|v| v / total).collect())
    }

    /// Shifts the distribution by `shift` cells (cyclically), spreading mass
    /// one cell short of and one cell past the target.
    pub fn step(&self, p: &[f64], shift: isize) -> Result<Vec<f64>> {
        self.check_len(p)?;
        let n = p.len() as isize;
        let at = |offset: isize| p[offset.rem_euclid(n) as usize];
        Ok((0..n)
            .map(|i| {
                at(i - (shift + 1)) * self.params.p_undershoot
                    + at(i - shift) * self.params.p_exact
                    + at(i - (shift - 1)) * self.params.p_overshoot
            })
            .collect())
    }

    fn check_len(&self, p: &[f64]) -> Result<()> {
        if p.len() != self.world.len() {
            return Err(FilterError::LengthMismatch {
                expected: self.world.len(),
                actual: p.len(),
            });
        }
        Ok(())
    }
}
