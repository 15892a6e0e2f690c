//! Least-squares linear trend over an annual series.
//!
//! The line is fitted against the position index `0..n-1` of the series, not
//! against calendar years: `y[i] = slope * i + intercept`.

use crate::error::StatsError;
use crate::stats::{Series, compute_var};
use serde::Serialize;
use std::fmt;

/// Sign of the fitted slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    NotIncreasing,
}

impl Direction {
    /// A slope of exactly zero counts as not increasing.
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Self::Increasing
        } else {
            Self::NotIncreasing
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing trend"),
            Self::NotIncreasing => write!(f, "no increasing trend"),
        }
    }
}

/// Result of fitting a line to one series.
#[derive(Debug, Clone)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    /// Line evaluated at every position of the series.
    pub fitted: Vec<f64>,
    /// Observed minus fitted, missing where the observation is missing.
    pub residuals: Vec<Option<f64>>,
    /// Sample variance of the residuals.
    pub residual_variance: f64,
    /// Line evaluated one position past the end of the series.
    pub prediction: f64,
}

impl Regression {
    pub fn fit(series: &Series) -> Result<Self, StatsError> {
        let (slope, intercept) = fit(series)?;
        let fitted = fitted_values(slope, intercept, series.len());
        let residuals = residuals(series, &fitted);
        let residual_variance = residual_variance(&residuals)?;
        let prediction = predict_next(slope, intercept, series.len());

        Ok(Self {
            slope,
            intercept,
            fitted,
            residuals,
            residual_variance,
            prediction,
        })
    }

    pub fn direction(&self) -> Direction {
        Direction::from_slope(self.slope)
    }
}

/// Ordinary least squares fit of the non-missing values against their positions.
///
/// Returns `(slope, intercept)`.
pub fn fit(series: &Series) -> Result<(f64, f64), StatsError> {
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, &val)| Some((i as f64, val?)))
        .collect();
    let n_points = points.len();
    if n_points < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            available: n_points,
        });
    }

    let mean_x = points.iter().map(|&(x, _)| x).sum::<f64>() / n_points as f64;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f64>() / n_points as f64;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), &(x, y)| {
        let dev_x = x - mean_x;
        (sxx + dev_x * dev_x, sxy + dev_x * (y - mean_y))
    });

    // Positions are distinct, so two points already make `sxx` positive.
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Ok((slope, intercept))
}

pub fn fitted_values(slope: f64, intercept: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| slope * i as f64 + intercept).collect()
}

pub fn residuals(series: &Series, fitted: &[f64]) -> Vec<Option<f64>> {
    series
        .iter()
        .zip(fitted)
        .map(|(&val, &fit)| val.map(|val| val - fit))
        .collect()
}

pub fn residual_variance(residuals: &Series) -> Result<f64, StatsError> {
    compute_var(residuals)
}

/// Evaluate the line at position `n`, one step past the last observation.
pub fn predict_next(slope: f64, intercept: f64, n: usize) -> f64 {
    slope * n as f64 + intercept
}
