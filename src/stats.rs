use crate::error::StatsError;

/// Numeric series with `None` marking a missing value.
pub type Series = [Option<f64>];

/// Symmetric 3x3 covariance matrix.
pub type CovMatrix = [[f64; 3]; 3];

/// Descriptive statistics rounded to a fixed number of decimal places.
///
/// All intermediate values are kept at full precision; only the returned
/// result is rounded (see [`round_to`]).
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    decimals: u32,
}

impl Estimator {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Mean of the non-missing values.
    pub fn mean(&self, series: &Series) -> Result<f64, StatsError> {
        compute_mean(series).map(|val| round_to(val, self.decimals))
    }

    /// Sample variance (divisor `n - 1`) of the non-missing values.
    pub fn variance(&self, series: &Series) -> Result<f64, StatsError> {
        compute_var(series).map(|val| round_to(val, self.decimals))
    }

    /// Sample covariance over the index-aligned pairs with no missing element.
    pub fn covariance(&self, x: &Series, y: &Series) -> Result<f64, StatsError> {
        compute_cov(x, y).map(|val| round_to(val, self.decimals))
    }

    /// Covariance matrix of three series.
    ///
    /// The diagonal holds the variances. Each off-diagonal entry is computed
    /// once and mirrored, so the matrix is exactly symmetric.
    pub fn covariance_matrix(
        &self,
        x: &Series,
        y: &Series,
        z: &Series,
    ) -> Result<CovMatrix, StatsError> {
        let var_x = self.variance(x)?;
        let var_y = self.variance(y)?;
        let var_z = self.variance(z)?;
        let cov_xy = self.covariance(x, y)?;
        let cov_xz = self.covariance(x, z)?;
        let cov_yz = self.covariance(y, z)?;
        Ok([
            [var_x, cov_xy, cov_xz],
            [cov_xy, var_y, cov_yz],
            [cov_xz, cov_yz, var_z],
        ])
    }
}

/// Round `val` to `decimals` decimal places, half away from zero.
pub fn round_to(val: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (val * scale).round() / scale
}

pub fn compute_mean(series: &Series) -> Result<f64, StatsError> {
    let n_vals = count_present(series);
    check_n_vals(n_vals, 1)?;
    Ok(series.iter().flatten().sum::<f64>() / n_vals as f64)
}

pub fn compute_var(series: &Series) -> Result<f64, StatsError> {
    let n_vals = count_present(series);
    check_n_vals(n_vals, 2)?;
    let mean = compute_mean(series)?;
    Ok(series
        .iter()
        .flatten()
        .map(|&val| (val - mean).powi(2))
        .sum::<f64>()
        / (n_vals - 1) as f64)
}

pub fn compute_cov(x: &Series, y: &Series) -> Result<f64, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::MisalignedInput {
            x_len: x.len(),
            y_len: y.len(),
        });
    }

    // Drop every pair with a missing element so both columns stay aligned.
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(&val_x, &val_y)| Some((val_x?, val_y?)))
        .collect();
    let n_pairs = pairs.len();
    check_n_vals(n_pairs, 2)?;

    let mean_x = pairs.iter().map(|&(val_x, _)| val_x).sum::<f64>() / n_pairs as f64;
    let mean_y = pairs.iter().map(|&(_, val_y)| val_y).sum::<f64>() / n_pairs as f64;

    Ok(pairs
        .iter()
        .map(|&(val_x, val_y)| (val_x - mean_x) * (val_y - mean_y))
        .sum::<f64>()
        / (n_pairs - 1) as f64)
}

fn count_present(series: &Series) -> usize {
    series.iter().flatten().count()
}

fn check_n_vals(available: usize, required: usize) -> Result<(), StatsError> {
    if available < required {
        return Err(StatsError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}
