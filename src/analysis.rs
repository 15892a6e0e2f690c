use crate::annual::AnnualRecord;
use crate::data::{Column, DailyRecord, column_series};
use crate::error::StatsError;
use crate::stats::{CovMatrix, Estimator, round_to};
use crate::trend::{Direction, Regression};
use anyhow::{Context, Result};
use chrono::Datelike;
use serde::Serialize;

/// Columns whose covariance matrix is reported.
const COV_COLUMNS: [Column; 3] = [Column::Tmax, Column::Tavg, Column::Prcp];

#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub column: &'static str,
    pub n_vals: usize,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CovarianceSummary {
    pub columns: [&'static str; 3],
    pub matrix: CovMatrix,
}

#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub n_records: usize,
    pub decimals: u32,
    pub columns: Vec<ColumnSummary>,
    /// `None` when one of the covariance columns has too few values.
    pub covariance: Option<CovarianceSummary>,
}

/// Describe every numeric column of the daily records.
///
/// A column without enough values is logged and reported as `null`, and so is
/// the covariance matrix when one of its columns is too sparse (PRCP is
/// optional in the input). Any other failure is returned as an error.
pub fn describe_daily(records: &[DailyRecord], est: &Estimator) -> Result<DailySummary> {
    let mut columns = Vec::with_capacity(Column::ALL.len());
    for column in Column::ALL {
        let series = column_series(records, column);
        let summary = ColumnSummary {
            column: column.name(),
            n_vals: series.iter().flatten().count(),
            mean: skip_insufficient(column, "mean", est.mean(&series))?,
            variance: skip_insufficient(column, "variance", est.variance(&series))?,
        };
        log::info!(
            "{}: mean = {:?}, variance = {:?}",
            summary.column,
            summary.mean,
            summary.variance
        );
        columns.push(summary);
    }

    let [x, y, z] = COV_COLUMNS.map(|column| column_series(records, column));
    let covariance = match est.covariance_matrix(&x, &y, &z) {
        Ok(matrix) => {
            log::info!("covariance matrix: {matrix:?}");
            Some(CovarianceSummary {
                columns: COV_COLUMNS.map(Column::name),
                matrix,
            })
        }
        Err(err @ StatsError::InsufficientData { .. }) => {
            log::warn!("skipping covariance matrix: {err}");
            None
        }
        Err(err) => return Err(err).context("failed to compute covariance matrix"),
    };

    Ok(DailySummary {
        n_records: records.len(),
        decimals: est.decimals(),
        columns,
        covariance,
    })
}

fn skip_insufficient(
    column: Column,
    stat: &str,
    result: Result<f64, StatsError>,
) -> Result<Option<f64>> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(err @ StatsError::InsufficientData { .. }) => {
            log::warn!("skipping {stat} of {}: {err}", column.name());
            Ok(None)
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to compute {stat} of {}", column.name()))
        }
    }
}

/// Annual series that get a trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnualColumn {
    Max,
    Min,
    Avg,
}

impl AnnualColumn {
    pub const ALL: [AnnualColumn; 3] = [AnnualColumn::Max, AnnualColumn::Min, AnnualColumn::Avg];

    pub fn name(self) -> &'static str {
        match self {
            AnnualColumn::Max => "Annual_Max",
            AnnualColumn::Min => "Annual_Min",
            AnnualColumn::Avg => "Annual_Avg",
        }
    }

    fn value(self, annual: &AnnualRecord) -> Option<f64> {
        match self {
            AnnualColumn::Max => annual.annual_max,
            AnnualColumn::Min => annual.annual_min,
            AnnualColumn::Avg => annual.annual_avg(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendSummary {
    pub column: &'static str,
    pub slope: f64,
    pub intercept: f64,
    pub direction: Direction,
    pub residual_variance: f64,
    /// Two years after the start of the last window.
    pub predicted_year: i32,
    pub prediction: f64,
    pub years: Vec<i32>,
    pub observed: Vec<Option<f64>>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<Option<f64>>,
}

/// Fit a trend line to one annual column, rounding every reported number.
pub fn fit_trend(
    annual_vec: &[AnnualRecord],
    column: AnnualColumn,
    decimals: u32,
) -> Result<TrendSummary> {
    let years: Vec<i32> = annual_vec.iter().map(|a| a.year_start.year()).collect();
    let observed: Vec<Option<f64>> = annual_vec.iter().map(|a| column.value(a)).collect();

    let reg = Regression::fit(&observed)
        .with_context(|| format!("failed to fit trend of {}", column.name()))?;
    let predicted_year = years.last().context("no annual records")? + 2;

    let round = |val: f64| round_to(val, decimals);
    let summary = TrendSummary {
        column: column.name(),
        slope: round(reg.slope),
        intercept: round(reg.intercept),
        direction: reg.direction(),
        residual_variance: round(reg.residual_variance),
        predicted_year,
        prediction: round(reg.prediction),
        years,
        observed,
        fitted: reg.fitted.iter().map(|&val| round(val)).collect(),
        residuals: reg.residuals.iter().map(|val| val.map(round)).collect(),
    };

    log::info!(
        "regression for {}: slope = {}, intercept = {}, {}",
        summary.column,
        summary.slope,
        summary.intercept,
        summary.direction
    );
    log::info!(
        "error variance for {}: {}",
        summary.column,
        summary.residual_variance
    );
    log::info!(
        "predicted {} for {}: {}",
        summary.column,
        summary.predicted_year,
        summary.prediction
    );

    Ok(summary)
}

pub fn fit_trends(annual_vec: &[AnnualRecord], decimals: u32) -> Result<Vec<TrendSummary>> {
    AnnualColumn::ALL
        .into_iter()
        .map(|column| fit_trend(annual_vec, column, decimals))
        .collect()
}
