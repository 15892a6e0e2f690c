use crate::analysis::{describe_daily, fit_trends};
use crate::annual::{aggregate, load_annual, save_annual};
use crate::config::Config;
use crate::data::load_daily;
use crate::stats::Estimator;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Runs the analysis steps of one work directory.
///
/// The work directory holds `config.toml`; every file named in the config is
/// resolved relative to it.
pub struct Manager {
    work_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Result<Self> {
        let work_dir = work_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(work_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { work_dir, cfg })
    }

    /// Summarize the daily records: per-column mean and variance plus the
    /// covariance matrix.
    pub fn describe_daily(&self) -> Result<()> {
        let daily_file = self.daily_file();
        let records = load_daily(&daily_file).context("failed to load daily records")?;
        log::info!("loaded {} records from {daily_file:?}", records.len());

        let est = Estimator::new(self.cfg.report.stats_decimals);
        let summary = describe_daily(&records, &est).context("failed to describe daily records")?;

        let summary_file = self.summary_file();
        save_json(&summary, &summary_file).context("failed to save summary")?;
        log::info!("saved {summary_file:?}");

        Ok(())
    }

    /// Aggregate the daily records into annual windows.
    pub fn aggregate_annual(&self) -> Result<()> {
        let daily_file = self.daily_file();
        let records = load_daily(&daily_file).context("failed to load daily records")?;
        log::info!("loaded {} records from {daily_file:?}", records.len());

        let annual_vec =
            aggregate(records, &self.cfg.window).context("failed to aggregate records")?;

        let annual_file = self.annual_file();
        save_annual(&annual_vec, &annual_file).context("failed to save annual records")?;
        log::info!("saved {} windows to {annual_file:?}", annual_vec.len());

        if let Some(annual) = annual_vec.first() {
            log::info!("station: {} ({})", annual.name, annual.station);
            log::info!("date range: {}", annual.data_range);
        }

        Ok(())
    }

    /// Fit trend lines to the annual extremes and predict the next window.
    pub fn analyze_trend(&self) -> Result<()> {
        let annual_file = self.annual_file();
        let annual_vec = load_annual(&annual_file).context("failed to load annual records")?;
        log::info!("loaded {} windows from {annual_file:?}", annual_vec.len());

        if let Some(annual) = annual_vec.first() {
            log::info!("station: {}", annual.name);
        }

        let trends = fit_trends(&annual_vec, self.cfg.report.trend_decimals)
            .context("failed to fit trends")?;

        let trend_file = self.trend_file();
        save_json(&trends, &trend_file).context("failed to save trends")?;
        log::info!("saved {trend_file:?}");

        Ok(())
    }

    /// Remove every generated file.
    pub fn clean_outputs(&self) -> Result<()> {
        for file in [self.annual_file(), self.summary_file(), self.trend_file()] {
            if !file.exists() {
                continue;
            }
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn daily_file(&self) -> PathBuf {
        self.work_dir.join(&self.cfg.data.daily_file)
    }

    fn annual_file(&self) -> PathBuf {
        self.work_dir.join(&self.cfg.data.annual_file)
    }

    fn summary_file(&self) -> PathBuf {
        self.work_dir.join(&self.cfg.report.summary_file)
    }

    fn trend_file(&self) -> PathBuf {
        self.work_dir.join(&self.cfg.report.trend_file)
    }
}

fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, file: P) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
