use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Input and output tables, relative to the work directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Daily station summaries (input of `describe` and `aggregate`).
    pub daily_file: String,
    /// Annual summaries (output of `aggregate`, input of `trend`).
    pub annual_file: String,
}

/// Start of each annual window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    pub anchor_month: u32,
    pub anchor_day: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            anchor_month: 10,
            anchor_day: 27,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Decimal places of the descriptive statistics.
    #[serde(default = "default_stats_decimals")]
    pub stats_decimals: u32,
    /// Decimal places of the trend report.
    #[serde(default = "default_trend_decimals")]
    pub trend_decimals: u32,

    pub summary_file: String,
    pub trend_file: String,
}

fn default_stats_decimals() -> u32 {
    3
}

fn default_trend_decimals() -> u32 {
    4
}

/// Analysis configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_file_name(&self.data.daily_file).context("invalid daily file")?;
        check_file_name(&self.data.annual_file).context("invalid annual file")?;
        check_file_name(&self.report.summary_file).context("invalid summary file")?;
        check_file_name(&self.report.trend_file).context("invalid trend file")?;

        check_num(self.window.anchor_month, 1..=12).context("invalid anchor month")?;
        check_num(self.window.anchor_day, 1..=31).context("invalid anchor day")?;
        // 2001 is not a leap year, so Feb 29 is rejected as an anchor.
        if NaiveDate::from_ymd_opt(2001, self.window.anchor_month, self.window.anchor_day)
            .is_none()
        {
            bail!(
                "anchor {:02}-{:02} is not a date in every year",
                self.window.anchor_month,
                self.window.anchor_day
            );
        }

        check_num(self.report.stats_decimals, 0..=10).context("invalid stats decimals")?;
        check_num(self.report.trend_decimals, 0..=10).context("invalid trend decimals")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("file name must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[data]
daily_file = "daily.csv"
annual_file = "annual.csv"

[report]
summary_file = "summary.json"
trend_file = "trend.json"
"#;

    #[test]
    fn defaults_are_applied() {
        let cfg = Config::from_toml(BASE).unwrap();
        assert_eq!(cfg.window, WindowConfig::default());
        assert_eq!(cfg.window.anchor_month, 10);
        assert_eq!(cfg.window.anchor_day, 27);
        assert_eq!(cfg.report.stats_decimals, 3);
        assert_eq!(cfg.report.trend_decimals, 4);
    }

    #[test]
    fn explicit_window_and_decimals() {
        let contents = format!(
            "{BASE}stats_decimals = 2\n\n[window]\nanchor_month = 1\nanchor_day = 1\n"
        );
        let cfg = Config::from_toml(&contents).unwrap();
        assert_eq!(cfg.report.stats_decimals, 2);
        assert_eq!(cfg.window.anchor_month, 1);
        assert_eq!(cfg.window.anchor_day, 1);
    }

    #[test]
    fn rejects_invalid_anchor() {
        for (month, day) in [(0, 1), (13, 1), (4, 31), (2, 29), (6, 0)] {
            let contents =
                format!("{BASE}\n[window]\nanchor_month = {month}\nanchor_day = {day}\n");
            assert!(
                Config::from_toml(&contents).is_err(),
                "accepted anchor {month}-{day}"
            );
        }
    }

    #[test]
    fn rejects_excessive_decimals() {
        let contents = format!("{BASE}trend_decimals = 11\n");
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn rejects_missing_section() {
        assert!(Config::from_toml("[data]\ndaily_file = \"d.csv\"\n").is_err());
    }

    #[test]
    fn rejects_empty_file_name() {
        let contents = BASE.replace("\"daily.csv\"", "\"\"");
        assert!(Config::from_toml(&contents).is_err());
    }
}
