//! Daily station records.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::{fs::File, io::Read, path::Path};

/// One row of a daily station summary.
///
/// Readings are `None` when the field is empty or not a finite number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyRecord {
    #[serde(rename = "STATION")]
    pub station: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "DATE")]
    pub date: NaiveDate,
    #[serde(rename = "TMIN", deserialize_with = "de_reading")]
    pub tmin: Option<f64>,
    #[serde(rename = "TMAX", deserialize_with = "de_reading")]
    pub tmax: Option<f64>,
    #[serde(rename = "TAVG", deserialize_with = "de_reading")]
    pub tavg: Option<f64>,
    #[serde(rename = "PRCP", default, deserialize_with = "de_reading")]
    pub prcp: Option<f64>,
}

/// Numeric columns of a daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Tmin,
    Tmax,
    Tavg,
    Prcp,
}

impl Column {
    pub const ALL: [Column; 4] = [Column::Tmin, Column::Tmax, Column::Tavg, Column::Prcp];

    pub fn name(self) -> &'static str {
        match self {
            Column::Tmin => "TMIN",
            Column::Tmax => "TMAX",
            Column::Tavg => "TAVG",
            Column::Prcp => "PRCP",
        }
    }
}

impl DailyRecord {
    pub fn reading(&self, column: Column) -> Option<f64> {
        match column {
            Column::Tmin => self.tmin,
            Column::Tmax => self.tmax,
            Column::Tavg => self.tavg,
            Column::Prcp => self.prcp,
        }
    }
}

/// Load every daily record from a CSV file.
pub fn load_daily<P: AsRef<Path>>(file: P) -> Result<Vec<DailyRecord>> {
    let file = file.as_ref();
    let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    read_daily(reader).with_context(|| format!("failed to read {file:?}"))
}

pub fn read_daily<R: Read>(reader: R) -> Result<Vec<DailyRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        // Line 1 is the header.
        let record: DailyRecord =
            result.with_context(|| format!("failed to parse record on line {}", idx + 2))?;
        records.push(record);
    }
    log::debug!("read {} daily records", records.len());

    Ok(records)
}

/// Extract one column as a series aligned with `records`.
pub fn column_series(records: &[DailyRecord], column: Column) -> Vec<Option<f64>> {
    records.iter().map(|rec| rec.reading(column)).collect()
}

/// Deserialize a reading, mapping empty fields, NaN and infinities to `None`.
pub(crate) fn de_reading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Option::<f64>::deserialize(deserializer)?;
    Ok(val.filter(|val| val.is_finite()))
}
