//! Aggregation of daily records into anchored annual windows.

use crate::config::WindowConfig;
use crate::data::{DailyRecord, de_reading};
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

const DATE_FMT: &str = "%Y-%m-%d";

/// Extremes of one annual window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRecord {
    #[serde(rename = "STATION")]
    pub station: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "Year_Start")]
    pub year_start: NaiveDate,
    #[serde(rename = "Year_End")]
    pub year_end: NaiveDate,
    #[serde(rename = "Annual_Max", deserialize_with = "de_reading")]
    pub annual_max: Option<f64>,
    #[serde(rename = "Annual_Min", deserialize_with = "de_reading")]
    pub annual_min: Option<f64>,
    #[serde(rename = "Data_Range")]
    pub data_range: String,
}

impl AnnualRecord {
    /// Midpoint of the annual extremes.
    pub fn annual_avg(&self) -> Option<f64> {
        Some((self.annual_max? + self.annual_min?) / 2.0)
    }
}

/// Build one record per anchored window between the first and last daily record.
///
/// Records are sorted by date first. For every calendar year `y` from the
/// first year up to (excluding) the last year, the window runs from the anchor
/// in `y` to the day before the anchor in `y + 1`. Windows without any daily
/// record are skipped.
pub fn aggregate(
    mut records: Vec<DailyRecord>,
    window: &WindowConfig,
) -> Result<Vec<AnnualRecord>> {
    records.sort_by_key(|rec| rec.date);

    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => bail!("no daily records to aggregate"),
    };
    let data_range = format!(
        "{} to {}",
        first.date.format(DATE_FMT),
        last.date.format(DATE_FMT)
    );

    let mut annual_vec = Vec::new();
    for year in first.date.year()..last.date.year() {
        let window_start = anchor(year, window)?;
        let window_end = anchor(year + 1, window)?
            .checked_sub_days(Days::new(1))
            .context("window end out of range")?;

        let lo = records.partition_point(|rec| rec.date < window_start);
        let hi = records.partition_point(|rec| rec.date <= window_end);
        let subset = &records[lo..hi];
        if subset.is_empty() {
            log::debug!("skipping empty window starting {window_start}");
            continue;
        }

        annual_vec.push(AnnualRecord {
            station: first.station.clone(),
            name: first.name.clone(),
            year_start: window_start,
            year_end: window_end,
            annual_max: subset.iter().filter_map(|rec| rec.tmax).reduce(f64::max),
            annual_min: subset.iter().filter_map(|rec| rec.tmin).reduce(f64::min),
            data_range: data_range.clone(),
        });
    }

    Ok(annual_vec)
}

fn anchor(year: i32, window: &WindowConfig) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, window.anchor_month, window.anchor_day).with_context(|| {
        format!(
            "invalid anchor {year}-{:02}-{:02}",
            window.anchor_month, window.anchor_day
        )
    })
}

pub fn save_annual<P: AsRef<Path>>(annual_vec: &[AnnualRecord], file: P) -> Result<()> {
    let file = file.as_ref();
    let writer = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    write_annual(annual_vec, writer).with_context(|| format!("failed to write {file:?}"))
}

pub fn write_annual<W: Write>(annual_vec: &[AnnualRecord], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for annual in annual_vec {
        writer
            .serialize(annual)
            .context("failed to serialize annual record")?;
    }
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

pub fn load_annual<P: AsRef<Path>>(file: P) -> Result<Vec<AnnualRecord>> {
    let file = file.as_ref();
    let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    read_annual(reader).with_context(|| format!("failed to read {file:?}"))
}

pub fn read_annual<R: Read>(reader: R) -> Result<Vec<AnnualRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut annual_vec = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let annual: AnnualRecord =
            result.with_context(|| format!("failed to parse record on line {}", idx + 2))?;
        annual_vec.push(annual);
    }
    Ok(annual_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn daily(date: NaiveDate, tmin: Option<f64>, tmax: Option<f64>) -> DailyRecord {
        DailyRecord {
            station: "USW00023234".to_string(),
            name: "SAN FRANCISCO INTL AP".to_string(),
            date,
            tmin,
            tmax,
            tavg: None,
            prcp: None,
        }
    }

    #[test]
    fn windows_follow_anchor() {
        let records = vec![
            daily(date(2019, 3, 1), Some(40.0), Some(60.0)),
            daily(date(2019, 10, 26), Some(45.0), Some(90.0)),
            daily(date(2019, 10, 27), Some(47.0), Some(70.0)),
            daily(date(2020, 10, 26), Some(38.0), Some(80.0)),
            daily(date(2020, 10, 27), Some(30.0), Some(99.0)),
            daily(date(2021, 6, 1), Some(50.0), Some(75.0)),
        ];

        let annual_vec = aggregate(records, &WindowConfig::default()).unwrap();

        // Windows start in 2019 and 2020; 2018 and 2021 are outside the year range.
        assert_eq!(annual_vec.len(), 2);

        let first = &annual_vec[0];
        assert_eq!(first.year_start, date(2019, 10, 27));
        assert_eq!(first.year_end, date(2020, 10, 26));
        assert_eq!(first.annual_max, Some(80.0));
        assert_eq!(first.annual_min, Some(38.0));
        assert_eq!(first.data_range, "2019-03-01 to 2021-06-01");

        let second = &annual_vec[1];
        assert_eq!(second.year_start, date(2020, 10, 27));
        assert_eq!(second.year_end, date(2021, 10, 26));
        assert_eq!(second.annual_max, Some(99.0));
        assert_eq!(second.annual_min, Some(30.0));
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let records = vec![
            daily(date(2021, 1, 5), Some(41.0), Some(58.0)),
            daily(date(2020, 1, 1), Some(39.0), Some(55.0)),
            daily(date(2020, 11, 3), Some(44.0), Some(61.0)),
        ];
        let annual_vec = aggregate(records, &WindowConfig::default()).unwrap();
        assert_eq!(annual_vec.len(), 1);
        assert_eq!(annual_vec[0].year_start, date(2020, 10, 27));
        assert_eq!(annual_vec[0].data_range, "2020-01-01 to 2021-01-05");
        assert_eq!(annual_vec[0].annual_max, Some(61.0));
    }

    #[test]
    fn empty_windows_are_skipped() {
        let window = WindowConfig {
            anchor_month: 1,
            anchor_day: 1,
        };
        let records = vec![
            daily(date(2015, 6, 1), Some(50.0), Some(70.0)),
            daily(date(2018, 6, 1), Some(52.0), Some(74.0)),
            daily(date(2019, 6, 1), Some(49.0), Some(71.0)),
        ];
        let annual_vec = aggregate(records, &window).unwrap();
        let starts: Vec<_> = annual_vec.iter().map(|a| a.year_start).collect();
        assert_eq!(starts, vec![date(2015, 1, 1), date(2018, 1, 1)]);
        assert_eq!(annual_vec[0].year_end, date(2015, 12, 31));
    }

    #[test]
    fn extremes_ignore_missing_readings() {
        let window = WindowConfig {
            anchor_month: 1,
            anchor_day: 1,
        };
        let records = vec![
            daily(date(2020, 2, 1), None, Some(70.0)),
            daily(date(2020, 2, 2), Some(51.0), None),
            daily(date(2020, 2, 3), None, None),
            daily(date(2021, 2, 1), Some(49.0), Some(71.0)),
        ];
        let annual_vec = aggregate(records, &window).unwrap();
        assert_eq!(annual_vec.len(), 1);
        assert_eq!(annual_vec[0].annual_max, Some(70.0));
        assert_eq!(annual_vec[0].annual_min, Some(51.0));
    }

    #[test]
    fn window_without_readings_has_no_extremes() {
        let window = WindowConfig {
            anchor_month: 1,
            anchor_day: 1,
        };
        let records = vec![
            daily(date(2020, 2, 1), None, None),
            daily(date(2021, 2, 1), Some(49.0), Some(71.0)),
        ];
        let annual_vec = aggregate(records, &window).unwrap();
        assert_eq!(annual_vec[0].annual_max, None);
        assert_eq!(annual_vec[0].annual_avg(), None);
    }

    #[test]
    fn empty_input_fails() {
        assert!(aggregate(Vec::new(), &WindowConfig::default()).is_err());
    }

    #[test]
    fn csv_has_expected_columns() {
        let annual = AnnualRecord {
            station: "USW00023174".to_string(),
            name: "LOS ANGELES".to_string(),
            year_start: date(2018, 10, 27),
            year_end: date(2019, 10, 26),
            annual_max: Some(96.0),
            annual_min: None,
            data_range: "2018-01-01 to 2019-12-31".to_string(),
        };

        let mut buf = Vec::new();
        write_annual(std::slice::from_ref(&annual), &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("STATION,NAME,Year_Start,Year_End,Annual_Max,Annual_Min,Data_Range")
        );
        assert_eq!(
            lines.next(),
            Some("USW00023174,LOS ANGELES,2018-10-27,2019-10-26,96.0,,2018-01-01 to 2019-12-31")
        );

        assert_eq!(read_annual(buf.as_slice()).unwrap(), vec![annual]);
    }

    #[test]
    fn missing_extremes_are_read_as_none() {
        let csv = "\
STATION,NAME,Year_Start,Year_End,Annual_Max,Annual_Min,Data_Range
S1,Site,2018-10-27,2019-10-26,70.0,,2018-01-01 to 2020-12-31
S1,Site,2019-10-27,2020-10-26,NaN,41.0,2018-01-01 to 2020-12-31
";
        let annual_vec = read_annual(csv.as_bytes()).unwrap();
        assert_eq!(annual_vec[0].annual_max, Some(70.0));
        assert_eq!(annual_vec[0].annual_min, None);
        assert_eq!(annual_vec[1].annual_max, None);
        assert_eq!(annual_vec[1].annual_min, Some(41.0));
    }

    #[test]
    fn annual_avg_is_midpoint() {
        let annual = AnnualRecord {
            station: String::new(),
            name: String::new(),
            year_start: date(2018, 10, 27),
            year_end: date(2019, 10, 26),
            annual_max: Some(100.0),
            annual_min: Some(41.0),
            data_range: String::new(),
        };
        assert_eq!(annual.annual_avg(), Some(70.5));
    }
}
