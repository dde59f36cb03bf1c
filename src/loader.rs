//! Yearly CSV loading.
//!
//! Files are named `{pair}_{year}.csv` inside the data directory and carry at
//! least the columns `Date,Open,High,Low,Close`. A year without a file is
//! reported, not fatal: the caller proceeds with whatever years loaded.

use std::{
    collections::BTreeMap,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::RawBar;

/// Errors from loading one year of data
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no data for year {year} at {}", .path.display())]
    MissingYear { year: i32, path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid date '{value}' on data row {row}")]
    InvalidDate { row: usize, value: String },
}

/// Where yearly files live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    /// Instrument code used as the file name prefix, e.g. `EURUSD`
    pub pair: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            pair: "EURUSD".to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn path_for(&self, year: i32) -> PathBuf {
        self.data_dir.join(format!("{}_{}.csv", self.pair, year))
    }
}

/// Outcome of loading several years
#[derive(Debug, Default)]
pub struct LoadReport {
    pub batches: BTreeMap<i32, Vec<RawBar>>,
    /// One entry per year that could not be loaded
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    /// Years that had no backing file
    pub fn missing_years(&self) -> Vec<i32> {
        self.failures
            .iter()
            .filter_map(|e| match e {
                LoadError::MissingYear { year, .. } => Some(*year),
                _ => None,
            })
            .collect()
    }
}

/// Source of yearly OHLC batches
pub trait BarSource: Send + Sync {
    fn load_year(&self, year: i32) -> Result<Vec<RawBar>, LoadError>;

    /// Load each year independently; failures are collected, not propagated
    fn load_years(&self, years: &[i32]) -> LoadReport {
        let mut report = LoadReport::default();
        for &year in years {
            match self.load_year(year) {
                Ok(rows) => {
                    info!(year, rows = rows.len(), "loaded yearly batch");
                    report.batches.insert(year, rows);
                }
                Err(error) => {
                    warn!(year, %error, "skipping year");
                    report.failures.push(error);
                }
            }
        }
        report
    }
}

/// Reads `{pair}_{year}.csv` files from a directory
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    config: LoaderConfig,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
}

impl CsvLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn read_file(path: &Path) -> Result<Vec<RawBar>, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rows = Vec::new();
        for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record?;
            let date = parse_date(&row.date).ok_or_else(|| LoadError::InvalidDate {
                row: i + 1,
                value: row.date.clone(),
            })?;
            rows.push(RawBar::new(date, row.open, row.high, row.low, row.close));
        }
        Ok(rows)
    }
}

impl BarSource for CsvLoader {
    fn load_year(&self, year: i32) -> Result<Vec<RawBar>, LoadError> {
        let path = self.config.path_for(year);
        debug!(year, path = %path.display(), "reading yearly CSV");
        match Self::read_file(&path) {
            Err(LoadError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(LoadError::MissingYear { year, path })
            }
            other => other,
        }
    }
}

/// Accept ISO dates (optionally with a time part) and a few common exports
fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    DATE_FMTS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FMTS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}
