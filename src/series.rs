//! Series normalization: merging yearly OHLC batches into one ordered series.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{lag, LaggedBar, PatternError, Result, OHLC};

/// One row as supplied by a loader, before year tagging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl RawBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }
}

impl OHLC for RawBar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// One trading day, tagged with its calendar year and 1-based day of year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub year: i32,
    pub day_of_year: u32,
}

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Self {
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            year: raw.date.year(),
            day_of_year: raw.date.ordinal(),
        }
    }
}

impl OHLC for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// Ordered daily series built from one or more yearly batches.
///
/// Batches are concatenated by ascending year key with row order inside a
/// batch preserved. Date gaps and year boundaries are not checked.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Merge `(year, rows)` batches into a series.
    ///
    /// Empty batches are skipped. Fails with [`PatternError::EmptyInput`] when
    /// no batch contributes a row.
    pub fn from_batches<I>(batches: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, Vec<RawBar>)>,
    {
        let mut batches: Vec<(i32, Vec<RawBar>)> = batches.into_iter().collect();
        // stable: duplicate keys keep caller order
        batches.sort_by_key(|(year, _)| *year);

        let mut bars = Vec::with_capacity(batches.iter().map(|(_, rows)| rows.len()).sum());
        let mut used = 0usize;

        for (year, rows) in batches {
            if rows.is_empty() {
                warn!(year, "skipping empty yearly batch");
                continue;
            }
            used += 1;

            let start = bars.len();
            bars.extend(rows.into_iter().map(Bar::from));

            let mismatched = bars[start..].iter().filter(|b| b.year != year).count();
            if mismatched > 0 {
                warn!(year, rows = mismatched, "rows dated outside their batch year");
            }
        }

        if used == 0 {
            return Err(PatternError::EmptyInput);
        }

        debug!(batches = used, bars = bars.len(), "series normalized");
        Ok(Self { bars })
    }

    /// Wrap bars that are already tagged and ordered
    pub fn from_bars(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(PatternError::EmptyInput);
        }
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// Distinct year tags, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.bars.iter().map(|b| b.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// New lagged view of the series; `self` is left untouched
    pub fn lagged(&self) -> Vec<LaggedBar> {
        lag(&self.bars)
    }

    /// `(day_of_year, close)` points per year, for a year-over-year overlay
    pub fn overlay(&self) -> BTreeMap<i32, Vec<(u32, f64)>> {
        let mut lines: BTreeMap<i32, Vec<(u32, f64)>> = BTreeMap::new();
        for bar in &self.bars {
            lines
                .entry(bar.year)
                .or_default()
                .push((bar.day_of_year, bar.close));
        }
        lines
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
