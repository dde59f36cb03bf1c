//! Request-level flow: pick years, load them, normalize, detect.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    loader::{BarSource, LoadError},
    MatchSet, PatternEngine, PatternError, Series,
};

/// Errors from a full analysis run
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Range of years a caller may choose from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSelection {
    available: RangeInclusive<i32>,
}

impl Default for YearSelection {
    fn default() -> Self {
        Self {
            available: 2010..=2024,
        }
    }
}

impl YearSelection {
    pub fn new(first: i32, last: i32) -> crate::Result<Self> {
        if first > last {
            return Err(PatternError::InvalidConfig(format!(
                "year range {first}..={last} is empty"
            )));
        }
        Ok(Self {
            available: first..=last,
        })
    }

    pub fn first(&self) -> i32 {
        *self.available.start()
    }

    pub fn last(&self) -> i32 {
        *self.available.end()
    }

    /// Every available year, ascending
    pub fn all(&self) -> Vec<i32> {
        self.available.clone().collect()
    }

    /// The most recent `n` years, ascending. `n` is clamped to the range.
    pub fn last_n(&self, n: usize) -> Vec<i32> {
        let years = self.all();
        let skip = years.len().saturating_sub(n);
        years[skip..].to_vec()
    }
}

/// One analysis: which years to load and which pattern to look for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub years: Vec<i32>,
    /// Selector string, e.g. `"Tweezer Top"`
    pub pattern: String,
}

impl AnalysisRequest {
    pub fn new(years: Vec<i32>, pattern: impl Into<String>) -> Self {
        Self {
            years,
            pattern: pattern.into(),
        }
    }
}

/// Output of [`analyze`]
#[derive(Debug, Clone)]
pub struct Analysis {
    pub series: Series,
    pub matches: MatchSet,
    /// Requested years that had no data file
    pub missing: Vec<i32>,
}

/// Load the requested years, merge them and run the selected detector.
///
/// Missing years are skipped and reported in [`Analysis::missing`]. Any other
/// load failure aborts the run. Fails with [`PatternError::EmptyInput`] when
/// no requested year has rows.
pub fn analyze<S>(
    source: &S,
    engine: &PatternEngine,
    request: &AnalysisRequest,
) -> Result<Analysis, AnalysisError>
where
    S: BarSource + ?Sized,
{
    info!(pattern = %request.pattern, years = ?request.years, "starting analysis");

    let mut report = source.load_years(&request.years);
    let missing = report.missing_years();
    if let Some(pos) = report
        .failures
        .iter()
        .position(|e| !matches!(e, LoadError::MissingYear { .. }))
    {
        return Err(report.failures.swap_remove(pos).into());
    }

    let series = Series::from_batches(report.batches)?;
    let matches = engine.try_detect(&request.pattern, &series)?;

    info!(
        pattern = %request.pattern,
        bars = series.len(),
        matches = matches.len(),
        missing = missing.len(),
        "analysis complete"
    );
    Ok(Analysis {
        series,
        matches,
        missing,
    })
}
