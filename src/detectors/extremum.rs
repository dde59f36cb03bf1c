//! Yearly extremum scans: Double Top and Double Bottom
//!
//! Rows are grouped by their year tag. Within each year every row touching the
//! year's highest high (or lowest low) is returned, ties included. Years are
//! emitted in ascending order, rows within a year in series order.
//!
//! This is a same-level scan. It does not require two separated peaks or a
//! trough between them, so a year with a single row yields that row.

use std::collections::BTreeMap;

use crate::{Direction, Extreme, LaggedBar, PatternDetector, PatternKind, PatternMatch};

impl_with_defaults!(DoubleTopDetector, DoubleBottomDetector);

/// Double Top: rows at their year's maximum high
#[derive(Debug, Clone, Default)]
pub struct DoubleTopDetector;

impl PatternDetector for DoubleTopDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleTop
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_yearly_extremes(bars, Extreme::Top, self.kind())
    }
}

/// Double Bottom: rows at their year's minimum low
#[derive(Debug, Clone, Default)]
pub struct DoubleBottomDetector;

impl PatternDetector for DoubleBottomDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::DoubleBottom
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_yearly_extremes(bars, Extreme::Bottom, self.kind())
    }
}

#[inline]
fn level(bar: &LaggedBar, side: Extreme) -> f64 {
    match side {
        Extreme::Top => bar.bar.high,
        Extreme::Bottom => bar.bar.low,
    }
}

/// Two passes: per-year extreme level, then every row sitting on it.
/// NaN levels are ignored when computing the extreme and never match.
fn scan_yearly_extremes(bars: &[LaggedBar], side: Extreme, kind: PatternKind) -> Vec<PatternMatch> {
    let mut extremes: BTreeMap<i32, f64> = BTreeMap::new();
    for bar in bars {
        let value = level(bar, side);
        extremes
            .entry(bar.bar.year)
            .and_modify(|current| {
                *current = match side {
                    Extreme::Top => current.max(value),
                    Extreme::Bottom => current.min(value),
                }
            })
            .or_insert(value);
    }

    let direction = match side {
        Extreme::Top => Direction::Bearish,
        Extreme::Bottom => Direction::Bullish,
    };

    let mut per_year: BTreeMap<i32, Vec<PatternMatch>> = BTreeMap::new();
    for (index, bar) in bars.iter().enumerate() {
        let year = bar.bar.year;
        if extremes.get(&year) == Some(&level(bar, side)) {
            per_year.entry(year).or_default().push(PatternMatch {
                pattern_id: kind.id(),
                direction,
                start_index: index,
                end_index: index,
                row: *bar,
            });
        }
    }

    per_year.into_values().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lag, Bar, RawBar};
    use chrono::NaiveDate;

    fn bar(y: i32, m: u32, d: u32, high: f64, low: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Bar::from(RawBar::new(date, low, high, low, high))
    }

    #[test]
    fn test_double_top_keeps_ties() {
        let bars = lag(&[
            bar(2021, 1, 4, 1.30, 1.20),
            bar(2021, 1, 5, 1.32, 1.21),
            bar(2021, 1, 6, 1.32, 1.22),
        ]);
        let matches = DoubleTopDetector.scan(&bars);
        let indices: Vec<usize> = matches.iter().map(|m| m.end_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(matches.iter().all(|m| m.row.bar.high == 1.32));
    }

    #[test]
    fn test_double_bottom_per_year() {
        let bars = lag(&[
            bar(2020, 5, 1, 1.15, 1.05),
            bar(2020, 5, 4, 1.16, 1.08),
            bar(2021, 5, 3, 1.25, 1.18),
            bar(2021, 5, 4, 1.24, 1.17),
        ]);
        let matches = DoubleBottomDetector.scan(&bars);
        let indices: Vec<usize> = matches.iter().map(|m| m.end_index).collect();
        assert_eq!(indices, vec![0, 3]);
        assert!(matches.iter().all(|m| m.direction == Direction::Bullish));
    }

    #[test]
    fn test_single_row_year_is_degenerate_match() {
        let bars = lag(&[bar(2019, 12, 31, 1.12, 1.11)]);
        assert_eq!(DoubleTopDetector.scan(&bars).len(), 1);
        assert_eq!(DoubleBottomDetector.scan(&bars).len(), 1);
    }

    #[test]
    fn test_years_emitted_ascending_when_tags_interleave() {
        // a 2020-dated row inside the 2021 batch
        let bars = lag(&[
            bar(2021, 1, 4, 1.30, 1.20),
            bar(2020, 12, 31, 1.10, 1.00),
            bar(2021, 1, 5, 1.35, 1.25),
        ]);
        let matches = DoubleTopDetector.scan(&bars);
        let years: Vec<i32> = matches.iter().map(|m| m.row.bar.year).collect();
        assert_eq!(years, vec![2020, 2021]);
        assert_eq!(matches[1].end_index, 2);
    }

    #[test]
    fn test_nan_high_ignored() {
        let bars = lag(&[bar(2022, 3, 1, f64::NAN, 1.0), bar(2022, 3, 2, 1.5, 1.0)]);
        let matches = DoubleTopDetector.scan(&bars);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].end_index, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(DoubleTopDetector.scan(&[]).is_empty());
    }
}
