//! Two-bar price pattern detectors
//!
//! Every detector here is a pure predicate over a row and its lag features:
//! Engulfing, Inside Bar, Tweezer Top and Tweezer Bottom. A row without a
//! predecessor never matches.

use std::collections::HashMap;

use super::helpers::scan_rows;
use crate::{
    params::{get_tolerance, ParamMeta, ParameterizedDetector},
    Direction, LaggedBar, PatternDetector, PatternError, PatternKind, PatternMatch, Result,
    Tolerance,
};

impl_with_defaults!(
    EngulfingDetector,
    InsideBarDetector,
    TweezerTopDetector,
    TweezerBottomDetector,
);

/// Per-row predicate over a bar and its lag features
pub trait BarPredicate {
    fn matches(&self, bar: &LaggedBar) -> bool;
}

fn require_direction(direction: Direction, pattern: &str) -> Result<()> {
    if direction == Direction::Neutral {
        return Err(PatternError::InvalidConfig(format!(
            "{pattern} needs a bullish or bearish direction"
        )));
    }
    Ok(())
}

// ============================================================
// ENGULFING
// ============================================================

/// Engulfing: the current body fully contains the previous, opposite-colored body
#[derive(Debug, Clone)]
pub struct EngulfingDetector {
    pub direction: Direction,
}

impl Default for EngulfingDetector {
    fn default() -> Self {
        Self::bullish()
    }
}

impl EngulfingDetector {
    pub fn bullish() -> Self {
        Self {
            direction: Direction::Bullish,
        }
    }

    pub fn bearish() -> Self {
        Self {
            direction: Direction::Bearish,
        }
    }
}

impl BarPredicate for EngulfingDetector {
    fn matches(&self, bar: &LaggedBar) -> bool {
        let Some(prev) = bar.prev else {
            return false;
        };
        let curr = &bar.bar;

        match self.direction {
            // Bearish prior body, bullish current body opening below its close
            // and closing above its open
            Direction::Bullish => {
                prev.close < prev.open
                    && curr.close > curr.open
                    && curr.open < prev.close
                    && curr.close > prev.open
            }
            Direction::Bearish => {
                prev.close > prev.open
                    && curr.close < curr.open
                    && curr.open > prev.close
                    && curr.close < prev.open
            }
            Direction::Neutral => false,
        }
    }
}

impl PatternDetector for EngulfingDetector {
    fn kind(&self) -> PatternKind {
        match self.direction {
            Direction::Bearish => PatternKind::BearishEngulfing,
            _ => PatternKind::BullishEngulfing,
        }
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_rows(bars, self.id(), self.direction, |bar| self.matches(bar))
    }

    fn validate_config(&self) -> Result<()> {
        require_direction(self.direction, "Engulfing")
    }
}

// ============================================================
// INSIDE BAR
// ============================================================

/// Inside Bar: range strictly inside the previous range, colored by direction
#[derive(Debug, Clone)]
pub struct InsideBarDetector {
    pub direction: Direction,
}

impl Default for InsideBarDetector {
    fn default() -> Self {
        Self::bullish()
    }
}

impl InsideBarDetector {
    pub fn bullish() -> Self {
        Self {
            direction: Direction::Bullish,
        }
    }

    pub fn bearish() -> Self {
        Self {
            direction: Direction::Bearish,
        }
    }
}

impl BarPredicate for InsideBarDetector {
    fn matches(&self, bar: &LaggedBar) -> bool {
        let Some(prev) = bar.prev else {
            return false;
        };
        let curr = &bar.bar;

        if !(curr.high < prev.high && curr.low > prev.low) {
            return false;
        }

        match self.direction {
            Direction::Bullish => curr.close > curr.open,
            Direction::Bearish => curr.close < curr.open,
            Direction::Neutral => false,
        }
    }
}

impl PatternDetector for InsideBarDetector {
    fn kind(&self) -> PatternKind {
        match self.direction {
            Direction::Bearish => PatternKind::BearishInsideBar,
            _ => PatternKind::BullishInsideBar,
        }
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_rows(bars, self.id(), self.direction, |bar| self.matches(bar))
    }

    fn validate_config(&self) -> Result<()> {
        require_direction(self.direction, "Inside Bar")
    }
}

// ============================================================
// TWEEZERS
// ============================================================

/// Tweezer Top: two consecutive highs within `tolerance` of each other
#[derive(Debug, Clone)]
pub struct TweezerTopDetector {
    pub tolerance: Tolerance,
}

impl Default for TweezerTopDetector {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
        }
    }
}

impl BarPredicate for TweezerTopDetector {
    fn matches(&self, bar: &LaggedBar) -> bool {
        bar.prev_high()
            .is_some_and(|prev_high| self.tolerance.within(bar.bar.high, prev_high))
    }
}

impl PatternDetector for TweezerTopDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::TweezerTop
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_rows(bars, self.id(), Direction::Bearish, |bar| self.matches(bar))
    }
}

/// Tweezer Bottom: two consecutive lows within `tolerance` of each other
#[derive(Debug, Clone)]
pub struct TweezerBottomDetector {
    pub tolerance: Tolerance,
}

impl Default for TweezerBottomDetector {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
        }
    }
}

impl BarPredicate for TweezerBottomDetector {
    fn matches(&self, bar: &LaggedBar) -> bool {
        bar.prev_low()
            .is_some_and(|prev_low| self.tolerance.within(bar.bar.low, prev_low))
    }
}

impl PatternDetector for TweezerBottomDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::TweezerBottom
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        scan_rows(bars, self.id(), Direction::Bullish, |bar| self.matches(bar))
    }
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static TWEEZER_PARAMS: &[ParamMeta] = &[ParamMeta::tolerance(
    "tolerance",
    0.0002,
    (0.0001, 0.001, 0.0001),
    "Maximum absolute difference between the two extremes",
)];

impl ParameterizedDetector for TweezerTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TWEEZER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_tolerance(params, "tolerance", 0.0002)?,
        })
    }
}

impl ParameterizedDetector for TweezerBottomDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TWEEZER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_tolerance(params, "tolerance", 0.0002)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lag, Bar, RawBar};
    use chrono::NaiveDate;

    fn bars(rows: &[(f64, f64, f64, f64)]) -> Vec<LaggedBar> {
        let start = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let bars: Vec<Bar> = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| {
                let date = start + chrono::Days::new(i as u64);
                Bar::from(RawBar::new(date, o, h, l, c))
            })
            .collect();
        lag(&bars)
    }

    #[test]
    fn test_bullish_engulfing_scenario() {
        let lagged = bars(&[(1.10, 1.11, 1.07, 1.08), (1.075, 1.125, 1.07, 1.12)]);
        let detector = EngulfingDetector::bullish();
        assert!(!detector.matches(&lagged[0]));
        assert!(detector.matches(&lagged[1]));
        assert!(!EngulfingDetector::bearish().matches(&lagged[1]));
    }

    #[test]
    fn test_bearish_engulfing() {
        let lagged = bars(&[(1.08, 1.11, 1.07, 1.10), (1.105, 1.11, 1.06, 1.07)]);
        assert!(EngulfingDetector::bearish().matches(&lagged[1]));
        assert!(!EngulfingDetector::bullish().matches(&lagged[1]));
    }

    #[test]
    fn test_engulfing_requires_strict_body_containment() {
        // current open equals prior close: not strictly engulfing
        let lagged = bars(&[(1.10, 1.11, 1.07, 1.08), (1.08, 1.125, 1.07, 1.12)]);
        assert!(!EngulfingDetector::bullish().matches(&lagged[1]));
    }

    #[test]
    fn test_inside_bar_direction() {
        let lagged = bars(&[
            (1.10, 1.20, 1.00, 1.15),
            (1.05, 1.15, 1.02, 1.10), // inside, bullish
            (1.12, 1.14, 1.03, 1.04), // inside, bearish
        ]);
        assert!(InsideBarDetector::bullish().matches(&lagged[1]));
        assert!(!InsideBarDetector::bearish().matches(&lagged[1]));
        assert!(InsideBarDetector::bearish().matches(&lagged[2]));
        assert!(!InsideBarDetector::bullish().matches(&lagged[2]));
    }

    #[test]
    fn test_inside_bar_equal_high_is_not_inside() {
        let lagged = bars(&[(1.10, 1.20, 1.00, 1.15), (1.05, 1.20, 1.02, 1.10)]);
        assert!(!InsideBarDetector::bullish().matches(&lagged[1]));
    }

    #[test]
    fn test_doji_inside_bar_matches_neither_direction() {
        let lagged = bars(&[(1.10, 1.20, 1.00, 1.15), (1.10, 1.15, 1.02, 1.10)]);
        assert!(!InsideBarDetector::bullish().matches(&lagged[1]));
        assert!(!InsideBarDetector::bearish().matches(&lagged[1]));
    }

    #[test]
    fn test_tweezer_bottom_scenarios() {
        let hit = bars(&[(1.21, 1.22, 1.2001, 1.21), (1.21, 1.22, 1.2002, 1.21)]);
        assert!(TweezerBottomDetector::default().matches(&hit[1]));

        let miss = bars(&[(1.21, 1.22, 1.2000, 1.21), (1.21, 1.22, 1.2003, 1.21)]);
        assert!(!TweezerBottomDetector::default().matches(&miss[1]));
    }

    #[test]
    fn test_tweezer_top() {
        let lagged = bars(&[(1.20, 1.3001, 1.19, 1.25), (1.25, 1.3000, 1.21, 1.22)]);
        assert!(TweezerTopDetector::default().matches(&lagged[1]));
        assert!(!TweezerTopDetector::default().matches(&lagged[0]));
    }

    #[test]
    fn test_scan_spans_two_bars() {
        let lagged = bars(&[
            (1.10, 1.11, 1.07, 1.08),
            (1.075, 1.125, 1.07, 1.12),
            (1.12, 1.13, 1.11, 1.125),
        ]);
        let matches = EngulfingDetector::bullish().scan(&lagged);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start_index, 0);
        assert_eq!(matches[0].end_index, 1);
        assert_eq!(matches[0].pattern_id.as_str(), "BULLISH_ENGULFING");
        assert_eq!(matches[0].row, lagged[1]);
    }

    #[test]
    fn test_kind_follows_direction() {
        assert_eq!(EngulfingDetector::bearish().kind(), PatternKind::BearishEngulfing);
        assert_eq!(InsideBarDetector::bearish().kind(), PatternKind::BearishInsideBar);
        assert_eq!(InsideBarDetector::with_defaults().kind(), PatternKind::BullishInsideBar);
    }

    #[test]
    fn test_neutral_direction_rejected() {
        let d = InsideBarDetector {
            direction: Direction::Neutral,
        };
        assert!(d.validate_config().is_err());
        assert!(EngulfingDetector::bearish().validate_config().is_ok());
    }

    #[test]
    fn test_tweezer_with_params() {
        let mut params = HashMap::new();
        params.insert("tolerance", 0.0005);
        let d = TweezerTopDetector::with_params(&params).unwrap();
        assert_eq!(d.tolerance.get(), 0.0005);

        params.insert("tolerance", 0.0);
        assert!(TweezerBottomDetector::with_params(&params).is_err());
        assert_eq!(TweezerBottomDetector::param_meta()[0].name, "tolerance");
    }
}
