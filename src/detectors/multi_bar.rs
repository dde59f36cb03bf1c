//! Multi-bar shape detectors: Head and Shoulders
//!
//! Swing pivots are found with a symmetric window, reduced to an alternating
//! high/low zigzag, and scanned five pivots at a time.

use std::collections::HashMap;

use crate::{
    params::{get_period, get_ratio, ParamMeta, ParameterizedDetector},
    Direction, LaggedBar, PatternDetector, PatternKind, PatternMatch, Period, Ratio, Result, OHLC,
};

impl_with_defaults!(HeadAndShouldersDetector);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy)]
struct Pivot {
    index: usize,
    kind: PivotKind,
    price: f64,
}

/// Bars whose high (low) is strictly above (below) every other bar within
/// `period` bars on each side. A bar may be both.
fn find_pivots<T: OHLC>(bars: &[T], period: usize) -> Vec<Pivot> {
    let mut pivots = Vec::new();
    if bars.len() < 2 * period + 1 {
        return pivots;
    }

    for i in period..bars.len() - period {
        let window = &bars[i - period..=i + period];
        let high = bars[i].high();
        let low = bars[i].low();

        let is_high = window
            .iter()
            .enumerate()
            .all(|(j, b)| j == period || b.high() < high);
        let is_low = window
            .iter()
            .enumerate()
            .all(|(j, b)| j == period || b.low() > low);

        if is_high {
            pivots.push(Pivot {
                index: i,
                kind: PivotKind::High,
                price: high,
            });
        }
        if is_low {
            pivots.push(Pivot {
                index: i,
                kind: PivotKind::Low,
                price: low,
            });
        }
    }
    pivots
}

/// Collapse runs of same-kind pivots, keeping the most extreme one
fn zigzag(pivots: Vec<Pivot>) -> Vec<Pivot> {
    let mut out: Vec<Pivot> = Vec::with_capacity(pivots.len());
    for pivot in pivots {
        match out.last_mut() {
            Some(last) if last.kind == pivot.kind => {
                let more_extreme = match pivot.kind {
                    PivotKind::High => pivot.price > last.price,
                    PivotKind::Low => pivot.price < last.price,
                };
                if more_extreme {
                    *last = pivot;
                }
            }
            _ => out.push(pivot),
        }
    }
    out
}

/// Head and Shoulders: three swing highs with the middle one highest and the
/// outer two at a similar level, separated by two swing lows
#[derive(Debug, Clone)]
pub struct HeadAndShouldersDetector {
    /// Bars on each side a swing point must dominate
    pub pivot_period: Period,
    /// Allowed shoulder mismatch, as a share of the higher shoulder
    pub shoulder_tolerance: Ratio,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            pivot_period: Period::new_const(3),
            shoulder_tolerance: Ratio::new_const(0.01),
        }
    }
}

impl HeadAndShouldersDetector {
    fn is_head_and_shoulders(&self, w: &[Pivot]) -> bool {
        let [left, trough_a, head, trough_b, right] = w else {
            return false;
        };
        if left.kind != PivotKind::High {
            return false;
        }

        let (ls, hd, rs) = (left.price, head.price, right.price);
        if hd <= ls || hd <= rs {
            return false;
        }

        let higher = ls.max(rs);
        if (ls - rs).abs() > self.shoulder_tolerance.get() * higher {
            return false;
        }

        let lower_shoulder = ls.min(rs);
        trough_a.price < lower_shoulder && trough_b.price < lower_shoulder
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::HeadAndShoulders
    }

    fn min_bars(&self) -> usize {
        2 * self.pivot_period.get() + 3
    }

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
        if bars.len() < self.min_bars() {
            return Vec::new();
        }

        let pivots = zigzag(find_pivots(bars, self.pivot_period.get()));
        pivots
            .windows(5)
            .filter(|w| self.is_head_and_shoulders(w))
            .map(|w| PatternMatch {
                pattern_id: self.id(),
                direction: Direction::Bearish,
                start_index: w[0].index,
                end_index: w[4].index,
                row: bars[w[4].index],
            })
            .collect()
    }
}

static HEAD_AND_SHOULDERS_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("pivot_period", 3.0, (2.0, 10.0, 1.0), "Bars on each side of a swing point"),
    ParamMeta::ratio("shoulder_tolerance", 0.01, (0.0, 0.05, 0.005), "Allowed shoulder height mismatch"),
];

impl ParameterizedDetector for HeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            pivot_period: get_period(params, "pivot_period", 3)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", 0.01)?,
        })
    }
}
