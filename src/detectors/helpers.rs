//! Common helper functions shared across detector modules

use crate::{Direction, LaggedBar, OHLCExt, PatternId, PatternMatch, OHLC};

// ============================================================
// BODY THRESHOLDS
// ============================================================

/// Body is short: body < avg_body * BODY_SHORT_FACTOR
pub const BODY_SHORT_FACTOR: f64 = 1.0;
/// Body is long: body > avg_body * BODY_LONG_FACTOR
pub const BODY_LONG_FACTOR: f64 = 1.0;
/// Bars in the trailing body average
pub const BODY_AVG_PERIOD: usize = 10;

// Fallback ratio-based thresholds (when avg_body is not meaningful)
pub const BODY_SHORT_RATIO: f64 = 0.3;
pub const BODY_LONG_RATIO: f64 = 0.7;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Check if body is long relative to the trailing average.
/// Falls back to body/range when the average is zero.
#[inline]
pub fn is_body_long_f(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body * factor
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// Check if body is short relative to the trailing average.
#[inline]
pub fn is_body_short_f(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body * factor
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

/// Average body over the `period` bars before `at` (bar `at` excluded).
/// At index 0 the bar's own body is used.
#[inline]
pub fn trailing_avg_body<T: OHLC>(bars: &[T], at: usize, period: usize) -> f64 {
    if at == 0 {
        return bars[0].body();
    }
    let s = at.saturating_sub(period);
    let slice = &bars[s..at];
    let sum: f64 = slice.iter().map(|b| b.body()).sum();
    sum / slice.len() as f64
}

/// Filter rows through a per-row predicate, keeping series order.
/// Each hit spans the row and its predecessor.
pub fn scan_rows<F>(
    bars: &[LaggedBar],
    pattern_id: PatternId,
    direction: Direction,
    predicate: F,
) -> Vec<PatternMatch>
where
    F: Fn(&LaggedBar) -> bool,
{
    bars.iter()
        .enumerate()
        .filter(|(_, bar)| predicate(bar))
        .map(|(index, bar)| PatternMatch {
            pattern_id,
            direction,
            start_index: index.saturating_sub(1),
            end_index: index,
            row: *bar,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_long_uses_average() {
        assert!(is_body_long_f(2.0, 1.0, 10.0, BODY_LONG_FACTOR));
        assert!(!is_body_long_f(0.5, 1.0, 10.0, BODY_LONG_FACTOR));
    }

    #[test]
    fn test_body_fallback_to_range() {
        assert!(is_body_long_f(8.0, 0.0, 10.0, BODY_LONG_FACTOR));
        assert!(is_body_short_f(2.0, 0.0, 10.0, BODY_SHORT_FACTOR));
        assert!(!is_body_short_f(2.0, 0.0, 0.0, BODY_SHORT_FACTOR));
    }
}
