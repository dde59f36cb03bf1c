//! Lag features: each row paired with the OHLC of its positional predecessor.
//!
//! The predecessor is the previous row of the series, not the previous
//! calendar day. Across a year boundary the first row of year N+1 therefore
//! sees the last row of year N.

use serde::Serialize;

use crate::{Bar, OHLC};

/// OHLC of the preceding row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrevBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl<T: OHLC> From<&T> for PrevBar {
    fn from(bar: &T) -> Self {
        Self {
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
        }
    }
}

/// A bar plus its lag features. `prev` is `None` only for the first row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaggedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub prev: Option<PrevBar>,
}

impl LaggedBar {
    #[inline]
    pub fn prev_open(&self) -> Option<f64> {
        self.prev.map(|p| p.open)
    }

    #[inline]
    pub fn prev_high(&self) -> Option<f64> {
        self.prev.map(|p| p.high)
    }

    #[inline]
    pub fn prev_low(&self) -> Option<f64> {
        self.prev.map(|p| p.low)
    }

    #[inline]
    pub fn prev_close(&self) -> Option<f64> {
        self.prev.map(|p| p.close)
    }
}

impl OHLC for LaggedBar {
    fn open(&self) -> f64 {
        self.bar.open
    }

    fn high(&self) -> f64 {
        self.bar.high
    }

    fn low(&self) -> f64 {
        self.bar.low
    }

    fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Shift-by-one transform. Output has the same length and order as `bars`.
pub fn lag(bars: &[Bar]) -> Vec<LaggedBar> {
    let mut lagged = Vec::with_capacity(bars.len());
    let mut prev: Option<PrevBar> = None;
    for bar in bars {
        lagged.push(LaggedBar { bar: *bar, prev });
        prev = Some(PrevBar::from(bar));
    }
    lagged
}
