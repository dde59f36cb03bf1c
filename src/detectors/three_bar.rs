//! Three-bar reversal detectors: Morning Star and Evening Star
//!
//! Body sizes are judged against the trailing average body of the bars before
//! each candle, so a "long" first candle means long for the recent market.

use std::collections::HashMap;

use super::{
  helpers,
  helpers::{is_body_long_f, is_body_short_f},
};
use crate::{
  params::{get_factor, get_ratio, ParamMeta, ParameterizedDetector},
  Direction, LaggedBar, OHLCExt, PatternDetector, PatternError, PatternKind, PatternMatch, Ratio,
  Result,
};

impl_with_defaults!(MorningStarDetector, EveningStarDetector);

fn validate_factors(long: f64, short: f64) -> Result<()> {
  for (field, value) in [("body_long_factor", long), ("body_short_factor", short)] {
    if !value.is_finite() || value <= 0.0 {
      return Err(PatternError::OutOfRange { field, value, min: 0.0, max: f64::MAX });
    }
  }
  Ok(())
}

// ============================================================
// MORNING STAR
// ============================================================

/// Morning Star: long bearish candle, small body gapping below it, then a
/// bullish candle closing well into the first body
#[derive(Debug, Clone)]
pub struct MorningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  /// How far into the first body the third close must reach
  pub penetration: Ratio,
}

impl Default for MorningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: Ratio::new_const(0.3),
    }
  }
}

impl MorningStarDetector {
  fn detect_at(&self, bars: &[LaggedBar], index: usize) -> Option<PatternMatch> {
    if index < 2 {
      return None;
    }
    let first = bars.get(index - 2)?;
    let second = bars.get(index - 1)?;
    let third = bars.get(index)?;

    if !first.is_bearish() || !third.is_bullish() {
      return None;
    }

    let first_body = first.body();
    let avg_body_first = helpers::trailing_avg_body(bars, index - 2, helpers::BODY_AVG_PERIOD);
    if !is_body_long_f(first_body, avg_body_first, first.range(), self.body_long_factor) {
      return None;
    }

    let avg_body_second = helpers::trailing_avg_body(bars, index - 1, helpers::BODY_AVG_PERIOD);
    if !is_body_short_f(second.body(), avg_body_second, second.range(), self.body_short_factor) {
      return None;
    }

    // Star body gaps below the first body
    if second.body_top() >= first.body_bottom() {
      return None;
    }

    if third.bar.close <= first.bar.close + first_body * self.penetration.get() {
      return None;
    }

    Some(PatternMatch {
      pattern_id:  self.id(),
      direction:   Direction::Bullish,
      start_index: index - 2,
      end_index:   index,
      row:         *third,
    })
  }
}

impl PatternDetector for MorningStarDetector {
  fn kind(&self) -> PatternKind {
    PatternKind::MorningStar
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
    (2..bars.len()).filter_map(|i| self.detect_at(bars, i)).collect()
  }

  fn validate_config(&self) -> Result<()> {
    validate_factors(self.body_long_factor, self.body_short_factor)
  }
}

// ============================================================
// EVENING STAR
// ============================================================

/// Evening Star: long bullish candle, small body gapping above it, then a
/// bearish candle closing well into the first body
#[derive(Debug, Clone)]
pub struct EveningStarDetector {
  pub body_long_factor: f64,
  pub body_short_factor: f64,
  pub penetration: Ratio,
}

impl Default for EveningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      body_short_factor: helpers::BODY_SHORT_FACTOR,
      penetration: Ratio::new_const(0.3),
    }
  }
}

impl EveningStarDetector {
  fn detect_at(&self, bars: &[LaggedBar], index: usize) -> Option<PatternMatch> {
    if index < 2 {
      return None;
    }
    let first = bars.get(index - 2)?;
    let second = bars.get(index - 1)?;
    let third = bars.get(index)?;

    if !first.is_bullish() || !third.is_bearish() {
      return None;
    }

    let first_body = first.body();
    let avg_body_first = helpers::trailing_avg_body(bars, index - 2, helpers::BODY_AVG_PERIOD);
    if !is_body_long_f(first_body, avg_body_first, first.range(), self.body_long_factor) {
      return None;
    }

    let avg_body_second = helpers::trailing_avg_body(bars, index - 1, helpers::BODY_AVG_PERIOD);
    if !is_body_short_f(second.body(), avg_body_second, second.range(), self.body_short_factor) {
      return None;
    }

    // Star body gaps above the first body
    if second.body_bottom() <= first.body_top() {
      return None;
    }

    if third.bar.close >= first.bar.close - first_body * self.penetration.get() {
      return None;
    }

    Some(PatternMatch {
      pattern_id:  self.id(),
      direction:   Direction::Bearish,
      start_index: index - 2,
      end_index:   index,
      row:         *third,
    })
  }
}

impl PatternDetector for EveningStarDetector {
  fn kind(&self) -> PatternKind {
    PatternKind::EveningStar
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
    (2..bars.len()).filter_map(|i| self.detect_at(bars, i)).collect()
  }

  fn validate_config(&self) -> Result<()> {
    validate_factors(self.body_long_factor, self.body_short_factor)
  }
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static STAR_PARAMS: &[ParamMeta] = &[
  ParamMeta::factor("body_long_factor", 1.0, (0.5, 2.0, 0.25), "First candle body vs trailing average"),
  ParamMeta::factor("body_short_factor", 1.0, (0.25, 1.5, 0.25), "Star body vs trailing average"),
  ParamMeta::ratio("penetration", 0.3, (0.0, 0.6, 0.1), "Share of the first body the third close must retrace"),
];

impl ParameterizedDetector for MorningStarDetector {
  fn param_meta() -> &'static [ParamMeta] {
    STAR_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self {
      body_long_factor: get_factor(params, "body_long_factor", helpers::BODY_LONG_FACTOR)?,
      body_short_factor: get_factor(params, "body_short_factor", helpers::BODY_SHORT_FACTOR)?,
      penetration: get_ratio(params, "penetration", 0.3)?,
    })
  }
}

impl ParameterizedDetector for EveningStarDetector {
  fn param_meta() -> &'static [ParamMeta] {
    STAR_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Ok(Self {
      body_long_factor: get_factor(params, "body_long_factor", helpers::BODY_LONG_FACTOR)?,
      body_short_factor: get_factor(params, "body_short_factor", helpers::BODY_SHORT_FACTOR)?,
      penetration: get_ratio(params, "penetration", 0.3)?,
    })
  }
}
