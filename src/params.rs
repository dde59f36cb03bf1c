//! Parameter metadata for pattern detectors
//!
//! Detectors with numeric settings describe them through [`ParamMeta`], so a
//! caller can list the knobs and build a detector from a plain map.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use candlescan::params::ParameterizedDetector;
//! use candlescan::prelude::*;
//!
//! for param in TweezerBottomDetector::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let mut params = HashMap::new();
//! params.insert("tolerance", 0.0005);
//! let detector = TweezerBottomDetector::with_params(&params).unwrap();
//! assert_eq!(detector.tolerance.get(), 0.0005);
//! ```

use std::collections::HashMap;

use crate::{PatternError, Period, Ratio, Result, Tolerance};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value (0.0..=1.0)
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Absolute price distance (> 0)
  Tolerance,
  /// Free multiplier (> 0), e.g. a body-size factor
  Factor,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "tolerance")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Suggested sweep: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn new(
    name: &'static str,
    param_type: ParamType,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type, default, range, description }
  }

  pub const fn ratio(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self::new(name, ParamType::Ratio, default, range, description)
  }

  pub const fn period(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self::new(name, ParamType::Period, default, range, description)
  }

  pub const fn tolerance(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self::new(name, ParamType::Tolerance, default, range, description)
  }

  pub const fn factor(name: &'static str, default: f64, range: (f64, f64, f64), description: &'static str) -> Self {
    Self::new(name, ParamType::Factor, default, range, description)
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if value < 0.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a Tolerance from params with default fallback
pub fn get_tolerance(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Tolerance> {
  let value = params.get(key).copied().unwrap_or(default);
  Tolerance::new(value)
}

/// Helper to get a positive, finite multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &'static str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if !value.is_finite() || value <= 0.0 {
    return Err(PatternError::OutOfRange { field: key, value, min: 0.0, max: f64::MAX });
  }
  Ok(value)
}

// ============================================================
// TESTS
// ============================================================
