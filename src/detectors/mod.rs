//! Price pattern detectors
//!
//! # Pattern Categories
//!
//! - **Two-bar (6)**: Bullish/Bearish Engulfing, Bullish/Bearish Inside Bar, Tweezer Top/Bottom
//! - **Yearly extremum (2)**: Double Top, Double Bottom
//! - **Three-bar (2)**: Morning Star, Evening Star
//! - **Multi-bar (1)**: Head and Shoulders

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod extremum;
pub mod multi_bar;
pub mod three_bar;
pub mod two_bar;

// Re-export all detectors for convenience
pub use extremum::*;
pub use multi_bar::*;
pub use three_bar::*;
pub use two_bar::*;
