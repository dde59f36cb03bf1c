//! # candlescan - candlestick pattern scanning over yearly OHLC series
//!
//! Detects named two-bar, yearly-extremum and multi-bar price patterns in a
//! daily OHLC series assembled from per-year batches.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlescan::prelude::*;
//! use chrono::NaiveDate;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let rows = vec![
//!     RawBar::new(day(2), 1.10, 1.11, 1.07, 1.08),
//!     RawBar::new(day(3), 1.075, 1.125, 1.07, 1.12),
//! ];
//!
//! // Merge yearly batches into one series
//! let series = Series::from_batches([(2024, rows)]).unwrap();
//!
//! // Create engine with every builtin detector
//! let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
//!
//! let matches = engine.detect("Bullish Engulfing", &series);
//! assert_eq!(matches.len(), 1);
//!
//! // Unknown selectors degrade to an empty set
//! assert!(engine.detect("Three Line Strike", &series).is_empty());
//! ```

use std::{fmt, str::FromStr};

use tracing::{debug, warn};

pub mod detectors;
pub mod lag;
pub mod loader;
pub mod params;
pub mod pipeline;
pub mod series;

pub use lag::{lag, LaggedBar, PrevBar};
pub use series::{Bar, RawBar, Series};

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Series and lag features
        lag::{lag, LaggedBar, PrevBar},
        // Loading
        loader::{BarSource, CsvLoader, LoadError, LoadReport, LoaderConfig},
        // Parameters
        params::{get_period, get_ratio, get_tolerance, ParamMeta, ParamType, ParameterizedDetector},
        // Pipeline
        pipeline::{analyze, Analysis, AnalysisError, AnalysisRequest, YearSelection},
        // Parallel
        scan_parallel,
        series::{Bar, RawBar, Series},
        // Engine
        BuiltinDetector,
        Direction,
        EngineBuilder,
        EngineConfig,
        Extreme,
        MatchSet,
        // Core traits
        OHLCExt,
        PatternCategory,
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternId,
        PatternKind,
        PatternMatch,
        Period,
        Ratio,
        Result,
        ScanResult,
        Tolerance,
        OHLC,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while building a series or an engine
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOHLC { index: usize, reason: &'static str },

    /// No yearly batch with at least one row was supplied
    #[error("No price data available for the selected years")]
    EmptyInput,
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

/// Absolute price tolerance in quote units (must be finite and > 0).
///
/// The right value is instrument-specific: 0.0002 is two pips on EUR/USD but
/// a fraction of a pip on a JPY cross.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Two pips on a four-decimal currency pair
    pub const DEFAULT: Tolerance = Tolerance(0.0002);

    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Tolerance cannot be NaN or infinite",
            ));
        }
        if value <= 0.0 {
            return Err(PatternError::InvalidValue("Tolerance must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// True when `a` and `b` differ by strictly less than the tolerance
    #[inline]
    pub fn within(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl serde::Serialize for Tolerance {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Tolerance {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Tolerance::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC data trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
}

/// Extension trait with computed properties for OHLC data
pub trait OHLCExt: OHLC {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate OHLC data consistency
    fn validate(&self) -> Result<()> {
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
        {
            return Err(PatternError::InvalidOHLC {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(PatternError::InvalidOHLC {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidOHLC {
                index: 0,
                reason: "high < low",
            });
        }
        if self.body_top() > self.high() || self.body_bottom() < self.low() {
            return Err(PatternError::InvalidOHLC {
                index: 0,
                reason: "body outside range",
            });
        }
        Ok(())
    }
}

impl<T: OHLC> OHLCExt for T {}

// ============================================================
// PATTERN KINDS
// ============================================================

/// Unique identifier for a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

/// Which end of the price range a pattern is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Extreme {
    Top,
    Bottom,
}

/// Category of pattern by how it inspects the series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    TwoBar,
    PeriodExtremum,
    ThreeBar,
    MultiBar,
}

/// Every pattern the dispatcher can route to.
///
/// Selector strings are the human-readable names returned by [`PatternKind::name`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum PatternKind {
    BullishEngulfing,
    BearishEngulfing,
    BullishInsideBar,
    BearishInsideBar,
    TweezerBottom,
    TweezerTop,
    DoubleTop,
    DoubleBottom,
    MorningStar,
    EveningStar,
    HeadAndShoulders,
}

impl PatternKind {
    pub const ALL: [PatternKind; 11] = [
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::BullishInsideBar,
        PatternKind::BearishInsideBar,
        PatternKind::TweezerBottom,
        PatternKind::TweezerTop,
        PatternKind::DoubleTop,
        PatternKind::DoubleBottom,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
        PatternKind::HeadAndShoulders,
    ];

    /// Selector string used by callers
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::BullishInsideBar => "Bullish Inside Bar",
            PatternKind::BearishInsideBar => "Bearish Inside Bar",
            PatternKind::TweezerBottom => "Tweezer Bottom",
            PatternKind::TweezerTop => "Tweezer Top",
            PatternKind::DoubleTop => "Double Top",
            PatternKind::DoubleBottom => "Double Bottom",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::HeadAndShoulders => "Head and Shoulders",
        }
    }

    /// Resolve a selector string. Matching is exact.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn id(self) -> PatternId {
        match self {
            PatternKind::BullishEngulfing => PatternId("BULLISH_ENGULFING"),
            PatternKind::BearishEngulfing => PatternId("BEARISH_ENGULFING"),
            PatternKind::BullishInsideBar => PatternId("BULLISH_INSIDE_BAR"),
            PatternKind::BearishInsideBar => PatternId("BEARISH_INSIDE_BAR"),
            PatternKind::TweezerBottom => PatternId("TWEEZER_BOTTOM"),
            PatternKind::TweezerTop => PatternId("TWEEZER_TOP"),
            PatternKind::DoubleTop => PatternId("DOUBLE_TOP"),
            PatternKind::DoubleBottom => PatternId("DOUBLE_BOTTOM"),
            PatternKind::MorningStar => PatternId("MORNING_STAR"),
            PatternKind::EveningStar => PatternId("EVENING_STAR"),
            PatternKind::HeadAndShoulders => PatternId("HEAD_AND_SHOULDERS"),
        }
    }

    /// Returns the direction this pattern signals
    pub fn direction(self) -> Direction {
        match self {
            PatternKind::BullishEngulfing
            | PatternKind::BullishInsideBar
            | PatternKind::TweezerBottom
            | PatternKind::DoubleBottom
            | PatternKind::MorningStar => Direction::Bullish,
            PatternKind::BearishEngulfing
            | PatternKind::BearishInsideBar
            | PatternKind::TweezerTop
            | PatternKind::DoubleTop
            | PatternKind::EveningStar
            | PatternKind::HeadAndShoulders => Direction::Bearish,
        }
    }

    pub fn category(self) -> PatternCategory {
        match self {
            PatternKind::BullishEngulfing
            | PatternKind::BearishEngulfing
            | PatternKind::BullishInsideBar
            | PatternKind::BearishInsideBar
            | PatternKind::TweezerBottom
            | PatternKind::TweezerTop => PatternCategory::TwoBar,
            PatternKind::DoubleTop | PatternKind::DoubleBottom => PatternCategory::PeriodExtremum,
            PatternKind::MorningStar | PatternKind::EveningStar => PatternCategory::ThreeBar,
            PatternKind::HeadAndShoulders => PatternCategory::MultiBar,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| PatternError::InvalidConfig(format!("unknown pattern '{s}'")))
    }
}

// ============================================================
// PATTERN MATCH - result of detection
// ============================================================

/// One detected occurrence. `row` is the bar the pattern completes on.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    pub direction: Direction,
    pub start_index: usize,
    pub end_index: usize,
    pub row: LaggedBar,
}

/// Ordered output of a single detector run
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MatchSet {
    /// `None` when the selector did not name a known pattern
    pub kind: Option<PatternKind>,
    pub matches: Vec<PatternMatch>,
}

impl MatchSet {
    pub fn new(kind: PatternKind, matches: Vec<PatternMatch>) -> Self {
        Self {
            kind: Some(kind),
            matches,
        }
    }

    /// Result for a selector that names no pattern
    pub fn unrecognized() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatternMatch> {
        self.matches.iter()
    }

    /// Matched rows in series order
    pub fn rows(&self) -> impl Iterator<Item = &LaggedBar> + '_ {
        self.matches.iter().map(|m| &m.row)
    }

    /// First `n` matches, for display
    pub fn head(&self, n: usize) -> &[PatternMatch] {
        &self.matches[..n.min(self.matches.len())]
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a PatternMatch;
    type IntoIter = std::slice::Iter<'a, PatternMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// A detector scans a lagged series and returns its matches in series order.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Fewest bars on which the pattern can possibly match
    fn min_bars(&self) -> usize;

    fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch>;

    fn id(&self) -> PatternId {
        self.kind().id()
    }

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn scan(&self, bars: &[LaggedBar]) -> Vec<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::scan(d, bars)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Two bar
    Engulfing(EngulfingDetector),
    InsideBar(InsideBarDetector),
    TweezerTop(TweezerTopDetector),
    TweezerBottom(TweezerBottomDetector),

    // Yearly extremum
    DoubleTop(DoubleTopDetector),
    DoubleBottom(DoubleBottomDetector),

    // Three bar
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),

    // Multi-bar
    HeadAndShoulders(HeadAndShouldersDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Reject NaN, infinite and inverted-range rows in [`PatternEngine::try_detect`]
    pub validate_data: bool,
    /// Overrides the tolerance of both tweezer detectors at build time
    pub tweezer_tolerance: Option<Tolerance>,
}

/// Pattern dispatcher: routes a selector to its detector.
///
/// Holds no per-call state, so one engine can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

impl PatternEngine {
    /// Run the detector named by `selector` over `series`.
    ///
    /// An unrecognized selector yields an empty [`MatchSet`] with `kind == None`.
    pub fn detect(&self, selector: &str, series: &Series) -> MatchSet {
        self.resolve(selector, &series.lagged())
    }

    /// Selector dispatch shared by [`detect`](Self::detect) and [`scan_parallel`]
    fn resolve(&self, selector: &str, bars: &[LaggedBar]) -> MatchSet {
        match PatternKind::from_name(selector) {
            Some(kind) => self.detect_kind(kind, bars),
            None => {
                warn!(selector, "unrecognized pattern selector, returning no matches");
                MatchSet::unrecognized()
            }
        }
    }

    /// Like [`detect`](Self::detect), but validates the series first when
    /// the engine was built with `validate_data(true)`.
    pub fn try_detect(&self, selector: &str, series: &Series) -> Result<MatchSet> {
        if self.config.validate_data {
            self.validate_bars(series.bars())?;
        }
        Ok(self.detect(selector, series))
    }

    /// Typed entry point over an already lagged series
    pub fn detect_kind(&self, kind: PatternKind, bars: &[LaggedBar]) -> MatchSet {
        let Some(detector) = self.detector(kind) else {
            debug!(pattern = kind.name(), "no detector registered for pattern");
            return MatchSet::new(kind, Vec::new());
        };

        let matches = detector.scan(bars);
        debug!(
            pattern = kind.name(),
            bars = bars.len(),
            matches = matches.len(),
            "pattern scan complete"
        );
        MatchSet::new(kind, matches)
    }

    /// Run every registered detector, in [`PatternKind::ALL`] order
    pub fn detect_all(&self, series: &Series) -> Vec<MatchSet> {
        let lagged = series.lagged();
        PatternKind::ALL
            .par_iter()
            .filter(|kind| self.detector(**kind).is_some())
            .map(|kind| self.detect_kind(*kind, &lagged))
            .collect()
    }

    pub fn detector(&self, kind: PatternKind) -> Option<&BuiltinDetector> {
        self.detectors.iter().find(|d| d.kind() == kind)
    }

    /// Kinds this engine can detect
    pub fn kinds(&self) -> Vec<PatternKind> {
        let mut kinds: Vec<_> = self.detectors.iter().map(BuiltinDetector::kind).collect();
        kinds.sort();
        kinds
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn validate_bars<T: OHLC>(&self, bars: &[T]) -> Result<()> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                PatternError::InvalidOHLC { reason, .. } => {
                    PatternError::InvalidOHLC { index: i, reason }
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    detectors: Vec<BuiltinDetector>,
    config: EngineConfig,
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every builtin pattern with its default configuration
    pub fn with_all_defaults(self) -> Self {
        self.with_two_bar_defaults()
            .with_extremum_defaults()
            .with_shape_defaults()
    }

    /// Engulfing, inside bar and tweezer patterns (6)
    pub fn with_two_bar_defaults(self) -> Self {
        self.add(BuiltinDetector::Engulfing(EngulfingDetector::bullish()))
            .add(BuiltinDetector::Engulfing(EngulfingDetector::bearish()))
            .add(BuiltinDetector::InsideBar(InsideBarDetector::bullish()))
            .add(BuiltinDetector::InsideBar(InsideBarDetector::bearish()))
            .add_all(builtin_defaults![TweezerTop, TweezerBottom])
    }

    /// Double top and double bottom (2)
    pub fn with_extremum_defaults(self) -> Self {
        self.add_all(builtin_defaults![DoubleTop, DoubleBottom])
    }

    /// Stars and head-and-shoulders (3)
    pub fn with_shape_defaults(self) -> Self {
        self.add_all(builtin_defaults![MorningStar, EveningStar, HeadAndShoulders])
    }

    /// Add a builtin detector, replacing any detector for the same pattern
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        let kind = detector.kind();
        self.detectors.retain(|d| d.kind() != kind);
        self.detectors.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        Ok(self.add(detector))
    }

    fn add_all(self, detectors: impl IntoIterator<Item = BuiltinDetector>) -> Self {
        detectors.into_iter().fold(self, Self::add)
    }

    /// Set the tweezer matching tolerance
    pub fn tweezer_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.config.tweezer_tolerance = Some(tolerance);
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Build the engine
    pub fn build(mut self) -> Result<PatternEngine> {
        if let Some(tolerance) = self.config.tweezer_tolerance {
            for detector in &mut self.detectors {
                match detector {
                    BuiltinDetector::TweezerTop(d) => d.tolerance = tolerance,
                    BuiltinDetector::TweezerBottom(d) => d.tolerance = tolerance,
                    _ => {}
                }
            }
        }

        let engine = PatternEngine {
            detectors: self.detectors,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of running one selector
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub selector: String,
    pub matches: MatchSet,
}

/// Run several selectors over one series in parallel.
///
/// The series is lagged once and shared read-only; results keep selector order.
pub fn scan_parallel<S>(engine: &PatternEngine, series: &Series, selectors: &[S]) -> Vec<ScanResult>
where
    S: AsRef<str> + Sync,
{
    let lagged = series.lagged();
    selectors
        .par_iter()
        .map(|selector| {
            let selector = selector.as_ref();
            ScanResult {
                selector: selector.to_string(),
                matches: engine.resolve(selector, &lagged),
            }
        })
        .collect()
}

// ============================================================
// TESTS
// ============================================================
