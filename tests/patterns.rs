//! Integration tests for candlescan pattern detection.
//!
//! These tests drive the public API from yearly batches through to matched rows.

use candlescan::prelude::*;
use chrono::{Datelike, NaiveDate};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Row with explicit (open, high, low, close)
fn bar(date: NaiveDate, o: f64, h: f64, l: f64, c: f64) -> RawBar {
    RawBar::new(date, o, h, l, c)
}

fn single_year(rows: Vec<RawBar>) -> Series {
    let year = rows.first().map(|r| r.date.year()).unwrap_or(2024);
    Series::from_batches([(year, rows)]).unwrap()
}

fn engine() -> PatternEngine {
    EngineBuilder::new().with_all_defaults().build().unwrap()
}

fn end_indices(set: &MatchSet) -> Vec<usize> {
    set.iter().map(|m| m.end_index).collect()
}

// ============================================================
// TWO-BAR PATTERNS
// ============================================================

#[test]
fn test_bullish_engulfing_scenario() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08),
        bar(day(2024, 1, 3), 1.075, 1.125, 1.07, 1.12),
    ]);

    let set = engine().detect("Bullish Engulfing", &series);
    assert_eq!(end_indices(&set), vec![1]);

    let row = set.matches[0].row;
    assert_eq!(row.bar.close, 1.12);
    assert_eq!(row.prev_open(), Some(1.10));
    assert_eq!(row.prev_close(), Some(1.08));

    assert!(engine().detect("Bearish Engulfing", &series).is_empty());
}

#[test]
fn test_bearish_engulfing() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.08, 1.11, 1.07, 1.10),
        bar(day(2024, 1, 3), 1.105, 1.11, 1.06, 1.07),
    ]);

    let set = engine().detect("Bearish Engulfing", &series);
    assert_eq!(end_indices(&set), vec![1]);
    assert_eq!(set.matches[0].direction, Direction::Bearish);
    assert!(engine().detect("Bullish Engulfing", &series).is_empty());
}

#[test]
fn test_inside_bar_directions_are_disjoint() {
    let series = single_year(vec![
        bar(day(2024, 2, 1), 1.10, 1.15, 1.05, 1.12),
        bar(day(2024, 2, 2), 1.08, 1.12, 1.07, 1.11), // bullish, inside
        bar(day(2024, 2, 5), 1.11, 1.115, 1.075, 1.09), // bearish, inside
        bar(day(2024, 2, 6), 1.09, 1.12, 1.08, 1.10), // breaks prior high
    ]);

    let bullish = engine().detect("Bullish Inside Bar", &series);
    let bearish = engine().detect("Bearish Inside Bar", &series);
    assert_eq!(end_indices(&bullish), vec![1]);
    assert_eq!(end_indices(&bearish), vec![2]);
}

#[test]
fn test_inside_bar_equal_high_is_not_inside() {
    let series = single_year(vec![
        bar(day(2024, 2, 1), 1.10, 1.15, 1.05, 1.12),
        bar(day(2024, 2, 2), 1.08, 1.15, 1.07, 1.11),
    ]);
    assert!(engine().detect("Bullish Inside Bar", &series).is_empty());
}

#[test]
fn test_tweezer_bottom_scenario() {
    let matching = single_year(vec![
        bar(day(2023, 5, 1), 1.205, 1.21, 1.2001, 1.203),
        bar(day(2023, 5, 2), 1.203, 1.21, 1.2002, 1.208),
    ]);
    assert_eq!(end_indices(&engine().detect("Tweezer Bottom", &matching)), vec![1]);

    let apart = single_year(vec![
        bar(day(2023, 5, 1), 1.205, 1.21, 1.2000, 1.203),
        bar(day(2023, 5, 2), 1.203, 1.21, 1.2003, 1.208),
    ]);
    assert!(engine().detect("Tweezer Bottom", &apart).is_empty());
}

#[test]
fn test_tweezer_top_with_wider_tolerance() {
    let series = single_year(vec![
        bar(day(2023, 6, 1), 1.10, 1.1250, 1.09, 1.12),
        bar(day(2023, 6, 2), 1.12, 1.1254, 1.10, 1.11),
    ]);
    assert!(engine().detect("Tweezer Top", &series).is_empty());

    let wide = EngineBuilder::new()
        .with_all_defaults()
        .tweezer_tolerance(Tolerance::new(0.0005).unwrap())
        .build()
        .unwrap();
    assert_eq!(end_indices(&wide.detect("Tweezer Top", &series)), vec![1]);
}

#[test]
fn test_first_row_never_matches_two_bar_patterns() {
    let series = single_year(vec![bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08)]);
    let engine = engine();
    for kind in PatternKind::ALL
        .iter()
        .filter(|k| k.category() == PatternCategory::TwoBar)
    {
        assert!(engine.detect(kind.name(), &series).is_empty(), "{kind} matched row 0");
    }
}

// ============================================================
// YEAR BOUNDARIES
// ============================================================

#[test]
fn test_lag_crosses_year_boundary() {
    let series = Series::from_batches([
        (2022, vec![bar(day(2022, 12, 30), 1.07, 1.08, 1.0650, 1.068)]),
        (2023, vec![bar(day(2023, 1, 2), 1.068, 1.075, 1.0651, 1.07)]),
    ])
    .unwrap();

    let set = engine().detect("Tweezer Bottom", &series);
    assert_eq!(end_indices(&set), vec![1]);
    assert_eq!(set.matches[0].row.bar.year, 2023);
    assert_eq!(set.matches[0].row.prev_low(), Some(1.0650));
}

#[test]
fn test_batches_out_of_order_are_merged_by_year() {
    let series = Series::from_batches([
        (2021, vec![bar(day(2021, 3, 1), 1.20, 1.21, 1.19, 1.2)]),
        (2020, vec![bar(day(2020, 3, 2), 1.10, 1.11, 1.09, 1.1)]),
    ])
    .unwrap();
    let years: Vec<i32> = series.iter().map(|b| b.year).collect();
    assert_eq!(years, vec![2020, 2021]);
}

// ============================================================
// YEARLY EXTREMA
// ============================================================

#[test]
fn test_double_top_scenario() {
    let series = single_year(vec![
        bar(day(2021, 4, 1), 1.20, 1.30, 1.19, 1.25),
        bar(day(2021, 4, 2), 1.25, 1.32, 1.24, 1.30),
        bar(day(2021, 4, 5), 1.30, 1.32, 1.28, 1.29),
    ]);

    let set = engine().detect("Double Top", &series);
    assert_eq!(end_indices(&set), vec![1, 2]);
    assert!(set.rows().all(|r| r.bar.high == 1.32));
}

#[test]
fn test_double_bottom_one_group_per_year() {
    let series = Series::from_batches([
        (
            2019,
            vec![
                bar(day(2019, 1, 2), 1.14, 1.15, 1.13, 1.145),
                bar(day(2019, 1, 3), 1.145, 1.15, 1.12, 1.13),
            ],
        ),
        (
            2020,
            vec![
                bar(day(2020, 1, 2), 1.12, 1.13, 1.11, 1.115),
                bar(day(2020, 1, 3), 1.115, 1.12, 1.11, 1.118),
            ],
        ),
    ])
    .unwrap();

    let set = engine().detect("Double Bottom", &series);
    assert_eq!(end_indices(&set), vec![1, 2, 3]);
    let years: Vec<i32> = set.rows().map(|r| r.bar.year).collect();
    assert_eq!(years, vec![2019, 2020, 2020]);
}

// ============================================================
// DISPATCH
// ============================================================

#[test]
fn test_unknown_selector_returns_empty() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08),
        bar(day(2024, 1, 3), 1.075, 1.125, 1.07, 1.12),
    ]);
    let set = engine().detect("Abandoned Baby", &series);
    assert!(set.is_empty());
    assert_eq!(set.kind, None);
}

#[test]
fn test_detect_is_idempotent() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08),
        bar(day(2024, 1, 3), 1.075, 1.125, 1.07, 1.12),
        bar(day(2024, 1, 4), 1.12, 1.125, 1.10, 1.105),
    ]);
    let engine = engine();
    for kind in PatternKind::ALL {
        assert_eq!(engine.detect(kind.name(), &series), engine.detect(kind.name(), &series));
    }
}

#[test]
fn test_scan_parallel_matches_sequential() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08),
        bar(day(2024, 1, 3), 1.075, 1.125, 1.07, 1.12),
        bar(day(2024, 1, 4), 1.12, 1.125, 1.10, 1.105),
    ]);
    let engine = engine();
    let selectors: Vec<String> = PatternKind::ALL.iter().map(|k| k.to_string()).collect();

    let results = scan_parallel(&engine, &series, &selectors);
    for (result, kind) in results.iter().zip(PatternKind::ALL) {
        assert_eq!(result.selector, kind.name());
        assert_eq!(result.matches, engine.detect(kind.name(), &series));
    }
}

#[test]
fn test_match_set_serializes_rows() {
    let series = single_year(vec![
        bar(day(2024, 1, 2), 1.10, 1.11, 1.07, 1.08),
        bar(day(2024, 1, 3), 1.075, 1.125, 1.07, 1.12),
    ]);
    let set = engine().detect("Bullish Engulfing", &series);
    let json = serde_json::to_value(&set).unwrap();

    assert_eq!(json["kind"], "BullishEngulfing");
    let m = &json["matches"][0];
    assert_eq!(m["pattern_id"], "BULLISH_ENGULFING");
    assert_eq!(m["row"]["date"], "2024-01-03");
    assert_eq!(m["row"]["prev"]["close"], 1.08);
}

// ============================================================
// CSV TO MATCHES
// ============================================================

#[test]
fn test_analyze_from_csv_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("EURUSD_2023.csv"),
        "Date,Open,High,Low,Close\n\
         2023-12-28,1.1050,1.1130,1.1040,1.1100\n\
         2023-12-29,1.1100,1.1140,1.1030,1.1040\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("EURUSD_2024.csv"),
        "Date,Open,High,Low,Close\n\
         2024-01-02,1.1040,1.1045,1.0940,1.0950\n\
         2024-01-03,1.0950,1.0970,1.0890,1.0920\n",
    )
    .unwrap();

    let loader = CsvLoader::new(LoaderConfig {
        data_dir: dir.path().to_path_buf(),
        pair: "EURUSD".into(),
    });
    let years = YearSelection::default().last_n(3);
    assert_eq!(years, vec![2022, 2023, 2024]);

    let request = AnalysisRequest::new(years, "Double Top");
    let analysis = analyze(&loader, &engine(), &request).unwrap();

    assert_eq!(analysis.missing, vec![2022]);
    assert_eq!(analysis.series.len(), 4);
    assert_eq!(end_indices(&analysis.matches), vec![1, 2]);
}
