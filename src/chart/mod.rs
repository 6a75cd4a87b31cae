//! Chart Data Adapter and terminal chart renderers.
//!
//! The adapter is a pure transform: a sequence of aggregate rows becomes a
//! two-column series with a fixed header pair, the tabular input shape of a
//! charting call. The renderers consume that series — a proportional share
//! breakdown for the single-snapshot consumption view (the pie's terminal
//! analog) and a horizontal bar chart for the scale-parameterized savings
//! comparison.

use colored::Colorize;
use log::warn;
use serde_json::{Value, json};

use crate::model::AggregateRow;

/// Width, in characters, of a full-length chart bar.
const BAR_WIDTH: usize = 32;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Which aggregate metric a series carries, and how its value is resolved
/// from a wire row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Consumption breakdown by type; canonical wire field `total`.
    Consumption,
    /// Savings by type; canonical wire field `economie`, with `total`
    /// honored as a deprecated alias.
    Savings,
}

impl Metric {
    /// Header label for the value column.
    pub fn label(self) -> &'static str {
        match self {
            Self::Consumption => "Consommation",
            Self::Savings => "Économie",
        }
    }

    fn value_of(self, row: &AggregateRow) -> f64 {
        match self {
            Self::Consumption => row.total.unwrap_or(0.0),
            Self::Savings => match (row.economie, row.total) {
                (Some(value), _) => value,
                (None, Some(value)) => {
                    warn!(
                        "aggregate row '{}' carries the savings value in deprecated field `total`",
                        row.category
                    );
                    value
                }
                (None, None) => 0.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Chart-ready series: a fixed header pair followed by one label/value pair
/// per input row, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub header: [&'static str; 2],
    pub rows: Vec<(String, f64)>,
}

impl SeriesTable {
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|(_, value)| value).sum()
    }

    /// Row-major JSON form, header first:
    /// `[["Type","Consommation"],["Eau",60.78],…]`.
    pub fn to_rows_json(&self) -> Value {
        let mut rows = vec![json!([self.header[0], self.header[1]])];
        rows.extend(self.rows.iter().map(|(label, value)| json!([label, value])));
        Value::Array(rows)
    }
}

/// Reshape aggregate API rows into a chart-ready series.
pub fn adapt(metric: Metric, rows: &[AggregateRow]) -> SeriesTable {
    SeriesTable {
        header: ["Type", metric.label()],
        rows: rows
            .iter()
            .map(|row| (row.category.clone(), metric.value_of(row)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Terminal renderers
// ---------------------------------------------------------------------------

/// Single-snapshot breakdown: one bar per category, scaled to its share of
/// the series total.
pub fn render_breakdown(series: &SeriesTable, title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));

    if series.rows.is_empty() {
        println!("  {}", "No data.".yellow());
        return;
    }

    let total = series.total();
    let width = label_width(series);

    for (label, value) in &series.rows {
        let share = if total > 0.0 { value / total } else { 0.0 };
        println!(
            "  {:<width$} {:>10.2}  {:>5.1}%  {}",
            label,
            value,
            share * 100.0,
            bar(share).cyan(),
        );
    }

    println!("  {}", "-".repeat(width + 20));
    // Pad before coloring: ANSI escapes would throw the width off.
    println!("  {} {:>10.2}", format!("{:<width$}", "Total").bold(), total);
}

/// Comparison chart: one horizontal bar per category, scaled to the largest
/// value in the series.
pub fn render_bars(series: &SeriesTable, title: &str, axis_label: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(60));

    if series.rows.is_empty() {
        println!("  {}", "No data.".yellow());
        return;
    }

    let max = series
        .rows
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0_f64, f64::max);
    let width = label_width(series);

    for (label, value) in &series.rows {
        let fraction = if max > 0.0 { (value / max).max(0.0) } else { 0.0 };
        println!(
            "  {:<width$} {:>10.2}  {}",
            label,
            value,
            bar(fraction).green(),
        );
    }

    println!();
    println!("  {}", axis_label.dimmed());
}

fn label_width(series: &SeriesTable) -> usize {
    series
        .rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .chain(std::iter::once("Total".len()))
        .max()
        .unwrap_or(0)
}

fn bar(fraction: f64) -> String {
    let cells = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
