//! Assertion helpers for results tables.

use fluorquant::services::report::HEADER;
use pretty_assertions::assert_eq;

/// A parsed results table row
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub cells: Vec<String>,
}

impl ResultRow {
    pub fn get(&self, column: &str) -> &str {
        let idx = HEADER
            .iter()
            .position(|c| *c == column)
            .unwrap_or_else(|| panic!("Unknown column {column}"));
        &self.cells[idx]
    }

    pub fn number(&self, column: &str) -> f64 {
        let value = self.get(column);
        value
            .parse()
            .unwrap_or_else(|_| panic!("Column {column} is not numeric: {value}"))
    }
}

/// Parse a results table, asserting the fixed header
pub fn parse_results(text: &str) -> Vec<ResultRow> {
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(HEADER.join("\t").as_str()));
    lines
        .map(|line| {
            let cells: Vec<String> = line.split('\t').map(str::to_string).collect();
            assert_eq!(cells.len(), HEADER.len(), "Row has wrong cell count: {line}");
            ResultRow { cells }
        })
        .collect()
}

/// Assert two floats agree to within 1e-9 (relative)
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "Expected {expected}, got {actual}"
    );
}
