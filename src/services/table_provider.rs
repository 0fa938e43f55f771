//! Measurements precomputed by an external segmentation pipeline.
//!
//! `measurements.tsv` holds one tab-separated row per frame. Column order is
//! free; the header names the columns:
//!
//! ```text
//! slice  whole_frame_mean  background_mean  foreground_area_percent  total_area  exposure_seconds  [elapsed_minutes]
//! ```
//!
//! Rows are ordered by their `slice` value before the slice window is
//! applied and must number 1, 2, 3, ... without gaps. Numeric cells must be
//! finite and `foreground_area_percent` lies in 0-100. `elapsed_minutes` is
//! optional; `NA` or an empty cell means unknown.

use intensity_quant::SliceMeasurement;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::provider::{check_range, MeasurementProvider, SliceSample, SliceWindow};
use crate::error::CollaboratorError;

pub const TABLE_FILE_NAME: &str = "measurements.tsv";

const REQUIRED_COLUMNS: [&str; 6] = [
    "slice",
    "whole_frame_mean",
    "background_mean",
    "foreground_area_percent",
    "total_area",
    "exposure_seconds",
];

#[derive(Debug, Clone)]
struct TableRow {
    slice: u32,
    whole_frame_mean: f64,
    background_mean: f64,
    foreground_area_percent: f64,
    total_area: u64,
    exposure_seconds: f64,
    elapsed_minutes: Option<f64>,
}

/// Provider reading a stack's `measurements.tsv`
#[derive(Debug, Clone)]
pub struct TableProvider {
    rows: Vec<TableRow>,
}

impl TableProvider {
    /// Whether a stack directory carries a measurement table
    pub fn exists_in(stack_dir: &Path) -> bool {
        stack_dir.join(TABLE_FILE_NAME).is_file()
    }

    pub fn open(stack_dir: &Path, window: SliceWindow) -> Result<Self, CollaboratorError> {
        let path = stack_dir.join(TABLE_FILE_NAME);
        if !path.is_file() {
            return Err(CollaboratorError::MissingStack(path));
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| CollaboratorError::io(&path, e))?;
        Self::parse(&content, &path, window)
    }

    /// Parse table text; `path` is only used for error reporting
    pub fn parse(content: &str, path: &Path, window: SliceWindow) -> Result<Self, CollaboratorError> {
        let table_err = |line: usize, message: String| CollaboratorError::Table {
            path: PathBuf::from(path),
            line,
            message,
        };

        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'));

        let (header_line, header) = lines
            .next()
            .ok_or_else(|| table_err(1, "missing header".to_string()))?;
        let columns: Vec<&str> = header.split('\t').map(str::trim).collect();

        let index_of = |name: &str| columns.iter().position(|c| *c == name);
        let mut required = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = index_of(name)
                .ok_or_else(|| table_err(header_line, format!("missing column '{name}'")))?;
        }
        let elapsed_col = index_of("elapsed_minutes");

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split('\t').map(str::trim).collect();
            let cell = |idx: usize| {
                cells
                    .get(idx)
                    .copied()
                    .ok_or_else(|| table_err(line_no, format!("expected {} cells", columns.len())))
            };
            let number = |idx: usize| -> Result<f64, CollaboratorError> {
                let value: f64 =
                    parse_cell(cell(idx)?, columns[idx]).map_err(|m| table_err(line_no, m))?;
                if !value.is_finite() {
                    return Err(table_err(
                        line_no,
                        format!("non-finite value in column '{}'", columns[idx]),
                    ));
                }
                Ok(value)
            };

            let elapsed_minutes = match elapsed_col {
                Some(idx) => match cells.get(idx).copied() {
                    None | Some("") | Some("NA") => None,
                    Some(_) => Some(number(idx)?),
                },
                None => None,
            };

            let foreground_area_percent = number(required[3])?;
            if !(0.0..=100.0).contains(&foreground_area_percent) {
                return Err(table_err(
                    line_no,
                    format!("foreground_area_percent {foreground_area_percent} is outside 0-100"),
                ));
            }

            rows.push(TableRow {
                slice: parse_cell(cell(required[0])?, "slice").map_err(|m| table_err(line_no, m))?,
                whole_frame_mean: number(required[1])?,
                background_mean: number(required[2])?,
                foreground_area_percent,
                total_area: parse_cell(cell(required[4])?, "total_area")
                    .map_err(|m| table_err(line_no, m))?,
                exposure_seconds: number(required[5])?,
                elapsed_minutes,
            });
        }

        rows.sort_by_key(|r| r.slice);
        if let Some(pair) = rows.windows(2).find(|w| w[0].slice == w[1].slice) {
            return Err(table_err(
                header_line,
                format!("slice {} appears more than once", pair[0].slice),
            ));
        }

        if let Some((expected, row)) = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i as u32 + 1, row))
            .find(|(expected, row)| row.slice != *expected)
        {
            return Err(table_err(
                header_line,
                format!("slice {expected} is missing (next is {})", row.slice),
            ));
        }

        let rows = window.apply(rows);
        if rows.is_empty() {
            return Err(CollaboratorError::EmptyStack(PathBuf::from(path)));
        }

        tracing::debug!(path = %path.display(), slices = rows.len(), "Loaded measurement table");
        Ok(Self { rows })
    }
}

fn parse_cell<T: FromStr>(value: &str, column: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid value '{value}' in column '{column}'"))
}

impl MeasurementProvider for TableProvider {
    fn stack_len(&self) -> u32 {
        self.rows.len() as u32
    }

    fn sample(&mut self, slice_index: u32) -> Result<SliceSample, CollaboratorError> {
        let row = &self.rows[check_range(slice_index, self.stack_len())?];
        Ok(SliceSample {
            measurement: SliceMeasurement {
                slice_index,
                whole_frame_mean: row.whole_frame_mean,
                background_mean: row.background_mean,
                foreground_area_percent: row.foreground_area_percent,
                total_area: row.total_area,
                exposure_seconds: row.exposure_seconds,
            },
            elapsed_minutes: row.elapsed_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "slice\twhole_frame_mean\tbackground_mean\tforeground_area_percent\ttotal_area\texposure_seconds\telapsed_minutes
2\t60\t20\t60\t1000\t1\t15
1\t50\t10\t10\t1000\t1\t0
3\t70\t30\t70\t1000\t0.5\tNA
";

    fn parse(content: &str, window: SliceWindow) -> Result<TableProvider, CollaboratorError> {
        TableProvider::parse(content, Path::new("measurements.tsv"), window)
    }

    #[test]
    fn test_rows_ordered_by_slice() {
        let mut provider = parse(TABLE, SliceWindow::default()).unwrap();
        assert_eq!(provider.stack_len(), 3);

        let first = provider.sample(1).unwrap();
        assert_eq!(first.measurement.background_mean, 10.0);
        assert_eq!(first.elapsed_minutes, Some(0.0));

        let third = provider.sample(3).unwrap();
        assert_eq!(third.measurement.exposure_seconds, 0.5);
        assert_eq!(third.elapsed_minutes, None);
    }

    #[test]
    fn test_window_renumbers_slices() {
        let mut provider = parse(TABLE, SliceWindow::new(2, 5)).unwrap();
        assert_eq!(provider.stack_len(), 2);

        let sample = provider.sample(1).unwrap();
        assert_eq!(sample.measurement.slice_index, 1);
        assert_eq!(sample.measurement.background_mean, 20.0);
    }

    #[test]
    fn test_columns_in_any_order_without_elapsed() {
        let content = "exposure_seconds\ttotal_area\tslice\tbackground_mean\twhole_frame_mean\tforeground_area_percent\n2\t100\t1\t5\t9\t12.5\n";
        let mut provider = parse(content, SliceWindow::default()).unwrap();
        let sample = provider.sample(1).unwrap();
        assert_eq!(sample.measurement.exposure_seconds, 2.0);
        assert_eq!(sample.measurement.total_area, 100);
        assert_eq!(sample.measurement.whole_frame_mean, 9.0);
        assert_eq!(sample.measurement.foreground_area_percent, 12.5);
        assert_eq!(sample.elapsed_minutes, None);
    }

    #[test]
    fn test_missing_column() {
        let err = parse("slice\twhole_frame_mean\n1\t2\n", SliceWindow::default()).unwrap_err();
        assert!(err.to_string().contains("missing column 'background_mean'"));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let content = TABLE.replace("\t0.5\t", "\tfast\t");
        let err = parse(&content, SliceWindow::default()).unwrap_err();
        match err {
            CollaboratorError::Table { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("exposure_seconds"));
            }
            other => panic!("Expected Table error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_slice() {
        let content = format!("{TABLE}1\t50\t10\t10\t1000\t1\t0\n");
        let err = parse(&content, SliceWindow::default()).unwrap_err();
        assert!(err.to_string().contains("slice 1 appears more than once"));
    }

    #[test]
    fn test_slice_gap_is_rejected() {
        let content = TABLE.replace("\n3\t70", "\n4\t70");
        let err = parse(&content, SliceWindow::default()).unwrap_err();
        assert!(err.to_string().contains("slice 3 is missing (next is 4)"));
    }

    #[test]
    fn test_table_must_start_at_slice_one() {
        let content = TABLE.replace("\n1\t50", "\n4\t50");
        let err = parse(&content, SliceWindow::new(2, 5)).unwrap_err();
        assert!(err.to_string().contains("slice 1 is missing"));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        for (bad, column) in [
            ("2\tNaN\t20\t60", "whole_frame_mean"),
            ("2\t60\tinf\t60", "background_mean"),
        ] {
            let content = TABLE.replace("2\t60\t20\t60", bad);
            match parse(&content, SliceWindow::default()).unwrap_err() {
                CollaboratorError::Table { line, message, .. } => {
                    assert_eq!(line, 2);
                    assert!(message.contains(column), "{message}");
                }
                other => panic!("Expected Table error, got {other:?}"),
            }
        }

        let content = TABLE.replace("\t15\n", "\tNaN\n");
        let err = parse(&content, SliceWindow::default()).unwrap_err();
        assert!(err.to_string().contains("elapsed_minutes"));
    }

    #[test]
    fn test_foreground_percent_out_of_range() {
        for bad in ["120", "-1"] {
            let content = TABLE.replace("2\t60\t20\t60", &format!("2\t60\t20\t{bad}"));
            let err = parse(&content, SliceWindow::default()).unwrap_err();
            assert!(
                err.to_string().contains("outside 0-100"),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_empty_table() {
        let header = TABLE.lines().next().unwrap();
        let err = parse(header, SliceWindow::default()).unwrap_err();
        assert!(matches!(err, CollaboratorError::EmptyStack(_)));
    }
}
