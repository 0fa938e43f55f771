//! Tab-separated results table.

use intensity_quant::OutputRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::models::Wavelength;

pub const HEADER: [&str; 14] = [
    "position",
    "wavelength",
    "slice",
    "elapsed_minutes",
    "normalized_integrated_density",
    "exposure_seconds",
    "raw_integrated_density",
    "background_used",
    "whole_frame_mean",
    "rolling_ball_radius",
    "threshold_method",
    "area_threshold_percent",
    "foreground_area_percent",
    "total_area",
];

/// A quantified slice together with its stack context
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRow {
    pub elapsed_minutes: Option<f64>,
    pub record: OutputRecord,
}

/// Format one table line (without trailing newline)
pub fn format_row(position: &str, wavelength: Wavelength, row: &SliceRow) -> String {
    let r = &row.record;
    let elapsed = row
        .elapsed_minutes
        .map(|m| m.to_string())
        .unwrap_or_else(|| "NA".to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        position,
        wavelength,
        r.slice_index,
        elapsed,
        r.normalized_integrated_density,
        r.exposure_seconds,
        r.raw_integrated_density,
        r.background_used,
        r.whole_frame_mean,
        r.rolling_ball_radius,
        r.threshold_method,
        r.area_threshold_percent,
        r.foreground_area_percent,
        r.total_area,
    )
}

/// Writes the header once, then whole stacks of rows
pub struct ReportWriter<W: Write> {
    out: W,
    rows_written: usize,
}

impl ReportWriter<BufWriter<File>> {
    /// Create (truncate) a results file and write the header
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", HEADER.join("\t"))?;
        Ok(Self {
            out,
            rows_written: 0,
        })
    }

    /// Append every row of one completed stack
    pub fn write_stack(
        &mut self,
        position: &str,
        wavelength: Wavelength,
        rows: &[SliceRow],
    ) -> io::Result<()> {
        for row in rows {
            writeln!(self.out, "{}", format_row(position, wavelength, row))?;
        }
        self.rows_written += rows.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
