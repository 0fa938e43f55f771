//! Test fixtures: synthetic experiment projects on disk.

use std::fs;
use std::path::{Path, PathBuf};

use fluorquant::imaging::GrayFrame;
use fluorquant::models::AcquisitionLog;
use fluorquant::services::image_provider::MASK_DIR;
use fluorquant::services::table_provider::TABLE_FILE_NAME;
use tempfile::TempDir;

/// Frames are 10x10, so a pixel is exactly one percent of the area.
pub const FRAME_SIDE: u32 = 10;
pub const FRAME_AREA: u64 = (FRAME_SIDE * FRAME_SIDE) as u64;

/// One synthetic slice: the first `foreground_percent` pixels are cells of
/// intensity `foreground`, the rest background of intensity `background`.
#[derive(Debug, Clone, Copy)]
pub struct SliceSpec {
    pub background: u16,
    pub foreground: u16,
    pub foreground_percent: u32,
    pub exposure_seconds: f64,
}

impl SliceSpec {
    pub fn new(background: u16, foreground: u16, foreground_percent: u32) -> Self {
        Self {
            background,
            foreground,
            foreground_percent,
            exposure_seconds: 1.0,
        }
    }

    pub fn exposure(mut self, seconds: f64) -> Self {
        self.exposure_seconds = seconds;
        self
    }

    /// Whole-frame mean, computed the way the image provider does
    pub fn whole_frame_mean(&self) -> f64 {
        let fg = self.foreground_percent as u64;
        let sum = fg * u64::from(self.foreground) + (FRAME_AREA - fg) * u64::from(self.background);
        sum as f64 / FRAME_AREA as f64
    }

    fn frame(&self) -> GrayFrame {
        let pixels = (0..FRAME_AREA)
            .map(|i| {
                if i < u64::from(self.foreground_percent) {
                    self.foreground
                } else {
                    self.background
                }
            })
            .collect();
        GrayFrame::new(FRAME_SIDE, FRAME_SIDE, pixels).unwrap()
    }

    fn mask(&self) -> GrayFrame {
        let pixels = (0..FRAME_AREA)
            .map(|i| if i < u64::from(self.foreground_percent) { 255 } else { 0 })
            .collect();
        GrayFrame::new(FRAME_SIDE, FRAME_SIDE, pixels).unwrap()
    }
}

/// A temporary project directory
pub struct ProjectBuilder {
    dir: TempDir,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Start a stack at `<project>/<position>/<wavelength>`
    pub fn stack(&self, position: &str, wavelength: &str) -> StackBuilder {
        let dir = self.root().join(position).join(wavelength);
        fs::create_dir_all(&dir).unwrap();
        StackBuilder { dir }
    }

    pub fn read_results(&self, file_name: &str) -> String {
        fs::read_to_string(self.root().join(file_name)).unwrap()
    }
}

pub struct StackBuilder {
    pub dir: PathBuf,
}

impl StackBuilder {
    fn frame_name(&self, index: usize) -> String {
        let wl = self.dir.file_name().unwrap().to_string_lossy();
        let position = self.dir.parent().unwrap().file_name().unwrap().to_string_lossy();
        format!("exp_{index:04}_{position}_{wl}.png")
    }

    /// Write frames, masks and `acquisition.yaml`; frames are five minutes apart.
    pub fn images(self, slices: &[SliceSpec]) -> Self {
        let mask_dir = self.dir.join(MASK_DIR);
        fs::create_dir_all(&mask_dir).unwrap();

        let mut yaml = String::from("timepoints:\n");
        for (i, spec) in slices.iter().enumerate() {
            let name = self.frame_name(i);
            spec.frame().save_png(&self.dir.join(&name)).unwrap();
            spec.mask().save_png(&mask_dir.join(&name)).unwrap();
            yaml.push_str(&format!(
                "  - file: {name}\n    exposure_seconds: {}\n    acquired_at: 2013-04-02T10:{:02}:00Z\n",
                spec.exposure_seconds,
                i * 5
            ));
        }
        fs::write(self.dir.join(AcquisitionLog::FILE_NAME), yaml).unwrap();
        self
    }

    /// Write a `measurements.tsv` from `(whole, background, fg_percent, exposure)` rows
    pub fn table(self, rows: &[(f64, f64, f64, f64)]) -> Self {
        let mut content = String::from(
            "slice\twhole_frame_mean\tbackground_mean\tforeground_area_percent\ttotal_area\texposure_seconds\telapsed_minutes\n",
        );
        for (i, (whole, bg, fg, exposure)) in rows.iter().enumerate() {
            content.push_str(&format!(
                "{}\t{whole}\t{bg}\t{fg}\t1000\t{exposure}\t{}\n",
                i + 1,
                i * 10
            ));
        }
        fs::write(self.dir.join(TABLE_FILE_NAME), content).unwrap();
        self
    }

    /// Remove the mask of the `index`-th frame (0-based)
    pub fn without_mask(self, index: usize) -> Self {
        fs::remove_file(self.dir.join(MASK_DIR).join(self.frame_name(index))).unwrap();
        self
    }
}
