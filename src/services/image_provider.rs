//! Measurements taken from intensity frames and precomputed object masks.
//!
//! A stack directory holds the grayscale PNG frames, a `masks/` directory
//! with one binary mask per frame (same file name, nonzero = cells), and
//! `acquisition.yaml` with exposure times and timestamps. The masks come from
//! the external blur / rolling-ball / threshold / morphology pipeline; this
//! provider only measures against them.

use intensity_quant::SliceMeasurement;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::provider::{check_range, MeasurementProvider, SliceSample, SliceWindow};
use crate::error::CollaboratorError;
use crate::imaging::{ForegroundMask, FrameStats, GrayFrame};
use crate::models::AcquisitionLog;

pub const MASK_DIR: &str = "masks";

/// Frame number embedded in names like `death-compIV_0007_B02a_WL1.png`
fn frame_number(file_name: &str) -> Option<u64> {
    static FRAME_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = FRAME_NUMBER.get_or_init(|| {
        Regex::new(r"(?:^|[_\-.])(\d+)(?:[_\-.]|$)").expect("frame number pattern is valid")
    });
    re.captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// List the PNG frames of a stack in acquisition order
pub fn list_frames(stack_dir: &Path) -> Result<Vec<PathBuf>, CollaboratorError> {
    let entries = std::fs::read_dir(stack_dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CollaboratorError::MissingStack(stack_dir.to_path_buf())
        } else {
            CollaboratorError::io(stack_dir, e)
        }
    })?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CollaboratorError::io(stack_dir, e))?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            frames.push(path);
        }
    }

    frames.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (frame_number(&name).unwrap_or(u64::MAX), name)
    });
    Ok(frames)
}

/// Where to write per-slice background regions
#[derive(Debug, Clone)]
struct IntermediateSink {
    dir: PathBuf,
    prefix: String,
}

/// Provider measuring PNG frames against their masks
#[derive(Debug)]
pub struct MaskedImageProvider {
    frames: Vec<PathBuf>,
    mask_dir: PathBuf,
    acquisition: AcquisitionLog,
    intermediates: Option<IntermediateSink>,
}

impl MaskedImageProvider {
    pub fn open(stack_dir: &Path, window: SliceWindow) -> Result<Self, CollaboratorError> {
        let all_frames = list_frames(stack_dir)?;
        let frames = window.apply(all_frames);
        if frames.is_empty() {
            return Err(CollaboratorError::EmptyStack(stack_dir.to_path_buf()));
        }
        let acquisition = AcquisitionLog::load(stack_dir)?;

        tracing::debug!(
            dir = %stack_dir.display(),
            frames = frames.len(),
            "Opened image stack"
        );

        Ok(Self {
            frames,
            mask_dir: stack_dir.join(MASK_DIR),
            acquisition,
            intermediates: None,
        })
    }

    /// Also write the background region of every measured slice as
    /// `<dir>/<prefix>_background_<slice>.png`.
    pub fn with_intermediates(mut self, dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.intermediates = Some(IntermediateSink {
            dir: dir.into(),
            prefix: prefix.into(),
        });
        self
    }

    fn save_background(
        &self,
        slice_index: u32,
        mask: &ForegroundMask,
    ) -> Result<(), CollaboratorError> {
        let Some(sink) = &self.intermediates else {
            return Ok(());
        };
        let path = sink
            .dir
            .join(format!("{}_background_{:04}.png", sink.prefix, slice_index));
        mask.background_frame().save_png(&path)?;
        tracing::trace!(path = %path.display(), "Saved background region");
        Ok(())
    }
}

impl MeasurementProvider for MaskedImageProvider {
    fn stack_len(&self) -> u32 {
        self.frames.len() as u32
    }

    fn sample(&mut self, slice_index: u32) -> Result<SliceSample, CollaboratorError> {
        let frame_path = &self.frames[check_range(slice_index, self.stack_len())?];
        let file_name = frame_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mask_path = self.mask_dir.join(&file_name);
        if !mask_path.is_file() {
            return Err(CollaboratorError::MissingMask(frame_path.clone()));
        }

        let exposure_seconds = self.acquisition.exposure_seconds(&file_name)?;
        let frame = GrayFrame::open_png(frame_path)?;
        let mask = ForegroundMask::open_png(&mask_path)?;
        let stats = FrameStats::measure(&frame, &mask, &mask_path)?;
        tracing::trace!(
            slice = slice_index,
            file = %file_name,
            foreground_pixels = stats.foreground_pixels,
            total_area = stats.total_area,
            "Measured frame"
        );
        self.save_background(slice_index, &mask)?;

        Ok(SliceSample {
            measurement: SliceMeasurement {
                slice_index,
                whole_frame_mean: stats.whole_frame_mean,
                background_mean: stats.background_mean,
                foreground_area_percent: stats.foreground_area_percent,
                total_area: stats.total_area,
                exposure_seconds,
            },
            elapsed_minutes: self.acquisition.elapsed_minutes(&file_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_frame_number() {
        assert_eq!(frame_number("death-compIV_0007_B02a_WL1.png"), Some(7));
        assert_eq!(frame_number("12.png"), Some(12));
        assert_eq!(frame_number("B02a.png"), None);
    }

    #[test]
    fn test_list_frames_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["img_10_A.png", "img_2_A.png", "img_1_A.PNG", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("masks")).unwrap();

        let frames = list_frames(dir.path()).unwrap();
        let names: Vec<String> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["img_1_A.PNG", "img_2_A.png", "img_10_A.png"]);
    }

    #[test]
    fn test_list_frames_missing_dir() {
        let err = list_frames(Path::new("/nonexistent/stack")).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingStack(_)));
    }

    #[test]
    fn test_open_empty_stack() {
        let dir = tempfile::tempdir().unwrap();
        let err = MaskedImageProvider::open(dir.path(), SliceWindow::default()).unwrap_err();
        assert!(matches!(err, CollaboratorError::EmptyStack(_)));
    }

    #[test]
    fn test_sample_measures_frame_against_mask() {
        let dir = tempfile::tempdir().unwrap();
        let stack = dir.path();
        fs::create_dir(stack.join(MASK_DIR)).unwrap();

        let frame = GrayFrame::new(2, 2, vec![10, 30, 500, 700]).unwrap();
        frame.save_png(&stack.join("f_0000_A.png")).unwrap();
        let mask = GrayFrame::new(2, 2, vec![0, 0, 255, 255]).unwrap();
        mask.save_png(&stack.join(MASK_DIR).join("f_0000_A.png")).unwrap();
        fs::write(
            stack.join(AcquisitionLog::FILE_NAME),
            "timepoints:\n  - file: f_0000_A.png\n    exposure_seconds: 0.5\n",
        )
        .unwrap();

        let out = tempfile::tempdir().unwrap();
        let mut provider = MaskedImageProvider::open(stack, SliceWindow::default())
            .unwrap()
            .with_intermediates(out.path(), "A_WL1");
        let sample = provider.sample(1).unwrap();

        assert_eq!(sample.measurement.whole_frame_mean, 310.0);
        assert_eq!(sample.measurement.background_mean, 20.0);
        assert_eq!(sample.measurement.foreground_area_percent, 50.0);
        assert_eq!(sample.measurement.total_area, 4);
        assert_eq!(sample.measurement.exposure_seconds, 0.5);
        assert_eq!(sample.elapsed_minutes, None);

        let saved = GrayFrame::open_png(&out.path().join("A_WL1_background_0001.png")).unwrap();
        assert_eq!(saved.pixels(), &[255, 255, 0, 0]);
    }

    #[test]
    fn test_sample_missing_mask() {
        let dir = tempfile::tempdir().unwrap();
        let frame = GrayFrame::new(1, 1, vec![1]).unwrap();
        frame.save_png(&dir.path().join("f_0000.png")).unwrap();

        let mut provider = MaskedImageProvider::open(dir.path(), SliceWindow::default()).unwrap();
        let err = provider.sample(1).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingMask(_)));
    }

    #[test]
    fn test_sample_missing_exposure() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(MASK_DIR)).unwrap();
        let frame = GrayFrame::new(1, 1, vec![1]).unwrap();
        frame.save_png(&dir.path().join("f_0000.png")).unwrap();
        frame.save_png(&dir.path().join(MASK_DIR).join("f_0000.png")).unwrap();

        let mut provider = MaskedImageProvider::open(dir.path(), SliceWindow::default()).unwrap();
        let err = provider.sample(1).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingExposure(name) if name == "f_0000.png"));
    }
}
