//! Experiment directory layout.
//!
//! A project holds one directory per imaging position, each with one
//! directory per wavelength channel:
//!
//! ```text
//! <project>/<position>/<wavelength>/img_0000_<position>_<wavelength>.png
//! ```

use std::path::{Path, PathBuf};

use crate::error::CollaboratorError;
use crate::models::Wavelength;

/// Name of the directory receiving intermediate images
pub const INTERMEDIATES_DIR: &str = "intermediates";

/// One stack: a position/wavelength pair and its directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLocation {
    pub position: String,
    pub wavelength: Wavelength,
    pub dir: PathBuf,
}

impl StackLocation {
    /// Derive position and wavelength from a stack directory path
    /// (`.../<position>/<wavelength>`).
    pub fn from_stack_dir(dir: &Path) -> Result<Self, CollaboratorError> {
        if !dir.is_dir() {
            return Err(CollaboratorError::MissingStack(dir.to_path_buf()));
        }

        let name_of = |p: Option<&Path>| {
            p.and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        };
        let wl_name = name_of(Some(dir)).ok_or_else(|| {
            CollaboratorError::Layout(format!("{} has no directory name", dir.display()))
        })?;
        let wavelength: Wavelength = wl_name.parse().map_err(CollaboratorError::Layout)?;
        let position = name_of(dir.parent()).ok_or_else(|| {
            CollaboratorError::Layout(format!("{} has no position directory", dir.display()))
        })?;

        Ok(Self {
            position,
            wavelength,
            dir: dir.to_path_buf(),
        })
    }

    /// Project directory containing this stack, if the layout allows it
    pub fn project_dir(&self) -> Option<&Path> {
        self.dir.parent().and_then(Path::parent)
    }

    /// Prefix for files derived from this stack
    pub fn file_prefix(&self) -> String {
        format!("{}_{}", self.position, self.wavelength)
    }
}

/// A project directory of positions
#[derive(Debug, Clone)]
pub struct ExperimentLayout {
    root: PathBuf,
}

impl ExperimentLayout {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CollaboratorError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CollaboratorError::Layout(format!(
                "project directory not found: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn intermediates_dir(&self) -> PathBuf {
        self.root.join(INTERMEDIATES_DIR)
    }

    /// Stacks of `wavelength`, one per position, sorted by position name.
    ///
    /// Positions lacking the wavelength directory are skipped.
    pub fn stacks(&self, wavelength: Wavelength) -> Result<Vec<StackLocation>, CollaboratorError> {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| CollaboratorError::io(&self.root, e))?;

        let mut stacks = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CollaboratorError::io(&self.root, e))?;
            let position_dir = entry.path();
            let position = entry.file_name().to_string_lossy().into_owned();
            if !position_dir.is_dir() || position == INTERMEDIATES_DIR || position.starts_with('.')
            {
                continue;
            }

            let dir = position_dir.join(wavelength.as_str());
            if dir.is_dir() {
                stacks.push(StackLocation {
                    position,
                    wavelength,
                    dir,
                });
            } else {
                tracing::debug!(position = %position, wavelength = %wavelength, "Position has no stack for wavelength");
            }
        }

        stacks.sort_by(|a, b| a.position.cmp(&b.position));
        Ok(stacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stacks_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("B02a/WL1")).unwrap();
        fs::create_dir_all(root.join("A01/WL1")).unwrap();
        fs::create_dir_all(root.join("A01/WL0")).unwrap();
        fs::create_dir_all(root.join("C03/WL0")).unwrap();
        fs::create_dir_all(root.join("intermediates/WL1")).unwrap();
        fs::write(root.join("notes.txt"), "x").unwrap();

        let layout = ExperimentLayout::open(root).unwrap();
        let stacks = layout.stacks(Wavelength::WL1).unwrap();

        let positions: Vec<&str> = stacks.iter().map(|s| s.position.as_str()).collect();
        assert_eq!(positions, vec!["A01", "B02a"]);
        assert_eq!(stacks[0].dir, root.join("A01/WL1"));
        assert_eq!(stacks[0].wavelength, Wavelength::WL1);
    }

    #[test]
    fn test_open_missing_project() {
        let err = ExperimentLayout::open("/nonexistent/project").unwrap_err();
        assert!(matches!(err, CollaboratorError::Layout(_)));
    }

    #[test]
    fn test_location_from_stack_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stack_dir = dir.path().join("D04/WL2");
        fs::create_dir_all(&stack_dir).unwrap();

        let location = StackLocation::from_stack_dir(&stack_dir).unwrap();
        assert_eq!(location.position, "D04");
        assert_eq!(location.wavelength, Wavelength::WL2);
        assert_eq!(location.project_dir(), Some(dir.path()));
        assert_eq!(location.file_prefix(), "D04_WL2");
    }

    #[test]
    fn test_location_rejects_unknown_channel() {
        let dir = tempfile::tempdir().unwrap();
        let stack_dir = dir.path().join("D04/GFP");
        fs::create_dir_all(&stack_dir).unwrap();

        let err = StackLocation::from_stack_dir(&stack_dir).unwrap_err();
        assert!(matches!(err, CollaboratorError::Layout(_)));
    }

    #[test]
    fn test_location_missing_dir() {
        let err = StackLocation::from_stack_dir(Path::new("/nonexistent/A01/WL1")).unwrap_err();
        assert!(matches!(err, CollaboratorError::MissingStack(_)));
    }
}
