//! # Autosave artifact location.
//!
//! There is exactly one artifact per application home:
//! `<app_home>/autosave/AutoSave.<extension>`. It is not parameterized per
//! document; whichever document is active gets written there.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AutosaveError;

/// Subdirectory of the application home holding the artifact.
pub const AUTOSAVE_DIR: &str = "autosave";

/// File stem of the artifact.
pub const AUTOSAVE_STEM: &str = "AutoSave";

/// Fixed, process-wide path of the autosave artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutosavePath {
    file: Arc<Path>,
}

impl AutosavePath {
    /// Derives the artifact path from the application home and the document extension.
    ///
    /// A leading dot on `extension` is ignored.
    ///
    /// ```
    /// use autosave::AutosavePath;
    /// use std::path::Path;
    ///
    /// let p = AutosavePath::new("/home/gm/.maptool", ".cmpgn");
    /// assert_eq!(p.as_path(), Path::new("/home/gm/.maptool/autosave/AutoSave.cmpgn"));
    /// ```
    pub fn new(app_home: impl AsRef<Path>, extension: &str) -> Self {
        let ext = extension.trim_start_matches('.');
        let file = app_home
            .as_ref()
            .join(AUTOSAVE_DIR)
            .join(format!("{AUTOSAVE_STEM}.{ext}"));
        Self {
            file: Arc::from(file.as_path()),
        }
    }

    /// The artifact path.
    pub fn as_path(&self) -> &Path {
        &self.file
    }

    /// True if `other` names the artifact.
    pub fn matches(&self, other: &Path) -> bool {
        self.as_path() == other
    }

    /// Creates the autosave directory if it is missing.
    pub async fn ensure_dir(&self) -> Result<(), AutosaveError> {
        let Some(dir) = self.file.parent() else {
            return Ok(());
        };
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| AutosaveError::Io {
                path: dir.to_path_buf(),
                source,
            })
    }
}

impl AsRef<Path> for AutosavePath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl From<AutosavePath> for PathBuf {
    fn from(p: AutosavePath) -> Self {
        p.file.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_with_or_without_dot() {
        let a = AutosavePath::new("/app", "cmpgn");
        let b = AutosavePath::new("/app", ".cmpgn");
        assert_eq!(a, b);
        assert_eq!(a.as_path(), Path::new("/app/autosave/AutoSave.cmpgn"));
    }

    #[test]
    fn test_matches() {
        let p = AutosavePath::new("/app", "cmpgn");
        assert!(p.matches(Path::new("/app/autosave/AutoSave.cmpgn")));
        assert!(!p.matches(Path::new("/app/campaigns/keep.cmpgn")));
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_parent() {
        let home = tempfile::tempdir().unwrap();
        let p = AutosavePath::new(home.path(), "cmpgn");

        p.ensure_dir().await.unwrap();
        p.ensure_dir().await.unwrap();

        assert!(home.path().join(AUTOSAVE_DIR).is_dir());
        assert!(!p.as_path().exists());
    }
}
