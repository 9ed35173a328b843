use serde::Serialize;
use std::path::{Path, PathBuf};

/// One recorded take, handed from the recording side to the playback side.
///
/// Immutable after construction. The title is the file name of the
/// location (directory stripped, extension kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioAsset {
    location: PathBuf,
    title: String,
}

impl AudioAsset {
    pub fn new(location: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            title: title.into(),
        }
    }

    /// Build an asset whose title is derived from the last path segment.
    pub fn from_location(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let title = location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.display().to_string());

        Self { location, title }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
