//! File-backed persistence for artworks.
//!
//! Each document is stored as `<name>.json` in a data directory. Listing and
//! deleting documents is left to the host.

use std::path::{Path, PathBuf};

use crate::schema::ArtworkDocument;
use crate::{ArtError, ArtResult, Artwork};

/// Saves and loads artworks by document name.
#[derive(Debug, Clone)]
pub struct ArtworkStore {
    data_dir: PathBuf,
}

impl ArtworkStore {
    /// Create a store rooted at `data_dir`.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> ArtResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The directory documents are stored in.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The file a document is stored in.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", sanitize_filename(name)))
    }

    /// Whether a document has been saved under `name`.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Save an artwork as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, name: &str, artwork: &Artwork) -> ArtResult<()> {
        let json = serde_json::to_string_pretty(&ArtworkDocument::from(artwork))?;
        let path = self.path_for(name);
        std::fs::write(&path, json)?;
        tracing::debug!("Saved {name} to {}", path.display());
        Ok(())
    }

    /// Load an artwork, reporting any failure.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Io`] if the file can't be read and
    /// [`ArtError::Decode`] if it can't be parsed.
    pub fn load(&self, name: &str) -> ArtResult<Artwork> {
        let bytes = std::fs::read(self.path_for(name))?;
        Artwork::decode(&bytes)
    }

    /// Load an artwork for first use, starting empty if it is missing or
    /// unreadable.
    #[must_use]
    pub fn load_or_empty(&self, name: &str) -> Artwork {
        match self.load(name) {
            Ok(artwork) => artwork,
            Err(ArtError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No saved artwork for {name}, starting empty");
                Artwork::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load {name}, starting empty: {e}");
                Artwork::new()
            }
        }
    }
}

/// Sanitize a document name for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
