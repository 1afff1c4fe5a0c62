//! Canonical serialized representation of an artwork.
//!
//! The runtime [`Artwork`] keeps an id index and normalized angles; this
//! module is the plain persisted shape it converts to and from.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::geometry::{Angle, Point};
use crate::{ArtError, ArtResult, Artwork, Background, ElementId, PlacedElement};

/// Persisted background reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundDocument {
    /// Image URL.
    Url(String),
    /// Base64-encoded image bytes.
    Bytes(String),
}

impl From<&Background> for BackgroundDocument {
    fn from(background: &Background) -> Self {
        match background {
            Background::Url(url) => Self::Url(url.to_string()),
            Background::Bytes(bytes) => {
                Self::Bytes(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
        }
    }
}

impl BackgroundDocument {
    /// Convert document to runtime background.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or the base64 payload is malformed.
    pub fn into_background(self) -> ArtResult<Background> {
        match self {
            Self::Url(raw) => url::Url::parse(&raw)
                .map(Background::Url)
                .map_err(|e| ArtError::Decode(format!("invalid background url {raw:?}: {e}"))),
            Self::Bytes(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map(Background::Bytes)
                .map_err(|e| ArtError::Decode(format!("invalid background bytes: {e}"))),
        }
    }
}

/// Document-friendly element description.
///
/// Older versions of the app wrote the glyph as `text` and the rotation as
/// `rotation`; both are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDocument {
    /// Element identifier.
    pub id: ElementId,
    /// Text content.
    #[serde(alias = "text")]
    pub glyph: String,
    /// Horizontal offset from the canvas centre.
    pub x: f64,
    /// Vertical offset from the canvas centre.
    pub y: f64,
    /// Point size at zoom 1.
    pub size: f64,
    /// Rotation in radians.
    #[serde(default, alias = "rotation")]
    pub rotation_radians: f64,
}

impl From<&PlacedElement> for ElementDocument {
    fn from(element: &PlacedElement) -> Self {
        Self {
            id: element.id(),
            glyph: element.glyph.clone(),
            x: element.x,
            y: element.y,
            size: element.size,
            rotation_radians: element.rotation.radians(),
        }
    }
}

impl ElementDocument {
    /// Convert document to runtime element.
    #[must_use]
    pub fn into_element(self) -> PlacedElement {
        PlacedElement::with_id(
            self.id,
            self.glyph,
            Point::new(self.x, self.y),
            self.size,
            Angle::from_radians(self.rotation_radians),
        )
    }
}

/// Canonical artwork document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtworkDocument {
    /// Background reference, if any.
    #[serde(default)]
    pub background: Option<BackgroundDocument>,
    /// URL background as written by older versions of the app.
    #[serde(
        default,
        rename = "backgroundURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_background_url: Option<String>,
    /// Elements in paint order. Older versions of the app wrote these as
    /// `emojis`.
    #[serde(default, alias = "emojis")]
    pub elements: Vec<ElementDocument>,
}

impl From<&Artwork> for ArtworkDocument {
    fn from(artwork: &Artwork) -> Self {
        Self {
            background: artwork.background().map(BackgroundDocument::from),
            legacy_background_url: None,
            elements: artwork.elements().iter().map(ElementDocument::from).collect(),
        }
    }
}

impl ArtworkDocument {
    /// Build the runtime artwork.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Decode`] if any field is malformed or element ids
    /// are duplicated.
    pub fn into_artwork(self) -> ArtResult<Artwork> {
        let mut artwork = Artwork::new();
        let background = match (self.background, self.legacy_background_url) {
            (Some(doc), _) => Some(doc.into_background()?),
            (None, Some(raw)) => Some(BackgroundDocument::Url(raw).into_background()?),
            (None, None) => None,
        };
        artwork.set_background(background);
        for element_doc in self.elements {
            artwork.insert_element(element_doc.into_element())?;
        }
        Ok(artwork)
    }
}
