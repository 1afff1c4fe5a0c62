//! Placed elements - the glyphs composed onto the canvas.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Angle, Offset, Point};

/// Unique identifier for a placed element.
///
/// Identifiers are assigned once at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A glyph placed on the canvas.
///
/// `x` and `y` are offsets from the canvas centre at zoom 1; `size` is the
/// point size at zoom 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    id: ElementId,
    /// Text content, usually a single emoji.
    pub glyph: String,
    /// Horizontal offset from the canvas centre.
    pub x: f64,
    /// Vertical offset from the canvas centre.
    pub y: f64,
    /// Point size at zoom 1.
    pub size: f64,
    /// Rotation about the element centre.
    pub rotation: Angle,
}

impl PlacedElement {
    /// Create an element with a fresh identity.
    #[must_use]
    pub fn new(glyph: impl Into<String>, location: Point, size: f64) -> Self {
        Self::with_id(ElementId::new(), glyph, location, size, Angle::ZERO)
    }

    /// Rebuild an element with a known identity (used when loading documents).
    #[must_use]
    pub fn with_id(
        id: ElementId,
        glyph: impl Into<String>,
        location: Point,
        size: f64,
        rotation: Angle,
    ) -> Self {
        Self {
            id,
            glyph: glyph.into(),
            x: location.x,
            y: location.y,
            size,
            rotation,
        }
    }

    /// The element's immutable identity.
    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The element's offset from the canvas centre.
    #[must_use]
    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Translate the element.
    pub fn translate(&mut self, by: Offset) {
        self.x += by.dx;
        self.y += by.dy;
    }

    /// Multiply the element's size.
    pub fn scale(&mut self, factor: f64) {
        self.size *= factor;
    }

    /// Add to the element's rotation.
    pub fn rotate(&mut self, by: Angle) {
        self.rotation += by;
    }
}

/// Where the background image comes from.
///
/// The two forms are mutually exclusive: setting one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    /// An image to be fetched from a URL.
    Url(url::Url),
    /// Raw encoded image bytes (e.g. pasted from the clipboard).
    Bytes(Vec<u8>),
}

impl Background {
    /// Build a URL background, normalizing search-result links.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid absolute URL.
    pub fn url(raw: &str) -> Result<Self, url::ParseError> {
        let url = url::Url::parse(raw)?;
        Ok(Self::Url(image_url(url)))
    }

    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::Bytes(bytes) => format!("<{} image bytes>", bytes.len()),
        }
    }
}

/// Extract the image URL embedded in a link.
///
/// Image search results wrap the real image in an `imgurl` query parameter;
/// when present, that URL is returned instead of the link itself.
#[must_use]
pub fn image_url(url: url::Url) -> url::Url {
    let embedded = url
        .query_pairs()
        .find(|(key, _)| key == "imgurl")
        .and_then(|(_, value)| url::Url::parse(&value).ok());
    embedded.unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_elements_get_distinct_ids() {
        let a = PlacedElement::new("😀", Point::ZERO, 40.0);
        let b = PlacedElement::new("😀", Point::ZERO, 40.0);
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_element_mutators() {
        let mut element = PlacedElement::new("🎃", Point::new(1.0, 2.0), 40.0);
        element.translate(Offset::new(10.0, 5.0));
        element.scale(2.0);
        element.rotate(Angle::from_degrees(90.0));
        assert_eq!(element.location(), Point::new(11.0, 7.0));
        assert!((element.size - 80.0).abs() < f64::EPSILON);
        assert!((element.rotation.degrees() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_id_parse_round_trip() {
        let id = ElementId::new();
        let parsed = ElementId::parse(&id.to_string()).expect("should parse");
        assert_eq!(id, parsed);
        assert!(ElementId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_image_url_extracts_embedded_link() {
        let background = Background::url(
            "https://images.example.com/imgres?imgurl=https%3A%2F%2Fcdn.example.com%2Fcat.png&w=10",
        )
        .expect("valid url");
        assert_eq!(
            background,
            Background::Url(url::Url::parse("https://cdn.example.com/cat.png").expect("url"))
        );
    }

    #[test]
    fn test_image_url_keeps_plain_link() {
        let background = Background::url("https://cdn.example.com/dog.jpg").expect("valid url");
        match background {
            Background::Url(url) => assert_eq!(url.as_str(), "https://cdn.example.com/dog.jpg"),
            Background::Bytes(_) => panic!("expected url background"),
        }
    }

    #[test]
    fn test_invalid_background_url() {
        assert!(Background::url("not a url").is_err());
    }
}
