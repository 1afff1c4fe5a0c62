//! The persisted artwork: a background reference and ordered placed elements.

use std::collections::HashMap;

use crate::geometry::Point;
use crate::schema::ArtworkDocument;
use crate::{ArtError, ArtResult, Background, ElementId, PlacedElement};

/// A complete artwork value.
///
/// Element order is paint order. Lookups by id go through an index that is
/// kept in step with the element vector, so the index is never serialized
/// and never compared.
#[derive(Debug, Clone, Default)]
pub struct Artwork {
    background: Option<Background>,
    elements: Vec<PlacedElement>,
    index: HashMap<ElementId, usize>,
}

impl PartialEq for Artwork {
    fn eq(&self, other: &Self) -> bool {
        self.background == other.background && self.elements == other.elements
    }
}

impl Artwork {
    /// Create an empty artwork with no background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The background reference, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Replace the background reference.
    ///
    /// Returns `true` if the reference changed.
    pub fn set_background(&mut self, background: Option<Background>) -> bool {
        if self.background == background {
            return false;
        }
        self.background = background;
        true
    }

    /// All elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[PlacedElement] {
        &self.elements
    }

    /// Ids of all elements in paint order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(PlacedElement::id)
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&PlacedElement> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    /// Whether an element with this ID exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the artwork has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append a new element with a fresh identity.
    pub fn add_element(
        &mut self,
        glyph: impl Into<String>,
        location: Point,
        size: f64,
    ) -> ElementId {
        let element = PlacedElement::new(glyph, location, size);
        let id = element.id();
        self.push(element);
        id
    }

    /// Append an existing element.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Decode`] if an element with the same ID is already
    /// present.
    pub fn insert_element(&mut self, element: PlacedElement) -> ArtResult<()> {
        if self.contains(element.id()) {
            return Err(ArtError::Decode(format!(
                "duplicate element id {}",
                element.id()
            )));
        }
        self.push(element);
        Ok(())
    }

    fn push(&mut self, element: PlacedElement) {
        self.index.insert(element.id(), self.elements.len());
        self.elements.push(element);
    }

    /// Remove an element. No-op returning `None` if absent.
    pub fn remove_element(&mut self, id: ElementId) -> Option<PlacedElement> {
        let position = self.index.remove(&id)?;
        let removed = self.elements.remove(position);
        for (i, element) in self.elements.iter().enumerate().skip(position) {
            self.index.insert(element.id(), i);
        }
        Some(removed)
    }

    /// Mutate an element in place.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::ElementNotFound`] if the element does not exist;
    /// the artwork is left unchanged.
    pub fn update_element<F>(&mut self, id: ElementId, f: F) -> ArtResult<()>
    where
        F: FnOnce(&mut PlacedElement),
    {
        let position = *self.index.get(&id).ok_or(ArtError::ElementNotFound(id))?;
        f(&mut self.elements[position]);
        Ok(())
    }

    /// Encode the artwork to its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> ArtResult<Vec<u8>> {
        Ok(serde_json::to_vec(&ArtworkDocument::from(self))?)
    }

    /// Decode an artwork from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Decode`] if the bytes are malformed.
    pub fn decode(bytes: &[u8]) -> ArtResult<Self> {
        let document: ArtworkDocument =
            serde_json::from_slice(bytes).map_err(|e| ArtError::Decode(e.to_string()))?;
        document.into_artwork()
    }

    /// Decode an artwork, falling back to an empty one on malformed input.
    ///
    /// Used for the first load of a document, where a missing or corrupt
    /// record simply means starting fresh.
    #[must_use]
    pub fn decode_or_empty(bytes: &[u8]) -> Self {
        Self::decode(bytes).unwrap_or_else(|e| {
            tracing::warn!("Starting with an empty artwork: {e}");
            Self::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Angle, Offset};

    #[test]
    fn test_add_and_lookup() {
        let mut artwork = Artwork::new();
        assert!(artwork.is_empty());

        let id = artwork.add_element("😀", Point::new(0.0, 0.0), 40.0);
        assert_eq!(artwork.len(), 1);
        let element = artwork.element(id).expect("element exists");
        assert_eq!(element.glyph, "😀");
        assert!((element.size - 40.0).abs() < f64::EPSILON);
        assert_eq!(element.location(), Point::ZERO);
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut artwork = Artwork::new();
        let a = artwork.add_element("a", Point::ZERO, 10.0);
        let b = artwork.add_element("b", Point::ZERO, 10.0);
        let c = artwork.add_element("c", Point::ZERO, 10.0);

        let removed = artwork.remove_element(a).expect("should remove");
        assert_eq!(removed.glyph, "a");
        assert!(artwork.remove_element(a).is_none());

        assert_eq!(artwork.element(b).map(|e| e.glyph.as_str()), Some("b"));
        assert_eq!(artwork.element(c).map(|e| e.glyph.as_str()), Some("c"));
        assert_eq!(artwork.ids().collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn test_update_missing_element_fails() {
        let mut artwork = Artwork::new();
        let result = artwork.update_element(ElementId::new(), |e| e.scale(2.0));
        assert!(matches!(result, Err(ArtError::ElementNotFound(_))));
    }

    #[test]
    fn test_update_element() {
        let mut artwork = Artwork::new();
        let id = artwork.add_element("🦇", Point::new(5.0, 5.0), 20.0);
        artwork
            .update_element(id, |e| {
                e.translate(Offset::new(1.0, 1.0));
                e.rotate(Angle::from_degrees(45.0));
            })
            .expect("should update");
        let element = artwork.element(id).expect("exists");
        assert_eq!(element.location(), Point::new(6.0, 6.0));
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut artwork = Artwork::new();
        let id = artwork.add_element("👻", Point::ZERO, 10.0);
        let duplicate = artwork.element(id).cloned().expect("exists");
        assert!(matches!(
            artwork.insert_element(duplicate),
            Err(ArtError::Decode(_))
        ));
        assert_eq!(artwork.len(), 1);
    }

    #[test]
    fn test_set_background_replaces_other_form() {
        let mut artwork = Artwork::new();
        let url = Background::url("https://example.com/a.png").expect("url");
        assert!(artwork.set_background(Some(url.clone())));
        assert!(!artwork.set_background(Some(url)));
        assert!(artwork.set_background(Some(Background::Bytes(vec![1, 2, 3]))));
        assert_eq!(artwork.background(), Some(&Background::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let mut artwork = Artwork::new();
        artwork.set_background(Some(Background::Bytes(vec![0x89, 0x50, 0x4E, 0x47])));
        artwork.add_element("💀", Point::new(-12.5, 3.25), 64.0);
        artwork.add_element("🤖", Point::new(100.0, -40.0), 12.0);

        let bytes = artwork.encode().expect("encode");
        let decoded = Artwork::decode(&bytes).expect("decode");
        assert_eq!(decoded, artwork);
        let last = decoded.elements()[1].id();
        assert!(decoded.element(last).is_some());
    }

    #[test]
    fn test_decode_malformed_reports_error() {
        assert!(matches!(
            Artwork::decode(b"{not json"),
            Err(ArtError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_or_empty_tolerates_garbage() {
        let artwork = Artwork::decode_or_empty(b"\x00\x01garbage");
        assert!(artwork.is_empty());
        assert!(artwork.background().is_none());
    }
}
