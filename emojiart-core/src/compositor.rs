//! On-canvas placement of elements.
//!
//! The compositor combines two transforms: the steady view transform that
//! persists between gestures, and the transient gesture state that only
//! exists while a gesture is in progress. Neither touches the document until
//! a gesture ends, at which point the delta is committed through a document
//! intent and the transient state resets to identity.
//!
//! Gesture inputs are screen-space values as reported by the host's gesture
//! recognizers.

use crate::geometry::{Angle, Offset, Point, Size};
use crate::{ArtDocument, PlacedElement, Selection};

/// The committed pan, zoom and rotation of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Pan in canvas units.
    pub pan: Offset,
    /// Zoom factor.
    pub zoom: f64,
    /// Rotation of the whole canvas about its origin.
    pub rotation: Angle,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Offset::ZERO,
            zoom: 1.0,
            rotation: Angle::ZERO,
        }
    }
}

/// In-flight gesture deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    /// Canvas pan in canvas units.
    pub pan: Offset,
    /// Canvas zoom multiplier, used while nothing is selected.
    pub zoom: f64,
    /// Canvas rotation, used while nothing is selected.
    pub view_rotation: Angle,
    /// Drag applied to selected elements, in canvas units.
    pub selection_drag: Offset,
    /// Size multiplier for selected elements.
    pub font_scale: f64,
    /// Rotation added to selected elements.
    pub group_rotation: Angle,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            pan: Offset::ZERO,
            zoom: 1.0,
            view_rotation: Angle::ZERO,
            selection_drag: Offset::ZERO,
            font_scale: 1.0,
            group_rotation: Angle::ZERO,
        }
    }
}

/// Where and how to draw one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Centre of the glyph in viewport coordinates.
    pub center: Point,
    /// Font size in screen points.
    pub font_size: f64,
    /// Rotation about the glyph centre.
    pub rotation: Angle,
}

/// Maps canvas elements into a viewport.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    steady: ViewTransform,
    gesture: GestureState,
    viewport: Size,
}

impl Compositor {
    /// Create a compositor for a viewport.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Restore a saved steady transform.
    #[must_use]
    pub fn with_steady(mut self, steady: ViewTransform) -> Self {
        self.steady = steady;
        self
    }

    /// The viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// The committed transform.
    #[must_use]
    pub fn steady(&self) -> ViewTransform {
        self.steady
    }

    /// The in-flight gesture state.
    #[must_use]
    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    /// Steady zoom times gesture zoom.
    #[must_use]
    pub fn effective_zoom(&self) -> f64 {
        self.steady.zoom * self.gesture.zoom
    }

    /// Steady plus gesture pan, in screen units.
    #[must_use]
    pub fn effective_pan(&self) -> Offset {
        (self.steady.pan + self.gesture.pan) * self.effective_zoom()
    }

    /// Steady plus gesture canvas rotation.
    #[must_use]
    pub fn effective_rotation(&self) -> Angle {
        self.steady.rotation + self.gesture.view_rotation
    }

    /// Compute where to draw `element`.
    #[must_use]
    pub fn placement(&self, element: &PlacedElement, selection: &Selection) -> Placement {
        let zoom = self.effective_zoom();
        let view_rotation = self.effective_rotation();
        let mut offset = element.location().to_offset().rotated(view_rotation) * zoom;
        let mut font_size = element.size * zoom;
        let mut rotation = element.rotation + view_rotation;

        if selection.contains(element.id()) {
            offset += self.gesture.selection_drag * zoom;
            font_size *= self.gesture.font_scale;
            rotation += self.gesture.group_rotation;
        }

        Placement {
            center: self.viewport.center() + offset + self.effective_pan(),
            font_size,
            rotation,
        }
    }

    /// Placements of every element in paint order.
    #[must_use]
    pub fn placements(&self, document: &ArtDocument) -> Vec<(PlacedElement, Placement)> {
        document
            .elements()
            .iter()
            .map(|element| {
                (
                    element.clone(),
                    self.placement(element, document.selection()),
                )
            })
            .collect()
    }

    /// Convert a viewport location to canvas coordinates, e.g. for drops.
    #[must_use]
    pub fn screen_to_canvas(&self, point: Point) -> Point {
        let offset = (point - self.viewport.center() - self.effective_pan()) / self.effective_zoom();
        let offset = offset.rotated(-self.effective_rotation());
        Point::new(offset.dx, offset.dy)
    }

    fn screen_to_canvas_delta(&self, translation: Offset) -> Offset {
        translation / self.effective_zoom()
    }

    // --- canvas pan ---

    /// Track a canvas pan gesture.
    pub fn update_pan(&mut self, translation: Offset) {
        self.gesture.pan = self.screen_to_canvas_delta(translation);
    }

    /// Commit a canvas pan gesture.
    pub fn end_pan(&mut self, translation: Offset) {
        let delta = self.screen_to_canvas_delta(translation);
        self.steady.pan += delta;
        self.gesture.pan = Offset::ZERO;
    }

    // --- selection drag ---

    /// Track a drag of the selected elements.
    pub fn update_selection_drag(&mut self, translation: Offset) {
        self.gesture.selection_drag = self.screen_to_canvas_delta(translation);
    }

    /// Commit a drag of the selected elements, then clear the selection.
    pub fn end_selection_drag(&mut self, translation: Offset, document: &mut ArtDocument) {
        let delta = self
            .screen_to_canvas_delta(translation)
            .rotated(-self.effective_rotation());
        self.gesture.selection_drag = Offset::ZERO;
        document.move_selected_elements(delta);
        document.clear_selection();
    }

    // --- pinch ---

    /// Track a pinch: scales the selection if there is one, otherwise the
    /// canvas.
    pub fn update_pinch(&mut self, scale: f64, selection: &Selection) {
        if !is_usable_scale(scale) {
            return;
        }
        if selection.is_empty() {
            self.gesture.zoom = scale;
        } else {
            self.gesture.font_scale = scale;
        }
    }

    /// Commit a pinch.
    pub fn end_pinch(&mut self, scale: f64, document: &mut ArtDocument) {
        self.gesture.zoom = 1.0;
        self.gesture.font_scale = 1.0;
        if !is_usable_scale(scale) {
            tracing::debug!("Ignoring pinch with scale {scale}");
            return;
        }
        if document.selection().is_empty() {
            self.steady.zoom *= scale;
        } else {
            document.scale_selected_elements(scale);
        }
    }

    // --- rotation ---

    /// Track a rotation: rotates the selection if there is one, otherwise
    /// the canvas.
    pub fn update_rotation(&mut self, angle: Angle, selection: &Selection) {
        if selection.is_empty() {
            self.gesture.view_rotation = angle;
        } else {
            self.gesture.group_rotation = angle;
        }
    }

    /// Commit a rotation.
    pub fn end_rotation(&mut self, angle: Angle, document: &mut ArtDocument) {
        self.gesture.view_rotation = Angle::ZERO;
        self.gesture.group_rotation = Angle::ZERO;
        if document.selection().is_empty() {
            self.steady.rotation += angle;
        } else {
            document.rotate_selected_elements(angle);
        }
    }

    /// Abandon the in-flight gesture without committing anything.
    pub fn cancel_gesture(&mut self) {
        self.gesture = GestureState::default();
    }

    // --- fitting ---

    /// Zoom so an image of `image` size fits the viewport, and reset pan.
    ///
    /// Returns `false` and changes nothing if either size is degenerate.
    pub fn zoom_to_fit(&mut self, image: Size) -> bool {
        if !image.is_positive() || !self.viewport.is_positive() {
            return false;
        }
        let horizontal = self.viewport.width / image.width;
        let vertical = self.viewport.height / image.height;
        self.steady.pan = Offset::ZERO;
        self.steady.zoom = horizontal.min(vertical);
        true
    }

    /// Fit a freshly loaded background unless the user has zoomed away
    /// from the default.
    #[allow(clippy::float_cmp)]
    pub fn on_background_loaded(&mut self, image: Size) -> bool {
        if self.steady.zoom != 1.0 {
            return false;
        }
        self.zoom_to_fit(image)
    }
}

fn is_usable_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}
