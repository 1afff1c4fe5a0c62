//! # Emoji Art Core
//!
//! Document state engine for composing emoji glyphs over a background image.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 ArtDocument                 │
//! ├─────────────────────────────────────────────┤
//! │  Artwork         │  Undo History            │
//! │  - Elements      │  - Snapshot records      │
//! │  - Background    │  - Groups                │
//! │  Selection       │  Image Fetcher           │
//! ├─────────────────────────────────────────────┤
//! │  Compositor      │  Stores                  │
//! │  - Pan/zoom      │  - Artwork JSON files    │
//! │  - Gestures      │  - Palettes              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Hosts drive the document through intents, subscribe to its events and ask
//! the [`Compositor`] where to draw each element.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod artwork;
pub mod compositor;
pub mod document;
pub mod element;
pub mod error;
pub mod fetch;
pub mod geometry;
pub mod history;
pub mod palette;
pub mod schema;
pub mod selection;
pub mod store;

pub use artwork::Artwork;
pub use compositor::{Compositor, GestureState, Placement, ViewTransform};
pub use document::{
    ArtDocument, DocumentConfig, DocumentEvent, DocumentSnapshot, GroupFlags, Listener,
    SubscriptionId,
};
pub use element::{image_url, Background, ElementId, PlacedElement};
pub use error::{ArtError, ArtResult};
pub use fetch::{
    BackgroundImage, FetchCompletion, FetchError, FetchToken, ImageDecoder, ImageFetcher,
    NetworkFetch,
};
pub use geometry::{Angle, Offset, Point, Size};
pub use history::{UndoGroup, UndoHistory, UndoRecord};
pub use palette::{Palette, PaletteStore};
pub use schema::{ArtworkDocument, BackgroundDocument, ElementDocument};
pub use selection::Selection;
pub use store::ArtworkStore;

/// Emoji Art core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
