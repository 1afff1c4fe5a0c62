//! The undoable document: artwork, selection, undo history and the
//! background fetch, mutated only through intents.
//!
//! Every intent follows the same protocol: snapshot the state, apply the
//! change, and register a record that restores the snapshot. Undo and redo
//! restore snapshots through that same path, so they register their own
//! inverse records and the history stays symmetric.
//!
//! ```no_run
//! use emojiart_core::{ArtDocument, Offset, Point};
//!
//! let mut document = ArtDocument::new("Untitled");
//! let id = document.add_element("😀", Point::ZERO, 40.0);
//! document.toggle_selection(id);
//! document.move_selected_elements(Offset::new(10.0, 5.0));
//! document.undo().expect("move is undoable");
//! ```

use crate::fetch::{BackgroundImage, FetchCompletion, FetchToken, ImageFetcher};
use crate::geometry::{Angle, Offset, Point};
use crate::history::{UndoHistory, UndoRecord};
use crate::{
    ArtError, ArtResult, Artwork, ArtworkStore, Background, ElementId, PlacedElement, Selection,
};

/// Tunables for a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentConfig {
    /// Point size given to glyphs added without an explicit size.
    pub default_element_size: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            default_element_size: 40.0,
        }
    }
}

/// State captured by an undo record.
///
/// Artwork and selection are snapshotted together so a restore never leaves
/// a selected id without its element.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// The artwork before the step.
    pub artwork: Artwork,
    /// The selection before the step.
    pub selection: Selection,
}

/// How an intent interacts with undo grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupFlags {
    /// Open a group before registering, unless one is already open.
    pub start_group_if_not_in_group: bool,
    /// Close the open group after registering.
    pub end_group_if_in_group: bool,
}

impl GroupFlags {
    /// No group transition.
    pub const NONE: Self = Self {
        start_group_if_not_in_group: false,
        end_group_if_in_group: false,
    };

    /// Start a group.
    pub const START: Self = Self {
        start_group_if_not_in_group: true,
        end_group_if_in_group: false,
    };

    /// End the open group.
    pub const END: Self = Self {
        start_group_if_not_in_group: false,
        end_group_if_in_group: true,
    };
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Elements or the background reference changed.
    ArtworkChanged,
    /// The selection changed.
    SelectionChanged,
    /// The background image was cleared or resolved.
    BackgroundChanged {
        /// A fetch is outstanding.
        loading: bool,
    },
    /// Undo availability may have changed.
    HistoryChanged {
        /// An undo step is available.
        can_undo: bool,
        /// A redo step is available.
        can_redo: bool,
    },
}

/// Handle returned by [`ArtDocument::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked for every document event.
pub type Listener = Box<dyn Fn(&DocumentEvent) + Send + Sync>;

/// An emoji art document.
pub struct ArtDocument {
    name: String,
    config: DocumentConfig,
    artwork: Artwork,
    selection: Selection,
    history: UndoHistory<DocumentSnapshot>,
    fetcher: Option<ImageFetcher>,
    pending_fetch: Option<FetchToken>,
    background_image: Option<BackgroundImage>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    store: Option<ArtworkStore>,
}

impl std::fmt::Debug for ArtDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtDocument")
            .field("name", &self.name)
            .field("elements", &self.artwork.len())
            .field("selected", &self.selection.len())
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("pending_fetch", &self.pending_fetch)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Default for ArtDocument {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl ArtDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_artwork(name, Artwork::new())
    }

    /// Create a document over an existing artwork with an empty history.
    #[must_use]
    pub fn from_artwork(name: impl Into<String>, artwork: Artwork) -> Self {
        Self {
            name: name.into(),
            config: DocumentConfig::default(),
            artwork,
            selection: Selection::new(),
            history: UndoHistory::new(),
            fetcher: None,
            pending_fetch: None,
            background_image: None,
            listeners: Vec::new(),
            next_subscription: 0,
            store: None,
        }
    }

    /// Open a named document from a store.
    ///
    /// A missing or unreadable record starts an empty document. The store
    /// stays bound, so every later change is saved back to it.
    #[must_use]
    pub fn open(name: impl Into<String>, store: ArtworkStore) -> Self {
        let name = name.into();
        let artwork = store.load_or_empty(&name);
        tracing::info!(
            "Opened {name} with {} elements from {}",
            artwork.len(),
            store.data_dir().display()
        );
        let mut document = Self::from_artwork(name, artwork);
        document.store = Some(store);
        document
    }

    /// Replace the tunables.
    #[must_use]
    pub fn with_config(mut self, config: DocumentConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach the fetcher that resolves background images.
    ///
    /// Starts fetching immediately if the artwork has a background.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: ImageFetcher) -> Self {
        self.fetcher = Some(fetcher);
        if self.artwork.background().is_some() {
            self.refresh_background();
        }
        self
    }

    /// Save every subsequent change to `store`.
    pub fn bind_store(&mut self, store: ArtworkStore) {
        self.store = Some(store);
    }

    /// Write the artwork to the bound store.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> ArtResult<()> {
        match &self.store {
            Some(store) => store.save(&self.name, &self.artwork),
            None => {
                tracing::debug!("{} has no store bound, not saving", self.name);
                Ok(())
            }
        }
    }

    /// Document name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tunables.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The artwork.
    #[must_use]
    pub fn artwork(&self) -> &Artwork {
        &self.artwork
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[PlacedElement] {
        self.artwork.elements()
    }

    /// The selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The background reference.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.artwork.background()
    }

    /// The resolved background image, if loaded.
    #[must_use]
    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    /// Whether a background fetch is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending_fetch.is_some()
    }

    /// Encode the artwork in its persisted form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> ArtResult<Vec<u8>> {
        self.artwork.encode()
    }

    // --- subscriptions ---

    /// Register a listener for document events.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&DocumentEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn emit(&self, event: DocumentEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    fn notify_history(&self) {
        self.emit(DocumentEvent::HistoryChanged {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        });
    }

    // --- undo protocol ---

    /// Apply `change` as one undoable step.
    ///
    /// Returns `true` if the state changed. A change that leaves the state
    /// as it was registers nothing and leaves no group open behind it; an
    /// end flag still closes the open group.
    fn perform<F>(&mut self, label: &str, flags: GroupFlags, change: F) -> bool
    where
        F: FnOnce(&mut Artwork, &mut Selection),
    {
        let opens_group = flags.start_group_if_not_in_group && !self.history.is_group_open();
        if opens_group {
            self.history.begin_group();
        }
        let prior = self.snapshot();
        change(&mut self.artwork, &mut self.selection);
        self.prune_selection();
        let changed = self.commit(label, prior);
        if flags.end_group_if_in_group || (opens_group && !changed) {
            self.history.end_group();
        }
        if changed {
            self.notify_history();
        }
        changed
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            artwork: self.artwork.clone(),
            selection: self.selection.clone(),
        }
    }

    fn prune_selection(&mut self) {
        let artwork = &self.artwork;
        self.selection.retain(|id| artwork.contains(id));
    }

    /// Register a record restoring `prior` if the state moved away from it.
    fn commit(&mut self, label: &str, prior: DocumentSnapshot) -> bool {
        let artwork_changed = prior.artwork != self.artwork;
        let selection_changed = prior.selection != self.selection;
        if !artwork_changed && !selection_changed {
            return false;
        }
        let background_changed = prior.artwork.background() != self.artwork.background();
        self.history.register(UndoRecord::new(label, prior));

        if artwork_changed {
            self.emit(DocumentEvent::ArtworkChanged);
            self.autosave();
        }
        if selection_changed {
            self.emit(DocumentEvent::SelectionChanged);
        }
        if background_changed {
            self.refresh_background();
        }
        true
    }

    fn restore(&mut self, record: UndoRecord<DocumentSnapshot>) {
        let UndoRecord { label, snapshot } = record;
        let prior = self.snapshot();
        self.artwork = snapshot.artwork;
        self.selection = snapshot.selection;
        self.prune_selection();
        self.commit(&label, prior);
    }

    fn autosave(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.name, &self.artwork) {
                tracing::warn!("Failed to save {}: {e}", self.name);
            }
        }
    }

    /// Undo the most recent step.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NothingToUndo`] if the history is empty.
    pub fn undo(&mut self) -> ArtResult<()> {
        let group = self.history.begin_undo().ok_or(ArtError::NothingToUndo)?;
        tracing::debug!("Undo {}", group.label());
        for record in group.into_records().into_iter().rev() {
            self.restore(record);
        }
        self.history.finish();
        self.notify_history();
        Ok(())
    }

    /// Redo the most recently undone step.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NothingToRedo`] if there is nothing to redo.
    pub fn redo(&mut self) -> ArtResult<()> {
        let group = self.history.begin_redo().ok_or(ArtError::NothingToRedo)?;
        tracing::debug!("Redo {}", group.label());
        for record in group.into_records().into_iter().rev() {
            self.restore(record);
        }
        self.history.finish();
        self.notify_history();
        Ok(())
    }

    /// Whether [`ArtDocument::undo`] would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`ArtDocument::redo`] would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Label of the next undo step, e.g. "Move".
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    /// Label of the next redo step.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    // --- background ---

    fn refresh_background(&mut self) {
        self.background_image = None;
        match (self.artwork.background(), self.fetcher.as_mut()) {
            (Some(background), Some(fetcher)) => {
                tracing::info!("Fetching background {}", background.describe());
                self.pending_fetch = Some(fetcher.resolve(background));
            }
            (Some(background), None) => {
                tracing::debug!(
                    "No fetcher attached, leaving {} unresolved",
                    background.describe()
                );
                self.pending_fetch = None;
            }
            (None, fetcher) => {
                if let Some(fetcher) = fetcher {
                    fetcher.cancel();
                }
                self.pending_fetch = None;
            }
        }
        self.emit(DocumentEvent::BackgroundChanged {
            loading: self.is_loading(),
        });
    }

    /// Apply any fetch completions that have already arrived.
    ///
    /// Returns `true` if the current fetch resolved.
    pub fn poll_background(&mut self) -> bool {
        let mut resolved = false;
        while let Some(completion) = self.fetcher.as_mut().and_then(ImageFetcher::try_next) {
            resolved |= self.apply_completion(completion);
        }
        resolved
    }

    /// Wait until the current background fetch resolves.
    ///
    /// Returns immediately if nothing is loading.
    pub async fn settle_background(&mut self) {
        while self.pending_fetch.is_some() {
            let completion = match self.fetcher.as_mut() {
                Some(fetcher) => fetcher.next().await,
                None => None,
            };
            match completion {
                Some(completion) => {
                    self.apply_completion(completion);
                }
                None => {
                    tracing::debug!("Background fetch vanished, clearing loading state");
                    self.pending_fetch = None;
                    self.emit(DocumentEvent::BackgroundChanged { loading: false });
                }
            }
        }
    }

    fn apply_completion(&mut self, completion: FetchCompletion) -> bool {
        let token = &completion.token;
        let current = self.pending_fetch.as_ref() == Some(token)
            && self.artwork.background() == Some(token.source());
        if !current {
            tracing::debug!(
                generation = token.generation(),
                "Dropping stale background for {}",
                token.source().describe()
            );
            return false;
        }
        match &completion.image {
            Some(image) => tracing::info!(
                "Background loaded ({}x{})",
                image.width(),
                image.height()
            ),
            None => tracing::info!("Background unavailable"),
        }
        self.pending_fetch = None;
        self.background_image = completion.image;
        self.emit(DocumentEvent::BackgroundChanged { loading: false });
        true
    }

    // --- intents ---

    /// Deselect everything and close any open undo group.
    pub fn clear_selection(&mut self) {
        self.perform("Clear Selection", GroupFlags::END, |_, selection| {
            selection.clear();
        });
    }

    /// Select every element and open an undo group.
    pub fn select_all(&mut self) {
        self.perform("Select All", GroupFlags::START, |artwork, selection| {
            selection.select_all(artwork.ids());
        });
    }

    /// Toggle an element's selection.
    ///
    /// Selecting into an empty selection opens an undo group; deselecting
    /// the last selected element closes it. Returns whether the element is
    /// selected afterwards.
    pub fn toggle_selection(&mut self, id: ElementId) -> bool {
        if !self.artwork.contains(id) {
            tracing::debug!("Skipping selection of unknown element {id}");
            return false;
        }
        let selected = self.selection.contains(id);
        let flags = GroupFlags {
            start_group_if_not_in_group: self.selection.is_empty(),
            end_group_if_in_group: selected && self.selection.len() == 1,
        };
        let label = if selected { "Deselect" } else { "Select" };
        self.perform(label, flags, |_, selection| {
            selection.toggle(id);
        });
        self.selection.contains(id)
    }

    /// Replace the background reference.
    ///
    /// Clears the loaded image and starts a new fetch when the reference
    /// changes. Returns whether it changed.
    pub fn set_background(&mut self, background: Option<Background>) -> bool {
        if let Some(background) = &background {
            tracing::info!("Setting background {}", background.describe());
        }
        self.perform("Set Background", GroupFlags::NONE, |artwork, _| {
            artwork.set_background(background);
        })
    }

    /// Set a URL background, extracting embedded image links.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidUrl`] if `raw` is not an absolute URL; the
    /// document is left unchanged.
    pub fn set_background_url(&mut self, raw: &str) -> ArtResult<bool> {
        let background = Background::url(raw)?;
        Ok(self.set_background(Some(background)))
    }

    /// Set a background from raw image bytes.
    pub fn set_background_bytes(&mut self, bytes: Vec<u8>) -> bool {
        self.set_background(Some(Background::Bytes(bytes)))
    }

    /// Add a glyph and return its id.
    pub fn add_element(
        &mut self,
        glyph: impl Into<String>,
        location: Point,
        size: f64,
    ) -> ElementId {
        let element = PlacedElement::new(glyph, location, size);
        let id = element.id();
        self.perform("Add", GroupFlags::NONE, |artwork, _| {
            if let Err(e) = artwork.insert_element(element) {
                tracing::warn!("Failed to add element: {e}");
            }
        });
        id
    }

    /// Add a glyph at the configured default size.
    pub fn add_element_at(&mut self, glyph: impl Into<String>, location: Point) -> ElementId {
        self.add_element(glyph, location, self.config.default_element_size)
    }

    /// Delete every selected element as one undo step.
    ///
    /// The selection empties, so any open undo group is closed. Returns the
    /// number of elements deleted.
    pub fn delete_selected_elements(&mut self) -> usize {
        let doomed = self.selected_ids();
        if doomed.is_empty() {
            return 0;
        }
        self.perform("Delete", GroupFlags::END, |artwork, _| {
            for &id in &doomed {
                artwork.remove_element(id);
            }
        });
        doomed.len()
    }

    /// Move every selected element.
    pub fn move_selected_elements(&mut self, by: Offset) {
        let ids = self.selected_ids();
        self.update_each("Move", &ids, |element| element.translate(by));
    }

    /// Move one element.
    pub fn move_element(&mut self, id: ElementId, by: Offset) {
        self.update_each("Move", &[id], |element| element.translate(by));
    }

    /// Scale every selected element's size by `factor`.
    pub fn scale_selected_elements(&mut self, factor: f64) {
        let ids = self.selected_ids();
        self.update_each("Scale", &ids, |element| element.scale(factor));
    }

    /// Scale one element's size by `factor`.
    pub fn scale_element(&mut self, id: ElementId, factor: f64) {
        self.update_each("Scale", &[id], |element| element.scale(factor));
    }

    /// Rotate every selected element about its own centre.
    pub fn rotate_selected_elements(&mut self, by: Angle) {
        let ids = self.selected_ids();
        self.update_each("Rotate", &ids, |element| element.rotate(by));
    }

    /// Rotate one element about its own centre.
    pub fn rotate_element(&mut self, id: ElementId, by: Angle) {
        self.update_each("Rotate", &[id], |element| element.rotate(by));
    }

    /// Replace the artwork with a decoded one, as one undo step.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Decode`] if `bytes` are malformed; the document is
    /// left unchanged.
    pub fn import(&mut self, bytes: &[u8]) -> ArtResult<()> {
        let imported = Artwork::decode(bytes)?;
        tracing::info!("Importing {} elements into {}", imported.len(), self.name);
        self.perform("Import", GroupFlags::NONE, |artwork, _| {
            *artwork = imported;
        });
        Ok(())
    }

    /// Selected ids in paint order.
    fn selected_ids(&self) -> Vec<ElementId> {
        self.artwork
            .ids()
            .filter(|&id| self.selection.contains(id))
            .collect()
    }

    fn update_each<F>(&mut self, label: &str, ids: &[ElementId], mutate: F)
    where
        F: Fn(&mut PlacedElement),
    {
        self.perform(label, GroupFlags::NONE, |artwork, _| {
            for &id in ids {
                if let Err(e) = artwork.update_element(id, &mutate) {
                    tracing::debug!("Skipping {label}: {e}");
                }
            }
        });
    }
}
