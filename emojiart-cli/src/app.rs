//! Command execution against an opened document.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use emojiart_core::{
    Angle, ArtDocument, ArtworkStore, Background, Compositor, ElementId, Offset, PaletteStore,
    Point,
};
use tokio::runtime::Handle;

use crate::{CliConfig, Command};

/// The emojiart application.
///
/// Owns the document, the compositor that places its elements in the
/// configured viewport, and the palettes.
pub struct EmojiArtApp {
    config: CliConfig,
    document: ArtDocument,
    compositor: Compositor,
    palettes: PaletteStore,
}

impl EmojiArtApp {
    /// Open the configured document, attaching a background fetcher on
    /// `runtime` unless fetching is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory can't be created or the HTTP
    /// client can't be built.
    pub fn open(config: CliConfig, runtime: Handle) -> Result<Self> {
        let store = ArtworkStore::with_data_dir(&config.data_dir).with_context(|| {
            format!("Failed to open data directory {}", config.data_dir.display())
        })?;
        let mut document = ArtDocument::open(config.document.clone(), store);
        if config.fetch_backgrounds {
            let fetcher = emojiart_fetch::default_fetcher(runtime)?;
            document = document.with_fetcher(fetcher);
        }
        let compositor = Compositor::new(config.viewport);

        Ok(Self {
            config,
            document,
            compositor,
            palettes: PaletteStore::new(),
        })
    }

    /// The document being edited.
    #[must_use]
    pub fn document(&self) -> &ArtDocument {
        &self.document
    }

    /// Run the configured command and wait for the background to resolve.
    ///
    /// Returns the text to print.
    ///
    /// # Errors
    ///
    /// Returns an error if the command's input is invalid or a file can't be
    /// read or written.
    pub async fn run(&mut self) -> Result<String> {
        let command = self.config.command.clone();
        // Fit to the background before a drop so the location maps correctly
        if matches!(command, Command::Drop { .. }) {
            self.settle_background().await;
        }
        let output = self.apply(command)?;
        self.settle_background().await;
        Ok(match output {
            Some(output) => output,
            None => self.summary()?,
        })
    }

    async fn settle_background(&mut self) {
        self.document.settle_background().await;
        if let Some(image) = self.document.background_image() {
            self.compositor.on_background_loaded(image.size());
        }
    }

    fn apply(&mut self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Show => {}
            Command::Add { glyph, x, y, size } => {
                let size = size.unwrap_or(self.document.config().default_element_size);
                self.document.add_element(glyph, Point::new(x, y), size);
            }
            Command::Drop {
                glyph,
                screen_x,
                screen_y,
            } => {
                let location = self
                    .compositor
                    .screen_to_canvas(Point::new(screen_x, screen_y));
                self.document.add_element_at(glyph, location);
            }
            Command::Background { url, file, clear } => {
                if clear {
                    self.document.set_background(None);
                } else if let Some(path) = file {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    self.document.set_background_bytes(bytes);
                } else if let Some(url) = url {
                    self.document.set_background_url(&url)?;
                } else {
                    bail!("Specify a URL, --file or --clear");
                }
            }
            Command::Move { dx, dy, element } => {
                let by = Offset::new(dx, dy);
                match self.target(element)? {
                    Some(id) => self.document.move_element(id, by),
                    None => self.with_everything_selected(|d| d.move_selected_elements(by)),
                }
            }
            Command::Scale { factor, element } => {
                if !(factor.is_finite() && factor > 0.0) {
                    bail!("Scale factor must be positive, got {factor}");
                }
                match self.target(element)? {
                    Some(id) => self.document.scale_element(id, factor),
                    None => self.with_everything_selected(|d| d.scale_selected_elements(factor)),
                }
            }
            Command::Rotate { degrees, element } => {
                let by = Angle::from_degrees(degrees);
                match self.target(element)? {
                    Some(id) => self.document.rotate_element(id, by),
                    None => self.with_everything_selected(|d| d.rotate_selected_elements(by)),
                }
            }
            Command::Delete { element } => {
                if let Some(id) = self.target(element)? {
                    self.document.toggle_selection(id);
                } else {
                    self.document.select_all();
                }
                let deleted = self.document.delete_selected_elements();
                tracing::info!("Deleted {deleted} elements");
            }
            Command::Import { path } => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                self.document
                    .import(&bytes)
                    .with_context(|| format!("Failed to import {}", path.display()))?;
            }
            Command::Export { path } => {
                let bytes = self.document.encode()?;
                match path {
                    Some(path) => {
                        std::fs::write(&path, &bytes)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        tracing::info!("Exported {} to {}", self.document.name(), path.display());
                    }
                    None => return Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
                }
            }
            Command::Palettes { name } => return self.describe_palettes(name.as_deref()).map(Some),
        }
        Ok(None)
    }

    /// Resolve an element index to its id.
    fn target(&self, index: Option<usize>) -> Result<Option<ElementId>> {
        let Some(index) = index else {
            return Ok(None);
        };
        match self.document.elements().get(index) {
            Some(element) => Ok(Some(element.id())),
            None => bail!(
                "No element at index {index} ({} elements)",
                self.document.elements().len()
            ),
        }
    }

    fn with_everything_selected(&mut self, f: impl FnOnce(&mut ArtDocument)) {
        self.document.select_all();
        f(&mut self.document);
        self.document.clear_selection();
    }

    fn describe_palettes(&self, name: Option<&str>) -> Result<String> {
        let mut out = String::new();
        match name {
            Some(name) => {
                let Some(palette) = self.palettes.palette(name) else {
                    bail!(emojiart_core::ArtError::PaletteNotFound(name.to_string()));
                };
                writeln!(out, "{}: {}", palette.name, palette.glyphs.concat())?;
                if let Some(next) = self.palettes.palette_after(name) {
                    writeln!(out, "next: {}", next.name)?;
                }
            }
            None => {
                for palette in self.palettes.palettes() {
                    writeln!(out, "{} ({} glyphs)", palette.name, palette.glyphs.len())?;
                }
            }
        }
        Ok(out)
    }

    /// Describe the document and where each element lands in the viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if formatting fails.
    pub fn summary(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let document = &self.document;
        writeln!(out, "{}", document.name())?;

        match document.background() {
            None => writeln!(out, "background: none")?,
            Some(background) => {
                let source = match background {
                    Background::Url(url) => url.to_string(),
                    Background::Bytes(_) => background.describe(),
                };
                match document.background_image() {
                    Some(image) => writeln!(
                        out,
                        "background: {source} ({}x{})",
                        image.width(),
                        image.height()
                    )?,
                    None if document.is_loading() => {
                        writeln!(out, "background: {source} (loading)")?;
                    }
                    None => writeln!(out, "background: {source} (not loaded)")?,
                }
            }
        }

        let steady = self.compositor.steady();
        writeln!(
            out,
            "viewport: {}x{} zoom {:.3}",
            self.config.viewport.width, self.config.viewport.height, steady.zoom
        )?;
        writeln!(out, "elements: {}", document.elements().len())?;
        for (index, element) in document.elements().iter().enumerate() {
            let placement = self.compositor.placement(element, document.selection());
            writeln!(
                out,
                "  [{index}] {} at ({:.1}, {:.1}) size {:.1} rotation {:.1}° -> screen ({:.1}, {:.1}) size {:.1}",
                element.glyph,
                element.x,
                element.y,
                element.size,
                element.rotation.degrees(),
                placement.center.x,
                placement.center.y,
                placement.font_size,
            )?;
        }
        Ok(out)
    }
}
