//! Named glyph palettes.

use serde::{Deserialize, Serialize};

use crate::{ArtError, ArtResult};

const HALLOWEEN: &[&str] = &[
    "🦇", "😱", "🙀", "😈", "🎃", "👻", "🍭", "🍬", "💀", "👺", "👽", "🕸", "🤖", "🧛🏻", "👾",
    "💩", "👅", "🧜🏼‍♀️", "💁🏼‍♀️", "👯‍♀️", "🧣", "🐝",
];

const FACES: &[&str] = &[
    "😀", "😂", "🤣", "😃", "😄", "😅", "😆", "😉", "😊", "😋", "😎", "😍", "😘", "🤔", "🙄",
];

const ANIMALS: &[&str] = &[
    "🐶", "🐱", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵",
];

const FOOD: &[&str] = &[
    "🍏", "🍎", "🍐", "🍊", "🍋", "🍌", "🍉", "🍇", "🍓", "🍈", "🍒", "🍑", "🍍", "🥥", "🥝",
];

/// A named, ordered set of glyphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Display name, unique within a store.
    pub name: String,
    /// Glyphs in display order, without duplicates.
    pub glyphs: Vec<String>,
}

impl Palette {
    fn builtin(name: &str, glyphs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            glyphs: glyphs.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Ordered collection of palettes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteStore {
    palettes: Vec<Palette>,
}

impl Default for PaletteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteStore {
    /// Create a store seeded with the built-in palettes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            palettes: vec![
                Palette::builtin("Halloween", HALLOWEEN),
                Palette::builtin("Faces", FACES),
                Palette::builtin("Animals", ANIMALS),
                Palette::builtin("Food", FOOD),
            ],
        }
    }

    /// All palettes in order.
    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Palette names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.iter().map(|p| p.name.as_str())
    }

    /// Look up a palette by name.
    #[must_use]
    pub fn palette(&self, name: &str) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.palettes.iter().position(|p| p.name == name)
    }

    fn palette_mut(&mut self, name: &str) -> ArtResult<&mut Palette> {
        self.palettes
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ArtError::PaletteNotFound(name.to_string()))
    }

    /// The first palette.
    #[must_use]
    pub fn default_palette(&self) -> Option<&Palette> {
        self.palettes.first()
    }

    /// The palette after `name`, wrapping around. Unknown names yield the
    /// default palette.
    #[must_use]
    pub fn palette_after(&self, name: &str) -> Option<&Palette> {
        match self.position(name) {
            Some(i) => self.palettes.get((i + 1) % self.palettes.len()),
            None => self.default_palette(),
        }
    }

    /// The palette before `name`, wrapping around. Unknown names yield the
    /// default palette.
    #[must_use]
    pub fn palette_before(&self, name: &str) -> Option<&Palette> {
        match self.position(name) {
            Some(i) => self
                .palettes
                .get((i + self.palettes.len() - 1) % self.palettes.len()),
            None => self.default_palette(),
        }
    }

    /// Add a palette, returning the name it was stored under.
    pub fn add_palette(
        &mut self,
        name: &str,
        glyphs: impl IntoIterator<Item = impl Into<String>>,
    ) -> String {
        let name = uniqued(name, self.names());
        let mut palette = Palette {
            name: name.clone(),
            glyphs: Vec::new(),
        };
        extend_unique(&mut palette.glyphs, glyphs);
        self.palettes.push(palette);
        name
    }

    /// Rename a palette, returning the name actually used.
    ///
    /// A name already taken by another palette gets a trailing number
    /// appended or incremented until it is unique.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if `old` does not exist.
    pub fn rename(&mut self, old: &str, new: &str) -> ArtResult<String> {
        let index = self
            .position(old)
            .ok_or_else(|| ArtError::PaletteNotFound(old.to_string()))?;
        let others = self
            .palettes
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(_, p)| p.name.as_str());
        let unique = uniqued(new, others);
        tracing::debug!("Renaming palette {old} to {unique}");
        self.palettes[index].name.clone_from(&unique);
        Ok(unique)
    }

    /// Append glyphs the palette doesn't already have.
    ///
    /// Returns the number of glyphs added.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if `name` does not exist.
    pub fn add_glyphs(
        &mut self,
        name: &str,
        glyphs: impl IntoIterator<Item = impl Into<String>>,
    ) -> ArtResult<usize> {
        let palette = self.palette_mut(name)?;
        let before = palette.glyphs.len();
        extend_unique(&mut palette.glyphs, glyphs);
        Ok(palette.glyphs.len() - before)
    }

    /// Remove a glyph. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if `name` does not exist.
    pub fn remove_glyph(&mut self, name: &str, glyph: &str) -> ArtResult<bool> {
        let palette = self.palette_mut(name)?;
        let before = palette.glyphs.len();
        palette.glyphs.retain(|g| g != glyph);
        Ok(palette.glyphs.len() != before)
    }
}

fn extend_unique(glyphs: &mut Vec<String>, new: impl IntoIterator<Item = impl Into<String>>) {
    for glyph in new {
        let glyph = glyph.into();
        if !glyph.is_empty() && !glyphs.contains(&glyph) {
            glyphs.push(glyph);
        }
    }
}

/// `name`, or `name` with its trailing number incremented until it is not
/// among `taken`.
fn uniqued<'a>(name: &str, taken: impl Iterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = taken.collect();
    let mut unique = name.to_string();
    while taken.contains(&unique.as_str()) {
        unique = incremented(&unique);
    }
    unique
}

/// "Faces" becomes "Faces 1", "Faces 1" becomes "Faces 2".
fn incremented(name: &str) -> String {
    let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[prefix.len()..];
    match digits.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
        Some(next) => format!("{prefix}{next}"),
        None => format!("{name} 1"),
    }
}
