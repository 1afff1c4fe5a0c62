//! # Emoji Art CLI
//!
//! Command-line host for Emoji Art documents.
//!
//! Each invocation opens a named document from the data directory, applies
//! one command, waits for the background image and prints a summary. Every
//! change is saved back to the data directory as it happens.
//!
//! ## Usage
//!
//! ```bash
//! emojiart --document Halloween add 🎃 0 0
//! emojiart --document Halloween background https://example.com/moon.jpg
//! emojiart --document Halloween show
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `CliConfig` - Data directory, document name, viewport and command
//! - `EmojiArtApp` - Drives an `ArtDocument` and a `Compositor`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod app;

pub use app::EmojiArtApp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emojiart_core::Size;

/// Command-line arguments for emojiart.
#[derive(Debug, Clone, Parser)]
#[command(name = "emojiart")]
#[command(about = "Compose emoji art over background images")]
#[command(version)]
pub struct CliArgs {
    /// Directory documents are stored in
    #[arg(long, env = "EMOJIART_DATA_DIR", default_value = "emojiart-data")]
    pub data_dir: PathBuf,

    /// Document name
    #[arg(short, long, default_value = "Untitled")]
    pub document: String,

    /// Viewport width in points
    #[arg(long, env = "EMOJIART_VIEWPORT_WIDTH", default_value = "1280")]
    pub viewport_width: f64,

    /// Viewport height in points
    #[arg(long, env = "EMOJIART_VIEWPORT_HEIGHT", default_value = "720")]
    pub viewport_height: f64,

    /// Don't fetch background images
    #[arg(long)]
    pub offline: bool,

    /// Command to run (defaults to `show`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands applied to the opened document.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Print the document and where each element is drawn
    Show,
    /// Add a glyph at canvas coordinates
    Add {
        /// Glyph to add
        glyph: String,
        /// Offset from the canvas centre
        #[arg(allow_hyphen_values = true)]
        x: f64,
        /// Offset from the canvas centre
        #[arg(allow_hyphen_values = true)]
        y: f64,
        /// Point size (defaults to the document's default size)
        #[arg(long)]
        size: Option<f64>,
    },
    /// Drop a glyph at a viewport location
    Drop {
        /// Glyph to drop
        glyph: String,
        /// Viewport x coordinate
        screen_x: f64,
        /// Viewport y coordinate
        screen_y: f64,
    },
    /// Set or clear the background
    Background {
        /// Image URL
        url: Option<String>,
        /// Read the image from a local file instead
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,
        /// Remove the background
        #[arg(long, conflicts_with_all = ["url", "file"])]
        clear: bool,
    },
    /// Move elements
    Move {
        /// Horizontal distance
        #[arg(allow_hyphen_values = true)]
        dx: f64,
        /// Vertical distance
        #[arg(allow_hyphen_values = true)]
        dy: f64,
        /// Index of a single element (defaults to all)
        #[arg(long)]
        element: Option<usize>,
    },
    /// Scale element sizes
    Scale {
        /// Size multiplier
        factor: f64,
        /// Index of a single element (defaults to all)
        #[arg(long)]
        element: Option<usize>,
    },
    /// Rotate elements about their centres
    Rotate {
        /// Angle in degrees
        #[arg(allow_hyphen_values = true)]
        degrees: f64,
        /// Index of a single element (defaults to all)
        #[arg(long)]
        element: Option<usize>,
    },
    /// Delete elements
    Delete {
        /// Index of a single element (defaults to all)
        #[arg(long)]
        element: Option<usize>,
    },
    /// Replace the artwork with a JSON document
    Import {
        /// File to read
        path: PathBuf,
    },
    /// Write the artwork as JSON
    Export {
        /// File to write (defaults to stdout)
        path: Option<PathBuf>,
    },
    /// List palettes, or show one
    Palettes {
        /// Palette to show
        name: Option<String>,
    },
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory documents are stored in.
    pub data_dir: PathBuf,
    /// Document name.
    pub document: String,
    /// Viewport size used for placements.
    pub viewport: Size,
    /// Whether background images are fetched.
    pub fetch_backgrounds: bool,
    /// Command to run.
    pub command: Command,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from("emojiart-data"),
            document: "Untitled".to_string(),
            viewport: Size::new(1280.0, 720.0),
            fetch_backgrounds: true,
            command: Command::Show,
        }
    }
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            data_dir: args.data_dir,
            document: args.document,
            viewport: Size::new(args.viewport_width, args.viewport_height),
            fetch_backgrounds: !args.offline,
            command: args.command.unwrap_or(Command::Show),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["emojiart", "--data-dir", "/tmp/art"]).expect("parse");
        let config = CliConfig::from(args);
        assert_eq!(config.document, "Untitled");
        assert_eq!(config.command, Command::Show);
        assert_eq!(config.viewport, Size::new(1280.0, 720.0));
        assert!(config.fetch_backgrounds);
    }

    #[test]
    fn test_add_with_negative_coordinates() {
        let args = CliArgs::try_parse_from([
            "emojiart", "--data-dir", "/tmp/art", "-d", "Halloween", "--offline", "add", "🎃",
            "-10", "-2.5", "--size", "64",
        ])
        .expect("parse");
        let config = CliConfig::from(args);
        assert_eq!(config.document, "Halloween");
        assert!(!config.fetch_backgrounds);
        assert_eq!(
            config.command,
            Command::Add {
                glyph: "🎃".to_string(),
                x: -10.0,
                y: -2.5,
                size: Some(64.0),
            }
        );
    }

    #[test]
    fn test_background_flags_conflict() {
        let result = CliArgs::try_parse_from([
            "emojiart", "--data-dir", "/tmp/art", "background", "https://example.com/a.png",
            "--clear",
        ]);
        assert!(result.is_err());
    }
}
