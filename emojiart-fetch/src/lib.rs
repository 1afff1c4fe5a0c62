//! # Emoji Art Fetch
//!
//! Adapters that plug real I/O into the document engine's background fetcher.
//!
//! ## Sources
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             NetworkFetch Trait              │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ http/https  │ data: URI   │ file: URL       │
//! │ (reqwest)   │ (base64/%)  │ (tokio::fs)     │
//! └─────────────┴─────────────┴─────────────────┘
//! ```
//!
//! Decoding is done by [`RasterDecoder`] using the `image` crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod data_uri;
pub mod decode;
pub mod http;

pub use data_uri::decode_data_uri;
pub use decode::{ImageFormat, RasterDecoder};
pub use http::HttpFetch;

use std::sync::Arc;

use emojiart_core::{FetchError, ImageFetcher};
use tokio::runtime::Handle;

/// Build a fetcher backed by [`HttpFetch`] and [`RasterDecoder`].
///
/// # Errors
///
/// Returns [`FetchError::Network`] if the HTTP client cannot be built.
pub fn default_fetcher(runtime: Handle) -> Result<ImageFetcher, FetchError> {
    Ok(ImageFetcher::new(
        Arc::new(HttpFetch::new()?),
        Arc::new(RasterDecoder::new()),
        runtime,
    ))
}
