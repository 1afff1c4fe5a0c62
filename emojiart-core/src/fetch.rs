//! Background image resolution.
//!
//! [`ImageFetcher`] turns a [`Background`] into a decoded [`BackgroundImage`]
//! on a tokio runtime. Issuing a new request aborts the previous one, so at
//! most one fetch is outstanding per fetcher. Completions come back over a
//! channel and are applied by the owning document, which drops any whose
//! [`FetchToken`] is no longer current.
//!
//! The network and the image decoder are external collaborators modeled by
//! the [`NetworkFetch`] and [`ImageDecoder`] traits.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::geometry::Size;
use crate::Background;

/// Errors raised while resolving a background image.
///
/// These never escape the fetcher: a failed fetch resolves to "no image".
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request could not be completed.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The URL scheme is not supported by the fetcher.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// A local file could not be read.
    #[error("IO error: {0}")]
    Io(String),
}

/// Fetches raw bytes for a URL.
#[async_trait]
pub trait NetworkFetch: Send + Sync {
    /// Fetch the resource at `url`.
    ///
    /// Cancellation happens by dropping the future.
    async fn fetch(&self, url: &url::Url) -> Result<Vec<u8>, FetchError>;
}

/// Decodes encoded image bytes.
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes` into an image.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] if the bytes are not a supported image.
    fn decode(&self, bytes: &[u8]) -> Result<BackgroundImage, FetchError>;
}

/// A decoded background image.
///
/// The pixels are opaque to the document engine; only the dimensions are
/// read, for fitting the image to the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl BackgroundImage {
    /// Wrap decoded pixel data.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image dimensions as a [`Size`].
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Decoded pixel bytes, passed through untouched.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Identity of one fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchToken {
    generation: u64,
    source: Background,
}

impl FetchToken {
    /// Monotonic request number within the fetcher.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The background this request was issued for.
    #[must_use]
    pub fn source(&self) -> &Background {
        &self.source
    }
}

/// Result of one fetch, delivered to the owner.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    /// The request this completes.
    pub token: FetchToken,
    /// The decoded image, or `None` if fetching or decoding failed.
    pub image: Option<BackgroundImage>,
}

#[derive(Debug)]
struct InFlight {
    token: FetchToken,
    task: JoinHandle<()>,
}

/// Resolves backgrounds, keeping at most one request outstanding.
pub struct ImageFetcher {
    network: Arc<dyn NetworkFetch>,
    decoder: Arc<dyn ImageDecoder>,
    runtime: Handle,
    generation: u64,
    in_flight: Option<InFlight>,
    completions_tx: mpsc::UnboundedSender<FetchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl std::fmt::Debug for ImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFetcher")
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight.as_ref().map(|flight| &flight.token))
            .finish_non_exhaustive()
    }
}

impl ImageFetcher {
    /// Create a fetcher that spawns its requests on `runtime`.
    pub fn new(
        network: Arc<dyn NetworkFetch>,
        decoder: Arc<dyn ImageDecoder>,
        runtime: Handle,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            network,
            decoder,
            runtime,
            generation: 0,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Start resolving `background`, cancelling any outstanding request.
    pub fn resolve(&mut self, background: &Background) -> FetchToken {
        self.cancel();
        self.generation += 1;
        let token = FetchToken {
            generation: self.generation,
            source: background.clone(),
        };
        tracing::debug!(
            generation = token.generation,
            "Resolving background {}",
            background.describe()
        );
        let task = self.runtime.spawn(run_fetch(
            Arc::clone(&self.network),
            Arc::clone(&self.decoder),
            token.clone(),
            self.completions_tx.clone(),
        ));
        self.in_flight = Some(InFlight {
            token: token.clone(),
            task,
        });
        token
    }

    /// Abort the outstanding request, if any.
    ///
    /// A completion that was already sent may still arrive; the owner's
    /// token check discards it.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!(
                generation = in_flight.token.generation,
                "Cancelling background fetch"
            );
            in_flight.task.abort();
        }
    }

    /// The outstanding request, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&FetchToken> {
        self.in_flight.as_ref().map(|f| &f.token)
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Take a delivered completion without waiting.
    pub fn try_next(&mut self) -> Option<FetchCompletion> {
        let completion = self.completions_rx.try_recv().ok()?;
        self.settle(&completion);
        Some(completion)
    }

    /// Wait for the next completion.
    ///
    /// Returns `None` immediately when nothing is outstanding and nothing has
    /// been delivered.
    pub async fn next(&mut self) -> Option<FetchCompletion> {
        if let Some(completion) = self.try_next() {
            return Some(completion);
        }
        if self.in_flight.is_none() {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        self.settle(&completion);
        Some(completion)
    }

    fn settle(&mut self, completion: &FetchCompletion) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.token == completion.token)
        {
            self.in_flight = None;
        }
    }
}

impl Drop for ImageFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_fetch(
    network: Arc<dyn NetworkFetch>,
    decoder: Arc<dyn ImageDecoder>,
    token: FetchToken,
    completions: mpsc::UnboundedSender<FetchCompletion>,
) {
    let bytes = match &token.source {
        Background::Url(url) => network.fetch(url).await,
        Background::Bytes(bytes) => Ok(bytes.clone()),
    };
    let decoded = match bytes {
        Ok(bytes) => tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .unwrap_or_else(|e| Err(FetchError::Decode(format!("decoder task failed: {e}")))),
        Err(e) => Err(e),
    };
    let image = match decoded {
        Ok(image) => Some(image),
        Err(e) => {
            tracing::warn!(
                generation = token.generation,
                "Background image unavailable: {e}"
            );
            None
        }
    };
    // The receiver lives as long as the fetcher; a send error means the
    // fetcher is gone and nobody wants the result.
    let _ = completions.send(FetchCompletion { token, image });
}
