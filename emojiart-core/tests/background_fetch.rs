//! Background Fetch Integration Tests
//!
//! Tests how the document resolves background images:
//! - Last request wins under rapid changes
//! - Stale completions are discarded
//! - Undo of a background change refetches
//! - Failures resolve to no image

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use emojiart_core::{
    ArtDocument, Background, BackgroundImage, DocumentEvent, FetchError, ImageDecoder,
    ImageFetcher, NetworkFetch,
};
use tokio::runtime::Handle;

/// Serves canned bytes per URL after a per-URL delay.
struct StubNetwork {
    responses: HashMap<String, (Duration, Vec<u8>)>,
}

#[async_trait]
impl NetworkFetch for StubNetwork {
    async fn fetch(&self, url: &url::Url) -> Result<Vec<u8>, FetchError> {
        let Some((delay, bytes)) = self.responses.get(url.as_str()).cloned() else {
            return Err(FetchError::Status(404));
        };
        tokio::time::sleep(delay).await;
        Ok(bytes)
    }
}

/// Reads the first two bytes as width and height.
struct StubDecoder;

impl ImageDecoder for StubDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<BackgroundImage, FetchError> {
        match bytes {
            [w, h, ..] => Ok(BackgroundImage::new(
                u32::from(*w),
                u32::from(*h),
                bytes.to_vec(),
            )),
            _ => Err(FetchError::Decode("truncated image".into())),
        }
    }
}

const SLOW: &str = "https://images.example.com/slow.png";
const FAST: &str = "https://images.example.com/fast.png";
const MISSING: &str = "https://images.example.com/missing.png";

/// Create a document whose fetcher serves `SLOW` as 1x1 after 200ms and
/// `FAST` as 2x2 immediately.
fn document() -> ArtDocument {
    let responses = HashMap::from([
        (SLOW.to_string(), (Duration::from_millis(200), vec![1, 1])),
        (FAST.to_string(), (Duration::ZERO, vec![2, 2])),
    ]);
    let fetcher = ImageFetcher::new(
        Arc::new(StubNetwork { responses }),
        Arc::new(StubDecoder),
        Handle::current(),
    );
    ArtDocument::new("fetch").with_fetcher(fetcher)
}

fn image_width(document: &ArtDocument) -> Option<u32> {
    document.background_image().map(BackgroundImage::width)
}

// ============================================================================
// Supersession
// ============================================================================

#[tokio::test]
async fn test_rapid_background_changes_resolve_to_last() {
    let mut document = document();
    document.set_background_url(SLOW).expect("valid url");
    document.set_background_url(FAST).expect("valid url");
    assert!(document.is_loading());

    document.settle_background().await;
    assert!(!document.is_loading());
    assert_eq!(image_width(&document), Some(2));

    // the aborted slow request never lands
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!document.poll_background());
    assert_eq!(image_width(&document), Some(2));
}

#[tokio::test]
async fn test_completed_but_superseded_fetch_is_dropped() {
    let mut document = document();
    document.set_background_url(FAST).expect("valid url");
    // let the fast fetch finish without applying it
    tokio::time::sleep(Duration::from_millis(50)).await;

    document.set_background_url(SLOW).expect("valid url");
    document.settle_background().await;
    assert_eq!(image_width(&document), Some(1));
}

#[tokio::test]
async fn test_background_change_clears_image_synchronously() {
    let mut document = document();
    document.set_background_url(FAST).expect("valid url");
    document.settle_background().await;
    assert!(document.background_image().is_some());

    document.set_background_url(SLOW).expect("valid url");
    assert!(document.background_image().is_none());
    assert!(document.is_loading());
}

// ============================================================================
// Undo and Failure
// ============================================================================

#[tokio::test]
async fn test_undo_refetches_previous_background() {
    let mut document = document();
    document.set_background_url(SLOW).expect("valid url");
    document.settle_background().await;
    document.set_background_url(FAST).expect("valid url");
    document.settle_background().await;
    assert_eq!(image_width(&document), Some(2));

    document.undo().expect("undo");
    assert!(document.is_loading());
    document.settle_background().await;
    assert_eq!(image_width(&document), Some(1));

    document.redo().expect("redo");
    document.settle_background().await;
    assert_eq!(image_width(&document), Some(2));
}

#[tokio::test]
async fn test_failed_fetch_resolves_to_no_image() {
    let mut document = document();
    document.set_background_url(MISSING).expect("valid url");
    document.settle_background().await;
    assert!(!document.is_loading());
    assert!(document.background_image().is_none());
    assert!(document.background().is_some());
}

#[tokio::test]
async fn test_raw_bytes_background() {
    let mut document = document();
    document.set_background_bytes(vec![7, 3, 0, 0]);
    document.settle_background().await;
    assert_eq!(
        document.background_image().map(BackgroundImage::height),
        Some(3)
    );
}

#[tokio::test]
async fn test_clearing_background_cancels_fetch() {
    let mut document = document();
    document.set_background_url(SLOW).expect("valid url");
    document.set_background(None);
    assert!(!document.is_loading());
    document.settle_background().await;
    assert!(document.background_image().is_none());
}

#[tokio::test]
async fn test_loading_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut document = document();
    let sink = Arc::clone(&events);
    document.subscribe(move |event| {
        if let DocumentEvent::BackgroundChanged { loading } = event {
            sink.lock().expect("lock").push(*loading);
        }
    });

    document.set_background_url(FAST).expect("valid url");
    document.settle_background().await;
    assert_eq!(*events.lock().expect("lock"), vec![true, false]);
}

#[tokio::test]
async fn test_fetcher_attached_to_loaded_artwork_starts_fetch() {
    let mut artwork = emojiart_core::Artwork::new();
    artwork.set_background(Some(Background::url(FAST).expect("url")));
    let fetcher = ImageFetcher::new(
        Arc::new(StubNetwork {
            responses: HashMap::from([(FAST.to_string(), (Duration::ZERO, vec![5, 5]))]),
        }),
        Arc::new(StubDecoder),
        Handle::current(),
    );
    let mut document = ArtDocument::from_artwork("loaded", artwork).with_fetcher(fetcher);
    assert!(document.is_loading());
    document.settle_background().await;
    assert_eq!(image_width(&document), Some(5));
    assert!(!document.can_undo());
}
