//! HTTP Fetch Integration Tests
//!
//! Tests the real fetcher against a local mock server:
//! - Successful and failed HTTP responses
//! - data: and file: URLs
//! - End-to-end background resolution through a document

use std::io::Cursor;

use emojiart_core::{ArtDocument, FetchError, NetworkFetch};
use emojiart_fetch::{default_fetcher, HttpFetch};
use tokio::runtime::Handle;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encode a solid PNG of the given size.
fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("valid url")
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
async fn test_fetch_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bg.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let fetch = HttpFetch::new().expect("client");
    let bytes = fetch
        .fetch(&url(&format!("{}/bg.png", server.uri())))
        .await
        .expect("fetch");
    assert_eq!(bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetch = HttpFetch::new().expect("client");
    let result = fetch.fetch(&url(&format!("{}/gone.png", server.uri()))).await;
    assert!(matches!(result, Err(FetchError::Status(404))));
}

// ============================================================================
// Other Schemes
// ============================================================================

#[tokio::test]
async fn test_fetch_data_uri() {
    let fetch = HttpFetch::new().expect("client");
    let bytes = fetch
        .fetch(&url("data:application/octet-stream;base64,AQID"))
        .await
        .expect("fetch");
    assert_eq!(bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_file_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("bg.bin");
    std::fs::write(&file, [9, 8, 7]).expect("write");

    let fetch = HttpFetch::new().expect("client");
    let file_url = Url::from_file_path(&file).expect("file url");
    assert_eq!(fetch.fetch(&file_url).await.expect("fetch"), vec![9, 8, 7]);

    let missing = Url::from_file_path(dir.path().join("missing.bin")).expect("file url");
    assert!(matches!(fetch.fetch(&missing).await, Err(FetchError::Io(_))));
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let fetch = HttpFetch::new().expect("client");
    let result = fetch.fetch(&url("ftp://example.com/bg.png")).await;
    assert!(matches!(result, Err(FetchError::UnsupportedScheme(s)) if s == "ftp"));
}

// ============================================================================
// End to End
// ============================================================================

#[tokio::test]
async fn test_document_resolves_served_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wide.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png(8, 4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a png".to_vec()))
        .mount(&server)
        .await;

    let fetcher = default_fetcher(Handle::current()).expect("fetcher");
    let mut document = ArtDocument::new("e2e").with_fetcher(fetcher);

    document
        .set_background_url(&format!("{}/wide.png", server.uri()))
        .expect("valid url");
    document.settle_background().await;
    let image = document.background_image().expect("image loaded");
    assert_eq!((image.width(), image.height()), (8, 4));

    document
        .set_background_url(&format!("{}/broken.png", server.uri()))
        .expect("valid url");
    document.settle_background().await;
    assert!(document.background_image().is_none());
    assert!(!document.is_loading());
}
