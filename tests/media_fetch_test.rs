//! Direct media fetches and the RapidAPI fallback source against mock servers.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use instarelay::core::retry::RetryConfig;
use instarelay::download::fetch::fetch_to_file;
use instarelay::download::{DownloadError, MediaKind, MediaSource, RapidApiSource};
use instarelay::instagram::models::BundleKind;
use instarelay::scraper::{InstagramService, RapidApiClient};

const LINK: &str = "https://www.instagram.com/p/ABC123";

fn rapidapi(server: &MockServer) -> RapidApiClient {
    RapidApiClient::new(server.uri(), "downloader.example", "secret-key")
        .unwrap()
        .with_retry(RetryConfig::new().max_retries(0))
}

#[tokio::test]
async fn test_fetch_streams_body_to_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = reqwest::Client::new();
    let url = format!("{}/media/a.jpg", server.uri());
    let fetched = fetch_to_file(&client, &url, dir.path(), "story_1.jpg", 1024 * 1024)
        .await
        .unwrap();

    assert_eq!(fetched.size_bytes, 4096);
    assert_eq!(fetched.path, dir.path().join("story_1.jpg"));
    assert_eq!(std::fs::read(&fetched.path).unwrap().len(), 4096);
}

#[tokio::test]
async fn test_fetch_rejects_oversized_media() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/big.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 10_000]))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/media/big.mp4", server.uri());
    let err = fetch_to_file(&reqwest::Client::new(), &url, dir.path(), "big.mp4", 1_000)
        .await
        .unwrap_err();

    match err {
        DownloadError::TooLarge {
            size_bytes,
            limit_bytes,
        } => {
            assert!(size_bytes > 1_000);
            assert_eq!(limit_bytes, 1_000);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!dir.path().join("big.mp4").exists());
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/media/gone.mp4", server.uri());
    let err = fetch_to_file(&reqwest::Client::new(), &url, dir.path(), "gone.mp4", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::Http(_)), "got {}", err);
    assert!(!dir.path().join("gone.mp4").exists());
}

#[tokio::test]
async fn test_rapidapi_sends_key_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .and(query_param("url", LINK))
        .and(header("X-RapidAPI-Key", "secret-key"))
        .and(header("X-RapidAPI-Host", "downloader.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": "https://cdn.example/v.mp4",
            "thumbnail": "https://cdn.example/t.jpg",
            "caption": "hello",
            "username": "natgeo"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = rapidapi(&server).media(LINK).await.unwrap();
    assert_eq!(bundle.kind, BundleKind::Video);
    assert_eq!(bundle.media_urls, vec!["https://cdn.example/v.mp4".to_string()]);
    assert_eq!(bundle.username.as_deref(), Some("natgeo"));
}

#[tokio::test]
async fn test_service_media_is_none_without_urls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let service = InstagramService::new(None, Some(rapidapi(&server)));
    assert!(service.has_media_fallback());
    assert!(service.media(LINK).await.is_none());
}

#[tokio::test]
async fn test_rapidapi_source_downloads_first_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [
                format!("{}/cdn/one.jpg?sig=1", server.uri()),
                format!("{}/cdn/two.jpg", server.uri())
            ],
            "caption": "two photos",
            "owner_username": "natgeo"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdn/one.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let service = Arc::new(InstagramService::new(None, Some(rapidapi(&server))));
    let source = RapidApiSource::new(service, dir.path().to_path_buf(), 1024 * 1024).unwrap();

    let file = source.fetch(LINK).await.unwrap();
    assert_eq!(source.name(), "rapidapi");
    assert_eq!(file.kind, MediaKind::Image);
    assert!(file.file_name.starts_with("rapidapi_"));
    assert!(file.file_name.ends_with(".jpg"));
    assert!(file.file_name.contains(&file.token));
    assert_eq!(file.size_bytes, 8);
    assert_eq!(file.title, "two photos");
    assert_eq!(file.uploader.as_deref(), Some("natgeo"));
}

#[tokio::test]
async fn test_rapidapi_source_without_media_is_unsupported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let service = Arc::new(InstagramService::new(None, Some(rapidapi(&server))));
    let source = RapidApiSource::new(service, dir.path().to_path_buf(), 1024).unwrap();
    let err = source.fetch(LINK).await.unwrap_err();
    assert!(matches!(err, DownloadError::Unsupported(_)), "got {}", err);
}
