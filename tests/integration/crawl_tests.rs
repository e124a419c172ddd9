//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end.

use image::{GrayImage, ImageFormat};
use pixel_harvest::config::{parse_config, Config};
use pixel_harvest::crawler::Coordinator;
use pixel_harvest::CrawlPhase;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
fn create_test_config(entry_url: &str, output_dir: &Path, timeout_secs: u64) -> Config {
    parse_config(&format!(
        r#"
[crawl]
entry-url = "{entry}"
scope = ["127.0.0.1"]

[fetch]
max-concurrent = 4
request-delay-ms = 0
media-delay-ms = 0
request-timeout-secs = {timeout}

[output]
directory = '{output}'
file-prefix = "test_"
"#,
        entry = entry_url,
        timeout = timeout_secs,
        output = output_dir.display()
    ))
    .expect("test config should be valid")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    GrayImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "image/png"),
        )
        .mount(server)
        .await;
}

fn saved_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("output directory should exist")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_navigation_set_excludes_catalog() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/home",
        r#"<html><body><nav>
             <a href="/section-a">Section A</a>
             <a href="/section-b">Section B</a>
             <a href="/catalogue-c">Catalogue</a>
             <a href="https://elsewhere.example.org/page">Elsewhere</a>
           </nav></body></html>"#,
    )
    .await;
    mount_html(&server, "/section-a", "<html><body><p>A</p></body></html>").await;
    mount_html(&server, "/section-b", "<html><body><p>B</p></body></html>").await;

    Mock::given(method("GET"))
        .and(path("/catalogue-c"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = create_test_config(&format!("{}/home", base), &out, 5);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await.unwrap();

    let expected: BTreeSet<String> = [format!("{}/section-a", base), format!("{}/section-b", base)]
        .into_iter()
        .collect();
    assert_eq!(coordinator.state().navigation(), &expected);
    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.pages_crawled(), 3);
    assert_eq!(report.media_found(), 0);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_identical_bytes_are_saved_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/home",
        r#"<a href="/section-a">A</a><a href="/section-b">B</a>"#,
    )
    .await;
    mount_html(
        &server,
        "/section-a",
        r#"<main class="content"><img src="/img/photo.png?v=1" alt="Photo"></main>"#,
    )
    .await;
    mount_html(
        &server,
        "/section-b",
        r#"<main class="content"><img src="/img/photo.png?v=2" alt="Photo"></main>"#,
    )
    .await;
    mount_image(&server, "/img/photo.png", png(200, 200)).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = create_test_config(&format!("{}/home", base), &out, 5);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_crawled(), 3);
    assert_eq!(report.media_found(), 2);
    assert_eq!(report.media_downloaded(), 1);
    assert_eq!(report.duplicates_rejected(), 1);
    assert_eq!(report.size_or_dimension_rejected(), 0);
    assert_eq!(report.other_rejected(), 0);
    assert_eq!(coordinator.state().digests().len(), 1);

    let files = saved_files(&out);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("test_photo_"));
    assert!(files[0].ends_with(".png"));
}

#[tokio::test]
async fn test_out_of_bounds_dimensions_are_rejected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/home", r#"<a href="/gallery">Gallery</a>"#).await;
    mount_html(
        &server,
        "/gallery",
        r#"<section>
             <img src="/img/icon.png">
             <img src="/img/poster.png">
           </section>"#,
    )
    .await;
    mount_image(&server, "/img/icon.png", png(50, 50)).await;
    mount_image(&server, "/img/poster.png", png(5000, 4000)).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = create_test_config(&format!("{}/home", base), &out, 5);

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.media_found(), 2);
    assert_eq!(report.media_downloaded(), 0);
    assert_eq!(report.size_or_dimension_rejected(), 2);
    assert_eq!(report.duplicates_rejected(), 0);
    assert!(saved_files(&out).is_empty());
}

#[tokio::test]
async fn test_entry_page_timeout_yields_empty_report() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/section-a">A</a>"#, "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = create_test_config(&format!("{}/home", base), &out, 1);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_crawled(), 0);
    assert_eq!(report.media_found(), 0);
    assert_eq!(report.media_downloaded(), 0);
    assert!(coordinator.state().navigation().is_empty());
    assert_eq!(coordinator.phase(), CrawlPhase::Done);
}

#[tokio::test]
async fn test_home_page_media_is_never_collected() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/home",
        r#"<img src="/img/entry.png">
           <a href="/section-a">A</a>
           <a href="/home-news">News</a>
           <a href="/home?lang=fr">Accueil</a>"#,
    )
    .await;
    mount_html(&server, "/section-a", r#"<section><img src="/img/content.png"></section>"#).await;
    mount_html(&server, "/home-news", r#"<section><img src="/img/news.png"></section>"#).await;
    mount_image(&server, "/img/content.png", png(300, 200)).await;

    for route in ["/img/entry.png", "/img/news.png"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(300, 200)))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = create_test_config(&format!("{}/home", base), &out, 5);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.run().await.unwrap();

    let media: Vec<&String> = coordinator.state().media().iter().collect();
    assert_eq!(media, vec![&format!("{}/img/content.png", base)]);
    assert_eq!(report.media_downloaded(), 1);
    assert_eq!(saved_files(&out).len(), 1);
}

#[tokio::test]
async fn test_output_directory_is_cleared_and_failures_are_counted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/home", r#"<a href="/section-a">A</a><a href="/missing">Gone</a>"#).await;
    mount_html(
        &server,
        "/section-a",
        r#"<div class="content">
             <img src="/img/ok.png">
             <img src="/img/broken.png">
             <div class="card" style="background-image: url('/img/card.png')"></div>
           </div>"#,
    )
    .await;
    mount_image(&server, "/img/ok.png", png(400, 300)).await;
    mount_image(&server, "/img/card.png", png(640, 480)).await;
    Mock::given(method("GET"))
        .and(path("/img/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("stale.jpg"), b"left over").unwrap();

    let config = create_test_config(&format!("{}/home", base), &out, 5);
    let report = Coordinator::new(config)
        .unwrap()
        .with_config_hash("abc123")
        .run()
        .await
        .unwrap();

    // /missing answers 404 and is not counted as crawled
    assert_eq!(report.pages_crawled(), 2);
    assert_eq!(report.media_found(), 3);
    assert_eq!(report.media_downloaded(), 2);
    assert_eq!(report.other_rejected(), 1);
    assert_eq!(report.config_hash.as_deref(), Some("abc123"));

    let files = saved_files(&out);
    assert_eq!(files.len(), 2);
    assert!(!files.iter().any(|f| f == "stale.jpg"));
}

#[tokio::test]
async fn test_cancel_during_media_phase_stops_pending_downloads() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(&server, "/home", r#"<a href="/gallery">Gallery</a>"#).await;
    let images: String = (0..6)
        .map(|i| format!(r#"<img src="/img/photo{}.png">"#, i))
        .collect();
    mount_html(&server, "/gallery", &format!("<section>{}</section>", images)).await;
    for i in 0..6u32 {
        mount_image(&server, &format!("/img/photo{}.png", i), png(200 + i, 200)).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = parse_config(&format!(
        r#"
[crawl]
entry-url = "{base}/home"
scope = ["127.0.0.1"]

[fetch]
max-concurrent = 1
request-delay-ms = 0
media-delay-ms = 300
request-timeout-secs = 5

[output]
directory = '{output}'
"#,
        base = base,
        output = out.display()
    ))
    .unwrap();

    let mut coordinator = Coordinator::new(config).unwrap();
    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(450)).await;
        cancel.store(true, Ordering::SeqCst);
    });

    let report = coordinator.run().await.unwrap();

    assert!(report.cancelled);
    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.media_found(), 6);
    assert!(report.media_downloaded() <= 2);
    assert_eq!(report.other_rejected(), 0);
    assert_eq!(saved_files(&out).len() as u64, report.media_downloaded());

    let image_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/img/"))
        .count();
    assert!(image_requests <= 2);
}
