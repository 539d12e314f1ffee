//! Library API integration tests
//!
//! Every site is served by its own local mock server loaded with the page
//! fixtures under `tests/fixtures/sites`.
use std::sync::Arc;
use std::time::Duration;

use novelry_core::transport::HttpTransport;
use novelry_core::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_site_fixture_path(site: &str, name: &str) -> String {
    format!("../../tests/fixtures/sites/{}/{}", site, name)
}

fn fixture(site: &str, name: &str) -> String {
    std::fs::read_to_string(get_site_fixture_path(site, name)).unwrap()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

struct Sites {
    novtales: MockServer,
    novelbin: MockServer,
    lightnovelworld: MockServer,
    wuxiabox: MockServer,
    novelupdates: MockServer,
}

impl Sites {
    async fn start() -> Self {
        Self {
            novtales: MockServer::start().await,
            novelbin: MockServer::start().await,
            lightnovelworld: MockServer::start().await,
            wuxiabox: MockServer::start().await,
            novelupdates: MockServer::start().await,
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        let config = NovelryConfig::builder()
            .use_proxies(false)
            .retry_backoff(Duration::ZERO)
            .deadline(Duration::from_secs(20))
            .build();

        let registry = SourceRegistry::default()
            .with_origin(Source::Novtales, &self.novtales.uri())
            .and_then(|r| r.with_origin(Source::NovelBin, &self.novelbin.uri()))
            .and_then(|r| r.with_origin(Source::LightNovelWorld, &self.lightnovelworld.uri()))
            .and_then(|r| r.with_origin(Source::WuxiaBox, &self.wuxiabox.uri()))
            .and_then(|r| r.with_origin(Source::NovelUpdates, &self.novelupdates.uri()))
            .unwrap()
            .with_transport(TransportKind::Direct);

        let transport = HttpTransport::new(&config).unwrap();
        Orchestrator::new(registry, Transports::uniform(Arc::new(transport)), config)
    }
}

fn shadow_slave() -> SeriesId {
    SeriesId::parse("shadow-slave").unwrap()
}

async fn serve_reference(sites: &Sites) {
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave"))
        .respond_with(html(fixture("novtales", "series.html")))
        .mount(&sites.novtales)
        .await;
}

#[tokio::test]
async fn test_series_info_merges_reference_and_novelbin() {
    let sites = Sites::start().await;
    serve_reference(&sites).await;
    Mock::given(method("GET"))
        .and(path("/b/shadow-slave"))
        .respond_with(html(fixture("novelbin", "series.html")))
        .expect(1)
        .mount(&sites.novelbin)
        .await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave"))
        .respond_with(html(fixture("lightnovelworld", "series.html")))
        .expect(0)
        .mount(&sites.lightnovelworld)
        .await;

    let record = sites.orchestrator().get_series_info(&shadow_slave()).await.unwrap();

    assert_eq!(record.title.as_deref(), Some("Shadow Slave"));
    assert_eq!(record.latest_chapter, Some(1902));
    let description = record.description.unwrap();
    assert!(description.starts_with("Growing up in poverty"));
    assert_ne!(description, BOILERPLATE_DESCRIPTION);
    assert_eq!(record.rating, Some(Rating::Score(8.9)));
    assert_eq!(record.status.as_deref(), Some("Ongoing"));
    assert_eq!(record.year.as_deref(), Some("2022"));

    let genre: Vec<String> = record.genre.unwrap().into_iter().map(|g| g.name).collect();
    assert_eq!(genre, vec!["Action", "Fantasy"]);
    assert_eq!(record.authors.unwrap()[0].name, "Guiltythree");
}

#[tokio::test]
async fn test_series_info_falls_back_to_lightnovelworld() {
    let sites = Sites::start().await;
    serve_reference(&sites).await;
    Mock::given(method("GET"))
        .and(path("/b/shadow-slave"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&sites.novelbin)
        .await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave"))
        .respond_with(html(fixture("lightnovelworld", "series.html")))
        .expect(1)
        .mount(&sites.lightnovelworld)
        .await;

    let record = sites.orchestrator().get_series_info(&shadow_slave()).await.unwrap();

    assert_eq!(record.latest_chapter, Some(1902));
    assert_eq!(record.rating, Some(Rating::Score(4.5)));
    assert_eq!(record.tags.unwrap()[0].name, "Dark Fantasy");
    assert_eq!(record.status.as_deref(), Some("Ongoing"));
}

#[tokio::test]
async fn test_series_info_secondary_not_found_is_authoritative() {
    let sites = Sites::start().await;
    serve_reference(&sites).await;
    Mock::given(method("GET"))
        .and(path("/b/shadow-slave"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&sites.novelbin)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(fixture("lightnovelworld", "series.html")))
        .expect(0)
        .mount(&sites.lightnovelworld)
        .await;

    let err = sites.orchestrator().get_series_info(&shadow_slave()).await.unwrap_err();

    assert_eq!(err.status(), 404);
    assert_eq!(err.to_string(), "Series not found");
}

#[tokio::test]
async fn test_series_info_reference_not_found_page() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/novel/no-such-novel"))
        .respond_with(html(fixture("novtales", "not_found.html")))
        .mount(&sites.novtales)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(fixture("novelbin", "series.html")))
        .expect(0)
        .mount(&sites.novelbin)
        .await;

    let id = SeriesId::parse("no-such-novel").unwrap();
    let err = sites.orchestrator().get_series_info(&id).await.unwrap_err();

    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_series_info_reference_failure_aborts() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&sites.novtales)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(fixture("novelbin", "series.html")))
        .expect(0)
        .mount(&sites.novelbin)
        .await;

    let err = sites.orchestrator().get_series_info(&shadow_slave()).await.unwrap_err();

    assert_eq!(err.status(), 503);
    assert_eq!(err.to_string(), "Failed to fetch the page");
}

#[tokio::test]
async fn test_chapter_from_first_source() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave_12.html"))
        .respond_with(html(fixture("wuxiabox", "chapter.html")))
        .mount(&sites.wuxiabox)
        .await;
    Mock::given(method("GET"))
        .respond_with(html(fixture("novtales", "chapter.html")))
        .expect(0)
        .mount(&sites.novtales)
        .await;

    let chapter_no = ChapterNo::parse("12").unwrap();
    let chapter = sites.orchestrator().get_chapter(&shadow_slave(), &chapter_no).await.unwrap();

    assert_eq!(chapter.status, 200);
    assert_eq!(chapter.chapter_no, chapter_no);
    assert_eq!(chapter.title, "Chapter 12 - Awakening");
    assert_eq!(chapter.url, format!("{}/novel/shadow-slave_12.html", sites.wuxiabox.uri()));
    assert!(chapter.body.contains("Sunny opened his eyes."));
}

#[tokio::test]
async fn test_chapter_empty_body_falls_through() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave_12.html"))
        .respond_with(html(fixture("wuxiabox", "empty_chapter.html")))
        .expect(1)
        .mount(&sites.wuxiabox)
        .await;
    Mock::given(method("GET"))
        .and(path("/chapter/shadow-slave-12"))
        .respond_with(html(fixture("novtales", "chapter.html")))
        .mount(&sites.novtales)
        .await;

    let chapter_no = ChapterNo::parse("12").unwrap();
    let chapter = sites.orchestrator().get_chapter(&shadow_slave(), &chapter_no).await.unwrap();

    assert_eq!(chapter.title, "Chapter 12: Awakening");
    assert!(chapter.url.starts_with(&sites.novtales.uri()));
}

#[tokio::test]
async fn test_chapter_retries_then_next_source() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/novel/shadow-slave_12.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&sites.wuxiabox)
        .await;
    Mock::given(method("GET"))
        .and(path("/chapter/shadow-slave-12"))
        .respond_with(html(fixture("novtales", "chapter.html")))
        .expect(1)
        .mount(&sites.novtales)
        .await;

    let chapter_no = ChapterNo::parse("12").unwrap();
    let chapter = sites.orchestrator().get_chapter(&shadow_slave(), &chapter_no).await.unwrap();

    assert!(chapter.body.contains("Nightmare Spell"));
}

#[tokio::test]
async fn test_chapter_not_found_everywhere() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&sites.wuxiabox)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&sites.novtales)
        .await;

    let chapter_no = ChapterNo::parse("99999").unwrap();
    let err = sites.orchestrator().get_chapter(&shadow_slave(), &chapter_no).await.unwrap_err();

    assert_eq!(err.status(), 404);
    assert_eq!(err.to_string(), "Chapter not found");

    let report = ErrorReport::from(&err).with_chapter(chapter_no);
    let json: serde_json::Value = serde_json::from_str(&to_json(&report, false).unwrap()).unwrap();
    assert_eq!(json, serde_json::json!({"status": 404, "chapter_no": "99999", "error": "Chapter not found"}));
}

#[tokio::test]
async fn test_search() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/series-finder/"))
        .and(query_param("sh", "shadow slave"))
        .respond_with(html(fixture("novelupdates", "search.html")))
        .mount(&sites.novelupdates)
        .await;

    let results = sites.orchestrator().search("shadow slave").await.unwrap();

    assert_eq!(results.len(), 2);
    let first = &results[0];
    assert_eq!(first.title, "Shadow Slave");
    assert_eq!(first.link, "https://www.novelupdates.com/series/shadow-slave/");
    assert_eq!(first.search_rating, "4.5");
    assert_eq!(first.releases, "1870 Releases");
    assert_eq!(first.last_updated, "10-15-2026");
    assert!(first.description.contains("Nightmare Spell"));
    assert!(!first.description.contains("less"));
    assert_eq!(first.genres.len(), 2);
    assert!(results[1].image.is_none());

    let report = SearchReport::from(results);
    let json: serde_json::Value = serde_json::from_str(&to_json(&report, true).unwrap()).unwrap();
    assert_eq!(json["status"], 200);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/series-finder/"))
        .respond_with(html(fixture("novelupdates", "search_empty.html")))
        .mount(&sites.novelupdates)
        .await;

    let results = sites.orchestrator().search("zzzzqqq").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_challenge_page_is_503() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/series-finder/"))
        .respond_with(html(fixture("novelupdates", "challenge.html")))
        .mount(&sites.novelupdates)
        .await;

    let err = sites.orchestrator().search("shadow slave").await.unwrap_err();

    assert!(matches!(err, NovelryError::Extraction { site: Source::NovelUpdates, .. }));
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn test_search_rejects_blank_query() {
    let sites = Sites::start().await;

    let err = sites.orchestrator().search("   ").await.unwrap_err();
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_latest_releases() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(fixture("novelupdates", "feed.html")))
        .mount(&sites.novelupdates)
        .await;

    let feed = sites.orchestrator().latest_releases().await.unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].title.as_deref(), Some("Shadow Slave"));
    assert_eq!(feed[0].release.name.as_deref(), Some("c1870"));
    assert_eq!(feed[1].group.name.as_deref(), Some("Webnovel"));
}

#[tokio::test]
async fn test_latest_releases_layout_drift() {
    let sites = Sites::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body><p>maintenance</p></body></html>".to_string()))
        .mount(&sites.novelupdates)
        .await;

    let err = sites.orchestrator().latest_releases().await.unwrap_err();
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn test_metadata_record_json_round_trip() {
    let sites = Sites::start().await;
    serve_reference(&sites).await;
    Mock::given(method("GET"))
        .and(path("/b/shadow-slave"))
        .respond_with(html(fixture("novelbin", "series.html")))
        .mount(&sites.novelbin)
        .await;

    let record = sites.orchestrator().get_series_info(&shadow_slave()).await.unwrap();
    let json = to_json(&record, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["latest_chapter"], 1902);
    assert_eq!(value["language"]["name"], "English");
    assert!(value.get("release_freq").is_none());

    let parsed: MetadataRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
}
