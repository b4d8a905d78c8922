//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the law-star site and run the
//! full walk end-to-end against an in-memory or temporary SQLite store.

use lawstar_scraper::config::{Config, OutputConfig, ScraperConfig, SessionConfig};
use lawstar_scraper::crawler::{run_scrape, scrape, DetailWorker, Extractor, Fetcher, ResultStub};
use lawstar_scraper::storage::{RunStatus, SqliteStorage, Storage};
use lawstar_scraper::ScrapeError;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_TOKEN: &str = "loginuser=13100000000; loginpass=CF9EAE1EDE";
const USER_AGENT: &str = "TestAgent/1.0";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, max_pages: u32, db_path: &str) -> Config {
    Config {
        session: SessionConfig {
            base_url: base_url.to_string(),
            keyword: "labour".to_string(),
            auth_token: AUTH_TOKEN.to_string(),
            user_agent: USER_AGENT.to_string(),
        },
        scraper: ScraperConfig {
            max_pages,
            max_concurrent_details: 2,
            page_size: 50,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn listing_item(id: &str) -> String {
    format!(
        r#"<li><div class="div05"><h2><a href="/doc/{id}" title="Document {id}" rjs8="{id}">Document {id}</a></h2><p>summary</p></div></li>"#
    )
}

fn listing_page(ids: &[&str], next: &str) -> String {
    let items: String = ids.iter().map(|id| listing_item(id)).collect();
    format!(
        r#"<html><body>
        <ul class="list05">{items}</ul>
        <form name="pageform"><div><a class="xyy" href="{next}">下一页</a></div></form>
        </body></html>"#
    )
}

fn detail_page(id: &str, effective_date: Option<&str>) -> String {
    let filler = "<div></div>".repeat(7);
    let effective = effective_date.unwrap_or("");
    format!(
        r#"<html><body>{filler}
        <div><div><div>
          <div></div><div></div>
          <div><ul>
            <li><p>文号</p></li>
            <li><p>Order No. {id}</p></li>
            <li><p>实施日期</p></li>
            <li><p>{effective}</p></li>
            <li><p>效力等级</p></li>
            <li><p>National Law</p></li>
          </ul></div>
        </div></div></div>
        <p id="tdat">2020-10-19</p>
        <p id="tdpt">Standing Committee</p>
        <div id="maintext">Article 1 of {id}<br>Article 2 of {id}</div>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_listing(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("p", page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, effective_date: Option<&str>) {
    Mock::given(method("GET"))
        .and(path(format!("/doc/{}", id)))
        .respond_with(html(detail_page(id, effective_date)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_all_fields() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2", "3"], "/search?kw=labour&p=2"),
    )
    .await;
    for id in ["1", "2", "3"] {
        mount_detail(&server, id, Some("2021-01-01")).await;
    }

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("Scrape failed");

    assert_eq!(summary.pages_walked, 1);
    assert_eq!(summary.records_inserted, 3);
    assert_eq!(storage.count_records().unwrap(), 3);

    for id in ["1", "2", "3"] {
        let record = storage.get_record(id).unwrap().expect("record stored");
        assert_eq!(record.url, format!("{}/doc/{}", server.uri(), id));
        assert_eq!(record.title, format!("Document {}", id));
        assert_eq!(record.fields.present_count(), 6);
        assert_eq!(
            record.fields.issuing_reference,
            Some(vec![format!("Order No. {}", id)])
        );
        assert_eq!(
            record.fields.effective_date,
            Some(vec!["2021-01-01".to_string()])
        );
        assert_eq!(
            record.fields.body_text,
            Some(vec![format!("Article 1 of {}", id), format!("Article 2 of {}", id)])
        );
    }

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.records_inserted, 3);
}

#[tokio::test]
async fn test_missing_effective_date_is_absent() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2", "3"], "/search?kw=labour&p=2"),
    )
    .await;
    mount_detail(&server, "1", Some("2021-01-01")).await;
    mount_detail(&server, "2", None).await;
    mount_detail(&server, "3", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    run_scrape(&config, "hash", &storage)
        .await
        .expect("Scrape failed");

    assert_eq!(storage.count_records().unwrap(), 3);

    let record = storage.get_record("2").unwrap().unwrap();
    assert_eq!(record.fields.effective_date, None);
    assert!(record.fields.issuing_reference.is_some());
    assert!(record.fields.publish_date.is_some());
    assert!(record.fields.issuing_authority.is_some());
    assert!(record.fields.legal_tier.is_some());
    assert!(record.fields.body_text.is_some());

    let other = storage.get_record("1").unwrap().unwrap();
    assert!(other.fields.effective_date.is_some());
}

#[tokio::test]
async fn test_listing_404_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 10, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let err = run_scrape(&config, "hash", &storage)
        .await
        .expect_err("404 listing must abort");

    assert!(matches!(err, ScrapeError::Fetch { status: 404, .. }));
    assert_eq!(err.status(), Some(404));
    assert_eq!(storage.count_records().unwrap(), 0);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error_message.unwrap().contains("404"));
}

#[tokio::test]
async fn test_never_more_than_ten_listing_fetches() {
    let server = MockServer::start().await;

    // Every listing page offers a next page
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(listing_page(&["1"], "/search?kw=labour&p=99")))
        .expect(10)
        .mount(&server)
        .await;
    mount_detail(&server, "1", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 10, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("Scrape failed");

    assert_eq!(summary.pages_walked, 10);
    assert_eq!(summary.records_inserted, 1);
    assert_eq!(summary.duplicates, 9);
    assert_eq!(storage.count_records().unwrap(), 1);
}

#[tokio::test]
async fn test_follows_next_link() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2"], "/search?kw=labour&p=2"),
    )
    .await;
    mount_listing(
        &server,
        "2",
        listing_page(&["3", "4"], "/search?kw=labour&p=3"),
    )
    .await;
    for id in ["1", "2", "3", "4"] {
        mount_detail(&server, id, Some("2021-01-01")).await;
    }

    let config = create_test_config(&server.uri(), 2, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("Scrape failed");

    assert_eq!(summary.pages_walked, 2);
    assert_eq!(storage.count_records().unwrap(), 4);
}

#[tokio::test]
async fn test_empty_results_page_ends_walk() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1"], "/search?kw=labour&p=2"),
    )
    .await;
    mount_listing(&server, "2", listing_page(&[], "/search?kw=labour&p=3")).await;
    mount_detail(&server, "1", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 10, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("Running out of results is not an error");

    assert_eq!(summary.pages_walked, 1);
    assert_eq!(summary.records_inserted, 1);
}

#[tokio::test]
async fn test_broken_listing_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2"], "/search?kw=labour&p=2"),
    )
    .await;
    mount_listing(
        &server,
        "2",
        "<html><body><p>Please log in</p></body></html>".to_string(),
    )
    .await;
    mount_detail(&server, "1", Some("2021-01-01")).await;
    mount_detail(&server, "2", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 10, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let err = run_scrape(&config, "hash", &storage)
        .await
        .expect_err("Missing list container must abort");

    assert!(matches!(err, ScrapeError::Extract { .. }));
    assert_eq!(storage.count_records().unwrap(), 2);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.pages_walked, 1);
    assert_eq!(run.records_inserted, 2);
}

#[tokio::test]
async fn test_unreadable_result_item_is_skipped() {
    let server = MockServer::start().await;
    let listing = listing_page(&["1", "3"], "/search?kw=labour&p=2").replacen(
        "</li>",
        r#"</li><li><div class="div05"><h2><a href="/ad" title="Sponsored">Sponsored</a></h2></div></li>"#,
        1,
    );
    mount_listing(&server, "1", listing).await;
    mount_detail(&server, "1", Some("2021-01-01")).await;
    mount_detail(&server, "3", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("One unreadable item must not abort the run");

    assert_eq!(summary.pages_walked, 1);
    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.detail_failures, 1);
    assert!(storage.get_record("1").unwrap().is_some());
    assert!(storage.get_record("3").unwrap().is_some());

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.failures, 1);
}

#[tokio::test]
async fn test_detail_failure_is_collected() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2", "3"], "/search?kw=labour&p=2"),
    )
    .await;
    mount_detail(&server, "1", Some("2021-01-01")).await;
    Mock::given(method("GET"))
        .and(path("/doc/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_detail(&server, "3", Some("2021-01-01")).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("A failed detail page must not abort the run");

    assert_eq!(summary.records_inserted, 2);
    assert_eq!(summary.detail_failures, 1);
    assert!(storage.get_record("2").unwrap().is_none());

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.failures, 1);
}

#[tokio::test]
async fn test_second_run_skips_duplicates() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        listing_page(&["1", "2", "3"], "/search?kw=labour&p=2"),
    )
    .await;
    for id in ["1", "2", "3"] {
        mount_detail(&server, id, Some("2021-01-01")).await;
    }

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("law_star.db");
    let config = create_test_config(&server.uri(), 1, db_path.to_str().unwrap());

    let first = scrape(&config, "hash").await.expect("First run failed");
    let second = scrape(&config, "hash").await.expect("Second run failed");

    assert_eq!(first.records_inserted, 3);
    assert_eq!(second.records_inserted, 0);
    assert_eq!(second.duplicates, 3);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_records().unwrap(), 3);
    assert_eq!(storage.count_runs().unwrap(), 2);
}

#[tokio::test]
async fn test_requests_carry_cookie_and_user_agent() {
    let server = MockServer::start().await;

    // Only authenticated requests get a listing; anything else falls through to 404
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("kw", "labour"))
        .and(header("cookie", AUTH_TOKEN))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html(listing_page(&["1"], "/search?kw=labour&p=2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc/1"))
        .and(header("cookie", AUTH_TOKEN))
        .respond_with(html(detail_page("1", Some("2021-01-01"))))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let storage = SqliteStorage::new_in_memory().unwrap();

    let summary = run_scrape(&config, "hash", &storage)
        .await
        .expect("Scrape failed");
    assert_eq!(summary.records_inserted, 1);
}

#[tokio::test]
async fn test_detail_worker_keeps_stub_identity() {
    let server = MockServer::start().await;
    mount_detail(&server, "77", None).await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let fetcher = Fetcher::new(&config.session, &config.scraper).unwrap();
    let worker = DetailWorker::new(fetcher, Arc::new(Extractor::new().unwrap()));

    let stub = ResultStub {
        identifier: "77".to_string(),
        url: format!("{}/doc/77", server.uri()),
        title: "Seventy-seven".to_string(),
    };
    let record = worker.resolve(stub.clone()).await.unwrap();

    assert_eq!(record.identifier, stub.identifier);
    assert_eq!(record.url, stub.url);
    assert_eq!(record.title, stub.title);
    assert_eq!(record.fields.effective_date, None);
    assert_eq!(record.fields.present_count(), 5);
}

#[tokio::test]
async fn test_fetch_non_200_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc/1"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/doc/1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc/2"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 1, ":memory:");
    let fetcher = Fetcher::new(&config.session, &config.scraper).unwrap();

    let err = fetcher.fetch(Some("/doc/2")).await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    // A redirect loop is left to the transport, which gives up with its own error
    let err = fetcher.fetch(Some("/doc/1")).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Http { .. }));
}
