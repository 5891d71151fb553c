use std::sync::Mutex;
use std::time::Duration;

use pretty_assertions::assert_eq;
use txtreader_engine::{
    EngineEvent, FailureKind, FetchSettings, Fetcher, JobProgress, ProgressSink, ReqwestFetcher,
    Stage,
};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    fn progress(&self) -> Vec<JobProgress> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Progress(progress) => Some(progress.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(FetchSettings::default()).unwrap()
}

async fn serve(route: &str, response: ResponseTemplate) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    let url = format!("{}{route}", server.uri());
    (server, url)
}

#[tokio::test]
async fn catalog_page_arrives_with_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<a>第一章</a>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;
    let url = format!("{}/book/", server.uri());
    let sink = RecordingSink::default();

    let page = fetcher().fetch(1, &url, &sink).await.unwrap();

    assert_eq!(page.final_url, url);
    assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert_eq!(page.bytes, "<a>第一章</a>".as_bytes());
    let progress = sink.progress();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].stage, Stage::Fetching);
    assert_eq!(progress[0].bytes, Some(page.bytes.len() as u64));
}

#[tokio::test]
async fn redirected_page_reports_where_it_landed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>toc</p>", "text/html"))
        .mount(&server)
        .await;

    let page = fetcher()
        .fetch(2, &format!("{}/old", server.uri()), &RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(page.final_url, format!("{}/new/", server.uri()));
}

#[tokio::test]
async fn missing_page_is_an_http_status_failure() {
    let (_server, url) = serve("/gone", ResponseTemplate::new(404)).await;
    let err = fetcher()
        .fetch(3, &url, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn plain_text_is_not_a_catalog_page() {
    let (_server, url) = serve(
        "/book.txt",
        ResponseTemplate::new(200).set_body_raw("chapter one", "text/plain"),
    )
    .await;
    let sink = RecordingSink::default();

    let err = fetcher().fetch(4, &url, &sink).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "text/plain".to_string()
        }
    );
    assert!(sink.progress().is_empty());
}

#[tokio::test]
async fn slow_site_times_out() {
    let (_server, url) = serve(
        "/slow",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(250))
            .set_body_raw("<p>late</p>", "text/html"),
    )
    .await;
    let fetcher = ReqwestFetcher::new(FetchSettings {
        timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    })
    .unwrap();

    let err = fetcher
        .fetch(5, &url, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_page_is_refused() {
    let (_server, url) = serve(
        "/huge",
        ResponseTemplate::new(200).set_body_raw("<p>0123456789</p>", "text/html"),
    )
    .await;
    let fetcher = ReqwestFetcher::new(FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    })
    .unwrap();

    let err = fetcher
        .fetch(6, &url, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: 17
        }
    );
}
