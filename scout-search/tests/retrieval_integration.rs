//! Integration tests for search and scraping against local mock servers.
//!
//! Every backend and page is served by wiremock; nothing touches the network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scout_search::{
    RateLimiter, RequestHeaders, RetrievalConfig, RetrievalError, RetrieverRegistry,
    ScraperDispatcher, SearchOrchestrator, VisitedUrls,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article(title: &str) -> String {
    let paragraph = "Structured concurrency keeps every spawned task inside a scope that outlives it. ";
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav>Home | About</nav><article><h1>{title}</h1><p>{}</p></article>\
         <footer>Copyright</footer></body></html>",
        paragraph.repeat(4)
    )
}

async fn serve_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn urls(server: &MockServer, routes: &[&str]) -> Vec<String> {
    routes
        .iter()
        .map(|route| format!("{}{route}", server.uri()))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rate_limited_batch_spaces_request_starts() {
    let server = MockServer::start().await;
    for route in ["/one", "/two", "/three"] {
        serve_page(&server, route, article(route)).await;
    }
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = RetrievalConfig {
        max_workers: 2,
        rate_limit_delay_secs: 0.5,
        ..Default::default()
    };
    let dispatcher =
        ScraperDispatcher::new(&config, reqwest::Client::new(), Arc::new(RateLimiter::new()));
    let input = urls(&server, &["/one", "/broken", "/two", "/three"]);

    let started = Instant::now();
    let docs = dispatcher.fetch_all(&input).await;
    let elapsed = started.elapsed();

    assert!(
        elapsed >= Duration::from_millis(1500),
        "four starts 0.5s apart take at least 1.5s, took {elapsed:?}"
    );
    let got: Vec<_> = docs.iter().map(|d| (d.url.as_str(), d.success)).collect();
    assert_eq!(
        got,
        vec![
            (input[0].as_str(), true),
            (input[1].as_str(), false),
            (input[2].as_str(), true),
            (input[3].as_str(), true),
        ]
    );
    assert_eq!(docs[0].title, "/one");
    let text = docs[0].raw_content.as_deref().unwrap_or_default();
    assert!(text.contains("Structured concurrency"));
    assert!(!text.contains("Copyright"), "boilerplate stripped");
}

#[tokio::test]
async fn short_page_is_unsuccessful() {
    let server = MockServer::start().await;
    serve_page(&server, "/stub", "<html><body><p>Coming soon.</p></body></html>".into()).await;

    let dispatcher = ScraperDispatcher::new(
        &RetrievalConfig::default(),
        reqwest::Client::new(),
        Arc::new(RateLimiter::new()),
    );
    let docs = dispatcher.fetch_all(&urls(&server, &["/stub"])).await;
    assert_eq!(docs.len(), 1);
    assert!(!docs[0].success);
    assert!(docs[0].raw_content.is_none());
}

#[tokio::test]
async fn session_skips_already_visited_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article("Guide")))
        .expect(1)
        .mount(&server)
        .await;
    serve_page(&server, "/faq", article("FAQ")).await;

    let visited = VisitedUrls::new();
    let dispatcher = ScraperDispatcher::new(
        &RetrievalConfig::default(),
        reqwest::Client::new(),
        Arc::new(RateLimiter::new()),
    );

    let first = visited.filter_new(urls(&server, &["/guide", "/guide"]));
    assert_eq!(first.len(), 1);
    let docs = dispatcher.fetch_all(&first).await;
    assert!(docs[0].success);

    let second = visited.filter_new(urls(&server, &["/guide", "/faq"]));
    assert_eq!(second, urls(&server, &["/faq"]));
    let docs = dispatcher.fetch_all(&second).await;
    assert_eq!(docs[0].title, "FAQ");
    assert_eq!(visited.len(), 2);
}

#[test]
fn header_list_resolves_in_order() {
    let registry = RetrieverRegistry::with_builtin();
    let mut headers = RequestHeaders::new();
    headers.insert("retrievers".into(), "arxiv, duckduckgo, arxiv".into());

    let resolved = registry
        .resolve(&headers, &RetrievalConfig::default())
        .expect("known names resolve");
    let names: Vec<_> = resolved.iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["arxiv", "duckduckgo"]);
}

#[tokio::test]
async fn searx_results_flow_through_orchestrator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"url": "https://tokio.rs/tokio/tutorial", "title": "Tokio tutorial", "content": "Learn tokio"},
                {"url": "https://www.youtube.com/watch?v=abc", "title": "Video", "content": "Watch"},
                {"url": "https://tokio.rs/tokio/tutorial/", "title": "Duplicate", "content": "Again"},
                {"url": "https://docs.rs/tokio", "title": "docs.rs", "content": "API docs"}
            ]
        })))
        .mount(&server)
        .await;

    let mut config = RetrievalConfig {
        retriever: "searx".into(),
        ..Default::default()
    };
    config.endpoints.insert("searx".into(), server.uri());
    let orchestrator = SearchOrchestrator::new(
        Arc::new(RetrieverRegistry::with_builtin()),
        Arc::new(config),
        reqwest::Client::new(),
    );

    let results = orchestrator
        .search("tokio tutorial", &RequestHeaders::new(), &[])
        .await
        .expect("searx answers");
    let hrefs: Vec<_> = results.iter().map(|r| r.href.as_str()).collect();
    assert_eq!(
        hrefs,
        vec!["https://tokio.rs/tokio/tutorial", "https://docs.rs/tokio"]
    );
}

#[tokio::test]
async fn unknown_name_in_strict_mode_is_config_error() {
    let config = RetrievalConfig {
        retriever: "altavista".into(),
        strict_retriever_names: true,
        ..Default::default()
    };
    let orchestrator = SearchOrchestrator::new(
        Arc::new(RetrieverRegistry::with_builtin()),
        Arc::new(config),
        reqwest::Client::new(),
    );
    let err = orchestrator
        .search("anything", &RequestHeaders::new(), &[])
        .await
        .expect_err("strict mode rejects unknown names");
    assert!(matches!(err, RetrievalError::Config(_)));
}
