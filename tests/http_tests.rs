//! Integration tests for the HTTP-backed collaborators

use rankscout::config::{GeneratorConfig, SearchConfig, UserAgentConfig};
use rankscout::fetch::{FetchError, FetchOptions, HttpPageFetcher, PageFetcher};
use rankscout::generate::{ChatCompletionsGenerator, GenerationError, Prompt, PromptTemplate, TextGenerator};
use rankscout::research::{HttpSearchEngine, SearchEngine, SearchError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body><main>{}</main></body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn user_agent(respect_robots: bool) -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        respect_robots,
        ..UserAgentConfig::default()
    }
}

fn search_engine(server: &MockServer) -> HttpSearchEngine {
    let config = SearchConfig {
        endpoint: format!("{}/v1/search", server.uri()),
        ..SearchConfig::default()
    };
    HttpSearchEngine::new(&config, "search-key").unwrap()
}

fn generator(server: &MockServer) -> ChatCompletionsGenerator {
    let config = GeneratorConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        ..GeneratorConfig::default()
    };
    ChatCompletionsGenerator::new(&config, "llm-key").unwrap()
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_search_posts_query_and_reads_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .and(header("authorization", "Bearer search-key"))
        .and(body_json(json!({"query": "local seo", "limit": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"url": "https://a.example/guide", "title": "Guide"},
                {"url": "  "},
                {"url": "https://b.example", "description": "B"},
                {"url": "https://c.example"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = search_engine(&server).search("local seo", 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].url, "https://a.example/guide");
    assert_eq!(hits[0].title.as_deref(), Some("Guide"));
    assert_eq!(hits[1].url, "https://b.example");
    assert_eq!(hits[1].description.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_search_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(402).set_body_string("out of credits"))
        .mount(&server)
        .await;

    let result = search_engine(&server).search("local seo", 5).await;
    match result {
        Err(SearchError::Status { status, body }) => {
            assert_eq!(status, 402);
            assert_eq!(body, "out of credits");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_generator_parses_json_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer llm-key"))
        .respond_with(chat_reply(r##"{"report": "# Done"}"##))
        .expect(1)
        .mount(&server)
        .await;

    let prompt = Prompt::new(PromptTemplate::ReportSynthesis).with("topic", "local seo");
    let value = generator(&server).generate(&prompt).await.unwrap();

    assert_eq!(value["report"], "# Done");
}

#[tokio::test]
async fn test_generator_non_json_content_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_reply("Sure! Here are some queries: ..."))
        .mount(&server)
        .await;

    let prompt = Prompt::new(PromptTemplate::QueryGeneration).with("topic", "local seo");
    let result = generator(&server).generate(&prompt).await;

    assert!(matches!(result, Err(GenerationError::Parse(_))));
    assert!(result.unwrap_err().is_parse_failure());
}

#[tokio::test]
async fn test_generator_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let prompt = Prompt::new(PromptTemplate::QueryGeneration);
    let result = generator(&server).generate(&prompt).await;

    assert!(matches!(
        result,
        Err(GenerationError::Status { status: 429, .. })
    ));
}

#[tokio::test]
async fn test_fetcher_honors_robots_txt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html("<p>Open page</p>"))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(&user_agent(true)).unwrap();
    let options = FetchOptions::default();

    let denied = fetcher
        .fetch(&format!("{}/private/page", server.uri()), &options)
        .await;
    assert!(matches!(denied, Err(FetchError::RobotsDenied { .. })));

    let page = fetcher
        .fetch(&format!("{}/public", server.uri()), &options)
        .await
        .unwrap();
    assert_eq!(page.status_code, 200);
    assert_eq!(page.text, "Open page");
}

#[tokio::test]
async fn test_fetcher_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "application/octet-stream"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("   ", "text/html"))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(&user_agent(false)).unwrap();
    let options = FetchOptions::default();

    let gone = fetcher.fetch(&format!("{}/gone", server.uri()), &options).await;
    assert!(matches!(gone, Err(FetchError::Status { status: 410, .. })));

    let binary = fetcher
        .fetch(&format!("{}/report.bin", server.uri()), &options)
        .await;
    assert!(matches!(binary, Err(FetchError::ContentMismatch { .. })));

    let blank = fetcher.fetch(&format!("{}/blank", server.uri()), &options).await;
    assert!(matches!(blank, Err(FetchError::Empty { .. })));
}

#[tokio::test]
async fn test_fetcher_cache_serves_repeat_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html(r#"<p>Cached body</p><a href="/next">Next</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(&user_agent(false)).unwrap();
    let options = FetchOptions {
        use_cache: true,
        only_main_content: true,
        ..FetchOptions::default()
    };
    let url = format!("{}/article", server.uri());

    let first = fetcher.fetch(&url, &options).await.unwrap();
    let second = fetcher.fetch(&url, &options).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.links, vec![format!("{}/next", server.uri())]);
}
