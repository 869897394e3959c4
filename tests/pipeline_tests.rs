//! End-to-end pipeline tests against a local mock HTTP server

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use civicfinder::checkpoint::{generate_settings_hash, Checkpoint};
use civicfinder::config::{AppConfig, DEFAULT_CONFIG};
use civicfinder::entity::{Entity, EntityCategory, ResolutionStatus};
use civicfinder::logger::{RunLogger, VerbosityLevel};
use civicfinder::pipeline::Pipeline;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Default config rewired so candidate patterns hit the mock server
/// and the politeness delay doesn't slow tests down
fn test_config(patterns: Vec<String>) -> AppConfig {
    let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
    config.crawl.request_delay_secs = 0;
    config.candidates.insert(EntityCategory::Government, patterns);
    config
}

fn frederick() -> Entity {
    Entity {
        name: "Frederick County".to_string(),
        county: None,
        state: "MD".to_string(),
        category: EntityCategory::Government,
        distance: 0.0,
    }
}

#[tokio::test]
async fn probing_stops_at_first_successful_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary/frederickmd"))
        .respond_with(html("<html><body>County seat</body></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secondary/frederickmd"))
        .respond_with(html("<html><body>Should never be fetched</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(
        vec![
            format!("{}/primary/{{name}}{{state}}", server.uri()),
            format!("{}/secondary/{{name}}{{state}}", server.uri()),
        ],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let outcome = pipeline.process_entity(&frederick()).await;
    assert_eq!(
        outcome.result.site_url.as_deref(),
        Some(format!("{}/primary/frederickmd", server.uri()).as_str())
    );
}

#[tokio::test]
async fn all_candidates_failing_yields_unresolved_with_manual_item() {
    let server = MockServer::start().await;
    // No mocks mounted: every candidate gets a 404

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let outcome = pipeline.process_entity(&frederick()).await;
    assert_eq!(outcome.result.status, ResolutionStatus::Unresolved);
    assert!(outcome.result.site_url.is_none());
    assert!(outcome.result.emails.is_empty());
    assert!(outcome.result.contacts.is_empty());

    let manual = outcome.manual.expect("unresolved entity must queue manual research");
    assert_eq!(manual.entity_name, "Frederick County");
    assert_eq!(
        manual.search_query,
        "Frederick County MD official government website"
    );
}

#[tokio::test]
async fn resolved_site_with_extractions_is_found() {
    let server = MockServer::start().await;

    let root = r#"
        <html><body>
            <h1>Frederick County</h1>
            <a href="/departments/aging">Aging Services</a>
            <a href="/news/latest">News</a>
        </body></html>
    "#;
    let aging = r#"
        <html><body>
            <p>Contact: Jane Smith, Aging Services Director, jane.smith@co.example.gov</p>
        </body></html>
    "#;

    Mock::given(method("GET"))
        .and(path("/frederickmd"))
        .respond_with(html(root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/departments/aging"))
        .respond_with(html(aging))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let outcome = pipeline.process_entity(&frederick()).await;
    let result = &outcome.result;

    assert_eq!(result.status, ResolutionStatus::Found);
    assert!(outcome.manual.is_none());
    assert_eq!(
        result.department_pages,
        vec![format!("{}/departments/aging", server.uri())]
    );

    let emails: Vec<&str> = result.emails.iter().map(|e| e.email.as_str()).collect();
    assert_eq!(emails, vec!["jane.smith@co.example.gov"]);
    let email = result.emails.iter().next().unwrap();
    assert_eq!(
        email.source_url,
        format!("{}/departments/aging", server.uri())
    );

    assert_eq!(result.contacts.len(), 1);
    let contact = result.contacts.iter().next().unwrap();
    assert_eq!(contact.name, "Jane Smith");
    assert_eq!(contact.title, "Director");
}

#[tokio::test]
async fn resolved_site_with_nothing_extracted_is_partial() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/frederickmd"))
        .respond_with(html("<html><body><h1>Welcome</h1></body></html>"))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let outcome = pipeline.process_entity(&frederick()).await;
    assert_eq!(outcome.result.status, ResolutionStatus::Partial);
    assert!(outcome.result.site_url.is_some());
    assert!(outcome.manual.is_some());
}

#[tokio::test]
async fn failed_department_pages_are_omitted_not_fatal() {
    let server = MockServer::start().await;

    let root = r#"
        <html><body>
            <a href="/departments/aging">Aging Services</a>
            <a href="/departments/health">Health Department</a>
        </body></html>
    "#;
    Mock::given(method("GET"))
        .and(path("/frederickmd"))
        .respond_with(html(root))
        .mount(&server)
        .await;
    // /departments/aging is never mounted and 404s
    Mock::given(method("GET"))
        .and(path("/departments/health"))
        .respond_with(html("<p>records@co.example.gov</p>"))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let outcome = pipeline.process_entity(&frederick()).await;
    assert_eq!(outcome.result.status, ResolutionStatus::Found);
    assert_eq!(
        outcome.result.department_pages,
        vec![format!("{}/departments/health", server.uri())]
    );
}

#[tokio::test]
async fn reprocessing_an_entity_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/frederickmd"))
        .respond_with(html(
            "<html><body><p>clerk@co.example.gov</p></body></html>",
        ))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();

    let first = pipeline.process_entity(&frederick()).await;
    let second = pipeline.process_entity(&frederick()).await;
    assert_eq!(first.result, second.result);
}

#[tokio::test]
async fn outcomes_survive_a_checkpoint_roundtrip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/frederickmd"))
        .respond_with(html("<p>clerk@co.example.gov</p>"))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/{{name}}{{state}}", server.uri())],
    );
    let logger = RunLogger::new(VerbosityLevel::Summary);
    let pipeline = Pipeline::new(&config, &logger).unwrap();
    let outcome = pipeline.process_entity(&frederick()).await;

    let dir = tempfile::TempDir::new().unwrap();
    let hash = generate_settings_hash(0, 10, 10, "seeds.csv");
    let mut checkpoint = Checkpoint::new(hash, dir.path());
    let expected = outcome.result.clone();
    checkpoint.record_entity(outcome.result, outcome.manual);
    checkpoint.save().unwrap();

    let loaded = Checkpoint::load(dir.path()).unwrap();
    assert!(loaded.is_completed(&frederick().id()));
    let results = loaded.results_in_order();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0], &expected);
}
