//! Shared test helpers: mock listing endpoint, record fixtures, catalog reader.

use crate::config::{Config, SlackConfig};
use crate::store::CATALOG_FILE_NAME;
use crate::types::CatalogEntry;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches a form-encoded body containing `name=value`
pub(crate) struct FormField {
    name: &'static str,
    value: String,
}

impl Match for FormField {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body).any(|(k, v)| k == self.name && v == self.value)
    }
}

pub(crate) fn form_field(name: &'static str, value: impl ToString) -> FormField {
    FormField {
        name,
        value: value.to_string(),
    }
}

pub(crate) fn slack_config(server: &MockServer) -> SlackConfig {
    SlackConfig {
        token: "xoxs-test".to_string(),
        route: "T0123".to_string(),
        cookie: "d=abc".to_string(),
        base_url: server.uri(),
        request_timeout_secs: None,
    }
}

pub(crate) fn test_config(server: &MockServer, directory: &Path) -> Config {
    Config {
        directory: directory.to_path_buf(),
        slack: slack_config(server),
    }
}

/// Record JSON whose image lives on the mock server under `/img/<i>.png`
pub(crate) fn record_json(server: &MockServer, i: usize) -> serde_json::Value {
    json!({
        "name": format!("emoji-{i}"),
        "is_alias": 0,
        "url": format!("{}/img/{i}.png", server.uri()),
        "team_id": "T1",
        "user_id": "U1",
        "created": 1_600_000_000 + i,
        "synonyms": []
    })
}

pub(crate) fn list_body(emoji: Vec<serde_json::Value>, total: usize) -> serde_json::Value {
    let count = emoji.len();
    json!({
        "ok": true,
        "emoji": emoji,
        "paging": {"count": count, "total": total, "page": 1, "pages": 1}
    })
}

/// Page of `records` consecutive mock-server records starting at `first`
pub(crate) fn page_body(
    server: &MockServer,
    first: usize,
    records: usize,
    total: usize,
) -> serde_json::Value {
    let emoji = (first..first + records)
        .map(|i| record_json(server, i))
        .collect();
    list_body(emoji, total)
}

pub(crate) fn ok_page(
    server: &MockServer,
    first: usize,
    records: usize,
    total: usize,
) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(page_body(server, first, records, total))
}

/// Answer the one-record count request with `total`
pub(crate) async fn mount_count(server: &MockServer, total: usize) {
    let body = if total == 0 {
        list_body(vec![], 0)
    } else {
        page_body(server, 0, 1, total)
    };
    Mock::given(method("POST"))
        .and(path("/api/emoji.adminList"))
        .and(form_field("count", 1))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer listing page `page` (page size 100) with `response`
pub(crate) async fn mount_page(
    server: &MockServer,
    page: usize,
    response: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path("/api/emoji.adminList"))
        .and(form_field("count", 100))
        .and(form_field("page", page))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub(crate) fn read_catalog(dir: &Path) -> Vec<CatalogEntry> {
    std::fs::read_to_string(dir.join(CATALOG_FILE_NAME))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Names of every file in `dir` other than the catalog
pub(crate) fn image_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != CATALOG_FILE_NAME)
        .collect();
    names.sort();
    names
}
