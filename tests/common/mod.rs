//! Common test utilities for emoji-export integration tests

use emoji_export::store::CATALOG_FILE_NAME;
use emoji_export::{CatalogEntry, Config, SlackConfig};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches a form-encoded body containing `name=value`
pub struct FormField(pub &'static str, pub String);

impl Match for FormField {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body).any(|(k, v)| k == self.0 && v == self.1)
    }
}

pub fn config(server: &MockServer, directory: &Path) -> Config {
    Config {
        directory: directory.to_path_buf(),
        slack: SlackConfig {
            token: "xoxs-e2e".to_string(),
            route: "T0E2E".to_string(),
            cookie: String::new(),
            base_url: server.uri(),
            request_timeout_secs: Some(10),
        },
    }
}

/// Serve a workspace of `total` emoji whose images live under `/img/<i>.<ext>`
///
/// Every page of 100 is served; the count request reports `total`.
pub async fn mount_workspace(server: &MockServer, total: usize, ext: &str) {
    let record = |i: usize| {
        json!({
            "name": format!("emoji-{i}"),
            "is_alias": 0,
            "url": format!("{}/img/{i}.{ext}", server.uri()),
            "team_id": "T0E2E",
            "user_id": "U1",
            "created": 1_600_000_000 + i,
            "synonyms": [format!("syn-{i}")]
        })
    };

    Mock::given(method("POST"))
        .and(path("/api/emoji.adminList"))
        .and(FormField("count", "1".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "emoji": [record(0)],
            "paging": {"count": 1, "total": total, "page": 1, "pages": total}
        })))
        .mount(server)
        .await;

    let pages = total.div_ceil(100);
    for page in 1..=pages {
        let first = (page - 1) * 100;
        let last = (first + 100).min(total);
        let emoji: Vec<_> = (first..last).map(record).collect();
        Mock::given(method("POST"))
            .and(path("/api/emoji.adminList"))
            .and(FormField("count", "100".to_string()))
            .and(FormField("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "emoji": emoji,
                "paging": {"count": 100, "total": total, "page": page, "pages": pages}
            })))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.\w+$"))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200).set_body_bytes(request.url.path().as_bytes().to_vec())
        })
        .mount(server)
        .await;
}

pub fn read_catalog(dir: &Path) -> Vec<CatalogEntry> {
    std::fs::read_to_string(dir.join(CATALOG_FILE_NAME))
        .expect("catalog should exist")
        .lines()
        .map(|line| serde_json::from_str(line).expect("catalog line should be JSON"))
        .collect()
}
