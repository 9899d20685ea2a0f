//! Mock Rodin vendor for integration tests
//!
//! Serves the `v2/rodin`, `v2/status` and `v2/download` endpoints under
//! `/api/` plus a file host for the assets under `/assets/`.

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::config::TEST_API_KEY;

/// Mock vendor with helpers for the canned responses the tools depend on
pub struct MockRodin {
    server: MockServer,
}

impl MockRodin {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to configure the client with
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("{}/api/", self.server.uri())).expect("valid mock URL")
    }

    /// Download URL of an asset on the mock file host
    pub fn asset_url(&self, name: &str) -> String {
        format!("{}/assets/{name}", self.server.uri())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Accept submissions with the test key and answer with a task descriptor
    pub async fn accept_submissions(&self, task_uuid: &str, subscription_key: &str) {
        Mock::given(method("POST"))
            .and(path("/api/v2/rodin"))
            .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
            .respond_with(ResponseTemplate::new(201).set_body_json(submit_body(task_uuid, subscription_key)))
            .mount(&self.server)
            .await;
    }

    /// Reject submissions with the given status and body
    pub async fn reject_submissions(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/v2/rodin"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Report the given job statuses for a subscription key
    pub async fn report_statuses(&self, subscription_key: &str, statuses: &[&str]) {
        let jobs: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| json!({ "uuid": format!("job-{i}"), "status": status }))
            .collect();

        Mock::given(method("POST"))
            .and(path("/api/v2/status"))
            .and(body_string_contains(subscription_key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": jobs })))
            .mount(&self.server)
            .await;
    }

    /// Publish the manifest of a task, pointing every asset at the mock file host
    pub async fn publish_manifest(&self, task_uuid: &str, names: &[&str]) {
        let list: Vec<_> = names
            .iter()
            .map(|name| json!({ "name": name, "url": self.asset_url(name) }))
            .collect();

        Mock::given(method("POST"))
            .and(path("/api/v2/download"))
            .and(body_string_contains(task_uuid))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": list })))
            .mount(&self.server)
            .await;
    }

    /// Expect the manifest endpoint never to be called
    pub async fn forbid_manifest(&self) {
        Mock::given(method("POST"))
            .and(path("/api/v2/download"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Serve an asset's bytes
    pub async fn host_asset(&self, name: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/assets/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Fail the first `failures` fetches of an asset with 502, then serve it
    pub async fn host_flaky_asset(&self, name: &str, failures: u64, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(format!("/assets/{name}")))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&self.server)
            .await;

        self.host_asset(name, body).await;
    }

    /// Answer every fetch of an asset with 404, expecting exactly `attempts` fetches
    pub async fn withhold_asset(&self, name: &str, attempts: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/assets/{name}")))
            .respond_with(ResponseTemplate::new(404))
            .expect(attempts)
            .mount(&self.server)
            .await;
    }
}

/// Task descriptor as returned by `v2/rodin`
pub fn submit_body(task_uuid: &str, subscription_key: &str) -> Value {
    json!({
        "error": null,
        "message": "Submitted.",
        "prompt": "A brass telescope on a tripod",
        "submit_time": "2026-10-17T09:00:00Z",
        "uuid": task_uuid,
        "jobs": {
            "uuids": ["job-0", "job-1"],
            "subscription_key": subscription_key
        }
    })
}
