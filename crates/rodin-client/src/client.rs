use std::path::Path;

use reqwest::multipart::{Form, Part};
use rodin_config::{DownloadConfig, PollConfig, RodinConfig};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Result, RodinError};
use crate::types::{
    AssetManifest, DownloadListResponse, GenerationRequest, JobStatus, StatusResponse, SubmitResponse,
};

/// Vendor endpoints, resolved once against the configured base URL
#[derive(Debug, Clone)]
struct Endpoints {
    submit: Url,
    status: Url,
    download: Url,
}

impl Endpoints {
    fn resolve(base_url: &Url) -> Result<Self> {
        let join = |path: &str| {
            base_url
                .join(path)
                .map_err(|e| RodinError::Config(format!("invalid base URL {base_url}: {e}")))
        };

        Ok(Self {
            submit: join("v2/rodin")?,
            status: join("v2/status")?,
            download: join("v2/download")?,
        })
    }
}

/// Async HTTP client for the Rodin API
#[derive(Clone)]
pub struct RodinClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    api_key: SecretString,
    pub(crate) poll: PollConfig,
    pub(crate) download: DownloadConfig,
}

impl RodinClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::Config`] if the HTTP client cannot be built or
    /// the base URL cannot carry endpoint paths
    pub fn new(config: &RodinConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RodinError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoints: Endpoints::resolve(&config.base_url)?,
            api_key: config.api_key.clone(),
            poll: config.poll,
            download: config.download,
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    /// Submit a generation task
    ///
    /// POST `v2/rodin` as multipart. Exactly one attempt is made.
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::Api`] on transport failure or a non-success
    /// status, [`RodinError::InvalidRequest`] if an image part is invalid
    pub async fn submit(&self, request: GenerationRequest) -> Result<SubmitResponse> {
        let image_count = request.images.len();
        let form = build_form(request)?;

        tracing::debug!(images = image_count, "submitting Rodin generation task");

        let response = self
            .http
            .post(self.endpoints.submit.clone())
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| RodinError::transport("v2/rodin", &e))?;

        if !response.status().is_success() {
            let error = RodinError::from_response("v2/rodin", response).await;
            tracing::error!(error = %error, "Rodin submission rejected");
            return Err(error);
        }

        let text = response
            .text()
            .await
            .map_err(|e| RodinError::transport("v2/rodin", &e))?;

        Ok(serde_json::from_str(&text).map_or(SubmitResponse::Text(text), SubmitResponse::Json))
    }

    /// Fetch the current status of every job in a task
    ///
    /// POST `v2/status` with form field `subscription_key`
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::Api`] on transport failure or a non-success
    /// status, [`RodinError::MalformedResponse`] if the body has no job list
    pub async fn job_statuses(&self, subscription_key: &str) -> Result<Vec<JobStatus>> {
        let response = self
            .http
            .post(self.endpoints.status.clone())
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .form(&[("subscription_key", subscription_key)])
            .send()
            .await
            .map_err(|e| RodinError::transport("v2/status", &e))?;

        if !response.status().is_success() {
            return Err(RodinError::from_response("v2/status", response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| RodinError::transport("v2/status", &e))?;

        let parsed: StatusResponse = serde_json::from_str(&body)
            .map_err(|e| RodinError::MalformedResponse(format!("status response ({e}): {body}")))?;

        Ok(parsed.jobs.iter().map(|job| JobStatus::parse(&job.status)).collect())
    }

    /// Fetch the name-to-URL manifest of a finished task
    ///
    /// POST `v2/download` with form field `task_uuid`
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::Api`] on transport failure or a non-success
    /// status, [`RodinError::MalformedResponse`] if the asset list is missing
    /// or holds an unusable entry
    pub async fn asset_manifest(&self, task_uuid: &str) -> Result<AssetManifest> {
        let response = self
            .http
            .post(self.endpoints.download.clone())
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .form(&[("task_uuid", task_uuid)])
            .send()
            .await
            .map_err(|e| RodinError::transport("v2/download", &e))?;

        if !response.status().is_success() {
            return Err(RodinError::from_response("v2/download", response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| RodinError::transport("v2/download", &e))?;

        let parsed: DownloadListResponse = serde_json::from_str(&body)
            .map_err(|e| RodinError::MalformedResponse(format!("download response ({e}): {body}")))?;

        AssetManifest::from_entries(parsed.list.into_iter().map(|entry| (entry.name, entry.url)))
    }

    /// Download one asset and write it to `path`, overwriting
    ///
    /// A single attempt; asset URLs are pre-signed so no credential is sent.
    ///
    /// # Errors
    ///
    /// Returns [`RodinError::Api`] if the download fails and
    /// [`RodinError::Io`] if the file cannot be written
    pub async fn fetch_asset(&self, url: &Url, path: &Path) -> Result<()> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RodinError::transport(url.as_str(), &e))?;

        if !response.status().is_success() {
            return Err(RodinError::from_response(url.as_str(), response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RodinError::transport(url.as_str(), &e))?;

        tokio::fs::write(path, &bytes).await.map_err(|source| RodinError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "asset written");

        Ok(())
    }
}

impl std::fmt::Debug for RodinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodinClient")
            .field("endpoints", &self.endpoints)
            .field("poll", &self.poll)
            .field("download", &self.download)
            .finish_non_exhaustive()
    }
}

fn build_form(request: GenerationRequest) -> Result<Form> {
    let mut form = Form::new();

    if let Some(prompt) = request.prompt {
        form = form.text("prompt", prompt);
    }

    for image in request.images {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| RodinError::InvalidRequest(format!("invalid image content type: {e}")))?;

        form = form.part("images", part);
    }

    for (name, value) in request.options.form_fields() {
        form = form.text(name, value);
    }

    Ok(form)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::types::{GenerationOptions, GeometryFormat, ReferenceImage, Tier};

    pub(crate) fn test_client(server: &MockServer) -> RodinClient {
        let mut config = RodinConfig::new(SecretString::from("rk-test"));
        config.base_url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        config.poll.interval = Duration::from_millis(10);
        config.download.retry_delay = Duration::from_millis(10);

        RodinClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn submit_sends_multipart_with_bearer() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/rodin"))
            .and(header("authorization", "Bearer rk-test"))
            .and(body_string_contains("name=\"prompt\""))
            .and(body_string_contains("a wooden stool"))
            .and(body_string_contains("name=\"images\"; filename=\"stool.png\""))
            .and(body_string_contains("name=\"geometry_file_format\""))
            .and(body_string_contains("Detail"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "prompt": "a wooden stool",
                "submit_time": "2026-01-01T00:00:00Z",
                "uuid": "task-1",
                "jobs": { "uuids": ["job-1"], "subscription_key": "sub-key" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);

        let request = GenerationRequest {
            prompt: Some("a wooden stool".to_string()),
            images: vec![ReferenceImage {
                file_name: "stool.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"PNG-bytes".to_vec(),
            }],
            options: GenerationOptions {
                geometry_file_format: Some(GeometryFormat::Usdz),
                tier: Some(Tier::Detail),
                ..GenerationOptions::default()
            },
        };

        let response = client.submit(request).await.unwrap();

        let SubmitResponse::Json(json) = response else {
            panic!("expected JSON response");
        };
        assert_eq!(json["uuid"], "task-1");
        assert_eq!(json["jobs"]["subscription_key"], "sub-key");
    }

    #[tokio::test]
    async fn submit_returns_raw_text_for_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/rodin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let response = client
            .submit(GenerationRequest {
                prompt: Some("a lamp".to_string()),
                ..GenerationRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(response, SubmitResponse::Text("accepted".to_string()));
    }

    #[tokio::test]
    async fn submit_error_carries_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/rodin"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);

        let err = client
            .submit(GenerationRequest {
                prompt: Some("a lamp".to_string()),
                ..GenerationRequest::default()
            })
            .await
            .unwrap_err();

        let response = err.response().expect("error should carry the response");
        assert_eq!(response.status, 401);
        assert_eq!(response.body, "invalid api key");
    }

    #[tokio::test]
    async fn job_statuses_posts_subscription_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/status"))
            .and(header("authorization", "Bearer rk-test"))
            .and(body_string_contains("subscription_key=sub-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobs": [
                    { "uuid": "job-1", "status": "Done" },
                    { "uuid": "job-2", "status": "Generating" }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let statuses = client.job_statuses("sub-key").await.unwrap();
        assert_eq!(statuses, vec![JobStatus::Done, JobStatus::Running]);
    }

    #[tokio::test]
    async fn job_statuses_without_jobs_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "expired" })))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let err = client.job_statuses("sub-key").await.unwrap_err();
        assert!(matches!(err, RodinError::MalformedResponse(ref msg) if msg.contains("expired")));
    }

    #[tokio::test]
    async fn asset_manifest_posts_task_uuid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/download"))
            .and(body_string_contains("task_uuid=task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [
                    { "name": "model.glb", "url": "https://cdn.example/model.glb" },
                    { "name": "preview.webp", "url": "https://cdn.example/preview.webp" }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);

        let manifest = client.asset_manifest("task-1").await.unwrap();
        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains("preview.webp"));
    }

    #[tokio::test]
    async fn fetch_asset_writes_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assets/model.glb"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"glTF-bytes".to_vec()))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("model.glb");
        let url = Url::parse(&format!("{}/assets/model.glb", server.uri())).unwrap();

        client.fetch_asset(&url, &target).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"glTF-bytes");
    }

    #[tokio::test]
    async fn unreachable_vendor_is_a_responseless_api_error() {
        let mut config = RodinConfig::new(SecretString::from("rk-test"));
        config.base_url = Url::parse("http://127.0.0.1:1/api/").unwrap();
        let client = RodinClient::new(&config).unwrap();

        let err = client.job_statuses("sub-key").await.unwrap_err();

        assert!(matches!(err, RodinError::Api { response: None, .. }));
    }

    #[test]
    fn base_url_without_path_segments_is_a_config_error() {
        let mut config = RodinConfig::new(SecretString::from("rk-test"));
        config.base_url = Url::parse("mailto:rodin@example.com").unwrap();

        let err = RodinClient::new(&config).unwrap_err();

        assert!(matches!(err, RodinError::Config(_)), "{err:?}");
        assert!(err.to_string().starts_with("invalid client configuration"));
    }
}
