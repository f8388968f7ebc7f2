use std::time::Duration;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

use super::types::{CreateJobResponse, JobRecord, JobRequest};
use super::{BlobStore, TranscriptionService, UploadBody};
use crate::config::TranscribeConfig;
use crate::error::{Result, TranscribeError};

const API_KEY_HEADER: &str = "x-api-key";
const REGION_HEADER: &str = "x-region";

/// Blob store speaking plain HTTP: `PUT {storage_url}/{bucket}/{key}`.
pub struct HttpBlobStore {
    client: Client,
    base_url: Option<Url>,
    bucket: String,
    api_key: String,
    region: String,
}

impl HttpBlobStore {
    /// The storage URL may be empty when the store is only used to download
    /// transcripts from absolute URIs.
    pub fn new(config: &TranscribeConfig) -> Result<Self> {
        let base_url = if config.storage_url.trim().is_empty() {
            None
        } else {
            Some(parse_base_url("storage_url", &config.storage_url)?)
        };
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url,
            bucket: config.bucket.clone(),
            api_key: config.api_key.clone(),
            region: config.region.clone(),
        })
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .clone()
            .ok_or(TranscribeError::ConfigurationMissing("storage_url"))?;
        url.path_segments_mut()
            .map_err(|_| invalid_base("storage_url"))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.split('/'));
        Ok(url)
    }

    // Credentials only go to our own store, never to foreign transcript hosts.
    fn is_own(&self, uri: &str) -> bool {
        self.base_url
            .as_ref()
            .is_some_and(|base| uri.starts_with(base.as_str().trim_end_matches('/')))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(REGION_HEADER, &self.region)
    }
}

impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, body: UploadBody) -> Result<String> {
        let url = self.object_url(key)?;
        debug!(%url, bytes = body.len(), "uploading object");

        let response = self
            .authorize(self.client.put(url.clone()))
            .header(CONTENT_LENGTH, body.len())
            .body(Body::wrap_stream(body.into_stream()))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(url.to_string()),
            s if is_rejection(s) => Err(TranscribeError::InvalidArtifact(body_text(response).await)),
            _ => Err(remote_failure(response).await),
        }
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(uri);
        if self.is_own(uri) {
            request = self.authorize(request);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Transcription service client: `POST /jobs`, `GET /jobs/{name}`.
pub struct HttpTranscriptionService {
    client: Client,
    base_url: Url,
    api_key: String,
    region: String,
}

impl HttpTranscriptionService {
    pub fn new(config: &TranscribeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: parse_base_url("service_url", &config.service_url)?,
            api_key: config.api_key.clone(),
            region: config.region.clone(),
        })
    }

    fn jobs_url(&self, job_name: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| invalid_base("service_url"))?;
            segments.pop_if_empty().push("jobs");
            if let Some(name) = job_name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(REGION_HEADER, &self.region)
    }
}

impl TranscriptionService for HttpTranscriptionService {
    async fn create_job(&self, request: &JobRequest) -> Result<String> {
        let response = self
            .authorize(self.client.post(self.jobs_url(None)?))
            .json(request)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let created = response.json::<CreateJobResponse>().await?;
                Ok(created.job_name)
            }
            StatusCode::CONFLICT => Err(TranscribeError::DuplicateJob(request.job_name.clone())),
            s if is_rejection(s) => Err(TranscribeError::InvalidArtifact(body_text(response).await)),
            _ => Err(remote_failure(response).await),
        }
    }

    async fn get_status(&self, job_name: &str) -> Result<JobRecord> {
        let response = self
            .authorize(self.client.get(self.jobs_url(Some(job_name))?))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_failure(response).await);
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_transcript_uri(&self, job_name: &str) -> Result<String> {
        self.get_status(job_name)
            .await?
            .transcript_uri
            .ok_or_else(|| TranscribeError::MissingTranscript(job_name.to_string()))
    }
}

fn parse_base_url(field: &'static str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| TranscribeError::InvalidConfig {
        field,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(invalid_base(field));
    }
    Ok(url)
}

fn invalid_base(field: &'static str) -> TranscribeError {
    TranscribeError::InvalidConfig {
        field,
        reason: "not a base URL".to_string(),
    }
}

/// Statuses meaning "the service refuses this media", as opposed to an outage.
fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::PAYLOAD_TOO_LARGE
            | StatusCode::UNSUPPORTED_MEDIA_TYPE
            | StatusCode::UNPROCESSABLE_ENTITY
    )
}

/// Longest slice of an error body kept for the error message.
const MAX_ERROR_BODY: usize = 200;

async fn body_text(response: Response) -> String {
    match response.text().await {
        Ok(body) => condense(&body),
        Err(_) => "unknown error".to_string(),
    }
}

/// Folds an error body (often HTML or pretty-printed JSON) onto one short line.
fn condense(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return "empty response body".to_string();
    }
    match flat.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

async fn remote_failure(response: Response) -> TranscribeError {
    let status = response.status().as_u16();
    TranscribeError::RemoteStatus {
        status,
        message: body_text(response).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::identity::SourceFormat;
    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TranscribeConfig {
        TranscribeConfig {
            api_key: "test-key".into(),
            region: "us-east-1".into(),
            bucket: "audio".into(),
            storage_url: server.uri(),
            service_url: server.uri(),
            ..Default::default()
        }
    }

    fn job_request(name: &str) -> JobRequest {
        JobRequest {
            job_name: name.into(),
            media_uri: "http://store/audio/meeting.m4a".into(),
            media_format: SourceFormat::Mp4,
            language_code: "en-US".into(),
        }
    }

    #[tokio::test]
    async fn put_streams_file_and_reports_progress() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/audio/calls/meeting.m4a"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("demo.m4a");
        std::fs::write(&input, vec![7u8; 200_000]).unwrap();
        let file = tokio::fs::File::open(&input).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = HttpBlobStore::new(&config_for(&server)).unwrap();
        let uri = store
            .put("calls/meeting.m4a", UploadBody::new(file, 200_000, tx))
            .await
            .unwrap();

        assert_eq!(uri, format!("{}/audio/calls/meeting.m4a", server.uri()));
        let mut last = 0;
        while let Ok(n) = rx.try_recv() {
            assert!(n > last);
            last = n;
        }
        assert_eq!(last, 200_000);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body.len(), 200_000);
    }

    #[tokio::test]
    async fn put_rejection_is_invalid_artifact() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(413).set_body_string("too big"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.wav");
        std::fs::write(&input, b"RIFF").unwrap();
        let file = tokio::fs::File::open(&input).await.unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let store = HttpBlobStore::new(&config_for(&server)).unwrap();
        let err = store.put("a.wav", UploadBody::new(file, 4, tx)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArtifact);
    }

    #[tokio::test]
    async fn create_job_posts_request_and_returns_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(body_partial_json(json!({"job_name": "meeting", "media_format": "mp4"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"job_name": "meeting"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpTranscriptionService::new(&config_for(&server)).unwrap();
        let name = service.create_job(&job_request("meeting")).await.unwrap();
        assert_eq!(name, "meeting");
    }

    #[tokio::test]
    async fn create_job_conflict_is_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(409).set_body_string("exists"))
            .mount(&server)
            .await;

        let service = HttpTranscriptionService::new(&config_for(&server)).unwrap();
        let err = service.create_job(&job_request("meeting")).await.unwrap_err();
        assert!(matches!(err, TranscribeError::DuplicateJob(ref n) if n == "meeting"));
    }

    #[tokio::test]
    async fn get_status_reads_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/meeting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job_name": "meeting",
                "status": "FAILED",
                "failure_reason": "unsupported codec"
            })))
            .mount(&server)
            .await;

        let service = HttpTranscriptionService::new(&config_for(&server)).unwrap();
        let record = service.get_status("meeting").await.unwrap();
        assert_eq!(record.status, "FAILED");
        assert_eq!(record.failure_reason.as_deref(), Some("unsupported codec"));

        let err = service.get_transcript_uri("meeting").await.unwrap_err();
        assert!(matches!(err, TranscribeError::MissingTranscript(_)));
    }

    #[tokio::test]
    async fn unknown_job_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/unknown-job"))
            .respond_with(ResponseTemplate::new(404).set_body_string("job not found"))
            .mount(&server)
            .await;

        let service = HttpTranscriptionService::new(&config_for(&server)).unwrap();
        let err = service.get_status("unknown-job").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(err.to_string(), "remote returned status 404: job not found");
    }

    #[tokio::test]
    async fn html_error_body_is_condensed() {
        let server = MockServer::start().await;
        let page = format!(
            "<html>\n  <body>\n    <h1>Bad Gateway</h1>\n{}\n  </body>\n</html>\n",
            "<p>upstream</p>\n".repeat(100)
        );
        Mock::given(method("GET"))
            .and(path("/jobs/meeting"))
            .respond_with(ResponseTemplate::new(502).set_body_string(page))
            .mount(&server)
            .await;

        let service = HttpTranscriptionService::new(&config_for(&server)).unwrap();
        let err = service.get_status("meeting").await.unwrap_err();
        let TranscribeError::RemoteStatus { status, message } = err else {
            panic!("expected a remote status error");
        };
        assert_eq!(status, 502);
        assert!(!message.contains('\n'));
        assert!(message.starts_with("<html> <body> <h1>Bad Gateway</h1>"));
        assert!(message.ends_with("..."));
        assert!(message.chars().count() <= MAX_ERROR_BODY + 3);
    }

    #[test]
    fn condense_handles_blank_and_short_bodies() {
        assert_eq!(condense("  \n\t "), "empty response body");
        assert_eq!(condense("job\nnot   found\n"), "job not found");
    }

    #[tokio::test]
    async fn get_only_authorizes_own_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transcripts/meeting.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.storage_url = "https://store.invalid".into();
        let store = HttpBlobStore::new(&config).unwrap();
        let body = store
            .get(&format!("{}/transcripts/meeting.json", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"{}");

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("x-api-key").is_none());
    }

    #[test]
    fn invalid_service_url_is_a_config_error() {
        let config = TranscribeConfig {
            service_url: "not a url".into(),
            ..Default::default()
        };
        let err = HttpTranscriptionService::new(&config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }
}
