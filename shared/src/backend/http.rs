use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use std::{path::PathBuf, time::Duration};
use tracing::{debug, instrument};
use url::Url;

use super::PortalBackend;
use crate::capabilities::{EvidenceUpload, PortalError};
use crate::model::{
    AdminReportSummary, EscalatedReportSummary, Feedback, Report, ReportDetails, ReportId,
    ReportSummary,
};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const FILE_NAME_HEADER: &str = "X-File-Name";

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Deserialize)]
pub struct HttpBackendConfig {
    pub base_url: Url,
    #[serde(default)]
    pub api_token: Option<SecretString>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::new(token.into()));
        self
    }
}

#[derive(Deserialize)]
struct UploadedFile {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReceipt {
    report_id: ReportId,
}

/// REST client for the portal service. `base_url` is the portal origin;
/// every endpoint lives under `api/`.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    api_token: Option<SecretString>,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, PortalError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(transport_error)?;

        // Without a trailing slash `Url::join` would replace the last segment.
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PortalError> {
        self.base_url.join(path).map_err(|e| PortalError::Rejected {
            reason: format!("invalid endpoint {path}: {e}"),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PortalError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "portal returned an error status");
        Err(PortalError::from_status(status.as_u16(), &body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortalError> {
        let url = self.endpoint(path)?;
        self.send(self.client.get(url))
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn upload_one(&self, file: &EvidenceUpload) -> Result<String, PortalError> {
        let bytes = read_evidence(file).await?;
        let request = self
            .client
            .post(self.endpoint("api/evidence")?)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(FILE_NAME_HEADER, file.name.as_str())
            .body(bytes);
        let uploaded: UploadedFile = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(uploaded.url)
    }
}

fn transport_error(e: reqwest::Error) -> PortalError {
    if e.is_timeout() {
        PortalError::Timeout
    } else if e.is_decode() {
        PortalError::Decode {
            reason: e.to_string(),
        }
    } else {
        PortalError::Network {
            message: e.to_string(),
        }
    }
}

/// Shells hand over either a plain path or a `file://` uri.
fn local_path(uri: &str) -> Result<PathBuf, PortalError> {
    if uri.starts_with("file://") {
        Url::parse(uri)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| PortalError::Rejected {
                reason: format!("unsupported evidence location {uri}"),
            })
    } else {
        Ok(PathBuf::from(uri))
    }
}

async fn read_evidence(file: &EvidenceUpload) -> Result<Vec<u8>, PortalError> {
    let path = local_path(&file.uri)?;
    tokio::fs::read(&path)
        .await
        .map_err(|e| PortalError::Rejected {
            reason: format!("cannot read evidence {}: {e}", file.name),
        })
}

#[async_trait]
impl PortalBackend for HttpBackend {
    #[instrument(skip(self, files), fields(files = files.len()))]
    async fn upload_evidence(&self, files: &[EvidenceUpload]) -> Result<Vec<String>, PortalError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.upload_one(file).await?);
        }
        Ok(urls)
    }

    #[instrument(skip(self, report), fields(report_id = %report.report_id))]
    async fn submit_report(&self, report: &Report) -> Result<ReportId, PortalError> {
        let request = self.client.post(self.endpoint("api/reports")?).json(report);
        let receipt: SubmitReceipt = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Ok(receipt.report_id)
    }

    async fn list_user_reports(&self) -> Result<Vec<ReportSummary>, PortalError> {
        self.get_json("api/reports/mine").await
    }

    async fn list_all_reports(&self) -> Result<Vec<AdminReportSummary>, PortalError> {
        self.get_json("api/admin/reports").await
    }

    async fn list_escalated_reports(&self) -> Result<Vec<EscalatedReportSummary>, PortalError> {
        self.get_json("api/admin/escalations").await
    }

    #[instrument(skip(self, report_id), fields(report_id = %report_id))]
    async fn fetch_report(
        &self,
        report_id: &ReportId,
    ) -> Result<Option<ReportDetails>, PortalError> {
        let url = self.endpoint(&format!("api/reports/{report_id}"))?;
        match self.send(self.client.get(url)).await {
            Ok(response) => response.json().await.map(Some).map_err(transport_error),
            Err(PortalError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), PortalError> {
        let request = self.client.post(self.endpoint("api/feedback")?).json(feedback);
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn client_for(base: &str) -> HttpBackend {
        HttpBackend::new(HttpBackendConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let backend = client_for("https://portal.example/cyber");
        assert_eq!(
            backend.endpoint("api/reports/mine").unwrap().as_str(),
            "https://portal.example/cyber/api/reports/mine"
        );
        let backend = client_for("https://portal.example/");
        assert_eq!(
            backend.endpoint("api/feedback").unwrap().as_str(),
            "https://portal.example/api/feedback"
        );
    }

    #[test]
    fn config_defaults_timeout_and_hides_token() {
        let config: HttpBackendConfig = serde_json::from_str(
            r#"{"base_url":"https://portal.example/","api_token":"s3cr3t"}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, 30_000);
        assert!(!format!("{config:?}").contains("s3cr3t"));
        assert_eq!(
            config.api_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("s3cr3t")
        );
    }

    #[test]
    fn local_path_accepts_paths_and_file_uris() {
        assert_eq!(
            local_path("/tmp/a.png").unwrap(),
            PathBuf::from("/tmp/a.png")
        );
        assert_eq!(
            local_path("file:///tmp/a%20b.png").unwrap(),
            PathBuf::from("/tmp/a b.png")
        );
    }

    #[tokio::test]
    async fn evidence_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 evidence").unwrap();
        let upload = EvidenceUpload {
            name: "statement.pdf".into(),
            uri: file.path().to_string_lossy().into_owned(),
            size_bytes: 17,
        };
        assert_eq!(read_evidence(&upload).await.unwrap(), b"%PDF-1.4 evidence");
    }

    #[tokio::test]
    async fn missing_evidence_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let upload = EvidenceUpload {
            name: "gone.png".into(),
            uri: dir.path().join("gone.png").to_string_lossy().into_owned(),
            size_bytes: 1,
        };
        assert_matches!(
            read_evidence(&upload).await,
            Err(PortalError::Rejected { reason }) if reason.contains("gone.png")
        );
    }
}
