use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    AdminReportSummary, EscalatedReportSummary, Feedback, Report, ReportDetails, ReportId,
    ReportSummary,
};
use crate::staging::StagedFile;

/// One staged file to upload. The shell reads the bytes behind `uri`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceUpload {
    pub name: String,
    pub uri: String,
    pub size_bytes: u64,
}

impl From<&StagedFile> for EvidenceUpload {
    fn from(file: &StagedFile) -> Self {
        Self {
            name: file.name.clone(),
            uri: file.uri.clone(),
            size_bytes: file.size_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum PortalOperation {
    UploadEvidence { files: Vec<EvidenceUpload> },
    SubmitReport(Box<Report>),
    ListUserReports,
    ListAllReports,
    ListEscalatedReports,
    FetchReport { report_id: ReportId },
    SubmitFeedback(Feedback),
}

impl PortalOperation {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UploadEvidence { .. } => "upload_evidence",
            Self::SubmitReport(_) => "submit_report",
            Self::ListUserReports => "list_user_reports",
            Self::ListAllReports => "list_all_reports",
            Self::ListEscalatedReports => "list_escalated_reports",
            Self::FetchReport { .. } => "fetch_report",
            Self::SubmitFeedback(_) => "submit_feedback",
        }
    }
}

impl Operation for PortalOperation {
    type Output = PortalResult;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PortalOutput {
    EvidenceUploaded { urls: Vec<String> },
    ReportAccepted { report_id: ReportId },
    UserReports(Vec<ReportSummary>),
    AllReports(Vec<AdminReportSummary>),
    EscalatedReports(Vec<EscalatedReportSummary>),
    ReportDetails(Option<Box<ReportDetails>>),
    FeedbackAccepted,
}

impl PortalOutput {
    const fn kind(&self) -> &'static str {
        match self {
            Self::EvidenceUploaded { .. } => "evidence_uploaded",
            Self::ReportAccepted { .. } => "report_accepted",
            Self::UserReports(_) => "user_reports",
            Self::AllReports(_) => "all_reports",
            Self::EscalatedReports(_) => "escalated_reports",
            Self::ReportDetails(_) => "report_details",
            Self::FeedbackAccepted => "feedback_accepted",
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PortalError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    #[error("resource not found")]
    NotFound,

    #[error("report id already in use: {report_id}")]
    Conflict { report_id: String },

    #[error("malformed portal response: {reason}")]
    Decode { reason: String },

    #[error("request rejected: {reason}")]
    Rejected { reason: String },
}

impl PortalError {
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            409 => Self::Conflict {
                report_id: body.trim().to_string(),
            },
            400..=499 => Self::Rejected {
                reason: if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                },
            },
            _ => Self::Server { status },
        }
    }

    fn unexpected(output: &PortalOutput) -> Self {
        Self::Decode {
            reason: format!("unexpected {} response", output.kind()),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout | Self::Server { .. } | Self::Conflict { .. }
        )
    }
}

pub type PortalResult = Result<PortalOutput, PortalError>;

pub struct Portal<E> {
    context: CapabilityContext<PortalOperation, E>,
}

impl<Ev> Capability<Ev> for Portal<Ev> {
    type Operation = PortalOperation;
    type MappedSelf<MappedEv> = Portal<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Portal::new(self.context.map_event(f))
    }
}

impl<E> Portal<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<PortalOperation, E>) -> Self {
        Self { context }
    }

    fn request<T, F>(
        &self,
        operation: PortalOperation,
        extract: fn(PortalOutput) -> Result<T, PortalError>,
        callback: F,
    ) where
        T: 'static,
        F: FnOnce(Result<T, PortalError>) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(result.and_then(extract)));
        });
    }

    pub fn upload_evidence<F>(&self, files: Vec<EvidenceUpload>, callback: F)
    where
        F: FnOnce(Result<Vec<String>, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::UploadEvidence { files },
            |output| match output {
                PortalOutput::EvidenceUploaded { urls } => Ok(urls),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    pub fn submit_report<F>(&self, report: Box<Report>, callback: F)
    where
        F: FnOnce(Result<ReportId, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::SubmitReport(report),
            |output| match output {
                PortalOutput::ReportAccepted { report_id } => Ok(report_id),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    pub fn list_user_reports<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<ReportSummary>, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::ListUserReports,
            |output| match output {
                PortalOutput::UserReports(reports) => Ok(reports),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    pub fn list_all_reports<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<AdminReportSummary>, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::ListAllReports,
            |output| match output {
                PortalOutput::AllReports(reports) => Ok(reports),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    pub fn list_escalated_reports<F>(&self, callback: F)
    where
        F: FnOnce(Result<Vec<EscalatedReportSummary>, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::ListEscalatedReports,
            |output| match output {
                PortalOutput::EscalatedReports(reports) => Ok(reports),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    /// `Ok(None)` means the portal has no report with this id.
    pub fn fetch_report<F>(&self, report_id: ReportId, callback: F)
    where
        F: FnOnce(Result<Option<Box<ReportDetails>>, PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::FetchReport { report_id },
            |output| match output {
                PortalOutput::ReportDetails(details) => Ok(details),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }

    pub fn submit_feedback<F>(&self, feedback: Feedback, callback: F)
    where
        F: FnOnce(Result<(), PortalError>) -> E + Send + 'static,
    {
        self.request(
            PortalOperation::SubmitFeedback(feedback),
            |output| match output {
                PortalOutput::FeedbackAccepted => Ok(()),
                other => Err(PortalError::unexpected(&other)),
            },
            callback,
        );
    }
}
