//! Shell-side resolution of portal effects.
//!
//! The core only describes `PortalOperation`s. A shell answers them with a
//! `PortalBackend`: `InMemoryBackend` for previews and tests, or the REST
//! client behind the `http` feature.

mod fixtures;
#[cfg(feature = "http")]
mod http;
mod memory;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::capabilities::{EvidenceUpload, PortalError, PortalOperation, PortalOutput, PortalResult};
use crate::model::{
    AdminReportSummary, EscalatedReportSummary, Feedback, Report, ReportDetails, ReportId,
    ReportSummary,
};

pub use self::fixtures::{sample_admin_reports, sample_escalations, sample_tracked_report, sample_user_reports};
#[cfg(feature = "http")]
pub use self::http::{HttpBackend, HttpBackendConfig};
pub use self::memory::InMemoryBackend;

#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// Stores the files and returns one public url per file, in order.
    async fn upload_evidence(&self, files: &[EvidenceUpload]) -> Result<Vec<String>, PortalError>;

    /// Persists a report. Answers `Conflict` when the id is taken.
    async fn submit_report(&self, report: &Report) -> Result<ReportId, PortalError>;

    async fn list_user_reports(&self) -> Result<Vec<ReportSummary>, PortalError>;

    async fn list_all_reports(&self) -> Result<Vec<AdminReportSummary>, PortalError>;

    async fn list_escalated_reports(&self) -> Result<Vec<EscalatedReportSummary>, PortalError>;

    async fn fetch_report(&self, report_id: &ReportId)
        -> Result<Option<ReportDetails>, PortalError>;

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), PortalError>;
}

/// Runs one operation against a backend and packs the answer the way the
/// core's `Portal` capability expects it.
#[instrument(skip(backend, operation), fields(op = operation.name()))]
pub async fn execute<B>(backend: &B, operation: PortalOperation) -> PortalResult
where
    B: PortalBackend + ?Sized,
{
    let result = dispatch(backend, operation).await;
    match &result {
        Ok(_) => debug!("portal operation completed"),
        Err(e) => warn!(error = %e, retryable = e.is_retryable(), "portal operation failed"),
    }
    result
}

async fn dispatch<B>(backend: &B, operation: PortalOperation) -> PortalResult
where
    B: PortalBackend + ?Sized,
{
    Ok(match operation {
        PortalOperation::UploadEvidence { files } => PortalOutput::EvidenceUploaded {
            urls: backend.upload_evidence(&files).await?,
        },
        PortalOperation::SubmitReport(report) => PortalOutput::ReportAccepted {
            report_id: backend.submit_report(&report).await?,
        },
        PortalOperation::ListUserReports => {
            PortalOutput::UserReports(backend.list_user_reports().await?)
        }
        PortalOperation::ListAllReports => PortalOutput::AllReports(backend.list_all_reports().await?),
        PortalOperation::ListEscalatedReports => {
            PortalOutput::EscalatedReports(backend.list_escalated_reports().await?)
        }
        PortalOperation::FetchReport { report_id } => {
            PortalOutput::ReportDetails(backend.fetch_report(&report_id).await?.map(Box::new))
        }
        PortalOperation::SubmitFeedback(feedback) => {
            backend.submit_feedback(&feedback).await?;
            PortalOutput::FeedbackAccepted
        }
    })
}
