use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::{fixtures, PortalBackend};
use crate::capabilities::{EvidenceUpload, PortalError};
use crate::model::{
    AdminReportSummary, EscalatedReportSummary, EscalationPriority, Feedback, Report,
    ReportDetails, ReportId, ReportSummary, TimelineEntry,
};

const EVIDENCE_BASE_URL: &str = "memory://evidence";
const CRITICAL_ESCALATION_REASON: &str = "Marked critical by the reporter";

#[derive(Default)]
struct PortalState {
    user_reports: Vec<ReportSummary>,
    all_reports: Vec<AdminReportSummary>,
    escalations: Vec<EscalatedReportSummary>,
    details: HashMap<ReportId, ReportDetails>,
    feedback: Vec<Feedback>,
    uploads: usize,
}

impl PortalState {
    fn next_row_id(&self) -> String {
        (self.all_reports.len() + 1).to_string()
    }

    fn holds(&self, report_id: &ReportId) -> bool {
        self.details.contains_key(report_id)
            || self.all_reports.iter().any(|r| &r.report_id == report_id)
    }
}

/// Portal kept in process memory. Reports submitted through it show up in
/// every listing and can be tracked right away.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<PortalState>,
    failures: Mutex<HashMap<&'static str, VecDeque<PortalError>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with the demo reports, escalations and tracked report.
    #[must_use]
    pub fn with_fixtures() -> Self {
        let mut state = PortalState {
            user_reports: fixtures::sample_user_reports(),
            all_reports: fixtures::sample_admin_reports(),
            escalations: fixtures::sample_escalations(),
            ..PortalState::default()
        };
        if let Some(details) = fixtures::sample_tracked_report() {
            state.details.insert(details.report_id.clone(), details);
        }
        Self {
            state: RwLock::new(state),
            failures: Mutex::default(),
        }
    }

    /// Queues an error for the next call of `operation`, named as in
    /// `PortalOperation::name`.
    pub async fn fail_next(&self, operation: &'static str, error: PortalError) {
        self.failures
            .lock()
            .await
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    async fn injected(&self, operation: &'static str) -> Result<(), PortalError> {
        match self
            .failures
            .lock()
            .await
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => {
                debug!(operation, error = %error, "injected failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Moves a stored report to a new status, as case workers do.
    #[instrument(skip(self, report_id, entry), fields(report_id = %report_id, status = %entry.status))]
    pub async fn update_status(
        &self,
        report_id: &ReportId,
        entry: TimelineEntry,
    ) -> Result<(), PortalError> {
        let mut state = self.state.write().await;
        let status = entry.status;
        let details = state
            .details
            .get_mut(report_id)
            .ok_or(PortalError::NotFound)?;
        details
            .record_status(entry)
            .map_err(|e| PortalError::Rejected {
                reason: e.to_string(),
            })?;

        for row in state.user_reports.iter_mut().filter(|r| &r.report_id == report_id) {
            row.status = status;
        }
        for row in state.all_reports.iter_mut().filter(|r| &r.report_id == report_id) {
            row.status = status;
        }
        for row in state.escalations.iter_mut().filter(|r| &r.report_id == report_id) {
            row.status = status;
        }
        info!("report status updated");
        Ok(())
    }

    pub async fn feedback(&self) -> Vec<Feedback> {
        self.state.read().await.feedback.clone()
    }

    pub async fn contains(&self, report_id: &ReportId) -> bool {
        self.state.read().await.holds(report_id)
    }
}

#[async_trait]
impl PortalBackend for InMemoryBackend {
    async fn upload_evidence(&self, files: &[EvidenceUpload]) -> Result<Vec<String>, PortalError> {
        self.injected("upload_evidence").await?;
        let mut state = self.state.write().await;
        let urls = files
            .iter()
            .map(|file| {
                state.uploads += 1;
                format!("{EVIDENCE_BASE_URL}/{}/{}", state.uploads, file.name)
            })
            .collect();
        Ok(urls)
    }

    async fn submit_report(&self, report: &Report) -> Result<ReportId, PortalError> {
        self.injected("submit_report").await?;
        report.check_timeline().map_err(|e| PortalError::Rejected {
            reason: e.to_string(),
        })?;

        let mut state = self.state.write().await;
        if state.holds(&report.report_id) {
            return Err(PortalError::Conflict {
                report_id: report.report_id.to_string(),
            });
        }
        let id = state.next_row_id();
        state.details.insert(report.report_id.clone(), ReportDetails::from(report));
        state.user_reports.insert(
            0,
            ReportSummary {
                id: id.clone(),
                report_id: report.report_id.clone(),
                crime_type: report.crime_type,
                status: report.status,
                report_date: report.report_date,
                is_critical: report.is_critical,
            },
        );
        state.all_reports.insert(
            0,
            AdminReportSummary {
                id: id.clone(),
                report_id: report.report_id.clone(),
                crime_type: report.crime_type,
                status: report.status,
                report_date: report.report_date,
                is_critical: report.is_critical,
                contact_name: report.contact_name.clone(),
                is_anonymous: report.is_anonymous,
            },
        );
        if report.is_critical {
            state.escalations.insert(
                0,
                EscalatedReportSummary {
                    id,
                    report_id: report.report_id.clone(),
                    crime_type: report.crime_type,
                    status: report.status,
                    report_date: report.report_date,
                    escalation_reason: CRITICAL_ESCALATION_REASON.to_string(),
                    priority: EscalationPriority::High,
                },
            );
        }

        info!(report_id = %report.report_id, critical = report.is_critical, "report stored");
        Ok(report.report_id.clone())
    }

    async fn list_user_reports(&self) -> Result<Vec<ReportSummary>, PortalError> {
        self.injected("list_user_reports").await?;
        Ok(self.state.read().await.user_reports.clone())
    }

    async fn list_all_reports(&self) -> Result<Vec<AdminReportSummary>, PortalError> {
        self.injected("list_all_reports").await?;
        Ok(self.state.read().await.all_reports.clone())
    }

    async fn list_escalated_reports(&self) -> Result<Vec<EscalatedReportSummary>, PortalError> {
        self.injected("list_escalated_reports").await?;
        Ok(self.state.read().await.escalations.clone())
    }

    async fn fetch_report(
        &self,
        report_id: &ReportId,
    ) -> Result<Option<ReportDetails>, PortalError> {
        self.injected("fetch_report").await?;
        Ok(self.state.read().await.details.get(report_id).cloned())
    }

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), PortalError> {
        self.injected("submit_feedback").await?;
        self.state.write().await.feedback.push(feedback.clone());
        Ok(())
    }
}
