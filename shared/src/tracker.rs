//! Case tracking: the single-report lookup and the user's own report list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::PortalError;
use crate::i18n::Translate;
use crate::model::{CrimeType, Loadable, ReportDetails, ReportId, ReportStatus, ReportSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Warning,
    Info,
    Success,
}

#[must_use]
pub const fn status_badge(status: ReportStatus) -> StatusBadge {
    match status {
        ReportStatus::UnderReview => StatusBadge::Warning,
        ReportStatus::Investigating => StatusBadge::Info,
        ReportStatus::Resolved => StatusBadge::Success,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub status: ReportStatus,
    pub label: String,
    pub badge: StatusBadge,
}

impl StatusView {
    #[must_use]
    pub fn new(status: ReportStatus, t: &dyn Translate) -> Self {
        Self {
            status,
            label: t.translate(status.translation_key()),
            badge: status_badge(status),
        }
    }
}

pub(crate) fn crime_type_label(crime_type: CrimeType, t: &dyn Translate) -> String {
    t.translate(crime_type.translation_key())
}

pub(crate) fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn format_timestamp(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M UTC").to_string()
}

// --- Single report lookup ---

#[derive(Clone, Debug, Default, PartialEq)]
pub enum TrackerState {
    #[default]
    Idle,
    Loading {
        report_id: ReportId,
    },
    Loaded(Box<ReportDetails>),
    NotFound {
        query: String,
    },
    Failed {
        report_id: ReportId,
        error: PortalError,
    },
}

impl TrackerState {
    /// Starts a lookup for user input. Returns the id to fetch, or `None`
    /// when the input is not a report id and no request is needed.
    pub fn request(&mut self, query: &str) -> Option<ReportId> {
        let query = query.trim();
        if query.is_empty() {
            *self = Self::Idle;
            return None;
        }
        match ReportId::parse(query) {
            Ok(report_id) => {
                *self = Self::Loading {
                    report_id: report_id.clone(),
                };
                Some(report_id)
            }
            Err(e) => {
                debug!(error = %e, "tracking query is not a report id");
                *self = Self::NotFound {
                    query: query.to_string(),
                };
                None
            }
        }
    }

    /// Applies a fetch result if it answers the lookup still in progress.
    pub fn settle(
        &mut self,
        report_id: &ReportId,
        result: Result<Option<Box<ReportDetails>>, PortalError>,
    ) -> bool {
        if !matches!(self, Self::Loading { report_id: pending } if pending == report_id) {
            debug!(report_id = %report_id, "stale report lookup dropped");
            return false;
        }
        *self = match result {
            Ok(Some(details)) => Self::Loaded(details),
            Ok(None) | Err(PortalError::NotFound) => Self::NotFound {
                query: report_id.to_string(),
            },
            Err(error) => Self::Failed {
                report_id: report_id.clone(),
                error,
            },
        };
        true
    }

    #[must_use]
    pub fn retry_target(&self) -> Option<&ReportId> {
        match self {
            Self::Failed { report_id, .. } => Some(report_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub date: String,
    pub status: StatusView,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceView {
    NoEvidence { message: String },
    Files { names: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedReportView {
    pub report_id: String,
    pub crime_type: String,
    pub description: String,
    pub status: StatusView,
    pub is_critical: bool,
    pub critical_label: Option<String>,
    pub reported_on: String,
    pub last_updated: String,
    pub timeline: Vec<TimelineRow>,
    pub evidence: EvidenceView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerView {
    Prompt { message: String },
    Loading { report_id: String },
    NotFound { query: String, message: String },
    Failed { report_id: String, message: String, is_retryable: bool },
    Loaded(Box<TrackedReportView>),
}

#[must_use]
pub fn tracker_view(state: &TrackerState, t: &dyn Translate) -> TrackerView {
    match state {
        TrackerState::Idle => TrackerView::Prompt {
            message: t.translate("track.prompt"),
        },
        TrackerState::Loading { report_id } => TrackerView::Loading {
            report_id: report_id.to_string(),
        },
        TrackerState::NotFound { query } => TrackerView::NotFound {
            query: query.clone(),
            message: t.translate("track.notFound"),
        },
        TrackerState::Failed { report_id, error } => TrackerView::Failed {
            report_id: report_id.to_string(),
            message: t.translate("track.loadFailed"),
            is_retryable: error.is_retryable(),
        },
        TrackerState::Loaded(details) => TrackerView::Loaded(Box::new(report_view(details, t))),
    }
}

#[must_use]
pub fn report_view(details: &ReportDetails, t: &dyn Translate) -> TrackedReportView {
    let timeline = details
        .timeline
        .iter()
        .map(|entry| TimelineRow {
            date: format_timestamp(entry.date),
            status: StatusView::new(entry.status, t),
            description: entry.description.clone(),
        })
        .collect();

    let evidence = if details.evidence_files.is_empty() {
        EvidenceView::NoEvidence {
            message: t.translate("track.noEvidence"),
        }
    } else {
        EvidenceView::Files {
            names: details.evidence_files.clone(),
        }
    };

    TrackedReportView {
        report_id: details.report_id.to_string(),
        crime_type: crime_type_label(details.crime_type, t),
        description: details.description.clone(),
        status: StatusView::new(details.status, t),
        is_critical: details.is_critical,
        critical_label: details.is_critical.then(|| t.translate("track.critical")),
        reported_on: t.translate_with("track.reportedOn", &[("date", &format_date(details.report_date))]),
        last_updated: t.translate_with(
            "track.lastUpdated",
            &[("date", &format_timestamp(details.last_updated))],
        ),
        timeline,
        evidence,
    }
}

// --- User report list ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: String,
    pub report_id: String,
    pub crime_type: String,
    pub status: StatusView,
    pub is_critical: bool,
    pub reported_on: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportListView {
    Loading,
    Empty { message: String },
    Loaded { rows: Vec<ReportRow> },
    Failed { message: String },
}

#[must_use]
pub fn report_list_view(reports: &Loadable<Vec<ReportSummary>>, t: &dyn Translate) -> ReportListView {
    match reports {
        Loadable::Idle | Loadable::Loading(_) => ReportListView::Loading,
        Loadable::Failed(_) => ReportListView::Failed {
            message: t.translate("track.loadFailed"),
        },
        Loadable::Loaded(list) if list.is_empty() => ReportListView::Empty {
            message: t.translate("reports.empty"),
        },
        Loadable::Loaded(list) => ReportListView::Loaded {
            rows: list
                .iter()
                .map(|r| ReportRow {
                    id: r.id.clone(),
                    report_id: r.report_id.to_string(),
                    crime_type: crime_type_label(r.crime_type, t),
                    status: StatusView::new(r.status, t),
                    is_critical: r.is_critical,
                    reported_on: format_date(r.report_date),
                })
                .collect(),
        },
    }
}
