//! Admin triage: filtered report table, escalations and dashboard counts.

use serde::{Deserialize, Serialize};

use crate::i18n::Translate;
use crate::model::{
    AdminReportSummary, CrimeType, EscalatedReportSummary, EscalationPriority, Loadable,
    ReportStatus,
};
use crate::tracker::{crime_type_label, format_date, StatusView};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReportStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: ReportStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFilter {
    #[default]
    All,
    Only(CrimeType),
}

impl TypeFilter {
    #[must_use]
    pub fn matches(self, crime_type: CrimeType) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == crime_type,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFilters {
    pub search: String,
    pub status: StatusFilter,
    pub crime_type: TypeFilter,
}

impl AdminFilters {
    /// Search is a case-insensitive substring of the report id or, for
    /// identified reports only, the contact name.
    #[must_use]
    pub fn matches(&self, report: &AdminReportSummary) -> bool {
        let needle = self.search.trim().to_lowercase();
        let found = needle.is_empty()
            || report.report_id.as_str().to_lowercase().contains(&needle)
            || (!report.is_anonymous
                && report
                    .contact_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle)));

        found && self.status.matches(report.status) && self.crime_type.matches(report.crime_type)
    }

    #[must_use]
    pub fn apply<'a>(&self, reports: &'a [AdminReportSummary]) -> Vec<&'a AdminReportSummary> {
        reports.iter().filter(|r| self.matches(r)).collect()
    }
}

#[must_use]
pub fn contact_label(report: &AdminReportSummary, t: &dyn Translate) -> String {
    if report.is_anonymous {
        return t.translate("admin.anonymous");
    }
    report
        .contact_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(|| t.translate("admin.notAvailable"), str::to_string)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBadge {
    Destructive,
    Default,
    Outline,
}

#[must_use]
pub const fn priority_badge(priority: EscalationPriority) -> PriorityBadge {
    match priority {
        EscalationPriority::Critical => PriorityBadge::Destructive,
        EscalationPriority::Urgent => PriorityBadge::Default,
        EscalationPriority::High => PriorityBadge::Outline,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub critical: usize,
}

impl AdminStats {
    #[must_use]
    pub fn from_reports(reports: &[AdminReportSummary]) -> Self {
        reports.iter().fold(Self::default(), |mut stats, r| {
            stats.total += 1;
            if r.status.is_open() {
                stats.pending += 1;
            } else {
                stats.resolved += 1;
            }
            if r.is_critical {
                stats.critical += 1;
            }
            stats
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRow {
    pub id: String,
    pub report_id: String,
    pub crime_type: String,
    pub status: StatusView,
    pub reported_on: String,
    pub is_critical: bool,
    pub contact: String,
    pub is_anonymous: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRow {
    pub id: String,
    pub report_id: String,
    pub crime_type: String,
    pub status: StatusView,
    pub reported_on: String,
    pub reason: String,
    pub priority: EscalationPriority,
    pub priority_label: String,
    pub badge: PriorityBadge,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportTableView {
    Loading,
    Failed { message: String },
    Empty { message: String },
    Rows { rows: Vec<AdminRow> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscalationListView {
    Loading,
    Failed { message: String },
    Empty { message: String },
    Rows { rows: Vec<EscalationRow> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminView {
    pub filters: AdminFilters,
    pub stats: Option<AdminStats>,
    pub reports: ReportTableView,
    pub escalations: EscalationListView,
}

fn admin_row(report: &AdminReportSummary, t: &dyn Translate) -> AdminRow {
    AdminRow {
        id: report.id.clone(),
        report_id: report.report_id.to_string(),
        crime_type: crime_type_label(report.crime_type, t),
        status: StatusView::new(report.status, t),
        reported_on: format_date(report.report_date),
        is_critical: report.is_critical,
        contact: contact_label(report, t),
        is_anonymous: report.is_anonymous,
    }
}

fn escalation_row(report: &EscalatedReportSummary, t: &dyn Translate) -> EscalationRow {
    EscalationRow {
        id: report.id.clone(),
        report_id: report.report_id.to_string(),
        crime_type: crime_type_label(report.crime_type, t),
        status: StatusView::new(report.status, t),
        reported_on: format_date(report.report_date),
        reason: report.escalation_reason.clone(),
        priority: report.priority,
        priority_label: t.translate(report.priority.translation_key()),
        badge: priority_badge(report.priority),
    }
}

#[must_use]
pub fn admin_view(
    reports: &Loadable<Vec<AdminReportSummary>>,
    escalations: &Loadable<Vec<EscalatedReportSummary>>,
    filters: &AdminFilters,
    t: &dyn Translate,
) -> AdminView {
    let table = match reports {
        Loadable::Idle | Loadable::Loading(_) => ReportTableView::Loading,
        Loadable::Failed(_) => ReportTableView::Failed {
            message: t.translate("track.loadFailed"),
        },
        Loadable::Loaded(all) => {
            let rows: Vec<AdminRow> = filters.apply(all).into_iter().map(|r| admin_row(r, t)).collect();
            if rows.is_empty() {
                ReportTableView::Empty {
                    message: t.translate("admin.noReports"),
                }
            } else {
                ReportTableView::Rows { rows }
            }
        }
    };

    let escalation_list = match escalations {
        Loadable::Idle | Loadable::Loading(_) => EscalationListView::Loading,
        Loadable::Failed(_) => EscalationListView::Failed {
            message: t.translate("track.loadFailed"),
        },
        Loadable::Loaded(list) if list.is_empty() => EscalationListView::Empty {
            message: t.translate("admin.noEscalations"),
        },
        Loadable::Loaded(list) => EscalationListView::Rows {
            rows: list.iter().map(|r| escalation_row(r, t)).collect(),
        },
    };

    AdminView {
        filters: filters.clone(),
        stats: reports.loaded().map(|all| AdminStats::from_reports(all)),
        reports: table,
        escalations: escalation_list,
    }
}
