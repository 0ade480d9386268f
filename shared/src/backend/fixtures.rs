// Demo data served by `InMemoryBackend::with_fixtures`.

use chrono::{DateTime, Utc};

use crate::model::{
    AdminReportSummary, CrimeType, EscalatedReportSummary, EscalationPriority, ReportDetails,
    ReportId, ReportStatus, ReportSummary, TimelineEntry,
};

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().unwrap_or_default()
}

type Row = (
    &'static str,
    &'static str,
    CrimeType,
    ReportStatus,
    &'static str,
    bool,
    Option<&'static str>,
);

const REPORTS: [Row; 5] = [
    ("1", "CR-123456", CrimeType::Phishing, ReportStatus::UnderReview, "2023-05-15T10:30:00Z", true, Some("John Doe")),
    ("2", "CR-789012", CrimeType::IdentityTheft, ReportStatus::Investigating, "2023-04-22T14:15:00Z", false, Some("Jane Smith")),
    ("3", "CR-345678", CrimeType::FinancialFraud, ReportStatus::Resolved, "2023-03-10T09:45:00Z", false, None),
    ("4", "CR-901234", CrimeType::Hacking, ReportStatus::UnderReview, "2023-05-18T16:20:00Z", true, Some("Robert Johnson")),
    ("5", "CR-567890", CrimeType::OnlineHarassment, ReportStatus::Investigating, "2023-05-05T11:10:00Z", false, Some("Emily Davis")),
];

/// The signed-in reporter's own reports.
#[must_use]
pub fn sample_user_reports() -> Vec<ReportSummary> {
    REPORTS[..3]
        .iter()
        .filter_map(|&(id, report_id, crime_type, status, date, is_critical, _)| {
            Some(ReportSummary {
                id: id.to_string(),
                report_id: ReportId::parse(report_id).ok()?,
                crime_type,
                status,
                report_date: at(date),
                is_critical,
            })
        })
        .collect()
}

#[must_use]
pub fn sample_admin_reports() -> Vec<AdminReportSummary> {
    REPORTS
        .iter()
        .filter_map(|&(id, report_id, crime_type, status, date, is_critical, contact)| {
            Some(AdminReportSummary {
                id: id.to_string(),
                report_id: ReportId::parse(report_id).ok()?,
                crime_type,
                status,
                report_date: at(date),
                is_critical,
                contact_name: contact.map(str::to_string),
                is_anonymous: contact.is_none(),
            })
        })
        .collect()
}

#[must_use]
pub fn sample_escalations() -> Vec<EscalatedReportSummary> {
    [
        (
            "1",
            "CR-123456",
            CrimeType::Phishing,
            ReportStatus::UnderReview,
            "2023-05-15T10:30:00Z",
            "Targeting vulnerable elderly population with sophisticated banking scam affecting multiple victims.",
            EscalationPriority::Critical,
        ),
        (
            "4",
            "CR-901234",
            CrimeType::Hacking,
            ReportStatus::UnderReview,
            "2023-05-18T16:20:00Z",
            "Unauthorized access to government employee accounts with potential data breach.",
            EscalationPriority::Urgent,
        ),
        (
            "7",
            "CR-246810",
            CrimeType::Ransomware,
            ReportStatus::Investigating,
            "2023-05-12T08:30:00Z",
            "Hospital systems affected, potential impact on patient care and medical records.",
            EscalationPriority::Critical,
        ),
    ]
    .into_iter()
    .filter_map(|(id, report_id, crime_type, status, date, reason, priority)| {
        Some(EscalatedReportSummary {
            id: id.to_string(),
            report_id: ReportId::parse(report_id).ok()?,
            crime_type,
            status,
            report_date: at(date),
            escalation_reason: reason.to_string(),
            priority,
        })
    })
    .collect()
}

/// Full record behind CR-123456, the id used in demos of the tracking page.
#[must_use]
pub fn sample_tracked_report() -> Option<ReportDetails> {
    let timeline = vec![
        TimelineEntry {
            date: at("2023-05-15T10:30:00Z"),
            status: ReportStatus::UnderReview,
            description: "Report submitted successfully".into(),
        },
        TimelineEntry {
            date: at("2023-05-16T09:15:00Z"),
            status: ReportStatus::UnderReview,
            description: "Your report is being reviewed by our team".into(),
        },
        TimelineEntry {
            date: at("2023-05-18T14:45:00Z"),
            status: ReportStatus::Investigating,
            description: "Our cybercrime specialists are investigating your case".into(),
        },
    ];

    Some(ReportDetails {
        report_id: ReportId::parse("CR-123456").ok()?,
        crime_type: CrimeType::Phishing,
        description:
            "I received a suspicious email claiming to be from my bank asking for my login credentials."
                .into(),
        status: ReportStatus::Investigating,
        report_date: at("2023-05-15T10:30:00Z"),
        last_updated: at("2023-05-18T14:45:00Z"),
        is_critical: true,
        evidence_files: vec!["email-screenshot.png".into(), "email-headers.txt".into()],
        timeline,
    })
}
