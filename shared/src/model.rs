use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use crate::capabilities::PortalError;
use crate::config::PortalConfig;
use crate::feedback::FeedbackForm;
use crate::form::ReportForm;
use crate::i18n::Catalog;
use crate::tracker::TrackerState;
use crate::triage::AdminFilters;
use crate::AppError;

pub const REPORT_ID_PREFIX: &str = "CR-";
pub const REPORT_ID_MIN: u32 = 100_000;
pub const REPORT_ID_MAX: u32 = 999_999;

// --- Report id: CR-###### ---

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ReportIdError {
    #[error("malformed report id: {0:?}")]
    Malformed(String),
    #[error("report number {0} is outside [{REPORT_ID_MIN}, {REPORT_ID_MAX}]")]
    OutOfRange(u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    pub fn from_number(number: u32) -> Result<Self, ReportIdError> {
        if !(REPORT_ID_MIN..=REPORT_ID_MAX).contains(&number) {
            return Err(ReportIdError::OutOfRange(number));
        }
        Ok(Self(format!("{REPORT_ID_PREFIX}{number}")))
    }

    /// Parses user input. Surrounding whitespace and a lower-case prefix are
    /// tolerated since ids are typed in by hand on the tracking page.
    pub fn parse(input: &str) -> Result<Self, ReportIdError> {
        let trimmed = input.trim();
        let digits = trimmed
            .get(..REPORT_ID_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(REPORT_ID_PREFIX))
            .and_then(|_| trimmed.get(REPORT_ID_PREFIX.len()..))
            .ok_or_else(|| ReportIdError::Malformed(trimmed.to_string()))?;

        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReportIdError::Malformed(trimmed.to_string()));
        }

        let number = digits
            .parse::<u32>()
            .map_err(|_| ReportIdError::Malformed(trimmed.to_string()))?;
        Self::from_number(number)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn number(&self) -> u32 {
        self.0[REPORT_ID_PREFIX.len()..].parse().unwrap_or_default()
    }
}

impl TryFrom<String> for ReportId {
    type Error = ReportIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReportId> for String {
    fn from(id: ReportId) -> Self {
        id.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Id generation ---

/// Source of candidate report ids. Uniqueness is enforced by the portal,
/// which answers a duplicate with `PortalError::Conflict`.
pub trait ReportIdSource: Send {
    fn next_id(&mut self) -> ReportId;
}

/// Uniform draw from [100000, 999999].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomReportIds;

impl ReportIdSource for RandomReportIds {
    fn next_id(&mut self) -> ReportId {
        let number = rand::thread_rng().gen_range(REPORT_ID_MIN..=REPORT_ID_MAX);
        ReportId(format!("{REPORT_ID_PREFIX}{number}"))
    }
}

/// Counts upward, wrapping back to the lowest id after the highest.
#[derive(Debug, Clone)]
pub struct SequentialReportIds {
    next: u32,
}

impl SequentialReportIds {
    #[must_use]
    pub fn starting_at(number: u32) -> Self {
        Self {
            next: number.clamp(REPORT_ID_MIN, REPORT_ID_MAX),
        }
    }
}

impl Default for SequentialReportIds {
    fn default() -> Self {
        Self::starting_at(REPORT_ID_MIN)
    }
}

impl ReportIdSource for SequentialReportIds {
    fn next_id(&mut self) -> ReportId {
        let number = self.next;
        self.next = if number >= REPORT_ID_MAX { REPORT_ID_MIN } else { number + 1 };
        ReportId(format!("{REPORT_ID_PREFIX}{number}"))
    }
}

/// Hands out a fixed script of ids, then continues sequentially.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReportIds {
    script: VecDeque<ReportId>,
    fallback: SequentialReportIds,
}

impl ScriptedReportIds {
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = ReportId>) -> Self {
        Self {
            script: ids.into_iter().collect(),
            fallback: SequentialReportIds::default(),
        }
    }
}

impl ReportIdSource for ScriptedReportIds {
    fn next_id(&mut self) -> ReportId {
        self.script
            .pop_front()
            .unwrap_or_else(|| self.fallback.next_id())
    }
}

// --- Time ---

pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// --- Domain enums replacing stringly-typed fields ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeType {
    Phishing,
    IdentityTheft,
    Hacking,
    OnlineHarassment,
    FinancialFraud,
    Ransomware,
    DataBreach,
    Other,
}

impl CrimeType {
    pub const ALL: [Self; 8] = [
        Self::Phishing,
        Self::IdentityTheft,
        Self::Hacking,
        Self::OnlineHarassment,
        Self::FinancialFraud,
        Self::Ransomware,
        Self::DataBreach,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::IdentityTheft => "identity_theft",
            Self::Hacking => "hacking",
            Self::OnlineHarassment => "online_harassment",
            Self::FinancialFraud => "financial_fraud",
            Self::Ransomware => "ransomware",
            Self::DataBreach => "data_breach",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn translation_key(self) -> &'static str {
        match self {
            Self::Phishing => "report.crimeTypes.phishing",
            Self::IdentityTheft => "report.crimeTypes.identityTheft",
            Self::Hacking => "report.crimeTypes.hacking",
            Self::OnlineHarassment => "report.crimeTypes.onlineHarassment",
            Self::FinancialFraud => "report.crimeTypes.financialFraud",
            Self::Ransomware => "report.crimeTypes.ransomware",
            Self::DataBreach => "report.crimeTypes.dataBreach",
            Self::Other => "report.crimeTypes.other",
        }
    }
}

impl fmt::Display for CrimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    #[default]
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Investigating")]
    Investigating,
    #[serde(rename = "Resolved")]
    Resolved,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnderReview => "Under Review",
            Self::Investigating => "Investigating",
            Self::Resolved => "Resolved",
        }
    }

    #[must_use]
    pub const fn translation_key(self) -> &'static str {
        match self {
            Self::UnderReview => "track.status.under_review",
            Self::Investigating => "track.status.investigating",
            Self::Resolved => "track.status.resolved",
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPriority {
    High,
    Urgent,
    Critical,
}

impl EscalationPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }

    #[must_use]
    pub const fn translation_key(self) -> &'static str {
        match self {
            Self::High => "admin.priority.high",
            Self::Urgent => "admin.priority.urgent",
            Self::Critical => "admin.priority.critical",
        }
    }
}

// --- Timeline ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub status: ReportStatus,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("timeline is empty")]
    Empty,
    #[error("timeline entry {index} is older than the entry before it")]
    OutOfOrder { index: usize },
    #[error("current status {status} does not match last timeline entry {last}")]
    StatusMismatch { status: ReportStatus, last: ReportStatus },
}

/// Appends to an oldest-first timeline, refusing to go back in time.
pub fn append_timeline(
    timeline: &mut Vec<TimelineEntry>,
    entry: TimelineEntry,
) -> Result<(), TimelineError> {
    if let Some(last) = timeline.last() {
        if entry.date < last.date {
            return Err(TimelineError::OutOfOrder {
                index: timeline.len(),
            });
        }
    }
    timeline.push(entry);
    Ok(())
}

fn check_timeline(timeline: &[TimelineEntry], status: ReportStatus) -> Result<(), TimelineError> {
    let last = timeline.last().ok_or(TimelineError::Empty)?;
    if let Some(index) = timeline
        .windows(2)
        .position(|pair| pair[1].date < pair[0].date)
    {
        return Err(TimelineError::OutOfOrder { index: index + 1 });
    }
    if last.status != status {
        return Err(TimelineError::StatusMismatch {
            status,
            last: last.status,
        });
    }
    Ok(())
}

// --- Report payload ---

/// The payload handed to the portal when a report is submitted.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: ReportId,
    pub crime_type: CrimeType,
    pub description: String,
    pub is_anonymous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub is_critical: bool,
    pub evidence_files: Vec<String>,
    pub status: ReportStatus,
    pub report_date: DateTime<Utc>,
    pub timeline: Vec<TimelineEntry>,
}

impl Report {
    pub fn check_timeline(&self) -> Result<(), TimelineError> {
        check_timeline(&self.timeline, self.status)
    }

    #[must_use]
    pub fn has_contact_details(&self) -> bool {
        self.contact_name.is_some() || self.contact_email.is_some() || self.contact_phone.is_some()
    }
}

// Redact debug output because this carries victim-provided data.
impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("report_id", &self.report_id)
            .field("crime_type", &self.crime_type)
            .field("description_len", &self.description.chars().count())
            .field("is_anonymous", &self.is_anonymous)
            .field("contact_present", &self.has_contact_details())
            .field("emergency_contact_present", &self.emergency_contact.is_some())
            .field("is_critical", &self.is_critical)
            .field("evidence_files", &self.evidence_files.len())
            .field("status", &self.status)
            .field("report_date", &self.report_date)
            .field("timeline_len", &self.timeline.len())
            .finish()
    }
}

// --- Query results ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub report_id: ReportId,
    pub crime_type: CrimeType,
    pub status: ReportStatus,
    pub report_date: DateTime<Utc>,
    pub is_critical: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReportSummary {
    pub id: String,
    pub report_id: ReportId,
    pub crime_type: CrimeType,
    pub status: ReportStatus,
    pub report_date: DateTime<Utc>,
    pub is_critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    pub is_anonymous: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalatedReportSummary {
    pub id: String,
    pub report_id: ReportId,
    pub crime_type: CrimeType,
    pub status: ReportStatus,
    pub report_date: DateTime<Utc>,
    pub escalation_reason: String,
    pub priority: EscalationPriority,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    pub report_id: ReportId,
    pub crime_type: CrimeType,
    pub description: String,
    pub status: ReportStatus,
    pub report_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub is_critical: bool,
    pub evidence_files: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
}

impl ReportDetails {
    pub fn check_timeline(&self) -> Result<(), TimelineError> {
        check_timeline(&self.timeline, self.status)
    }

    /// Records a status change, keeping `status` and `last_updated` in step
    /// with the newest timeline entry.
    pub fn record_status(&mut self, entry: TimelineEntry) -> Result<(), TimelineError> {
        let (status, date) = (entry.status, entry.date);
        append_timeline(&mut self.timeline, entry)?;
        self.status = status;
        self.last_updated = date;
        Ok(())
    }
}

impl From<&Report> for ReportDetails {
    fn from(report: &Report) -> Self {
        let last_updated = report
            .timeline
            .last()
            .map_or(report.report_date, |entry| entry.date);
        Self {
            report_id: report.report_id.clone(),
            crime_type: report.crime_type,
            description: report.description.clone(),
            status: report.status,
            report_date: report.report_date,
            last_updated,
            is_critical: report.is_critical,
            evidence_files: report.evidence_files.clone(),
            timeline: report.timeline.clone(),
        }
    }
}

// --- Feedback ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Suggestion,
    Bug,
    Compliment,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub feedback_type: FeedbackType,
    pub rating: u8,
    pub message: String,
}

// --- Async data slots ---

/// Tags one list request. Every reload draws a new generation, so an answer
/// to an earlier request can be told apart from the one being waited on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListGeneration(u64);

impl ListGeneration {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for ListGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value fetched through the portal. `Loading` is a renderable state of
/// its own, distinct from both outcomes.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading(ListGeneration),
    Loaded(T),
    Failed(PortalError),
}

impl<T> Loadable<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }

    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Stores a response, but only for the request that is still pending.
    /// Returns false when the response is stale and was dropped.
    pub fn settle(&mut self, generation: ListGeneration, result: Result<T, PortalError>) -> bool {
        if !matches!(self, Self::Loading(pending) if *pending == generation) {
            return false;
        }
        *self = match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(e),
        };
        true
    }
}

// --- Navigation ---

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Route {
    #[default]
    Home,
    Report,
    Track {
        report_id: Option<ReportId>,
    },
    MyReports,
    Admin,
    Feedback,
}

// --- Model ---

pub struct Model {
    pub config: PortalConfig,
    pub catalog: Catalog,
    pub ids: Box<dyn ReportIdSource>,
    pub clock: Box<dyn Clock>,

    pub route: Route,
    pub report_form: ReportForm,
    pub tracker: TrackerState,
    pub user_reports: Loadable<Vec<ReportSummary>>,
    pub admin_reports: Loadable<Vec<AdminReportSummary>>,
    pub admin_filters: AdminFilters,
    pub escalations: Loadable<Vec<EscalatedReportSummary>>,
    pub list_generation: ListGeneration,
    pub feedback_form: FeedbackForm,

    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        let config = PortalConfig::default();
        Self {
            report_form: ReportForm::new(config.staging_limits()),
            config,
            catalog: Catalog::default(),
            ids: Box::new(RandomReportIds),
            clock: Box::new(SystemClock),
            route: Route::Home,
            tracker: TrackerState::default(),
            user_reports: Loadable::Idle,
            admin_reports: Loadable::Idle,
            admin_filters: AdminFilters::default(),
            escalations: Loadable::Idle,
            list_generation: ListGeneration::default(),
            feedback_form: FeedbackForm::default(),
            active_error: None,
        }
    }
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    /// Hands out the tag for the next list request.
    pub fn next_list_generation(&mut self) -> ListGeneration {
        self.list_generation = self.list_generation.next();
        self.list_generation
    }

    /// Drops the current report form and mounts a fresh one with a new
    /// session, so late responses for the old session are ignored.
    pub fn remount_report_form(&mut self) {
        self.report_form = ReportForm::new(self.config.staging_limits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, day, hour, 0, 0).unwrap()
    }

    fn entry(day: u32, status: ReportStatus) -> TimelineEntry {
        TimelineEntry {
            date: at(day, 9),
            status,
            description: format!("{status} on {day}"),
        }
    }

    #[test]
    fn report_id_parse_accepts_valid_ids() {
        let id = ReportId::parse("CR-123456").unwrap();
        assert_eq!(id.as_str(), "CR-123456");
        assert_eq!(id.number(), 123_456);
        assert_eq!(ReportId::parse("  cr-100000 ").unwrap().as_str(), "CR-100000");
    }

    #[test]
    fn report_id_parse_rejects_malformed_ids() {
        for input in ["", "CR-", "CR-12345", "CR-1234567", "XX-123456", "CR-12a456", "CR--23456"] {
            assert!(ReportId::parse(input).is_err(), "{input} should be rejected");
        }
        assert_eq!(
            ReportId::parse("CR-012345"),
            Err(ReportIdError::OutOfRange(12_345))
        );
    }

    #[test]
    fn report_id_round_trips_through_json_as_string() {
        let id = ReportId::from_number(654_321).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CR-654321\"");
        assert!(serde_json::from_str::<ReportId>("\"CR-99\"").is_err());
    }

    #[test]
    fn sequential_ids_wrap_around() {
        let mut ids = SequentialReportIds::starting_at(REPORT_ID_MAX);
        assert_eq!(ids.next_id().as_str(), "CR-999999");
        assert_eq!(ids.next_id().as_str(), "CR-100000");
    }

    #[test]
    fn random_ids_stay_in_range() {
        let mut ids = RandomReportIds;
        for _ in 0..500 {
            let id = ids.next_id();
            assert!(ReportId::parse(id.as_str()).is_ok(), "{id}");
            assert!((REPORT_ID_MIN..=REPORT_ID_MAX).contains(&id.number()));
        }
    }

    #[test]
    fn scripted_ids_fall_back_to_sequence() {
        let scripted = ReportId::from_number(777_777).unwrap();
        let mut ids = ScriptedReportIds::new([scripted.clone()]);
        assert_eq!(ids.next_id(), scripted);
        assert_eq!(ids.next_id().as_str(), "CR-100000");
    }

    #[test]
    fn status_serializes_as_display_label() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::UnderReview).unwrap(),
            "\"Under Review\""
        );
    }

    #[test]
    fn crime_type_wire_names_match_as_str() {
        for crime_type in CrimeType::ALL {
            let json = serde_json::to_string(&crime_type).unwrap();
            assert_eq!(json, format!("\"{}\"", crime_type.as_str()));
        }
        assert!(serde_json::from_str::<CrimeType>("\"cyberstalking\"").is_err());
    }

    #[test]
    fn append_timeline_rejects_older_entries() {
        let mut timeline = vec![entry(15, ReportStatus::UnderReview)];
        assert!(append_timeline(&mut timeline, entry(16, ReportStatus::Investigating)).is_ok());
        assert_eq!(
            append_timeline(&mut timeline, entry(14, ReportStatus::Resolved)),
            Err(TimelineError::OutOfOrder { index: 2 })
        );
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn record_status_keeps_last_entry_in_step() {
        let mut details = ReportDetails {
            report_id: ReportId::from_number(123_456).unwrap(),
            crime_type: CrimeType::Phishing,
            description: "Suspicious bank email".into(),
            status: ReportStatus::UnderReview,
            report_date: at(15, 9),
            last_updated: at(15, 9),
            is_critical: false,
            evidence_files: vec![],
            timeline: vec![entry(15, ReportStatus::UnderReview)],
        };
        details.record_status(entry(18, ReportStatus::Investigating)).unwrap();
        assert_eq!(details.status, ReportStatus::Investigating);
        assert_eq!(details.last_updated, at(18, 9));
        assert!(details.check_timeline().is_ok());
    }

    #[test]
    fn check_timeline_detects_mismatch() {
        let mut details_timeline = vec![entry(15, ReportStatus::UnderReview)];
        details_timeline.push(entry(16, ReportStatus::Investigating));
        assert_eq!(
            check_timeline(&details_timeline, ReportStatus::UnderReview),
            Err(TimelineError::StatusMismatch {
                status: ReportStatus::UnderReview,
                last: ReportStatus::Investigating,
            })
        );
        assert_eq!(check_timeline(&[], ReportStatus::UnderReview), Err(TimelineError::Empty));
    }

    #[test]
    fn loadable_drops_stale_responses() {
        let first = ListGeneration::default().next();
        let mut slot: Loadable<Vec<u8>> = Loadable::Idle;
        assert!(!slot.settle(first, Ok(vec![1])));
        assert_eq!(slot, Loadable::Idle);

        slot = Loadable::Loading(first);
        assert!(slot.settle(first, Ok(vec![1])));
        assert_eq!(slot.loaded(), Some(&vec![1]));
        assert!(!slot.settle(first, Err(PortalError::Timeout)));
    }

    #[test]
    fn loadable_ignores_answers_to_earlier_requests() {
        let mut model = Model::default();
        let first = model.next_list_generation();
        let second = model.next_list_generation();
        assert!(first < second);

        let mut slot: Loadable<Vec<u8>> = Loadable::Loading(second);
        assert!(!slot.settle(first, Ok(vec![1])));
        assert!(slot.is_loading());
        assert!(slot.settle(second, Ok(vec![2])));
        assert_eq!(slot.loaded(), Some(&vec![2]));
    }
}
