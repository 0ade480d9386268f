use serde::{Deserialize, Serialize};

use crate::capabilities::PortalError;
use crate::config::PortalConfig;
use crate::form::FormSessionId;
use crate::i18n::Locale;
use crate::model::{
    AdminReportSummary, CrimeType, EscalatedReportSummary, FeedbackType, ListGeneration,
    ReportDetails, ReportId, ReportSummary, Route,
};
use crate::staging::{FileCandidate, StagedFileId};
use crate::triage::{StatusFilter, TypeFilter};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Event {
    #[default]
    Noop,

    Configure(Box<PortalConfig>),
    LocaleChanged {
        locale: Locale,
    },
    Navigate {
        route: Route,
    },
    ErrorDismissed,

    // report form
    CrimeTypeSelected {
        crime_type: Option<CrimeType>,
    },
    DescriptionChanged {
        text: String,
    },
    ContactNameChanged {
        value: String,
    },
    ContactEmailChanged {
        value: String,
    },
    ContactPhoneChanged {
        value: String,
    },
    EmergencyContactChanged {
        value: String,
    },
    AnonymousToggled {
        is_anonymous: bool,
    },
    CriticalToggled {
        is_critical: bool,
    },
    EvidenceSelected {
        files: Vec<FileCandidate>,
    },
    EvidenceRemoved {
        file_id: StagedFileId,
    },
    EvidenceErrorDismissed,
    SubmissionErrorDismissed,
    SubmitReportRequested,
    ReportFormReset,

    #[serde(skip)]
    EvidenceUploaded {
        session: FormSessionId,
        result: Result<Vec<String>, PortalError>,
    },
    #[serde(skip)]
    ReportSubmitted {
        session: FormSessionId,
        result: Result<ReportId, PortalError>,
    },
    #[serde(skip)]
    NavigationDelayElapsed {
        session: FormSessionId,
        report_id: ReportId,
    },

    // tracking
    TrackReportRequested {
        query: String,
    },
    TrackRetryRequested,
    #[serde(skip)]
    ReportFetched {
        report_id: ReportId,
        result: Result<Option<Box<ReportDetails>>, PortalError>,
    },

    UserReportsRequested,
    #[serde(skip)]
    UserReportsLoaded {
        generation: ListGeneration,
        result: Result<Vec<ReportSummary>, PortalError>,
    },

    // admin
    AdminReportsRequested,
    #[serde(skip)]
    AdminReportsLoaded {
        generation: ListGeneration,
        result: Result<Vec<AdminReportSummary>, PortalError>,
    },
    #[serde(skip)]
    EscalationsLoaded {
        generation: ListGeneration,
        result: Result<Vec<EscalatedReportSummary>, PortalError>,
    },
    AdminSearchChanged {
        search: String,
    },
    AdminStatusFilterChanged {
        filter: StatusFilter,
    },
    AdminTypeFilterChanged {
        filter: TypeFilter,
    },

    // feedback
    FeedbackNameChanged {
        value: String,
    },
    FeedbackEmailChanged {
        value: String,
    },
    FeedbackTypeSelected {
        feedback_type: Option<FeedbackType>,
    },
    FeedbackRatingSelected {
        rating: Option<u8>,
    },
    FeedbackMessageChanged {
        text: String,
    },
    SubmitFeedbackRequested,
    #[serde(skip)]
    FeedbackSubmitted {
        session: FormSessionId,
        result: Result<(), PortalError>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Configure(_) => "configure",
            Self::LocaleChanged { .. } => "locale_changed",
            Self::Navigate { .. } => "navigate",
            Self::ErrorDismissed => "error_dismissed",
            Self::CrimeTypeSelected { .. } => "crime_type_selected",
            Self::DescriptionChanged { .. } => "description_changed",
            Self::ContactNameChanged { .. } => "contact_name_changed",
            Self::ContactEmailChanged { .. } => "contact_email_changed",
            Self::ContactPhoneChanged { .. } => "contact_phone_changed",
            Self::EmergencyContactChanged { .. } => "emergency_contact_changed",
            Self::AnonymousToggled { .. } => "anonymous_toggled",
            Self::CriticalToggled { .. } => "critical_toggled",
            Self::EvidenceSelected { .. } => "evidence_selected",
            Self::EvidenceRemoved { .. } => "evidence_removed",
            Self::EvidenceErrorDismissed => "evidence_error_dismissed",
            Self::SubmissionErrorDismissed => "submission_error_dismissed",
            Self::SubmitReportRequested => "submit_report_requested",
            Self::ReportFormReset => "report_form_reset",
            Self::EvidenceUploaded { .. } => "evidence_uploaded",
            Self::ReportSubmitted { .. } => "report_submitted",
            Self::NavigationDelayElapsed { .. } => "navigation_delay_elapsed",
            Self::TrackReportRequested { .. } => "track_report_requested",
            Self::TrackRetryRequested => "track_retry_requested",
            Self::ReportFetched { .. } => "report_fetched",
            Self::UserReportsRequested => "user_reports_requested",
            Self::UserReportsLoaded { .. } => "user_reports_loaded",
            Self::AdminReportsRequested => "admin_reports_requested",
            Self::AdminReportsLoaded { .. } => "admin_reports_loaded",
            Self::EscalationsLoaded { .. } => "escalations_loaded",
            Self::AdminSearchChanged { .. } => "admin_search_changed",
            Self::AdminStatusFilterChanged { .. } => "admin_status_filter_changed",
            Self::AdminTypeFilterChanged { .. } => "admin_type_filter_changed",
            Self::FeedbackNameChanged { .. } => "feedback_name_changed",
            Self::FeedbackEmailChanged { .. } => "feedback_email_changed",
            Self::FeedbackTypeSelected { .. } => "feedback_type_selected",
            Self::FeedbackRatingSelected { .. } => "feedback_rating_selected",
            Self::FeedbackMessageChanged { .. } => "feedback_message_changed",
            Self::SubmitFeedbackRequested => "submit_feedback_requested",
            Self::FeedbackSubmitted { .. } => "feedback_submitted",
        }
    }

    /// Events raised by the shell on behalf of the user, as opposed to
    /// capability responses and lifecycle events.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::Noop
                | Self::Configure(_)
                | Self::EvidenceUploaded { .. }
                | Self::ReportSubmitted { .. }
                | Self::NavigationDelayElapsed { .. }
                | Self::ReportFetched { .. }
                | Self::UserReportsLoaded { .. }
                | Self::AdminReportsLoaded { .. }
                | Self::EscalationsLoaded { .. }
                | Self::FeedbackSubmitted { .. }
        )
    }
}
