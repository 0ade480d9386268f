// Cybercrime reporting portal core.
// Shells render `ViewModel` and resolve the `Effect`s this crate requests.
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod feedback;
pub mod form;
pub mod i18n;
pub mod model;
pub mod staging;
pub mod tracker;
pub mod triage;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capabilities::PortalError;
use crate::feedback::FeedbackView;
use crate::i18n::{Locale, Translate};
use crate::model::Route;
use crate::tracker::{ReportListView, TrackerView};
use crate::triage::AdminView;
use crate::view::ReportFormView;

pub use app::{App, Capabilities, Effect};
pub use event::Event;
pub use model::Model;

pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const DEFAULT_MAX_EVIDENCE_FILES: usize = 5;
pub const DEFAULT_MAX_EVIDENCE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &[".jpg", ".jpeg", ".png", ".pdf", ".doc", ".docx"];
pub const NAVIGATION_DELAY_MS: u64 = 2000;
pub const MAX_ID_ATTEMPTS: u8 = 3;
pub const FEEDBACK_NAME_MIN_CHARS: usize = 2;
pub const FEEDBACK_MESSAGE_MIN_CHARS: usize = 10;
pub const FEEDBACK_MESSAGE_MAX_CHARS: usize = 500;
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Conflict,
    Server,
    Rejected,
    Configuration,
    Deserialization,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Server => "SERVER_ERROR",
            Self::Rejected => "REJECTED",
            Self::Configuration => "CONFIG_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Conflict | Self::Server => {
                ErrorSeverity::Transient
            }
            Self::Validation
            | Self::NotFound
            | Self::Rejected
            | Self::Configuration
            | Self::Deserialization
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::Conflict | Self::Server
        )
    }

    const fn translation_key(self) -> &'static str {
        match self {
            Self::Network => "errors.network",
            Self::Timeout => "errors.timeout",
            Self::NotFound => "errors.notFound",
            Self::Conflict => "errors.conflict",
            Self::Server => "errors.server",
            Self::Rejected | Self::Validation => "errors.rejected",
            Self::Configuration => "errors.invalidConfig",
            Self::Deserialization => "errors.data",
            Self::Unknown => "errors.unknown",
        }
    }
}

/// App-level failure shown in the global banner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Validation messages are already user-facing; everything else maps to
    /// a translated generic message so transport details never leak.
    #[must_use]
    pub fn user_facing_message(&self, t: &dyn Translate) -> String {
        match self.kind {
            ErrorKind::Validation => self.message.clone(),
            kind => t.translate(kind.translation_key()),
        }
    }
}

impl From<&PortalError> for AppError {
    fn from(e: &PortalError) -> Self {
        let kind = match e {
            PortalError::Network { .. } => ErrorKind::Network,
            PortalError::Timeout => ErrorKind::Timeout,
            PortalError::Server { .. } => ErrorKind::Server,
            PortalError::NotFound => ErrorKind::NotFound,
            PortalError::Conflict { .. } => ErrorKind::Conflict,
            PortalError::Decode { .. } => ErrorKind::Deserialization,
            PortalError::Rejected { .. } => ErrorKind::Rejected,
        };
        let error = Self::new(kind, e.to_string());
        match e {
            PortalError::Server { status } => error.with_context("status", status.to_string()),
            _ => error,
        }
    }
}

impl From<&config::ConfigError> for AppError {
    fn from(e: &config::ConfigError) -> Self {
        Self::new(ErrorKind::Configuration, e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl UserFacingError {
    #[must_use]
    pub fn new(e: &AppError, t: &dyn Translate) -> Self {
        Self {
            message: e.user_facing_message(t),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Screen {
    Home,
    Report(Box<ReportFormView>),
    Track(TrackerView),
    MyReports(ReportListView),
    Admin(Box<AdminView>),
    Feedback(FeedbackView),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub route: Route,
    pub locale: Locale,
    pub screen: Screen,
    pub error: Option<UserFacingError>,
}

pub mod app {
    use tracing::{debug, info, warn};

    use super::{AppError, Screen, UserFacingError, ViewModel};
    use crate::capabilities::{Delay, Portal, PortalError, Render};
    use crate::event::Event;
    use crate::feedback::{feedback_view, FeedbackForm};
    use crate::form::{FormField, FormPhase, FormSessionId, SubmitAction, SubmitProgress, SubmitRejected};
    use crate::model::{Loadable, Model, ReportId, Route};
    use crate::tracker::{report_list_view, tracker_view, TrackerState};
    use crate::triage::admin_view;
    use crate::view::report_form_view;

    #[derive(crux_core::macros::Effect)]
    pub struct Capabilities {
        pub render: Render<Event>,
        pub portal: Portal<Event>,
        pub delay: Delay<Event>,
    }

    #[derive(Default)]
    pub struct App;

    impl App {
        fn send_submission(action: SubmitAction, session: FormSessionId, caps: &Capabilities) {
            match action {
                SubmitAction::Upload(files) => caps
                    .portal
                    .upload_evidence(files, move |result| Event::EvidenceUploaded { session, result }),
                SubmitAction::Send(report) => caps
                    .portal
                    .submit_report(report, move |result| Event::ReportSubmitted { session, result }),
            }
        }

        fn fetch_report(report_id: ReportId, caps: &Capabilities) {
            let requested = report_id.clone();
            caps.portal.fetch_report(report_id, move |result| Event::ReportFetched {
                report_id: requested,
                result,
            });
        }

        fn load_user_reports(model: &mut Model, caps: &Capabilities) {
            let generation = model.next_list_generation();
            model.user_reports = Loadable::Loading(generation);
            caps.portal.list_user_reports(move |result| Event::UserReportsLoaded {
                generation,
                result,
            });
        }

        fn load_admin(model: &mut Model, caps: &Capabilities) {
            let generation = model.next_list_generation();
            model.admin_reports = Loadable::Loading(generation);
            model.escalations = Loadable::Loading(generation);
            caps.portal.list_all_reports(move |result| Event::AdminReportsLoaded {
                generation,
                result,
            });
            caps.portal
                .list_escalated_reports(move |result| Event::EscalationsLoaded {
                    generation,
                    result,
                });
        }

        /// Leaving a form unmounts it: the next visit starts a new session.
        fn leave_route(to: &Route, model: &mut Model) {
            if model.route == Route::Report && *to != Route::Report {
                model.remount_report_form();
            }
            if model.route == Route::Feedback && *to != Route::Feedback {
                model.feedback_form = FeedbackForm::default();
            }
        }

        fn navigate(route: Route, model: &mut Model, caps: &Capabilities) {
            Self::leave_route(&route, model);

            match &route {
                Route::Track {
                    report_id: Some(report_id),
                } => {
                    if let Some(report_id) = model.tracker.request(report_id.as_str()) {
                        Self::fetch_report(report_id, caps);
                    }
                }
                Route::Track { report_id: None } => model.tracker = TrackerState::Idle,
                Route::MyReports => Self::load_user_reports(model, caps),
                Route::Admin => Self::load_admin(model, caps),
                Route::Home | Route::Report | Route::Feedback => {}
            }

            debug!(from = ?model.route, to = ?route, "navigated");
            model.route = route;
        }

        fn record_list_failure(model: &mut Model, operation: &str, error: Option<&PortalError>) {
            if let Some(e) = error {
                warn!(operation, error = %e, "portal query failed");
                model.set_error(AppError::from(e).with_context("operation", operation));
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(
                event = event.name(),
                user = event.is_user_initiated(),
                "event received"
            );

            match event {
                Event::Noop => {}

                Event::Configure(config) => match config.validate() {
                    Ok(()) => {
                        // Files already staged keep their limits until the next form session.
                        if !model.report_form.set_limits(config.staging_limits()) {
                            info!("staging limits deferred until the report form is reopened");
                        }
                        model.config = *config;
                        info!("portal configuration applied");
                    }
                    Err(e) => {
                        warn!(error = %e, "portal configuration rejected");
                        model.set_error(AppError::from(&e));
                    }
                },

                Event::LocaleChanged { locale } => model.catalog.set_locale(locale),

                Event::Navigate { route } => Self::navigate(route, model, caps),

                Event::ErrorDismissed => model.clear_error(),

                Event::CrimeTypeSelected { crime_type } => {
                    model.report_form.set_crime_type(crime_type);
                }
                Event::DescriptionChanged { text } => {
                    model.report_form.set_description(text);
                }
                Event::ContactNameChanged { value } => {
                    model.report_form.set_contact_name(value);
                }
                Event::ContactEmailChanged { value } => {
                    model.report_form.set_contact_email(value);
                }
                Event::ContactPhoneChanged { value } => {
                    model.report_form.set_contact_phone(value);
                }
                Event::EmergencyContactChanged { value } => {
                    model.report_form.set_emergency_contact(value);
                }
                Event::AnonymousToggled { is_anonymous } => {
                    model.report_form.set_anonymous(is_anonymous);
                }
                Event::CriticalToggled { is_critical } => {
                    model.report_form.set_critical(is_critical);
                }
                Event::EvidenceSelected { files } => {
                    // A rejected batch stays on the form as a dismissible error.
                    let _ = model.report_form.stage_files(files);
                }
                Event::EvidenceRemoved { file_id } => {
                    model.report_form.remove_file(file_id);
                }
                Event::EvidenceErrorDismissed => model.report_form.dismiss_evidence_error(),
                Event::SubmissionErrorDismissed => model.report_form.dismiss_submit_error(),
                Event::ReportFormReset => {
                    model.report_form.reset();
                }

                Event::SubmitReportRequested => {
                    let now = model.clock.now();
                    let session = model.report_form.session();
                    match model.report_form.begin_submit(
                        model.config.require_contact_when_identified,
                        model.ids.as_mut(),
                        now,
                    ) {
                        Ok(action) => Self::send_submission(action, session, caps),
                        Err(SubmitRejected::Busy) => {}
                        Err(SubmitRejected::Invalid(errors)) => {
                            debug!(errors = errors.len(), "submit blocked by validation");
                        }
                    }
                }

                Event::EvidenceUploaded { session, result } => {
                    if session != model.report_form.session() {
                        debug!(session = %session, "stale evidence upload response dropped");
                        return;
                    }
                    if let Some(report) = model.report_form.evidence_uploaded(result) {
                        Self::send_submission(SubmitAction::Send(report), session, caps);
                    }
                }

                Event::ReportSubmitted { session, result } => {
                    if session != model.report_form.session() {
                        debug!(session = %session, "stale submission response dropped");
                        return;
                    }
                    match model.report_form.report_submitted(result, model.ids.as_mut()) {
                        SubmitProgress::Succeeded(report_id) => {
                            caps.delay.start(model.config.navigation_delay_ms, move || {
                                Event::NavigationDelayElapsed { session, report_id }
                            });
                        }
                        SubmitProgress::Retry(report) => {
                            Self::send_submission(SubmitAction::Send(report), session, caps);
                        }
                        SubmitProgress::Failed | SubmitProgress::Ignored => {}
                    }
                }

                Event::NavigationDelayElapsed { session, report_id } => {
                    let still_showing = session == model.report_form.session()
                        && matches!(model.report_form.phase(), FormPhase::Succeeded { .. });
                    if !still_showing {
                        debug!(report_id = %report_id, "post-submit navigation skipped");
                        return;
                    }
                    Self::navigate(
                        Route::Track {
                            report_id: Some(report_id),
                        },
                        model,
                        caps,
                    );
                }

                Event::TrackReportRequested { query } => {
                    let route = Route::Track {
                        report_id: ReportId::parse(&query).ok(),
                    };
                    Self::leave_route(&route, model);
                    debug!(from = ?model.route, to = ?route, "navigated");
                    model.route = route;
                    if let Some(report_id) = model.tracker.request(&query) {
                        Self::fetch_report(report_id, caps);
                    }
                }

                Event::TrackRetryRequested => {
                    if let Some(report_id) = model.tracker.retry_target().cloned() {
                        if let Some(report_id) = model.tracker.request(report_id.as_str()) {
                            Self::fetch_report(report_id, caps);
                        }
                    }
                }

                Event::ReportFetched { report_id, result } => {
                    model.tracker.settle(&report_id, result);
                }

                Event::UserReportsRequested => Self::load_user_reports(model, caps),

                Event::UserReportsLoaded { generation, result } => {
                    let failure = result.as_ref().err().cloned();
                    if model.user_reports.settle(generation, result) {
                        Self::record_list_failure(model, "list_user_reports", failure.as_ref());
                    }
                }

                Event::AdminReportsRequested => Self::load_admin(model, caps),

                Event::AdminReportsLoaded { generation, result } => {
                    let failure = result.as_ref().err().cloned();
                    if model.admin_reports.settle(generation, result) {
                        Self::record_list_failure(model, "list_all_reports", failure.as_ref());
                    }
                }

                Event::EscalationsLoaded { generation, result } => {
                    let failure = result.as_ref().err().cloned();
                    if model.escalations.settle(generation, result) {
                        Self::record_list_failure(
                            model,
                            "list_escalated_reports",
                            failure.as_ref(),
                        );
                    }
                }

                Event::AdminSearchChanged { search } => model.admin_filters.search = search,
                Event::AdminStatusFilterChanged { filter } => model.admin_filters.status = filter,
                Event::AdminTypeFilterChanged { filter } => {
                    model.admin_filters.crime_type = filter;
                }

                Event::FeedbackNameChanged { value } => {
                    model.feedback_form.edit(FormField::Name, |f| f.name = value);
                }
                Event::FeedbackEmailChanged { value } => {
                    model.feedback_form.edit(FormField::Email, |f| f.email = value);
                }
                Event::FeedbackTypeSelected { feedback_type } => {
                    model
                        .feedback_form
                        .edit(FormField::FeedbackType, |f| f.feedback_type = feedback_type);
                }
                Event::FeedbackRatingSelected { rating } => {
                    model.feedback_form.edit(FormField::Rating, |f| f.rating = rating);
                }
                Event::FeedbackMessageChanged { text } => {
                    model.feedback_form.edit(FormField::Message, |f| f.message = text);
                }

                Event::SubmitFeedbackRequested => {
                    if let Some(feedback) = model.feedback_form.begin_submit() {
                        let session = model.feedback_form.session();
                        caps.portal.submit_feedback(feedback, move |result| {
                            Event::FeedbackSubmitted { session, result }
                        });
                    }
                }

                Event::FeedbackSubmitted { session, result } => {
                    model.feedback_form.submitted(session, result);
                }
            }

            caps.render.render();
        }

        fn view(&self, model: &Model) -> ViewModel {
            let t = &model.catalog;

            let screen = match &model.route {
                Route::Home => Screen::Home,
                Route::Report => Screen::Report(Box::new(report_form_view(&model.report_form, t))),
                Route::Track { .. } => Screen::Track(tracker_view(&model.tracker, t)),
                Route::MyReports => Screen::MyReports(report_list_view(&model.user_reports, t)),
                Route::Admin => Screen::Admin(Box::new(admin_view(
                    &model.admin_reports,
                    &model.escalations,
                    &model.admin_filters,
                    t,
                ))),
                Route::Feedback => Screen::Feedback(feedback_view(&model.feedback_form, t)),
            };

            ViewModel {
                route: model.route.clone(),
                locale: model.catalog.locale(),
                screen,
                error: model
                    .active_error
                    .as_ref()
                    .map(|e| UserFacingError::new(e, t)),
            }
        }
    }
}
