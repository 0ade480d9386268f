//! Report form controller.
//!
//! Owns the field values, per-field validation errors, the evidence buffer
//! and the `Editing -> Submitting -> Succeeded` state machine. It performs no
//! I/O: `begin_submit` hands back the portal request to make and the app
//! feeds the responses back in.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capabilities::{EvidenceUpload, PortalError};
use crate::i18n::Translate;
use crate::model::{
    CrimeType, Report, ReportId, ReportIdSource, ReportStatus, TimelineEntry,
};
use crate::staging::{EvidenceStager, FileCandidate, StagedFileId, StagingError, StagingLimits};
use crate::{DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS, MAX_ID_ATTEMPTS};

pub const SUBMITTED_TIMELINE_NOTE: &str = "Report submitted";

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value.trim())
}

// --- Validation errors ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    CrimeType,
    Description,
    ContactName,
    ContactEmail,
    ContactPhone,
    EmergencyContact,
    Name,
    Email,
    FeedbackType,
    Rating,
    Message,
}

impl FormField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrimeType => "crimeType",
            Self::Description => "description",
            Self::ContactName => "contactName",
            Self::ContactEmail => "contactEmail",
            Self::ContactPhone => "contactPhone",
            Self::EmergencyContact => "emergencyContact",
            Self::Name => "name",
            Self::Email => "email",
            Self::FeedbackType => "feedbackType",
            Self::Rating => "rating",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldErrorKind {
    #[error("is required")]
    Required,
    #[error("must be at least {min} characters")]
    TooShort { min: usize },
    #[error("must be at most {max} characters")]
    TooLong { max: usize },
    #[error("is not a valid email address")]
    InvalidEmail,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: u8, max: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{field} {kind}")]
pub struct ValidationError {
    pub field: FormField,
    pub kind: FieldErrorKind,
}

impl ValidationError {
    #[must_use]
    pub const fn new(field: FormField, kind: FieldErrorKind) -> Self {
        Self { field, kind }
    }

    #[must_use]
    pub fn user_message(&self, t: &dyn Translate) -> String {
        match self.kind {
            FieldErrorKind::Required => t.translate("validation.required"),
            FieldErrorKind::TooShort { min } => {
                t.translate_with("validation.tooShort", &[("min", &min.to_string())])
            }
            FieldErrorKind::TooLong { max } => {
                t.translate_with("validation.tooLong", &[("max", &max.to_string())])
            }
            FieldErrorKind::InvalidEmail => t.translate("validation.invalidEmail"),
            FieldErrorKind::OutOfRange { min, max } => t.translate_with(
                "validation.outOfRange",
                &[("min", &min.to_string()), ("max", &max.to_string())],
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorView {
    pub field: FormField,
    pub message: String,
}

pub(crate) fn field_errors(errors: &[ValidationError], t: &dyn Translate) -> Vec<FieldErrorView> {
    errors
        .iter()
        .map(|e| FieldErrorView {
            field: e.field,
            message: e.user_message(t),
        })
        .collect()
}

/// Character-count check on the text as typed. Only an empty string is
/// `Required`; whitespace counts like any other character.
pub(crate) fn check_text(
    field: FormField,
    value: &str,
    min: usize,
    max: usize,
) -> Option<ValidationError> {
    let count = value.chars().count();
    let kind = if count == 0 {
        FieldErrorKind::Required
    } else if count < min {
        FieldErrorKind::TooShort { min }
    } else if count > max {
        FieldErrorKind::TooLong { max }
    } else {
        return None;
    };
    Some(ValidationError::new(field, kind))
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// --- Form state ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormSessionId(Uuid);

impl FormSessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FormSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FormSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ReportFields {
    pub crime_type: Option<CrimeType>,
    pub description: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub emergency_contact: String,
    pub is_anonymous: bool,
    pub is_critical: bool,
}

impl fmt::Debug for ReportFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportFields")
            .field("crime_type", &self.crime_type)
            .field("description_len", &self.description.chars().count())
            .field("contact_name", &"[REDACTED]")
            .field("contact_email", &"[REDACTED]")
            .field("contact_phone", &"[REDACTED]")
            .field("emergency_contact", &"[REDACTED]")
            .field("is_anonymous", &self.is_anonymous)
            .field("is_critical", &self.is_critical)
            .finish()
    }
}

/// Field rules. Contact fields are exempt while anonymous.
#[must_use]
pub fn validate_report(fields: &ReportFields, require_contact: bool) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if fields.crime_type.is_none() {
        errors.push(ValidationError::new(FormField::CrimeType, FieldErrorKind::Required));
    }
    errors.extend(check_text(
        FormField::Description,
        &fields.description,
        DESCRIPTION_MIN_CHARS,
        DESCRIPTION_MAX_CHARS,
    ));

    if !fields.is_anonymous {
        if require_contact && fields.contact_name.trim().is_empty() {
            errors.push(ValidationError::new(FormField::ContactName, FieldErrorKind::Required));
        }
        let email = fields.contact_email.trim();
        if email.is_empty() {
            if require_contact {
                errors.push(ValidationError::new(FormField::ContactEmail, FieldErrorKind::Required));
            }
        } else if !is_valid_email(email) {
            errors.push(ValidationError::new(FormField::ContactEmail, FieldErrorKind::InvalidEmail));
        }
    }

    errors
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStep {
    UploadingEvidence,
    SendingReport,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormPhase {
    Editing,
    Submitting {
        step: SubmitStep,
        draft: Box<Report>,
        attempts: u8,
    },
    Succeeded {
        report_id: ReportId,
    },
}

/// The portal request that starts or continues a submission.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitAction {
    Upload(Vec<EvidenceUpload>),
    Send(Box<Report>),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("a submission is already in flight or complete")]
    Busy,
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// What the app should do after the gateway answered a `SubmitReport`.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitProgress {
    Succeeded(ReportId),
    Retry(Box<Report>),
    Failed,
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportForm {
    session: FormSessionId,
    fields: ReportFields,
    errors: BTreeMap<FormField, FieldErrorKind>,
    evidence: EvidenceStager,
    phase: FormPhase,
    submit_error: Option<PortalError>,
}

impl Default for ReportForm {
    fn default() -> Self {
        Self::new(StagingLimits::default())
    }
}

impl ReportForm {
    #[must_use]
    pub fn new(limits: StagingLimits) -> Self {
        Self {
            session: FormSessionId::new(),
            fields: ReportFields::default(),
            errors: BTreeMap::new(),
            evidence: EvidenceStager::new(limits),
            phase: FormPhase::Editing,
            submit_error: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> FormSessionId {
        self.session
    }

    #[must_use]
    pub fn fields(&self) -> &ReportFields {
        &self.fields
    }

    #[must_use]
    pub fn evidence(&self) -> &EvidenceStager {
        &self.evidence
    }

    #[must_use]
    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    #[must_use]
    pub fn submit_error(&self) -> Option<&PortalError> {
        self.submit_error.as_ref()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        self.errors
            .iter()
            .map(|(field, kind)| ValidationError::new(*field, *kind))
            .collect()
    }

    #[must_use]
    pub fn error_for(&self, field: FormField) -> Option<FieldErrorKind> {
        self.errors.get(&field).copied()
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        matches!(self.phase, FormPhase::Editing)
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.is_editing()
    }

    /// Applies a field edit while editing; clears that field's error.
    /// Returns false when the form is locked.
    pub fn edit(&mut self, field: FormField, apply: impl FnOnce(&mut ReportFields)) -> bool {
        if !self.is_editing() {
            debug!(field = field.as_str(), "edit ignored outside editing");
            return false;
        }
        apply(&mut self.fields);
        self.errors.remove(&field);
        true
    }

    pub fn set_crime_type(&mut self, crime_type: Option<CrimeType>) -> bool {
        self.edit(FormField::CrimeType, |f| f.crime_type = crime_type)
    }

    pub fn set_description(&mut self, text: String) -> bool {
        self.edit(FormField::Description, |f| f.description = text)
    }

    pub fn set_contact_name(&mut self, value: String) -> bool {
        self.edit(FormField::ContactName, |f| f.contact_name = value)
    }

    pub fn set_contact_email(&mut self, value: String) -> bool {
        self.edit(FormField::ContactEmail, |f| f.contact_email = value)
    }

    pub fn set_contact_phone(&mut self, value: String) -> bool {
        self.edit(FormField::ContactPhone, |f| f.contact_phone = value)
    }

    pub fn set_emergency_contact(&mut self, value: String) -> bool {
        self.edit(FormField::EmergencyContact, |f| f.emergency_contact = value)
    }

    pub fn set_anonymous(&mut self, is_anonymous: bool) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.fields.is_anonymous = is_anonymous;
        if is_anonymous {
            for field in [FormField::ContactName, FormField::ContactEmail, FormField::ContactPhone] {
                self.errors.remove(&field);
            }
        }
        true
    }

    pub fn set_critical(&mut self, is_critical: bool) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.fields.is_critical = is_critical;
        true
    }

    pub fn stage_files(&mut self, candidates: Vec<FileCandidate>) -> Result<usize, StagingError> {
        if !self.is_editing() {
            debug!("evidence selection ignored outside editing");
            return Ok(0);
        }
        self.evidence.add_files(candidates)
    }

    pub fn remove_file(&mut self, id: StagedFileId) -> bool {
        self.is_editing() && self.evidence.remove(id).is_some()
    }

    /// See [`EvidenceStager::set_limits`].
    pub fn set_limits(&mut self, limits: StagingLimits) -> bool {
        self.evidence.set_limits(limits)
    }

    pub fn dismiss_evidence_error(&mut self) {
        self.evidence.dismiss_error();
    }

    pub fn dismiss_submit_error(&mut self) {
        self.submit_error = None;
    }

    /// Clears fields and staged files and starts a new session. Ignored
    /// while a submission is in flight.
    pub fn reset(&mut self) -> bool {
        if matches!(self.phase, FormPhase::Submitting { .. }) {
            return false;
        }
        *self = Self::new(self.evidence.limits().clone());
        true
    }

    /// Validates and, if clean, assigns an id and locks the form.
    pub fn begin_submit(
        &mut self,
        require_contact: bool,
        ids: &mut dyn ReportIdSource,
        now: DateTime<Utc>,
    ) -> Result<SubmitAction, SubmitRejected> {
        if !self.is_editing() {
            debug!(session = %self.session, "submit ignored, form is busy");
            return Err(SubmitRejected::Busy);
        }

        let errors = validate_report(&self.fields, require_contact);
        if !errors.is_empty() {
            self.errors = errors.iter().map(|e| (e.field, e.kind)).collect();
            debug!(session = %self.session, errors = errors.len(), "report failed validation");
            return Err(SubmitRejected::Invalid(errors));
        }
        let Some(crime_type) = self.fields.crime_type else {
            return Err(SubmitRejected::Invalid(vec![ValidationError::new(
                FormField::CrimeType,
                FieldErrorKind::Required,
            )]));
        };

        self.errors.clear();
        self.submit_error = None;

        let draft = self.assemble(crime_type, ids.next_id(), now);
        info!(
            session = %self.session,
            report_id = %draft.report_id,
            anonymous = draft.is_anonymous,
            critical = draft.is_critical,
            evidence = self.evidence.files().len(),
            "report submission started"
        );

        let (step, action) = if self.evidence.files().is_empty() {
            (SubmitStep::SendingReport, SubmitAction::Send(Box::new(draft.clone())))
        } else {
            let uploads = self.evidence.files().iter().map(EvidenceUpload::from).collect();
            (SubmitStep::UploadingEvidence, SubmitAction::Upload(uploads))
        };
        self.phase = FormPhase::Submitting {
            step,
            draft: Box::new(draft),
            attempts: 1,
        };
        Ok(action)
    }

    fn assemble(&self, crime_type: CrimeType, report_id: ReportId, now: DateTime<Utc>) -> Report {
        let f = &self.fields;
        let contact = |value: &str| if f.is_anonymous { None } else { non_empty(value) };
        Report {
            report_id,
            crime_type,
            description: f.description.clone(),
            is_anonymous: f.is_anonymous,
            contact_name: contact(&f.contact_name),
            contact_email: contact(&f.contact_email),
            contact_phone: contact(&f.contact_phone),
            emergency_contact: non_empty(&f.emergency_contact),
            is_critical: f.is_critical,
            evidence_files: Vec::new(),
            status: ReportStatus::UnderReview,
            report_date: now,
            timeline: vec![TimelineEntry {
                date: now,
                status: ReportStatus::UnderReview,
                description: SUBMITTED_TIMELINE_NOTE.to_string(),
            }],
        }
    }

    /// Attaches uploaded urls and returns the payload to send, or `None`
    /// when the upload failed or was not expected.
    pub fn evidence_uploaded(&mut self, result: Result<Vec<String>, PortalError>) -> Option<Box<Report>> {
        let FormPhase::Submitting {
            step: step @ SubmitStep::UploadingEvidence,
            draft,
            ..
        } = &mut self.phase
        else {
            debug!(session = %self.session, "unexpected evidence upload response ignored");
            return None;
        };

        let expected = self.evidence.files().len();
        match result {
            Ok(urls) if urls.len() == expected => {
                draft.evidence_files = urls;
                *step = SubmitStep::SendingReport;
                debug!(session = %self.session, files = expected, "evidence uploaded");
                Some(draft.clone())
            }
            Ok(urls) => {
                let error = PortalError::Decode {
                    reason: format!("expected {expected} evidence urls, got {}", urls.len()),
                };
                self.fail(error);
                None
            }
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Handles the gateway's answer. A conflict draws a fresh id and resends
    /// until `MAX_ID_ATTEMPTS` is reached.
    pub fn report_submitted(
        &mut self,
        result: Result<ReportId, PortalError>,
        ids: &mut dyn ReportIdSource,
    ) -> SubmitProgress {
        let FormPhase::Submitting {
            step: SubmitStep::SendingReport,
            draft,
            attempts,
        } = &mut self.phase
        else {
            debug!(session = %self.session, "unexpected submission response ignored");
            return SubmitProgress::Ignored;
        };

        match result {
            Ok(report_id) => {
                if report_id != draft.report_id {
                    warn!(
                        sent = %draft.report_id,
                        accepted = %report_id,
                        "portal assigned a different report id"
                    );
                }
                info!(session = %self.session, report_id = %report_id, "report accepted");
                self.phase = FormPhase::Succeeded {
                    report_id: report_id.clone(),
                };
                SubmitProgress::Succeeded(report_id)
            }
            Err(PortalError::Conflict { .. }) if *attempts < MAX_ID_ATTEMPTS => {
                let previous = std::mem::replace(&mut draft.report_id, ids.next_id());
                *attempts += 1;
                warn!(
                    previous = %previous,
                    retry = %draft.report_id,
                    attempt = *attempts,
                    "report id conflict, retrying with a new id"
                );
                SubmitProgress::Retry(draft.clone())
            }
            Err(e) => {
                self.fail(e);
                SubmitProgress::Failed
            }
        }
    }

    fn fail(&mut self, error: PortalError) {
        warn!(session = %self.session, error = %error, "report submission failed");
        self.phase = FormPhase::Editing;
        self.submit_error = Some(error);
    }
}
