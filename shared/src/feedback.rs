use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::capabilities::PortalError;
use crate::form::{
    check_text, field_errors, is_valid_email, non_empty, FieldErrorKind, FieldErrorView, FormField,
    FormSessionId, ValidationError,
};
use crate::i18n::Translate;
use crate::model::{Feedback, FeedbackType};
use crate::{
    FEEDBACK_MESSAGE_MAX_CHARS, FEEDBACK_MESSAGE_MIN_CHARS, FEEDBACK_NAME_MIN_CHARS, RATING_MAX,
    RATING_MIN,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedbackFields {
    pub name: String,
    pub email: String,
    pub feedback_type: Option<FeedbackType>,
    pub rating: Option<u8>,
    pub message: String,
}

pub fn validate_feedback(fields: &FeedbackFields) -> Result<Feedback, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = non_empty(&fields.name);
    if let Some(name) = &name {
        if name.chars().count() < FEEDBACK_NAME_MIN_CHARS {
            errors.push(ValidationError::new(
                FormField::Name,
                FieldErrorKind::TooShort {
                    min: FEEDBACK_NAME_MIN_CHARS,
                },
            ));
        }
    }

    let email = non_empty(&fields.email);
    if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        errors.push(ValidationError::new(FormField::Email, FieldErrorKind::InvalidEmail));
    }

    if fields.feedback_type.is_none() {
        errors.push(ValidationError::new(FormField::FeedbackType, FieldErrorKind::Required));
    }

    match fields.rating {
        None => errors.push(ValidationError::new(FormField::Rating, FieldErrorKind::Required)),
        Some(r) if !(RATING_MIN..=RATING_MAX).contains(&r) => errors.push(ValidationError::new(
            FormField::Rating,
            FieldErrorKind::OutOfRange {
                min: RATING_MIN,
                max: RATING_MAX,
            },
        )),
        Some(_) => {}
    }

    errors.extend(check_text(
        FormField::Message,
        &fields.message,
        FEEDBACK_MESSAGE_MIN_CHARS,
        FEEDBACK_MESSAGE_MAX_CHARS,
    ));

    match (fields.feedback_type, fields.rating) {
        (Some(feedback_type), Some(rating)) if errors.is_empty() => Ok(Feedback {
            name,
            email,
            feedback_type,
            rating,
            message: fields.message.clone(),
        }),
        _ => Err(errors),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPhase {
    #[default]
    Editing,
    Submitting,
    Sent,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedbackForm {
    session: FormSessionId,
    fields: FeedbackFields,
    errors: BTreeMap<FormField, FieldErrorKind>,
    phase: FeedbackPhase,
    submit_error: Option<PortalError>,
}

impl FeedbackForm {
    #[must_use]
    pub fn session(&self) -> FormSessionId {
        self.session
    }

    #[must_use]
    pub fn fields(&self) -> &FeedbackFields {
        &self.fields
    }

    #[must_use]
    pub fn phase(&self) -> FeedbackPhase {
        self.phase
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

    /// Edits are refused while a submission is in flight. Editing after a
    /// successful send starts a new message.
    pub fn edit(&mut self, field: FormField, apply: impl FnOnce(&mut FeedbackFields)) -> bool {
        match self.phase {
            FeedbackPhase::Submitting => return false,
            FeedbackPhase::Sent => self.phase = FeedbackPhase::Editing,
            FeedbackPhase::Editing => {}
        }
        apply(&mut self.fields);
        self.errors.remove(&field);
        true
    }

    pub fn begin_submit(&mut self) -> Option<Feedback> {
        if self.phase == FeedbackPhase::Submitting {
            debug!("feedback submit ignored, already in flight");
            return None;
        }
        match validate_feedback(&self.fields) {
            Ok(feedback) => {
                self.errors.clear();
                self.submit_error = None;
                self.phase = FeedbackPhase::Submitting;
                Some(feedback)
            }
            Err(errors) => {
                self.phase = FeedbackPhase::Editing;
                self.errors = errors.iter().map(|e| (e.field, e.kind)).collect();
                None
            }
        }
    }

    /// Returns false for a response that no longer applies.
    pub fn submitted(&mut self, session: FormSessionId, result: Result<(), PortalError>) -> bool {
        if session != self.session || self.phase != FeedbackPhase::Submitting {
            debug!(session = %session, "stale feedback response dropped");
            return false;
        }
        match result {
            Ok(()) => {
                info!("feedback accepted");
                *self = Self {
                    phase: FeedbackPhase::Sent,
                    ..Self::default()
                };
            }
            Err(e) => {
                warn!(error = %e, "feedback submission failed");
                self.phase = FeedbackPhase::Editing;
                self.submit_error = Some(e);
            }
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackView {
    pub name: String,
    pub email: String,
    pub feedback_type: Option<FeedbackType>,
    pub rating: Option<u8>,
    pub message: String,
    pub phase: FeedbackPhase,
    pub field_errors: Vec<FieldErrorView>,
    pub banner: Option<String>,
    pub can_submit: bool,
}

#[must_use]
pub fn feedback_view(form: &FeedbackForm, t: &dyn Translate) -> FeedbackView {
    let banner = match (form.phase, form.submit_error.is_some()) {
        (FeedbackPhase::Sent, _) => Some(t.translate("feedback.success")),
        (_, true) => Some(t.translate("feedback.error")),
        _ => None,
    };
    FeedbackView {
        name: form.fields.name.clone(),
        email: form.fields.email.clone(),
        feedback_type: form.fields.feedback_type,
        rating: form.fields.rating,
        message: form.fields.message.clone(),
        phase: form.phase,
        field_errors: field_errors(&form.errors(), t),
        banner,
        can_submit: form.phase != FeedbackPhase::Submitting,
    }
}
