//! Report form view derivation.

use serde::{Deserialize, Serialize};

use crate::form::{field_errors, FieldErrorView, FormPhase, ReportForm, SubmitStep};
use crate::i18n::Translate;
use crate::model::CrimeType;
use crate::staging::{format_bytes, EvidenceStager, StagedFileId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeTypeOption {
    pub value: CrimeType,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFileView {
    pub id: StagedFileId,
    pub name: String,
    pub size: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingView {
    pub files: Vec<StagedFileView>,
    pub count_label: String,
    pub total_size: String,
    pub max_size_label: String,
    pub allowed_types_label: String,
    pub error: Option<String>,
    pub can_add_more: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFieldsView {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormPhaseView {
    Editing,
    Submitting { step: SubmitStep },
    Succeeded { report_id: String, title: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFormView {
    pub phase: FormPhaseView,
    pub crime_type: Option<CrimeType>,
    pub crime_type_placeholder: String,
    pub crime_type_options: Vec<CrimeTypeOption>,
    pub description: String,
    pub description_chars: usize,
    pub is_anonymous: bool,
    /// Absent while the report is anonymous.
    pub contact: Option<ContactFieldsView>,
    pub emergency_contact: String,
    pub is_critical: bool,
    pub field_errors: Vec<FieldErrorView>,
    pub evidence: StagingView,
    pub submit_error: Option<String>,
    pub submit_label: String,
    pub can_submit: bool,
}

#[must_use]
pub fn staging_view(stager: &EvidenceStager, editable: bool, t: &dyn Translate) -> StagingView {
    let limits = stager.limits();
    StagingView {
        files: stager
            .files()
            .iter()
            .map(|f| StagedFileView {
                id: f.id,
                name: f.name.clone(),
                size: format_bytes(f.size_bytes),
            })
            .collect(),
        count_label: t.translate_with(
            "fileUploader.uploadedFiles",
            &[("count", &stager.files().len().to_string())],
        ),
        total_size: format_bytes(stager.total_bytes()),
        max_size_label: t.translate_with(
            "fileUploader.maxSize",
            &[("size", &format_bytes(limits.max_file_bytes))],
        ),
        allowed_types_label: t.translate_with(
            "fileUploader.allowedTypes",
            &[("types", &limits.accepted_types.join(", "))],
        ),
        error: stager.error().map(|e| e.user_message(t)),
        can_add_more: editable && !stager.is_full(),
    }
}

#[must_use]
pub fn report_form_view(form: &ReportForm, t: &dyn Translate) -> ReportFormView {
    let fields = form.fields();

    let phase = match form.phase() {
        FormPhase::Editing => FormPhaseView::Editing,
        FormPhase::Submitting { step, .. } => FormPhaseView::Submitting { step: *step },
        FormPhase::Succeeded { report_id } => FormPhaseView::Succeeded {
            report_id: report_id.to_string(),
            title: t.translate("report.successTitle"),
            message: t.translate_with("report.successMessage", &[("reportId", report_id.as_str())]),
        },
    };

    let submit_label = if matches!(phase, FormPhaseView::Submitting { .. }) {
        t.translate("report.submitting")
    } else {
        t.translate("report.submit")
    };

    ReportFormView {
        phase,
        crime_type: fields.crime_type,
        crime_type_placeholder: t.translate("report.selectCrimeType"),
        crime_type_options: CrimeType::ALL
            .into_iter()
            .map(|value| CrimeTypeOption {
                value,
                label: t.translate(value.translation_key()),
            })
            .collect(),
        description: fields.description.clone(),
        description_chars: fields.description.chars().count(),
        is_anonymous: fields.is_anonymous,
        contact: (!fields.is_anonymous).then(|| ContactFieldsView {
            name: fields.contact_name.clone(),
            email: fields.contact_email.clone(),
            phone: fields.contact_phone.clone(),
        }),
        emergency_contact: fields.emergency_contact.clone(),
        is_critical: fields.is_critical,
        field_errors: field_errors(&form.errors(), t),
        evidence: staging_view(form.evidence(), form.is_editing(), t),
        submit_error: form.submit_error().map(|_| t.translate("report.submitError")),
        submit_label,
        can_submit: form.can_submit(),
    }
}
