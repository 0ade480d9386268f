mod common;

use crux_core::testing::AppTester;

use common::{drive, fire, model_with_ids, portal_ops, renders, send, Tester};
use report_portal::backend::{InMemoryBackend, PortalBackend};
use report_portal::capabilities::{PortalError, PortalOperation, PortalOutput};
use report_portal::config::PortalConfig;
use report_portal::form::{FormField, FormPhase, SubmitStep};
use report_portal::model::{CrimeType, ReportId, ReportStatus, Route};
use report_portal::staging::{FileCandidate, StagingError};
use report_portal::tracker::TrackerView;
use report_portal::view::FormPhaseView;
use report_portal::{Effect, Event, Model, Screen};

fn fill_report(app: &Tester, model: &mut Model) {
    app.update(Event::Navigate { route: Route::Report }, model);
    app.update(
        Event::CrimeTypeSelected {
            crime_type: Some(CrimeType::Phishing),
        },
        model,
    );
    app.update(
        Event::DescriptionChanged {
            text: "Email asking for my net banking password".into(),
        },
        model,
    );
    app.update(
        Event::ContactNameChanged {
            value: "Asha Verma".into(),
        },
        model,
    );
    app.update(
        Event::ContactEmailChanged {
            value: "asha@example.in".into(),
        },
        model,
    );
}

fn screenshot(name: &str) -> FileCandidate {
    FileCandidate {
        name: name.into(),
        size_bytes: 2048,
        uri: format!("file:///tmp/{name}"),
    }
}

#[tokio::test]
async fn report_with_evidence_is_submitted_and_tracked() {
    let app = AppTester::<report_portal::App, Effect>::default();
    let backend = InMemoryBackend::new();
    let mut model = model_with_ids(&[654_321]);

    // 1. Fill the form and stage one screenshot
    fill_report(&app, &mut model);
    let update = app.update(
        Event::EvidenceSelected {
            files: vec![screenshot("mail.png")],
        },
        &mut model,
    );
    assert!(renders(&update.effects));
    assert_eq!(model.report_form.evidence().files().len(), 1);

    // 2. Submit: evidence goes first
    let update = app.update(Event::SubmitReportRequested, &mut model);
    assert!(matches!(
        portal_ops(&update.effects)[..],
        [PortalOperation::UploadEvidence { .. }]
    ));
    assert!(matches!(
        model.report_form.phase(),
        FormPhase::Submitting {
            step: SubmitStep::UploadingEvidence,
            ..
        }
    ));

    // 3. Upload and report go through, then the success timer starts
    let mut timers = drive(&app, &mut model, &backend, update.effects).await;
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].operation.millis, 2000);

    let report_id = ReportId::from_number(654_321).unwrap();
    assert!(matches!(
        model.report_form.phase(),
        FormPhase::Succeeded { report_id: id } if *id == report_id
    ));
    match app.view(&model).screen {
        Screen::Report(form) => assert!(matches!(
            form.phase,
            FormPhaseView::Succeeded { report_id: ref id, .. } if id == "CR-654321"
        )),
        _ => panic!("expected the report screen"),
    }

    let stored = backend.fetch_report(&report_id).await.unwrap().unwrap();
    assert_eq!(stored.evidence_files, vec!["memory://evidence/1/mail.png"]);

    // 4. After the delay the tracker opens on the new report
    let timer = timers.remove(0);
    let more = fire(&app, &mut model, &backend, timer).await;
    assert!(more.is_empty());
    assert_eq!(
        model.route,
        Route::Track {
            report_id: Some(report_id)
        }
    );
    assert!(model.report_form.is_editing());
    assert!(model.report_form.fields().description.is_empty());

    match app.view(&model).screen {
        Screen::Track(TrackerView::Loaded(report)) => {
            assert_eq!(report.report_id, "CR-654321");
            assert_eq!(report.status.status, ReportStatus::UnderReview);
            assert_eq!(report.status.label, "Under Review");
            assert_eq!(report.timeline.len(), 1);
            assert_eq!(report.timeline[0].description, "Report submitted");
        }
        _ => panic!("expected a loaded tracker"),
    }
}

#[tokio::test]
async fn taken_id_is_replaced_and_resent() {
    let app = Tester::default();
    let backend = InMemoryBackend::with_fixtures();
    let mut model = model_with_ids(&[123_456, 222_222]);

    fill_report(&app, &mut model);
    let update = app.update(Event::SubmitReportRequested, &mut model);
    assert!(matches!(
        portal_ops(&update.effects)[..],
        [PortalOperation::SubmitReport(report)] if report.report_id.as_str() == "CR-123456"
    ));

    let timers = drive(&app, &mut model, &backend, update.effects).await;
    assert_eq!(timers.len(), 1);

    let accepted = ReportId::from_number(222_222).unwrap();
    assert!(matches!(
        model.report_form.phase(),
        FormPhase::Succeeded { report_id } if *report_id == accepted
    ));
    assert!(backend.contains(&accepted).await);
}

#[tokio::test]
async fn conflicts_stop_after_three_attempts() {
    let app = Tester::default();
    let backend = InMemoryBackend::with_fixtures();
    let mut model = model_with_ids(&[123_456, 789_012, 345_678, 111_111]);

    fill_report(&app, &mut model);
    let timers = send(&app, &mut model, &backend, Event::SubmitReportRequested).await;

    assert!(timers.is_empty());
    assert!(model.report_form.is_editing());
    assert!(matches!(
        model.report_form.submit_error(),
        Some(PortalError::Conflict { .. })
    ));
    assert!(!backend
        .contains(&ReportId::from_number(111_111).unwrap())
        .await);

    match app.view(&model).screen {
        Screen::Report(form) => {
            assert!(form.submit_error.is_some());
            assert!(form.can_submit);
        }
        _ => panic!("expected the report screen"),
    }

    app.update(Event::SubmissionErrorDismissed, &mut model);
    assert!(model.report_form.submit_error().is_none());
}

#[test]
fn invalid_form_never_reaches_the_portal() {
    let app = Tester::default();
    let mut model = model_with_ids(&[500_000]);

    app.update(Event::Navigate { route: Route::Report }, &mut model);
    app.update(
        Event::DescriptionChanged {
            text: "too short".into(),
        },
        &mut model,
    );
    let update = app.update(Event::SubmitReportRequested, &mut model);

    assert!(portal_ops(&update.effects).is_empty());
    assert!(renders(&update.effects));
    assert!(model.report_form.is_editing());

    match app.view(&model).screen {
        Screen::Report(form) => {
            let fields: Vec<_> = form.field_errors.iter().map(|e| e.field).collect();
            assert!(fields.contains(&FormField::CrimeType));
            assert!(fields.contains(&FormField::Description));
        }
        _ => panic!("expected the report screen"),
    }
}

#[test]
fn second_submit_while_busy_is_ignored() {
    let app = Tester::default();
    let mut model = model_with_ids(&[500_001, 500_002]);

    fill_report(&app, &mut model);
    let first = app.update(Event::SubmitReportRequested, &mut model);
    let second = app.update(Event::SubmitReportRequested, &mut model);

    assert_eq!(portal_ops(&first.effects).len(), 1);
    assert!(portal_ops(&second.effects).is_empty());
}

#[test]
fn late_answer_for_an_abandoned_form_is_dropped() {
    let app = Tester::default();
    let mut model = model_with_ids(&[500_003]);

    fill_report(&app, &mut model);
    let update = app.update(Event::SubmitReportRequested, &mut model);
    let mut request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Portal(request) => Some(request),
            _ => None,
        })
        .expect("submit request");

    // Leaving the page remounts the form with a new session
    app.update(Event::Navigate { route: Route::Home }, &mut model);

    let answered = app
        .resolve(
            &mut request,
            Ok(PortalOutput::ReportAccepted {
                report_id: ReportId::from_number(500_003).unwrap(),
            }),
        )
        .expect("resolves");
    for event in answered.events {
        let update = app.update(event, &mut model);
        assert!(!update
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Delay(_))));
    }

    assert!(model.report_form.is_editing());
    assert_eq!(model.route, Route::Home);
}

#[test]
fn searching_a_report_id_also_closes_the_form() {
    let app = Tester::default();
    let mut model = model_with_ids(&[500_777]);

    fill_report(&app, &mut model);
    let update = app.update(Event::SubmitReportRequested, &mut model);
    let mut request = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Portal(request) => Some(request),
            _ => None,
        })
        .expect("submit request");

    app.update(
        Event::TrackReportRequested {
            query: "CR-123456".into(),
        },
        &mut model,
    );
    assert!(model.report_form.is_editing());

    let answered = app
        .resolve(
            &mut request,
            Ok(PortalOutput::ReportAccepted {
                report_id: ReportId::from_number(500_777).unwrap(),
            }),
        )
        .expect("resolves");
    for event in answered.events {
        let update = app.update(event, &mut model);
        assert!(!update
            .effects
            .iter()
            .any(|e| matches!(e, Effect::Delay(_))));
    }

    app.update(Event::Navigate { route: Route::Home }, &mut model);
    app.update(Event::Navigate { route: Route::Report }, &mut model);
    assert!(model.report_form.is_editing());
    assert!(model.report_form.fields().description.is_empty());
}

#[tokio::test]
async fn leaving_before_the_delay_keeps_the_user_where_they_are() {
    let app = Tester::default();
    let backend = InMemoryBackend::new();
    let mut model = model_with_ids(&[500_004]);

    fill_report(&app, &mut model);
    let mut timers = send(&app, &mut model, &backend, Event::SubmitReportRequested).await;
    assert_eq!(timers.len(), 1);

    app.update(Event::Navigate { route: Route::Feedback }, &mut model);
    fire(&app, &mut model, &backend, timers.remove(0)).await;

    assert_eq!(model.route, Route::Feedback);
}

#[tokio::test]
async fn failed_upload_returns_the_form_for_another_try() {
    let app = Tester::default();
    let backend = InMemoryBackend::new();
    backend
        .fail_next(
            "upload_evidence",
            PortalError::Network {
                message: "connection reset".into(),
            },
        )
        .await;
    let mut model = model_with_ids(&[600_001, 600_002]);

    fill_report(&app, &mut model);
    app.update(
        Event::EvidenceSelected {
            files: vec![screenshot("chat.jpg")],
        },
        &mut model,
    );

    let timers = send(&app, &mut model, &backend, Event::SubmitReportRequested).await;
    assert!(timers.is_empty());
    assert!(matches!(
        model.report_form.submit_error(),
        Some(PortalError::Network { .. })
    ));
    assert_eq!(model.report_form.evidence().files().len(), 1);

    // The retry draws a fresh id and succeeds
    let timers = send(&app, &mut model, &backend, Event::SubmitReportRequested).await;
    assert_eq!(timers.len(), 1);
    assert!(backend
        .contains(&ReportId::from_number(600_002).unwrap())
        .await);
}

#[tokio::test]
async fn anonymous_report_carries_no_contact_details() {
    let app = Tester::default();
    let backend = InMemoryBackend::new();
    let mut model = model_with_ids(&[700_001]);

    fill_report(&app, &mut model);
    app.update(Event::AnonymousToggled { is_anonymous: true }, &mut model);
    app.update(Event::CriticalToggled { is_critical: true }, &mut model);

    match app.view(&model).screen {
        Screen::Report(form) => assert!(form.contact.is_none()),
        _ => panic!("expected the report screen"),
    }

    let update = app.update(Event::SubmitReportRequested, &mut model);
    match portal_ops(&update.effects)[..] {
        [PortalOperation::SubmitReport(report)] => {
            assert!(report.is_anonymous);
            assert!(!report.has_contact_details());
            assert!(report.is_critical);
        }
        _ => panic!("expected a single submit request"),
    }
    drive(&app, &mut model, &backend, update.effects).await;

    let escalations = backend.list_escalated_reports().await.unwrap();
    assert_eq!(escalations.len(), 1);
    let all = backend.list_all_reports().await.unwrap();
    assert!(all[0].is_anonymous);
    assert!(all[0].contact_name.is_none());
}

#[test]
fn configuration_tightens_staging_limits() {
    let app = Tester::default();
    let mut model = model_with_ids(&[]);

    let config = PortalConfig {
        max_files: 1,
        ..PortalConfig::default()
    };
    app.update(Event::Configure(Box::new(config)), &mut model);
    assert_eq!(model.config.max_files, 1);

    app.update(Event::Navigate { route: Route::Report }, &mut model);
    app.update(
        Event::EvidenceSelected {
            files: vec![screenshot("one.png"), screenshot("two.png")],
        },
        &mut model,
    );
    assert!(model.report_form.evidence().files().is_empty());
    assert!(matches!(
        model.report_form.evidence().error(),
        Some(StagingError::TooManyFiles { max: 1, .. })
    ));
}

#[test]
fn tighter_limits_never_strand_staged_files() {
    let app = Tester::default();
    let mut model = model_with_ids(&[]);

    app.update(Event::Navigate { route: Route::Report }, &mut model);
    app.update(
        Event::EvidenceSelected {
            files: vec![screenshot("one.png"), screenshot("two.png"), screenshot("three.png")],
        },
        &mut model,
    );

    let config = PortalConfig {
        max_files: 1,
        ..PortalConfig::default()
    };
    app.update(Event::Configure(Box::new(config)), &mut model);

    // The open form keeps limits its files satisfy
    assert_eq!(model.config.max_files, 1);
    let evidence = model.report_form.evidence();
    assert_eq!(evidence.files().len(), 3);
    assert!(evidence.files().len() <= evidence.limits().max_files);

    app.update(Event::Navigate { route: Route::Home }, &mut model);
    app.update(Event::Navigate { route: Route::Report }, &mut model);
    assert_eq!(model.report_form.evidence().limits().max_files, 1);
    assert!(model.report_form.evidence().files().is_empty());
}

#[test]
fn invalid_configuration_is_refused() {
    let app = Tester::default();
    let mut model = model_with_ids(&[]);

    let config = PortalConfig {
        max_files: 0,
        ..PortalConfig::default()
    };
    app.update(Event::Configure(Box::new(config)), &mut model);

    assert_eq!(model.config, PortalConfig::default());
    let error = app.view(&model).error.expect("banner");
    assert_eq!(error.error_code, "CONFIG_ERROR");
    assert!(!error.is_retryable);

    app.update(Event::ErrorDismissed, &mut model);
    assert!(app.view(&model).error.is_none());
}

#[test]
fn identified_reports_need_contact_when_configured() {
    let app = Tester::default();
    let mut model = model_with_ids(&[700_002]);

    let config = PortalConfig {
        require_contact_when_identified: true,
        ..PortalConfig::default()
    };
    app.update(Event::Configure(Box::new(config)), &mut model);
    app.update(Event::Navigate { route: Route::Report }, &mut model);
    app.update(
        Event::CrimeTypeSelected {
            crime_type: Some(CrimeType::Hacking),
        },
        &mut model,
    );
    app.update(
        Event::DescriptionChanged {
            text: "Someone logged into my mail from abroad".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitReportRequested, &mut model);
    assert!(portal_ops(&update.effects).is_empty());

    // Going anonymous lifts the requirement
    app.update(Event::AnonymousToggled { is_anonymous: true }, &mut model);
    let update = app.update(Event::SubmitReportRequested, &mut model);
    assert_eq!(portal_ops(&update.effects).len(), 1);
}
