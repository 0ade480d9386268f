#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use crux_core::testing::AppTester;
use crux_core::Request;
use std::collections::VecDeque;

use report_portal::backend::{execute, InMemoryBackend};
use report_portal::capabilities::{DelayOperation, PortalOperation};
use report_portal::model::{FixedClock, ReportId, ScriptedReportIds};
use report_portal::{App, Effect, Event, Model};

pub type Tester = AppTester<App, Effect>;

/// Model with a scripted id sequence and a frozen clock.
pub fn model_with_ids(ids: &[u32]) -> Model {
    let mut model = Model::default();
    model.ids = Box::new(ScriptedReportIds::new(
        ids.iter().map(|&n| ReportId::from_number(n).unwrap()),
    ));
    model.clock = Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()));
    model
}

pub fn portal_ops(effects: &[Effect]) -> Vec<&PortalOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Portal(request) => Some(&request.operation),
            _ => None,
        })
        .collect()
}

pub fn renders(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

/// Answers every portal request from `backend` and feeds the resulting
/// events back into the app until the queue is empty. Timers are handed
/// back unresolved so tests decide when they fire.
pub async fn drive(
    app: &Tester,
    model: &mut Model,
    backend: &InMemoryBackend,
    effects: Vec<Effect>,
) -> Vec<Request<DelayOperation>> {
    let mut queue: VecDeque<Effect> = effects.into();
    let mut timers = Vec::new();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Portal(mut request) => {
                let output = execute(backend, request.operation.clone()).await;
                let update = app
                    .resolve(&mut request, output)
                    .expect("portal request should resolve");
                queue.extend(update.effects);
                for event in update.events {
                    queue.extend(app.update(event, model).effects);
                }
            }
            Effect::Delay(request) => timers.push(request),
            Effect::Render(_) => {}
        }
    }

    timers
}

/// Sends one event and drives everything it causes.
pub async fn send(
    app: &Tester,
    model: &mut Model,
    backend: &InMemoryBackend,
    event: Event,
) -> Vec<Request<DelayOperation>> {
    let effects = app.update(event, model).effects;
    drive(app, model, backend, effects).await
}

/// Lets a timer fire and drives whatever the app does next.
pub async fn fire(
    app: &Tester,
    model: &mut Model,
    backend: &InMemoryBackend,
    mut timer: Request<DelayOperation>,
) -> Vec<Request<DelayOperation>> {
    let update = app.resolve(&mut timer, ()).expect("timer should resolve");
    let mut effects = update.effects;
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    drive(app, model, backend, effects).await
}
