mod common;

use common::{engine, id, raw_node, team_data};
use graphedit_core::StyleObject;
use graphedit_events::{Action, ActionEnvelope, DispatchOutcome};
use graphedit_graph::{Engine, EngineError, EngineSettings, GraphDocument};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[test]
fn actions_before_initialization_replay_in_order() -> anyhow::Result<()> {
    let mut engine = engine();
    assert!(!engine.is_ready());

    let queued = engine.dispatch(Action::AddNode {
        element: raw_node("late", &[]),
    })?;
    assert!(queued.is_none());
    engine.dispatch(Action::ChangeNode {
        id: id("late"),
        changes: graphedit_events::ElementChanges {
            label: Some("Renamed".to_string()),
            ..Default::default()
        },
    })?;
    assert_eq!(engine.pending_actions(), 2);
    assert_eq!(engine.host().batches_started, 0);

    engine.initialize_from_data(team_data())?;
    assert!(engine.is_ready());
    assert_eq!(engine.pending_actions(), 0);
    let late = engine.document().get(&id("late")).expect("replayed add");
    assert_eq!(late.display_label, "Renamed");
    assert_eq!(engine.host().batches_started, 2);
    Ok(())
}

#[test]
fn queue_overflow_discards_and_refuses_the_document() {
    let settings = EngineSettings {
        max_pending_actions: 2,
        ..Default::default()
    };
    let mut engine = Engine::new(common::RecordingHost::default(), settings);
    for _ in 0..3 {
        engine.dispatch(Action::Refresh).unwrap();
    }

    let err = engine.initialize(GraphDocument::new()).unwrap_err();
    assert_eq!(
        err,
        EngineError::QueueOverflow {
            pending: 3,
            limit: 2
        }
    );
    assert!(!engine.is_ready());
    assert_eq!(engine.pending_actions(), 0);

    assert_eq!(engine.initialize(GraphDocument::new()).unwrap(), 0);
    assert!(engine.is_ready());
}

#[test]
fn callbacks_receive_the_outcome() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.initialize_from_data(team_data())?;

    let seen: Arc<Mutex<Vec<DispatchOutcome>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let envelope = ActionEnvelope::new(Action::AddNode {
        element: raw_node("dave", &[]),
    })
    .with_callback(move |outcome| sink.lock().unwrap().push(outcome.clone()));
    let correlation_id = envelope.correlation_id.clone();
    engine.dispatch(envelope)?;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].action, "AddNode");
    assert_eq!(seen[0].correlation_id, correlation_id);
    assert_eq!(seen[0].created, vec![id("dave")]);
    Ok(())
}

#[test]
fn missing_ids_are_generated_and_duplicates_fail() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.initialize_from_data(team_data())?;

    let mut anonymous = raw_node("x", &[]);
    anonymous.id = None;
    let outcome = engine
        .dispatch(Action::AddNode { element: anonymous })?
        .expect("engine is ready");
    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.created[0].as_str().len(), 36);

    let err = engine
        .dispatch(Action::AddNode {
            element: raw_node("carol", &[]),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Document(_)));
    Ok(())
}

#[test]
fn read_only_actions_leave_the_document_clean() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.initialize_from_data(team_data())?;
    assert!(!engine.has_unsaved_changes());

    engine.dispatch(Action::Zoom { level: 1.5 })?;
    engine.dispatch(Action::Center {
        ids: vec![id("carol")],
    })?;
    engine.dispatch(Action::Refresh)?;
    assert!(!engine.has_unsaved_changes());
    assert_eq!(engine.host().zooms, vec![1.5]);
    assert_eq!(engine.host().centered, vec![vec![id("carol")]]);
    assert_eq!(engine.host().refreshes, 1);

    engine.dispatch(Action::Hide {
        ids: vec![id("carol")],
    })?;
    assert!(engine.has_unsaved_changes());
    engine.mark_saved();
    assert!(!engine.snapshot().unsaved_changes);
    Ok(())
}

#[test]
fn identical_styles_share_one_rule() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.initialize_from_data(team_data())?;
    let pushes = engine.host().stylesheets.len();

    let style: StyleObject = [("background-color".to_string(), json!("#ff0000"))]
        .into_iter()
        .collect();
    engine.dispatch(Action::ChangeNodeStyle {
        ids: vec![id("carol")],
        style: style.clone(),
        apply_to_type: false,
    })?;
    engine.dispatch(Action::ChangeNodeStyle {
        ids: vec![id("bob")],
        style,
        apply_to_type: false,
    })?;

    let sheet = engine.stylesheet();
    assert_eq!(sheet.len(), 1);
    let selector = &sheet[0].selector;
    assert!(selector.starts_with("user-style-"));
    for name in ["carol", "bob"] {
        assert!(engine.document().get(&id(name)).unwrap().has_class(selector));
    }
    assert_eq!(engine.host().stylesheets.len(), pushes + 1);
    Ok(())
}

#[test]
fn every_dispatch_runs_in_one_batch() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.initialize_from_data(team_data())?;
    engine.dispatch(Action::SelectAll)?;
    engine.dispatch(Action::DeleteNodes {
        ids: vec![id("nobody")],
    })?;
    let host = engine.host();
    assert_eq!(host.batches_started, 2);
    assert_eq!(host.batches_ended, 2);
    Ok(())
}

#[test]
fn host_layout_wins_over_the_builtin_one() -> anyhow::Result<()> {
    let mut engine = engine();
    engine.host_mut().runs_layout = true;
    engine.initialize_from_data(team_data())?;
    engine.dispatch(Action::Layout {
        algorithm: graphedit_events::LayoutAlgorithm::Hierarchical,
    })?;
    let carol = engine.document().get(&id("carol")).unwrap();
    assert_eq!(carol.position.x, 0.0);
    assert_eq!(carol.position.y, 20.0);
    assert_eq!(engine.host().layouts.len(), 1);
    Ok(())
}
