//! Command interpreter and history behavior through the public session API.
use std::time::{Duration, Instant};

use chromic::{
    CommandError, ConfigValue, EffectKind, ModifierElement, ModifierId, ModifierStack, Session,
    SessionConfig,
};

const WINDOW: Duration = Duration::from_millis(300);

fn names(stack: &ModifierStack) -> Vec<String> {
    stack.iter().map(|element| element.name.clone()).collect()
}

fn ids(stack: &ModifierStack) -> Vec<ModifierId> {
    stack.iter().map(|element| element.id.clone()).collect()
}

#[test]
fn add_appends_a_default_element_with_a_fresh_id() {
    let mut session = Session::default();
    session.run("add Sepia").unwrap();
    session.run("add Sepia").unwrap();

    let stack = session.stack();
    assert_eq!(names(stack), ["Sepia", "Sepia"]);
    assert_eq!(stack.elements()[0].config.len(), 1);
    assert_eq!(stack.elements()[0].config["amount"], ConfigValue::Scalar(0.0));
    assert_ne!(stack.elements()[0].id, stack.elements()[1].id);
}

#[test]
fn every_catalog_name_can_be_added() {
    let mut session = Session::default();
    for kind in EffectKind::CATALOG {
        session.run(&format!("add {}", kind.display_name())).unwrap();
    }
    assert_eq!(session.stack().len(), EffectKind::CATALOG.len());
}

#[test]
fn delete_removes_exactly_the_matching_elements() {
    let shared = ModifierElement {
        id: ModifierId::from("shared"),
        ..ModifierElement::new(EffectKind::Noise)
    };
    let stack = ModifierStack::from_elements(vec![
        shared.clone(),
        ModifierElement::new(EffectKind::Sepia),
        shared,
        ModifierElement::new(EffectKind::Vignette),
    ]);
    let payload = serde_json::to_string(&stack).unwrap();

    let mut session = Session::default();
    session.run(&format!("replace {payload}")).unwrap();
    let kept: Vec<_> = ids(session.stack())
        .into_iter()
        .filter(|id| id.as_str() != "shared")
        .collect();

    session.run("delete shared").unwrap();
    assert_eq!(session.stack().len(), 2);
    assert_eq!(ids(session.stack()), kept);

    session.run("delete missing").unwrap();
    assert_eq!(session.stack().len(), 2);
}

#[test]
fn update_validates_the_key_before_writing() {
    let mut session = Session::default();
    session.run("add Sepia").unwrap();
    let id = session.stack().elements()[0].id.clone();

    session.run(&format!("update {id} amount 0.5")).unwrap();
    let error = session.run(&format!("update {id} bogus 0.5")).unwrap_err();
    assert!(matches!(error, CommandError::UnknownProperty { ref key, .. } if key == "bogus"));

    let config = &session.stack().elements()[0].config;
    assert_eq!(config.len(), 1);
    assert_eq!(config["amount"], ConfigValue::Scalar(0.5));

    assert!(matches!(
        session.run("update nobody amount 0.5"),
        Err(CommandError::UnknownElement(_))
    ));
}

#[test]
fn switch_is_self_inverse_and_bounds_checked() {
    let mut session = Session::default();
    for name in ["Sepia", "Noise", "Vignette"] {
        session.run(&format!("add {name}")).unwrap();
    }

    session.run("switch 0 2").unwrap();
    assert_eq!(names(session.stack()), ["Vignette", "Noise", "Sepia"]);
    session.run("switch 0 2").unwrap();
    assert_eq!(names(session.stack()), ["Sepia", "Noise", "Vignette"]);

    assert!(matches!(
        session.run("switch 0 3"),
        Err(CommandError::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert_eq!(names(session.stack()), ["Sepia", "Noise", "Vignette"]);
}

#[test]
fn burst_of_edits_collapses_into_one_entry() {
    let start = Instant::now();
    let mut session = Session::default();
    session.run_at("add Sepia", start).unwrap();
    session.poll_at(start + WINDOW);
    assert_eq!(session.history().len(), 1);

    session.run_at("add Noise", start + 2 * WINDOW).unwrap();
    let before_second = session.stack().clone();
    session
        .run_at("add Vignette", start + 2 * WINDOW + Duration::from_millis(50))
        .unwrap();
    session.poll_at(start + 4 * WINDOW);

    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history().current(), Some(&before_second));
}

#[test]
fn undo_and_redo_round_trip() {
    let start = Instant::now();
    let mut session = Session::default();
    session.run_at("add Sepia", start).unwrap();
    session.run_at("add Noise", start + 2 * WINDOW).unwrap();
    session.run_at("add Vignette", start + 4 * WINDOW).unwrap();

    let at = start + 6 * WINDOW;
    session.run_at("undo", at).unwrap();
    let after_undo = session.stack().clone();
    session.run_at("redo", at).unwrap();
    session.run_at("undo", at).unwrap();
    assert_eq!(session.stack(), &after_undo);
}

#[test]
fn undo_and_redo_at_the_ends_are_no_ops() {
    let mut session = Session::default();
    session.run("undo").unwrap();
    session.run("redo").unwrap();
    assert!(session.stack().is_empty());
    assert!(session.history().is_empty());
}

#[test]
fn undo_with_one_committed_entry_keeps_the_stack() {
    let start = Instant::now();
    let mut session = Session::default();
    session.run_at("add Sepia", start).unwrap();
    session.poll_at(start + WINDOW);
    assert_eq!(session.history().len(), 1);

    session.run_at("undo", start + WINDOW).unwrap();
    assert_eq!(names(session.stack()), ["Sepia"]);
    assert_eq!(session.history().len(), 1);
    assert!(!session.history().can_undo());
}

#[test]
fn history_never_exceeds_its_capacity() {
    let start = Instant::now();
    let mut session = Session::new(SessionConfig::default().with_history_capacity(5));
    for step in 0..40u32 {
        session
            .run_at("add Noise", start + WINDOW * (2 * step))
            .unwrap();
        assert!(session.history().len() <= 5);
    }
}

#[test]
fn malformed_commands_leave_the_stack_alone() {
    let mut session = Session::default();
    session.run("add Sepia").unwrap();
    let before = session.stack().clone();

    for line in ["", "teleport", "add", "add Blur Everything", "switch x 1", "replace [oops"] {
        assert!(session.run(line).is_err(), "{line:?} should fail");
    }
    assert_eq!(session.stack(), &before);
}
