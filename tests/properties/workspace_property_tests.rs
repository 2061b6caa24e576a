//! Tests for workspace properties bound to a data service

use crate::test_helpers::{service_with, spectrum};
use datareduce_rs::properties::{Direction, Property, WorkspaceProperty};
use datareduce_rs::{DataService, FrameworkError, TableWorkspace, Workspace2D};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn direction_codes_outside_0_to_2_are_rejected(code in any::<i32>()) {
        let service = Arc::new(DataService::new());
        let result = WorkspaceProperty::<Workspace2D>::new("Ws", "name", code, service);
        if (0..=2).contains(&code) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(FrameworkError::InvalidDirection(c)) if c == code));
        }
    }
}

#[test]
fn test_value_is_the_bound_name() {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let mut prop = WorkspaceProperty::<Workspace2D>::new("InputWorkspace", "raw", 0, service).unwrap();
    assert_eq!(prop.value(), "raw");
    assert_eq!(prop.direction(), Direction::Input);

    assert!(prop.set_value("").is_err());
    assert_eq!(prop.value(), "raw");
}

#[test]
fn test_input_resolves_and_caches() {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("InputWorkspace", "raw", 0, Arc::clone(&service)).unwrap();
    assert!(prop.workspace().is_none());
    assert!(prop.is_valid());

    let held = prop.workspace().unwrap();
    let stored = service.retrieve_as::<Workspace2D>("raw").unwrap();
    assert!(Arc::ptr_eq(&held, &stored));

    // Renaming drops the cached object.
    prop.set_value("missing").unwrap();
    assert!(prop.workspace().is_none());
    assert!(!prop.is_valid());
}

#[test]
fn test_wrong_kind_is_invalid_not_an_error() {
    let service = Arc::new(DataService::new());
    service.add("table", Arc::new(TableWorkspace::new(1))).unwrap();
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("InputWorkspace", "table", 2, service).unwrap();
    let message = prop.is_valid_message().unwrap();
    assert!(message.contains("table"));
}

#[test]
fn test_empty_name_is_invalid_for_every_direction() {
    for code in 0..3 {
        let mut prop =
            WorkspaceProperty::<Workspace2D>::new("Ws", "", code, Arc::new(DataService::new())).unwrap();
        assert!(!prop.is_valid());
    }
}

#[test]
fn test_held_object_skips_lookup() {
    let service = Arc::new(DataService::new());
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("InputWorkspace", "not_registered", 0, service).unwrap();
    prop.set_workspace(Arc::new(spectrum([0.0, 0.0, 0.0])));
    assert!(prop.is_valid());
}

#[test]
fn test_output_without_object_is_valid_until_stored() {
    let service = Arc::new(DataService::new());
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("OutputWorkspace", "out", 1, Arc::clone(&service)).unwrap();
    assert!(prop.is_valid());
    assert!(matches!(prop.store(), Err(FrameworkError::Runtime(_))));
    assert!(!service.does_exist("out"));
}

#[test]
fn test_input_store_never_touches_registry() {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("InputWorkspace", "other", 0, Arc::clone(&service)).unwrap();
    prop.set_workspace(Arc::new(spectrum([9.0, 9.0, 9.0])));

    assert!(!prop.store().unwrap());
    assert_eq!(service.names(), vec!["raw".to_string()]);
}

#[test]
fn test_output_and_inout_store_replace_entry() {
    for code in [1, 2] {
        let service = service_with("target", [1.0, 2.0, 3.0]);
        let mut prop =
            WorkspaceProperty::<Workspace2D>::new("Ws", "target", code, Arc::clone(&service)).unwrap();
        let produced = Arc::new(spectrum([4.0, 5.0, 6.0]));
        prop.set_workspace(Arc::clone(&produced));

        assert!(prop.store().unwrap());
        let stored = service.retrieve_as::<Workspace2D>("target").unwrap();
        assert!(Arc::ptr_eq(&stored, &produced));
    }
}

#[test]
fn test_clear_keeps_registry_entry() {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let mut prop =
        WorkspaceProperty::<Workspace2D>::new("Ws", "raw", 2, Arc::clone(&service)).unwrap();
    assert!(prop.is_valid());
    prop.clear();
    assert!(prop.workspace().is_none());
    assert!(service.does_exist("raw"));
}
