//! Tests for the property manager

use crate::test_helpers::service_with;
use datareduce_rs::properties::{
    BoundedValidator, Direction, ListValidator, Property, PropertyManager, PropertyWithValue,
    WorkspaceProperty,
};
use datareduce_rs::{FrameworkError, Workspace2D};
use std::sync::Arc;

fn manager() -> PropertyManager {
    let service = service_with("raw", [1.0, 2.0, 3.0]);
    let mut manager = PropertyManager::new();
    manager
        .declare_property(WorkspaceProperty::<Workspace2D>::with_direction(
            "InputWorkspace",
            "",
            Direction::Input,
            Arc::clone(&service),
        ))
        .unwrap();
    manager
        .declare_property(
            PropertyWithValue::new("Factor", 1.0_f64, Direction::Input)
                .with_validator(BoundedValidator::new(Some(0.0), Some(10.0))),
        )
        .unwrap();
    manager
        .declare_property(
            PropertyWithValue::new("Mode", "Fast".to_string(), Direction::Input)
                .with_validator(ListValidator::new(["Fast", "Exact"])),
        )
        .unwrap();
    manager
}

#[test]
fn test_string_protocol() {
    let mut manager = manager();
    manager
        .set_properties("InputWorkspace=raw; Factor=2.5; Mode=Exact")
        .unwrap();

    assert_eq!(manager.get_property_value("inputworkspace").unwrap(), "raw");
    assert_eq!(manager.get_value::<f64>("Factor").unwrap(), 2.5);
    assert_eq!(manager.get_property_value("Mode").unwrap(), "Exact");
    assert!(manager.validate_properties().is_empty());
}

#[test]
fn test_one_invalid_property_fails_the_batch() {
    let mut manager = manager();
    manager.set_property_value("InputWorkspace", "raw").unwrap();
    manager.set_value("Factor", 20.0_f64).unwrap();

    assert_eq!(manager.validate_properties(), vec!["Factor".to_string()]);
}

#[test]
fn test_unresolved_input_is_reported_by_name() {
    let mut manager = manager();
    manager.set_property_value("InputWorkspace", "absent").unwrap();
    assert_eq!(manager.validate_properties(), vec!["InputWorkspace".to_string()]);
}

#[test]
fn test_declaration_errors() {
    let mut manager = manager();
    assert!(matches!(
        manager.declare_property(PropertyWithValue::new("FACTOR", 0.0_f64, Direction::Input)),
        Err(FrameworkError::DuplicateName(_))
    ));
    assert!(matches!(
        manager.set_property_value("Unknown", "1"),
        Err(FrameworkError::NotFound(_))
    ));
    assert!(matches!(
        manager.set_property_value("Factor", "abc"),
        Err(FrameworkError::InvalidProperty { .. })
    ));
    assert!(matches!(
        manager.get_value::<i64>("Factor"),
        Err(FrameworkError::TypeMismatch { .. })
    ));
}

#[test]
fn test_declaration_order_is_kept() {
    let manager = manager();
    let names: Vec<&str> = manager.properties().map(|p| p.name()).collect();
    assert_eq!(names, vec!["InputWorkspace", "Factor", "Mode"]);
}
