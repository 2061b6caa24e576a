//! Tests for the property system

mod manager_tests;
mod workspace_property_tests;
