//! Tests for the workspace registry

mod registry_tests;
