//! Tests for composite functions and the function factory

mod factory_tests;
