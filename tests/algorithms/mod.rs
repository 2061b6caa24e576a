//! Tests for algorithms and the algorithm manager

mod builtin_tests;
mod lifecycle_tests;
