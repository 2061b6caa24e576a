//! # Property System
//!
//! Algorithms describe their parameters as named properties. Every property
//! converts to and from a string (used by scripting and GUI layers) and can
//! report whether its current value is valid. Two families exist:
//!
//! - [`PropertyWithValue`]: a plain value (`f64`, `i64`, `bool`, `String`,
//!   number lists) with optional [`Validator`]s
//! - [`WorkspaceProperty`]: a handle into the [`DataService`](crate::data_service::DataService)
//!   whose string value is the workspace name
//!
//! A [`PropertyManager`] owns an algorithm's properties in declaration order.

mod direction;
mod manager;
mod property_with_value;
mod validators;
mod workspace_property;

use crate::error::Result;
use std::any::Any;

pub use direction::Direction;
pub use manager::PropertyManager;
pub use property_with_value::{PropertyValue, PropertyWithValue};
pub use validators::{BoundedValidator, ListValidator, MandatoryValidator, Validator};
pub use workspace_property::WorkspaceProperty;

/// Common interface of all declared properties.
pub trait Property: Any + Send {
    fn name(&self) -> &str;

    fn direction(&self) -> Direction;

    /// The value in the string protocol.
    fn value(&self) -> String;

    /// Set the value from the string protocol.
    fn set_value(&mut self, value: &str) -> Result<()>;

    /// `None` when valid, otherwise the reason the value is rejected.
    ///
    /// Takes `&mut self` so that implementations can cache what they resolved.
    fn is_valid_message(&mut self) -> Option<String>;

    fn is_valid(&mut self) -> bool {
        self.is_valid_message().is_none()
    }

    /// Whether the value is still the one given at declaration.
    fn is_default(&self) -> bool;

    fn documentation(&self) -> &str;

    /// Human readable type, e.g. `"number"`.
    fn type_name(&self) -> &'static str;

    /// Commit a held output to wherever it lives. Returns `false` when the
    /// property has nothing to commit.
    fn store(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn is_workspace_property(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
