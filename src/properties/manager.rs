//! Ordered property collection owned by an algorithm.

use super::property_with_value::{PropertyValue, PropertyWithValue};
use super::workspace_property::WorkspaceProperty;
use super::Property;
use crate::error::{FrameworkError, Result};
use crate::workspace::Workspace;
use std::sync::Arc;
use tracing::warn;

/// Named properties in declaration order. Names are matched
/// case-insensitively.
#[derive(Default)]
pub struct PropertyManager {
    properties: Vec<Box<dyn Property>>,
}

impl PropertyManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(name))
    }

    fn not_found(name: &str) -> FrameworkError {
        FrameworkError::NotFound(format!("property '{}'", name))
    }

    /// Add a property. Fails with `DuplicateName` if one with the same name
    /// is already declared.
    pub fn declare_property<P: Property>(&mut self, property: P) -> Result<()> {
        self.declare_boxed(Box::new(property))
    }

    pub fn declare_boxed(&mut self, property: Box<dyn Property>) -> Result<()> {
        if property.name().is_empty() {
            return Err(FrameworkError::InvalidArgument(
                "property names must not be empty".to_string(),
            ));
        }
        if self.position(property.name()).is_some() {
            return Err(FrameworkError::DuplicateName(format!(
                "property '{}'",
                property.name()
            )));
        }
        self.properties.push(property);
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get_property(&self, name: &str) -> Result<&dyn Property> {
        let index = self.position(name).ok_or_else(|| Self::not_found(name))?;
        Ok(self.properties[index].as_ref())
    }

    pub fn get_property_mut(&mut self, name: &str) -> Result<&mut dyn Property> {
        let index = self.position(name).ok_or_else(|| Self::not_found(name))?;
        Ok(self.properties[index].as_mut())
    }

    /// Borrow a property as its concrete type.
    pub fn get_property_as<P: Property>(&self, name: &str) -> Result<&P> {
        self.get_property(name)?
            .as_any()
            .downcast_ref::<P>()
            .ok_or_else(|| FrameworkError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<P>().to_string(),
            })
    }

    pub fn get_property_as_mut<P: Property>(&mut self, name: &str) -> Result<&mut P> {
        self.get_property_mut(name)?
            .as_any_mut()
            .downcast_mut::<P>()
            .ok_or_else(|| FrameworkError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<P>().to_string(),
            })
    }

    pub fn set_property_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.get_property_mut(name)?.set_value(value)
    }

    pub fn get_property_value(&self, name: &str) -> Result<String> {
        Ok(self.get_property(name)?.value())
    }

    /// Set several properties from `Name=Value` pairs separated by `;`.
    ///
    /// A segment only starts a new assignment when the text before its
    /// first `=` names a declared property. Anything else belongs to the
    /// previous value, so a value may itself contain `;`, as composite
    /// function definitions do. Every name is resolved before any value is
    /// set.
    pub fn set_properties(&mut self, assignments: &str) -> Result<()> {
        let mut parsed: Vec<(String, String)> = Vec::new();
        for segment in assignments.split(';') {
            let starts_assignment = segment
                .split_once('=')
                .filter(|(name, _)| self.exists(name.trim()));
            match starts_assignment {
                Some((name, value)) => {
                    parsed.push((name.trim().to_string(), value.to_string()));
                }
                None => match parsed.last_mut() {
                    Some((_, value)) => {
                        value.push(';');
                        value.push_str(segment);
                    }
                    None if segment.trim().is_empty() => {}
                    None => return Err(Self::unknown_assignment(segment)),
                },
            }
        }

        for (name, value) in parsed {
            let value = value.trim().trim_end_matches(';').trim_end();
            self.set_property_value(&name, value)?;
        }
        Ok(())
    }

    fn unknown_assignment(segment: &str) -> FrameworkError {
        match segment.split_once('=') {
            Some((name, _)) => Self::not_found(name.trim()),
            None => FrameworkError::InvalidArgument(format!(
                "expected Name=Value, got '{}'",
                segment.trim()
            )),
        }
    }

    /// Typed value of a plain property.
    pub fn get_value<T: PropertyValue>(&self, name: &str) -> Result<T> {
        Ok(self.get_property_as::<PropertyWithValue<T>>(name)?.get().clone())
    }

    pub fn set_value<T: PropertyValue>(&mut self, name: &str, value: T) -> Result<()> {
        self.get_property_as_mut::<PropertyWithValue<T>>(name)?.set(value);
        Ok(())
    }

    /// The workspace held by a workspace property.
    pub fn get_workspace<T: Workspace>(&self, name: &str) -> Result<Arc<T>> {
        self.get_property_as::<WorkspaceProperty<T>>(name)?
            .workspace()
            .ok_or_else(|| {
                FrameworkError::Runtime(format!("property '{}' holds no workspace", name))
            })
    }

    pub fn set_workspace<T: Workspace>(&mut self, name: &str, workspace: Arc<T>) -> Result<()> {
        self.get_property_as_mut::<WorkspaceProperty<T>>(name)?
            .set_workspace(workspace);
        Ok(())
    }

    /// Validate every property, logging each failure.
    ///
    /// Returns the names of the invalid properties; an empty list means the
    /// whole set is valid.
    pub fn validate_properties(&mut self) -> Vec<String> {
        let mut invalid = Vec::new();
        for property in self.properties.iter_mut() {
            if let Some(message) = property.is_valid_message() {
                warn!(property = property.name(), %message, "invalid property");
                invalid.push(property.name().to_string());
            }
        }
        invalid
    }

    pub fn properties(&self) -> impl Iterator<Item = &dyn Property> {
        self.properties.iter().map(|p| p.as_ref())
    }

    pub fn properties_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Property>> {
        self.properties.iter_mut()
    }
}
