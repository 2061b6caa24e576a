//! Plain-valued properties.

use super::validators::Validator;
use super::{Direction, Property};
use crate::error::{FrameworkError, Result};
use std::any::Any;

/// A type that can be held by a [`PropertyWithValue`] and converted to and
/// from the property string protocol.
pub trait PropertyValue: Clone + PartialEq + Send + Sync + 'static {
    fn to_property_string(&self) -> String;
    fn from_property_string(text: &str) -> std::result::Result<Self, String>;
    fn type_name() -> &'static str;
}

macro_rules! scalar_property_value {
    ($ty:ty, $name:expr) => {
        impl PropertyValue for $ty {
            fn to_property_string(&self) -> String {
                self.to_string()
            }

            fn from_property_string(text: &str) -> std::result::Result<Self, String> {
                text.trim()
                    .parse::<$ty>()
                    .map_err(|e| format!("cannot convert '{}' to {}: {}", text, $name, e))
            }

            fn type_name() -> &'static str {
                $name
            }
        }
    };
}

scalar_property_value!(f64, "number");
scalar_property_value!(i64, "integer");
scalar_property_value!(usize, "unsigned int");

impl PropertyValue for bool {
    fn to_property_string(&self) -> String {
        let text = if *self { "1" } else { "0" };
        text.to_string()
    }

    fn from_property_string(text: &str) -> std::result::Result<Self, String> {
        match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(format!("cannot convert '{}' to boolean", text)),
        }
    }

    fn type_name() -> &'static str {
        "boolean"
    }
}

impl PropertyValue for String {
    fn to_property_string(&self) -> String {
        self.clone()
    }

    fn from_property_string(text: &str) -> std::result::Result<Self, String> {
        Ok(text.to_string())
    }

    fn type_name() -> &'static str {
        "string"
    }
}

/// Comma-separated list of numbers.
impl PropertyValue for Vec<f64> {
    fn to_property_string(&self) -> String {
        self.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn from_property_string(text: &str) -> std::result::Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        text.split(',')
            .map(|item| {
                item.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("cannot convert '{}' to number: {}", item, e))
            })
            .collect()
    }

    fn type_name() -> &'static str {
        "dbl list"
    }
}

/// A named property holding a value of type `T`.
pub struct PropertyWithValue<T: PropertyValue> {
    name: String,
    value: T,
    initial: T,
    direction: Direction,
    documentation: String,
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: PropertyValue> PropertyWithValue<T> {
    pub fn new(name: &str, value: T, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            initial: value.clone(),
            value,
            direction,
            documentation: String::new(),
            validators: Vec::new(),
        }
    }

    /// Attach a validator.
    pub fn with_validator<V: Validator<T> + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn with_documentation(mut self, doc: &str) -> Self {
        self.documentation = doc.to_string();
        self
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Set the typed value. Validators are not applied here; they run as
    /// part of the validation pass before execution.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: PropertyValue> Property for PropertyWithValue<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn value(&self) -> String {
        self.value.to_property_string()
    }

    fn set_value(&mut self, value: &str) -> Result<()> {
        self.value = T::from_property_string(value).map_err(|message| {
            FrameworkError::InvalidProperty {
                name: self.name.clone(),
                message,
            }
        })?;
        Ok(())
    }

    fn is_valid_message(&mut self) -> Option<String> {
        self.validators.iter().find_map(|v| v.check(&self.value))
    }

    fn is_default(&self) -> bool {
        self.value == self.initial
    }

    fn documentation(&self) -> &str {
        &self.documentation
    }

    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
