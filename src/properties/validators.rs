//! Value validators for plain properties.

use std::fmt::Display;

/// Checks a property value; `Some(message)` means the value is invalid.
pub trait Validator<T>: Send + Sync {
    fn check(&self, value: &T) -> Option<String>;
}

/// Inclusive lower and/or upper bound.
#[derive(Debug, Clone)]
pub struct BoundedValidator<T> {
    lower: Option<T>,
    upper: Option<T>,
}

impl<T> BoundedValidator<T> {
    pub fn new(lower: Option<T>, upper: Option<T>) -> Self {
        Self { lower, upper }
    }

    pub fn lower(lower: T) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn upper(upper: T) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }
}

impl<T: PartialOrd + Display + Send + Sync> Validator<T> for BoundedValidator<T> {
    fn check(&self, value: &T) -> Option<String> {
        if let Some(lower) = &self.lower {
            if value < lower {
                return Some(format!("Selected value {} is < the lower bound ({})", value, lower));
            }
        }
        if let Some(upper) = &self.upper {
            if value > upper {
                return Some(format!("Selected value {} is > the upper bound ({})", value, upper));
            }
        }
        None
    }
}

/// Rejects empty strings and empty lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct MandatoryValidator;

impl Validator<String> for MandatoryValidator {
    fn check(&self, value: &String) -> Option<String> {
        value
            .is_empty()
            .then(|| "A value must be entered for this parameter".to_string())
    }
}

impl Validator<Vec<f64>> for MandatoryValidator {
    fn check(&self, value: &Vec<f64>) -> Option<String> {
        value
            .is_empty()
            .then(|| "A value must be entered for this parameter".to_string())
    }
}

/// Accepts only one of a fixed set of strings.
#[derive(Debug, Clone)]
pub struct ListValidator {
    allowed: Vec<String>,
}

impl ListValidator {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed
    }
}

impl Validator<String> for ListValidator {
    fn check(&self, value: &String) -> Option<String> {
        if self.allowed.iter().any(|a| a == value) {
            None
        } else {
            Some(format!(
                "The value \"{}\" is not in the list of allowed values ({})",
                value,
                self.allowed.join(", ")
            ))
        }
    }
}
