//! Parameter ties.

use super::{Function, ParameterRef, ParameterValues};
use crate::error::{FrameworkError, Result};
use crate::expression::{EvaluationContext, Expression, ExpressionError};
use std::collections::HashMap;

/// Binds one parameter's value to an expression of other parameters.
///
/// Variables in the expression are resolved to [`ParameterRef`]s when the tie
/// is created, so the tie keeps pointing at the same parameters when
/// functions are added to or removed from an enclosing composite. A tie is
/// owned by the function that declares the tied parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTie {
    parameter: ParameterRef,
    expression: Expression,
    references: HashMap<String, ParameterRef>,
}

struct ReferenceContext<'a> {
    references: &'a HashMap<String, ParameterRef>,
    values: &'a ParameterValues,
}

impl EvaluationContext for ReferenceContext<'_> {
    fn get_variable(&self, name: &str) -> std::result::Result<f64, ExpressionError> {
        self.references
            .get(name)
            .and_then(|r| self.values.get(r))
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

impl ParameterTie {
    /// Parse `expression` and resolve its variables against `scope`, the
    /// function in which the parameter names are spelled.
    pub fn new(parameter: ParameterRef, expression: &str, scope: &dyn Function) -> Result<Self> {
        let expression = Expression::parse(expression)?;
        let mut references = HashMap::new();
        for name in expression.variables() {
            let reference = scope.parameter_ref_by_name(&name)?;
            if reference == parameter {
                return Err(FrameworkError::InvalidArgument(format!(
                    "parameter '{}' cannot be tied to itself",
                    name
                )));
            }
            references.insert(name, reference);
        }
        Ok(Self {
            parameter,
            expression,
            references,
        })
    }

    /// The tied parameter.
    pub fn parameter(&self) -> ParameterRef {
        self.parameter
    }

    /// The parameters the expression reads.
    pub fn references(&self) -> impl Iterator<Item = &ParameterRef> {
        self.references.values()
    }

    /// Whether the expression reads any parameter matching `predicate`.
    pub fn depends_on<P: Fn(&ParameterRef) -> bool>(&self, predicate: P) -> bool {
        self.references.values().any(predicate)
    }

    /// Compute the tied value from a snapshot of parameter values.
    pub fn evaluate(&self, values: &ParameterValues) -> Result<f64> {
        let context = ReferenceContext {
            references: &self.references,
            values,
        };
        Ok(self.expression.evaluate(&context)?)
    }

    /// Render as `name=expression` using the current names within `scope`.
    ///
    /// Returns `None` when a referenced parameter is no longer reachable.
    pub fn as_string(&self, scope: &dyn Function) -> Option<String> {
        let target = scope.name_of_ref(&self.parameter)?;
        let mut current = HashMap::new();
        for (name, reference) in &self.references {
            current.insert(name.as_str(), scope.name_of_ref(reference)?);
        }
        let rendered = self.expression.map_variables(&|name: &str| {
            current
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        });
        Some(format!("{}={}", target, rendered))
    }
}
