//! Creation of functions by name and from definition strings.
//!
//! A definition is a `;`-separated list of function items followed by
//! optional tie groups:
//!
//! ```text
//! name=Gaussian,Height=1,PeakCentre=0,Sigma=0.5;name=LinearBackground,A0=0,A1=0;ties=(f1.A0=2*f0.Height)
//! ```
//!
//! One item gives a leaf function, several give a [`CompositeFunction`]. A
//! parenthesized item is a nested composite. A leaf item may carry its own
//! `ties=(...)` group, spelled with the leaf's local names.

use super::{
    CompositeFunction, ExpDecay, FlatBackground, Function, Gaussian, LeafFunction,
    LinearBackground, Lorentzian,
};
use crate::error::{FrameworkError, Result};
use std::collections::HashMap;
use tracing::debug;

type Constructor = Box<dyn Fn() -> Box<dyn Function> + Send + Sync>;

/// Registry of function constructors keyed by function name.
#[derive(Default)]
pub struct FunctionFactory {
    constructors: HashMap<String, Constructor>,
}

fn leaf_entry<T: LeafFunction + Default>() -> (String, Constructor) {
    let constructor: Constructor = Box::new(|| -> Box<dyn Function> { Box::new(T::default()) });
    (T::NAME.to_string(), constructor)
}

impl std::fmt::Debug for FunctionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionFactory")
            .field("keys", &self.keys())
            .finish()
    }
}

impl FunctionFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory knowing every built-in leaf function.
    pub fn with_builtins() -> Self {
        let constructors = [
            leaf_entry::<Gaussian>(),
            leaf_entry::<Lorentzian>(),
            leaf_entry::<LinearBackground>(),
            leaf_entry::<FlatBackground>(),
            leaf_entry::<ExpDecay>(),
        ];
        Self {
            constructors: constructors.into_iter().collect(),
        }
    }

    /// Register a constructor under `name`.
    pub fn subscribe<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Function> + Send + Sync + 'static,
    {
        if self.constructors.contains_key(name) {
            return Err(FrameworkError::DuplicateName(format!("function '{}'", name)));
        }
        self.constructors
            .insert(name.to_string(), Box::new(constructor));
        Ok(())
    }

    /// Register a leaf function under its own name, built from `Default`.
    pub fn subscribe_leaf<T: LeafFunction + Default>(&mut self) -> Result<()> {
        let (name, constructor) = leaf_entry::<T>();
        self.subscribe(&name, constructor)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.constructors.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// A new function with default parameter values.
    pub fn create(&self, name: &str) -> Result<Box<dyn Function>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| FrameworkError::NotFound(format!("function '{}'", name)))?;
        Ok(constructor())
    }

    /// Build a function from a definition string.
    pub fn create_function(&self, definition: &str) -> Result<Box<dyn Function>> {
        let items = split_top_level(definition, ';')?;
        let (tie_groups, function_items): (Vec<&str>, Vec<&str>) = items
            .iter()
            .copied()
            .partition(|item| item.starts_with("ties="));

        let function: Box<dyn Function> = match function_items.as_slice() {
            [] => {
                return Err(FrameworkError::InvalidArgument(format!(
                    "definition '{}' names no function",
                    definition
                )))
            }
            [single] => {
                let mut function = self.build_item(single)?;
                for group in tie_groups.iter().filter_map(|g| g.strip_prefix("ties=")) {
                    apply_tie_group(function.as_mut(), group)?;
                }
                function
            }
            _ => Box::new(self.build_composite(&items)?),
        };
        debug!(definition, n_params = function.n_params(), "created function");
        Ok(function)
    }

    fn build_item(&self, item: &str) -> Result<Box<dyn Function>> {
        match strip_group(item) {
            Some(inner) => {
                let items = split_top_level(inner, ';')?;
                Ok(Box::new(self.build_composite(&items)?))
            }
            None => self.build_leaf(item),
        }
    }

    fn build_composite(&self, items: &[&str]) -> Result<CompositeFunction> {
        let mut composite = CompositeFunction::new();
        let mut tie_groups = Vec::new();
        for item in items {
            match item.strip_prefix("ties=") {
                Some(group) => tie_groups.push(group),
                None => {
                    composite.add_function(self.build_item(item)?)?;
                }
            }
        }
        for group in tie_groups {
            apply_tie_group(&mut composite, group)?;
        }
        Ok(composite)
    }

    fn build_leaf(&self, item: &str) -> Result<Box<dyn Function>> {
        let mut fields = split_top_level(item, ',')?.into_iter();
        let name = match fields.next().and_then(|f| f.split_once('=')) {
            Some((key, value)) if key.trim() == "name" => value.trim(),
            _ => {
                return Err(FrameworkError::InvalidArgument(format!(
                    "function item '{}' must start with name=",
                    item
                )))
            }
        };

        let mut function = self.create(name)?;
        let mut tie_groups = Vec::new();
        for field in fields {
            let (key, value) = field.split_once('=').ok_or_else(|| {
                FrameworkError::InvalidArgument(format!("expected key=value, got '{}'", field))
            })?;
            let (key, value) = (key.trim(), value.trim());
            if key == "ties" {
                tie_groups.push(value);
                continue;
            }
            let number: f64 = value.parse().map_err(|_| {
                FrameworkError::InvalidArgument(format!(
                    "value of {}.{} is not a number: '{}'",
                    name, key, value
                ))
            })?;
            function.set_parameter_by_name(key, number)?;
        }

        for group in tie_groups {
            apply_tie_group(function.as_mut(), group)?;
        }
        Ok(function)
    }
}

/// Apply a `(name=expression,...)` group and evaluate the new ties.
fn apply_tie_group(function: &mut dyn Function, group: &str) -> Result<()> {
    let inner = strip_group(group).ok_or_else(|| {
        FrameworkError::InvalidArgument(format!("ties must be enclosed in (): '{}'", group))
    })?;
    for tie in split_top_level(inner, ',')? {
        let (name, expression) = tie.split_once('=').ok_or_else(|| {
            FrameworkError::InvalidArgument(format!("expected name=expression, got '{}'", tie))
        })?;
        function.tie(name.trim(), expression.trim())?;
    }
    function.apply_ties()
}

/// `Some(inner)` when `text` is one parenthesized group.
fn strip_group(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Split on `separator` outside parentheses, trimming pieces and dropping
/// empty ones.
fn split_top_level(text: &str, separator: char) -> Result<Vec<&str>> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == separator && depth == 0 => {
                pieces.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        return Err(FrameworkError::InvalidArgument(format!(
            "unbalanced parentheses in '{}'",
            text
        )));
    }
    pieces.push(&text[start..]);
    Ok(pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect())
}
