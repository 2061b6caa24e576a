//! Property directions.

use crate::error::FrameworkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an algorithm reads a property, writes it, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input = 0,
    Output = 1,
    InOut = 2,
}

impl Direction {
    /// Whether the algorithm reads the bound value before executing.
    pub fn is_input(self) -> bool {
        matches!(self, Direction::Input | Direction::InOut)
    }

    /// Whether the algorithm writes the bound value.
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::InOut)
    }
}

impl TryFrom<i32> for Direction {
    type Error = FrameworkError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Input),
            1 => Ok(Direction::Output),
            2 => Ok(Direction::InOut),
            other => Err(FrameworkError::InvalidDirection(other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Direction::Input => "Input",
            Direction::Output => "Output",
            Direction::InOut => "InOut",
        };
        f.write_str(text)
    }
}
