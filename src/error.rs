//! Defines the unified error type for parsing, matching and function invocation.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SiftError {
    /// The filter text is malformed. Carries the byte offset of the first
    /// unparseable character in the trimmed input.
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A function name could not be resolved, or a registered function
    /// rejected its input. Scoped to a single statement by the walker.
    #[error("Function '{function}' error: {message}")]
    Function { function: String, message: String },

    /// An expression tree reached the matcher in an inconsistent state.
    /// This always indicates a bug, never bad user input.
    #[error("Match invariant violated: {0}")]
    Match(String),
}

impl SiftError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        SiftError::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn function(function: impl Into<String>, message: impl Into<String>) -> Self {
        SiftError::Function {
            function: function.into(),
            message: message.into(),
        }
    }
}
