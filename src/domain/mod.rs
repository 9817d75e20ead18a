use std::fmt::Display;
use thiserror::Error;

pub mod password;
pub mod task_list;
pub mod todo;
pub mod user;

#[cfg(test)]
pub(crate) mod test_util;

/// The successful result of an operation: a human-readable message describing what happened
/// alongside the operation's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub message: String,
    pub value: T,
}

impl<T> Outcome<T> {
    pub fn new(value: T, message: impl Into<String>) -> Self {
        Outcome {
            message: message.into(),
            value,
        }
    }
}

/// Flattened `(success, message, data)` view of an operation's result, for callers that only
/// want to branch on the success flag and show the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T, E: Display> From<Result<Outcome<T>, E>> for Report<T> {
    fn from(value: Result<Outcome<T>, E>) -> Self {
        match value {
            Ok(outcome) => Report {
                success: true,
                message: outcome.message,
                data: Some(outcome.value),
            },
            Err(err) => Report {
                success: false,
                message: err.to_string(),
                data: None,
            },
        }
    }
}

/// Whether a state-setting operation actually changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Changed,
    AlreadySet,
}

/// Text input that failed validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} too long (max {max_chars} characters)")]
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
}

/// Validation rule for user-entered text. Length is counted in characters on the text as
/// submitted; the stored value is trimmed.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub field: &'static str,
    pub max_chars: usize,
}

impl TextRule {
    pub const fn new(field: &'static str, max_chars: usize) -> Self {
        TextRule { field, max_chars }
    }

    /// Checks required text, producing the trimmed value
    pub fn apply(&self, raw: &str) -> Result<String, TextError> {
        if raw.trim().is_empty() {
            return Err(TextError::Empty { field: self.field });
        }

        self.check_length(raw)?;
        Ok(raw.trim().to_owned())
    }

    /// Checks optional text. Missing or blank text becomes [None].
    pub fn apply_optional(&self, raw: Option<&str>) -> Result<Option<String>, TextError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        self.check_length(raw)?;
        Ok(Some(raw.trim().to_owned()))
    }

    fn check_length(&self, raw: &str) -> Result<(), TextError> {
        if raw.chars().count() > self.max_chars {
            return Err(TextError::TooLong {
                field: self.field,
                max_chars: self.max_chars,
            });
        }

        Ok(())
    }
}
