use thiserror::Error;

/// Raised when data crossing into the calculator cannot be made typed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Invalid {label}: {value}")]
    InvalidDate { label: String, value: String },

    #[error("Invalid {field}: {value} is not a number")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl InputError {
    pub fn date(label: &str, value: &str) -> Self {
        Self::InvalidDate {
            label: label.to_string(),
            value: value.to_string(),
        }
    }

    pub fn number(field: &str, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn value(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CliError {
    pub message: String,
    pub exit_code: i32,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 2,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 3,
        }
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 4,
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: 5,
        }
    }
}

impl From<InputError> for CliError {
    fn from(e: InputError) -> Self {
        CliError::usage(e.to_string())
    }
}
