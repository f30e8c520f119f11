//! Error taxonomy of the admin client.
//!
//! Three families matter to the operator:
//! - configuration errors are terminal for a screen
//! - HTTP and transport errors are shown inline next to the action
//! - validation errors are raised before any request is sent
//!
//! Nothing is retried.

use cnc_common::{ApiMessage, ExportError};

/// Error type for every admin operation.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    MissingConfig(String),

    /// Non-2xx response with the raw response text.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// The view that issued the request closed before it resolved.
    #[error("Request cancelled")]
    Cancelled,
}

pub const GENERIC_FAILURE: &str = "Request failed";

impl AdminError {
    /// Message shown inline for a failed `action`, e.g. `inline("load settings")`.
    pub fn inline(&self, action: &str) -> String {
        let text = match self {
            AdminError::Http { status, body } if body.trim().is_empty() => {
                format!("Failed to {} ({})", action, status)
            }
            AdminError::Http { body, .. } => format!("Failed to {}: {}", action, body.trim()),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            text
        }
    }

    /// `Failed to <action> (<status>)` whatever the body says. Used by loads.
    pub fn with_status(&self, action: &str) -> String {
        match self {
            AdminError::Http { status, .. } => format!("Failed to {} ({})", action, status),
            other => other.inline(action),
        }
    }

    /// `Failed to <action>` for any HTTP failure. Used by form submits and deletes.
    pub fn brief(&self, action: &str) -> String {
        match self {
            AdminError::Http { .. } => format!("Failed to {}", action),
            other => other.inline(action),
        }
    }

    /// The server's own message when it sent one, else `fallback`. A JSON
    /// body is reduced to its `message`/`error` field.
    pub fn server_message_or(&self, fallback: &str) -> String {
        match self {
            AdminError::Http { body, .. } if body.trim().is_empty() => fallback.to_string(),
            AdminError::Http { body, .. } => match serde_json::from_str::<ApiMessage>(body) {
                Ok(message) => message.text().map(|t| t.trim().to_string()).unwrap_or_else(|| fallback.to_string()),
                Err(_) => body.trim().to_string(),
            },
            other => other.inline(fallback),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AdminError::Cancelled)
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdminError::Decode(err.to_string())
        } else {
            AdminError::Transport(err.to_string())
        }
    }
}

/// Input problems caught before a request is issued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a valid CSV file")]
    NotCsv,
    #[error("Please select a CSV file to upload")]
    NoFileSelected,
    #[error("No spindle selected. Please go back to spindles and select a spindle first.")]
    NoSpindleSelected,
    #[error("Please select Spindle, Material, and Bit before creating a setting")]
    IncompleteSelection,
    #[error("Spindle name does not match. Please enter the exact spindle name to confirm deletion.")]
    ConfirmationMismatch,
    #[error("Please enter an email.")]
    EmptyEmail,
    #[error("Admin not found")]
    AdminNotFound,
    #[error("{0} must be a number")]
    NotANumber(&'static str),
    #[error("{0} is required")]
    Required(&'static str),
    #[error("No {0} selected")]
    NothingSelected(&'static str),
    #[error("Another request is already in progress")]
    Busy,
    #[error("No dialog is open")]
    DialogClosed,
}

pub type AdminResult<T> = Result<T, AdminError>;
