//! Dialog state shared by the screen controllers.

use cnc_common::{EntityId, Record};

use crate::ValidationError;

/// What a form dialog will do on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    /// Submit failed; the dialog stays open with this message.
    Failed(String),
}

/// An open form dialog. Closing it means dropping it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDialog<F> {
    pub mode: FormMode,
    pub phase: FormPhase,
    pub fields: F,
}

impl<F> FormDialog<F> {
    pub fn new(mode: FormMode, fields: F) -> Self {
        Self {
            mode,
            phase: FormPhase::Editing,
            fields,
        }
    }

    /// The submit action is unavailable while a submit is in flight.
    pub fn can_submit(&self) -> bool {
        self.phase != FormPhase::Submitting
    }

    pub fn begin_submit(&mut self) -> Result<(), ValidationError> {
        if !self.can_submit() {
            return Err(ValidationError::Busy);
        }
        self.phase = FormPhase::Submitting;
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = FormPhase::Failed(message.into());
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.phase {
            FormPhase::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Yes/no confirmation before deleting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub target: EntityId,
    pub message: String,
}

impl ConfirmDialog {
    pub fn new<R: Record>(label: &str, record: &R) -> Self {
        Self {
            target: record.record_id(),
            message: format!(
                "Are you sure you want to delete this {}: \"{}\"?",
                label,
                record.display_name()
            ),
        }
    }
}

/// Typed-name confirmation guarding the spindle cascade delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameConfirmation {
    expected: String,
    typed: String,
    pub submitting: bool,
}

impl NameConfirmation {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            typed: String::new(),
            submitting: false,
        }
    }

    pub fn type_text(&mut self, text: impl Into<String>) {
        self.typed = text.into();
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Byte-for-byte equality: no trimming, no case folding.
    pub fn matches(&self) -> bool {
        self.typed == self.expected
    }
}

/// Parse a number field the way a numeric input would hand it over.
pub fn parse_number(label: &'static str, input: &str) -> Result<f64, ValidationError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::NotANumber(label))
}
