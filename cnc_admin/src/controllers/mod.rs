//! One controller per admin screen. Each owns its list, dialog and error
//! state, issues requests through an `AdminApi` and races them against its
//! `ViewScope`.

mod admins;
mod dialog;
mod reference;
mod settings_csv;
mod settings_form;
mod users;

pub use admins::*;
pub use dialog::*;
pub use reference::*;
pub use settings_csv::*;
pub use settings_form::*;
pub use users::*;

use tracing::warn;

use crate::{AdminError, AdminResult, ValidationError};

/// Store the rendered failure as the screen's inline error.
/// Cancellations leave the screen alone.
pub(crate) fn settle<T>(
    error: &mut Option<String>,
    result: AdminResult<T>,
    render: impl FnOnce(&AdminError) -> String,
) -> AdminResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(AdminError::Cancelled) => Err(AdminError::Cancelled),
        Err(e) => {
            let message = render(&e);
            warn!("{}", message);
            *error = Some(message);
            Err(e)
        }
    }
}

/// Refuse an action before any request: log it, show it inline and hand the
/// error back for the caller to return.
pub(crate) fn refuse(error: &mut Option<String>, err: ValidationError) -> AdminError {
    warn!("{}", err);
    *error = Some(err.to_string());
    err.into()
}
