//! Client side of the OnlyCNCs admin console.
//!
//! Screens are modelled as controllers (`controllers`) that own their list,
//! dialog and error state and talk to the external REST API through the
//! `AdminApi` trait. `HttpAdminApi` is the reqwest implementation.

mod api;
mod config;
mod context;
mod error;
mod public;
mod scope;
mod upload;

pub mod controllers;

pub use api::{AdminApi, HttpAdminApi};
pub use config::*;
pub use context::*;
pub use error::*;
pub use public::*;
pub use scope::*;
pub use upload::{first_acceptable, pick, CsvFile, CSV_MIME};
