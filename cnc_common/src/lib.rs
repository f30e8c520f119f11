//! Shared API types for the OnlyCNCs admin client.
//!
//! This crate provides the types exchanged with the external OnlyCNCs REST API
//! and the pieces of client logic that need no I/O. Nothing here talks to the
//! network.
//!
//! # Architecture
//!
//! - `cnc_common` - Wire types (entities, payloads, response envelopes) and CSV export
//! - `cnc_admin` - HTTP client, configuration and the admin screen controllers
//! - `cnc_sim` - Simulator of the admin API used by the integration tests
//!
//! # Usage
//!
//! ```rust
//! use cnc_common::{Setting, sort_newest_first, settings_csv};
//! ```

mod export;
mod models;
mod requests;
mod responses;

pub use export::*;
pub use models::*;
pub use requests::*;
pub use responses::*;
