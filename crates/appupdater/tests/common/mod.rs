//! Common test infrastructure for appupdater tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: Versions, names, and paths shared by the tests
//! - `fixtures`: In-memory zip archives and pre-populated install directories
//! - `mock_server`: Wiremock setup helpers for the text and archive endpoints
//! - `gated_server`: Raw HTTP server that holds back part of a body on request
//! - `controller_helpers`: Job construction and event collection

// Not every test binary uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod controller_helpers;
pub mod fixtures;
pub mod gated_server;
pub mod mock_server;

pub use constants::*;
pub use controller_helpers::*;
pub use fixtures::*;
pub use gated_server::*;
pub use mock_server::*;
