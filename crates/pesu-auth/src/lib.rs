// Copyright 2026 PESU Auth Contributors
// SPDX-License-Identifier: MIT

//! PESU Auth: verify credentials against PESU Academy and scrape the
//! student profile from the authenticated session.
//!
//! The entry point is [`PortalClient::authenticate`]. Every call opens its
//! own [`Session`], so concurrent calls never share cookies or tokens.

pub mod branch;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod session;
pub mod types;

pub use branch::{branch_short_code, BRANCH_SHORT_CODES};
pub use client::PortalClient;
pub use config::PortalConfig;
pub use error::{PortalError, PortalResult};
pub use extract::{extract_profile, infer_campus, inspect_login_response, LoginOutcome};
pub use filter::FieldFilter;
pub use session::Session;
pub use types::*;
