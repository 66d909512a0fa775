// Copyright 2026 PESU Auth Contributors
// SPDX-License-Identifier: MIT

//! HTTP front-end for PESU Auth.
//!
//! Parses and validates requests, stamps responses, and maps outcomes to
//! status codes. All portal work happens in the `pesu-auth` crate.

pub mod config;
pub mod rest;
pub mod timestamp;
pub mod validate;
