//! HTTP API module
//!
//! This module contains the axum router, request handlers, and the upload page.

pub mod endpoints;
