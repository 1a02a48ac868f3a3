//! API data models
//!
//! This module contains the wire structures for OpenAI-compatible chat APIs.

pub mod openai;
