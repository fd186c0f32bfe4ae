//! # SCORM Common Library
//!
//! Shared code for the SCORM services including:
//! - Error and Result types
//! - Configuration loading and root folder resolution
//! - Database initialization and row models
//! - UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod uuid_utils;

pub use error::{Error, Result};
