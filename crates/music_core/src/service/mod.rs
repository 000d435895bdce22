//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate sessions and repositories into use-case level APIs.
//! - Keep the CLI decoupled from storage details.

pub mod catalog_service;
pub mod import_service;
