#![deny(missing_docs)]

//! Core library for the filesum document summarization service.

/// HTTP routing and REST handlers.
pub mod api;
/// Shared-credential verification.
pub mod auth;
/// Environment-driven configuration management.
pub mod config;
/// Plain-text extraction from `.docx`, `.pptx` and `.pdf` documents.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Upload metrics helpers.
pub mod metrics;
/// Upload pipeline and metadata queries.
pub mod service;
/// Metadata and blob persistence.
pub mod store;
/// Remote summarization client.
pub mod summarization;
