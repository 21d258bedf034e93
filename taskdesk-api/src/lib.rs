//! # TaskDesk API Server Library
//!
//! HTTP layer of the task tracker: configuration, router, access control,
//! request validation, handlers and the error translator.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication, role checks and error detail
//! - `response`: Success envelope
//! - `routes`: API route handlers
//! - `validation`: Validated JSON extractor and rule helpers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod validation;
