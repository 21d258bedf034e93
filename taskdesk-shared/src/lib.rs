//! # TaskDesk Shared Library
//!
//! Domain types, persistence and authentication used by the TaskDesk API.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and their input/filter types
//! - `auth`: passwords, bearer tokens, the credential store and role checks
//! - `store`: persistence traits with PostgreSQL and in-memory backends
//! - `db`: connection pool and embedded migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
