//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic. Today that is configuration loading and validation;
//! stores and history sources live behind ports and are wired by the
//! host.

pub mod config;
