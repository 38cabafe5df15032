//! # consulthub-core
//!
//! Core crate for ConsultHub. Contains configuration schemas, typed
//! identifiers, collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ConsultHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
