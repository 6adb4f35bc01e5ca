//! Centralized error handling module
//!
//! Typed errors for the library surface plus extension traits that attach
//! context to failures or route them into a [`Reporter`](crate::reporter::Reporter).

pub mod context;
pub mod types;

pub use context::{ErrorContextExt, ReportExt};
pub use types::{AppError, AppResult};
