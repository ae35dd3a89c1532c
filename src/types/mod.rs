//! Shared types for ENAA

mod error;

pub use error::{EnaaError, ErrorBody, ErrorDetail, Result};
