//! Core domain types: validation request/result shapes and the error
//! taxonomy shared across providers.

pub mod error;
pub mod result;

pub use error::{ErrorKind, MarkError, ProviderError, Result};
pub use result::{
    summary_line, ProviderKind, SearchHit, ValidationRequest, ValidationResult, ValidationStatus,
};
