//! Errors that abort a whole orchestrated reduction.
//!
//! Per-slice failures are not errors at this level; they are collected in
//! the [`ReductionReport`](super::report::ReductionReport).
use crate::services::errors::UpstreamError;
use thiserror::Error;

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    /// The sample or can run could not be loaded.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
