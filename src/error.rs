//! Error types for machine reconciliation

use std::fmt;

use thiserror::Error;

use crate::cloud::{CloudError, InstanceState};

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input: tag, label, missing instance fields
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Zero or several provider objects where exactly one was expected
    #[error("Not found: {0}")]
    NotFound(String),

    /// Instance exists but is not in one of the allowed lifecycle states
    #[error(
        "instance {instance_id} state {:?} is not in {}",
        .actual.as_str(),
        join_states(.allowed)
    )]
    InvalidInstanceState {
        instance_id: String,
        actual: InstanceState,
        allowed: Vec<InstanceState>,
    },

    /// Unparseable IP literal reported by the provider
    #[error("EC2 instance had invalid {kind} address: {instance_id} ({address:?})")]
    InvalidAddress {
        instance_id: String,
        kind: &'static str,
        address: String,
    },

    /// Cloud API call failed
    #[error("Cloud API error: {0}")]
    Cloud(#[from] CloudError),

    /// Several independent operations failed
    #[error("{0}")]
    Aggregate(#[from] MultiError),

    /// Load balancer attachment failed for one balancer generation
    #[error("failed to {action} {generation} load balancers: {source}")]
    LoadBalancer {
        action: &'static str,
        generation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Provider spec/status payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Validation errors are terminal for the current attempt
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::ValidationError(_))
    }

    /// Provider error code, if the failure came straight from the cloud API
    pub fn cloud_code(&self) -> Option<&str> {
        match self {
            Error::Cloud(e) => Some(e.code.as_str()),
            _ => None,
        }
    }
}

fn join_states(states: &[InstanceState]) -> String {
    states
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered collection of labelled failures from a batch operation.
///
/// Each entry pairs the item the operation was applied to (a load balancer
/// name, a target group ARN) with the error it produced.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<(String, Error)>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, error: impl Into<Error>) {
        self.errors.push((label.into(), error.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.errors.iter().map(|(label, e)| (label.as_str(), e))
    }

    /// `Ok(())` when nothing was collected, otherwise an [`Error::Aggregate`]
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate(self))
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [(label, e)] = self.errors.as_slice() {
            return write!(f, "{label}: {e}");
        }
        write!(f, "[")?;
        for (i, (label, e)) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label}: {e}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for MultiError {}
