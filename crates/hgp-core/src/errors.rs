//! Structured error types shared across hgp crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`HgpError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum HgpError {
    /// Rejected parameter values (unknown enum strings, k < 2, ...).
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// Malformed caller input (CSR arrays, input partitions, mode mismatch).
    #[error("precondition violated: {0}")]
    Precondition(ErrorInfo),
    /// Structural operation on an inactive or otherwise unsuitable node.
    #[error("invalid operation: {0}")]
    InvalidOperation(ErrorInfo),
    /// Uncontraction attempted out of LIFO order.
    #[error("history violation: {0}")]
    HistoryViolation(ErrorInfo),
    /// Block identifier outside `[0, k)`.
    #[error("out of range: {0}")]
    OutOfRange(ErrorInfo),
    /// No eligible contraction remains above the contraction limit.
    #[error("coarsening stalled: {0}")]
    CoarseningStalled(ErrorInfo),
    /// Every initial partitioning attempt violated the balance constraint.
    #[error("no feasible partition: {0}")]
    NoFeasiblePartition(ErrorInfo),
}

/// Coarse classification of [`HgpError`] families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Detected while building or validating a configuration.
    ConfigurationError,
    /// Caller supplied inconsistent input or used an API out of contract.
    PreconditionViolation,
    /// A heuristic ran out of options; the result is degraded but valid.
    AlgorithmicExhaustion,
}

impl HgpError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            HgpError::Configuration(info)
            | HgpError::Precondition(info)
            | HgpError::InvalidOperation(info)
            | HgpError::HistoryViolation(info)
            | HgpError::OutOfRange(info)
            | HgpError::CoarseningStalled(info)
            | HgpError::NoFeasiblePartition(info) => info,
        }
    }

    /// Returns the machine readable code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Classifies the error family.
    pub fn class(&self) -> ErrorClass {
        match self {
            HgpError::Configuration(_) => ErrorClass::ConfigurationError,
            HgpError::Precondition(_)
            | HgpError::InvalidOperation(_)
            | HgpError::HistoryViolation(_)
            | HgpError::OutOfRange(_) => ErrorClass::PreconditionViolation,
            HgpError::CoarseningStalled(_) | HgpError::NoFeasiblePartition(_) => {
                ErrorClass::AlgorithmicExhaustion
            }
        }
    }

    fn map_info(self, f: impl FnOnce(ErrorInfo) -> ErrorInfo) -> Self {
        match self {
            HgpError::Configuration(info) => HgpError::Configuration(f(info)),
            HgpError::Precondition(info) => HgpError::Precondition(f(info)),
            HgpError::InvalidOperation(info) => HgpError::InvalidOperation(f(info)),
            HgpError::HistoryViolation(info) => HgpError::HistoryViolation(f(info)),
            HgpError::OutOfRange(info) => HgpError::OutOfRange(f(info)),
            HgpError::CoarseningStalled(info) => HgpError::CoarseningStalled(f(info)),
            HgpError::NoFeasiblePartition(info) => HgpError::NoFeasiblePartition(f(info)),
        }
    }

    /// Adds a context entry to the payload regardless of the family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.map_info(|info| info.with_context(key, value))
    }

    /// Sets the remediation hint of the payload regardless of the family.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        self.map_info(|info| info.with_hint(hint))
    }

    /// Shorthand for a [`HgpError::Configuration`] error.
    pub fn configuration(code: impl Into<String>, message: impl Into<String>) -> Self {
        HgpError::Configuration(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`HgpError::Precondition`] error.
    pub fn precondition(code: impl Into<String>, message: impl Into<String>) -> Self {
        HgpError::Precondition(ErrorInfo::new(code, message))
    }
}
