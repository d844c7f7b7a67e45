//! Error kinds raised by the index and transform core.

use thiserror::Error;

/// Enumerated type for the errors that can arise while building orbital index tables or while
/// applying a basis-convention transform.
///
/// Every variant is raised synchronously at the point of detection. None of them is retried
/// internally since all core operations are deterministic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AoNormError {
    /// Inconsistent species/shell definitions, mismatched array lengths, or an angular momentum
    /// without an entry in a convention table.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An orbital or folding index outside of its documented range.
    #[error("Index error: {0}")]
    Index(String),

    /// A post-transform validation failure, *e.g.* an overlap matrix that is not symmetric within
    /// tolerance. Whether this is fatal is for the caller to decide.
    #[error("Consistency error: {0}")]
    Consistency(String),
}

impl AoNormError {
    /// Returns `true` if this is a [`AoNormError::Configuration`] error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AoNormError::Configuration(_))
    }

    /// Returns `true` if this is a [`AoNormError::Index`] error.
    pub fn is_index(&self) -> bool {
        matches!(self, AoNormError::Index(_))
    }

    /// Returns `true` if this is a [`AoNormError::Consistency`] error.
    pub fn is_consistency(&self) -> bool {
        matches!(self, AoNormError::Consistency(_))
    }
}

/// Shorthand for results of core operations.
pub type AoNormResult<T> = Result<T, AoNormError>;

/// Returns early with a [`AoNormError::Configuration`] error if a condition does not hold.
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::AoNormError::Configuration(format!($($arg)+)));
        }
    };
}

/// Returns early with a [`AoNormError::Index`] error if a condition does not hold.
macro_rules! ensure_index {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::AoNormError::Index(format!($($arg)+)));
        }
    };
}

pub(crate) use {ensure_config, ensure_index};
