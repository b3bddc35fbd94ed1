//!
//! Defines error types for the permission kernel.
//!
//! Denial is never an error: an unknown permission or a missing grant comes back
//! as `false` or an empty set. Errors are reserved for caller mistakes and for
//! collaborator failures the host must be able to tell apart from "no".

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Represents errors that can occur during permission resolution and grant storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The permission name does not resolve to a catalog entry.
    /// Recovered inside the kernel and surfaced as a denial.
    #[error("Permission not found: {0}")]
    NotFound(String),
    /// The caller passed something malformed, e.g. a permission name without a namespace.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The grant store (or another collaborator) failed. Never treated as a denial.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    /// Startup configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AccessError {
    /// Whether this error is a plain "no" that callers may fold into a denial.
    pub fn is_denial(&self) -> bool {
        matches!(self, AccessError::NotFound(_))
    }

    /// Whether retrying the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::StorageUnavailable(_))
    }

    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        AccessError::StorageUnavailable(format!("{context}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = AccessError::NotFound("bogus.nope".into());
        assert_eq!(e.to_string(), "Permission not found: bogus.nope");
    }

    #[test]
    fn test_denial_and_outage_are_distinguishable() {
        assert!(AccessError::NotFound("x.y".into()).is_denial());
        assert!(!AccessError::NotFound("x.y".into()).is_retryable());

        let outage = AccessError::storage("scan", "connection reset");
        assert!(!outage.is_denial());
        assert!(outage.is_retryable());
        assert_eq!(outage.to_string(), "Storage unavailable: scan: connection reset");

        assert!(!AccessError::InvalidInput("x".into()).is_denial());
        assert!(!AccessError::Config("x".into()).is_retryable());
    }
}
