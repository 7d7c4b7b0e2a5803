//! Sensitive data marker for automatic redaction
//!
//! The `Sensitive<T>` wrapper keeps API keys and similar credentials
//! out of logs and error output.

use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use quiver_core_types::Sensitive;
///
/// let api_key = Sensitive::new("sk-live-123");
/// assert_eq!(format!("{:?}", api_key), "***REDACTED***");
/// assert_eq!(format!("{}", api_key), "***REDACTED***");
///
/// assert_eq!(api_key.expose(), &"sk-live-123");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only call this at the point the credential is actually sent
    /// (e.g. building an `Authorization` header).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
