//! Domain validation errors.

/// Errors raised while validating domain input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A date string was not an ISO calendar date
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A time of day was not `HH:MM`
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    /// A configured day token does not fit the habit's frequency
    #[error("invalid day token '{token}' for {frequency} habit")]
    InvalidDayToken {
        /// Offending token
        token: String,
        /// Frequency the token was resolved against
        frequency: String,
    },

    /// A required text field was blank
    #[error("{0} must not be blank")]
    Blank(&'static str),
}

/// Result alias for domain validation.
pub type Result<T> = std::result::Result<T, CoreError>;
