//! Error types for scrobbled.
//!
//! Every failure in the daemon is a [`ScrobblerError`] carrying an [`ErrorCode`].
//! The first four codes are the fixed taxonomy the remote service can report;
//! the rest are raised locally. Callers branch on [`ErrorCode::category`].

use std::fmt;

/// Error codes used throughout the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The service rejected the request parameters.
    /// Trigger: unknown artist, unknown track, malformed tags.
    InvalidParameters,

    /// The service could not be reached.
    /// Trigger: no network, DNS failure, connection refused, timeout.
    ServiceOffline,

    /// The service was reached but is temporarily unable to handle requests.
    /// Trigger: HTTP 5xx, Last.fm error 16.
    ServiceUnavailable,

    /// Anything else reported by the service or its transport.
    UnknownError,

    /// Track metadata is missing or unusable.
    /// Trigger: empty title, no artist and no album artist.
    InvalidTrack,

    /// Reading or writing the offline cache failed.
    CacheFailed,

    /// Loading or querying the local catalog failed.
    CatalogFailed,

    /// The background task pool is at capacity.
    QueueFull,

    /// A configuration value is out of range or unreadable.
    InvalidConfig,
}

/// Coarse classification that decides how a failure is logged and whether it is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad or missing track metadata, detected locally.
    Validation,
    /// The service rejected our input. Logged at low severity.
    RemoteInvalidParameters,
    /// Offline or service down. Scrobbles are cached, announcements dropped.
    RemoteUnavailable,
    /// Any other remote failure. Logged at high severity, never retried.
    RemoteUnknown,
    /// Local I/O, configuration or scheduling failure.
    Local,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameters => "INVALID_PARAMETERS",
            ErrorCode::ServiceOffline => "SERVICE_OFFLINE",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::InvalidTrack => "INVALID_TRACK",
            ErrorCode::CacheFailed => "CACHE_FAILED",
            ErrorCode::CatalogFailed => "CATALOG_FAILED",
            ErrorCode::QueueFull => "QUEUE_FULL",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameters => "The scrobbling service rejected the request parameters",
            ErrorCode::ServiceOffline => "The scrobbling service could not be reached",
            ErrorCode::ServiceUnavailable => "The scrobbling service is temporarily unavailable",
            ErrorCode::UnknownError => "The scrobbling service reported an unexpected error",
            ErrorCode::InvalidTrack => "Track has no usable title or artist tags",
            ErrorCode::CacheFailed => "Failed to read or write the offline scrobble cache",
            ErrorCode::CatalogFailed => "Failed to load or query the local track catalog",
            ErrorCode::QueueFull => "Background task queue is at maximum capacity",
            ErrorCode::InvalidConfig => "Configuration value is invalid",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameters => {
                "Check the track tags; the service does not recognise this artist or title"
            }
            ErrorCode::ServiceOffline => {
                "Check the internet connection; scrobbles are cached and replayed later"
            }
            ErrorCode::ServiceUnavailable => {
                "Wait and try again; scrobbles are cached and replayed later"
            }
            ErrorCode::UnknownError => {
                "Check the API key, secret and session key, then look at the daemon log"
            }
            ErrorCode::InvalidTrack => "Tag the file with at least a title and an artist",
            ErrorCode::CacheFailed => {
                "Check that the cache directory exists and is writable (SCROBBLED_CACHE_PATH)"
            }
            ErrorCode::CatalogFailed => {
                "Check that the catalog file exists and is a JSON array of tracks"
            }
            ErrorCode::QueueFull => {
                "Events are arriving faster than they can be processed; raise SCROBBLED_QUEUE_CAPACITY"
            }
            ErrorCode::InvalidConfig => "Fix the offending setting or remove it to use the default",
        }
    }

    /// Returns the category used for logging and caching decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::InvalidParameters => ErrorCategory::RemoteInvalidParameters,
            ErrorCode::ServiceOffline | ErrorCode::ServiceUnavailable => {
                ErrorCategory::RemoteUnavailable
            }
            ErrorCode::UnknownError => ErrorCategory::RemoteUnknown,
            ErrorCode::InvalidTrack => ErrorCategory::Validation,
            ErrorCode::CacheFailed
            | ErrorCode::CatalogFailed
            | ErrorCode::QueueFull
            | ErrorCode::InvalidConfig => ErrorCategory::Local,
        }
    }

    /// Returns true if a submission that failed with this code may succeed later.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::RemoteUnavailable
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for daemon operations.
#[derive(Debug)]
pub struct ScrobblerError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScrobblerError {
    /// Creates a new ScrobblerError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new ScrobblerError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameters, message)
    }

    pub fn service_offline(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceOffline, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError, message)
    }

    /// Creates an INVALID_TRACK error for a file with unusable tags.
    pub fn invalid_track(file: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidTrack,
            format!("Unable to process {}: {}", file, reason),
        )
    }

    /// Creates a CACHE_FAILED error wrapping an I/O or parse failure.
    pub fn cache_failed(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(ErrorCode::CacheFailed, reason, source)
    }

    /// Creates a CATALOG_FAILED error.
    pub fn catalog_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::CatalogFailed, reason)
    }

    /// Creates a QUEUE_FULL error.
    pub fn queue_full(capacity: usize) -> Self {
        Self::new(
            ErrorCode::QueueFull,
            format!("Task queue is full (maximum {} pending tasks)", capacity),
        )
    }

    /// Creates an INVALID_CONFIG error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, reason)
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Display for ScrobblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for ScrobblerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using ScrobblerError.
pub type Result<T> = std::result::Result<T, ScrobblerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::InvalidParameters.as_str(), "INVALID_PARAMETERS");
        assert_eq!(ErrorCode::ServiceOffline.as_str(), "SERVICE_OFFLINE");
        assert_eq!(ErrorCode::ServiceUnavailable.as_str(), "SERVICE_UNAVAILABLE");
        assert_eq!(ErrorCode::UnknownError.as_str(), "UNKNOWN_ERROR");
        assert_eq!(ErrorCode::QueueFull.as_str(), "QUEUE_FULL");
    }

    #[test]
    fn remote_codes_map_to_categories() {
        assert_eq!(
            ErrorCode::InvalidParameters.category(),
            ErrorCategory::RemoteInvalidParameters
        );
        assert_eq!(
            ErrorCode::ServiceOffline.category(),
            ErrorCategory::RemoteUnavailable
        );
        assert_eq!(
            ErrorCode::ServiceUnavailable.category(),
            ErrorCategory::RemoteUnavailable
        );
        assert_eq!(ErrorCode::UnknownError.category(), ErrorCategory::RemoteUnknown);
        assert_eq!(ErrorCode::InvalidTrack.category(), ErrorCategory::Validation);
    }

    #[test]
    fn only_unavailable_codes_are_retryable() {
        assert!(ErrorCode::ServiceOffline.is_retryable());
        assert!(ErrorCode::ServiceUnavailable.is_retryable());
        assert!(!ErrorCode::InvalidParameters.is_retryable());
        assert!(!ErrorCode::UnknownError.is_retryable());
        assert!(!ErrorCode::CacheFailed.is_retryable());
    }

    #[test]
    fn error_code_recovery_hints_not_empty() {
        for code in [
            ErrorCode::InvalidParameters,
            ErrorCode::ServiceOffline,
            ErrorCode::ServiceUnavailable,
            ErrorCode::UnknownError,
            ErrorCode::InvalidTrack,
            ErrorCode::CacheFailed,
            ErrorCode::CatalogFailed,
            ErrorCode::QueueFull,
            ErrorCode::InvalidConfig,
        ] {
            assert!(!code.recovery_hint().is_empty());
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn scrobbler_error_display() {
        let err = ScrobblerError::queue_full(64);
        assert!(err.to_string().contains("QUEUE_FULL"));
        assert!(err.to_string().contains("64"));
        assert!(err.to_string().contains("Recovery:"));
    }
}
