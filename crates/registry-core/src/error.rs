use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors surfaced by the registry protocol.
///
/// Every variant maps to a stable [`reason_code`](RegistryError::reason_code)
/// so transports can report a machine-readable reason without matching on
/// message text.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Malformed payload, key, or signature encoding
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A registrant identity signal matches a ban entry
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Signature verification failed, or there is no key to verify against
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Lost an optimistic update race; safe to retry with fresh state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unknown record or token
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// Challenge token is unknown, consumed, or past its expiry
    #[error("challenge expired or unknown")]
    ChallengeExpired,

    /// Challenge solution does not satisfy the puzzle
    #[error("challenge solution is invalid")]
    ChallengeInvalid,

    /// Moderation action is not allowed from the record's current status
    #[error("cannot {action} a network in status {from}")]
    InvalidTransition {
        /// Status the record was in
        from: String,
        /// Action that was attempted
        action: String,
    },

    /// Backing store timed out or failed
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration is invalid or could not be loaded
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected internal failure (e.g. the system RNG)
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Shorthand for a [`RegistryError::NotFound`]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Stable, kebab-case reason code for this error
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::Json(_) => "invalid-input",
            Self::Forbidden(_) => "forbidden",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::NotFound { .. } => "not-found",
            Self::ChallengeExpired => "expired-challenge",
            Self::ChallengeInvalid => "invalid-solution",
            Self::InvalidTransition { .. } => "invalid-transition",
            Self::StoreUnavailable(_) => "store-unavailable",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true if the caller may retry the same request
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::StoreUnavailable(_))
    }

    /// Advisory HTTP status code for transport collaborators
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::Json(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) | Self::ChallengeExpired | Self::ChallengeInvalid => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) | Self::InvalidTransition { .. } => 409,
            Self::StoreUnavailable(_) => 503,
            Self::Config(_) | Self::Internal(_) => 500,
        }
    }
}
