//! Safe error types.

/// Errors produced by lock / unlock operations.
///
/// Every variant is terminal for the call that produced it: no partial
/// plaintext or envelope is ever returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum SafeError {
    /// An input could not be turned into bytes (bad base64/hex carrier,
    /// wrong key width, non-UTF-8 data requested as a string).
    #[error("invalid {name}: {reason}")]
    InvalidInput { name: &'static str, reason: String },

    /// The requested encoding is unknown or not allowed for this value.
    #[error("{name} must be one of the following: {allowed}, got {requested}")]
    InvalidEncoding {
        name: &'static str,
        requested: String,
        allowed: String,
    },

    /// The plaintext exceeds what the cipher can process under one nonce.
    #[error("plaintext cannot be longer than {max} bytes, got {len}")]
    PlaintextTooLarge { len: u64, max: u64 },

    /// The outer envelope or a version body does not match its structure.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The envelope names a version that is not in the registry. Carries the
    /// decimal value, which may exceed any registrable version number.
    #[error("unknown safe version: {0}")]
    UnknownVersion(String),

    /// The registry has no transform at all.
    #[error("no safe version registered")]
    NoRegisteredVersion,

    /// Two transforms claimed the same version number.
    #[error("safe version {0} registered twice")]
    DuplicateVersion(u32),

    /// Tag verification failed. Carries no detail on purpose.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The canonical encoder refused a value (length beyond codec limits).
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl SafeError {
    #[must_use]
    pub fn invalid_input(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn unknown_version(version: impl std::fmt::Display) -> Self {
        Self::UnknownVersion(version.to_string())
    }

    #[must_use]
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedEnvelope(reason.to_string())
    }

    /// Short stable label, used for metrics and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidEncoding { .. } => "invalid_encoding",
            Self::PlaintextTooLarge { .. } => "plaintext_too_large",
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::UnknownVersion(_) => "unknown_version",
            Self::NoRegisteredVersion => "no_registered_version",
            Self::DuplicateVersion(_) => "duplicate_version",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Encoding(_) => "encoding",
        }
    }
}

pub type Result<T> = std::result::Result<T, SafeError>;
