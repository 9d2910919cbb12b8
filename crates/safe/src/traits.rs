//! Transform trait for versioned AEAD backends.

use zeroize::Zeroizing;

use crate::error::SafeError;

/// Result of [`SafeTransform::lock`].
pub struct LockedBody {
    /// Version-specific body, opaque to the outer envelope.
    pub body: Vec<u8>,
    /// Freshly generated key. Only the caller ever holds it afterwards.
    pub key: Zeroizing<Vec<u8>>,
}

/// Result of [`SafeTransform::unlock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedBody {
    pub plaintext: Vec<u8>,
    pub associated_data: Vec<u8>,
}

/// One registered safe version.
///
/// Each implementation owns the byte layout of its body. The outer envelope
/// only carries `(version, body)`, so adding a version never changes the
/// outer codec. A version number, once published, always names the same
/// transform and the same body layout.
pub trait SafeTransform: Send + Sync {
    /// Version number written into the outer envelope.
    fn version(&self) -> u32;

    /// Human-readable algorithm name, for logs.
    fn name(&self) -> &'static str;

    /// Encrypt `plaintext` and authenticate `associated_data` under a fresh
    /// random key and nonce.
    fn lock(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<LockedBody, SafeError>;

    /// Verify and decrypt a body produced by [`lock`](Self::lock).
    ///
    /// Must fail with [`SafeError::AuthenticationFailed`] on any tag mismatch
    /// and must not return partial plaintext.
    fn unlock(&self, body: &[u8], key: &[u8]) -> Result<UnlockedBody, SafeError>;
}
