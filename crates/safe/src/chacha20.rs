//! Safe version 1: ChaCha20-Poly1305 (RFC 8439).
//!
//! Body layout (ASN.1 DER):
//!
//! ```text
//! ChaCha20Poly1305 ::= SEQUENCE {
//!     initializationVector  OCTET STRING (SIZE (12)),
//!     associatedData        OCTET STRING,
//!     cipherText            OCTET STRING,
//!     authenticationTag     OCTET STRING (SIZE (16))
//! }
//! ```

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use {
    der::{Decode, Encode, Sequence, asn1::OctetStringRef},
    rand::RngCore,
    zeroize::Zeroizing,
};

use crate::{
    error::{Result, SafeError},
    traits::{LockedBody, SafeTransform, UnlockedBody},
};

/// Version number for the ChaCha20-Poly1305 transform.
pub const VERSION: u32 = 1;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Largest plaintext ChaCha20-Poly1305 accepts under a single nonce.
pub const MAX_PLAINTEXT_LEN: u64 = (1 << 38) - 64;

/// Largest content length the DER codec can frame (`der::Length::MAX`).
const DER_MAX_LEN: u64 = 0x0FFF_FFFF;

/// Upper bound on everything the version-1 envelope adds around plaintext
/// and associated data: outer and inner headers, version, IV and tag. The
/// codec bounds the full encoding, headers included.
const ENVELOPE_OVERHEAD: u64 = 128;

/// Largest `plaintext.len() + associated_data.len()` that still fits in an
/// encodable version-1 envelope. Tighter than [`MAX_PLAINTEXT_LEN`].
pub const MAX_PAYLOAD_LEN: u64 = DER_MAX_LEN - ENVELOPE_OVERHEAD;

#[derive(Sequence)]
struct BodyDer<'a> {
    initialization_vector: OctetStringRef<'a>,
    associated_data: OctetStringRef<'a>,
    cipher_text: OctetStringRef<'a>,
    authentication_tag: OctetStringRef<'a>,
}

/// Decoded version-1 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyV1 {
    pub initialization_vector: [u8; NONCE_LEN],
    pub associated_data: Vec<u8>,
    pub cipher_text: Vec<u8>,
    pub authentication_tag: [u8; TAG_LEN],
}

impl BodyV1 {
    /// Canonical DER encoding of the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        BodyDer {
            initialization_vector: octets(&self.initialization_vector)?,
            associated_data: octets(&self.associated_data)?,
            cipher_text: octets(&self.cipher_text)?,
            authentication_tag: octets(&self.authentication_tag)?,
        }
        .to_der()
        .map_err(|e| SafeError::Encoding(e.to_string()))
    }

    /// Parse a DER body, enforcing the fixed IV and tag widths.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let der = BodyDer::from_der(bytes).map_err(SafeError::malformed)?;

        let initialization_vector = der
            .initialization_vector
            .as_bytes()
            .try_into()
            .map_err(|_| {
                SafeError::malformed(format!(
                    "initialization vector must be {NONCE_LEN} bytes, got {}",
                    der.initialization_vector.as_bytes().len()
                ))
            })?;
        let authentication_tag = der
            .authentication_tag
            .as_bytes()
            .try_into()
            .map_err(|_| {
                SafeError::malformed(format!(
                    "authentication tag must be {TAG_LEN} bytes, got {}",
                    der.authentication_tag.as_bytes().len()
                ))
            })?;

        Ok(Self {
            initialization_vector,
            associated_data: der.associated_data.as_bytes().to_vec(),
            cipher_text: der.cipher_text.as_bytes().to_vec(),
            authentication_tag,
        })
    }
}

fn octets(bytes: &[u8]) -> Result<OctetStringRef<'_>> {
    OctetStringRef::new(bytes).map_err(|e| SafeError::Encoding(e.to_string()))
}

/// ChaCha20-Poly1305 transform with a random 256-bit key and a random
/// 96-bit nonce per lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305Transform;

impl SafeTransform for ChaCha20Poly1305Transform {
    fn version(&self) -> u32 {
        VERSION
    }

    fn name(&self) -> &'static str {
        "chacha20-poly1305"
    }

    fn lock(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<LockedBody> {
        check_lengths(plaintext.len() as u64, associated_data.len() as u64)?;

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        rand::rng().fill_bytes(key.as_mut_slice());
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let body = seal(&key, &nonce, plaintext, associated_data)?.encode()?;

        Ok(LockedBody {
            body,
            key: Zeroizing::new(key.to_vec()),
        })
    }

    #[allow(deprecated)]
    fn unlock(&self, body: &[u8], key: &[u8]) -> Result<UnlockedBody> {
        if key.len() != KEY_LEN {
            return Err(SafeError::invalid_input(
                "key",
                format!("expected {KEY_LEN} bytes, got {}", key.len()),
            ));
        }

        let BodyV1 {
            initialization_vector,
            associated_data,
            cipher_text,
            authentication_tag,
        } = BodyV1::decode(body)?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
        let mut buffer = cipher_text;
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&initialization_vector),
                authenticated_context(&associated_data).unwrap_or_default(),
                &mut buffer,
                Tag::from_slice(&authentication_tag),
            )
            .map_err(|_| SafeError::AuthenticationFailed)?;

        Ok(UnlockedBody {
            plaintext: buffer,
            associated_data,
        })
    }
}

/// Encrypt under an explicit key and nonce.
///
/// Deterministic; [`ChaCha20Poly1305Transform::lock`] feeds it fresh random
/// values. Never call it twice with the same key and nonce.
#[allow(deprecated)]
pub(crate) fn seal(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<BodyV1> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(
            Nonce::from_slice(nonce),
            authenticated_context(associated_data).unwrap_or_default(),
            &mut buffer,
        )
        .map_err(|_| SafeError::PlaintextTooLarge {
            len: plaintext.len() as u64,
            max: MAX_PLAINTEXT_LEN,
        })?;

    let mut authentication_tag = [0u8; TAG_LEN];
    authentication_tag.copy_from_slice(&tag);

    Ok(BodyV1 {
        initialization_vector: *nonce,
        associated_data: associated_data.to_vec(),
        cipher_text: buffer,
        authentication_tag,
    })
}

/// Associated data bound into the tag.
///
/// Empty associated data is omitted from the authentication step instead of
/// being bound as a zero-length string. Under RFC 8439 padding both give the
/// same tag; envelopes from other implementations rely on the omission.
fn authenticated_context(associated_data: &[u8]) -> Option<&[u8]> {
    (!associated_data.is_empty()).then_some(associated_data)
}

/// Size limits, checked before any encryption happens.
///
/// Associated data shares the envelope's length budget with the plaintext,
/// so the plaintext ceiling shrinks as it grows.
fn check_lengths(plaintext_len: u64, associated_data_len: u64) -> Result<()> {
    let Some(room) = MAX_PAYLOAD_LEN.checked_sub(associated_data_len) else {
        return Err(SafeError::invalid_input(
            "additional_public_data",
            format!("cannot be longer than {MAX_PAYLOAD_LEN} bytes, got {associated_data_len}"),
        ));
    };
    let max = room.min(MAX_PLAINTEXT_LEN);
    if plaintext_len > max {
        return Err(SafeError::PlaintextTooLarge {
            len: plaintext_len,
            max,
        });
    }
    Ok(())
}
