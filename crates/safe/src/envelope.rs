//! Outer envelope codec.
//!
//! Wire layout (ASN.1 DER):
//!
//! ```text
//! SafeEnvelope ::= SEQUENCE {
//!     version  INTEGER,
//!     body     OCTET STRING
//! }
//! ```
//!
//! The body is never interpreted here; each [`SafeTransform`](crate::SafeTransform)
//! owns the layout of its own body.
//!
//! `version` may be any non-negative INTEGER on the wire. Values wider than
//! `u32` can never name a registered transform and decode to
//! [`SafeError::UnknownVersion`].

use der::{
    Decode, Encode, Sequence,
    asn1::{OctetStringRef, UintRef},
};

use crate::error::{Result, SafeError};

#[derive(Sequence)]
struct EnvelopeDer<'a> {
    version: u32,
    body: OctetStringRef<'a>,
}

/// Decoding side: the version is read at whatever width it was written.
#[derive(Sequence)]
struct AnyVersionEnvelopeDer<'a> {
    version: UintRef<'a>,
    body: OctetStringRef<'a>,
}

/// A decoded outer envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u32,
    pub body: Vec<u8>,
}

/// Serialize `(version, body)` into canonical DER.
pub fn wrap(version: u32, body: &[u8]) -> Result<Vec<u8>> {
    let body = OctetStringRef::new(body).map_err(|e| SafeError::Encoding(e.to_string()))?;
    EnvelopeDer { version, body }
        .to_der()
        .map_err(|e| SafeError::Encoding(e.to_string()))
}

/// Parse a DER envelope.
///
/// Rejects wrong tags, truncated input, non-minimal lengths or integers,
/// negative versions and trailing bytes with
/// [`SafeError::MalformedEnvelope`].
pub fn unwrap(bytes: &[u8]) -> Result<Envelope> {
    let decoded = AnyVersionEnvelopeDer::from_der(bytes).map_err(SafeError::malformed)?;
    Ok(Envelope {
        version: version_u32(decoded.version.as_bytes())?,
        body: decoded.body.as_bytes().to_vec(),
    })
}

/// `magnitude` is big-endian with leading zeros already stripped.
fn version_u32(magnitude: &[u8]) -> Result<u32> {
    if magnitude.len() <= 4 {
        let mut buf = [0u8; 4];
        buf[4 - magnitude.len()..].copy_from_slice(magnitude);
        return Ok(u32::from_be_bytes(buf));
    }
    if magnitude.len() <= 16 {
        let mut buf = [0u8; 16];
        buf[16 - magnitude.len()..].copy_from_slice(magnitude);
        return Err(SafeError::unknown_version(u128::from_be_bytes(buf)));
    }
    Err(SafeError::unknown_version(format!("0x{}", hex::encode(magnitude))))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_version_one() {
        let bytes = wrap(1, &[0xAA, 0xBB]).unwrap();
        assert_eq!(bytes, vec![0x30, 0x07, 0x02, 0x01, 0x01, 0x04, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn wrap_empty_body() {
        let bytes = wrap(1, &[]).unwrap();
        assert_eq!(bytes, vec![0x30, 0x05, 0x02, 0x01, 0x01, 0x04, 0x00]);
        assert_eq!(unwrap(&bytes).unwrap(), Envelope {
            version: 1,
            body: Vec::new(),
        });
    }

    #[test]
    fn high_bit_version_gets_leading_zero() {
        let bytes = wrap(128, b"x").unwrap();
        assert_eq!(&bytes[2..6], &[0x02, 0x02, 0x00, 0x80]);
        assert_eq!(unwrap(&bytes).unwrap().version, 128);
    }

    #[test]
    fn long_form_length() {
        let body = vec![0x5A; 300];
        let bytes = wrap(3, &body).unwrap();
        assert_eq!(&bytes[..4], &[0x30, 0x82, 0x01, 0x33]);
        assert_eq!(&bytes[7..11], &[0x04, 0x82, 0x01, 0x2C]);
        let envelope = unwrap(&bytes).unwrap();
        assert_eq!(envelope.version, 3);
        assert_eq!(envelope.body, body);
    }

    #[test]
    fn rewrap_is_byte_identical() {
        let bytes = wrap(42, b"opaque body").unwrap();
        let envelope = unwrap(&bytes).unwrap();
        assert_eq!(wrap(envelope.version, &envelope.body).unwrap(), bytes);
    }

    #[test]
    fn trailing_garbage_rejected() {
        let mut bytes = wrap(1, b"body").unwrap();
        bytes.push(0x00);
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }

    #[test]
    fn truncated_rejected() {
        let bytes = wrap(1, b"body").unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(unwrap(&bytes[..len]), Err(SafeError::MalformedEnvelope(_))),
                "prefix of length {len} should not parse"
            );
        }
    }

    #[test]
    fn wrong_outer_tag_rejected() {
        let mut bytes = wrap(1, b"body").unwrap();
        bytes[0] = 0x31; // SET instead of SEQUENCE
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }

    #[test]
    fn swapped_fields_rejected() {
        // SEQUENCE { OCTET STRING, INTEGER }
        let bytes = [0x30, 0x06, 0x04, 0x01, 0xAA, 0x02, 0x01, 0x01];
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }

    #[test]
    fn negative_version_rejected() {
        let bytes = [0x30, 0x05, 0x02, 0x01, 0xFF, 0x04, 0x00];
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }

    #[test]
    fn non_minimal_integer_rejected() {
        let bytes = [0x30, 0x06, 0x02, 0x02, 0x00, 0x01, 0x04, 0x00];
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }

    #[test]
    fn version_beyond_u32_is_unknown() {
        // INTEGER 2^32
        let bytes = [0x30, 0x09, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00];
        assert!(matches!(
            unwrap(&bytes),
            Err(SafeError::UnknownVersion(ref v)) if v == "4294967296"
        ));
    }

    #[test]
    fn version_u32_max_with_leading_zero() {
        let bytes = [0x30, 0x09, 0x02, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x04, 0x00];
        assert_eq!(unwrap(&bytes).unwrap().version, u32::MAX);
        assert_eq!(wrap(u32::MAX, &[]).unwrap(), bytes);
    }

    #[test]
    fn very_wide_version_is_unknown() {
        let mut bytes = vec![0x30, 0x18, 0x02, 0x14, 0x7F];
        bytes.extend([0xAB; 19]);
        bytes.extend([0x04, 0x00]);
        let err = unwrap(&bytes).unwrap_err();
        assert!(matches!(err, SafeError::UnknownVersion(ref v) if v.starts_with("0x7fabab")));
    }

    #[test]
    fn non_minimal_length_rejected() {
        // Body length written in long form although it fits in one byte.
        let bytes = [0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x81, 0x00];
        assert!(matches!(unwrap(&bytes), Err(SafeError::MalformedEnvelope(_))));
    }
}
