//! Lock / unlock facade.

#[cfg(feature = "metrics")]
use aeadsafe_metrics::{counter, histogram, labels, safe as safe_metrics};

use crate::{
    config::SafeConfig,
    encoding::{
        Encoding, KEY_ENCODINGS, LOCKED_SAFE_ENCODINGS, SafeInput, SafeOutput,
        UNLOCKED_SAFE_ENCODINGS, validate_encoding,
    },
    envelope,
    error::Result,
    registry::Registry,
};

/// Output of a lock: the envelope and the key that opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSafeResult {
    pub locked_safe: SafeOutput,
    pub key: SafeOutput,
}

/// Output of an unlock: the decrypted secret and the authenticated public data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockSafeResult {
    pub secret_data: SafeOutput,
    pub additional_public_data: SafeOutput,
}

/// Facade over a [`Registry`].
///
/// [`Safe::new`] uses the process-wide registry. Encodings passed explicitly
/// to [`lock_safe`](Self::lock_safe) / [`unlock_safe`](Self::unlock_safe)
/// override the configured defaults used by [`lock`](Self::lock) /
/// [`unlock`](Self::unlock).
#[derive(Debug, Clone)]
pub struct Safe<'r> {
    registry: &'r Registry,
    config: SafeConfig,
}

impl Safe<'static> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Registry::global())
    }
}

impl Default for Safe<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Safe<'r> {
    #[must_use]
    pub fn with_registry(registry: &'r Registry) -> Self {
        Self {
            registry,
            config: SafeConfig::default(),
        }
    }

    /// Replace the default encodings. Fails if any of them is not allowed.
    pub fn with_config(mut self, config: SafeConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn config(&self) -> &SafeConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Lock with the configured encodings.
    pub fn lock<'a>(
        &self,
        secret_data: impl Into<SafeInput<'a>>,
        additional_public_data: impl Into<SafeInput<'a>>,
    ) -> Result<LockSafeResult> {
        self.lock_safe(
            secret_data,
            additional_public_data,
            self.config.locked_safe_encoding,
            self.config.key_encoding,
        )
    }

    /// Unlock with the configured output encoding.
    pub fn unlock<'a>(
        &self,
        key: impl Into<SafeInput<'a>>,
        locked_safe: impl Into<SafeInput<'a>>,
    ) -> Result<UnlockSafeResult> {
        self.unlock_safe(key, locked_safe, self.config.unlocked_safe_encoding)
    }

    /// Encrypt `secret_data` and authenticate `additional_public_data` with
    /// the latest registered version.
    pub fn lock_safe<'a>(
        &self,
        secret_data: impl Into<SafeInput<'a>>,
        additional_public_data: impl Into<SafeInput<'a>>,
        locked_safe_encoding: Encoding,
        key_encoding: Encoding,
    ) -> Result<LockSafeResult> {
        let plaintext = secret_data.into().payload_bytes("secret_data")?;
        let associated_data = additional_public_data
            .into()
            .payload_bytes("additional_public_data")?;
        validate_encoding(
            locked_safe_encoding,
            LOCKED_SAFE_ENCODINGS,
            "locked_safe_encoding",
        )?;
        validate_encoding(key_encoding, KEY_ENCODINGS, "key_encoding")?;

        let (version, transform) = self.registry.latest()?;
        let locked = transform.lock(&plaintext, &associated_data)?;
        let wrapped = envelope::wrap(version, &locked.body)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            version,
            algorithm = transform.name(),
            plaintext_len = plaintext.len(),
            associated_data_len = associated_data.len(),
            envelope_len = wrapped.len(),
            %locked_safe_encoding,
            %key_encoding,
            "safe locked"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(safe_metrics::LOCKS_TOTAL, labels::VERSION => version.to_string()).increment(1);
            histogram!(safe_metrics::LOCK_BYTES).record(plaintext.len() as f64);
        }

        Ok(LockSafeResult {
            locked_safe: locked_safe_encoding.encode(wrapped, "locked_safe")?,
            key: key_encoding.encode_secret(&locked.key, "key")?,
        })
    }

    /// Open an envelope with `key`, dispatching on the envelope's version.
    pub fn unlock_safe<'a>(
        &self,
        key: impl Into<SafeInput<'a>>,
        locked_safe: impl Into<SafeInput<'a>>,
        unlocked_safe_encoding: Encoding,
    ) -> Result<UnlockSafeResult> {
        let result = self.unlock_inner(key.into(), locked_safe.into(), unlocked_safe_encoding);

        match &result {
            Ok(_) => {
                #[cfg(feature = "metrics")]
                counter!(safe_metrics::UNLOCKS_TOTAL).increment(1);
            },
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error_type = e.kind(), "safe unlock failed");

                #[cfg(feature = "metrics")]
                counter!(safe_metrics::UNLOCK_FAILURES_TOTAL, labels::ERROR_TYPE => e.kind())
                    .increment(1);

                #[cfg(not(any(feature = "tracing", feature = "metrics")))]
                let _ = e;
            },
        }

        result
    }

    fn unlock_inner(
        &self,
        key: SafeInput<'_>,
        locked_safe: SafeInput<'_>,
        unlocked_safe_encoding: Encoding,
    ) -> Result<UnlockSafeResult> {
        validate_encoding(
            unlocked_safe_encoding,
            UNLOCKED_SAFE_ENCODINGS,
            "unlocked_safe_encoding",
        )?;
        let key = key.secret_carrier_bytes("key")?;
        let wrapped = locked_safe.carrier_bytes("locked_safe")?;

        let envelope = envelope::unwrap(&wrapped)?;
        let transform = self.registry.lookup(envelope.version)?;
        let unlocked = transform.unlock(&envelope.body, &key)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            version = envelope.version,
            algorithm = transform.name(),
            plaintext_len = unlocked.plaintext.len(),
            associated_data_len = unlocked.associated_data.len(),
            "safe unlocked"
        );

        Ok(UnlockSafeResult {
            secret_data: unlocked_safe_encoding.encode(unlocked.plaintext, "secret_data")?,
            additional_public_data: unlocked_safe_encoding
                .encode(unlocked.associated_data, "additional_public_data")?,
        })
    }
}

/// Lock with the process-wide registry.
///
/// ```
/// use aeadsafe::{Encoding, lock_safe, unlock_safe};
///
/// let locked = lock_safe("secret data", "additional public data", Encoding::Base64, Encoding::Base64)?;
/// let unlocked = unlock_safe(&locked.key, &locked.locked_safe, Encoding::Utf8)?;
/// assert_eq!(unlocked.secret_data.as_str(), Some("secret data"));
/// assert_eq!(unlocked.additional_public_data.as_str(), Some("additional public data"));
/// # Ok::<(), aeadsafe::SafeError>(())
/// ```
pub fn lock_safe<'a>(
    secret_data: impl Into<SafeInput<'a>>,
    additional_public_data: impl Into<SafeInput<'a>>,
    locked_safe_encoding: Encoding,
    key_encoding: Encoding,
) -> Result<LockSafeResult> {
    Safe::new().lock_safe(
        secret_data,
        additional_public_data,
        locked_safe_encoding,
        key_encoding,
    )
}

/// Unlock with the process-wide registry.
pub fn unlock_safe<'a>(
    key: impl Into<SafeInput<'a>>,
    locked_safe: impl Into<SafeInput<'a>>,
    unlocked_safe_encoding: Encoding,
) -> Result<UnlockSafeResult> {
    Safe::new().unlock_safe(key, locked_safe, unlocked_safe_encoding)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            chacha20::{BodyV1, KEY_LEN, MAX_PAYLOAD_LEN, NONCE_LEN, TAG_LEN},
            error::SafeError,
            traits::{LockedBody, SafeTransform, UnlockedBody},
        },
        rstest::rstest,
        zeroize::Zeroizing,
    };

    const SECRET: &str = "secret data";
    const PUBLIC: &str = "additional public data";

    fn lock_binary(secret: &[u8], public: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let locked = lock_safe(secret, public, Encoding::Binary, Encoding::Binary).unwrap();
        (locked.locked_safe.decode().unwrap(), locked.key.decode().unwrap())
    }

    #[test]
    fn round_trip_strings() {
        let locked = lock_safe(SECRET, PUBLIC, Encoding::Binary, Encoding::Binary).unwrap();
        let unlocked = unlock_safe(&locked.key, &locked.locked_safe, Encoding::Utf8).unwrap();
        assert_eq!(unlocked.secret_data, SafeOutput::Utf8(SECRET.into()));
        assert_eq!(unlocked.additional_public_data, SafeOutput::Utf8(PUBLIC.into()));
    }

    #[test]
    fn round_trip_binary() {
        let secret = [0u8, 159, 146, 150, 255];
        let (envelope, key) = lock_binary(&secret, b"\x00\x01");
        let unlocked = unlock_safe(&key, &envelope, Encoding::Binary).unwrap();
        assert_eq!(unlocked.secret_data, SafeOutput::Binary(secret.to_vec()));
        assert_eq!(unlocked.additional_public_data, SafeOutput::Binary(vec![0, 1]));
    }

    #[test]
    fn envelope_structure() {
        let (envelope, key) = lock_binary(SECRET.as_bytes(), PUBLIC.as_bytes());
        assert_eq!(key.len(), KEY_LEN);

        let outer = envelope::unwrap(&envelope).unwrap();
        assert_eq!(outer.version, 1);

        let body = BodyV1::decode(&outer.body).unwrap();
        assert_eq!(body.initialization_vector.len(), NONCE_LEN);
        assert_eq!(body.authentication_tag.len(), TAG_LEN);
        assert_eq!(body.associated_data, PUBLIC.as_bytes());
        assert_eq!(body.cipher_text.len(), SECRET.len());
    }

    #[rstest]
    #[case::empty_secret("", PUBLIC)]
    #[case::empty_public(SECRET, "")]
    #[case::both_empty("", "")]
    fn empty_sides_round_trip(#[case] secret: &str, #[case] public: &str) {
        let locked = lock_safe(secret, public, Encoding::Binary, Encoding::Binary).unwrap();
        let unlocked = unlock_safe(&locked.key, &locked.locked_safe, Encoding::Binary).unwrap();
        assert_eq!(unlocked.secret_data, SafeOutput::Binary(secret.as_bytes().to_vec()));
        assert_eq!(
            unlocked.additional_public_data,
            SafeOutput::Binary(public.as_bytes().to_vec())
        );
    }

    #[rstest]
    #[case(Encoding::Binary, Encoding::Binary)]
    #[case(Encoding::Base64, Encoding::Binary)]
    #[case(Encoding::Binary, Encoding::Base64)]
    #[case(Encoding::Base64, Encoding::Base64)]
    #[case(Encoding::Hex, Encoding::Hex)]
    fn carrier_encodings_are_equivalent(#[case] locked_enc: Encoding, #[case] key_enc: Encoding) {
        let locked = lock_safe(SECRET, PUBLIC, locked_enc, key_enc).unwrap();
        assert_eq!(locked.locked_safe.encoding(), locked_enc);
        assert_eq!(locked.key.encoding(), key_enc);

        // Directly, through the encoded carriers.
        let direct = unlock_safe(&locked.key, &locked.locked_safe, Encoding::Utf8).unwrap();
        // After decoding the carriers back to binary.
        let key = locked.key.decode().unwrap();
        let envelope = locked.locked_safe.decode().unwrap();
        let decoded = unlock_safe(&key, &envelope, Encoding::Utf8).unwrap();

        assert_eq!(direct, decoded);
        assert_eq!(direct.secret_data.as_str(), Some(SECRET));
    }

    #[test]
    fn plain_text_carrier_is_base64_on_unlock() {
        let locked = lock_safe(SECRET, PUBLIC, Encoding::Base64, Encoding::Base64).unwrap();
        let key = locked.key.as_str().unwrap().to_string();
        let envelope = locked.locked_safe.as_str().unwrap().to_string();
        let unlocked = unlock_safe(&key, &envelope, Encoding::Utf8).unwrap();
        assert_eq!(unlocked.secret_data.as_str(), Some(SECRET));
    }

    #[test]
    fn payload_carriers_on_lock() {
        let locked = lock_safe(
            SafeInput::Hex("736563726574"),
            SafeInput::Base64("cHVibGlj"),
            Encoding::Binary,
            Encoding::Binary,
        )
        .unwrap();
        let unlocked = unlock_safe(&locked.key, &locked.locked_safe, Encoding::Utf8).unwrap();
        assert_eq!(unlocked.secret_data.as_str(), Some("secret"));
        assert_eq!(unlocked.additional_public_data.as_str(), Some("public"));
    }

    #[rstest]
    #[case::locked_as_string(Encoding::Utf8, Encoding::Binary, "locked_safe_encoding")]
    #[case::key_as_string(Encoding::Binary, Encoding::Utf8, "key_encoding")]
    fn lock_rejects_text_outputs(
        #[case] locked_enc: Encoding,
        #[case] key_enc: Encoding,
        #[case] expected: &str,
    ) {
        let err = lock_safe(SECRET, PUBLIC, locked_enc, key_enc).unwrap_err();
        assert!(matches!(err, SafeError::InvalidEncoding { name, .. } if name == expected));
    }

    #[rstest]
    #[case(Encoding::Base64)]
    #[case(Encoding::Hex)]
    fn unlock_rejects_carrier_outputs(#[case] encoding: Encoding) {
        let (envelope, key) = lock_binary(b"s", b"p");
        let err = unlock_safe(&key, &envelope, encoding).unwrap_err();
        assert!(matches!(err, SafeError::InvalidEncoding {
            name: "unlocked_safe_encoding",
            ..
        }));
    }

    #[test]
    fn non_utf8_secret_as_string_fails() {
        let (envelope, key) = lock_binary(&[0xFF, 0xFE], b"p");
        let err = unlock_safe(&key, &envelope, Encoding::Utf8).unwrap_err();
        assert!(matches!(err, SafeError::InvalidInput {
            name: "secret_data",
            ..
        }));
    }

    #[test]
    fn bad_key_carrier_is_invalid_input() {
        let (envelope, _) = lock_binary(b"s", b"p");
        let err = unlock_safe("%%%", &envelope, Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::InvalidInput { name: "key", .. }));
    }

    #[test]
    fn garbage_envelope_is_malformed() {
        let key = [0u8; KEY_LEN];
        let err = unlock_safe(&key, b"\x30\x03\x02\x01", Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::MalformedEnvelope(_)));
    }

    #[test]
    fn unknown_version_regardless_of_body() {
        let key = [0u8; KEY_LEN];
        for body in [&b""[..], &b"not a body at all"[..]] {
            let envelope = envelope::wrap(2, body).unwrap();
            let err = unlock_safe(&key, &envelope, Encoding::Binary).unwrap_err();
            assert!(matches!(err, SafeError::UnknownVersion(ref v) if v == "2"));
        }

        let (good, _) = lock_binary(b"s", b"p");
        let body = envelope::unwrap(&good).unwrap().body;
        let envelope = envelope::wrap(0, &body).unwrap();
        let err = unlock_safe(&key, &envelope, Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::UnknownVersion(ref v) if v == "0"));
    }

    #[test]
    fn version_wider_than_u32_is_unknown() {
        // SEQUENCE { INTEGER 2^32, OCTET STRING "" }
        let envelope = [0x30, 0x09, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00];
        let err = unlock_safe(&[0u8; KEY_LEN], &envelope, Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::UnknownVersion(ref v) if v == "4294967296"));
    }

    #[test]
    fn bad_input_reported_before_bad_encoding() {
        let err = lock_safe(
            SafeInput::Base64("***"),
            PUBLIC,
            Encoding::Utf8,
            Encoding::Utf8,
        )
        .unwrap_err();
        assert!(matches!(err, SafeError::InvalidInput {
            name: "secret_data",
            ..
        }));
    }

    #[test]
    fn payload_beyond_envelope_ceiling_is_rejected_before_encryption() {
        // Zeroed allocation; the size check fires before any byte is read.
        let secret = vec![0u8; MAX_PAYLOAD_LEN as usize + 1];
        let err = lock_safe(&secret, "", Encoding::Binary, Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::PlaintextTooLarge {
            max: MAX_PAYLOAD_LEN,
            ..
        }));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let (envelope, mut key) = lock_binary(SECRET.as_bytes(), PUBLIC.as_bytes());
        key[0] ^= 0x01;
        let err = unlock_safe(&key, &envelope, Encoding::Binary).unwrap_err();
        assert!(matches!(err, SafeError::AuthenticationFailed));
    }

    #[test]
    fn empty_registry_cannot_lock() {
        let registry = Registry::empty();
        let err = Safe::with_registry(&registry)
            .lock(SECRET, PUBLIC)
            .unwrap_err();
        assert!(matches!(err, SafeError::NoRegisteredVersion));
    }

    /// Reverses bytes; enough to tell which transform handled a call.
    struct Reverse;

    impl SafeTransform for Reverse {
        fn version(&self) -> u32 {
            2
        }

        fn name(&self) -> &'static str {
            "reverse"
        }

        fn lock(&self, plaintext: &[u8], _associated_data: &[u8]) -> Result<LockedBody> {
            Ok(LockedBody {
                body: plaintext.iter().rev().copied().collect(),
                key: Zeroizing::new(vec![0xEE]),
            })
        }

        fn unlock(&self, body: &[u8], key: &[u8]) -> Result<UnlockedBody> {
            if key != [0xEE] {
                return Err(SafeError::AuthenticationFailed);
            }
            Ok(UnlockedBody {
                plaintext: body.iter().rev().copied().collect(),
                associated_data: Vec::new(),
            })
        }
    }

    #[test]
    fn dispatch_by_envelope_version() {
        let registry = Registry::from_transforms([
            Box::new(crate::ChaCha20Poly1305Transform) as Box<dyn SafeTransform>,
            Box::new(Reverse),
        ])
        .unwrap();
        let safe = Safe::with_registry(&registry);

        // New envelopes use the highest version.
        let v2 = safe.lock("abc", "").unwrap();
        let v2_bytes = v2.locked_safe.decode().unwrap();
        assert_eq!(envelope::unwrap(&v2_bytes).unwrap().version, 2);
        let opened = safe.unlock_safe(&v2.key, &v2.locked_safe, Encoding::Utf8).unwrap();
        assert_eq!(opened.secret_data.as_str(), Some("abc"));

        // Version 1 envelopes still open through the same facade.
        let v1 = lock_safe(SECRET, PUBLIC, Encoding::Binary, Encoding::Binary).unwrap();
        let opened = safe.unlock_safe(&v1.key, &v1.locked_safe, Encoding::Utf8).unwrap();
        assert_eq!(opened.secret_data.as_str(), Some(SECRET));
    }

    #[test]
    fn configured_defaults_apply() {
        let config = SafeConfig {
            locked_safe_encoding: Encoding::Base64,
            key_encoding: Encoding::Hex,
            unlocked_safe_encoding: Encoding::Utf8,
        };
        let safe = Safe::new().with_config(config).unwrap();
        let locked = safe.lock(SECRET, PUBLIC).unwrap();
        assert_eq!(locked.locked_safe.encoding(), Encoding::Base64);
        assert_eq!(locked.key.encoding(), Encoding::Hex);
        assert_eq!(locked.key.len(), KEY_LEN * 2);

        let unlocked = safe.unlock(&locked.key, &locked.locked_safe).unwrap();
        assert_eq!(unlocked.additional_public_data.as_str(), Some(PUBLIC));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SafeConfig {
            key_encoding: Encoding::Utf8,
            ..SafeConfig::default()
        };
        assert!(matches!(
            Safe::new().with_config(config),
            Err(SafeError::InvalidEncoding { .. })
        ));
    }
}
