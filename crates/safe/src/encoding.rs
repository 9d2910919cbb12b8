//! Carrier encodings for safe inputs and outputs.

use std::{borrow::Cow, fmt, str::FromStr};

use {
    base64::Engine,
    serde::{Deserialize, Serialize},
    zeroize::Zeroizing,
};

use crate::error::{Result, SafeError};

/// Representation of a byte string handed to or returned from the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw bytes.
    Binary,
    /// Standard base64 with padding.
    Base64,
    /// Lowercase hexadecimal.
    Hex,
    /// UTF-8 text.
    #[serde(rename = "string")]
    Utf8,
}

/// Allowed encodings for the locked safe returned by lock.
pub const LOCKED_SAFE_ENCODINGS: &[Encoding] = &[Encoding::Binary, Encoding::Base64, Encoding::Hex];

/// Allowed encodings for the key returned by lock. Keys are not text.
pub const KEY_ENCODINGS: &[Encoding] = &[Encoding::Binary, Encoding::Base64, Encoding::Hex];

/// Allowed encodings for the secret and public data returned by unlock.
pub const UNLOCKED_SAFE_ENCODINGS: &[Encoding] = &[Encoding::Binary, Encoding::Utf8];

const ALL_ENCODINGS: &[Encoding] = &[
    Encoding::Binary,
    Encoding::Base64,
    Encoding::Hex,
    Encoding::Utf8,
];

impl Encoding {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::Hex => "hex",
            Self::Utf8 => "string",
        }
    }

    /// Encode raw bytes into this representation.
    ///
    /// `name` labels the value in errors.
    pub fn encode(self, bytes: Vec<u8>, name: &'static str) -> Result<SafeOutput> {
        Ok(match self {
            Self::Binary => SafeOutput::Binary(bytes),
            Self::Base64 => SafeOutput::Base64(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Self::Hex => SafeOutput::Hex(hex::encode(bytes)),
            Self::Utf8 => SafeOutput::Utf8(
                String::from_utf8(bytes)
                    .map_err(|e| SafeError::invalid_input(name, format!("not valid UTF-8: {e}")))?,
            ),
        })
    }

    /// Encode borrowed key material. The only copy made is the returned one.
    pub fn encode_secret(self, bytes: &[u8], name: &'static str) -> Result<SafeOutput> {
        match self {
            Self::Base64 => Ok(SafeOutput::Base64(
                base64::engine::general_purpose::STANDARD.encode(bytes),
            )),
            Self::Hex => Ok(SafeOutput::Hex(hex::encode(bytes))),
            Self::Binary | Self::Utf8 => self.encode(bytes.to_vec(), name),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = SafeError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_ENCODINGS
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| SafeError::InvalidEncoding {
                name: "encoding",
                requested: s.to_string(),
                allowed: join(ALL_ENCODINGS),
            })
    }
}

/// Check that `value` is one of `allowed`.
pub fn validate_encoding(value: Encoding, allowed: &[Encoding], name: &'static str) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(SafeError::InvalidEncoding {
        name,
        requested: value.to_string(),
        allowed: join(allowed),
    })
}

fn join(encodings: &[Encoding]) -> String {
    encodings
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A byte string passed to the facade.
///
/// Plain text means different things on each side: on lock it is the UTF-8
/// payload itself, on unlock (key and envelope) it is a base64 carrier, since
/// neither is ever meaningful as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeInput<'a> {
    Binary(&'a [u8]),
    Text(&'a str),
    Base64(&'a str),
    Hex(&'a str),
}

impl<'a> SafeInput<'a> {
    /// Payload bytes for lock: text is taken as UTF-8.
    pub fn payload_bytes(&self, name: &'static str) -> Result<Cow<'a, [u8]>> {
        match *self {
            Self::Binary(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Base64(text) => decode_base64(text, name),
            Self::Hex(text) => decode_hex(text, name),
        }
    }

    /// Like [`carrier_bytes`](Self::carrier_bytes), for key material: the
    /// decoded bytes are wiped on drop.
    pub fn secret_carrier_bytes(&self, name: &'static str) -> Result<Zeroizing<Vec<u8>>> {
        // into_owned moves decoded buffers, so no unwiped copy is left behind.
        Ok(Zeroizing::new(self.carrier_bytes(name)?.into_owned()))
    }

    /// Binary bytes for unlock: text is a base64 carrier.
    pub fn carrier_bytes(&self, name: &'static str) -> Result<Cow<'a, [u8]>> {
        match *self {
            Self::Binary(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Text(text) | Self::Base64(text) => decode_base64(text, name),
            Self::Hex(text) => decode_hex(text, name),
        }
    }
}

fn decode_base64<'a>(text: &str, name: &'static str) -> Result<Cow<'a, [u8]>> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map(Cow::Owned)
        .map_err(|e| SafeError::invalid_input(name, format!("base64 decode error: {e}")))
}

fn decode_hex<'a>(text: &str, name: &'static str) -> Result<Cow<'a, [u8]>> {
    hex::decode(text.trim())
        .map(Cow::Owned)
        .map_err(|e| SafeError::invalid_input(name, format!("hex decode error: {e}")))
}

impl<'a> From<&'a [u8]> for SafeInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Binary(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for SafeInput<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Binary(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for SafeInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl<'a> From<&'a str> for SafeInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for SafeInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a SafeOutput> for SafeInput<'a> {
    fn from(output: &'a SafeOutput) -> Self {
        match output {
            SafeOutput::Binary(bytes) => Self::Binary(bytes),
            SafeOutput::Base64(text) => Self::Base64(text),
            SafeOutput::Hex(text) => Self::Hex(text),
            SafeOutput::Utf8(text) => Self::Text(text),
        }
    }
}

/// A byte string returned from the facade, in the requested encoding.
#[derive(Clone, PartialEq, Eq)]
pub enum SafeOutput {
    Binary(Vec<u8>),
    Base64(String),
    Hex(String),
    Utf8(String),
}

impl SafeOutput {
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Binary(_) => Encoding::Binary,
            Self::Base64(_) => Encoding::Base64,
            Self::Hex(_) => Encoding::Hex,
            Self::Utf8(_) => Encoding::Utf8,
        }
    }

    /// The text form, if this output is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Binary(_) => None,
            Self::Base64(text) | Self::Hex(text) | Self::Utf8(text) => Some(text),
        }
    }

    /// Bytes of the representation as returned (carrier text for base64/hex).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Base64(text) | Self::Hex(text) | Self::Utf8(text) => text.as_bytes(),
        }
    }

    /// Undo the carrier encoding and return the underlying bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Binary(bytes) => Ok(bytes.clone()),
            Self::Base64(text) => decode_base64(text, "output").map(Cow::into_owned),
            Self::Hex(text) => decode_hex(text, "output").map(Cow::into_owned),
            Self::Utf8(text) => Ok(text.as_bytes().to_vec()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

// Outputs may hold keys or secrets; only the shape is printed.
impl fmt::Debug for SafeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeOutput")
            .field("encoding", &self.encoding())
            .field("len", &self.len())
            .finish()
    }
}
