//! Versioned authenticated encryption of a secret bound to public data.
//!
//! [`lock_safe`] encrypts a secret with a fresh random key, authenticates an
//! optional piece of public data alongside it, and returns a self-describing
//! DER envelope plus the key. [`unlock_safe`] reads the envelope's version,
//! dispatches to the matching [`SafeTransform`] and returns both the secret
//! and the public data. Version 1 is ChaCha20-Poly1305.

pub mod chacha20;
pub mod config;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod safe;
pub mod traits;

pub use {
    chacha20::ChaCha20Poly1305Transform,
    config::{SafeConfig, load_config},
    encoding::{Encoding, SafeInput, SafeOutput},
    envelope::Envelope,
    error::SafeError,
    registry::Registry,
    safe::{LockSafeResult, Safe, UnlockSafeResult, lock_safe, unlock_safe},
    traits::{LockedBody, SafeTransform, UnlockedBody},
};
