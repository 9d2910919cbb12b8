//! Metric name and label definitions.

/// Lock / unlock metrics
pub mod safe {
    /// Total number of safes locked, by version
    pub const LOCKS_TOTAL: &str = "aeadsafe_locks_total";
    /// Total number of safes unlocked
    pub const UNLOCKS_TOTAL: &str = "aeadsafe_unlocks_total";
    /// Unlock failures, by error type
    pub const UNLOCK_FAILURES_TOTAL: &str = "aeadsafe_unlock_failures_total";
    /// Size of locked plaintexts in bytes
    pub const LOCK_BYTES: &str = "aeadsafe_lock_bytes";
}

pub mod labels {
    pub const VERSION: &str = "version";
    pub const ERROR_TYPE: &str = "error_type";
}

/// Standard histogram buckets for different metric types
pub mod buckets {
    use once_cell::sync::Lazy;

    /// Payload size buckets (in bytes)
    /// Covers 16B to 256MB
    pub static PAYLOAD_SIZE: Lazy<Vec<f64>> = Lazy::new(|| {
        vec![
            16.0,          // 16B
            256.0,         // 256B
            1024.0,        // 1KB
            16384.0,       // 16KB
            131072.0,      // 128KB
            1048576.0,     // 1MB
            16777216.0,    // 16MB
            268435456.0,   // 256MB
        ]
    });
}
