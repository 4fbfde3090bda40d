//! Constants for the game presets
//!
//! This module contains all hardcoded values used in preset definitions.
//! Centralizing these values makes it easier to maintain and update presets.

/// Plaintext modulus used by every preset. Prime and `1 mod 2^16`, so packed
/// encoding works for any ring degree up to 32768.
pub const PLAINTEXT_MODULUS: u64 = 65537;

/// Number of coordinates in a move vector (x, y)
pub const DEFAULT_DIMENSIONS: usize = 2;

/// Insecure preset constants (degree 512) - DO NOT USE IN PRODUCTION
pub mod insecure_512 {
    pub const DEGREE: usize = 512;
    pub const MODULI: &[u64] = &[0xffffee001, 0xffffc4001];
    pub const LAMBDA: usize = 2;
}

/// Secure preset constants (degree 4096)
pub mod secure_4096 {
    pub const DEGREE: usize = 4096;
    pub const MODULI: &[u64] = &[0xffffee001, 0xffffc4001, 0x1ffffe0001];
    pub const LAMBDA: usize = 128;
}

/// Default values for BFV parameters
pub mod defaults {
    /// Default variance for BFV parameters when not explicitly set
    pub const VARIANCE: usize = 10;
    /// Seed for the common random polynomial when none is configured
    pub const CRP_SEED: [u8; 32] = [0u8; 32];
}
