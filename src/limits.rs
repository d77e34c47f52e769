//! Size limit constants for input validation

// ============================================================================
// Chain bounds (defaults for `ChainLimits`)
// ============================================================================

/// Minimum length of the serialized inner JWT carried in `jwc` (64 bytes)
/// Anything shorter cannot be a compact JWS with a real signature
pub const DEFAULT_MIN_CHAIN_LENGTH: usize = 64;

/// Maximum length of the serialized inner JWT carried in `jwc` (16000 bytes)
/// Bounds the nested parse before any signature has been checked
pub const DEFAULT_MAX_CHAIN_LENGTH: usize = 16000;

/// Minimum serialized size of the `tjwk` claim (16 bytes)
pub const DEFAULT_MIN_TRUST_JWK_SIZE: usize = 16;

// ============================================================================
// Compact token limits
// ============================================================================

/// Header bytes allowed on top of the embedded chain
/// Covers alg, kid, typ, nonce and the JSON punctuation around them
pub(crate) const MAX_HEADER_OVERHEAD: usize = 4 * 1024;

/// Maximum size for decoded JWT payload JSON (64KB)
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum size for decoded signature bytes (1KB)
/// RSA-8192 signatures are 1024 bytes; Ed25519 and ECDSA are far smaller
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

/// Maximum size for Base64URL-encoded signature string (1.5KB)
pub(crate) const MAX_SIGNATURE_B64_SIZE: usize = 1536;

/// Maximum length for algorithm (alg) field in JWT header (16 bytes)
pub(crate) const MAX_ALG_LENGTH: usize = 16;

/// Maximum length for key ID (kid) field in JWT header (256 bytes)
pub(crate) const MAX_KID_LENGTH: usize = 256;

/// Nonce size mixed into every signed header (8 bytes)
pub(crate) const NONCE_SIZE: usize = 8;

// ============================================================================
// Claim bounds
// ============================================================================

/// Maximum length for claim string values (2048 bytes)
/// Applies to iss, sub, aud entries and jti
pub(crate) const MAX_CLAIM_STRING_LENGTH: usize = 2048;

/// Minimum valid Unix timestamp (1970-01-01 00:00:00 UTC)
pub(crate) const MIN_TIMESTAMP: i64 = 0;

/// Maximum valid Unix timestamp (2100-01-01 00:00:00 UTC)
pub(crate) const MAX_TIMESTAMP: i64 = 4_102_444_800;

/// Default leeway applied to exp, nbf and iat (60 seconds)
pub(crate) const DEFAULT_LEEWAY_SECONDS: u64 = 60;

/// Maximum leeway (300 seconds = 5 minutes)
/// Prevents leeway from effectively disabling expiration checks
pub(crate) const MAX_LEEWAY_SECONDS: u64 = 300;

// ============================================================================
// JWK bounds
// ============================================================================

/// Minimum RSA modulus size accepted in a JWK (2048 bits)
pub(crate) const MIN_RSA_MODULUS_SIZE: usize = 256;

/// Maximum RSA modulus size accepted in a JWK (8192 bits)
pub(crate) const MAX_RSA_MODULUS_SIZE: usize = 1024;

/// Maximum size for any single Base64URL-encoded JWK member (12KB)
pub(crate) const MAX_JWK_MEMBER_SIZE: usize = 12 * 1024;

/// Maximum size for JWK key ID (kid) field (256 bytes)
pub(crate) const MAX_JWK_KID_SIZE: usize = 256;

/// Base64URL length of `n` decoded bytes (no padding)
pub(crate) const fn base64url_len(n: usize) -> usize {
    (n * 4).div_ceil(3)
}

/// Maximum token length for a given header limit
///
/// Derived rather than fixed so that raising the chain bound also raises the
/// outer token bound.
pub(crate) const fn max_token_length(max_header_size: usize) -> usize {
    base64url_len(max_header_size)
        + base64url_len(MAX_DECODED_PAYLOAD_SIZE)
        + MAX_SIGNATURE_B64_SIZE
        + 2
}
