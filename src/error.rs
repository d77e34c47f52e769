//! Errors for chainjwt

use thiserror::Error;

/// chainjwt Errors
///
/// Variants are grouped by the pipeline stage that raises them. Use
/// [`Error::kind`] to branch on the coarse category instead of matching
/// every variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("Invalid JWT format: expected three parts separated by '.'")]
    FormatInvalid,

    #[error("Base64URL decoding failed: {0}")]
    FormatInvalidBase64(String),

    #[error("JSON parsing failed: {0}")]
    FormatInvalidJson(String),

    #[error("Signature Base64URL string too large: {size} bytes (maximum: {max} bytes)")]
    SignatureB64TooLarge { size: usize, max: usize },

    #[error("Missing required header field: {0}")]
    HeaderMissingField(String),

    #[error("Claim '{claim}' has an invalid type: expected {expected}")]
    ClaimTypeInvalid { claim: String, expected: String },

    // ============================================================================
    // Chain Errors
    // ============================================================================
    #[error("Inner JWT is too small: {length} bytes (minimum: {min} bytes)")]
    ChainTooSmall { length: usize, min: usize },

    #[error("Inner JWT is too large: {length} bytes (maximum: {max} bytes)")]
    ChainTooLarge { length: usize, max: usize },

    #[error("Inner trust JWK is too small: {length} bytes (minimum: {min} bytes)")]
    TrustJwkTooSmall { length: usize, min: usize },

    // ============================================================================
    // Algorithm Errors
    // ============================================================================
    #[error("Algorithm '{0}' is not supported")]
    AlgorithmUnsupported(String),

    #[error("The 'none' algorithm is rejected for security reasons (RFC 8725)")]
    AlgorithmNoneRejected,

    // ============================================================================
    // Signature Errors
    // ============================================================================
    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("No key in the key set matches kid '{0}'")]
    KeyNotFound(String),

    // ============================================================================
    // Key Errors
    // ============================================================================
    #[error("Invalid JWK: {0}")]
    JwkInvalid(String),

    #[error("JWK must be a public key")]
    JwkNotPublic,

    #[error("Key type mismatch for algorithm '{algorithm}': expected {expected}, found {found}")]
    KeyTypeMismatch {
        algorithm: String,
        expected: String,
        found: String,
    },

    #[error("Key rejected: {0}")]
    KeyRejected(String),

    // ============================================================================
    // Token Errors
    // ============================================================================
    #[error("Token expired at {expired_at} (now: {now}, leeway: {leeway}s)")]
    TokenExpired {
        expired_at: i64,
        now: i64,
        leeway: u64,
    },

    #[error("Token not valid until {not_before} (now: {now}, leeway: {leeway}s)")]
    TokenNotYetValid {
        not_before: i64,
        now: i64,
        leeway: u64,
    },

    #[error("Token issued in future at {issued_at} (now: {now}, leeway: {leeway}s)")]
    TokenIssuedInFuture {
        issued_at: i64,
        now: i64,
        leeway: u64,
    },

    #[error("Token issuer mismatch: expected '{expected}', found {found:?}")]
    TokenIssuerMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("Token audience mismatch: expected '{expected}', found {found:?}")]
    TokenAudienceMismatch {
        expected: String,
        found: Vec<String>,
    },

    #[error("Required token claim '{0}' is missing")]
    TokenMissingClaim(String),

    #[error("Timestamp out of bounds: {value} (valid range: {min} to {max})")]
    TimestampOutOfBounds { value: i64, min: i64, max: i64 },

    #[error("Integer overflow in timestamp arithmetic")]
    TimestampOverflow,

    // ============================================================================
    // Revocation Errors
    // ============================================================================
    #[error("Inner JWT '{jti}' has been revoked")]
    Revoked { jti: String },

    #[error("Revocation check failed: {0}")]
    RevocationCheckFailed(String),

    // ============================================================================
    // Construction Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("Extra claims must serialize to a JSON object: {0}")]
    ClaimsNotObject(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural violation: segment count, sizes, base64 or JSON decoding
    Malformed,
    /// No key in the supplied key set verifies the signature
    SignatureInvalid,
    /// Temporal, issuer or audience claim check failed
    ClaimInvalid,
    /// A key failed validity checks or is not public-only
    KeyInvalid,
    /// The revocation callback vetoed the inner token
    Revoked,
    /// The caller supplied an unusable configuration
    Configuration,
    /// Token construction failed
    Signing,
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TokenTooLarge { .. }
            | Error::FormatInvalid
            | Error::FormatInvalidBase64(_)
            | Error::FormatInvalidJson(_)
            | Error::SignatureB64TooLarge { .. }
            | Error::HeaderMissingField(_)
            | Error::ClaimTypeInvalid { .. }
            | Error::ChainTooSmall { .. }
            | Error::ChainTooLarge { .. }
            | Error::TrustJwkTooSmall { .. }
            | Error::AlgorithmUnsupported(_)
            | Error::AlgorithmNoneRejected => ErrorKind::Malformed,

            Error::SignatureInvalid | Error::KeyNotFound(_) => ErrorKind::SignatureInvalid,

            Error::JwkInvalid(_)
            | Error::JwkNotPublic
            | Error::KeyTypeMismatch { .. }
            | Error::KeyRejected(_) => ErrorKind::KeyInvalid,

            Error::TokenExpired { .. }
            | Error::TokenNotYetValid { .. }
            | Error::TokenIssuedInFuture { .. }
            | Error::TokenIssuerMismatch { .. }
            | Error::TokenAudienceMismatch { .. }
            | Error::TokenMissingClaim(_)
            | Error::TimestampOutOfBounds { .. }
            | Error::TimestampOverflow => ErrorKind::ClaimInvalid,

            Error::Revoked { .. } | Error::RevocationCheckFailed(_) => ErrorKind::Revoked,

            Error::ConfigurationInvalid(_) => ErrorKind::Configuration,

            Error::ClaimsNotObject(_) | Error::SigningFailed(_) => ErrorKind::Signing,
        }
    }

    /// Shorthand for `kind() == ErrorKind::Malformed`
    pub fn is_malformed(&self) -> bool {
        self.kind() == ErrorKind::Malformed
    }
}

/// Result type alias for chainjwt operations
pub type Result<T> = std::result::Result<T, Error>;
