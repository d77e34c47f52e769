//! Signature algorithms for compact JWS tokens
use crate::error::{Error, Result};
use crate::limits::MAX_ALG_LENGTH;

use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// Algorithm identifier from the JWT header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Ed25519 (RFC 8037)
    EdDSA,
    ES256,
    ES384,
    RS256,
    RS384,
    RS512,
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Validate algorithm string length before parsing to prevent DoS
        if s.len() > MAX_ALG_LENGTH {
            return Err(Error::AlgorithmUnsupported(format!(
                "Algorithm string too long: {} bytes (maximum: {} bytes)",
                s.len(),
                MAX_ALG_LENGTH
            )));
        }

        match s {
            "none" => Err(Error::AlgorithmNoneRejected),
            "EdDSA" => Ok(Algorithm::EdDSA),
            "ES256" => Ok(Algorithm::ES256),
            "ES384" => Ok(Algorithm::ES384),
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            _ => Err(Error::AlgorithmUnsupported(s.into())),
        }
    }
}

impl Algorithm {
    /// Convert to string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Algorithm::EdDSA => "EdDSA",
            Algorithm::ES256 => "ES256",
            Algorithm::ES384 => "ES384",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }

    /// JWK `kty` a key must carry to be used with this algorithm
    pub const fn key_type(&self) -> &'static str {
        match self {
            Algorithm::EdDSA => "OKP",
            Algorithm::ES256 | Algorithm::ES384 => "EC",
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => "RSA",
        }
    }

    /// JWK `crv` a key must carry to be used with this algorithm, if any
    pub const fn curve(&self) -> Option<&'static str> {
        match self {
            Algorithm::EdDSA => Some("Ed25519"),
            Algorithm::ES256 => Some("P-256"),
            Algorithm::ES384 => Some("P-384"),
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => None,
        }
    }

    /// Get the verification algorithm for signature verification
    ///
    /// Note: JWT ECDSA signatures use IEEE P1363 format (fixed-length R||S),
    /// not ASN.1 DER encoding, as per RFC 7518 Section 3.4.
    fn verification_algorithm(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            Algorithm::EdDSA => &signature::ED25519,
            Algorithm::ES256 => &signature::ECDSA_P256_SHA256_FIXED,
            Algorithm::ES384 => &signature::ECDSA_P384_SHA384_FIXED,
            Algorithm::RS256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            Algorithm::RS384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            Algorithm::RS512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    }

    /// Verify a signature using the algorithm
    ///
    /// # Arguments
    /// * `signing_input` - The data that was signed (header.payload)
    /// * `signature` - The decoded signature bytes
    /// * `public_key` - Key bytes as produced by `Jwk::verification_key`
    pub(crate) fn verify_signature(
        &self,
        signing_input: &str,
        signature: &[u8],
        public_key: &[u8],
    ) -> Result<()> {
        UnparsedPublicKey::new(self.verification_algorithm(), public_key)
            .verify(signing_input.as_bytes(), signature)
            .map_err(|_| Error::SignatureInvalid)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Algorithm {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
