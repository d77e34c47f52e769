/// Signing keys for issuing chain tokens
///
/// This module wraps the aws-lc-rs key pairs behind one type:
/// - Ed25519 key pairs (EdDSA)
/// - ECDSA key pairs on P-256 / P-384 (ES256, ES384)
/// - RSA key pairs (RS256, RS384, RS512)
use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::jwks::jwk::Jwk;
use crate::utils::{base64url, der::rsa_n_e_from_der};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair as _, RsaKeyPair};

/// A private key with its algorithm and key ID
///
/// The key ID is written to the `kid` header of every token signed with the
/// key, and to the public JWK returned by [`SigningKey::public_jwk`].
pub struct SigningKey {
    algorithm: Algorithm,
    kid: String,
    pair: KeyPair,
}

enum KeyPair {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
    Rsa(RsaKeyPair),
}

fn rejected(e: impl std::fmt::Display) -> Error {
    Error::KeyRejected(e.to_string())
}

fn ecdsa_signing_algorithm(
    algorithm: Algorithm,
) -> Result<&'static signature::EcdsaSigningAlgorithm> {
    match algorithm {
        Algorithm::ES256 => Ok(&signature::ECDSA_P256_SHA256_FIXED_SIGNING),
        Algorithm::ES384 => Ok(&signature::ECDSA_P384_SHA384_FIXED_SIGNING),
        other => Err(Error::KeyTypeMismatch {
            algorithm: other.to_string(),
            expected: other.key_type().into(),
            found: "EC".into(),
        }),
    }
}

impl SigningKey {
    /// Ed25519 key from a PKCS#8 v1 or v2 document
    pub fn ed25519_pkcs8(kid: impl Into<String>, pkcs8: &[u8]) -> Result<Self> {
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8).map_err(rejected)?;
        Self::with_pair(Algorithm::EdDSA, kid, KeyPair::Ed25519(pair))
    }

    /// ECDSA key from a PKCS#8 document; `algorithm` must be ES256 or ES384
    pub fn ecdsa_pkcs8(algorithm: Algorithm, kid: impl Into<String>, pkcs8: &[u8]) -> Result<Self> {
        let signing = ecdsa_signing_algorithm(algorithm)?;
        let pair = EcdsaKeyPair::from_pkcs8(signing, pkcs8).map_err(rejected)?;
        Self::with_pair(algorithm, kid, KeyPair::Ecdsa(pair))
    }

    /// RSA key from a PKCS#8 document; `algorithm` must be RS256, RS384 or RS512
    pub fn rsa_pkcs8(algorithm: Algorithm, kid: impl Into<String>, pkcs8: &[u8]) -> Result<Self> {
        if algorithm.key_type() != "RSA" {
            return Err(Error::KeyTypeMismatch {
                algorithm: algorithm.to_string(),
                expected: algorithm.key_type().into(),
                found: "RSA".into(),
            });
        }
        let pair = RsaKeyPair::from_pkcs8(pkcs8).map_err(rejected)?;
        Self::with_pair(algorithm, kid, KeyPair::Rsa(pair))
    }

    /// Fresh Ed25519 key from the system CSPRNG
    pub fn generate_ed25519(kid: impl Into<String>) -> Result<Self> {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).map_err(rejected)?;
        Self::ed25519_pkcs8(kid, pkcs8.as_ref())
    }

    /// Fresh ECDSA key from the system CSPRNG
    pub fn generate_ecdsa(algorithm: Algorithm, kid: impl Into<String>) -> Result<Self> {
        let signing = ecdsa_signing_algorithm(algorithm)?;
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing, &SystemRandom::new()).map_err(rejected)?;
        Self::ecdsa_pkcs8(algorithm, kid, pkcs8.as_ref())
    }

    fn with_pair(algorithm: Algorithm, kid: impl Into<String>, pair: KeyPair) -> Result<Self> {
        let kid = kid.into();
        if kid.is_empty() {
            return Err(Error::ConfigurationInvalid(
                "signing key requires a non-empty kid".into(),
            ));
        }
        Ok(Self {
            algorithm,
            kid,
            pair,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public half of the key as a JWK carrying `kid`, `alg` and `use`
    pub fn public_jwk(&self) -> Result<Jwk> {
        let base = Jwk {
            kid: Some(self.kid.clone()),
            alg: Some(self.algorithm.to_string()),
            key_use: Some("sig".into()),
            kty: Some(self.algorithm.key_type().into()),
            crv: self.algorithm.curve().map(Into::into),
            ..Jwk::default()
        };

        match &self.pair {
            KeyPair::Ed25519(pair) => Ok(Jwk {
                x: Some(base64url::encode_bytes(pair.public_key().as_ref())),
                ..base
            }),
            KeyPair::Ecdsa(pair) => {
                // Uncompressed SEC1 point: 0x04 || x || y
                let point = pair.public_key().as_ref();
                let coordinates = point
                    .strip_prefix(&[0x04])
                    .filter(|xy| !xy.is_empty() && xy.len() % 2 == 0)
                    .ok_or_else(|| rejected("unexpected EC public key encoding"))?;
                let (x, y) = coordinates.split_at(coordinates.len() / 2);
                Ok(Jwk {
                    x: Some(base64url::encode_bytes(x)),
                    y: Some(base64url::encode_bytes(y)),
                    ..base
                })
            }
            KeyPair::Rsa(pair) => {
                let (n, e) = rsa_n_e_from_der(pair.public_key().as_ref())?;
                Ok(Jwk {
                    n: Some(base64url::encode_bytes(&n)),
                    e: Some(base64url::encode_bytes(&e)),
                    ..base
                })
            }
        }
    }

    /// Sign `message` with the key's algorithm
    ///
    /// ECDSA signatures use the fixed-length `r || s` encoding.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let failed = |e: aws_lc_rs::error::Unspecified| Error::SigningFailed(e.to_string());

        match &self.pair {
            KeyPair::Ed25519(pair) => Ok(pair.sign(message).as_ref().to_vec()),
            KeyPair::Ecdsa(pair) => {
                let signature = pair.sign(&SystemRandom::new(), message).map_err(failed)?;
                Ok(signature.as_ref().to_vec())
            }
            KeyPair::Rsa(pair) => {
                let padding: &'static dyn signature::RsaEncoding = match self.algorithm {
                    Algorithm::RS384 => &signature::RSA_PKCS1_SHA384,
                    Algorithm::RS512 => &signature::RSA_PKCS1_SHA512,
                    _ => &signature::RSA_PKCS1_SHA256,
                };
                let mut signature = vec![0u8; pair.public_modulus_len()];
                pair.sign(padding, &SystemRandom::new(), message, &mut signature)
                    .map_err(failed)?;
                Ok(signature)
            }
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}
