//! DER helpers for RSA public keys
//!
//! Uses the RustCrypto `spki` and `der` crates. JWK `n`/`e` become a DER
//! SubjectPublicKeyInfo for aws-lc-rs, and key-pair public halves go the
//! other way when a signing key publishes its JWK.

use crate::error::{Error, Result};
use crate::limits::MAX_RSA_MODULUS_SIZE;
use der::{Decode, Encode, Sequence, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

fn der_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::JwkInvalid(format!("{operation}: {details}"))
}

/// RSAPublicKey as defined in RFC 8017:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build DER-encoded RSA SubjectPublicKeyInfo from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    use der::asn1::BitString;

    if n.is_empty() || e.is_empty() {
        return Err(der_error("rsa key missing n or e", "empty"));
    }

    if n.len() > MAX_RSA_MODULUS_SIZE + 1 {
        return Err(der_error(
            "RSA modulus too large",
            format!("{} bytes (maximum: {} bytes)", n.len(), MAX_RSA_MODULUS_SIZE),
        ));
    }

    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|e| der_error("failed to encode RSA modulus", e))?,
        public_exponent: UintRef::new(e)
            .map_err(|e| der_error("failed to encode RSA exponent", e))?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| der_error("failed to encode RSA public key", e))?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION_OID,
        parameters: Some(der::asn1::AnyRef::NULL.into()),
    };

    let subject_public_key = BitString::new(0, rsa_pubkey_der)
        .map_err(|e| der_error("failed to create bit string", e))?;

    SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    }
    .to_der()
    .map_err(|e| der_error("failed to encode SPKI", e))
}

/// Extract (n, e) from an RSA public key in PKCS#1 or SubjectPublicKeyInfo form
///
/// Leading zero bytes are stripped, matching the JWK encoding of unsigned
/// big-endian integers.
pub(crate) fn rsa_n_e_from_der(der_bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if let Ok(key) = RsaPublicKey::from_der(der_bytes) {
        return Ok((
            key.modulus.as_bytes().to_vec(),
            key.public_exponent.as_bytes().to_vec(),
        ));
    }

    let spki = SubjectPublicKeyInfoRef::from_der(der_bytes)
        .map_err(|e| der_error("failed to decode RSA public key", e))?;
    if spki.algorithm.oid != RSA_ENCRYPTION_OID {
        return Err(der_error("unexpected public key algorithm", spki.algorithm.oid));
    }
    let key = RsaPublicKey::from_der(spki.subject_public_key.raw_bytes())
        .map_err(|e| der_error("failed to decode RSAPublicKey", e))?;
    Ok((
        key.modulus.as_bytes().to_vec(),
        key.public_exponent.as_bytes().to_vec(),
    ))
}
