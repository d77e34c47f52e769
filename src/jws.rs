//! Compact JWS signing and verification
//!
//! Single-level building blocks used by the chain builder and validator:
//! [`sign`] produces `header.payload.signature` with a fresh nonce in the
//! protected header, and [`verify_raw`] checks one token against a key set
//! and validates its registered claims.

use crate::algorithm::Algorithm;
use crate::claims::{Claims, ClaimsValidation};
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::jwks::JwkSet;
use crate::keys::SigningKey;
use crate::limits::{
    DEFAULT_MAX_CHAIN_LENGTH, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_HEADER_OVERHEAD, MAX_SIGNATURE_B64_SIZE, NONCE_SIZE, max_token_length,
};
use crate::utils::base64url;
use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use miniserde::json::{self, Object, Value};
use tracing::trace;

/// Split a compact token into its three parts
pub(crate) fn split(token: &str) -> Result<(&str, &str, &str)> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::FormatInvalid)?;
    let payload_b64 = parts.next().ok_or(Error::FormatInvalid)?;
    let signature_b64 = parts.next().ok_or(Error::FormatInvalid)?;
    if parts.next().is_some() {
        return Err(Error::FormatInvalid);
    }
    Ok((header_b64, payload_b64, signature_b64))
}

fn nonce() -> Result<String> {
    let mut bytes = [0u8; NONCE_SIZE];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|e| Error::SigningFailed(format!("nonce generation failed: {e}")))?;
    Ok(base64url::encode_bytes(&bytes))
}

/// Sign `payload` as a compact JWS
///
/// The protected header carries `alg` and `kid` from the key, `typ: "JWT"`
/// and an 8-byte random `nonce`, plus every member of `extra_headers`.
/// Those four members cannot be overridden through `extra_headers`.
pub fn sign(payload: Object, key: &SigningKey, extra_headers: Object) -> Result<String> {
    let mut header = extra_headers;
    header.insert("alg".into(), Value::String(key.algorithm().to_string()));
    header.insert("kid".into(), Value::String(key.kid().into()));
    header.insert("typ".into(), Value::String("JWT".into()));
    header.insert("nonce".into(), Value::String(nonce()?));

    let header_b64 = base64url::encode(&json::to_string(&Value::Object(header)));
    let payload_b64 = base64url::encode(&json::to_string(&Value::Object(payload)));

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = key.sign(signing_input.as_bytes())?;

    Ok(format!(
        "{signing_input}.{}",
        base64url::encode_bytes(&signature)
    ))
}

/// Verification settings for a single compact token
#[derive(Debug, Clone)]
pub struct RawVerifyConfig<'a> {
    key_set: &'a JwkSet,
    claims: ClaimsValidation,
    now: i64,
    max_header_size: usize,
}

impl<'a> RawVerifyConfig<'a> {
    /// Verify against `key_set` at Unix time `now`
    pub fn new(key_set: &'a JwkSet, now: i64) -> Self {
        Self {
            key_set,
            claims: ClaimsValidation::default(),
            now,
            max_header_size: DEFAULT_MAX_CHAIN_LENGTH + MAX_HEADER_OVERHEAD,
        }
    }

    /// Configure claims validation
    pub fn claims(mut self, claims: ClaimsValidation) -> Self {
        self.claims = claims;
        self
    }

    /// Maximum decoded header size
    ///
    /// The token length limit is derived from this value.
    pub fn max_header_size(mut self, bytes: usize) -> Self {
        self.max_header_size = bytes;
        self
    }
}

/// Verify a compact JWS and return its payload JSON bytes
///
/// The token header must name a `kid`; every key in the set with that `kid`
/// is tried and the first one that verifies the signature wins. The payload
/// is only decoded after the signature checks out.
pub fn verify_raw(token: &str, config: &RawVerifyConfig<'_>) -> Result<Vec<u8>> {
    // 1. Validate token string length
    let max_length = max_token_length(config.max_header_size);
    if token.len() > max_length {
        return Err(Error::TokenTooLarge {
            size: token.len(),
            max: max_length,
        });
    }

    // 2. Check token format (header, payload, signature)
    let (header_b64, payload_b64, signature_b64) = split(token)?;

    // Validate signature Base64URL size before decoding
    if signature_b64.len() > MAX_SIGNATURE_B64_SIZE {
        return Err(Error::SignatureB64TooLarge {
            size: signature_b64.len(),
            max: MAX_SIGNATURE_B64_SIZE,
        });
    }

    // 3. Decode header, algorithm and key ID
    let header = TokenHeader::decode(header_b64, config.max_header_size)?;
    let algorithm: Algorithm = header.algorithm.parse()?;
    let kid = header
        .key_id
        .as_deref()
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| Error::HeaderMissingField("kid".into()))?;

    let signature = base64url::decode_bytes(signature_b64, MAX_DECODED_SIGNATURE_SIZE)?;

    // 4-5. Try every candidate key with a matching kid
    let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
    let mut candidates = 0usize;
    let mut verified = false;
    for jwk in config.key_set.keys_for(kid) {
        candidates += 1;
        let public_key = match jwk.verification_key(algorithm) {
            Ok(public_key) => public_key,
            Err(e) => {
                trace!(%algorithm, error = %e, "skipping unusable candidate key");
                continue;
            }
        };
        if algorithm
            .verify_signature(signing_input, &signature, &public_key)
            .is_ok()
        {
            verified = true;
            break;
        }
    }
    if candidates == 0 {
        return Err(Error::KeyNotFound(kid.into()));
    }
    if !verified {
        return Err(Error::SignatureInvalid);
    }

    // 6. Parse payload with size limit
    let payload_json = base64url::decode_string(payload_b64, MAX_DECODED_PAYLOAD_SIZE)?;
    let claims = Claims::from_json(&payload_json)?;
    claims.validate_string_lengths()?;

    // 7. Validate claims
    config.claims.validate(&claims, config.now)?;

    Ok(payload_json.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwks::jwk::Jwk;

    const NOW: i64 = 1_700_000_000;

    fn payload() -> Object {
        Claims::new()
            .issuer("api.example.com")
            .audience("api.example.com")
            .expiration(NOW + 30)
            .to_object()
    }

    fn setup() -> (SigningKey, JwkSet) {
        let key = SigningKey::generate_ed25519("E29A899C").unwrap();
        let set = JwkSet::from(key.public_jwk().unwrap());
        (key, set)
    }

    fn header_of(token: &str) -> Object {
        let (header_b64, _, _) = split(token).unwrap();
        let json = base64url::decode_string(header_b64, 4096).unwrap();
        crate::claims::parse_object(&json).unwrap()
    }

    #[test]
    fn test_split() {
        assert_eq!(split("a.b.c").unwrap(), ("a", "b", "c"));
        assert!(matches!(split("a.b"), Err(Error::FormatInvalid)));
        assert!(matches!(split("a.b.c.d"), Err(Error::FormatInvalid)));
        assert!(matches!(split(""), Err(Error::FormatInvalid)));
    }

    #[test]
    fn test_sign_header_members() {
        let (key, _) = setup();
        let mut extra = Object::new();
        extra.insert("jwc".into(), Value::String("inner".into()));
        extra.insert("alg".into(), Value::String("none".into()));

        let token = sign(payload(), &key, extra).unwrap();
        let header = header_of(&token);

        assert!(matches!(header.get("alg"), Some(Value::String(s)) if s == "EdDSA"));
        assert!(matches!(header.get("kid"), Some(Value::String(s)) if s == "E29A899C"));
        assert!(matches!(header.get("typ"), Some(Value::String(s)) if s == "JWT"));
        assert!(matches!(header.get("jwc"), Some(Value::String(s)) if s == "inner"));
        match header.get("nonce") {
            Some(Value::String(nonce)) => {
                assert_eq!(base64url::decode_bytes(nonce, 64).unwrap().len(), NONCE_SIZE)
            }
            _ => panic!("nonce missing or not a string"),
        }
    }

    #[test]
    fn test_nonce_differs_per_token() {
        let (key, _) = setup();
        let first = sign(payload(), &key, Object::new()).unwrap();
        let second = sign(payload(), &key, Object::new()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_raw_round_trip() {
        let (key, set) = setup();
        let token = sign(payload(), &key, Object::new()).unwrap();

        let config = RawVerifyConfig::new(&set, NOW).claims(
            ClaimsValidation::new()
                .issuer("api.example.com")
                .audience("api.example.com"),
        );
        let bytes = verify_raw(&token, &config).unwrap();
        let claims = Claims::from_json(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(claims.expiration, Some(NOW + 30));
    }

    #[test]
    fn test_verify_raw_unknown_kid() {
        let (key, _) = setup();
        let other = SigningKey::generate_ed25519("other").unwrap();
        let set = JwkSet::from(other.public_jwk().unwrap());

        let token = sign(payload(), &key, Object::new()).unwrap();
        let result = verify_raw(&token, &RawVerifyConfig::new(&set, NOW));
        assert!(matches!(result, Err(Error::KeyNotFound(kid)) if kid == "E29A899C"));
    }

    #[test]
    fn test_verify_raw_tries_every_candidate() {
        let (key, _) = setup();
        let decoy = SigningKey::generate_ed25519("E29A899C").unwrap();
        let set = JwkSet::new(vec![
            decoy.public_jwk().unwrap(),
            key.public_jwk().unwrap(),
        ]);

        let token = sign(payload(), &key, Object::new()).unwrap();
        assert!(verify_raw(&token, &RawVerifyConfig::new(&set, NOW)).is_ok());

        let only_decoy = JwkSet::from(decoy.public_jwk().unwrap());
        assert!(matches!(
            verify_raw(&token, &RawVerifyConfig::new(&only_decoy, NOW)),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn test_verify_raw_skips_wrong_family() {
        let (key, _) = setup();
        let ec = SigningKey::generate_ecdsa(Algorithm::ES256, "E29A899C").unwrap();
        let set = JwkSet::new(vec![ec.public_jwk().unwrap()]);

        let token = sign(payload(), &key, Object::new()).unwrap();
        assert!(matches!(
            verify_raw(&token, &RawVerifyConfig::new(&set, NOW)),
            Err(Error::SignatureInvalid)
        ));
    }

    #[test]
    fn test_verify_raw_requires_kid() {
        let header = base64url::encode(r#"{"alg":"EdDSA"}"#);
        let token = format!("{header}.e30.AAAA");
        let set = JwkSet::default();
        assert!(matches!(
            verify_raw(&token, &RawVerifyConfig::new(&set, NOW)),
            Err(Error::HeaderMissingField(field)) if field == "kid"
        ));
    }

    #[test]
    fn test_verify_raw_rejects_none() {
        let header = base64url::encode(r#"{"alg":"none","kid":"k"}"#);
        let token = format!("{header}.e30.");
        let set = JwkSet::from(Jwk {
            kid: Some("k".into()),
            ..Jwk::default()
        });
        assert!(matches!(
            verify_raw(&token, &RawVerifyConfig::new(&set, NOW)),
            Err(Error::AlgorithmNoneRejected)
        ));
    }

    #[test]
    fn test_verify_raw_claims_failures() {
        let (key, set) = setup();
        let token = sign(payload(), &key, Object::new()).unwrap();

        let expired = RawVerifyConfig::new(&set, NOW + 3600);
        assert!(matches!(
            verify_raw(&token, &expired),
            Err(Error::TokenExpired { .. })
        ));

        let wrong_audience =
            RawVerifyConfig::new(&set, NOW).claims(ClaimsValidation::new().audience("other"));
        assert!(matches!(
            verify_raw(&token, &wrong_audience),
            Err(Error::TokenAudienceMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_raw_token_too_large() {
        let set = JwkSet::default();
        let config = RawVerifyConfig::new(&set, NOW).max_header_size(16);
        let token = "a".repeat(max_token_length(16) + 1);
        assert!(matches!(
            verify_raw(&token, &config),
            Err(Error::TokenTooLarge { .. })
        ));
    }

    #[test]
    fn test_verify_raw_oversized_signature() {
        let set = JwkSet::default();
        let token = format!("e30.e30.{}", "A".repeat(MAX_SIGNATURE_B64_SIZE + 1));
        assert!(matches!(
            verify_raw(&token, &RawVerifyConfig::new(&set, NOW)),
            Err(Error::SignatureB64TooLarge { .. })
        ));
    }
}
