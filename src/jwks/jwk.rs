//! JWK (JSON Web Key) struct and conversion

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::limits::{MAX_JWK_KID_SIZE, MAX_JWK_MEMBER_SIZE, MAX_RSA_MODULUS_SIZE, MIN_RSA_MODULUS_SIZE};
use crate::utils::{base64url, der::rsa_spki_from_n_e};
use miniserde::json::{self, Object, Value};
use miniserde::Deserialize;

/// Private members; a key carrying any of these is not public
const PRIVATE_MEMBERS: [&str; 6] = ["d", "p", "q", "dp", "dq", "qi"];

/// Largest RSA public exponent accepted (64 bits)
const MAX_RSA_EXPONENT_SIZE: usize = 8;

fn invalid(reason: impl Into<String>) -> Error {
    Error::JwkInvalid(reason.into())
}

/// JSON Web Key (RFC 7517)
///
/// Holds public and private members alike. The `Debug` output never
/// includes key material.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type ("OKP", "EC", "RSA", "oct")
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm the key is intended for
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2); must be "sig" when present
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// Curve name for OKP and EC keys
    pub crv: Option<String>,
    /// Public point x-coordinate (EC) or public key (OKP), Base64URL-encoded
    pub x: Option<String>,
    /// Public point y-coordinate (EC), Base64URL-encoded
    pub y: Option<String>,
    /// RSA modulus, Base64URL-encoded
    pub n: Option<String>,
    /// RSA public exponent, Base64URL-encoded
    pub e: Option<String>,
    /// Private key (EC, OKP) or private exponent (RSA)
    pub d: Option<String>,
    pub p: Option<String>,
    pub q: Option<String>,
    pub dp: Option<String>,
    pub dq: Option<String>,
    pub qi: Option<String>,
    /// Symmetric key value ("oct")
    pub k: Option<String>,
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("use", &self.key_use)
            .field("crv", &self.crv)
            .field("public", &self.is_public())
            .finish_non_exhaustive()
    }
}

impl Jwk {
    /// Parse a single JWK from JSON
    pub fn from_json(input: &str) -> Result<Self> {
        json::from_str(input).map_err(|_| Error::FormatInvalidJson("Failed to parse JWK".into()))
    }

    /// Parse a JWK from an already decoded JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(_) => Self::from_json(&json::to_string(value)),
            _ => Err(Error::FormatInvalidJson("JWK must be a JSON object".into())),
        }
    }

    /// JSON object with every present member
    pub fn to_value(&self) -> Value {
        let members = [
            ("kty", &self.kty),
            ("kid", &self.kid),
            ("alg", &self.alg),
            ("use", &self.key_use),
            ("crv", &self.crv),
            ("x", &self.x),
            ("y", &self.y),
            ("n", &self.n),
            ("e", &self.e),
            ("d", &self.d),
            ("p", &self.p),
            ("q", &self.q),
            ("dp", &self.dp),
            ("dq", &self.dq),
            ("qi", &self.qi),
            ("k", &self.k),
        ];

        let mut object = Object::new();
        for (name, value) in members {
            if let Some(value) = value {
                object.insert(name.into(), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }

    pub fn to_json(&self) -> String {
        json::to_string(&self.to_value())
    }

    fn private_members(&self) -> [(&'static str, Option<&str>); 6] {
        [
            (PRIVATE_MEMBERS[0], self.d.as_deref()),
            (PRIVATE_MEMBERS[1], self.p.as_deref()),
            (PRIVATE_MEMBERS[2], self.q.as_deref()),
            (PRIVATE_MEMBERS[3], self.dp.as_deref()),
            (PRIVATE_MEMBERS[4], self.dq.as_deref()),
            (PRIVATE_MEMBERS[5], self.qi.as_deref()),
        ]
    }

    /// True when the key carries no private or symmetric material
    pub fn is_public(&self) -> bool {
        self.kty.as_deref() != Some("oct")
            && self.k.is_none()
            && self.private_members().iter().all(|(_, value)| value.is_none())
    }

    /// Copy of this key with every private member removed
    pub fn to_public(&self) -> Jwk {
        Jwk {
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            k: None,
            ..self.clone()
        }
    }

    /// Structural validity, see [`Jwk::validate`]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check that the key is well formed for its type
    ///
    /// OKP keys must be Ed25519 with a 32-byte `x`; EC keys P-256 or P-384
    /// with coordinates of the curve size; RSA keys need a 2048 to 8192 bit
    /// modulus and a non-empty exponent. Private members, when present, must
    /// decode. A declared `alg` must fit the key type and curve.
    pub fn validate(&self) -> Result<()> {
        if let Some(kid) = &self.kid {
            if kid.len() > MAX_JWK_KID_SIZE {
                return Err(invalid(format!(
                    "kid too long: {} bytes (maximum: {MAX_JWK_KID_SIZE} bytes)",
                    kid.len()
                )));
            }
        }

        if let Some(key_use) = &self.key_use {
            if key_use != "sig" {
                return Err(invalid(format!(
                    "key use mismatch: expected 'sig', found '{key_use}'"
                )));
            }
        }

        let kty = self
            .kty
            .as_deref()
            .ok_or_else(|| invalid("missing key type (kty)"))?;

        if kty == "oct" {
            let k = decode_member("k", self.k.as_deref())?;
            if k.is_empty() {
                return Err(invalid("empty symmetric key"));
            }
            return Ok(());
        }

        let declared = self
            .alg
            .as_deref()
            .map(|alg| {
                alg.parse::<Algorithm>()
                    .map_err(|_| invalid(format!("unsupported alg '{alg}'")))
            })
            .transpose()?;

        if let Some(algorithm) = declared {
            if algorithm.key_type() != kty {
                return Err(invalid(format!(
                    "alg {algorithm} cannot be used with key type {kty}"
                )));
            }
            if algorithm.curve().is_some() && algorithm.curve() != self.crv.as_deref() {
                return Err(invalid(format!(
                    "alg {algorithm} requires curve {}",
                    algorithm.curve().unwrap_or_default()
                )));
            }
        }

        match kty {
            "OKP" => {
                match self.crv.as_deref() {
                    Some("Ed25519") => {}
                    other => return Err(invalid(format!("unsupported OKP curve {other:?}"))),
                }
                decode_fixed("x", self.x.as_deref(), 32)?;
                if self.d.is_some() {
                    decode_fixed("d", self.d.as_deref(), 32)?;
                }
            }
            "EC" => {
                let size = ec_coordinate_size(self.crv.as_deref())?;
                decode_fixed("x", self.x.as_deref(), size)?;
                decode_fixed("y", self.y.as_deref(), size)?;
                if self.d.is_some() {
                    decode_fixed("d", self.d.as_deref(), size)?;
                }
            }
            "RSA" => {
                let n = decode_member("n", self.n.as_deref())?;
                let modulus = strip_leading_zeros(&n);
                if !(MIN_RSA_MODULUS_SIZE..=MAX_RSA_MODULUS_SIZE).contains(&modulus.len()) {
                    return Err(invalid(format!(
                        "RSA modulus of {} bytes outside {MIN_RSA_MODULUS_SIZE}..={MAX_RSA_MODULUS_SIZE}",
                        modulus.len()
                    )));
                }
                let e = decode_member("e", self.e.as_deref())?;
                let exponent = strip_leading_zeros(&e);
                if exponent.is_empty() || exponent.len() > MAX_RSA_EXPONENT_SIZE {
                    return Err(invalid("RSA exponent out of range"));
                }
                for (name, value) in self.private_members() {
                    if value.is_some() {
                        decode_member(name, value)?;
                    }
                }
            }
            other => return Err(invalid(format!("unsupported key type '{other}'"))),
        }

        Ok(())
    }

    /// Public key bytes in the form aws-lc-rs expects for `algorithm`
    ///
    /// Ed25519 keys yield the raw 32-byte key, EC keys the uncompressed
    /// point `0x04 || x || y`, RSA keys a DER SubjectPublicKeyInfo.
    pub(crate) fn verification_key(&self, algorithm: Algorithm) -> Result<Vec<u8>> {
        let mismatch = |expected: &str, found: Option<&str>| Error::KeyTypeMismatch {
            algorithm: algorithm.to_string(),
            expected: expected.into(),
            found: found.unwrap_or("none").into(),
        };

        if self.kty.as_deref() != Some(algorithm.key_type()) {
            return Err(mismatch(algorithm.key_type(), self.kty.as_deref()));
        }
        if let Some(alg) = self.alg.as_deref() {
            if alg != algorithm.as_str() {
                return Err(mismatch(algorithm.as_str(), Some(alg)));
            }
        }
        if let Some(curve) = algorithm.curve() {
            if self.crv.as_deref() != Some(curve) {
                return Err(mismatch(curve, self.crv.as_deref()));
            }
        }
        if let Some(key_use) = &self.key_use {
            if key_use != "sig" {
                return Err(invalid(format!(
                    "key use mismatch: expected 'sig', found '{key_use}'"
                )));
            }
        }

        match algorithm {
            Algorithm::EdDSA => decode_fixed("x", self.x.as_deref(), 32),
            Algorithm::ES256 | Algorithm::ES384 => {
                let size = ec_coordinate_size(self.crv.as_deref())?;
                let x = decode_fixed("x", self.x.as_deref(), size)?;
                let y = decode_fixed("y", self.y.as_deref(), size)?;

                let mut point = Vec::with_capacity(1 + 2 * size);
                point.push(0x04);
                point.extend_from_slice(&x);
                point.extend_from_slice(&y);
                Ok(point)
            }
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
                let n = decode_member("n", self.n.as_deref())?;
                let e = decode_member("e", self.e.as_deref())?;
                rsa_spki_from_n_e(strip_leading_zeros(&n), strip_leading_zeros(&e))
            }
        }
    }
}

fn ec_coordinate_size(crv: Option<&str>) -> Result<usize> {
    match crv {
        Some("P-256") => Ok(32),
        Some("P-384") => Ok(48),
        other => Err(invalid(format!("unsupported EC curve {other:?}"))),
    }
}

fn decode_member(name: &str, value: Option<&str>) -> Result<Vec<u8>> {
    let value = value.ok_or_else(|| invalid(format!("missing member '{name}'")))?;
    base64url::decode_bytes(value, MAX_JWK_MEMBER_SIZE)
        .map_err(|e| invalid(format!("failed to decode '{name}': {e}")))
}

fn decode_fixed(name: &str, value: Option<&str>, size: usize) -> Result<Vec<u8>> {
    let bytes = decode_member(name, value)?;
    if bytes.len() != size {
        return Err(invalid(format!(
            "member '{name}' must be {size} bytes, found {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
