//! Registered claims and their validation
//!
//! Payloads are handled as `miniserde::json::Object` so that arbitrary extra
//! claims (such as `tjwk`) survive alongside the registered ones. [`Claims`]
//! is the typed view over the registered subset.

use crate::error::{Error, Result};
use crate::limits::{DEFAULT_LEEWAY_SECONDS, MAX_CLAIM_STRING_LENGTH, MAX_LEEWAY_SECONDS};
use crate::utils::bounds::{apply_leeway, validate_timestamp_bounds};
use miniserde::json::{self, Array, Number, Object, Value};

/// Registered JWT claims (RFC 7519 Section 4.1)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    /// Issuer (iss)
    pub issuer: Option<String>,
    /// Subject (sub)
    pub subject: Option<String>,
    /// Audience (aud), serialized as a string when there is exactly one entry
    pub audience: Vec<String>,
    /// Expiration Time (exp), seconds since Unix epoch
    pub expiration: Option<i64>,
    /// Not Before (nbf), seconds since Unix epoch
    pub not_before: Option<i64>,
    /// Issued At (iat), seconds since Unix epoch
    pub issued_at: Option<i64>,
    /// JWT ID (jti)
    pub jwt_id: Option<String>,
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Add one audience entry
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    pub fn expiration(mut self, timestamp: i64) -> Self {
        self.expiration = Some(timestamp);
        self
    }

    pub fn not_before(mut self, timestamp: i64) -> Self {
        self.not_before = Some(timestamp);
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jwt_id = Some(jti.into());
        self
    }

    /// Parse the registered claims out of a JSON payload
    ///
    /// Unknown members are ignored. A registered member with the wrong JSON
    /// type is an error rather than being skipped.
    pub fn from_json(payload: &str) -> Result<Self> {
        Self::from_object(&parse_object(payload)?)
    }

    pub(crate) fn from_object(object: &Object) -> Result<Self> {
        Ok(Self {
            issuer: string_claim(object, "iss")?,
            subject: string_claim(object, "sub")?,
            audience: audience_claim(object)?,
            expiration: numeric_claim(object, "exp")?,
            not_before: numeric_claim(object, "nbf")?,
            issued_at: numeric_claim(object, "iat")?,
            jwt_id: string_claim(object, "jti")?,
        })
    }

    /// Registered claims as a JSON object, absent claims omitted
    pub fn to_object(&self) -> Object {
        let mut object = Object::new();

        let strings = [
            ("iss", &self.issuer),
            ("sub", &self.subject),
            ("jti", &self.jwt_id),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                object.insert(name.into(), Value::String(value.clone()));
            }
        }

        let numbers = [
            ("exp", self.expiration),
            ("nbf", self.not_before),
            ("iat", self.issued_at),
        ];
        for (name, value) in numbers {
            if let Some(value) = value {
                object.insert(name.into(), Value::Number(Number::I64(value)));
            }
        }

        match self.audience.as_slice() {
            [] => {}
            [single] => {
                object.insert("aud".into(), Value::String(single.clone()));
            }
            many => {
                let mut array = Array::new();
                for aud in many {
                    array.push(Value::String(aud.clone()));
                }
                object.insert("aud".into(), Value::Array(array));
            }
        }

        object
    }

    /// Validate claim string lengths to prevent DoS attacks
    pub(crate) fn validate_string_lengths(&self) -> Result<()> {
        let strings = [
            ("iss", self.issuer.as_deref()),
            ("sub", self.subject.as_deref()),
            ("jti", self.jwt_id.as_deref()),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                validate_claim_string(value, name)?;
            }
        }
        for aud in &self.audience {
            validate_claim_string(aud, "aud")?;
        }
        Ok(())
    }
}

fn validate_claim_string(value: &str, claim: &str) -> Result<()> {
    if value.len() > MAX_CLAIM_STRING_LENGTH {
        return Err(Error::FormatInvalidJson(format!(
            "claim '{claim}' too long: {} bytes (maximum: {MAX_CLAIM_STRING_LENGTH} bytes)",
            value.len()
        )));
    }
    Ok(())
}

fn type_error(claim: &str, expected: &str) -> Error {
    Error::ClaimTypeInvalid {
        claim: claim.into(),
        expected: expected.into(),
    }
}

fn string_claim(object: &Object, name: &str) -> Result<Option<String>> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(type_error(name, "string")),
    }
}

fn numeric_claim(object: &Object, name: &str) -> Result<Option<i64>> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(Number::I64(value))) => Ok(Some(*value)),
        Some(Value::Number(Number::U64(value))) => i64::try_from(*value)
            .map(Some)
            .map_err(|_| Error::TimestampOverflow),
        Some(Value::Number(Number::F64(value)))
            if value.is_finite()
                && value.fract() == 0.0
                && *value >= i64::MIN as f64
                && *value < i64::MAX as f64 =>
        {
            Ok(Some(*value as i64))
        }
        Some(_) => Err(type_error(name, "NumericDate")),
    }
}

/// `aud` is either a single string or an array of strings (RFC 7519 Section 4.1.3)
fn audience_claim(object: &Object) -> Result<Vec<String>> {
    match object.get("aud") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(aud)) => Ok(vec![aud.clone()]),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(aud) => Ok(aud.clone()),
                _ => Err(type_error("aud", "string or array of strings")),
            })
            .collect(),
        Some(_) => Err(type_error("aud", "string or array of strings")),
    }
}

/// Parse a JSON document that must be an object
pub(crate) fn parse_object(payload: &str) -> Result<Object> {
    match json::from_str::<Value>(payload) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(Error::FormatInvalidJson(
            "payload must be a JSON object".into(),
        )),
        Err(_) => Err(Error::FormatInvalidJson("Failed to parse claims".into())),
    }
}

/// Build a payload from registered claims followed by extra claim objects
///
/// Extra claims are merged in order; a later member overwrites an earlier
/// one with the same name, including registered claims.
pub(crate) fn merge_payload(claims: &Claims, extra_claims: &[String]) -> Result<Object> {
    let mut payload = claims.to_object();
    for (index, extra) in extra_claims.iter().enumerate() {
        match json::from_str::<Value>(extra) {
            Ok(Value::Object(object)) => {
                for (name, value) in object.iter() {
                    payload.insert(name.clone(), value.clone());
                }
            }
            _ => {
                return Err(Error::ClaimsNotObject(format!(
                    "extra claim #{index} is not a JSON object"
                )));
            }
        }
    }
    Ok(payload)
}

/// Configuration for claims validation
///
/// An empty issuer or audience disables that check.
#[derive(Debug, Clone)]
pub struct ClaimsValidation {
    issuer: String,
    audience: String,
    leeway_seconds: u64,
    require_expiration: bool,
}

impl Default for ClaimsValidation {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            audience: String::new(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
            require_expiration: true,
        }
    }
}

impl ClaimsValidation {
    /// Create a new validation config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `iss` to equal this value
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Require `aud` to contain this value
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set clock leeway applied to exp, nbf and iat
    ///
    /// # Security
    /// Values above 300 seconds are rejected during validation.
    pub fn leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Accept tokens without an `exp` claim
    pub fn allow_missing_expiration(mut self) -> Self {
        self.require_expiration = false;
        self
    }

    /// Validate claims at the given Unix time
    pub(crate) fn validate(&self, claims: &Claims, now: i64) -> Result<()> {
        if self.leeway_seconds > MAX_LEEWAY_SECONDS {
            return Err(Error::ConfigurationInvalid(format!(
                "leeway of {}s exceeds maximum of {MAX_LEEWAY_SECONDS}s",
                self.leeway_seconds
            )));
        }

        for timestamp in [claims.expiration, claims.not_before, claims.issued_at]
            .into_iter()
            .flatten()
        {
            validate_timestamp_bounds(timestamp)?;
        }

        let leeway = self.leeway_seconds;

        match claims.expiration {
            Some(exp) => {
                if now > apply_leeway(exp, leeway, true)? {
                    return Err(Error::TokenExpired {
                        expired_at: exp,
                        now,
                        leeway,
                    });
                }
            }
            None if self.require_expiration => {
                return Err(Error::TokenMissingClaim("exp".into()));
            }
            None => {}
        }

        if let Some(nbf) = claims.not_before {
            if now < apply_leeway(nbf, leeway, false)? {
                return Err(Error::TokenNotYetValid {
                    not_before: nbf,
                    now,
                    leeway,
                });
            }
        }

        if let Some(iat) = claims.issued_at {
            if iat > apply_leeway(now, leeway, true)? {
                return Err(Error::TokenIssuedInFuture {
                    issued_at: iat,
                    now,
                    leeway,
                });
            }
        }

        if !self.issuer.is_empty() && claims.issuer.as_deref() != Some(self.issuer.as_str()) {
            return Err(Error::TokenIssuerMismatch {
                expected: self.issuer.clone(),
                found: claims.issuer.clone(),
            });
        }

        if !self.audience.is_empty() && !claims.audience.iter().any(|aud| *aud == self.audience) {
            return Err(Error::TokenAudienceMismatch {
                expected: self.audience.clone(),
                found: claims.audience.clone(),
            });
        }

        Ok(())
    }
}
