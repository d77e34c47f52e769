use crate::claims::{Claims, ClaimsValidation};
use crate::error::{Error, Result};
use crate::header::ChainHeader;
use crate::jwks::JwkSet;
use crate::jwks::jwk::Jwk;
use crate::jws::{self, RawVerifyConfig};
use crate::limits::{
    DEFAULT_LEEWAY_SECONDS, DEFAULT_MAX_CHAIN_LENGTH, DEFAULT_MIN_CHAIN_LENGTH,
    DEFAULT_MIN_TRUST_JWK_SIZE, MAX_HEADER_OVERHEAD, max_token_length,
};
use miniserde::Deserialize;
use miniserde::json::{self, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

/// Source of the current time
pub type Clock = Arc<dyn Fn() -> SystemTime + Send + Sync + 'static>;

/// Revocation lookup for inner tokens
///
/// Called once per verification with the inner `jti` (an empty string when
/// the inner token has none), after the inner signature has been verified
/// and before the attested key is parsed. Returning an error aborts the
/// verification with that error.
pub trait RevocationCheck: Send + Sync {
    fn check(&self, jti: &str) -> Result<()>;
}

impl<F> RevocationCheck for F
where
    F: Fn(&str) -> Result<()> + Send + Sync,
{
    fn check(&self, jti: &str) -> Result<()> {
        self(jti)
    }
}

/// Size bounds applied while unpacking a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLimits {
    min_chain_length: usize,
    max_chain_length: usize,
    min_trust_jwk_size: usize,
}

impl Default for ChainLimits {
    fn default() -> Self {
        Self {
            min_chain_length: DEFAULT_MIN_CHAIN_LENGTH,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            min_trust_jwk_size: DEFAULT_MIN_TRUST_JWK_SIZE,
        }
    }
}

impl ChainLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest accepted `jwc` length in bytes
    pub fn min_chain_length(mut self, bytes: usize) -> Self {
        self.min_chain_length = bytes;
        self
    }

    /// Largest accepted `jwc` length in bytes
    pub fn max_chain_length(mut self, bytes: usize) -> Self {
        self.max_chain_length = bytes;
        self
    }

    /// Smallest accepted serialized `tjwk` size in bytes
    ///
    /// Measured on the compact JSON form of the claim, so whitespace in the
    /// issued token does not count.
    pub fn min_trust_jwk_size(mut self, bytes: usize) -> Self {
        self.min_trust_jwk_size = bytes;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.min_chain_length > self.max_chain_length {
            return Err(Error::ConfigurationInvalid(format!(
                "minimum chain length {} exceeds maximum {}",
                self.min_chain_length, self.max_chain_length
            )));
        }
        Ok(())
    }

    /// Header budget: the embedded chain plus the ordinary members
    fn max_header_size(&self) -> usize {
        self.max_chain_length.saturating_add(MAX_HEADER_OVERHEAD)
    }
}

/// Chain verification settings
///
/// Built once and shared; verification never mutates it.
#[derive(Clone)]
pub struct VerifyConfig {
    key_set: JwkSet,
    issuer: String,
    audience: String,
    clock: Clock,
    revocation: Option<Arc<dyn RevocationCheck>>,
    limits: ChainLimits,
    leeway_seconds: u64,
}

impl VerifyConfig {
    /// Trust inner tokens signed by keys in `key_set`
    pub fn new(key_set: JwkSet) -> Self {
        Self {
            key_set,
            issuer: String::new(),
            audience: String::new(),
            clock: Arc::new(SystemTime::now),
            revocation: None,
            limits: ChainLimits::default(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
        }
    }

    /// Require the inner token's `iss` to equal `issuer`
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Require both tokens' `aud` to contain `audience`
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Replace the system clock
    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Consult `check` with the inner `jti` on every verification
    pub fn revocation<R>(mut self, check: R) -> Self
    where
        R: RevocationCheck + 'static,
    {
        self.revocation = Some(Arc::new(check));
        self
    }

    pub fn limits(mut self, limits: ChainLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Clock leeway for exp, nbf and iat on both tokens (at most 300 seconds)
    pub fn leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    fn now(&self) -> Result<i64> {
        let elapsed = (self.clock)()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| Error::ConfigurationInvalid("clock is before the Unix epoch".into()))?;
        i64::try_from(elapsed.as_secs()).map_err(|_| Error::TimestampOverflow)
    }
}

impl std::fmt::Debug for VerifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyConfig")
            .field("keys", &self.key_set.len())
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("revocation", &self.revocation.is_some())
            .field("limits", &self.limits)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

/// Output of a successful [`verify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    payload: Vec<u8>,
    inner_payload: Vec<u8>,
    jwk: Jwk,
}

impl VerifyResult {
    /// Outer payload JSON
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Inner payload JSON
    pub fn inner_payload(&self) -> &[u8] {
        &self.inner_payload
    }

    /// Public key attested by the inner token
    pub fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Registered claims of the outer token
    pub fn claims(&self) -> Result<Claims> {
        parse_claims(&self.payload)
    }

    /// Registered claims of the inner token
    pub fn inner_claims(&self) -> Result<Claims> {
        parse_claims(&self.inner_payload)
    }

    /// `(payload, inner_payload, jwk)`
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, Jwk) {
        (self.payload, self.inner_payload, self.jwk)
    }
}

fn parse_claims(payload: &[u8]) -> Result<Claims> {
    let json = std::str::from_utf8(payload)
        .map_err(|e| Error::FormatInvalidJson(format!("Invalid UTF-8: {e}")))?;
    Claims::from_json(json)
}

/// Members of the inner payload the chain depends on
#[derive(Deserialize)]
struct InnerClaims {
    #[serde(rename = "jti")]
    jwt_id: Option<String>,
    #[serde(rename = "tjwk")]
    trust_jwk: Option<Value>,
}

/// Verify a chain token
///
/// Checks run in a fixed order and the first failure is returned:
/// token shape and `jwc` bounds, the inner token against the trusted key set
/// (issuer, audience and time), revocation of the inner `jti`, the attested
/// `tjwk` key (size, validity, public-only), and finally the outer token
/// against that key alone (audience and time).
///
/// The outer token's issuer is not checked, and the inner and outer
/// subjects are not compared.
pub fn verify(token: &str, config: &VerifyConfig) -> Result<VerifyResult> {
    config.limits.validate()?;
    let now = config.now()?;
    let max_header_size = config.limits.max_header_size();

    let max_length = max_token_length(max_header_size);
    if token.len() > max_length {
        debug!(gate = "format", size = token.len(), "rejecting oversized token");
        return Err(Error::TokenTooLarge {
            size: token.len(),
            max: max_length,
        });
    }

    // 1. Split into header, payload, signature
    let (header_b64, _, _) = jws::split(token).inspect_err(|_| {
        debug!(gate = "format", "rejecting token without three parts");
    })?;

    // 2. Decode the outer `jwc`; `alg` and `kid` wait for step 9
    let header = ChainHeader::decode(header_b64, max_header_size).inspect_err(|e| {
        debug!(gate = "header", error = %e, "rejecting undecodable header");
    })?;

    // 3. Bound the embedded inner token
    let chain_length = header.chain_len();
    if chain_length < config.limits.min_chain_length {
        debug!(gate = "chain_bounds", length = chain_length, "inner token too small");
        return Err(Error::ChainTooSmall {
            length: chain_length,
            min: config.limits.min_chain_length,
        });
    }
    if chain_length > config.limits.max_chain_length {
        debug!(gate = "chain_bounds", length = chain_length, "inner token too large");
        return Err(Error::ChainTooLarge {
            length: chain_length,
            max: config.limits.max_chain_length,
        });
    }
    let chain = header.chain.as_deref().unwrap_or_default();

    // 4. Verify the inner token against the trusted keys
    let inner_config = RawVerifyConfig::new(&config.key_set, now)
        .max_header_size(max_header_size)
        .claims(
            ClaimsValidation::new()
                .issuer(config.issuer.as_str())
                .audience(config.audience.as_str())
                .leeway(config.leeway_seconds),
        );
    let inner_payload = jws::verify_raw(chain, &inner_config).inspect_err(|e| {
        debug!(gate = "inner_verify", error = %e, "inner token rejected");
    })?;

    // 5. Decode the chain members of the inner payload
    let inner_json = std::str::from_utf8(&inner_payload)
        .map_err(|e| Error::FormatInvalidJson(format!("Invalid UTF-8: {e}")))?;
    let inner: InnerClaims = json::from_str(inner_json).map_err(|_| {
        debug!(gate = "inner_claims", "inner payload has malformed jti or tjwk");
        Error::FormatInvalidJson("Failed to parse inner chain claims".into())
    })?;

    // 6. Revocation
    if let Some(revocation) = &config.revocation {
        revocation
            .check(inner.jwt_id.as_deref().unwrap_or_default())
            .inspect_err(|e| {
                warn!(gate = "revocation", error = %e, "inner token revoked");
            })?;
    }

    // 7. Bound the attested key
    let trust_jwk_json = match &inner.trust_jwk {
        None | Some(Value::Null) => String::new(),
        Some(value) => json::to_string(value),
    };
    if trust_jwk_json.len() < config.limits.min_trust_jwk_size {
        debug!(gate = "trust_jwk", size = trust_jwk_json.len(), "attested key too small");
        return Err(Error::TrustJwkTooSmall {
            length: trust_jwk_json.len(),
            min: config.limits.min_trust_jwk_size,
        });
    }

    // 8. Parse the attested key; it must be valid and public
    let jwk = Jwk::from_json(&trust_jwk_json)
        .and_then(|jwk| jwk.validate().map(|()| jwk))
        .inspect_err(|e| {
            debug!(gate = "trust_jwk", error = %e, "attested key invalid");
        })?;
    if !jwk.is_public() {
        debug!(gate = "trust_jwk", "attested key carries private material");
        return Err(Error::JwkNotPublic);
    }

    // 9. Verify the outer token against the attested key only
    let outer_keys = JwkSet::from(jwk.clone());
    let outer_config = RawVerifyConfig::new(&outer_keys, now)
        .max_header_size(max_header_size)
        .claims(
            ClaimsValidation::new()
                .audience(config.audience.as_str())
                .leeway(config.leeway_seconds),
        );
    let payload = jws::verify_raw(token, &outer_config).inspect_err(|e| {
        debug!(gate = "outer_verify", error = %e, "outer token rejected");
    })?;

    // 10. Done
    trace!(algorithm = ?jwk.alg, "chain verified");
    Ok(VerifyResult {
        payload,
        inner_payload,
        jwk,
    })
}
