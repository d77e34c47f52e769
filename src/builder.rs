//! Chain token construction

use crate::claims::{Claims, merge_payload};
use crate::error::Result;
use crate::jwks::jwk::Jwk;
use crate::jws;
use crate::keys::SigningKey;
use miniserde::json::{self, Object, Value};
use miniserde::Serialize;
use tracing::trace;

/// Payload claim attesting a delegate public key
///
/// Serializes as `{"tjwk": { ...jwk }}`. Nothing stops a private key from
/// being placed here, but [`crate::verify`] rejects chains that carry one.
#[derive(Clone, Serialize)]
pub struct TrustJwkClaim {
    #[serde(rename = "tjwk")]
    trust_jwk: Value,
}

impl TrustJwkClaim {
    pub fn new(jwk: &Jwk) -> Self {
        Self {
            trust_jwk: jwk.to_value(),
        }
    }
}

impl std::fmt::Debug for TrustJwkClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustJwkClaim").finish_non_exhaustive()
    }
}

/// Inputs for [`create`]
///
/// ```ignore
/// let options = CreateOptions::new(claims, &delegate_key, inner_token)
///     .extra_claim(&Scope { scope: "read".into() });
/// ```
#[derive(Debug, Clone)]
pub struct CreateOptions<'a> {
    claims: Claims,
    extra_claims: Vec<String>,
    key: &'a SigningKey,
    chain: String,
}

impl<'a> CreateOptions<'a> {
    /// Claims signed by `key`, with `chain` embedded as the `jwc` header
    ///
    /// An empty `chain` produces a token without `jwc`.
    pub fn new(claims: Claims, key: &'a SigningKey, chain: impl Into<String>) -> Self {
        Self {
            claims,
            extra_claims: Vec::new(),
            key,
            chain: chain.into(),
        }
    }

    /// Add one extra claim object, merged over the registered claims
    pub fn extra_claim<T: Serialize + ?Sized>(mut self, claim: &T) -> Self {
        self.extra_claims.push(json::to_string(claim));
        self
    }

    /// Add several extra claim objects, merged in order
    pub fn extra_claims<T, I>(mut self, claims: I) -> Self
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        self.extra_claims
            .extend(claims.into_iter().map(|claim| json::to_string(&claim)));
        self
    }
}

/// Build and sign a chain token
///
/// The payload is the registered claims with every extra claim merged on top
/// (later members overwrite earlier ones). The inner token is embedded as-is;
/// it is neither parsed nor verified here.
pub fn create(options: &CreateOptions<'_>) -> Result<String> {
    let payload = merge_payload(&options.claims, &options.extra_claims)?;

    let mut headers = Object::new();
    if !options.chain.is_empty() {
        headers.insert("jwc".into(), Value::String(options.chain.clone()));
    }

    let token = jws::sign(payload, options.key, headers)?;
    trace!(
        algorithm = %options.key.algorithm(),
        chained = !options.chain.is_empty(),
        "created token"
    );
    Ok(token)
}

/// Build and sign an authority-level token without a `jwc` header
///
/// Typically carries a [`TrustJwkClaim`] for the delegate key.
pub fn create_inner<T: Serialize>(
    claims: Claims,
    extra_claims: impl IntoIterator<Item = T>,
    key: &SigningKey,
) -> Result<String> {
    create(&CreateOptions::new(claims, key, "").extra_claims(extra_claims))
}
