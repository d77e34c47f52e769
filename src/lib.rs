//! Two-level chain-of-trust JWTs.
//!
//! An authority issues an *inner* token whose `tjwk` claim attests a delegate
//! public key. The delegate signs an *outer* token with the matching private
//! key and carries the inner token in its `jwc` header. [`verify`] checks the
//! inner token against the authority keys, extracts the attested key and
//! checks the outer token against it.
//!
//! ```ignore
//! use chainjwt::{Claims, CreateOptions, JwkSet, SigningKey, TrustJwkClaim, VerifyConfig};
//!
//! let authority = SigningKey::generate_ed25519("E29A899C")?;
//! let delegate = SigningKey::generate_ed25519("BE60DFC8-K1")?;
//!
//! let inner = chainjwt::create_inner(
//!     Claims::new().issuer("api.example.com").audience("api.example.com").expiration(exp),
//!     [TrustJwkClaim::new(&delegate.public_jwk()?)],
//!     &authority,
//! )?;
//! let outer = chainjwt::create(&CreateOptions::new(
//!     Claims::new().subject("BE60DFC8").audience("api.example.com").expiration(exp),
//!     &delegate,
//!     inner,
//! ))?;
//!
//! let config = VerifyConfig::new(JwkSet::from(authority.public_jwk()?))
//!     .issuer("api.example.com")
//!     .audience("api.example.com");
//! let result = chainjwt::verify(&outer, &config)?;
//! assert_eq!(result.jwk(), &delegate.public_jwk()?);
//! ```

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod builder;
pub(crate) mod claims;
pub(crate) mod header;
pub(crate) mod keys;
pub(crate) mod utils;
pub(crate) mod validator;

pub mod jws;

// Public Interface
pub use algorithm::Algorithm;
pub use builder::{CreateOptions, TrustJwkClaim, create, create_inner};
pub use claims::{Claims, ClaimsValidation};
pub use error::{Error, ErrorKind, Result};
pub use jwks::JwkSet;
pub use jwks::jwk::Jwk;
pub use keys::SigningKey;
pub use limits::{DEFAULT_MAX_CHAIN_LENGTH, DEFAULT_MIN_CHAIN_LENGTH, DEFAULT_MIN_TRUST_JWK_SIZE};
pub use validator::{ChainLimits, Clock, RevocationCheck, VerifyConfig, VerifyResult, verify};

pub(crate) mod limits;
