use crate::error::{Error, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_KID_LENGTH};
use crate::utils::{base64url, bounds::validate_field_size};
use miniserde::{Deserialize, json};

/// JWT header structure
///
/// Members needed to verify a signature at either level of a chain. The
/// outer `jwc` member is read separately through [`ChainHeader`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Key ID (for key set selection)
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(rename = "typ")]
    pub token_type: Option<String>,

    /// Random value mixed into the signing input
    pub nonce: Option<String>,
}

/// The only outer header member read before any signature is checked
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChainHeader {
    /// Serialized inner JWT
    #[serde(rename = "jwc")]
    pub chain: Option<String>,
}

fn decode_json<T: Deserialize>(header_b64: &str, max_size: usize) -> Result<T> {
    let header_json = base64url::decode_string(header_b64, max_size)?;
    json::from_str(&header_json)
        .map_err(|_| Error::FormatInvalidJson("Failed to parse header".into()))
}

impl TokenHeader {
    /// Decode the Base64URL header part and parse it
    pub(crate) fn decode(header_b64: &str, max_size: usize) -> Result<Self> {
        let header: TokenHeader = decode_json(header_b64, max_size)?;

        validate_field_size("alg", &header.algorithm, MAX_ALG_LENGTH)?;
        if let Some(kid) = &header.key_id {
            validate_field_size("kid", kid, MAX_KID_LENGTH)?;
        }

        Ok(header)
    }
}

impl ChainHeader {
    /// Decode only `jwc`; every other member is left to signature verification
    pub(crate) fn decode(header_b64: &str, max_size: usize) -> Result<Self> {
        decode_json(header_b64, max_size)
    }

    /// Length of the embedded inner JWT, zero when absent
    pub(crate) fn chain_len(&self) -> usize {
        self.chain.as_deref().map_or(0, str::len)
    }
}
