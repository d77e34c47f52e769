//! Delegated client token walkthrough
//!
//! An authority attests a client key, the client signs a request token that
//! carries the attestation, and a service verifies the whole chain. Run with
//! `RUST_LOG=chainjwt=trace` to see every verification gate.

use chainjwt::*;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainjwt=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== chainjwt - Delegation Example ===\n");

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| Error::ConfigurationInvalid("clock is before the Unix epoch".into()))?
        .as_secs() as i64;

    // The authority's public key is what services are configured with
    let authority = SigningKey::generate_ed25519("E29A899C")?;
    let client = SigningKey::generate_ed25519("BE60DFC8-K1")?;

    // Step 1: the authority attests the client key
    let inner = create_inner(
        Claims::new()
            .issuer("api.example.com")
            .audience("api.example.com")
            .subject("Client X")
            .jwt_id("03EC5EF4")
            .issued_at(now)
            .expiration(now + 3600),
        [TrustJwkClaim::new(&client.public_jwk()?)],
        &authority,
    )?;
    println!("Step 1: inner token ({} bytes)", inner.len());

    // Step 2: the client signs a short-lived request token
    let outer = create(&CreateOptions::new(
        Claims::new()
            .subject("BE60DFC8")
            .audience("api.example.com")
            .issued_at(now)
            .expiration(now + 30),
        &client,
        inner,
    ))?;
    println!("Step 2: outer token ({} bytes)\n", outer.len());

    // Step 3: a service verifies the chain
    let config = VerifyConfig::new(JwkSet::from(authority.public_jwk()?))
        .issuer("api.example.com")
        .audience("api.example.com")
        .revocation(|jti: &str| {
            if jti == "revoked-client" {
                Err(Error::Revoked { jti: jti.into() })
            } else {
                Ok(())
            }
        });

    let result = verify(&outer, &config)?;
    let outer_claims = result.claims()?;
    let inner_claims = result.inner_claims()?;

    println!("=== Verified Chain ===");
    println!("Attested key: {:?}", result.jwk());
    println!("Client:       {:?}", inner_claims.subject);
    println!("Request sub:  {:?}", outer_claims.subject);
    println!("Expires at:   {:?}", outer_claims.expiration);

    // A tampered token is refused
    let mut tampered = outer.into_bytes();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered)
        .map_err(|e| Error::FormatInvalidBase64(e.to_string()))?;
    match verify(&tampered, &config) {
        Ok(_) => println!("\nTampered token accepted?!"),
        Err(e) => println!("\nTampered token rejected ({:?}): {e}", e.kind()),
    }

    Ok(())
}
