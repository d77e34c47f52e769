//! Chain verification performance benchmarks
//!
//! Measures full chain verification per algorithm pairing, token creation,
//! and how quickly the size gates reject oversized input.

use chainjwt::*;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

mod helpers {
    use chainjwt::*;

    pub fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    pub fn claims() -> Claims {
        let now = now();
        Claims::new()
            .issuer("api.example.com")
            .audience("api.example.com")
            .issued_at(now)
            .expiration(now + 3600)
    }

    pub fn key(algorithm: Algorithm, kid: &str) -> SigningKey {
        match algorithm {
            Algorithm::EdDSA => SigningKey::generate_ed25519(kid).unwrap(),
            _ => SigningKey::generate_ecdsa(algorithm, kid).unwrap(),
        }
    }

    pub fn chain(authority: &SigningKey, delegate: &SigningKey) -> String {
        let inner = create_inner(
            claims().jwt_id("03EC5EF4"),
            [TrustJwkClaim::new(&delegate.public_jwk().unwrap())],
            authority,
        )
        .unwrap();
        create(&CreateOptions::new(claims().subject("BE60DFC8"), delegate, inner)).unwrap()
    }

    pub fn config(authority: &SigningKey) -> VerifyConfig {
        VerifyConfig::new(JwkSet::from(authority.public_jwk().unwrap()))
            .issuer("api.example.com")
            .audience("api.example.com")
    }
}

fn bench_verify(c: &mut Criterion) {
    use helpers::*;

    let mut group = c.benchmark_group("chain_verify");

    for algorithm in [Algorithm::EdDSA, Algorithm::ES256, Algorithm::ES384] {
        let authority = key(algorithm, "E29A899C");
        let delegate = key(algorithm, "BE60DFC8-K1");
        let token = chain(&authority, &delegate);
        let config = config(&authority);

        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &token,
            |b, token| {
                b.iter(|| verify(black_box(token), &config).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_create(c: &mut Criterion) {
    use helpers::*;

    let authority = key(Algorithm::EdDSA, "E29A899C");
    let delegate = key(Algorithm::EdDSA, "BE60DFC8-K1");
    let inner = create_inner(
        claims().jwt_id("03EC5EF4"),
        [TrustJwkClaim::new(&delegate.public_jwk().unwrap())],
        &authority,
    )
    .unwrap();

    c.bench_function("chain_create_outer", |b| {
        b.iter(|| {
            create(&CreateOptions::new(
                claims().subject("BE60DFC8"),
                &delegate,
                black_box(inner.as_str()),
            ))
            .unwrap()
        });
    });
}

fn bench_rejections(c: &mut Criterion) {
    use helpers::*;

    let authority = key(Algorithm::EdDSA, "E29A899C");
    let delegate = key(Algorithm::EdDSA, "BE60DFC8-K1");
    let config = config(&authority);

    let mut group = c.benchmark_group("chain_reject");

    let oversized = create(&CreateOptions::new(
        claims(),
        &delegate,
        "a".repeat(DEFAULT_MAX_CHAIN_LENGTH + 1),
    ))
    .unwrap();
    group.bench_function("chain_too_large", |b| {
        b.iter(|| verify(black_box(&oversized), &config).unwrap_err());
    });

    let rogue = key(Algorithm::EdDSA, "E29A899C");
    let forged = chain(&rogue, &delegate);
    group.bench_function("inner_signature_invalid", |b| {
        b.iter(|| verify(black_box(&forged), &config).unwrap_err());
    });

    group.finish();
}

criterion_group!(benches, bench_verify, bench_create, bench_rejections);
criterion_main!(benches);
