//
// Copyright 2026 The Sigstore Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exercises the per-entry verification steps end to end on canned data:
//! decode a log entry body, extract the embedded certificate, validate it
//! against a root pool at its own notBefore instant, collect the identity,
//! and intersect with a trust configuration.

use std::collections::BTreeSet;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use sget::crypto::{certificate, CertificatePool};
use sget::rekor::models::LogEntry;
use sget::trust::{self, TrustConfig};

const CA_PEM: &[u8] = include_bytes!("data/certs/ca.pem");
const OTHER_CA_PEM: &[u8] = include_bytes!("data/certs/other-ca.pem");
const LEAF_PEM: &[u8] = include_bytes!("data/certs/leaf.pem");

fn entry_with_certificate(cert_pem: &[u8]) -> LogEntry {
    let body = serde_json::json!({
        "apiVersion": "0.0.1",
        "kind": "intoto",
        "spec": {
            "content": {},
            "publicKey": BASE64.encode(cert_pem),
        },
    });
    LogEntry {
        uuid: "d2f4f1d3cc4b4b0d8a86bd6ed8a52535f13ca2c06e3daa29f5bd53e4b5f24a2e".to_string(),
        body: BASE64.encode(serde_json::to_vec(&body).unwrap()),
        integrated_time: 1627671000,
        log_i_d: "c0d23d6ad406973f9559f3ba2d1ca01f84147d8ffc5b8445c224f98b9591801d".to_string(),
        log_index: 7,
        verification: None,
    }
}

fn collect_signer(entry: &LogEntry, pool: &CertificatePool) -> anyhow::Result<Vec<String>> {
    let body = entry.decode_body()?;
    let der = body.spec.certificate_der()?;
    let cert = certificate::parse_der(&der)?;
    pool.verify_der_cert(&der, certificate::validation_time(&cert)?)?;
    Ok(certificate::subject_emails(&cert)?)
}

#[test]
fn validated_entry_contributes_its_identity() -> anyhow::Result<()> {
    let pool = CertificatePool::from_pem_bundle(CA_PEM)?;
    let entry = entry_with_certificate(LEAF_PEM);

    let emails = collect_signer(&entry, &pool)?;
    assert_eq!(emails, vec!["alice@example.com"]);
    Ok(())
}

#[test]
fn entry_failing_chain_validation_contributes_nothing() -> anyhow::Result<()> {
    let pool = CertificatePool::from_pem_bundle(OTHER_CA_PEM)?;
    let entry = entry_with_certificate(LEAF_PEM);

    let mut signers: BTreeSet<String> = BTreeSet::new();
    let result = collect_signer(&entry, &pool);
    assert!(result.is_err());
    // The loop aborts before the identity is ever collected.
    if let Ok(emails) = result {
        signers.extend(emails);
    }
    assert!(signers.is_empty());
    Ok(())
}

#[test]
fn corrupt_entry_body_aborts_verification() -> anyhow::Result<()> {
    let pool = CertificatePool::from_pem_bundle(CA_PEM)?;
    let mut entry = entry_with_certificate(LEAF_PEM);
    entry.body = "%%% not base64 %%%".to_string();

    assert!(collect_signer(&entry, &pool).is_err());
    Ok(())
}

#[test]
fn trust_decision_matches_the_scenario() -> anyhow::Result<()> {
    let pool = CertificatePool::from_pem_bundle(CA_PEM)?;
    let entry = entry_with_certificate(LEAF_PEM);
    let signers: BTreeSet<String> = collect_signer(&entry, &pool)?.into_iter().collect();

    // Trust config lists the signer globally: acceptance, with the signer
    // reported as the evidence.
    let mut config = TrustConfig::default();
    config.update(&["alice@example.com".to_string()], None, false);
    let matched = trust::intersect(&signers, &config.trusted_identities("example.test"));
    assert_eq!(
        matched.into_iter().collect::<Vec<_>>(),
        vec!["alice@example.com"]
    );

    // Empty trust config: empty intersection, no acceptance.
    let empty = TrustConfig::default();
    let matched = trust::intersect(&signers, &empty.trusted_identities("example.test"));
    assert!(matched.is_empty());
    Ok(())
}
