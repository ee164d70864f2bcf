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

//! The signing pipeline behind `sget sign`.
//!
//! Compute the digest of a URL's content (the bytes themselves are
//! discarded), obtain an identity token, generate an ephemeral P-256 key
//! pair, prove possession of it to the CA in exchange for a short-lived
//! signing certificate, wrap a `{url, digest}` statement in a signed
//! envelope and submit it to the transparency log.
//!
//! There are no compensating actions on partial failure: a certificate
//! already issued is not revoked if log submission fails afterwards.

use std::time::Duration;

use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use p256::pkcs8::EncodePublicKey;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::dsse::{Envelope, Statement};
use crate::errors::{Result, SgetError};
use crate::fetch;
use crate::fulcio::FulcioClient;
use crate::oauth::TokenProvider;
use crate::rekor::models::ProposedEntry;
use crate::rekor::RekorClient;

/// Options for one signing run.
pub struct SignOpts {
    pub url: String,
    /// If set, the fetched content must have this sha256 digest.
    pub want_digest: Option<String>,
    pub fulcio_url: Url,
    pub rekor_url: Url,
    pub timeout: Duration,
}

/// What the log recorded for a completed signing run.
pub struct SignOutcome {
    pub uuid: String,
    pub log_index: i64,
    pub integrated_time: i64,
    pub digest: String,
    pub identity: String,
}

/// Sign for `opts.url` and record the attestation in the transparency log.
pub async fn sign(
    opts: &SignOpts,
    provider: &TokenProvider,
    cancel: &CancellationToken,
) -> Result<SignOutcome> {
    let url = Url::parse(&opts.url)?;
    if url.scheme() != "https" {
        return Err(SgetError::NotHttpsUrl(opts.url.clone()));
    }

    let http = reqwest::Client::builder().timeout(opts.timeout).build()?;
    let content = fetch::fetch(&http, &opts.url, true, cancel).await?;
    if let Some(want) = &opts.want_digest {
        if want != content.digest() {
            return Err(SgetError::DigestMismatch {
                got: content.digest().to_string(),
                want: want.clone(),
            });
        }
    }
    info!(digest = %content.digest(), "fetched URL");

    let token = crate::cancellable(cancel, provider.get_token()).await?;
    info!(identity = %token.identity, "got identity token, signing");

    // Ephemeral key pair and proof of possession: an ECDSA signature over
    // the SHA-256 hash of the token's subject, made with the key being
    // certified.
    let private_key = SigningKey::random(&mut rand::thread_rng());
    let public_key_der = private_key
        .verifying_key()
        .to_public_key_der()
        .map_err(|e| SgetError::PKCS8SpkiError(e.to_string()))?;
    let proof: Signature = private_key.sign(token.subject().as_bytes());

    let fulcio = FulcioClient::new(opts.fulcio_url.clone(), opts.timeout)?;
    let certs = crate::cancellable(
        cancel,
        fulcio.signing_cert(public_key_der.as_bytes(), proof.to_der().as_bytes(), &token),
    )
    .await?;
    info!("got signing certificate");

    let statement = Statement::for_url(&opts.url, content.digest());
    let envelope = Envelope::sign(&statement, &private_key)?;

    let rekor = RekorClient::new(opts.rekor_url.clone(), opts.timeout)?;
    let proposed = ProposedEntry::intoto(&envelope, &certs.cert_pem)?;
    let entry = crate::cancellable(cancel, rekor.create_log_entry(&proposed)).await?;
    info!(uuid = %entry.uuid, log_index = entry.log_index, "transparency log entry created");

    Ok(SignOutcome {
        uuid: entry.uuid,
        log_index: entry.log_index,
        integrated_time: entry.integrated_time,
        digest: content.digest().to_string(),
        identity: token.identity.to_string(),
    })
}
