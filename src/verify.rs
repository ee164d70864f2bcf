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

//! The verification pipeline behind `sget get`.
//!
//! Fetch the URL while computing its digest, corroborate the digest with the
//! transparency log, validate every matching entry's certificate against the
//! CA root chain fetched in this same run, and accept the content only when
//! at least one signing identity intersects the configured trust set.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::crypto::{certificate, CertificatePool};
use crate::errors::{Result, SgetError};
use crate::fetch::{self, FetchedContent};
use crate::fulcio::FulcioClient;
use crate::rekor::RekorClient;
use crate::trust::{self, TrustConfig};

/// Options for one verification run. The trust-store path is resolved once
/// and passed in by value; nothing here is read from global state.
pub struct VerifyOpts {
    pub url: String,
    /// If set, the fetched content must have this sha256 digest. Checked
    /// before any log query.
    pub want_digest: Option<String>,
    pub fulcio_url: Url,
    pub rekor_url: Url,
    pub timeout: Duration,
    pub trust_config_path: PathBuf,
}

/// A successful verification: the content itself plus the evidence for why
/// it was accepted.
pub struct Verification {
    pub content: FetchedContent,
    /// Every identity that signed for the digest, per the log.
    pub signers: BTreeSet<String>,
    /// The non-empty intersection with the configured trust set.
    pub trusted: BTreeSet<String>,
}

/// Fetch `opts.url` and verify it against the transparency log.
///
/// Entries are validated sequentially, in the order the search returned
/// them, and the loop aborts on the first error: one corrupt or invalid
/// entry fails the whole verification rather than being skipped.
pub async fn get(opts: &VerifyOpts, cancel: &CancellationToken) -> Result<Verification> {
    let url = Url::parse(&opts.url)?;
    if url.scheme() != "https" {
        return Err(SgetError::NotHttpsUrl(opts.url.clone()));
    }
    let host = url.host_str().unwrap_or_default().to_string();

    let http = reqwest::Client::builder().timeout(opts.timeout).build()?;
    let content = fetch::fetch(&http, &opts.url, false, cancel).await?;
    if let Some(want) = &opts.want_digest {
        if want != content.digest() {
            return Err(SgetError::DigestMismatch {
                got: content.digest().to_string(),
                want: want.clone(),
            });
        }
    }
    info!(digest = %content.digest(), "fetched URL");

    let fulcio = FulcioClient::new(opts.fulcio_url.clone(), opts.timeout)?;
    let root_chain = crate::cancellable(cancel, fulcio.root_cert()).await?;
    let pool = CertificatePool::from_pem_bundle(&root_chain)?;

    let rekor = RekorClient::new(opts.rekor_url.clone(), opts.timeout)?;
    let uuids = crate::cancellable(cancel, rekor.search_index(content.digest())).await?;
    if uuids.is_empty() {
        return Err(SgetError::NoLogEntries(opts.url.clone()));
    }
    debug!(count = uuids.len(), "log entries matched the digest");

    let mut signers = BTreeSet::new();
    for uuid in &uuids {
        let entry = crate::cancellable(cancel, rekor.get_log_entry(uuid)).await?;
        let body = entry.decode_body()?;
        let der = body.spec.certificate_der()?;

        // Only the digest ties this entry to the fetched URL; the URL named
        // inside the signed statement is not compared against it.
        let cert = certificate::parse_der(&der)?;
        pool.verify_der_cert(&der, certificate::validation_time(&cert)?)?;

        let emails = certificate::subject_emails(&cert)?;
        if emails.len() != 1 {
            warn!(uuid = %uuid, identities = ?emails, "unexpected number of identities in certificate");
        }
        signers.extend(emails);
    }

    let config = TrustConfig::load(&opts.trust_config_path)?;
    let trusted = config.trusted_identities(&host);
    info!(count = signers.len(), url = %opts.url, "identities have signed for this URL");
    debug!(signers = ?signers, "signing identities");

    let matched = trust::intersect(&signers, &trusted);
    if matched.is_empty() {
        return Err(SgetError::NoTrustedIdentities(opts.url.clone()));
    }
    info!(identities = ?matched, "found trusted identities");

    Ok(Verification {
        content,
        signers,
        trusted: matched,
    })
}
