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

//! sget fetches content from an HTTPS URL and accepts it only if a
//! transparency log holds an entry binding the content's digest to a
//! certificate whose identity the local user trusts.
//!
//! The two top-level operations are [`verify::get`] and [`sign::sign`]:
//!
//! * `get` streams the URL body through a SHA-256 accumulator, looks the
//!   digest up in Rekor, validates each entry's embedded certificate against
//!   the Fulcio root chain fetched in the same run, and emits the content
//!   only when at least one signing identity is also configured as trusted
//!   (globally or for the URL's host).
//! * `sign` computes the digest of a URL's content, obtains an OIDC identity
//!   token, requests a short-lived signing certificate from Fulcio for an
//!   ephemeral key pair, wraps a `{url, digest}` statement in a signed DSSE
//!   envelope and submits it to Rekor.
//!
//! Trusted identities are managed through [`trust::TrustConfig`], persisted
//! as a TOML file under the user's home directory.

use std::future::Future;

use tokio_util::sync::CancellationToken;

pub mod crypto;
pub mod dsse;
pub mod errors;
pub mod fetch;
pub mod fulcio;
pub mod oauth;
pub mod registry;
pub mod rekor;
pub mod sign;
pub mod trust;
pub mod verify;

use errors::{Result, SgetError};

/// Race `fut` against cancellation of `cancel`. Every blocking call a
/// pipeline makes goes through here so that cancelling the run's token
/// aborts all outstanding I/O.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SgetError::Cancelled),
        res = fut => res,
    }
}
