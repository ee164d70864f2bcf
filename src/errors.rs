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

//! The errors that can be raised by sget

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SgetError>;

#[derive(Error, Debug)]
pub enum SgetError {
    #[error("failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("URL must be HTTPS: {0}")]
    NotHttpsUrl(String),

    #[error("GET {url}: unexpected status {status}")]
    UnexpectedHttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {service} timed out")]
    RequestTimeout { service: &'static str },

    #[error("operation cancelled")]
    Cancelled,

    #[error("content was discarded during fetch and cannot be re-read")]
    ContentDiscarded,

    #[error("digest mismatch; got {got:?}, want {want:?}")]
    DigestMismatch { got: String, want: String },

    #[error("found no log entries for URL: {0}")]
    NoLogEntries(String),

    #[error("found no trusted identities for {0}")]
    NoTrustedIdentities(String),

    #[error("Rekor request unsuccessful: {0}")]
    RekorClientError(String),

    #[error("Fulcio request unsuccessful: {0}")]
    FulcioClientError(String),

    #[error("Certificate pool error: {0}")]
    CertificatePoolError(String),

    #[error("Envelope signature verification failed")]
    EnvelopeVerificationError,

    #[error("Unable to parse identity token: {0}")]
    IdentityTokenError(String),

    #[error("failed to construct redirect URL")]
    RedirectUrlRequestLineError,

    #[error("failed to construct oauth code pair")]
    CodePairError,

    #[error("Verification of OIDC claims received from OpenIdProvider failed")]
    ClaimsVerificationError,

    #[error("Failed to get id_token")]
    NoIDToken,

    #[error("OIDC flow failed: {0}")]
    OidcFlowError(String),

    #[error("trust configuration error: {0}")]
    TrustConfigError(String),

    #[error("OCI reference not valid: {reference}")]
    OciReferenceNotValidError { reference: String },

    #[error("Cannot pull {image}: {error}")]
    RegistryPullError { image: String, error: String },

    #[error("image had {0} layers, expected one")]
    UnexpectedLayerCount(usize),

    #[error("Pkcs8 spki error: {0}")]
    PKCS8SpkiError(String),

    #[error(transparent)]
    ECDSAError(#[from] ecdsa::Error),

    #[error(transparent)]
    FromPEMError(#[from] pem::PemError),

    #[error(transparent)]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDeserializeError(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error(transparent)]
    X509ParseError(#[from] x509_cert::der::Error),

    #[error(transparent)]
    WebPKIError(#[from] webpki::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    JoinError(#[from] tokio::task::JoinError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error("{0}")]
    UnexpectedError(String),
}

/// Classify a reqwest failure against `service`, keeping timeout expiry
/// distinct from other transport errors.
pub(crate) fn http_error(service: &'static str, err: reqwest::Error) -> SgetError {
    if err.is_timeout() {
        SgetError::RequestTimeout { service }
    } else {
        SgetError::ReqwestError(err)
    }
}
