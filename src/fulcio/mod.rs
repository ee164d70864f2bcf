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

//! Client for the Fulcio certificate authority.
//!
//! Fulcio issues short-lived signing certificates binding an ephemeral
//! public key to an OIDC identity, and publishes the root chain those
//! certificates chain to. A verification run fetches the root chain fresh
//! and uses it as the sole trust anchor for that run.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use serde::Serialize;
use url::Url;

use crate::errors::{http_error, Result, SgetError};
use crate::oauth::IdentityToken;

/// Default public Fulcio server root.
pub const FULCIO_ROOT: &str = "https://fulcio.sigstore.dev/";

/// Path within Fulcio to obtain the CA root chain.
pub const ROOT_CERT_PATH: &str = "api/v1/rootCert";

/// Path within Fulcio to obtain a signing certificate.
pub const SIGNING_CERT_PATH: &str = "api/v1/signingCert";

const CONTENT_TYPE_HEADER_NAME: &str = "content-type";

#[derive(Serialize, Debug)]
struct PublicKey {
    algorithm: &'static str,
    /// base64 of the SPKI DER encoding.
    content: String,
}

/// Certificate request: a public key and a proof-of-possession signature
/// over the identity token's subject, made with the key being certified.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CertificateRequest {
    public_key: PublicKey,
    signed_email_address: String,
}

/// The PEM chain returned by Fulcio: the issued leaf first, then the
/// intermediates up to the root.
#[derive(Debug, Clone)]
pub struct CertificateResponse {
    pub cert_pem: String,
    pub chain_pem: Vec<String>,
}

pub struct FulcioClient {
    root_url: Url,
    client: reqwest::Client,
}

impl FulcioClient {
    /// Create a new Fulcio client for the given server root URL.
    pub fn new(root_url: Url, timeout: Duration) -> Result<FulcioClient> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(FulcioClient { root_url, client })
    }

    /// Fetch the CA root certificate chain as PEM bytes.
    pub async fn root_cert(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.root_url.join(ROOT_CERT_PATH)?)
            .send()
            .await
            .map_err(|e| http_error("fulcio", e))?;
        let response = Self::ok_or_error("fetching root chain", response).await?;
        let bytes = response.bytes().await.map_err(|e| http_error("fulcio", e))?;
        Ok(bytes.to_vec())
    }

    /// Request a signing certificate for `public_key_der` (SPKI DER).
    ///
    /// `proof_of_possession` is an ECDSA signature over the SHA-256 hash of
    /// the token's subject, produced with the private key being certified;
    /// Fulcio verifies the binding server-side. Any failure response,
    /// including one carrying no certificate, is a hard error.
    pub async fn signing_cert(
        &self,
        public_key_der: &[u8],
        proof_of_possession: &[u8],
        token: &IdentityToken,
    ) -> Result<CertificateResponse> {
        let request = CertificateRequest {
            public_key: PublicKey {
                algorithm: "ecdsa",
                content: BASE64_STD_ENGINE.encode(public_key_der),
            },
            signed_email_address: BASE64_STD_ENGINE.encode(proof_of_possession),
        };

        let response = self
            .client
            .post(self.root_url.join(SIGNING_CERT_PATH)?)
            .header(CONTENT_TYPE_HEADER_NAME, "application/json")
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| http_error("fulcio", e))?;
        let response = Self::ok_or_error("requesting signing certificate", response).await?;

        let bundle = response.text().await.map_err(|e| http_error("fulcio", e))?;
        Self::split_chain(&bundle)
    }

    /// The response body is a PEM bundle with the issued leaf first.
    fn split_chain(bundle: &str) -> Result<CertificateResponse> {
        let blocks = pem::parse_many(bundle.as_bytes())?;
        let mut certs = blocks.iter().map(pem::encode);
        let cert_pem = certs.next().ok_or_else(|| {
            SgetError::FulcioClientError("no certificate in signing response".to_string())
        })?;
        Ok(CertificateResponse {
            cert_pem,
            chain_pem: certs.collect(),
        })
    }

    async fn ok_or_error(
        context: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let content = response.text().await.unwrap_or_default();
        Err(SgetError::FulcioClientError(format!(
            "{context}: status {status}: {content}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_request_wire_shape() {
        let request = CertificateRequest {
            public_key: PublicKey {
                algorithm: "ecdsa",
                content: BASE64_STD_ENGINE.encode(b"spki"),
            },
            signed_email_address: BASE64_STD_ENGINE.encode(b"proof"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["publicKey"]["algorithm"], "ecdsa");
        assert!(json["publicKey"]["content"].is_string());
        assert!(json["signedEmailAddress"].is_string());
    }

    #[test]
    fn split_chain_separates_leaf_from_intermediates() {
        let ca = include_str!("../../tests/data/certs/ca.pem");
        let leaf = include_str!("../../tests/data/certs/leaf.pem");
        let bundle = format!("{leaf}{ca}");

        let response = FulcioClient::split_chain(&bundle).unwrap();
        assert!(response.cert_pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(response.chain_pem.len(), 1);

        let leaf_der = pem::parse(leaf.as_bytes()).unwrap();
        let returned = pem::parse(response.cert_pem.as_bytes()).unwrap();
        assert_eq!(returned.contents(), leaf_der.contents());
    }

    #[test]
    fn empty_signing_response_is_an_error() {
        assert!(matches!(
            FulcioClient::split_chain(""),
            Err(SgetError::FulcioClientError(_))
        ));
    }
}
