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

//! Device-authorization flow for non-interactive environments.
//!
//! The provider prints a verification URI and user code, then polls the
//! token endpoint until the user approves out of band, the code expires, or
//! the request is denied.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL_ENGINE, Engine as _};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{http_error, Result, SgetError};
use crate::oauth::token::IdentityToken;

#[derive(Debug, Clone, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default)]
    interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct DeviceTokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DeviceErrorResponse {
    error: String,
}

/// Token provider for the device-authorization grant.
pub struct DeviceFlowProvider {
    issuer: String,
    client_id: String,
}

impl DeviceFlowProvider {
    pub fn new(issuer: String, client_id: String) -> Self {
        DeviceFlowProvider { issuer, client_id }
    }

    fn device_authorization_url(&self) -> String {
        format!("{}/device/code", self.issuer.trim_end_matches('/'))
    }

    fn token_url(&self) -> String {
        format!("{}/token", self.issuer.trim_end_matches('/'))
    }

    /// Initiate the device flow and poll until it resolves.
    pub async fn get_token(&self) -> Result<IdentityToken> {
        let client = reqwest::Client::new();

        let mut verifier_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut verifier_bytes);
        let verifier = BASE64_URL_ENGINE.encode(verifier_bytes);
        let challenge = BASE64_URL_ENGINE.encode(Sha256::digest(verifier.as_bytes()));

        let response = client
            .post(self.device_authorization_url())
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", "openid email"),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ])
            .send()
            .await
            .map_err(|e| http_error("oidc", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SgetError::OidcFlowError(format!(
                "device authorization failed: {status}: {body}"
            )));
        }
        let device: DeviceCodeResponse = response.json().await.map_err(|e| http_error("oidc", e))?;

        eprintln!(
            "To authorize this request, visit:\n  {}\nand enter the code:\n  {}\n",
            device.verification_uri, device.user_code
        );

        let mut interval = device.interval.max(1);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(SgetError::OidcFlowError(
                    "device code expired before authorization completed".to_string(),
                ));
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;

            let response = client
                .post(self.token_url())
                .form(&[
                    ("client_id", self.client_id.as_str()),
                    ("device_code", device.device_code.as_str()),
                    ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                    ("code_verifier", verifier.as_str()),
                ])
                .send()
                .await
                .map_err(|e| http_error("oidc", e))?;

            if response.status().is_success() {
                let token: DeviceTokenResponse =
                    response.json().await.map_err(|e| http_error("oidc", e))?;
                let raw = token.id_token.ok_or(SgetError::NoIDToken)?;
                return IdentityToken::try_from(raw.as_str());
            }

            let error: DeviceErrorResponse =
                response.json().await.map_err(|e| http_error("oidc", e))?;
            debug!(error = %error.error, "device flow poll");
            match error.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => {
                    interval += 5;
                    continue;
                }
                "expired_token" => {
                    return Err(SgetError::OidcFlowError("device code expired".to_string()))
                }
                "access_denied" => {
                    return Err(SgetError::OidcFlowError(
                        "user denied authorization".to_string(),
                    ))
                }
                other => {
                    return Err(SgetError::OidcFlowError(format!(
                        "token endpoint error: {other}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_derive_from_the_issuer() {
        let provider = DeviceFlowProvider::new(
            "https://oauth2.sigstore.dev/auth/".to_string(),
            "sigstore".to_string(),
        );
        assert_eq!(
            provider.device_authorization_url(),
            "https://oauth2.sigstore.dev/auth/device/code"
        );
        assert_eq!(
            provider.token_url(),
            "https://oauth2.sigstore.dev/auth/token"
        );
    }
}
