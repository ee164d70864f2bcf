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

//! Interactive OIDC: authorization-code flow with PKCE, a local redirect
//! listener, and the user's browser.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;

use openidconnect::core::{CoreClient, CoreProviderMetadata, CoreResponseType};
use openidconnect::reqwest::async_http_client;
use openidconnect::{
    AuthenticationFlow, AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce,
    PkceCodeChallenge, RedirectUrl, Scope, TokenResponse,
};
use tracing::info;
use url::Url;

use crate::errors::{Result, SgetError};
use crate::oauth::token::IdentityToken;
use crate::oauth::{DEFAULT_CLIENT_ID, DEFAULT_CLIENT_SECRET, DEFAULT_ISSUER, DEFAULT_REDIRECT_PORT};

/// Token provider that performs a human-involved OIDC flow to acquire an
/// identity token.
#[derive(Default)]
pub struct OauthTokenProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    issuer: Option<String>,
    redirect_port: Option<u16>,
}

impl OauthTokenProvider {
    /// Set a non-default client id.
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Set a non-default client secret.
    pub fn with_client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = Some(client_secret.to_string());
        self
    }

    /// Set a non-default issuer.
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    /// Set a non-default redirect port.
    pub fn with_redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = Some(port);
        self
    }

    fn redirect_port(&self) -> u16 {
        self.redirect_port.unwrap_or(DEFAULT_REDIRECT_PORT)
    }

    /// Run the authorization-code flow: discover the provider, open the
    /// authorization URL in a browser, accept the redirect on a local
    /// listener and exchange the code for an identity token.
    pub async fn get_token(&self) -> Result<IdentityToken> {
        let issuer = IssuerUrl::new(
            self.issuer
                .clone()
                .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
        )
        .map_err(|e| SgetError::OidcFlowError(format!("invalid issuer: {e}")))?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer, async_http_client)
            .await
            .map_err(|e| SgetError::OidcFlowError(format!("provider discovery failed: {e}")))?;

        let client_secret = self
            .client_secret
            .clone()
            .unwrap_or_else(|| DEFAULT_CLIENT_SECRET.to_string());
        let client_secret = (!client_secret.is_empty()).then(|| ClientSecret::new(client_secret));

        let redirect_url = RedirectUrl::new(format!("http://localhost:{}/", self.redirect_port()))?;
        let client = CoreClient::from_provider_metadata(
            provider_metadata,
            ClientId::new(
                self.client_id
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            ),
            client_secret,
        )
        .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (authorize_url, csrf_token, nonce) = client
            .authorize_url(
                AuthenticationFlow::<CoreResponseType>::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        if webbrowser::open(authorize_url.as_str()).is_err() {
            info!("could not open a browser automatically");
        }
        eprintln!(
            "Open this URL in a browser if it does not automatically open for you:\n{authorize_url}\n"
        );

        let port = self.redirect_port();
        let (code, state) = tokio::task::spawn_blocking(move || redirect_listener(port)).await??;
        if state.secret() != csrf_token.secret() {
            return Err(SgetError::OidcFlowError(
                "state mismatch in OIDC redirect".to_string(),
            ));
        }

        let token_response = client
            .exchange_code(code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| SgetError::OidcFlowError(format!("token exchange failed: {e}")))?;

        let id_token = token_response.id_token().ok_or(SgetError::NoIDToken)?;
        id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|_| SgetError::ClaimsVerificationError)?;

        IdentityToken::try_from(id_token.to_string().as_str())
    }
}

/// Accept a single redirect on the local listener and pull the code/state
/// pair out of the request line.
fn redirect_listener(port: u16) -> Result<(AuthorizationCode, CsrfToken)> {
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    let (mut stream, _) = listener.accept()?;

    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line)?;

    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or(SgetError::RedirectUrlRequestLineError)?;
    let url = Url::parse(&format!("http://localhost{path}"))?;

    let code = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| AuthorizationCode::new(value.into_owned()))
        .ok_or(SgetError::CodePairError)?;
    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| CsrfToken::new(value.into_owned()))
        .ok_or(SgetError::CodePairError)?;

    let html_page = "<html><title>sget Auth</title><body><h1>Authentication successful</h1><p>You may now close this page.</p></body></html>";
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n{}",
        html_page.len(),
        html_page
    );
    stream.write_all(response.as_bytes())?;

    Ok((code, state))
}
