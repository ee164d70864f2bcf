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

//! Identity-token acquisition.
//!
//! Three mutually exclusive strategies, resolved once per sign invocation:
//! a pre-supplied static token, the device-authorization flow for
//! non-interactive environments, and the browser-based authorization-code
//! flow. All converge on one signed identity token.

pub mod deviceflow;
pub mod openidflow;
pub mod token;

pub use deviceflow::DeviceFlowProvider;
pub use openidflow::OauthTokenProvider;
pub use token::IdentityToken;

use crate::errors::Result;

/// Default client id ("sigstore").
pub const DEFAULT_CLIENT_ID: &str = "sigstore";

/// Default client secret (the empty string).
pub const DEFAULT_CLIENT_SECRET: &str = "";

/// Default issuer (OAuth provider at sigstore.dev).
pub const DEFAULT_ISSUER: &str = "https://oauth2.sigstore.dev/auth";

/// Default local redirect port (8080).
pub const DEFAULT_REDIRECT_PORT: u16 = 8080;

/// Provider for the signing identity token.
#[allow(clippy::large_enum_variant)]
pub enum TokenProvider {
    /// A pre-supplied token, used verbatim with no network call.
    Static(IdentityToken),
    /// Device-authorization flow for non-interactive environments.
    Device(DeviceFlowProvider),
    /// Browser-based authorization-code flow.
    Interactive(OauthTokenProvider),
}

impl TokenProvider {
    /// Retrieve the identity token from the provider.
    pub async fn get_token(&self) -> Result<IdentityToken> {
        match self {
            TokenProvider::Static(token) => Ok(token.clone()),
            TokenProvider::Device(provider) => provider.get_token().await,
            TokenProvider::Interactive(provider) => provider.get_token().await,
        }
    }
}
