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

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL_ENGINE, Engine as _};
use serde::Deserialize;

use crate::errors::SgetError;

#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The identity claim the certificate authority binds into the issued
/// certificate: the email claim where present, otherwise the subject.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Sub(String),
    Email(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identity::Sub(sub) => sub.fmt(f),
            Identity::Email(email) => email.fmt(f),
        }
    }
}

/// A signed OIDC identity token.
///
/// The claims are decoded without signature verification; the certificate
/// authority is the party that verifies the token. Locally they only select
/// the value the proof of possession is computed over.
#[derive(Clone)]
pub struct IdentityToken {
    original_token: String,
    claims: Claims,
    pub identity: Identity,
}

impl IdentityToken {
    /// The **unverified** claim set carried by the token.
    pub fn unverified_claims(&self) -> &Claims {
        &self.claims
    }

    /// The subject the proof-of-possession signature covers.
    pub fn subject(&self) -> String {
        self.identity.to_string()
    }
}

impl TryFrom<&str> for IdentityToken {
    type Error = SgetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parts: [&str; 3] = value
            .split('.')
            .collect::<Vec<_>>()
            .try_into()
            .or(Err(SgetError::IdentityTokenError("Malformed JWT".into())))?;

        let claims = BASE64_URL_ENGINE
            .decode(parts[1])
            .or(Err(SgetError::IdentityTokenError(
                "Malformed JWT: Unable to decode claims".into(),
            )))?;
        let claims: Claims = serde_json::from_slice(&claims).or(Err(
            SgetError::IdentityTokenError("Malformed JWT: claims JSON malformed".into()),
        ))?;

        let identity = if let Some(email) = claims.email.as_ref() {
            Identity::Email(email.clone())
        } else if let Some(sub) = claims.sub.as_ref() {
            Identity::Sub(sub.clone())
        } else {
            return Err(SgetError::IdentityTokenError(
                "Neither email nor sub claim found in JWT".into(),
            ));
        };

        Ok(IdentityToken {
            original_token: value.to_owned(),
            claims,
            identity,
        })
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original_token)
    }
}
