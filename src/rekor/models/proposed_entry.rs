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

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use serde::{Deserialize, Serialize};

use crate::dsse::Envelope;
use crate::errors::Result;

/// An entry proposed to the log by the signing path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProposedEntry {
    Intoto {
        #[serde(rename = "apiVersion")]
        api_version: String,
        spec: IntotoSpec,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntotoSpec {
    pub content: IntotoContent,
    /// base64 of the PEM-encoded signing certificate.
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntotoContent {
    /// The signed envelope, serialized to JSON.
    pub envelope: String,
}

impl ProposedEntry {
    /// Wrap a signed envelope and its certificate as an intoto v0.0.1 entry.
    pub fn intoto(envelope: &Envelope, certificate_pem: &str) -> Result<ProposedEntry> {
        Ok(ProposedEntry::Intoto {
            api_version: "0.0.1".to_string(),
            spec: IntotoSpec {
                content: IntotoContent {
                    envelope: envelope.to_json()?,
                },
                public_key: BASE64_STD_ENGINE.encode(certificate_pem),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsse::{Statement, PAYLOAD_TYPE};
    use p256::ecdsa::SigningKey;

    #[test]
    fn proposed_entry_wire_shape() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");
        let envelope = Envelope::sign(&statement, &key).unwrap();

        let proposed = ProposedEntry::intoto(&envelope, "-----BEGIN CERTIFICATE-----\n").unwrap();
        let json = serde_json::to_value(&proposed).unwrap();

        assert_eq!(json["kind"], "intoto");
        assert_eq!(json["apiVersion"], "0.0.1");
        assert!(json["spec"]["publicKey"].is_string());

        // The envelope travels as a JSON string inside the entry.
        let inner: Envelope =
            serde_json::from_str(json["spec"]["content"]["envelope"].as_str().unwrap()).unwrap();
        assert_eq!(inner.payload_type, PAYLOAD_TYPE);
        assert_eq!(inner, envelope);
    }

    #[test]
    fn public_key_field_is_base64_of_the_pem() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");
        let envelope = Envelope::sign(&statement, &key).unwrap();

        let pem = "-----BEGIN CERTIFICATE-----\nZm9v\n-----END CERTIFICATE-----\n";
        let ProposedEntry::Intoto { spec, .. } = ProposedEntry::intoto(&envelope, pem).unwrap();
        assert_eq!(
            BASE64_STD_ENGINE.decode(spec.public_key).unwrap(),
            pem.as_bytes()
        );
    }
}
