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

use crate::errors::Result;

/// An integrated entry as returned by Rekor. The log is the sole writer;
/// entries are immutable once returned.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Identifier assigned by the log. Carried as the response map key
    /// rather than a field, so it is filled in by the client.
    #[serde(skip)]
    pub uuid: String,
    /// base64-encoded JSON payload.
    pub body: String,
    pub integrated_time: i64,
    pub log_i_d: String,
    pub log_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

/// Stores the signature over the entry's logID, logIndex, body and
/// integratedTime.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion_proof: Option<InclusionProof>,
    pub signed_entry_timestamp: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub hashes: Vec<String>,
    pub log_index: i64,
    pub root_hash: String,
    pub tree_size: i64,
}

/// The decoded body of an attestation entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryBody {
    pub api_version: String,
    pub kind: String,
    pub spec: EntrySpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySpec {
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    /// base64 of the PEM-encoded certificate the entry was signed under.
    pub public_key: String,
}

impl LogEntry {
    /// Decode the base64-wrapped JSON body. Malformed base64 or JSON is an
    /// error; the caller treats it as fatal for the whole verification.
    pub fn decode_body(&self) -> Result<EntryBody> {
        let raw = BASE64_STD_ENGINE.decode(&self.body)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

impl EntrySpec {
    /// The DER bytes of the embedded certificate: base64 around a PEM block.
    pub fn certificate_der(&self) -> Result<Vec<u8>> {
        let pem_bytes = BASE64_STD_ENGINE.decode(&self.public_key)?;
        let block = pem::parse(pem_bytes)?;
        Ok(block.contents().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned_entry() -> LogEntry {
        let body = serde_json::json!({
            "apiVersion": "0.0.1",
            "kind": "intoto",
            "spec": {
                "content": { "hash": { "algorithm": "sha256", "value": "aa".repeat(32) } },
                "publicKey": BASE64_STD_ENGINE.encode(
                    include_bytes!("../../../tests/data/certs/leaf.pem")
                ),
            },
        });
        LogEntry {
            uuid: "73ae9e2d9b9c4b4c3870dbbba3c45ba88e0156e3cee53975e6e4f55e6cd64483".to_string(),
            body: BASE64_STD_ENGINE.encode(serde_json::to_vec(&body).unwrap()),
            integrated_time: 1627671000,
            log_i_d: "c0d23d6ad406973f9559f3ba2d1ca01f84147d8ffc5b8445c224f98b9591801d".to_string(),
            log_index: 42,
            verification: None,
        }
    }

    #[test]
    fn decodes_a_wellformed_body() {
        let entry = canned_entry();
        let body = entry.decode_body().unwrap();
        assert_eq!(body.kind, "intoto");
        assert_eq!(body.api_version, "0.0.1");
        assert!(!body.spec.public_key.is_empty());
    }

    #[test]
    fn embedded_certificate_parses_to_der() {
        let entry = canned_entry();
        let der = entry.decode_body().unwrap().spec.certificate_der().unwrap();
        let expected = pem::parse(include_bytes!("../../../tests/data/certs/leaf.pem"))
            .unwrap()
            .contents()
            .to_vec();
        assert_eq!(der, expected);
    }

    #[test]
    fn malformed_base64_body_is_an_error() {
        let mut entry = canned_entry();
        entry.body = "!!! not base64 !!!".to_string();
        assert!(entry.decode_body().is_err());
    }

    #[test]
    fn malformed_json_body_is_an_error() {
        let mut entry = canned_entry();
        entry.body = BASE64_STD_ENGINE.encode(b"not json");
        assert!(entry.decode_body().is_err());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let entry = canned_entry();
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("integratedTime").is_some());
        assert!(json.get("logID").is_some());
        assert!(json.get("logIndex").is_some());
    }
}
