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

//! Signed attestation statements and their DSSE envelopes.
//!
//! A [`Statement`] asserts "this URL has this digest". It is serialized
//! exactly once; those bytes become the envelope payload and are what the
//! signature covers (through the DSSE Pre-Authentication Encoding), so an
//! independent verifier observes the same bytes this process signed.
//!
//! See: <https://github.com/secure-systems-lab/dsse/blob/v1.0.0/envelope.md>

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SgetError};

/// Type tag carried by every statement this tool produces.
pub const STATEMENT_TYPE: &str = "sget-fetched";

/// Payload type recorded in the envelope.
pub const PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// An attestation that the content at `subject[].name` had the given digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    #[serde(rename = "_type")]
    pub statement_type: String,
    pub subject: Vec<Subject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub digest: SubjectDigest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectDigest {
    pub sha256: String,
}

impl Statement {
    /// Build the statement for a fetched URL and its hex-encoded digest.
    pub fn for_url(url: &str, sha256_hex: &str) -> Self {
        Statement {
            statement_type: STATEMENT_TYPE.to_string(),
            subject: vec![Subject {
                name: url.to_string(),
                digest: SubjectDigest {
                    sha256: sha256_hex.to_string(),
                },
            }],
        }
    }
}

/// A signed, content-type-tagged envelope over the exact statement bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub payload_type: String,
    /// base64 of the serialized statement bytes, carried verbatim.
    pub payload: String,
    pub signatures: Vec<EnvelopeSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvelopeSignature {
    pub sig: String,
}

/// Compute the DSSE Pre-Authentication Encoding:
///
/// ```text
/// "DSSEv1" + SP + LEN(type) + SP + type + SP + LEN(payload) + SP + payload
/// ```
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut pae = format!("DSSEv1 {} {} ", payload_type.len(), payload_type).into_bytes();
    pae.extend_from_slice(format!("{} ", payload.len()).as_bytes());
    pae.extend_from_slice(payload);
    pae
}

impl Envelope {
    /// Serialize `statement` and sign its PAE with the ephemeral key.
    ///
    /// The signature is ASN.1 DER-encoded ECDSA over SHA-256 of the PAE.
    pub fn sign(statement: &Statement, key: &SigningKey) -> Result<Envelope> {
        let payload = serde_json::to_vec(statement)?;
        let signature: Signature = key.sign(&pae(PAYLOAD_TYPE, &payload));
        Ok(Envelope {
            payload_type: PAYLOAD_TYPE.to_string(),
            payload: BASE64_STD_ENGINE.encode(&payload),
            signatures: vec![EnvelopeSignature {
                sig: BASE64_STD_ENGINE.encode(signature.to_der().as_bytes()),
            }],
        })
    }

    /// Check the envelope's signature against `key` and return the decoded
    /// statement. Succeeds if any carried signature verifies.
    pub fn verify(&self, key: &VerifyingKey) -> Result<Statement> {
        let payload = BASE64_STD_ENGINE.decode(&self.payload)?;
        let pae = pae(&self.payload_type, &payload);
        for signature in &self.signatures {
            let der = BASE64_STD_ENGINE.decode(&signature.sig)?;
            let signature = Signature::from_der(&der)?;
            if key.verify(&pae, &signature).is_ok() {
                return Ok(serde_json::from_slice(&payload)?);
            }
        }
        Err(SgetError::EnvelopeVerificationError)
    }

    /// The JSON form submitted to the transparency log.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pae_format() {
        let result = pae("application/test", b"test payload");
        assert_eq!(result, b"DSSEv1 16 application/test 12 test payload");
    }

    #[test]
    fn pae_prefixes_the_statement_payload() {
        let result = pae(PAYLOAD_TYPE, b"{\"_type\":\"sget-fetched\"}");
        assert!(result.starts_with(b"DSSEv1 28 application/vnd.in-toto+json "));
        assert!(result.ends_with(b" {\"_type\":\"sget-fetched\"}"));
    }

    #[test]
    fn statement_serialization_shape() {
        let statement = Statement::for_url("https://example.test/artifact", "abc123");
        let json = serde_json::to_value(&statement).unwrap();
        assert_eq!(json["_type"], STATEMENT_TYPE);
        assert_eq!(json["subject"][0]["name"], "https://example.test/artifact");
        assert_eq!(json["subject"][0]["digest"]["sha256"], "abc123");
    }

    #[test]
    fn sign_then_verify_roundtrip() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");

        let envelope = Envelope::sign(&statement, &key).unwrap();
        let recovered = envelope.verify(key.verifying_key()).unwrap();

        assert_eq!(recovered, statement);
        assert_eq!(recovered.subject[0].name, "https://example.test/artifact");
        assert_eq!(recovered.subject[0].digest.sha256, "abc123");
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let other = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");

        let envelope = Envelope::sign(&statement, &key).unwrap();
        assert!(matches!(
            envelope.verify(other.verifying_key()),
            Err(SgetError::EnvelopeVerificationError)
        ));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");

        let mut envelope = Envelope::sign(&statement, &key).unwrap();
        let tampered = Statement::for_url("https://example.test/artifact", "deadbeef");
        envelope.payload = BASE64_STD_ENGINE.encode(serde_json::to_vec(&tampered).unwrap());

        assert!(envelope.verify(key.verifying_key()).is_err());
    }

    #[test]
    fn envelope_json_shape() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");
        let envelope = Envelope::sign(&statement, &key).unwrap();

        let json: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(json["payloadType"], PAYLOAD_TYPE);
        assert!(json["payload"].is_string());
        assert_eq!(json["signatures"].as_array().unwrap().len(), 1);
        assert!(json["signatures"][0]["sig"].is_string());
    }

    #[test]
    fn payload_bytes_survive_the_envelope_verbatim() {
        let key = SigningKey::random(&mut rand::thread_rng());
        let statement = Statement::for_url("https://example.test/artifact", "abc123");
        let expected = serde_json::to_vec(&statement).unwrap();

        let envelope = Envelope::sign(&statement, &key).unwrap();
        let carried = BASE64_STD_ENGINE.decode(&envelope.payload).unwrap();
        assert_eq!(carried, expected);
    }
}
