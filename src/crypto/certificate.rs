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

use webpki::types::UnixTime;
use x509_cert::der::Decode;
use x509_cert::ext::pkix::{name::GeneralName, SubjectAltName};
use x509_cert::Certificate;

use crate::errors::{Result, SgetError};

/// Parse a DER-encoded certificate extracted from a log entry.
pub fn parse_der(der: &[u8]) -> Result<Certificate> {
    Ok(Certificate::from_der(der)?)
}

/// All rfc822Name (email-shaped) Subject Alternative Name entries.
///
/// Issued signing certificates are expected to carry exactly one; any other
/// count is the caller's to flag.
pub fn subject_emails(certificate: &Certificate) -> Result<Vec<String>> {
    let san = certificate
        .tbs_certificate
        .get::<SubjectAltName>()
        .map_err(SgetError::X509ParseError)?;

    let mut emails = Vec::new();
    if let Some((_, san)) = san {
        for name in san.0.iter() {
            if let GeneralName::Rfc822Name(email) = name {
                emails.push(email.as_str().to_string());
            }
        }
    }
    Ok(emails)
}

/// The reference instant for validating this certificate's chain: its own
/// notBefore timestamp. Once issued, the certificate is treated as durably
/// trusted; the log's record, not the clock, bounds when signatures count.
pub fn validation_time(certificate: &Certificate) -> Result<UnixTime> {
    let not_before = certificate
        .tbs_certificate
        .validity
        .not_before
        .to_system_time();
    let since_epoch = not_before
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map_err(|_| {
            SgetError::CertificatePoolError("certificate notBefore predates the epoch".to_string())
        })?;
    Ok(UnixTime::since_unix_epoch(since_epoch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_cert(raw: &[u8]) -> Certificate {
        let block = pem::parse(raw).unwrap();
        Certificate::from_der(block.contents()).unwrap()
    }

    #[test]
    fn extracts_the_single_email_identity() {
        let cert = load_cert(include_bytes!("../../tests/data/certs/leaf.pem"));
        assert_eq!(subject_emails(&cert).unwrap(), vec!["alice@example.com"]);
    }

    #[test]
    fn extracts_every_email_identity() {
        let cert = load_cert(include_bytes!("../../tests/data/certs/leaf2.pem"));
        assert_eq!(
            subject_emails(&cert).unwrap(),
            vec!["alice@example.com", "bob@example.com"]
        );
    }

    #[test]
    fn certificate_without_san_yields_no_identities() {
        let cert = load_cert(include_bytes!("../../tests/data/certs/ca.pem"));
        assert!(subject_emails(&cert).unwrap().is_empty());
    }

    #[test]
    fn validation_time_is_the_certificates_not_before() {
        let cert = load_cert(include_bytes!("../../tests/data/certs/leaf.pem"));
        let expected = cert
            .tbs_certificate
            .validity
            .not_before
            .to_system_time()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(
            validation_time(&cert).unwrap(),
            UnixTime::since_unix_epoch(expected)
        );
    }
}
