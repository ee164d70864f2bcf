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

use const_oid::db::rfc5280::ID_KP_CODE_SIGNING;
use webpki::{
    types::{CertificateDer, TrustAnchor, UnixTime},
    EndEntityCert, KeyUsage,
};

use crate::errors::{Result, SgetError};

/// The trust anchors for one verification run: the CA root chain fetched at
/// the start of that run, and nothing else. The system trust store is never
/// consulted, and pools are not cached across runs.
#[derive(Default, Debug)]
pub struct CertificatePool {
    trusted_roots: Vec<TrustAnchor<'static>>,
}

impl CertificatePool {
    /// Build a pool from a PEM bundle. Every certificate in the bundle
    /// becomes a trust anchor.
    pub fn from_pem_bundle(bundle: &[u8]) -> Result<CertificatePool> {
        let blocks = pem::parse_many(bundle)?;
        if blocks.is_empty() {
            return Err(SgetError::CertificatePoolError(
                "no certificates in CA root bundle".to_string(),
            ));
        }

        let trusted_roots = blocks
            .iter()
            .map(|block| {
                if block.tag() != "CERTIFICATE" {
                    return Err(SgetError::CertificatePoolError(
                        "PEM block in CA root bundle is not a certificate".to_string(),
                    ));
                }
                let der = CertificateDer::from(block.contents());
                Ok(webpki::anchor_from_trusted_cert(&der)?.to_owned())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CertificatePool { trusted_roots })
    }

    /// Ensure the DER-encoded certificate chains to one of the pool's roots
    /// for the code-signing key usage, evaluated at `verification_time`.
    ///
    /// Callers pass the certificate's own notBefore instant: expiry is
    /// deliberately not enforced here, the transparency log bounds when a
    /// signature counts.
    pub fn verify_der_cert(&self, der: &[u8], verification_time: UnixTime) -> Result<()> {
        let der = CertificateDer::from(der);
        let cert = EndEntityCert::try_from(&der)?;

        cert.verify_for_usage(
            webpki::ALL_VERIFICATION_ALGS,
            &self.trusted_roots,
            &[],
            verification_time,
            KeyUsage::required(ID_KP_CODE_SIGNING.as_bytes()),
            None,
            None,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::certificate;

    fn pem_der(raw: &[u8]) -> Vec<u8> {
        pem::parse(raw).unwrap().contents().to_vec()
    }

    fn leaf_with_time() -> (Vec<u8>, UnixTime) {
        let der = pem_der(include_bytes!("../../tests/data/certs/leaf.pem"));
        let cert = certificate::parse_der(&der).unwrap();
        let time = certificate::validation_time(&cert).unwrap();
        (der, time)
    }

    #[test]
    fn leaf_validates_against_its_issuing_root() {
        let pool =
            CertificatePool::from_pem_bundle(include_bytes!("../../tests/data/certs/ca.pem"))
                .unwrap();
        let (leaf, time) = leaf_with_time();
        assert!(pool.verify_der_cert(&leaf, time).is_ok());
    }

    #[test]
    fn leaf_fails_against_an_unrelated_root() {
        let pool =
            CertificatePool::from_pem_bundle(include_bytes!("../../tests/data/certs/other-ca.pem"))
                .unwrap();
        let (leaf, time) = leaf_with_time();
        assert!(pool.verify_der_cert(&leaf, time).is_err());
    }

    #[test]
    fn empty_bundle_is_rejected() {
        assert!(matches!(
            CertificatePool::from_pem_bundle(b""),
            Err(SgetError::CertificatePoolError(_))
        ));
    }

    #[test]
    fn garbage_bundle_is_rejected() {
        assert!(CertificatePool::from_pem_bundle(b"not a pem bundle").is_err());
    }
}
