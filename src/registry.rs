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

//! Retrieval of single-layer OCI artifacts.
//!
//! This is the degenerate path for arguments that are not HTTPS URLs: the
//! reference must be pinned by digest, the image must have exactly one
//! layer, and the layer bytes are copied to the sink verbatim. No
//! transparency-log verification happens here.

use oci_client::client::{Client, ClientConfig};
use oci_client::manifest;
use oci_client::secrets::RegistryAuth;
use oci_client::Reference;
use tracing::info;

use crate::errors::{Result, SgetError};

/// Pull the artifact behind a digest-pinned OCI reference and write its
/// single layer to `out`.
pub async fn fetch_image(reference: &str, out: &mut dyn std::io::Write) -> Result<()> {
    let parsed: Reference = reference
        .parse()
        .map_err(|_| SgetError::OciReferenceNotValidError {
            reference: reference.to_string(),
        })?;
    if parsed.digest().is_none() {
        return Err(SgetError::OciReferenceNotValidError {
            reference: reference.to_string(),
        });
    }

    let client = Client::new(ClientConfig::default());
    let image = client
        .pull(
            &parsed,
            &RegistryAuth::Anonymous,
            vec![
                manifest::IMAGE_LAYER_MEDIA_TYPE,
                manifest::IMAGE_LAYER_GZIP_MEDIA_TYPE,
                manifest::IMAGE_DOCKER_LAYER_TAR_MEDIA_TYPE,
                manifest::IMAGE_DOCKER_LAYER_GZIP_MEDIA_TYPE,
            ],
        )
        .await
        .map_err(|e| SgetError::RegistryPullError {
            image: parsed.whole(),
            error: e.to_string(),
        })?;

    if image.layers.len() != 1 {
        return Err(SgetError::UnexpectedLayerCount(image.layers.len()));
    }
    info!(image = %parsed.whole(), "pulled single-layer artifact");
    out.write_all(&image.layers[0].data)?;
    Ok(())
}
