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

//! Content retrieval with streaming digest computation.
//!
//! A fetch issues a single GET and streams the response body through a
//! SHA-256 accumulator. The bytes are either discarded (when only the digest
//! is needed, e.g. for signing) or written to a temporary file that can be
//! re-read once verification has succeeded. Both sinks observe exactly the
//! bytes received, so they produce identical digests for identical input.

use std::io::{Read, Seek, SeekFrom, Write};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{http_error, Result, SgetError};

enum Sink {
    Discard,
    Materialize(NamedTempFile),
}

/// Streams chunks into a digest accumulator and, optionally, a temp file.
struct DigestSink {
    hasher: Sha256,
    sink: Sink,
}

impl DigestSink {
    fn new(discard: bool) -> Result<Self> {
        let sink = if discard {
            Sink::Discard
        } else {
            Sink::Materialize(NamedTempFile::new()?)
        };
        Ok(DigestSink {
            hasher: Sha256::new(),
            sink,
        })
    }

    fn absorb(&mut self, chunk: &[u8]) -> Result<()> {
        self.hasher.update(chunk);
        if let Sink::Materialize(file) = &mut self.sink {
            file.write_all(chunk)?;
        }
        Ok(())
    }

    fn finish(self) -> FetchedContent {
        FetchedContent {
            digest: hex::encode(self.hasher.finalize()),
            sink: self.sink,
        }
    }
}

/// The outcome of a fetch: the hex-encoded SHA-256 digest of the received
/// bytes and, unless the fetch discarded them, a re-readable temporary copy.
///
/// The temporary file is removed when the value is dropped, on every exit
/// path.
pub struct FetchedContent {
    digest: String,
    sink: Sink,
}

impl FetchedContent {
    /// Hex-encoded SHA-256 of the bytes received.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Reopen the materialized content, rewound to the start.
    pub fn open(&self) -> Result<impl Read> {
        match &self.sink {
            Sink::Discard => Err(SgetError::ContentDiscarded),
            Sink::Materialize(file) => {
                let mut reader = file.reopen()?;
                reader.seek(SeekFrom::Start(0))?;
                Ok(reader)
            }
        }
    }
}

/// Fetch `url`, streaming the body through a digest accumulator.
///
/// A non-200 response is an error carrying the status code and URL. No
/// retries are attempted; redirects follow the client's defaults.
/// Cancellation aborts the transfer and discards any partial temporary file.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    discard: bool,
    cancel: &CancellationToken,
) -> Result<FetchedContent> {
    let mut response = crate::cancellable(cancel, async {
        client.get(url).send().await.map_err(|e| http_error("fetch", e))
    })
    .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(SgetError::UnexpectedHttpStatus {
            url: url.to_string(),
            status,
        });
    }

    let mut sink = DigestSink::new(discard)?;
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SgetError::Cancelled),
            chunk = response.chunk() => chunk.map_err(|e| http_error("fetch", e))?,
        };
        match chunk {
            Some(bytes) => sink.absorb(&bytes)?,
            None => break,
        }
    }

    let content = sink.finish();
    debug!(url, digest = %content.digest(), discard, "fetched");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absorb_all(sink: &mut DigestSink, chunks: &[&[u8]]) {
        for chunk in chunks {
            sink.absorb(chunk).unwrap();
        }
    }

    #[test]
    fn discard_and_materialize_digests_match() {
        let chunks: &[&[u8]] = &[b"hello ", b"transparency", b" log", b""];

        let mut discarding = DigestSink::new(true).unwrap();
        absorb_all(&mut discarding, chunks);
        let discarded = discarding.finish();

        let mut materializing = DigestSink::new(false).unwrap();
        absorb_all(&mut materializing, chunks);
        let materialized = materializing.finish();

        assert_eq!(discarded.digest(), materialized.digest());
    }

    #[test]
    fn digest_matches_known_vector() {
        let mut sink = DigestSink::new(true).unwrap();
        sink.absorb(b"abc").unwrap();
        assert_eq!(
            sink.finish().digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chunking_does_not_change_the_digest() {
        let mut one = DigestSink::new(true).unwrap();
        one.absorb(b"one two three").unwrap();

        let mut many = DigestSink::new(true).unwrap();
        absorb_all(&mut many, &[b"one ", b"two ", b"three"]);

        assert_eq!(one.finish().digest(), many.finish().digest());
    }

    #[test]
    fn materialized_content_is_rereadable() {
        let mut sink = DigestSink::new(false).unwrap();
        absorb_all(&mut sink, &[b"signed ", b"bytes"]);
        let content = sink.finish();

        let mut buf = Vec::new();
        content.open().unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"signed bytes");

        // A second open starts over from the beginning.
        let mut again = Vec::new();
        content.open().unwrap().read_to_end(&mut again).unwrap();
        assert_eq!(again, b"signed bytes");
    }

    #[test]
    fn discarded_content_cannot_be_opened() {
        let mut sink = DigestSink::new(true).unwrap();
        sink.absorb(b"gone").unwrap();
        let content = sink.finish();
        assert!(matches!(
            content.open().map(|_| ()),
            Err(SgetError::ContentDiscarded)
        ));
    }
}
