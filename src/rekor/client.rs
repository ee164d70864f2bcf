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

//! Rekor v1 API client.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use url::Url;

use super::models::{LogEntry, ProposedEntry};
use crate::errors::{http_error, Result, SgetError};

/// Default public Rekor server root.
pub const REKOR_ROOT: &str = "https://rekor.sigstore.dev";

const SEARCH_INDEX_PATH: &str = "api/v1/index/retrieve";
const LOG_ENTRIES_PATH: &str = "api/v1/log/entries";

#[derive(Serialize, Debug)]
struct SearchIndex {
    hash: String,
}

/// Client for the Rekor v1 API (`/api/v1/...`), JSON request/response.
///
/// Every call runs under the timeout the client was built with; timeout
/// expiry surfaces as [`SgetError::RequestTimeout`], distinct from decode
/// failures.
pub struct RekorClient {
    base_url: Url,
    client: reqwest::Client,
}

impl RekorClient {
    /// Create a new Rekor client for the given base URL.
    pub fn new(base_url: Url, timeout: Duration) -> Result<RekorClient> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(RekorClient { base_url, client })
    }

    /// Look up entry identifiers by content digest. An empty list is a valid
    /// response here; the pipeline decides what it means.
    pub async fn search_index(&self, sha256_hex: &str) -> Result<Vec<String>> {
        let query = SearchIndex {
            hash: format!("sha256:{sha256_hex}"),
        };
        let response = self
            .client
            .post(self.base_url.join(SEARCH_INDEX_PATH)?)
            .json(&query)
            .send()
            .await
            .map_err(|e| http_error("rekor", e))?;
        let response = Self::ok_or_error("searching index", response).await?;
        response.json().await.map_err(|e| http_error("rekor", e))
    }

    /// Retrieve a full entry by the identifier the log assigned to it.
    pub async fn get_log_entry(&self, uuid: &str) -> Result<LogEntry> {
        let response = self
            .client
            .get(self.base_url.join(&format!("{LOG_ENTRIES_PATH}/{uuid}"))?)
            .send()
            .await
            .map_err(|e| http_error("rekor", e))?;
        let response = Self::ok_or_error("getting entry", response).await?;
        let entries: HashMap<String, LogEntry> =
            response.json().await.map_err(|e| http_error("rekor", e))?;
        Self::single_entry(entries)
    }

    /// Submit a proposed entry; the response carries the assigned identifier
    /// and integration metadata.
    pub async fn create_log_entry(&self, proposed: &ProposedEntry) -> Result<LogEntry> {
        let response = self
            .client
            .post(self.base_url.join(LOG_ENTRIES_PATH)?)
            .json(proposed)
            .send()
            .await
            .map_err(|e| http_error("rekor", e))?;
        let response = Self::ok_or_error("creating entry", response).await?;
        let entries: HashMap<String, LogEntry> =
            response.json().await.map_err(|e| http_error("rekor", e))?;
        Self::single_entry(entries)
    }

    /// Rekor keys entry responses by uuid; exactly one entry is expected.
    fn single_entry(entries: HashMap<String, LogEntry>) -> Result<LogEntry> {
        let mut entries = entries.into_iter();
        match (entries.next(), entries.next()) {
            (Some((uuid, mut entry)), None) => {
                entry.uuid = uuid;
                Ok(entry)
            }
            (None, _) => Err(SgetError::RekorClientError(
                "response contained no entry".to_string(),
            )),
            _ => Err(SgetError::RekorClientError(
                "response contained more than one entry".to_string(),
            )),
        }
    }

    async fn ok_or_error(
        context: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let content = response.text().await.unwrap_or_default();
        Err(SgetError::RekorClientError(format!(
            "{context}: status {status}: {content}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_takes_the_uuid_from_the_map_key() {
        let mut entries = HashMap::new();
        entries.insert("abc123".to_string(), LogEntry::default());
        let entry = RekorClient::single_entry(entries).unwrap();
        assert_eq!(entry.uuid, "abc123");
    }

    #[test]
    fn empty_response_map_is_an_error() {
        assert!(RekorClient::single_entry(HashMap::new()).is_err());
    }

    #[test]
    fn multi_entry_response_map_is_an_error() {
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), LogEntry::default());
        entries.insert("b".to_string(), LogEntry::default());
        assert!(RekorClient::single_entry(entries).is_err());
    }

    #[test]
    fn search_query_carries_the_digest_prefix() {
        let query = SearchIndex {
            hash: format!("sha256:{}", "ab".repeat(32)),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json["hash"].as_str().unwrap(),
            format!("sha256:{}", "ab".repeat(32))
        );
    }
}
