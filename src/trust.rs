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

//! The local set of trusted signing identities.
//!
//! Trust is a list of identities accepted for any host, plus per-host
//! additions, persisted as a TOML file. The file lives under `$SGET_CONFIG`
//! when set, otherwise `~/.sget`. Read-modify-write is not transactional;
//! the last writer wins.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::errors::{Result, SgetError};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "SGET_CONFIG";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustConfig {
    /// Identities trusted for content from any host.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<String>,

    /// Additional identities trusted only for a specific host.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hosts: BTreeMap<String, HostTrust>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostTrust {
    #[serde(default)]
    pub identities: Vec<String>,
}

/// Resolve the trust configuration file path once, at pipeline construction.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| {
                SgetError::TrustConfigError("cannot determine home directory".to_string())
            })?
            .join(".sget"),
    };
    Ok(dir.join(CONFIG_FILE))
}

/// Reduce a user-supplied host flag ("example.com:8443/x" and friends) to
/// a bare host name.
pub fn normalize_host(host: &str) -> Result<String> {
    let url = Url::parse(&format!("scheme://{host}"))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| SgetError::TrustConfigError(format!("cannot parse host {host:?}")))
}

impl TrustConfig {
    /// Load the configuration from `path`. A missing file is an empty
    /// configuration, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Ok(toml::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(TrustConfig::default()),
            Err(err) => Err(SgetError::TrustConfigError(format!(
                "reading {}: {err}",
                path.display()
            ))),
        }
    }

    /// Persist the configuration, creating parent directories as needed.
    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                SgetError::TrustConfigError(format!("creating {}: {err}", parent.display()))
            })?;
        }
        let raw = toml::to_string(self)?;
        std::fs::write(path, raw).map_err(|err| {
            SgetError::TrustConfigError(format!("writing {}: {err}", path.display()))
        })
    }

    /// The identities trusted for content served by `host`: the global set
    /// united with the host-scoped set.
    pub fn trusted_identities(&self, host: &str) -> BTreeSet<String> {
        let mut trusted: BTreeSet<String> = self.identities.iter().cloned().collect();
        if let Some(scoped) = self.hosts.get(host) {
            trusted.extend(scoped.identities.iter().cloned());
        }
        trusted
    }

    /// Add identities to (or, with `remove`, drop them from) the global set
    /// or a host-scoped set. Adding an already-trusted identity and removing
    /// an unknown one are no-ops; the stored list stays sorted and free of
    /// duplicates.
    pub fn update(&mut self, identities: &[String], host: Option<&str>, remove: bool) {
        let ids = match host {
            Some(host) => {
                info!(host, "updating trusted identities scoped to host");
                &mut self.hosts.entry(host.to_string()).or_default().identities
            }
            None => &mut self.identities,
        };

        let mut set: BTreeSet<String> = std::mem::take(ids).into_iter().collect();
        for identity in identities {
            if remove {
                if set.remove(identity) {
                    info!(identity = %identity, "removing trusted identity");
                } else {
                    info!(identity = %identity, "trusted identity not found, will not be removed");
                }
            } else if set.insert(identity.clone()) {
                info!(identity = %identity, "adding trusted identity");
            } else {
                info!(identity = %identity, "already trusted identity");
            }
        }
        *ids = set.into_iter().collect();
    }
}

/// The identities that both signed for the content and are configured as
/// trusted: exact set intersection, no fuzzy matching.
pub fn intersect(signers: &BTreeSet<String>, trusted: &BTreeSet<String>) -> BTreeSet<String> {
    signers.intersection(trusted).cloned().collect()
}
