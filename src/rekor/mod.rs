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

//! Client for the Rekor transparency log <https://github.com/sigstore/rekor>.
//!
//! Rekor is a cryptographically secure, immutable transparency log for
//! signed software releases. Verification queries it by content digest and
//! retrieves full entries by identifier; signing submits new attestation
//! entries.

pub mod client;
pub mod models;

pub use client::{RekorClient, REKOR_ROOT};
