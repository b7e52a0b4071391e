// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

use russh::client::Handler;
use russh::keys::PublicKey;

/// Client handler that accepts every server host key.
///
/// Unknown hosts are trusted on first and every contact. The fingerprint is
/// logged at debug level so operators can audit what was accepted.
pub struct AcceptAllHandler {
    domain: String,
}

impl AcceptAllHandler {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl Handler for AcceptAllHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            "Accepting host key for {}: {}",
            self.domain,
            server_public_key.fingerprint(Default::default())
        );
        Ok(true)
    }
}
