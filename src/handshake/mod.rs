/* This file is part of SAGE (https://github.com/sage-x-project/sage)
 *
 * Copyright (C) 2024-2026 SAGE-X-project contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! The HPKE-based mutual-authentication handshake (spec.md §4.5):
//! DHKEM(X25519, HKDF-SHA256) + HKDF-SHA256 + ChaCha20-Poly1305, Base
//! mode. Only this documented default is implemented; the source's
//! legacy plain-ECDH handshake is not (see DESIGN.md's Open Question
//! decisions).

pub mod client;
pub mod cookie;
pub mod messages;
pub mod server;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use hpke::{aead::ChaCha20Poly1305 as HpkeAead, kdf::HkdfSha256, kem::X25519HkdfSha256, Deserializable, Serializable};

use crate::error::{CryptoError, Result};
use crate::util::secret::Secret32;

pub(crate) type Kem = X25519HkdfSha256;
pub(crate) type Kdf = HkdfSha256;
pub(crate) type Aead = HpkeAead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    PendingInit,
    AwaitingAck,
    Established,
    Failed,
}

pub(crate) fn kem_public_key(bytes: &[u8; 32]) -> Result<<Kem as hpke::Kem>::PublicKey> {
    <Kem as hpke::Kem>::PublicKey::from_bytes(bytes)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
}

pub(crate) fn kem_private_key(bytes: &[u8; 32]) -> Result<<Kem as hpke::Kem>::PrivateKey> {
    <Kem as hpke::Kem>::PrivateKey::from_bytes(bytes)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
}

pub(crate) fn encapped_key_bytes(enc: &<Kem as hpke::Kem>::EncappedKey) -> Vec<u8> {
    enc.to_bytes().to_vec()
}

pub(crate) fn encapped_key_from_bytes(bytes: &[u8]) -> Result<<Kem as hpke::Kem>::EncappedKey> {
    <Kem as hpke::Kem>::EncappedKey::from_bytes(bytes)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
}

/// Tracks an unbound server-side commitment between receiving `Init`
/// and binding its `kid` (spec.md §3 "Handshake commitment"). Entries
/// self-expire after `commitment_ttl` (default 60s, spec.md §9).
pub struct PendingCommitments {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Secret32, Instant)>>,
}

impl PendingCommitments {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    pub fn insert(&self, context_id: &str, exporter: Secret32) {
        self.entries
            .write()
            .expect("pending commitments lock poisoned")
            .insert(context_id.to_string(), (exporter, Instant::now()));
    }

    pub fn take(&self, context_id: &str) -> Option<Secret32> {
        let mut entries = self.entries.write().expect("pending commitments lock poisoned");
        match entries.remove(context_id) {
            Some((exporter, inserted_at)) if inserted_at.elapsed() < self.ttl => Some(exporter),
            _ => None,
        }
    }

    /// Drops commitments older than `ttl`. Intended to run alongside
    /// the session manager's sweeper.
    pub fn sweep(&self) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().expect("pending commitments lock poisoned");
        let before = entries.len();
        entries.retain(|_, (_, inserted_at)| inserted_at.elapsed() < ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            log::debug!("handshake commitments swept {evicted} expired entries");
        }
    }
}

impl Default for PendingCommitments {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
