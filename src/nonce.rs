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

//! Time-bounded replay cache over `(context, nonce)` pairs (spec.md
//! §4.2). A context is typically a peer `kid` or `sid`: nonces are
//! only unique within their context, not globally.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::config::NonceStoreConfig;
use crate::error::{ProtocolError, Result};

pub struct NonceStore {
    cfg: NonceStoreConfig,
    seen: RwLock<HashMap<(String, String), Instant>>,
}

impl NonceStore {
    pub fn new(cfg: NonceStoreConfig) -> Self {
        Self { cfg, seen: RwLock::new(HashMap::new()) }
    }

    /// Records `nonce` under `context` if it hasn't been seen within
    /// the TTL window, returning an error on replay. Does not itself
    /// bound map growth beyond the soft cap check below; call
    /// [`NonceStore::sweep`] periodically to reclaim expired entries.
    pub fn check_and_record(&self, context: &str, nonce: &str) -> Result<()> {
        let now = Instant::now();
        let key = (context.to_string(), nonce.to_string());

        let mut seen = self.seen.write().expect("nonce store lock poisoned");
        if let Some(&recorded_at) = seen.get(&key) {
            if now.duration_since(recorded_at) < self.cfg.ttl {
                log::warn!("nonce replay detected for context '{context}'");
                return Err(ProtocolError::NonceReplay(context.to_string()).into());
            }
        }
        seen.insert(key, now);
        if seen.len() > self.cfg.soft_cap {
            drop(seen);
            self.sweep();
        }
        Ok(())
    }

    /// Evicts entries older than the configured TTL. Intended to be
    /// called from the same background loop that sweeps
    /// [`crate::manager::SessionManager`].
    pub fn sweep(&self) {
        let now = Instant::now();
        let ttl = self.cfg.ttl;
        let mut seen = self.seen.write().expect("nonce store lock poisoned");
        let before = seen.len();
        seen.retain(|_, &mut recorded_at| now.duration_since(recorded_at) < ttl);
        let evicted = before - seen.len();
        if evicted > 0 {
            log::debug!("nonce store swept {evicted} expired entries");
        }
    }

    pub fn len(&self) -> usize {
        self.seen.read().expect("nonce store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(NonceStoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_is_rejected() {
        let store = NonceStore::default();
        store.check_and_record("peer-a", "n1").unwrap();
        assert!(store.check_and_record("peer-a", "n1").is_err());
    }

    #[test]
    fn same_nonce_different_context_is_fine() {
        let store = NonceStore::default();
        store.check_and_record("peer-a", "n1").unwrap();
        store.check_and_record("peer-b", "n1").unwrap();
    }

    #[test]
    fn expired_entries_are_swept() {
        let store = NonceStore::new(NonceStoreConfig { ttl: Duration::from_millis(1), soft_cap: 100 });
        store.check_and_record("peer-a", "n1").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.sweep();
        assert!(store.is_empty());
    }
}
