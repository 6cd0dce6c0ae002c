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

//! Per-peer strict message ordering plus a bounded duplicate-message
//! LRU (spec.md §4.3). `seq` must strictly increase per peer; a
//! message's declared `timestamp` must fall within
//! `OrderTrackerConfig::clock_skew` of our own clock.

use std::collections::{HashSet, VecDeque};
use std::sync::RwLock;

use crate::config::OrderTrackerConfig;
use crate::error::{ProtocolError, Result};
use crate::util::now_unix;

struct PeerState {
    last_seq: u64,
    has_seq: bool,
    last_timestamp: u64,
    seen: VecDeque<String>,
    seen_set: HashSet<String>,
}

impl PeerState {
    fn new() -> Self {
        Self { last_seq: 0, has_seq: false, last_timestamp: 0, seen: VecDeque::new(), seen_set: HashSet::new() }
    }

    fn remember(&mut self, message_id: &str, capacity: usize) {
        if self.seen_set.contains(message_id) {
            return;
        }
        self.seen.push_back(message_id.to_string());
        self.seen_set.insert(message_id.to_string());
        while self.seen.len() > capacity {
            if let Some(oldest) = self.seen.pop_front() {
                self.seen_set.remove(&oldest);
            }
        }
    }
}

pub struct OrderTracker {
    cfg: OrderTrackerConfig,
    peers: RwLock<std::collections::HashMap<String, PeerState>>,
}

impl OrderTracker {
    pub fn new(cfg: OrderTrackerConfig) -> Self {
        Self { cfg, peers: RwLock::new(std::collections::HashMap::new()) }
    }

    /// Admits a message from `peer` with the given `seq`, `timestamp`
    /// (unix seconds) and `message_id`. Rejects non-strictly-increasing
    /// `seq`, out-of-skew timestamps, and duplicate `message_id`s seen
    /// within the bounded LRU window.
    pub fn admit(&self, peer: &str, seq: u64, timestamp: u64, message_id: &str) -> Result<()> {
        let now = now_unix();
        let skew = self.cfg.clock_skew.as_secs();
        if timestamp.abs_diff(now) > skew {
            log::warn!("message from '{peer}' outside clock skew window");
            return Err(ProtocolError::TimestampSkew.into());
        }

        let mut peers = self.peers.write().expect("order tracker lock poisoned");
        let state = peers.entry(peer.to_string()).or_insert_with(PeerState::new);

        if state.seen_set.contains(message_id) {
            log::warn!("duplicate message_id from '{peer}'");
            return Err(crate::error::SessionError::Duplicate.into());
        }
        if state.has_seq && seq <= state.last_seq {
            return Err(crate::error::SessionError::OutOfOrder { seq, last: state.last_seq }.into());
        }

        state.last_seq = seq;
        state.has_seq = true;
        state.last_timestamp = timestamp;
        state.remember(message_id, self.cfg.seen_capacity);
        Ok(())
    }

    pub fn last_seq(&self, peer: &str) -> Option<u64> {
        self.peers
            .read()
            .expect("order tracker lock poisoned")
            .get(peer)
            .map(|s| s.last_seq)
    }
}

impl Default for OrderTracker {
    fn default() -> Self {
        Self::new(OrderTrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing_seq_required() {
        let tracker = OrderTracker::default();
        let now = now_unix();
        tracker.admit("peer", 1, now, "m1").unwrap();
        assert!(tracker.admit("peer", 1, now, "m2").is_err());
        tracker.admit("peer", 2, now, "m3").unwrap();
    }

    #[test]
    fn repeated_seq_zero_is_rejected_after_first_admit() {
        let tracker = OrderTracker::default();
        let now = now_unix();
        tracker.admit("peer", 0, now, "m0").unwrap();
        assert!(tracker.admit("peer", 0, now, "m0-again").is_err());
    }

    #[test]
    fn duplicate_message_id_rejected() {
        let tracker = OrderTracker::default();
        let now = now_unix();
        tracker.admit("peer", 1, now, "dup").unwrap();
        assert!(tracker.admit("peer", 2, now, "dup").is_err());
    }

    #[test]
    fn timestamp_outside_skew_rejected() {
        let tracker = OrderTracker::default();
        assert!(tracker.admit("peer", 1, 0, "m1").is_err());
    }

    #[test]
    fn seen_set_is_bounded() {
        let cfg = OrderTrackerConfig { clock_skew: std::time::Duration::from_secs(120), seen_capacity: 4 };
        let tracker = OrderTracker::new(cfg);
        let now = now_unix();
        for i in 1..=10u64 {
            tracker.admit("peer", i, now, &format!("m{i}")).unwrap();
        }
        let peers = tracker.peers.read().unwrap();
        assert!(peers.get("peer").unwrap().seen.len() <= 4);
    }
}
