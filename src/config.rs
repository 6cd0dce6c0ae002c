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

//! Defaults and tunables, pulled out of the individual modules so an
//! embedder can see and override them in one place rather than
//! hunting for hardcoded constants (spec.md §9 asks for this
//! explicitly for the order-tracker LRU bound; the rest follow suit).

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct NonceStoreConfig {
    pub ttl: Duration,
    pub soft_cap: usize,
}

impl Default for NonceStoreConfig {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(5 * 60), soft_cap: 100_000 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderTrackerConfig {
    pub clock_skew: Duration,
    pub seen_capacity: usize,
}

impl Default for OrderTrackerConfig {
    fn default() -> Self {
        Self { clock_skew: Duration::from_secs(120), seen_capacity: 1024 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub max_age: Duration,
    pub idle_timeout: Duration,
    pub max_messages: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 60 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            max_messages: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionManagerConfig {
    pub cap: usize,
    pub sweep_interval: Duration,
    pub spawn_sweeper: bool,
    pub session: SessionConfig,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            cap: 100_000,
            sweep_interval: Duration::from_secs(30),
            spawn_sweeper: true,
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    pub max_clock_skew: Duration,
    pub commitment_ttl: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            max_clock_skew: Duration::from_secs(120),
            commitment_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyringConfig {
    pub rsa_bits: usize,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self { rsa_bits: 2048 }
    }
}
