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

//! SAGE core: the cryptographic protocol engine behind secure
//! agent-to-agent communication.
//!
//! This crate implements, and only implements, the parts of the SAGE
//! stack that must be correct for two agents to mutually authenticate
//! and exchange tamper-evident, replay-protected, forward-secret
//! messages:
//!
//! - [`keyring`]: signing and KEM keypairs (Ed25519, ECDSA-secp256k1,
//!   ECDSA-P-256, RSA, X25519), deterministic key ids, sign/verify/ECDH.
//! - [`nonce`]: a time-bounded nonce store for replay rejection.
//! - [`order`]: a per-peer sequence/timestamp tracker for ordering.
//! - [`validator`]: composes signature + nonce + order + skew checks.
//! - [`handshake`]: the HPKE-based mutual-authentication handshake.
//! - [`session`]: directional AEAD session state derived from a
//!   handshake, plus covered-message signing.
//! - [`manager`]: the process-wide session table and its sweeper.
//! - [`signer`]: an RFC 9421-style signature-base / header codec.
//! - [`resolver`] and [`transport`]: the collaborator contracts this
//!   crate consumes but does not implement.
//! - [`util::secret::Secret32`]: the zero-on-drop wrapper that carries
//!   handshake and session key material across these modules' APIs.
//!
//! Everything else — transports, DID resolution, the on-chain
//! registry, CLIs, persistence, metrics — lives outside this crate.

pub mod config;
pub mod error;
pub mod handshake;
pub mod keyring;
pub mod manager;
pub mod nonce;
pub mod order;
pub mod resolver;
pub mod session;
pub mod signer;
pub mod transport;
pub mod util;
pub mod validator;
pub mod wire;

pub use error::{Error, Result};
