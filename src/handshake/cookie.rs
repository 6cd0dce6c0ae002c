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

//! The optional DoS-mitigation cookie check the server runs before
//! anything cryptographic (spec.md §4.5 step 1). No cookie source is
//! installed by default: `Handshake::new` takes `Option<&dyn
//! CookieVerifier>`.

use crate::error::{ProtocolError, Result};

/// Verifies a cookie presented with an `Init` message. `metadata` is
/// whatever the transport attached (an HMAC tag, a PoW solution);
/// interpretation is entirely up to the implementation.
pub trait CookieVerifier: Send + Sync {
    fn verify(&self, context_id: &str, init_did: &str, resp_did: &str, metadata: Option<&[u8]>) -> Result<()>;
}

/// The complementary client-side capability: attaches whatever a
/// `CookieVerifier` on the other end expects. Optional; a client
/// talking to a server with no cookie requirement needs neither trait.
pub trait CookieSource: Send + Sync {
    fn attach(&self, context_id: &str, init_did: &str, resp_did: &str) -> Option<Vec<u8>>;
}

/// A verifier that always rejects a missing cookie, for servers that
/// require one unconditionally.
pub struct RequireCookie;

impl CookieVerifier for RequireCookie {
    fn verify(&self, _context_id: &str, _init_did: &str, _resp_did: &str, metadata: Option<&[u8]>) -> Result<()> {
        match metadata {
            Some(_) => Ok(()),
            None => Err(ProtocolError::CookieRequired.into()),
        }
    }
}
