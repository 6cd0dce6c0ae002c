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

//! The DID resolution contract this crate consumes but does not
//! implement (spec.md §6). A `did:sage:<network>:<identifier>` string
//! is opaque to the core: it's handed to a `Resolver` and never parsed.

use crate::error::{CryptoError, Error, ProtocolError, ResourceError, Result};
use crate::keyring::PublicKey;

/// Returned by a resolver when a DID is known but cannot presently
/// yield material (e.g. a key rotation in progress), distinct from
/// `NotFound`.
#[derive(Debug, Clone)]
pub enum ResolveError {
    NotFound,
    Deactivated,
    Backend(String),
}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound => ResourceError::NotFound.into(),
            ResolveError::Deactivated => ResourceError::NotFound.into(),
            ResolveError::Backend(msg) => ResourceError::Backend(msg).into(),
        }
    }
}

/// A capability that maps a DID to cryptographic material. Implemented
/// by the embedder (on-chain registry client, local fixture, cache).
///
/// Synchronous by design (spec.md §5: "the core is synchronous"); an
/// embedder bridging to an async registry blocks this call inside its
/// own runtime, or builds against the `resolver-async` feature's
/// [`AsyncResolver`] instead.
pub trait Resolver: Send + Sync {
    fn resolve_sign_key(&self, did: &str) -> std::result::Result<PublicKey, ResolveError>;
    fn resolve_kem_key(&self, did: &str) -> std::result::Result<[u8; 32], ResolveError>;
}

#[cfg(feature = "resolver-async")]
#[async_trait::async_trait]
pub trait AsyncResolver: Send + Sync {
    async fn resolve_sign_key(&self, did: &str) -> std::result::Result<PublicKey, ResolveError>;
    async fn resolve_kem_key(&self, did: &str) -> std::result::Result<[u8; 32], ResolveError>;
}

pub(crate) fn sign_key_or(resolver: &dyn Resolver, did: &str) -> Result<PublicKey> {
    resolver
        .resolve_sign_key(did)
        .map_err(|_| ProtocolError::UnknownSigner(did.to_string()).into())
}

pub(crate) fn kem_key_or(resolver: &dyn Resolver, did: &str) -> Result<[u8; 32]> {
    resolver
        .resolve_kem_key(did)
        .map_err(|_| CryptoError::UnsupportedAlgorithm(format!("no KEM key for '{did}'")).into())
}

/// An in-memory fixture resolver, useful for tests and for embedders
/// that pre-fetch DID material out of band.
#[derive(Default)]
pub struct StaticResolver {
    sign_keys: std::collections::HashMap<String, PublicKey>,
    kem_keys: std::collections::HashMap<String, [u8; 32]>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sign_key(mut self, did: impl Into<String>, key: PublicKey) -> Self {
        self.sign_keys.insert(did.into(), key);
        self
    }

    pub fn with_kem_key(mut self, did: impl Into<String>, key: [u8; 32]) -> Self {
        self.kem_keys.insert(did.into(), key);
        self
    }
}

impl Resolver for StaticResolver {
    fn resolve_sign_key(&self, did: &str) -> std::result::Result<PublicKey, ResolveError> {
        self.sign_keys.get(did).cloned().ok_or(ResolveError::NotFound)
    }

    fn resolve_kem_key(&self, did: &str) -> std::result::Result<[u8; 32], ResolveError> {
        self.kem_keys.get(did).copied().ok_or(ResolveError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::{KeyType, SigningKeyPair};

    #[test]
    fn static_resolver_looks_up_by_did() {
        let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let pk = PublicKey::from(&kp);
        let resolver = StaticResolver::new().with_sign_key("did:sage:test:a", pk.clone());
        let found = resolver.resolve_sign_key("did:sage:test:a").unwrap();
        assert_eq!(found.to_bytes(), pk.to_bytes());
        assert!(matches!(
            resolver.resolve_sign_key("did:sage:test:unknown"),
            Err(ResolveError::NotFound)
        ));
    }
}
