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

//! The KEM keypair HPKE encapsulates to/from (spec.md §3's handshake).
//! X25519 has no sign/verify surface, so it lives outside
//! [`crate::keyring::SigningKeyPair`].

use rand_core::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::util::secret::Secret32;

pub struct X25519KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl X25519KeyPair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub fn diffie_hellman(&self, their_public: &[u8; 32]) -> Secret32 {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*their_public));
        Secret32::new(shared.to_bytes())
    }

    pub fn secret(&self) -> &StaticSecret {
        &self.secret
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dh_is_symmetric() {
        let a = X25519KeyPair::generate();
        let b = X25519KeyPair::generate();
        let sa = a.diffie_hellman(&b.public_bytes());
        let sb = b.diffie_hellman(&a.public_bytes());
        assert_eq!(sa.as_bytes(), sb.as_bytes());
    }
}
