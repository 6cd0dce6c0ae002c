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

//! RSASSA-PKCS1-v1_5 with SHA-256, default 2048-bit modulus
//! (`KeyringConfig::rsa_bits`, spec.md §4.1).

use rsa::pkcs1v15::{SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{CryptoError, Result};

pub struct RsaKeyPair {
    signing_key: SigningKey<Sha256>,
    private: RsaPrivateKey,
}

impl RsaKeyPair {
    pub fn generate(bits: usize) -> Result<Self> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        let signing_key = SigningKey::<Sha256>::new(private.clone());
        Ok(Self { signing_key, private })
    }

    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let signing_key = SigningKey::<Sha256>::new(private.clone());
        Self { signing_key, private }
    }

    pub fn public_bytes(&self) -> Vec<u8> {
        der_encode_rsa_public(&RsaPublicKey::from(&self.private))
    }

    pub fn verifying_key(&self) -> RsaVerifyingKey {
        RsaVerifyingKey(VerifyingKey::<Sha256>::new(RsaPublicKey::from(&self.private)))
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        use rsa::signature::SignatureEncoding;
        let sig = self
            .signing_key
            .try_sign_with_rng(&mut rand::thread_rng(), message)
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        Ok(sig.to_vec())
    }

    pub fn inner(&self) -> &RsaPrivateKey {
        &self.private
    }
}

#[derive(Clone, Debug)]
pub struct RsaVerifyingKey(VerifyingKey<Sha256>);

impl RsaVerifyingKey {
    pub fn from_public_key(public: RsaPublicKey) -> Self {
        Self(VerifyingKey::<Sha256>::new(public))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        der_encode_rsa_public(self.0.as_ref())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        use rsa::pkcs1v15::Signature;
        let sig = Signature::try_from(signature).map_err(|_| CryptoError::InvalidSignature)?;
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::InvalidSignature.into())
    }
}

/// A minimal, deterministic encoding used for `key_id` derivation and
/// resolver comparisons: modulus `n` followed by exponent `e`, each
/// big-endian and length-prefixed. Interop callers should use
/// [`crate::keyring::encoding`]'s PEM/JWK export instead.
fn der_encode_rsa_public(key: &RsaPublicKey) -> Vec<u8> {
    let n = key.n().to_bytes_be();
    let e = key.e().to_bytes_be();
    let mut out = Vec::with_capacity(n.len() + e.len() + 8);
    out.extend_from_slice(&(n.len() as u32).to_be_bytes());
    out.extend_from_slice(&n);
    out.extend_from_slice(&(e.len() as u32).to_be_bytes());
    out.extend_from_slice(&e);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = RsaKeyPair::generate(2048).unwrap();
        let sig = kp.sign(b"sage rsa message").unwrap();
        kp.verifying_key().verify(b"sage rsa message", &sig).unwrap();
        assert!(kp.verifying_key().verify(b"tampered", &sig).is_err());
    }
}
