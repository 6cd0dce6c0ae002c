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

//! ECDSA over NIST P-256, raw 64-byte `r || s` signatures, SHA-256
//! prehash (spec.md §4.1). Unlike the secp256k1 variant this is not
//! Ethereum-flavored: no recovery byte.

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{CryptoError, Result};

fn prehash(message: &[u8]) -> [u8; 32] {
    Sha256::digest(message).into()
}

pub struct P256KeyPair(SigningKey);

impl P256KeyPair {
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        SigningKey::from_bytes(bytes.into())
            .map(Self)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    pub fn public_bytes(&self) -> Vec<u8> {
        self.0
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    pub fn verifying_key(&self) -> P256VerifyingKey {
        P256VerifyingKey(*self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = prehash(message);
        let sig: Signature = self
            .0
            .sign_prehash(&digest)
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&sig.r().to_bytes());
        out.extend_from_slice(&sig.s().to_bytes());
        Ok(out)
    }
}

#[derive(Clone, Debug)]
pub struct P256VerifyingKey(VerifyingKey);

impl P256VerifyingKey {
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() != 64 {
            return Err(CryptoError::InvalidSignature.into());
        }
        let sig = Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        let digest = prehash(message);
        self.0
            .verify_prehash(&digest, &sig)
            .map_err(|_| CryptoError::InvalidSignature.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = P256KeyPair::generate();
        let sig = kp.sign(b"sage").unwrap();
        assert_eq!(sig.len(), 64);
        kp.verifying_key().verify(b"sage", &sig).unwrap();
    }
}
