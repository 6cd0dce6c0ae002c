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

//! Ethereum-style ECDSA over secp256k1: 65-byte `r || s || v` signatures,
//! Keccak-256 prehash, `v` in `{27, 28}` recovery form (spec.md §4.1).

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;
use sha3::{Digest, Keccak256};

use crate::error::{CryptoError, Result};

/// Caller-supplied 32-byte digests pass through verbatim; anything
/// else is hashed with Keccak-256.
fn prehash(message: &[u8]) -> [u8; 32] {
    if message.len() == 32 {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(message);
        return digest;
    }
    Keccak256::digest(message).into()
}

pub struct Secp256k1KeyPair(SigningKey);

impl Secp256k1KeyPair {
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

    pub fn verifying_key(&self) -> Secp256k1VerifyingKey {
        Secp256k1VerifyingKey(*self.0.verifying_key())
    }

    /// Returns the 65-byte `r || s || v` signature, `v` normalized to `{27, 28}`.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let digest = prehash(message);
        let (sig, recid): (Signature, RecoveryId) = self
            .0
            .sign_prehash_recoverable(&digest)
            .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&sig.r().to_bytes());
        out.extend_from_slice(&sig.s().to_bytes());
        out.push(recid.to_byte() + 27);
        Ok(out)
    }
}

#[derive(Clone, Debug)]
pub struct Secp256k1VerifyingKey(VerifyingKey);

impl Secp256k1VerifyingKey {
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Accepts both the 64-byte `r || s` form and the 65-byte
    /// `r || s || v` form; `v` is irrelevant to verification against a
    /// known public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        if signature.len() != 64 && signature.len() != 65 {
            return Err(CryptoError::InvalidSignature.into());
        }
        let sig = Signature::from_slice(&signature[..64])
            .map_err(|_| CryptoError::InvalidSignature)?;
        let digest = prehash(message);
        self.0
            .verify_prehash(&digest, &sig)
            .map_err(|_| CryptoError::InvalidSignature.into())
    }

    /// Recovers the signer's verifying key from a 65-byte signature;
    /// used when only an Ethereum-style address, not a public key, is known.
    pub fn recover(message: &[u8], signature: &[u8]) -> Result<Self> {
        if signature.len() != 65 {
            return Err(CryptoError::InvalidSignature.into());
        }
        let sig = Signature::from_slice(&signature[..64])
            .map_err(|_| CryptoError::InvalidSignature)?;
        let v = signature[64];
        let recid = RecoveryId::from_byte(v.saturating_sub(27))
            .ok_or(CryptoError::InvalidSignature)?;
        let digest = prehash(message);
        VerifyingKey::recover_from_prehash(&digest, &sig, recid)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignature.into())
    }
}
