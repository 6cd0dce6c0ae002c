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

//! Signing keypairs (Ed25519, ECDSA-secp256k1, ECDSA-P-256, RSA) and
//! the X25519 KEM keypair, per spec.md §4.1. Each algorithm gets its
//! own small module; this file ties them together behind `SigningKeyPair`
//! and exposes the shared `key_id` derivation and import/export entry
//! points.

pub mod ed25519;
pub mod encoding;
pub mod p256;
pub mod rsa;
pub mod secp256k1;
pub mod x25519;

use sha2::{Digest, Sha256};

use crate::error::{CryptoError, Result};

pub use encoding::KeyFormat;

/// Fixed by name, not by ordinal value shared with any external
/// registry — see spec.md §9's open question on `KeyType` ordinals
/// and DESIGN.md's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ed25519,
    Secp256k1,
    P256,
    Rsa,
    X25519,
}

impl KeyType {
    /// The RFC 9421 algorithm tag this key type signs with (spec.md §4.7).
    /// `X25519` has no signing tag: it is KEM-only.
    pub fn alg_tag(&self) -> Option<&'static str> {
        match self {
            KeyType::Ed25519 => Some("ed25519"),
            KeyType::Secp256k1 => Some("ecdsa-secp256k1-keccak256"),
            KeyType::P256 => Some("ecdsa-p256-sha256"),
            KeyType::Rsa => Some("rsa-v1_5-sha256"),
            KeyType::X25519 => None,
        }
    }

    pub fn from_alg_tag(tag: &str) -> Option<Self> {
        match tag {
            "ed25519" => Some(KeyType::Ed25519),
            "ecdsa-secp256k1-keccak256" => Some(KeyType::Secp256k1),
            "ecdsa-p256-sha256" => Some(KeyType::P256),
            "rsa-v1_5-sha256" => Some(KeyType::Rsa),
            _ => None,
        }
    }
}

/// `key_id = hex(SHA-256(public_key_bytes)[..8])` — spec.md §3/§4.1.
/// This is informational/JWK-`kid` only; it is *not* the session-layer
/// `kid` minted by the handshake (spec.md GLOSSARY is explicit about
/// the distinction).
pub fn key_id(public_key_bytes: &[u8]) -> String {
    let digest = Sha256::digest(public_key_bytes);
    hex::encode(&digest[..8])
}

/// A signing keypair over one of the four supported signing
/// algorithms. The X25519 KEM keypair is a separate type
/// ([`x25519::X25519KeyPair`]) since it has no sign/verify surface.
pub enum SigningKeyPair {
    Ed25519(ed25519::Ed25519KeyPair),
    Secp256k1(secp256k1::Secp256k1KeyPair),
    P256(p256::P256KeyPair),
    Rsa(Box<rsa::RsaKeyPair>),
}

impl SigningKeyPair {
    pub fn generate(algo: KeyType) -> Result<Self> {
        Self::generate_with(algo, &crate::config::KeyringConfig::default())
    }

    pub fn generate_with(algo: KeyType, cfg: &crate::config::KeyringConfig) -> Result<Self> {
        match algo {
            KeyType::Ed25519 => Ok(Self::Ed25519(ed25519::Ed25519KeyPair::generate())),
            KeyType::Secp256k1 => Ok(Self::Secp256k1(secp256k1::Secp256k1KeyPair::generate())),
            KeyType::P256 => Ok(Self::P256(p256::P256KeyPair::generate())),
            KeyType::Rsa => Ok(Self::Rsa(Box::new(rsa::RsaKeyPair::generate(cfg.rsa_bits)?))),
            KeyType::X25519 => {
                Err(CryptoError::UnsupportedAlgorithm("X25519 has no signing key".into()).into())
            }
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::Secp256k1(_) => KeyType::Secp256k1,
            Self::P256(_) => KeyType::P256,
            Self::Rsa(_) => KeyType::Rsa,
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(k) => k.public_bytes().to_vec(),
            Self::Secp256k1(k) => k.public_bytes(),
            Self::P256(k) => k.public_bytes(),
            Self::Rsa(k) => k.public_bytes(),
        }
    }

    pub fn key_id(&self) -> String {
        key_id(&self.public_key_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Ed25519(k) => Ok(k.sign(message)),
            Self::Secp256k1(k) => k.sign(message),
            Self::P256(k) => k.sign(message),
            Self::Rsa(k) => k.sign(message),
        }
    }

    pub fn export(&self, format: KeyFormat) -> Result<Vec<u8>> {
        encoding::export_private(self, format)
    }
}

/// The verifying half of a [`SigningKeyPair`], as returned by a
/// [`crate::resolver::Resolver`].
#[derive(Clone, Debug)]
pub enum PublicKey {
    Ed25519(ed25519::Ed25519VerifyingKey),
    Secp256k1(secp256k1::Secp256k1VerifyingKey),
    P256(p256::P256VerifyingKey),
    Rsa(rsa::RsaVerifyingKey),
}

impl PublicKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::Secp256k1(_) => KeyType::Secp256k1,
            Self::P256(_) => KeyType::P256,
            Self::Rsa(_) => KeyType::Rsa,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(k) => k.to_bytes().to_vec(),
            Self::Secp256k1(k) => k.to_bytes(),
            Self::P256(k) => k.to_bytes(),
            Self::Rsa(k) => k.to_bytes(),
        }
    }

    pub fn key_id(&self) -> String {
        key_id(&self.to_bytes())
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            Self::Ed25519(k) => k.verify(message, signature),
            Self::Secp256k1(k) => k.verify(message, signature),
            Self::P256(k) => k.verify(message, signature),
            Self::Rsa(k) => k.verify(message, signature),
        }
    }
}

impl From<&SigningKeyPair> for PublicKey {
    fn from(kp: &SigningKeyPair) -> Self {
        match kp {
            SigningKeyPair::Ed25519(k) => PublicKey::Ed25519(k.verifying_key()),
            SigningKeyPair::Secp256k1(k) => PublicKey::Secp256k1(k.verifying_key()),
            SigningKeyPair::P256(k) => PublicKey::P256(k.verifying_key()),
            SigningKeyPair::Rsa(k) => PublicKey::Rsa(k.verifying_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_is_deterministic_and_distinct() {
        let k1 = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let k2 = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        assert_eq!(k1.key_id(), key_id(&k1.public_key_bytes()));
        assert_ne!(k1.key_id(), k2.key_id());
    }

    #[test]
    fn sign_then_verify_roundtrips_all_algorithms() {
        for algo in [KeyType::Ed25519, KeyType::Secp256k1, KeyType::P256] {
            let kp = SigningKeyPair::generate(algo).unwrap();
            let pk = PublicKey::from(&kp);
            let msg = b"sage handshake payload";
            let sig = kp.sign(msg).unwrap();
            pk.verify(msg, &sig).unwrap();

            let mut tampered = sig.clone();
            tampered[0] ^= 0xff;
            assert!(pk.verify(msg, &tampered).is_err());
        }
    }
}
