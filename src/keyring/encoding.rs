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

//! PEM (PKCS#8 / SPKI) and JWK import/export for every key type
//! (spec.md §4.1's "keys must be importable and exportable" requirement).
//!
//! Ed25519, secp256k1 and P-256 and RSA all implement the `pkcs8`/`spki`
//! traits natively, so PEM (de)serialization for those four goes through
//! the crates' own `EncodePrivateKey`/`DecodePrivateKey` impls.
//! `x25519-dalek` does not implement `pkcs8`, so X25519 keys are wrapped
//! in a PEM block with a SAGE-specific tag instead of a standard
//! PKCS#8 one — a deliberate simplification, see DESIGN.md.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey};
use serde_json::json;

use super::{ed25519, p256, rsa, secp256k1, x25519, KeyType, PublicKey, SigningKeyPair};
use crate::error::{CryptoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Pem,
    Jwk,
    Raw,
}

const X25519_PEM_TAG: &str = "SAGE X25519 PRIVATE KEY";
const X25519_PUBLIC_PEM_TAG: &str = "SAGE X25519 PUBLIC KEY";

pub fn export_private(kp: &SigningKeyPair, format: KeyFormat) -> Result<Vec<u8>> {
    match format {
        KeyFormat::Raw => export_private_raw(kp),
        KeyFormat::Pem => export_private_pem(kp),
        KeyFormat::Jwk => export_private_jwk(kp),
    }
}

fn export_private_raw(kp: &SigningKeyPair) -> Result<Vec<u8>> {
    match kp {
        SigningKeyPair::Ed25519(k) => Ok(k.to_bytes().to_vec()),
        SigningKeyPair::Secp256k1(k) => Ok(k.to_bytes().to_vec()),
        SigningKeyPair::P256(k) => Ok(k.to_bytes().to_vec()),
        SigningKeyPair::Rsa(k) => {
            use rsa::pkcs8::EncodePrivateKey as _;
            k.inner()
                .to_pkcs8_der()
                .map(|d| d.as_bytes().to_vec())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
        }
    }
}

fn export_private_pem(kp: &SigningKeyPair) -> Result<Vec<u8>> {
    let pem = match kp {
        SigningKeyPair::Ed25519(k) => k
            .inner()
            .to_pkcs8_pem(Default::default())
            .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?
            .to_string(),
        SigningKeyPair::Secp256k1(k) => {
            use k256::pkcs8::EncodePrivateKey as _;
            let inner = k256::ecdsa::SigningKey::from_bytes((&k.to_bytes()).into())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            inner
                .to_pkcs8_pem(Default::default())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?
                .to_string()
        }
        SigningKeyPair::P256(k) => {
            use p256::pkcs8::EncodePrivateKey as _;
            let inner = p256::ecdsa::SigningKey::from_bytes((&k.to_bytes()).into())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            inner
                .to_pkcs8_pem(Default::default())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?
                .to_string()
        }
        SigningKeyPair::Rsa(k) => {
            use rsa::pkcs8::EncodePrivateKey as _;
            k.inner()
                .to_pkcs8_pem(Default::default())
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?
                .to_string()
        }
    };
    Ok(pem.into_bytes())
}

fn export_private_jwk(kp: &SigningKeyPair) -> Result<Vec<u8>> {
    let pub_bytes = kp.public_key_bytes();
    let value = match kp {
        SigningKeyPair::Ed25519(k) => json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(pub_bytes),
            "d": URL_SAFE_NO_PAD.encode(k.to_bytes()),
        }),
        SigningKeyPair::Secp256k1(k) => {
            let (x, y) = split_ec_point(&pub_bytes)?;
            json!({
                "kty": "EC",
                "crv": "secp256k1",
                "x": URL_SAFE_NO_PAD.encode(x),
                "y": URL_SAFE_NO_PAD.encode(y),
                "d": URL_SAFE_NO_PAD.encode(k.to_bytes()),
            })
        }
        SigningKeyPair::P256(k) => {
            let (x, y) = split_ec_point(&pub_bytes)?;
            json!({
                "kty": "EC",
                "crv": "P-256",
                "x": URL_SAFE_NO_PAD.encode(x),
                "y": URL_SAFE_NO_PAD.encode(y),
                "d": URL_SAFE_NO_PAD.encode(k.to_bytes()),
            })
        }
        SigningKeyPair::Rsa(k) => {
            use rsa::traits::PublicKeyParts;
            let public = rsa::RsaPublicKey::from(k.inner());
            json!({
                "kty": "RSA",
                "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
                "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
                "d": URL_SAFE_NO_PAD.encode(k.inner().d().to_bytes_be()),
            })
        }
    };
    serde_json::to_vec(&value).map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
}

/// Splits an uncompressed SEC1 point (`0x04 || x || y`) into its halves.
fn split_ec_point(bytes: &[u8]) -> Result<(&[u8], &[u8])> {
    if bytes.len() != 65 || bytes[0] != 0x04 {
        return Err(CryptoError::InvalidEncoding("expected uncompressed SEC1 point".into()).into());
    }
    Ok((&bytes[1..33], &bytes[33..65]))
}

pub fn import_private_pem(algo: KeyType, pem: &str) -> Result<SigningKeyPair> {
    match algo {
        KeyType::Ed25519 => {
            let key = ed25519_dalek::SigningKey::from_pkcs8_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(SigningKeyPair::Ed25519(ed25519::Ed25519KeyPair::from_bytes(&key.to_bytes())))
        }
        KeyType::Secp256k1 => {
            use k256::pkcs8::DecodePrivateKey as _;
            let key = k256::ecdsa::SigningKey::from_pkcs8_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            let bytes: [u8; 32] = key.to_bytes().into();
            Ok(SigningKeyPair::Secp256k1(
                secp256k1::Secp256k1KeyPair::from_bytes(&bytes)?,
            ))
        }
        KeyType::P256 => {
            use p256::pkcs8::DecodePrivateKey as _;
            let key = p256::ecdsa::SigningKey::from_pkcs8_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            let bytes: [u8; 32] = key.to_bytes().into();
            Ok(SigningKeyPair::P256(p256::P256KeyPair::from_bytes(&bytes)?))
        }
        KeyType::Rsa => {
            use rsa::pkcs8::DecodePrivateKey as _;
            let key = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(SigningKeyPair::Rsa(Box::new(rsa::RsaKeyPair::from_private_key(key))))
        }
        KeyType::X25519 => Err(CryptoError::UnsupportedAlgorithm(
            "X25519 keys are not signing keys; use import_x25519_pem".into(),
        )
        .into()),
    }
}

pub fn import_public_pem(algo: KeyType, pem: &str) -> Result<PublicKey> {
    match algo {
        KeyType::Ed25519 => {
            let key = ed25519_dalek::VerifyingKey::from_public_key_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(PublicKey::Ed25519(ed25519::Ed25519VerifyingKey::from_bytes(&key.to_bytes())?))
        }
        KeyType::Secp256k1 => {
            use k256::pkcs8::DecodePublicKey as _;
            let key = k256::ecdsa::VerifyingKey::from_public_key_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(PublicKey::Secp256k1(secp256k1::Secp256k1VerifyingKey::from_sec1_bytes(
                key.to_encoded_point(false).as_bytes(),
            )?))
        }
        KeyType::P256 => {
            use p256::pkcs8::DecodePublicKey as _;
            let key = p256::ecdsa::VerifyingKey::from_public_key_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(PublicKey::P256(p256::P256VerifyingKey::from_sec1_bytes(
                key.to_encoded_point(false).as_bytes(),
            )?))
        }
        KeyType::Rsa => {
            use rsa::pkcs8::DecodePublicKey as _;
            let key = rsa::RsaPublicKey::from_public_key_pem(pem)
                .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
            Ok(PublicKey::Rsa(rsa::RsaVerifyingKey::from_public_key(key)))
        }
        KeyType::X25519 => Err(CryptoError::UnsupportedAlgorithm(
            "X25519 keys have no signing verification surface".into(),
        )
        .into()),
    }
}

/// X25519 has no `pkcs8` impl upstream; wrap the raw 32 bytes in a PEM
/// block under a SAGE-specific tag.
pub fn export_x25519_pem(kp: &x25519::X25519KeyPair) -> Result<String> {
    let contents = kp.to_bytes();
    pem::encode(&pem::Pem::new(X25519_PEM_TAG, contents.to_vec()))
        .pipe(Ok)
}

pub fn import_x25519_pem(input: &str) -> Result<x25519::X25519KeyPair> {
    let parsed = pem::parse(input).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
    if parsed.tag() != X25519_PEM_TAG {
        return Err(CryptoError::InvalidEncoding(format!(
            "unexpected PEM tag '{}', expected '{X25519_PEM_TAG}'",
            parsed.tag()
        ))
        .into());
    }
    let bytes: [u8; 32] = parsed
        .contents()
        .try_into()
        .map_err(|_| CryptoError::InvalidEncoding("X25519 key must be 32 bytes".into()))?;
    Ok(x25519::X25519KeyPair::from_bytes(bytes))
}

pub fn export_x25519_public_pem(public: &[u8; 32]) -> Result<String> {
    pem::encode(&pem::Pem::new(X25519_PUBLIC_PEM_TAG, public.to_vec())).pipe(Ok)
}

/// Small local extension so the PEM helpers above read left-to-right.
trait Pipe: Sized {
    fn pipe<T>(self, f: impl FnOnce(Self) -> T) -> T {
        f(self)
    }
}
impl<T> Pipe for T {}
