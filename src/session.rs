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

//! A directional AEAD + HMAC session derived from a handshake seed
//! (spec.md §3/§4.6). `sid` is deterministic over `(label, seed)` so
//! that concurrent `ensure_from_exporter` calls collapse to one
//! session; the derived keys never leave the session.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key as AeadKey};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::SessionConfig;
use crate::error::{CryptoError, Result, SessionError};
use crate::util::now_unix;
use crate::util::secret::Secret32;
use crate::wire::{b64url_encode, message_nonce};

pub const SID_LABEL: &str = "sage/hpke v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Closed,
}

struct DirectionalKeys {
    aead: ChaCha20Poly1305,
    sign_key: Secret32,
    base_iv: [u8; 12],
}

/// `sid = base64url(SHA-256(label || seed)[..16])`, spec.md §3.
pub fn derive_sid(label: &str, seed: &Secret32) -> String {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    b64url_encode(&digest[..16])
}

fn expand_key(prk: &Hkdf<Sha256>, info: &str) -> Result<Secret32> {
    let mut okm = [0u8; 32];
    prk.expand(info.as_bytes(), &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed(format!("hkdf expand '{info}' failed")))?;
    Ok(Secret32::new(okm))
}

fn expand_iv(prk: &Hkdf<Sha256>, info: &str) -> Result<[u8; 12]> {
    let mut okm = [0u8; 12];
    prk.expand(info.as_bytes(), &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed(format!("hkdf expand '{info}' failed")))?;
    Ok(okm)
}

fn build_direction(prk: &Hkdf<Sha256>, enc_label: &str, sign_label: &str, iv_label: &str) -> Result<DirectionalKeys> {
    let enc_key = expand_key(prk, enc_label)?;
    let sign_key = expand_key(prk, sign_label)?;
    let base_iv = expand_iv(prk, iv_label)?;
    let aead = ChaCha20Poly1305::new(AeadKey::from_slice(enc_key.as_bytes()));
    Ok(DirectionalKeys { aead, sign_key, base_iv })
}

/// Owns the per-direction AEAD and HMAC key material for one session.
/// `seq_out`/`seq_in` are monotone counters; the nonce for message `n`
/// is `base_iv XOR encode_u96(n)`.
pub struct Session {
    sid: String,
    role: Role,
    outbound: Option<DirectionalKeys>,
    inbound: Option<DirectionalKeys>,
    seq_out: u64,
    seq_in: Option<u64>,
    created_at: u64,
    last_used_at: u64,
    message_count: u64,
    status: Status,
    cfg: SessionConfig,
}

impl Session {
    /// Derives a fresh session from a 32-byte combined secret. `role`
    /// decides which HKDF labels ("c2s" vs "s2c") map to outbound vs
    /// inbound, per spec.md §3 "Assignment by role".
    pub fn from_seed(seed: &Secret32, label: &str, role: Role, cfg: SessionConfig) -> Result<Self> {
        let sid = derive_sid(label, seed);
        let prk = Hkdf::<Sha256>::new(Some(sid.as_bytes()), seed.as_bytes());

        let c2s = build_direction(&prk, "c2s|enc|v1", "c2s|sign|v1", "c2s|iv|v1")?;
        let s2c = build_direction(&prk, "s2c|enc|v1", "s2c|sign|v1", "s2c|iv|v1")?;

        let (outbound, inbound) = match role {
            Role::Initiator => (c2s, s2c),
            Role::Responder => (s2c, c2s),
        };

        let now = now_unix();
        Ok(Self {
            sid,
            role,
            outbound: Some(outbound),
            inbound: Some(inbound),
            seq_out: 0,
            seq_in: None,
            created_at: now,
            last_used_at: now,
            message_count: 0,
            status: Status::Active,
            cfg,
        })
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn seq_out(&self) -> u64 {
        self.seq_out
    }

    pub fn seq_in(&self) -> Option<u64> {
        self.seq_in
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.created_at + self.cfg.max_age.as_secs()
            || now > self.last_used_at + self.cfg.idle_timeout.as_secs()
            || self.message_count >= self.cfg.max_messages
    }

    fn ensure_active(&self) -> Result<()> {
        match self.status {
            Status::Active => Ok(()),
            Status::Closed => Err(SessionError::Closed.into()),
        }
    }

    fn ensure_not_expired(&self) -> Result<()> {
        if self.is_expired(now_unix()) {
            return Err(SessionError::Expired.into());
        }
        Ok(())
    }

    /// Encrypts `plaintext` under the next outbound `seq`, returning
    /// `(seq, ciphertext || tag)`.
    pub fn encrypt(&mut self, plaintext: &[u8], aad: Option<&[u8]>) -> Result<(u64, Vec<u8>)> {
        self.ensure_active()?;
        self.ensure_not_expired()?;
        let dir = self.outbound.as_ref().expect("active session always has keys");

        let seq = self.seq_out;
        let nonce = message_nonce(&dir.base_iv, seq);
        let ciphertext = dir
            .aead
            .encrypt(&nonce.into(), Payload { msg: plaintext, aad: aad.unwrap_or(&[]) })
            .map_err(|_| CryptoError::AeadFailed)?;

        self.seq_out += 1;
        self.last_used_at = now_unix();
        self.message_count += 1;
        Ok((seq, ciphertext))
    }

    /// Decrypts a message claiming sequence number `seq`. There is no
    /// out-of-order window: `seq` must equal the next expected value
    /// exactly (`last_seq_in + 1`, or `0` for the first message), else
    /// `OutOfOrder` — a gap is rejected the same as a replay.
    pub fn decrypt(&mut self, seq: u64, ciphertext: &[u8], aad: Option<&[u8]>) -> Result<Vec<u8>> {
        self.ensure_active()?;
        self.ensure_not_expired()?;
        let expected = self.seq_in.map(|last| last + 1).unwrap_or(0);
        if seq != expected {
            return Err(SessionError::OutOfOrder { seq, last: self.seq_in.unwrap_or(0) }.into());
        }
        let dir = self.inbound.as_ref().expect("active session always has keys");

        let nonce = message_nonce(&dir.base_iv, seq);
        let plaintext = dir
            .aead
            .decrypt(&nonce.into(), Payload { msg: ciphertext, aad: aad.unwrap_or(&[]) })
            .map_err(|_| CryptoError::AeadFailed)?;

        self.seq_in = Some(seq);
        self.last_used_at = now_unix();
        self.message_count += 1;
        Ok(plaintext)
    }

    pub fn sign_covered(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        self.ensure_active()?;
        let dir = self.outbound.as_ref().expect("active session always has keys");
        let mut mac = Hmac::<Sha256>::new_from_slice(dir.sign_key.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(bytes);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    pub fn verify_covered(&self, bytes: &[u8], tag: &[u8]) -> Result<()> {
        self.ensure_active()?;
        let dir = self.inbound.as_ref().expect("active session always has keys");
        let mut mac = Hmac::<Sha256>::new_from_slice(dir.sign_key.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(bytes);
        let expected = mac.finalize().into_bytes();
        if expected.as_slice().ct_eq(tag).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(CryptoError::InvalidSignature.into())
        }
    }

    /// Overwrites all key material and transitions to `Closed`.
    pub fn close(&mut self) {
        self.outbound = None;
        self.inbound = None;
        self.status = Status::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
