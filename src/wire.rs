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

//! Canonical wire encoding helpers shared by the handshake and the
//! session: base64url (no padding) for byte strings, and the 96-bit
//! nonce construction used by the session AEAD (spec.md §3/§6).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64url_decode(s: &str) -> crate::error::Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| crate::error::CryptoError::InvalidEncoding(e.to_string()).into())
}

/// `nonce = IV XOR encode_u96(seq)`, per spec.md §3 "per-message nonce".
/// The base IV is 12 bytes; `seq` is encoded big-endian into the low
/// 8 bytes, leaving the top 4 bytes of the IV untouched.
pub fn encode_u96(seq: u64) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[4..].copy_from_slice(&seq.to_be_bytes());
    out
}

pub fn message_nonce(base_iv: &[u8; 12], seq: u64) -> [u8; 12] {
    let seq_bytes = encode_u96(seq);
    let mut nonce = [0u8; 12];
    for i in 0..12 {
        nonce[i] = base_iv[i] ^ seq_bytes[i];
    }
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b64url_roundtrip() {
        let data = b"sage/hpke v1".to_vec();
        let enc = b64url_encode(&data);
        assert!(!enc.contains('='));
        assert_eq!(b64url_decode(&enc).unwrap(), data);
    }

    #[test]
    fn nonce_changes_with_seq() {
        let iv = [0u8; 12];
        let n0 = message_nonce(&iv, 0);
        let n1 = message_nonce(&iv, 1);
        assert_ne!(n0, n1);
        assert_eq!(n1[11], 1);
    }
}
