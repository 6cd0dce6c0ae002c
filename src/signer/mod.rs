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

//! RFC 9421-style signer/verifier (spec.md §4.7): produces and checks
//! `Signature-Input`/`Signature` header pairs over a
//! [`canonical::SignableMessage`].

pub mod canonical;
pub mod header;

use canonical::{build_signature_base, SignableMessage};
use header::{format_signature, format_signature_input, parse_signature, parse_signature_input, SignatureParams};

use crate::error::{CryptoError, Result};
use crate::keyring::{KeyType, PublicKey, SigningKeyPair};
use crate::util::now_unix;

/// Signs `msg` over `covered` with `keypair`, returning
/// `(Signature-Input, Signature)` header values.
pub fn sign(
    msg: &SignableMessage,
    covered: &[String],
    key_id: &str,
    keypair: &SigningKeyPair,
) -> Result<(String, String)> {
    let alg = keypair
        .key_type()
        .alg_tag()
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm("key type has no signing algorithm tag".into()))?;
    let created = now_unix();
    let base = build_signature_base(msg, covered, created, key_id, alg);
    let signature = keypair.sign(base.as_bytes())?;

    let params = SignatureParams {
        covered: covered.to_vec(),
        created,
        key_id: key_id.to_string(),
        alg: alg.to_string(),
    };
    Ok((format_signature_input(&params), format_signature(&signature)))
}

/// Verifies `signature_input`/`signature` against `msg`, resolving the
/// signer's public key with `lookup`. `lookup` typically wraps a
/// [`crate::resolver::Resolver`] plus a `key_id -> did` side table, or
/// a direct keyring lookup when the key is already known locally.
pub fn verify(
    msg: &SignableMessage,
    signature_input: &str,
    signature: &str,
    lookup: impl FnOnce(&str) -> Result<PublicKey>,
) -> Result<()> {
    let params = parse_signature_input(signature_input)?;
    let sig_bytes = parse_signature(signature)?;
    let public_key = lookup(&params.key_id)?;

    let declared_type = KeyType::from_alg_tag(&params.alg)
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm(params.alg.clone()))?;
    if declared_type != public_key.key_type() {
        return Err(CryptoError::AlgorithmMismatch {
            declared: params.alg.clone(),
            actual: format!("{:?}", public_key.key_type()),
        }
        .into());
    }

    let base = build_signature_base(msg, &params.covered, params.created, &params.key_id, &params.alg);
    public_key.verify(base.as_bytes(), &sig_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::KeyType;
    use std::collections::BTreeMap;

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let pk = PublicKey::from(&kp);
        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "Mon, 01 Jan 2026 00:00:00 GMT".to_string());
        let msg = SignableMessage { method: "GET", path: "/agents/1", query: "", headers: &headers };
        let covered = vec!["@method".to_string(), "@path".to_string(), "date".to_string()];

        let (sig_input, sig) = sign(&msg, &covered, "kid-1", &kp).unwrap();
        verify(&msg, &sig_input, &sig, |_| Ok(pk.clone())).unwrap();
    }

    #[test]
    fn lying_about_covered_fields_is_rejected() {
        let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let pk = PublicKey::from(&kp);
        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "d".to_string());
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };

        let (sig_input, sig) =
            sign(&msg, &["@method".to_string(), "@path".to_string(), "date".to_string()], "kid-1", &kp).unwrap();

        // Tamper with Signature-Input to drop "date" from the covered list,
        // as in the omission attack in spec.md §8 scenario 6.
        let tampered = sig_input.replace("\"@method\" \"@path\" \"date\"", "\"@method\" \"@path\"");
        assert!(verify(&msg, &tampered, &sig, |_| Ok(pk.clone())).is_err());
    }

    #[test]
    fn algorithm_mismatch_is_rejected() {
        let ed = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let secp = SigningKeyPair::generate(KeyType::Secp256k1).unwrap();
        let secp_pk = PublicKey::from(&secp);
        let headers = BTreeMap::new();
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };

        let (sig_input, sig) = sign(&msg, &["@method".to_string()], "kid-1", &ed).unwrap();
        assert!(verify(&msg, &sig_input, &sig, |_| Ok(secp_pk.clone())).is_err());
    }
}
