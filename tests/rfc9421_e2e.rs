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

//! End-to-end coverage of the RFC 9421-style signer/verifier plus the
//! composed validator, tracking spec.md §8 scenario 6 (a covered-field
//! omission attack) alongside ordinary sign/verify and replay/order
//! checks.

use std::collections::BTreeMap;

use sage_core::keyring::{KeyType, PublicKey, SigningKeyPair};
use sage_core::nonce::NonceStore;
use sage_core::order::OrderTracker;
use sage_core::signer::canonical::SignableMessage;
use sage_core::signer::{self};
use sage_core::validator::{Diagnosis, MessageValidator};

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn signed_message_round_trips_across_all_signing_algorithms() {
    for algo in [KeyType::Ed25519, KeyType::Secp256k1, KeyType::P256] {
        let kp = SigningKeyPair::generate(algo).unwrap();
        let pk = PublicKey::from(&kp);

        let mut headers = BTreeMap::new();
        headers.insert("date".to_string(), "Tue, 20 Jan 2026 10:00:00 GMT".to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());

        let msg = SignableMessage { method: "POST", path: "/agents/task", query: "id=42", headers: &headers };
        let covered =
            vec!["@method".to_string(), "@path".to_string(), "@query".to_string(), "date".to_string()];

        let (sig_input, sig) = signer::sign(&msg, &covered, "kid-rfc9421", &kp).unwrap();
        signer::verify(&msg, &sig_input, &sig, |_| Ok(pk.clone())).unwrap();
    }
}

// Scenario 6: the attacker takes a validly signed request, appends an
// unsigned header, and republishes the (unchanged) Signature-Input and
// Signature. An honest verifier re-deriving the signature base from
// its own covered-fields list would still pass, so the verifier must
// only trust the fields actually listed in Signature-Input — omitting
// one from the original signed set changes the base and must fail.
#[test]
fn covered_field_omission_attack_is_rejected() {
    let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
    let pk = PublicKey::from(&kp);

    let mut headers = BTreeMap::new();
    headers.insert("x-amount".to_string(), "100".to_string());
    let msg = SignableMessage { method: "POST", path: "/transfer", query: "", headers: &headers };
    let covered = vec!["@method".to_string(), "@path".to_string(), "x-amount".to_string()];

    let (sig_input, sig) = signer::sign(&msg, &covered, "kid-1", &kp).unwrap();

    // The attacker rewrites Signature-Input to drop "x-amount" from the
    // covered list, hoping the verifier only checks the fields it still
    // names rather than the full originally-signed set.
    let tampered = sig_input.replace("\"@method\" \"@path\" \"x-amount\"", "\"@method\" \"@path\"");
    assert!(signer::verify(&msg, &tampered, &sig, |_| Ok(pk.clone())).is_err());
}

#[test]
fn validator_composes_nonce_order_and_signature_checks() {
    let nonce_store = NonceStore::default();
    let order_tracker = OrderTracker::default();
    let validator = MessageValidator::new(&nonce_store, &order_tracker, 120);

    let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
    let pk = PublicKey::from(&kp);
    let headers = BTreeMap::new();
    let msg = SignableMessage { method: "GET", path: "/status", query: "", headers: &headers };
    let covered = vec!["@method".to_string(), "@path".to_string()];
    let (sig_input, sig) = signer::sign(&msg, &covered, "kid-seq", &kp).unwrap();

    let diag = validator.validate(
        &msg, &sig_input, &sig, |_| Ok(pk.clone()), "peer-carol", "ctx-carol", "n-0", 0, "m-0", now(),
    );
    assert!(diag.is_ok());

    // Same nonce again must be flagged as a replay, independent of a
    // fresh (and otherwise valid) signature/sequence pair.
    let (sig_input2, sig2) = signer::sign(&msg, &covered, "kid-seq", &kp).unwrap();
    let diag2 = validator.validate(
        &msg, &sig_input2, &sig2, |_| Ok(pk.clone()), "peer-carol", "ctx-carol", "n-0", 1, "m-1", now(),
    );
    assert!(matches!(diag2, Diagnosis::NonceReplay));
}
