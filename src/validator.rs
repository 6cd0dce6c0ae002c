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

//! Composes signature verification, nonce-replay rejection and
//! per-peer ordering into one structured diagnosis (spec.md §4.4).
//! Never touches ciphertext: this operates on cleartext headers plus
//! a signature, ahead of (or instead of) session decryption.

use crate::error::{CryptoError, Error, ProtocolError, SessionError};
use crate::keyring::PublicKey;
use crate::nonce::NonceStore;
use crate::order::OrderTracker;
use crate::signer::canonical::SignableMessage;
use crate::signer::{self};
use crate::util::now_unix;

/// The first failure encountered, matching spec.md §4.4's named kinds.
#[derive(Debug)]
pub enum Diagnosis {
    Ok,
    SignatureInvalid,
    NonceReplay,
    OutOfOrder,
    TimestampSkew,
    UnknownSigner,
}

impl Diagnosis {
    pub fn is_ok(&self) -> bool {
        matches!(self, Diagnosis::Ok)
    }
}

impl From<Error> for Diagnosis {
    fn from(err: Error) -> Self {
        match err {
            Error::Crypto(CryptoError::InvalidSignature) => Diagnosis::SignatureInvalid,
            Error::Crypto(CryptoError::AlgorithmMismatch { .. }) => Diagnosis::SignatureInvalid,
            Error::Protocol(ProtocolError::NonceReplay(_)) => Diagnosis::NonceReplay,
            Error::Protocol(ProtocolError::TimestampSkew) => Diagnosis::TimestampSkew,
            Error::Protocol(ProtocolError::UnknownSigner(_)) => Diagnosis::UnknownSigner,
            Error::Session(SessionError::OutOfOrder { .. }) => Diagnosis::OutOfOrder,
            Error::Session(SessionError::Duplicate) => Diagnosis::OutOfOrder,
            _ => Diagnosis::SignatureInvalid,
        }
    }
}

pub struct MessageValidator<'a> {
    pub nonce_store: &'a NonceStore,
    pub order_tracker: &'a OrderTracker,
    pub max_clock_skew_secs: u64,
}

impl<'a> MessageValidator<'a> {
    pub fn new(nonce_store: &'a NonceStore, order_tracker: &'a OrderTracker, max_clock_skew_secs: u64) -> Self {
        Self { nonce_store, order_tracker, max_clock_skew_secs }
    }

    /// Runs the full composed check for one inbound message. `peer` and
    /// `context` key the order tracker and nonce store respectively.
    #[allow(clippy::too_many_arguments)]
    pub fn validate(
        &self,
        msg: &SignableMessage,
        signature_input: &str,
        signature: &str,
        lookup: impl FnOnce(&str) -> crate::error::Result<PublicKey>,
        peer: &str,
        context: &str,
        nonce: &str,
        seq: u64,
        message_id: &str,
        claimed_ts: u64,
    ) -> Diagnosis {
        if claimed_ts.abs_diff(now_unix()) > self.max_clock_skew_secs {
            return Diagnosis::TimestampSkew;
        }

        if let Err(e) = self.nonce_store.check_and_record(context, nonce) {
            return e.into();
        }

        if let Err(e) = self.order_tracker.admit(peer, seq, claimed_ts, message_id) {
            return e.into();
        }

        if let Err(e) = signer::verify(msg, signature_input, signature, lookup) {
            return e.into();
        }

        Diagnosis::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyring::{KeyType, SigningKeyPair};
    use std::collections::BTreeMap;

    #[test]
    fn happy_path_is_ok() {
        let nonce_store = NonceStore::default();
        let order_tracker = OrderTracker::default();
        let validator = MessageValidator::new(&nonce_store, &order_tracker, 120);

        let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let pk = PublicKey::from(&kp);
        let headers = BTreeMap::new();
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };
        let covered = vec!["@method".to_string(), "@path".to_string()];
        let (sig_input, sig) = signer::sign(&msg, &covered, "kid-1", &kp).unwrap();

        let diag = validator.validate(
            &msg,
            &sig_input,
            &sig,
            |_| Ok(pk.clone()),
            "peer-a",
            "ctx-1",
            "nonce-1",
            1,
            "msg-1",
            now_unix(),
        );
        assert!(diag.is_ok());
    }

    #[test]
    fn replayed_nonce_is_flagged() {
        let nonce_store = NonceStore::default();
        let order_tracker = OrderTracker::default();
        let validator = MessageValidator::new(&nonce_store, &order_tracker, 120);
        nonce_store.check_and_record("ctx-1", "nonce-1").unwrap();

        let kp = SigningKeyPair::generate(KeyType::Ed25519).unwrap();
        let pk = PublicKey::from(&kp);
        let headers = BTreeMap::new();
        let msg = SignableMessage { method: "GET", path: "/x", query: "", headers: &headers };
        let (sig_input, sig) = signer::sign(&msg, &["@method".to_string()], "kid-1", &kp).unwrap();

        let diag = validator.validate(
            &msg, &sig_input, &sig, |_| Ok(pk.clone()), "peer-a", "ctx-1", "nonce-1", 1, "msg-1", now_unix(),
        );
        assert!(matches!(diag, Diagnosis::NonceReplay));
    }
}
