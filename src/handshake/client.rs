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

//! Client (initiator) side of the handshake: build `Init`, process the
//! returned `Ack` (spec.md §4.5).

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use hpke::{OpModeS, Serializable};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::messages::{build_export_ctx, build_info, AckPayload, InitPayload};
use super::{kem_public_key, Aead, Kdf, Kem};
use crate::error::{CryptoError, ProtocolError, Result};
use crate::keyring::x25519::X25519KeyPair;
use crate::keyring::SigningKeyPair;
use crate::nonce::NonceStore;
use crate::resolver::{sign_key_or, Resolver};
use crate::util::now_unix;
use crate::util::secret::Secret32;

/// State the client must remember between sending `Init` and
/// processing `Ack`. Not itself sensitive beyond `exporter`, which is
/// zeroized when this struct drops (via `Secret32`).
pub struct ClientPendingHandshake {
    context_id: String,
    init_did: String,
    resp_did: String,
    info: String,
    export_ctx: String,
    nonce: String,
    exporter: Secret32,
    ephemeral: Option<X25519KeyPair>,
}

/// Builds `Init` (spec.md §4.5 "client procedure" steps 1-4), signs
/// its canonical encoding with `signing_key`, and returns the state
/// needed to process the matching `Ack`.
pub fn build_init(
    context_id: &str,
    init_did: &str,
    resp_did: &str,
    resp_kem_pub: &[u8; 32],
    signing_key: &SigningKeyPair,
    use_ephemeral_upgrade: bool,
) -> Result<(InitPayload, Vec<u8>, ClientPendingHandshake)> {
    let info = build_info(init_did, resp_did, context_id);
    let export_ctx = build_export_ctx(context_id);

    let recipient_pub = kem_public_key(resp_kem_pub)?;
    let (encapped_key, ctx) = hpke::setup_sender::<Aead, Kdf, Kem, _>(
        &OpModeS::Base,
        &recipient_pub,
        info.as_bytes(),
        &mut OsRng,
    )
    .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let mut exporter_bytes = [0u8; 32];
    ctx.export(export_ctx.as_bytes(), &mut exporter_bytes)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let exporter = Secret32::new(exporter_bytes);

    let ephemeral = if use_ephemeral_upgrade { Some(X25519KeyPair::generate()) } else { None };
    let nonce = uuid::Uuid::new_v4().to_string();

    let payload = InitPayload {
        init_did: init_did.to_string(),
        resp_did: resp_did.to_string(),
        info: info.clone(),
        export_ctx: export_ctx.clone(),
        enc: encapped_key.to_bytes().to_vec(),
        eph_c: ephemeral.as_ref().map(|k| k.public_bytes().to_vec()),
        nonce: nonce.clone(),
        ts: now_unix(),
    };

    let signature = signing_key.sign(&payload.canonical_bytes())?;

    Ok((
        payload,
        signature,
        ClientPendingHandshake {
            context_id: context_id.to_string(),
            init_did: init_did.to_string(),
            resp_did: resp_did.to_string(),
            info,
            export_ctx,
            nonce,
            exporter,
            ephemeral,
        },
    ))
}

/// Processes `Ack` (spec.md §4.5 "client procedure on Ack"), returning
/// the 32-byte combined secret to hand to
/// [`crate::session::Session::from_seed`] with
/// [`crate::session::Role::Initiator`].
///
/// Step 1 resolves the responder's signing key via `resolver` and
/// verifies `ack_signature` over `ack`'s canonical encoding before
/// anything else in `ack` is trusted.
pub fn handle_ack(
    pending: ClientPendingHandshake,
    ack: &AckPayload,
    ack_signature: &[u8],
    resolver: &dyn Resolver,
    nonce_store: &NonceStore,
) -> Result<Secret32> {
    let responder_key = sign_key_or(resolver, &pending.resp_did)?;
    responder_key.verify(&ack.canonical_bytes(), ack_signature)?;

    nonce_store.check_and_record(&pending.context_id, &ack.kid)?;

    let ss_e2e = match (&pending.ephemeral, &ack.eph_s) {
        (Some(my_eph), Some(their_eph_bytes)) => {
            let their_eph: [u8; 32] = their_eph_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidEncoding("ephS must be 32 bytes".into()))?;
            Some(my_eph.diffie_hellman(&their_eph))
        }
        _ => None,
    };

    let combined = combine_secret(&pending.exporter, ss_e2e.as_ref(), &pending.export_ctx);

    let expected_info_hash = Sha256::digest(pending.info.as_bytes());
    let expected_export_ctx_hash = Sha256::digest(pending.export_ctx.as_bytes());
    if expected_info_hash.as_slice().ct_eq(&ack.info_hash).unwrap_u8() != 1 {
        return Err(ProtocolError::InfoMismatch.into());
    }
    if expected_export_ctx_hash.as_slice().ct_eq(&ack.export_ctx_hash).unwrap_u8() != 1 {
        return Err(ProtocolError::ExportCtxMismatch.into());
    }

    let k_conf = derive_k_conf(&combined);
    let expected_tag = compute_ack_tag(&k_conf, &pending.context_id, &pending.nonce, &ack.kid);
    if expected_tag.ct_eq(&ack.ack_tag).unwrap_u8() != 1 {
        return Err(ProtocolError::AckMismatch.into());
    }

    Ok(combined)
}

/// `combined = HKDF-Extract(salt = export_ctx, ikm = exporter || ssE2E)`.
pub(crate) fn combine_secret(exporter: &Secret32, ss_e2e: Option<&Secret32>, export_ctx: &str) -> Secret32 {
    let mut ikm = exporter.as_bytes().to_vec();
    if let Some(ss) = ss_e2e {
        ikm.extend_from_slice(ss.as_bytes());
    }
    let (prk, _) = Hkdf::<Sha256>::extract(Some(export_ctx.as_bytes()), &ikm);
    Secret32::new(prk.into())
}

/// `K_conf = HKDF-Expand(combined, info = "sage/ack v1")`.
pub(crate) fn derive_k_conf(combined: &Secret32) -> Secret32 {
    let hk = Hkdf::<Sha256>::new(None, combined.as_bytes());
    let mut okm = [0u8; 32];
    hk.expand(b"sage/ack v1", &mut okm).expect("32 bytes is a valid HKDF-SHA256 output length");
    Secret32::new(okm)
}

/// `ack_tag = HMAC-SHA256(K_conf, "hpke-ack|" || context_id || "|" || nonce || "|" || kid)`.
pub(crate) fn compute_ack_tag(k_conf: &Secret32, context_id: &str, nonce: &str, kid: &str) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(k_conf.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("hpke-ack|{context_id}|{nonce}|{kid}").as_bytes());
    mac.finalize().into_bytes().to_vec()
}
