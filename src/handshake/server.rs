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

//! Server (responder) side of the handshake: verify `Init`, run the
//! HPKE receiver, and build `Ack` (spec.md §4.5 "server procedure").

use hpke::OpModeR;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::client::{combine_secret, compute_ack_tag, derive_k_conf};
use super::cookie::CookieVerifier;
use super::messages::{build_export_ctx, build_info, AckPayload, InitPayload};
use super::{encapped_key_from_bytes, kem_private_key, Aead, Kdf, Kem};
use crate::config::HandshakeConfig;
use crate::error::{CryptoError, ProtocolError, Result};
use crate::keyring::x25519::X25519KeyPair;
use crate::keyring::SigningKeyPair;
use crate::nonce::NonceStore;
use crate::resolver::{sign_key_or, Resolver};
use crate::util::now_unix;
use crate::util::secret::Secret32;

/// Verifies `init`'s signature, nonce freshness and recomputed
/// `info`/`export_ctx`, runs the HPKE receiver over `enc`, and returns
/// the combined secret plus the `Ack` to send back.
///
/// `responder_kem` is the server's own static X25519 KEM keypair
/// matching the public key the client encapsulated to.
#[allow(clippy::too_many_arguments)]
pub fn handle_init(
    context_id: &str,
    init: &InitPayload,
    init_signature: &[u8],
    cookie_metadata: Option<&[u8]>,
    responder_kem: &X25519KeyPair,
    responder_signing_key: &SigningKeyPair,
    resolver: &dyn Resolver,
    nonce_store: &NonceStore,
    cookie_verifier: Option<&dyn CookieVerifier>,
    cfg: &HandshakeConfig,
) -> Result<(AckPayload, Vec<u8>, Secret32)> {
    if let Some(verifier) = cookie_verifier {
        verifier.verify(context_id, &init.init_did, &init.resp_did, cookie_metadata)?;
    }

    if init.ts.abs_diff(now_unix()) > cfg.max_clock_skew.as_secs() {
        return Err(ProtocolError::TimestampSkew.into());
    }

    let signer = sign_key_or(resolver, &init.init_did)?;
    signer.verify(&init.canonical_bytes(), init_signature)?;

    nonce_store.check_and_record(context_id, &init.nonce)?;

    let expected_info = build_info(&init.init_did, &init.resp_did, context_id);
    if expected_info != init.info {
        return Err(ProtocolError::InfoMismatch.into());
    }
    let expected_export_ctx = build_export_ctx(context_id);
    if expected_export_ctx != init.export_ctx {
        return Err(ProtocolError::ExportCtxMismatch.into());
    }

    let responder_priv = kem_private_key(&responder_kem.to_bytes())?;
    let encapped = encapped_key_from_bytes(&init.enc)?;
    let mut ctx = hpke::setup_receiver::<Aead, Kdf, Kem>(
        &OpModeR::Base,
        &responder_priv,
        &encapped,
        init.info.as_bytes(),
    )
    .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let mut exporter_bytes = [0u8; 32];
    ctx.export(init.export_ctx.as_bytes(), &mut exporter_bytes)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    let exporter = Secret32::new(exporter_bytes);

    let (eph_s, ss_e2e) = match &init.eph_c {
        Some(eph_c_bytes) => {
            let eph_c: [u8; 32] = eph_c_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidEncoding("ephC must be 32 bytes".into()))?;
            let my_eph = X25519KeyPair::generate();
            let shared = my_eph.diffie_hellman(&eph_c);
            (Some(my_eph.public_bytes().to_vec()), Some(shared))
        }
        None => (None, None),
    };

    let combined = combine_secret(&exporter, ss_e2e.as_ref(), &init.export_ctx);

    let kid = random_kid();
    let k_conf = derive_k_conf(&combined);
    let ack_tag = compute_ack_tag(&k_conf, context_id, &init.nonce, &kid);

    let info_hash = Sha256::digest(init.info.as_bytes()).to_vec();
    let export_ctx_hash = Sha256::digest(init.export_ctx.as_bytes()).to_vec();

    let ack = AckPayload {
        kid,
        ack_tag,
        ts: now_unix(),
        eph_s,
        info_hash,
        export_ctx_hash,
    };
    let signature = responder_signing_key.sign(&ack.canonical_bytes())?;

    Ok((ack, signature, combined))
}

/// `kid` is a process-local, transport-opaque session-binding token
/// minted fresh per handshake (spec.md GLOSSARY), distinct from a
/// keyring `key_id`.
fn random_kid() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
