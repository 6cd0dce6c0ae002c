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

//! Wire messages for the two-step HPKE handshake (spec.md §4.5/§6).
//! Both are canonicalised the same way for signing: map keys sorted
//! lexicographically, integers as decimal, byte strings as
//! base64url-without-padding — so client and server always sign (and
//! verify) the identical byte string.

use std::collections::BTreeMap;

use crate::wire::{b64url_decode, b64url_encode};

pub const TASK_INIT: &str = "hpke/init@v1";
pub const TASK_ACK: &str = "hpke/ack@v1";

#[derive(Debug, Clone)]
pub struct InitPayload {
    pub init_did: String,
    pub resp_did: String,
    pub info: String,
    pub export_ctx: String,
    pub enc: Vec<u8>,
    pub eph_c: Option<Vec<u8>>,
    pub nonce: String,
    pub ts: u64,
}

impl InitPayload {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut fields = BTreeMap::new();
        fields.insert("enc".to_string(), b64url_encode(&self.enc));
        fields.insert("exportCtx".to_string(), self.export_ctx.clone());
        fields.insert("info".to_string(), self.info.clone());
        fields.insert("initDid".to_string(), self.init_did.clone());
        fields.insert("nonce".to_string(), self.nonce.clone());
        fields.insert("respDid".to_string(), self.resp_did.clone());
        fields.insert("ts".to_string(), self.ts.to_string());
        if let Some(eph_c) = &self.eph_c {
            fields.insert("ephC".to_string(), b64url_encode(eph_c));
        }
        canonical_join(&fields)
    }
}

#[derive(Debug, Clone)]
pub struct AckPayload {
    pub kid: String,
    pub ack_tag: Vec<u8>,
    pub ts: u64,
    pub eph_s: Option<Vec<u8>>,
    pub info_hash: Vec<u8>,
    pub export_ctx_hash: Vec<u8>,
}

impl AckPayload {
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut fields = BTreeMap::new();
        fields.insert("ackTagB64".to_string(), b64url_encode(&self.ack_tag));
        fields.insert("exportCtxHash".to_string(), b64url_encode(&self.export_ctx_hash));
        fields.insert("infoHash".to_string(), b64url_encode(&self.info_hash));
        fields.insert("kid".to_string(), self.kid.clone());
        fields.insert("ts".to_string(), self.ts.to_string());
        if let Some(eph_s) = &self.eph_s {
            fields.insert("ephS".to_string(), b64url_encode(eph_s));
        }
        canonical_join(&fields)
    }
}

fn canonical_join(fields: &BTreeMap<String, String>) -> Vec<u8> {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

/// `info = "sage/handshake|v1|" || init_did || "|" || resp_did || "|" || context_id`
pub fn build_info(init_did: &str, resp_did: &str, context_id: &str) -> String {
    format!("sage/handshake|v1|{init_did}|{resp_did}|{context_id}")
}

/// `export_ctx = "sage/handshake-export|v1|" || context_id`
pub fn build_export_ctx(context_id: &str) -> String {
    format!("sage/handshake-export|v1|{context_id}")
}

pub fn decode_b64url_field(value: &str) -> crate::error::Result<Vec<u8>> {
    b64url_decode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_is_deterministic() {
        let init = InitPayload {
            init_did: "did:sage:ethereum:0xAAA".into(),
            resp_did: "did:sage:ethereum:0xBBB".into(),
            info: build_info("did:sage:ethereum:0xAAA", "did:sage:ethereum:0xBBB", "ctx-1"),
            export_ctx: build_export_ctx("ctx-1"),
            enc: vec![1u8; 32],
            eph_c: None,
            nonce: "n1".into(),
            ts: 1000,
        };
        assert_eq!(init.canonical_bytes(), init.canonical_bytes());
    }
}
