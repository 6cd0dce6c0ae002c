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

//! `Signature-Input` / `Signature` header formatting and parsing
//! (spec.md §4.7). Single-label form only (`sig1=...`); multi-signature
//! messages are outside this crate's scope.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{CryptoError, Result};

pub struct SignatureParams {
    pub covered: Vec<String>,
    pub created: u64,
    pub key_id: String,
    pub alg: String,
}

pub fn format_signature_input(params: &SignatureParams) -> String {
    let covered_list = params
        .covered
        .iter()
        .map(|f| format!("\"{}\"", f.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "sig1=({covered_list});created={};keyid=\"{}\";alg=\"{}\"",
        params.created, params.key_id, params.alg
    )
}

pub fn format_signature(signature: &[u8]) -> String {
    format!("sig1=:{}:", STANDARD.encode(signature))
}

pub fn parse_signature_input(header: &str) -> Result<SignatureParams> {
    let value = header
        .strip_prefix("sig1=")
        .ok_or_else(|| CryptoError::InvalidEncoding("missing 'sig1=' label".into()))?;
    let (field_list, params) = value
        .split_once(')')
        .ok_or_else(|| CryptoError::InvalidEncoding("malformed Signature-Input".into()))?;
    let field_list = field_list
        .strip_prefix('(')
        .ok_or_else(|| CryptoError::InvalidEncoding("malformed Signature-Input".into()))?;

    let covered = field_list
        .split_whitespace()
        .map(|f| f.trim_matches('"').to_string())
        .collect();

    let mut created = None;
    let mut key_id = None;
    let mut alg = None;
    for part in params.trim_start_matches(';').split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (k, v) = part
            .split_once('=')
            .ok_or_else(|| CryptoError::InvalidEncoding(format!("malformed parameter '{part}'")))?;
        let v = v.trim_matches('"');
        match k {
            "created" => {
                created = Some(
                    v.parse::<u64>()
                        .map_err(|_| CryptoError::InvalidEncoding("non-numeric 'created'".into()))?,
                )
            }
            "keyid" => key_id = Some(v.to_string()),
            "alg" => alg = Some(v.to_string()),
            _ => {}
        }
    }

    Ok(SignatureParams {
        covered,
        created: created.ok_or_else(|| CryptoError::InvalidEncoding("missing 'created'".into()))?,
        key_id: key_id.ok_or_else(|| CryptoError::InvalidEncoding("missing 'keyid'".into()))?,
        alg: alg.ok_or_else(|| CryptoError::InvalidEncoding("missing 'alg'".into()))?,
    })
}

pub fn parse_signature(header: &str) -> Result<Vec<u8>> {
    let value = header
        .strip_prefix("sig1=:")
        .and_then(|v| v.strip_suffix(':'))
        .ok_or_else(|| CryptoError::InvalidEncoding("malformed Signature header".into()))?;
    STANDARD
        .decode(value)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_input_round_trips() {
        let params = SignatureParams {
            covered: vec!["@method".to_string(), "@path".to_string()],
            created: 12345,
            key_id: "kid-1".to_string(),
            alg: "ed25519".to_string(),
        };
        let header = format_signature_input(&params);
        let parsed = parse_signature_input(&header).unwrap();
        assert_eq!(parsed.covered, params.covered);
        assert_eq!(parsed.created, params.created);
        assert_eq!(parsed.key_id, params.key_id);
        assert_eq!(parsed.alg, params.alg);
    }

    #[test]
    fn signature_header_round_trips() {
        let sig = vec![1u8, 2, 3, 4];
        let header = format_signature(&sig);
        assert_eq!(parse_signature(&header).unwrap(), sig);
    }
}
